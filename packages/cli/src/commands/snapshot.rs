use anyhow::{anyhow, Result};
use clap::Args;
use folio_store::snapshot::slice_to_snapshot;
use folio_store::{BlockId, BlockSnapshot, Document, Snapshot, TreeRead};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Document tree as JSON (the root block snapshot)
    pub document: PathBuf,

    /// Blocks to include; descendants of listed blocks are folded in
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Document id (defaults to the file name)
    #[arg(long)]
    pub doc_id: Option<String>,
}

pub fn snapshot(args: SnapshotArgs, cwd: &Path) -> Result<()> {
    let path = cwd.join(&args.document);
    let content = fs::read_to_string(&path)
        .map_err(|e| anyhow!("Cannot read {}: {}", path.display(), e))?;

    let doc_id = args.doc_id.clone().unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string())
    });

    let snapshot = take_snapshot(&content, &doc_id, &args.ids)?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn take_snapshot(content: &str, doc_id: &str, ids: &[String]) -> Result<Snapshot> {
    let root: BlockSnapshot = serde_json::from_str(content)?;
    let doc = Document::from_snapshot(doc_id, &root)?;

    let ids: Vec<BlockId> = ids.iter().map(|id| BlockId::from(id.as_str())).collect();
    if let Some(missing) = ids.iter().find(|id| !doc.has_block(id)) {
        return Err(anyhow!("Block {} not found in {}", missing, doc_id));
    }

    let top_level = folio_editor::reduce_to_topmost(&doc, &ids);
    Ok(slice_to_snapshot(&doc, &top_level))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "id": "root",
        "flavour": "page",
        "children": [{ "id": "note", "flavour": "note", "children": [
            { "id": "a", "flavour": "paragraph", "props": { "text": "hi" } },
            { "id": "l", "flavour": "list", "children": [{ "id": "l1", "flavour": "paragraph" }] }
        ]}]
    }"#;

    #[test]
    fn test_snapshot_folds_descendants() {
        let snapshot = take_snapshot(DOC, "doc", &["l1".to_string(), "l".to_string()]).unwrap();
        assert_eq!(snapshot.top_level_ids(), vec![BlockId::from("l")]);
        assert_eq!(snapshot.ids().len(), 2);
    }

    #[test]
    fn test_snapshot_keeps_document_order() {
        let snapshot = take_snapshot(DOC, "doc", &["l".to_string(), "a".to_string()]).unwrap();
        assert_eq!(
            snapshot.top_level_ids(),
            vec![BlockId::from("a"), BlockId::from("l")]
        );
    }

    #[test]
    fn test_unknown_block_is_an_error() {
        let err = take_snapshot(DOC, "doc", &["nope".to_string()]).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("page.json"), DOC).unwrap();

        let args = SnapshotArgs {
            document: PathBuf::from("page.json"),
            ids: vec!["a".to_string()],
            doc_id: None,
        };
        assert!(snapshot(args, dir.path()).is_ok());
    }
}

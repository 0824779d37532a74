//! # Block Model
//!
//! A block is one node of the document tree. Besides its flavour and props
//! it carries two capability tags decided when it enters a tree:
//!
//! - [`Role`]: whether the block bears content, groups content (hub) or
//!   only contains other containers
//! - `canvas_resident`: whether the block lives on the freeform canvas

use folio_common::Bound;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Insertion-ordered block properties
pub type Props = IndexMap<String, serde_json::Value>;

/// Unique id of a block within a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unique id of a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Block type discriminator
///
/// Serialized as its plain string name (`"note"`, `"embed-linked-doc"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Flavour {
    Page,
    Note,
    Surface,
    Paragraph,
    List,
    Code,
    Divider,
    Database,
    Image,
    Attachment,
    Bookmark,
    SurfaceRef,
    /// `embed-<kind>`, e.g. `embed-linked-doc`
    Embed(String),
    Other(String),
}

impl Flavour {
    pub fn linked_doc() -> Self {
        Flavour::Embed("linked-doc".to_string())
    }

    pub fn name(&self) -> String {
        match self {
            Flavour::Page => "page".to_string(),
            Flavour::Note => "note".to_string(),
            Flavour::Surface => "surface".to_string(),
            Flavour::Paragraph => "paragraph".to_string(),
            Flavour::List => "list".to_string(),
            Flavour::Code => "code".to_string(),
            Flavour::Divider => "divider".to_string(),
            Flavour::Database => "database".to_string(),
            Flavour::Image => "image".to_string(),
            Flavour::Attachment => "attachment".to_string(),
            Flavour::Bookmark => "bookmark".to_string(),
            Flavour::SurfaceRef => "surface-ref".to_string(),
            Flavour::Embed(kind) => format!("embed-{}", kind),
            Flavour::Other(name) => name.clone(),
        }
    }

    /// Role assigned to blocks of this flavour when they enter a tree
    pub fn default_role(&self) -> Role {
        match self {
            Flavour::Page => Role::ContainerOnly,
            Flavour::Note | Flavour::Surface => Role::Hub,
            _ => Role::Content,
        }
    }

    pub fn is_embed(&self) -> bool {
        matches!(self, Flavour::Embed(_))
    }

    /// Fixed-size card content on the canvas
    pub fn is_card(&self) -> bool {
        matches!(
            self,
            Flavour::Attachment | Flavour::Bookmark | Flavour::Embed(_)
        )
    }

    /// Containers that do not accept generic dropped content
    pub fn is_closed_container(&self) -> bool {
        matches!(self, Flavour::Database)
    }
}

impl fmt::Display for Flavour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl From<Flavour> for String {
    fn from(flavour: Flavour) -> Self {
        flavour.name()
    }
}

impl From<String> for Flavour {
    fn from(name: String) -> Self {
        Flavour::from(name.as_str())
    }
}

impl From<&str> for Flavour {
    fn from(name: &str) -> Self {
        match name {
            "page" => Flavour::Page,
            "note" => Flavour::Note,
            "surface" => Flavour::Surface,
            "paragraph" => Flavour::Paragraph,
            "list" => Flavour::List,
            "code" => Flavour::Code,
            "divider" => Flavour::Divider,
            "database" => Flavour::Database,
            "image" => Flavour::Image,
            "attachment" => Flavour::Attachment,
            "bookmark" => Flavour::Bookmark,
            "surface-ref" => Flavour::SurfaceRef,
            other => match other.strip_prefix("embed-") {
                Some(kind) if !kind.is_empty() => Flavour::Embed(kind.to_string()),
                _ => Flavour::Other(other.to_string()),
            },
        }
    }
}

/// Capability of a block within the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Carries user content (paragraphs, lists, images...)
    Content,
    /// Groups content (notes, the canvas surface)
    Hub,
    /// Holds hubs only (the page root)
    ContainerOnly,
}

/// A node of the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    pub flavour: Flavour,
    pub role: Role,
    pub canvas_resident: bool,
    pub props: Props,
    pub children: Vec<BlockId>,
    pub parent: Option<BlockId>,
}

impl Block {
    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(|v| v.as_str())
    }

    pub fn prop_bool(&self, key: &str) -> bool {
        self.props.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    /// Heading level (1-6) of a paragraph with `type: "hN"`
    pub fn heading_level(&self) -> Option<u8> {
        if self.flavour != Flavour::Paragraph {
            return None;
        }
        let level = self.prop_str("type")?.strip_prefix('h')?.parse::<u8>().ok()?;
        (1..=6).contains(&level).then_some(level)
    }

    pub fn is_collapsed_heading(&self) -> bool {
        self.heading_level().is_some() && self.prop_bool("collapsed")
    }

    pub fn is_numbered_list(&self) -> bool {
        self.flavour == Flavour::List && self.prop_str("type") == Some("numbered")
    }

    pub fn list_order(&self) -> Option<i64> {
        self.props.get("order").and_then(|v| v.as_i64())
    }

    /// Canvas bound from the `xywh` prop, if present and well formed
    pub fn bound(&self) -> Option<Bound> {
        Bound::deserialize(self.prop_str("xywh")?).ok()
    }
}

//! Collection of open documents, keyed by id

use crate::{DocId, Document, DocumentTree};
use std::collections::HashMap;

#[derive(Debug)]
pub struct Workspace<T: DocumentTree = Document> {
    docs: HashMap<DocId, T>,
}

impl<T: DocumentTree> Workspace<T> {
    pub fn new() -> Self {
        Self {
            docs: HashMap::new(),
        }
    }

    /// Add a document, returning any previous document with the same id
    pub fn insert(&mut self, doc: T) -> Option<T> {
        self.docs.insert(doc.doc_id().clone(), doc)
    }

    pub fn get(&self, id: &DocId) -> Option<&T> {
        self.docs.get(id)
    }

    pub fn get_mut(&mut self, id: &DocId) -> Option<&mut T> {
        self.docs.get_mut(id)
    }

    pub fn remove(&mut self, id: &DocId) -> Option<T> {
        self.docs.remove(id)
    }

    pub fn contains(&self, id: &DocId) -> bool {
        self.docs.contains_key(id)
    }

    /// Document ids in sorted order
    pub fn ids(&self) -> Vec<DocId> {
        let mut ids: Vec<DocId> = self.docs.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Mutable access to two distinct documents at once
    pub fn pair_mut(&mut self, a: &DocId, b: &DocId) -> Option<(&mut T, &mut T)> {
        if a == b {
            return None;
        }

        let mut first = None;
        let mut second = None;
        for (id, doc) in self.docs.iter_mut() {
            if id == a {
                first = Some(doc);
            } else if id == b {
                second = Some(doc);
            }
        }

        Some((first?, second?))
    }
}

impl<T: DocumentTree> Default for Workspace<T> {
    fn default() -> Self {
        Self::new()
    }
}

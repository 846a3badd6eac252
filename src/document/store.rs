use std::path::PathBuf;
use std::sync::Mutex;

use crate::document::model::Document;
use crate::foundation::error::{CadenzaError, CadenzaResult};

/// Persistence collaborator for the shared document.
///
/// The preserve/restore discipline in [`crate::session::SessionManager`] is
/// the only pipeline code that calls this.
pub trait DocumentStore: Send + Sync {
    /// Load the shared document.
    fn load_shared(&self) -> CadenzaResult<Document>;

    /// Overwrite the shared document.
    fn save_shared(&self, doc: &Document) -> CadenzaResult<()>;
}

/// In-memory store for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    doc: Mutex<Option<Document>>,
}

impl InMemoryDocumentStore {
    /// Store holding an empty shared document.
    pub fn new() -> Self {
        Self {
            doc: Mutex::new(Some(Document::empty())),
        }
    }

    /// Store holding the given shared document.
    pub fn with_document(doc: Document) -> Self {
        Self {
            doc: Mutex::new(Some(doc)),
        }
    }

    /// Simulate the shared resource vanishing externally.
    pub fn vanish(&self) {
        *self.doc.lock().expect("store lock poisoned") = None;
    }

    /// Current shared document, if present.
    pub fn snapshot(&self) -> Option<Document> {
        self.doc.lock().expect("store lock poisoned").clone()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn load_shared(&self) -> CadenzaResult<Document> {
        self.doc
            .lock()
            .map_err(|_| CadenzaError::document("shared document lock poisoned"))?
            .clone()
            .ok_or_else(|| CadenzaError::document("shared document is gone"))
    }

    fn save_shared(&self, doc: &Document) -> CadenzaResult<()> {
        *self
            .doc
            .lock()
            .map_err(|_| CadenzaError::document("shared document lock poisoned"))? =
            Some(doc.clone());
        Ok(())
    }
}

/// JSON-file-backed store.
#[derive(Debug)]
pub struct JsonDocumentStore {
    path: PathBuf,
}

impl JsonDocumentStore {
    /// Store reading and writing the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl DocumentStore for JsonDocumentStore {
    fn load_shared(&self) -> CadenzaResult<Document> {
        let bytes = std::fs::read(&self.path)
            .map_err(|e| CadenzaError::document(format!("read {}: {e}", self.path.display())))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CadenzaError::document(format!("parse {}: {e}", self.path.display())))
    }

    fn save_shared(&self, doc: &Document) -> CadenzaResult<()> {
        let json = serde_json::to_vec_pretty(doc)
            .map_err(|e| CadenzaError::document(format!("serialize shared document: {e}")))?;
        std::fs::write(&self.path, json)
            .map_err(|e| CadenzaError::document(format!("write {}: {e}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::beat::{Beat, BeatRecord};

    fn doc_with_beat(letter: char) -> Document {
        let mut doc = Document::empty();
        doc.sequence.push(BeatRecord::Beat(Beat {
            letter,
            turns: 1.0,
            reversal: false,
        }));
        doc
    }

    #[test]
    fn in_memory_store_roundtrips() {
        let store = InMemoryDocumentStore::new();
        store.save_shared(&doc_with_beat('Q')).unwrap();
        assert_eq!(store.load_shared().unwrap(), doc_with_beat('Q'));
    }

    #[test]
    fn vanished_store_fails_to_load() {
        let store = InMemoryDocumentStore::new();
        store.vanish();
        assert!(store.load_shared().is_err());
    }

    #[test]
    fn json_store_roundtrips_through_a_file() {
        let path = std::env::temp_dir().join(format!(
            "cadenza_store_test_{}.json",
            std::process::id()
        ));
        let store = JsonDocumentStore::new(&path);
        store.save_shared(&doc_with_beat('Z')).unwrap();
        assert_eq!(store.load_shared().unwrap(), doc_with_beat('Z'));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn json_store_missing_file_is_a_document_error() {
        let store = JsonDocumentStore::new("/nonexistent/cadenza/shared.json");
        assert!(matches!(
            store.load_shared(),
            Err(CadenzaError::Document(_))
        ));
    }
}

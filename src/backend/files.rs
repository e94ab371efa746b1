//! Open-document tracking for a language server session
//!
//! Tracks which files the server has been told about and the hash of the
//! content it saw, so repeated opens are free and edited files are resent
//! as a change notification instead of a second open.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::backend::BackendError;
use crate::lsp::{LspClient, LspError};
use crate::symbol::location::uri_from_path;

/// Document notifications the tracker needs from a client
pub trait DocumentSync {
    fn open_document(
        &self,
        uri: lsp_types::Uri,
        language_id: &str,
        version: i32,
        text: String,
    ) -> Result<(), LspError>;

    fn change_document(
        &self,
        uri: lsp_types::Uri,
        version: i32,
        text: String,
    ) -> Result<(), LspError>;
}

impl DocumentSync for LspClient {
    fn open_document(
        &self,
        uri: lsp_types::Uri,
        language_id: &str,
        version: i32,
        text: String,
    ) -> Result<(), LspError> {
        self.did_open(uri, language_id, version, text)
    }

    fn change_document(
        &self,
        uri: lsp_types::Uri,
        version: i32,
        text: String,
    ) -> Result<(), LspError> {
        self.did_change(uri, version, text)
    }
}

/// What `ensure_open` had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    Changed,
    Unchanged,
}

#[derive(Debug, Clone)]
struct DocumentEntry {
    content_hash: String,
    version: i32,
}

/// Documents currently open in the server, keyed by path
#[derive(Debug)]
pub struct OpenFileTracker {
    documents: HashMap<PathBuf, DocumentEntry>,
    next_version: i32,
}

impl Default for OpenFileTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenFileTracker {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            next_version: 1,
        }
    }

    /// Open `path` with `content`, or resend it if the content changed
    pub fn ensure_open(
        &mut self,
        path: &Path,
        content: String,
        sync: &impl DocumentSync,
    ) -> Result<OpenOutcome, BackendError> {
        let content_hash = compute_hash(&content);

        if let Some(entry) = self
            .documents
            .get(path)
            .filter(|entry| entry.content_hash == content_hash)
        {
            debug!(
                "File {} is already open and unchanged at version {}",
                path.display(),
                entry.version
            );
            return Ok(OpenOutcome::Unchanged);
        }

        let uri = uri_from_path(path)?;
        let version = self.next_version;
        let outcome = if self.documents.contains_key(path) {
            info!(
                "File {} has changed, sending change notification",
                path.display()
            );
            sync.change_document(uri, version, content)?;
            OpenOutcome::Changed
        } else {
            info!("Opening file {}", path.display());
            sync.open_document(uri, language_id(path), version, content)?;
            OpenOutcome::Opened
        };

        self.next_version += 1;
        self.documents.insert(
            path.to_path_buf(),
            DocumentEntry {
                content_hash,
                version,
            },
        );
        Ok(outcome)
    }

    #[cfg(test)]
    pub fn is_open(&self, path: &Path) -> bool {
        self.documents.contains_key(path)
    }

    #[cfg(test)]
    pub fn version(&self, path: &Path) -> Option<i32> {
        self.documents.get(path).map(|entry| entry.version)
    }

    pub fn open_count(&self) -> usize {
        self.documents.len()
    }
}

fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// LSP language identifier for a source file
pub fn language_id(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("c") => "c",
        Some("m") => "objective-c",
        Some("mm") => "objective-cpp",
        Some("go") => "go",
        Some("rs") => "rust",
        Some("py") => "python",
        Some("ts") => "typescript",
        Some("js") => "javascript",
        // C++ sources and headers, and anything unknown
        _ => "cpp",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSync {
        events: Mutex<Vec<(String, String, i32)>>,
    }

    impl RecordingSync {
        fn events(&self) -> Vec<(String, String, i32)> {
            self.events.lock().unwrap().clone()
        }
    }

    impl DocumentSync for RecordingSync {
        fn open_document(
            &self,
            uri: lsp_types::Uri,
            language_id: &str,
            version: i32,
            _text: String,
        ) -> Result<(), LspError> {
            self.events.lock().unwrap().push((
                format!("open:{}", language_id),
                uri.as_str().to_string(),
                version,
            ));
            Ok(())
        }

        fn change_document(
            &self,
            uri: lsp_types::Uri,
            version: i32,
            _text: String,
        ) -> Result<(), LspError> {
            self.events
                .lock()
                .unwrap()
                .push(("change".to_string(), uri.as_str().to_string(), version));
            Ok(())
        }
    }

    #[test]
    fn test_hash_is_content_sensitive() {
        assert_eq!(compute_hash("int x;"), compute_hash("int x;"));
        assert_ne!(compute_hash("int x;"), compute_hash("int y;"));
    }

    #[test]
    fn test_language_id_detection() {
        assert_eq!(language_id(Path::new("a.c")), "c");
        assert_eq!(language_id(Path::new("a.cpp")), "cpp");
        assert_eq!(language_id(Path::new("a.hpp")), "cpp");
        assert_eq!(language_id(Path::new("a.go")), "go");
        assert_eq!(language_id(Path::new("Makefile")), "cpp");
    }

    #[test]
    fn test_repeated_open_is_a_no_op() {
        let sync = RecordingSync::default();
        let mut tracker = OpenFileTracker::new();
        let path = Path::new("/src/math.cpp");

        let first = tracker
            .ensure_open(path, "int add();".to_string(), &sync)
            .unwrap();
        let second = tracker
            .ensure_open(path, "int add();".to_string(), &sync)
            .unwrap();

        assert_eq!(first, OpenOutcome::Opened);
        assert_eq!(second, OpenOutcome::Unchanged);
        assert_eq!(
            sync.events(),
            vec![(
                "open:cpp".to_string(),
                "file:///src/math.cpp".to_string(),
                1
            )]
        );
        assert!(tracker.is_open(path));
        assert_eq!(tracker.open_count(), 1);
    }

    #[test]
    fn test_changed_content_sends_change_with_new_version() {
        let sync = RecordingSync::default();
        let mut tracker = OpenFileTracker::new();
        let path = Path::new("/src/math.c");

        tracker
            .ensure_open(path, "int add();".to_string(), &sync)
            .unwrap();
        let outcome = tracker
            .ensure_open(path, "int add(int a);".to_string(), &sync)
            .unwrap();

        assert_eq!(outcome, OpenOutcome::Changed);
        assert_eq!(tracker.version(path), Some(2));
        let events = sync.events();
        assert_eq!(events[0].0, "open:c");
        assert_eq!(events[1].0, "change");
        assert_eq!(events[1].2, 2);
    }
}

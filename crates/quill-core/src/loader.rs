//! Access to resources referenced by a document
//!
//! The core never touches the file system itself: bibliography files,
//! included sources and media are read through a [`ResourceLoader`].

use std::collections::HashMap;

use crate::error::{QuillError, Result};

/// Reads resources by path
pub trait ResourceLoader {
    /// Read a text resource
    fn load_text(&self, path: &str) -> Result<String>;

    /// Read a binary resource
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.load_text(path).map(String::into_bytes)
    }
}

/// In-memory resources, for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource
    pub fn with(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

impl ResourceLoader for MemoryLoader {
    fn load_text(&self, path: &str) -> Result<String> {
        let bytes = self.load_bytes(path)?;
        String::from_utf8(bytes).map_err(|err| QuillError::Resource {
            path: path.to_string(),
            message: err.to_string(),
        })
    }

    fn load_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| QuillError::Resource {
                path: path.to_string(),
                message: "not found".to_string(),
            })
    }
}

//! File-system access for documents compiled from disk

use std::fs;
use std::path::{Path, PathBuf};

use quill_core::media::is_remote;
use quill_core::{QuillError, ResourceLoader, Result};
use tracing::debug;

/// Reads resources relative to the directory of the source document
#[derive(Debug, Clone)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Loader for resources next to `source`
    pub fn for_source(source: &Path) -> Self {
        let root = source
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, path: &str) -> Result<PathBuf> {
        if is_remote(path) {
            return Err(QuillError::Resource {
                path: path.to_string(),
                message: "remote resources are not fetched".to_string(),
            });
        }
        Ok(self.root.join(path))
    }
}

fn resource_error(path: &str, err: std::io::Error) -> QuillError {
    QuillError::Resource {
        path: path.to_string(),
        message: err.to_string(),
    }
}

impl ResourceLoader for FileLoader {
    fn load_text(&self, path: &str) -> Result<String> {
        let location = self.locate(path)?;
        debug!(path = %location.display(), "reading text resource");
        fs::read_to_string(&location).map_err(|err| resource_error(path, err))
    }

    fn load_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let location = self.locate(path)?;
        debug!(path = %location.display(), "reading binary resource");
        fs::read(&location).map_err(|err| resource_error(path, err))
    }
}

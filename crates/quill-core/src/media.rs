//! Media storage
//!
//! Images referenced by the document can be copied next to the output. Each
//! stored file gets a name derived from its path, so the same path always
//! maps to the same output file and two different paths never collide:
//!
//! ```text
//! images/My Cat.PNG  ->  media/my-cat@3f2a9c01.png
//! ```

use std::collections::{BTreeMap, HashSet};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::MediaStorageOptions;

/// Output directory of stored media
pub const MEDIA_DIRECTORY: &str = "media";

/// Whether a path points at a remote resource
pub fn is_remote(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Output file name of a media path
pub fn media_name(path: &str) -> String {
    let without_query = path.split(['?', '#']).next().unwrap_or(path);
    let file = without_query
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(without_query);
    let (stem, extension) = match file.rfind('.') {
        Some(dot) if dot > 0 => (&file[..dot], Some(&file[dot + 1..])),
        _ => (file, None),
    };

    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    let digest = hasher.finalize();
    let hash: String = digest[..4].iter().map(|b| format!("{b:02x}")).collect();

    let mut name = format!("{}@{hash}", sanitize(stem));
    if let Some(extension) = extension.map(sanitize).filter(|e| e != "media") {
        name.push('.');
        name.push_str(&extension);
    }
    name
}

/// Lowercase alphanumerics, with runs of anything else collapsed to `-`
fn sanitize(text: &str) -> String {
    let mut out = String::new();
    let mut dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if dash && !out.is_empty() {
                out.push('-');
            }
            dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            dash = true;
        }
    }
    if out.is_empty() {
        "media".to_string()
    } else {
        out
    }
}

/// A media file registered for export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    /// Path as written in the document
    pub path: String,
    /// File name within [`MEDIA_DIRECTORY`]
    pub name: String,
    pub remote: bool,
}

impl StoredMedia {
    /// Path of the stored file relative to the output root
    pub fn output_path(&self) -> String {
        format!("{MEDIA_DIRECTORY}/{}", self.name)
    }
}

/// Media registered during a compilation, keyed by source path
#[derive(Debug, Clone, Default)]
pub struct MediaStorage {
    entries: BTreeMap<String, StoredMedia>,
}

impl MediaStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path if the options allow storing it; returns the stored
    /// entry
    pub fn register(&mut self, path: &str, options: MediaStorageOptions) -> Option<&StoredMedia> {
        if path.is_empty() || path.starts_with("data:") || path.starts_with('#') {
            return None;
        }
        let remote = is_remote(path);
        if (remote && !options.remote) || (!remote && !options.local) {
            return None;
        }
        let entry = self.entries.entry(path.to_string()).or_insert_with(|| {
            let stored = StoredMedia {
                path: path.to_string(),
                name: media_name(path),
                remote,
            };
            debug!(path, name = %stored.name, "registered media");
            stored
        });
        Some(entry)
    }

    /// The output path a source path was stored under
    pub fn resolve(&self, path: &str) -> Option<String> {
        self.entries.get(path).map(StoredMedia::output_path)
    }

    /// Stored media, one per output name
    pub fn unique(&self) -> Vec<&StoredMedia> {
        let mut seen = HashSet::new();
        self.entries
            .values()
            .filter(|media| seen.insert(media.name.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

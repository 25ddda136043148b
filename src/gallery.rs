//! Local gallery of saved renders.
//!
//! The gallery is a small, capped, most-recent-first list of encoded images
//! kept in a JSON file inside the data directory. Each entry embeds the PNG
//! as a `data:` URL so the file is self-contained and can be inspected or
//! opened without any other state.
//!
//! # Eviction
//!
//! [`Gallery::add`] prepends and then truncates to the capacity (30 by
//! default). The oldest entries fall off the end; there is no other policy.
//!
//! # Storage
//!
//! ```text
//! <data-dir>/gallery-v1.json
//! {
//!   "version": 1,
//!   "entries": [
//!     { "id": "3f2a9c01b7de", "width": 1920, "height": 1080,
//!       "data_url": "data:image/png;base64,iVBORw0..." },
//!     ...
//!   ]
//! }
//! ```
//!
//! A missing file is an empty gallery. A file that fails to parse, or carries
//! a different version, is also treated as empty (and replaced on the next
//! save) so a corrupt gallery never blocks rendering.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the gallery file within the data directory.
pub const GALLERY_FILENAME: &str = "gallery-v1.json";

/// Default number of entries kept.
pub const DEFAULT_CAPACITY: usize = 30;

const GALLERY_VERSION: u32 = 1;
const PNG_DATA_PREFIX: &str = "data:image/png;base64,";

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Entry {0} is not a PNG data URL")]
    Encoding(usize),
    #[error("No gallery entry at index {index} ({len} saved)")]
    NoSuchEntry { index: usize, len: usize },
}

/// One saved render.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GalleryEntry {
    /// First 12 hex digits of the SHA-256 of the PNG bytes.
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub data_url: String,
}

impl GalleryEntry {
    pub fn from_png(png: &[u8], width: u32, height: u32) -> Self {
        Self {
            id: short_hash(png),
            width,
            height,
            data_url: format!("{PNG_DATA_PREFIX}{}", STANDARD.encode(png)),
        }
    }

    /// Decode the embedded PNG bytes.
    pub fn png_bytes(&self) -> Option<Vec<u8>> {
        let payload = self.data_url.strip_prefix(PNG_DATA_PREFIX)?;
        STANDARD.decode(payload).ok()
    }
}

fn short_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest[..6].iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug, Serialize, Deserialize)]
struct GalleryFile {
    version: u32,
    entries: Vec<GalleryEntry>,
}

/// A gallery bound to a file on disk.
#[derive(Debug)]
pub struct Gallery {
    path: PathBuf,
    capacity: usize,
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    /// Open the gallery in `data_dir`. Never fails: unreadable content is
    /// treated as an empty gallery.
    pub fn open(data_dir: &Path, capacity: usize) -> Self {
        let path = data_dir.join(GALLERY_FILENAME);
        let mut entries = load_entries(&path);
        entries.truncate(capacity);
        Self {
            path,
            capacity,
            entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent first.
    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&GalleryEntry, GalleryError> {
        self.entries.get(index).ok_or(GalleryError::NoSuchEntry {
            index,
            len: self.entries.len(),
        })
    }

    /// Prepend a PNG, drop anything past capacity, and persist.
    pub fn add(
        &mut self,
        png: &[u8],
        width: u32,
        height: u32,
    ) -> Result<&GalleryEntry, GalleryError> {
        self.entries.insert(0, GalleryEntry::from_png(png, width, height));
        let evicted = self.entries.len().saturating_sub(self.capacity);
        self.entries.truncate(self.capacity);
        if evicted > 0 {
            log::debug!("gallery full, dropped {evicted} oldest entries");
        }
        self.save()?;
        self.get(0)
    }

    /// Remove every entry and persist.
    pub fn clear(&mut self) -> Result<usize, GalleryError> {
        let removed = self.entries.len();
        self.entries.clear();
        self.save()?;
        Ok(removed)
    }

    /// Write entry `index` as a PNG file. Returns the byte count.
    pub fn export(&self, index: usize, dest: &Path) -> Result<usize, GalleryError> {
        let bytes = self
            .get(index)?
            .png_bytes()
            .ok_or(GalleryError::Encoding(index))?;
        std::fs::write(dest, &bytes)?;
        Ok(bytes.len())
    }

    fn save(&self) -> Result<(), GalleryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = GalleryFile {
            version: GALLERY_VERSION,
            entries: self.entries.clone(),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}

fn load_entries(path: &Path) -> Vec<GalleryEntry> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_str::<GalleryFile>(&content) {
        Ok(file) if file.version == GALLERY_VERSION => file.entries,
        Ok(file) => {
            log::warn!(
                "ignoring gallery {} with version {}",
                path.display(),
                file.version
            );
            Vec::new()
        }
        Err(e) => {
            log::warn!("ignoring unreadable gallery {}: {e}", path.display());
            Vec::new()
        }
    }
}

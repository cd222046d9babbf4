//! Storage backend trait and the file implementation.
//!
//! A backend moves a whole [`Document`] between memory and durable storage.
//! It knows nothing about locking or caching; [`super::Store`] provides both.

use crate::models::Document;
use crate::{Error, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Mode for a document created from scratch (owner rw, others read).
#[cfg(unix)]
pub const NEW_DOCUMENT_MODE: u32 = 0o644;

/// Trait for backends that persist the directory document.
pub trait DocumentBackend: Send + Sync {
    /// Read the full document, creating the default empty one if none exists.
    fn load(&self) -> Result<Document>;

    /// Persist the full document atomically.
    fn save(&self, doc: &Document) -> Result<()>;

    /// Get the storage location description (for display purposes).
    fn location(&self) -> String;
}

/// Single JSON file on the local filesystem.
///
/// Writes go to a temporary file in the same directory which is flushed,
/// synced and then renamed over the real path, so readers see either the
/// old or the new document and never a partial one.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Use `path` as the document, without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use `path` as the document, creating its parent directory if needed.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let backend = Self::new(path);
        if let Some(parent) = backend.parent_dir() {
            fs::create_dir_all(parent).map_err(|e| backend.access_error(e))?;
        }
        Ok(backend)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
    }

    /// Map an I/O error outside the write phase.
    fn access_error(&self, source: io::Error) -> Error {
        if source.kind() == io::ErrorKind::PermissionDenied {
            Error::AccessDenied {
                path: self.path.clone(),
                source,
            }
        } else {
            Error::Io(source)
        }
    }

    /// Map an I/O error during the temp-write/rename phase.
    fn write_error(&self, source: io::Error) -> Error {
        if source.kind() == io::ErrorKind::PermissionDenied {
            Error::AccessDenied {
                path: self.path.clone(),
                source,
            }
        } else {
            Error::WriteFailed {
                path: self.path.clone(),
                source,
            }
        }
    }

    /// Permissions the replacement file should carry: those of the current
    /// document, or [`NEW_DOCUMENT_MODE`] when there is none yet.
    fn target_permissions(&self) -> Result<Option<fs::Permissions>> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(meta.permissions())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    Ok(Some(fs::Permissions::from_mode(NEW_DOCUMENT_MODE)))
                }
                #[cfg(not(unix))]
                {
                    Ok(None)
                }
            }
            Err(e) => Err(self.write_error(e)),
        }
    }

    fn write_atomic(&self, bytes: &[u8]) -> Result<()> {
        let dir = self.parent_dir().unwrap_or_else(|| Path::new("."));

        // Dropping the temp file on any early return deletes it.
        let mut temp = NamedTempFile::new_in(dir).map_err(|e| self.write_error(e))?;
        temp.write_all(bytes).map_err(|e| self.write_error(e))?;
        temp.flush().map_err(|e| self.write_error(e))?;
        // The temp file starts owner-only; keep the mode readers rely on.
        if let Some(permissions) = self.target_permissions()? {
            temp.as_file()
                .set_permissions(permissions)
                .map_err(|e| self.write_error(e))?;
        }
        temp.as_file().sync_all().map_err(|e| self.write_error(e))?;
        temp.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        #[cfg(unix)]
        {
            // The rename already happened; a failed directory sync only
            // weakens durability across a power loss.
            if let Err(e) = fs::File::open(dir).and_then(|dir| dir.sync_all()) {
                warn!(dir = %dir.display(), error = %e, "Failed to sync document directory");
            }
        }
        Ok(())
    }
}

impl DocumentBackend for FileBackend {
    fn load(&self) -> Result<Document> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "Document missing, creating empty directory");
                let doc = Document::new();
                self.save(&doc)?;
                return Ok(doc);
            }
            Err(e) => return Err(self.access_error(e)),
        };

        let doc = serde_json::from_str(&contents).map_err(|source| {
            warn!(path = %self.path.display(), error = %source, "Document failed to parse");
            Error::CorruptDocument {
                path: self.path.clone(),
                source,
            }
        })?;
        debug!(path = %self.path.display(), bytes = contents.len(), "Loaded document");
        Ok(doc)
    }

    fn save(&self, doc: &Document) -> Result<()> {
        let json = to_document_json(doc).map_err(|e| self.write_error(e.into()))?;
        self.write_atomic(json.as_bytes())?;
        debug!(path = %self.path.display(), bytes = json.len(), "Saved document");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Canonical on-disk text: two-space indent, raw UTF-8, no trailing newline.
pub fn to_document_json(doc: &Document) -> serde_json::Result<String> {
    serde_json::to_string_pretty(doc)
}

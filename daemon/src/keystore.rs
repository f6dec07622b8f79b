//! Persistent API key storage.
//!
//! The key lives in a single file under the platform configuration
//! directory and is readable only by the owner on Unix.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DaemonError, Result};

/// File-backed API key store.
#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    /// Opens the store at the platform default location.
    pub fn open_default() -> Self {
        Self::at(default_key_path())
    }

    /// Opens a store backed by the given file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored key, or None if nothing has been saved.
    pub fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let key = contents.trim();
                Ok((!key.is_empty()).then(|| key.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DaemonError::key_store_failed(format!(
                "cannot read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Saves a key, replacing any previous one.
    pub fn save(&self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(DaemonError::key_store_failed("refusing to store an empty key"));
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DaemonError::key_store_failed(format!(
                    "cannot create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let write_err = |e: std::io::Error| {
            DaemonError::key_store_failed(format!("cannot write {}: {}", self.path.display(), e))
        };
        let mut file = open_private(&self.path).map_err(write_err)?;
        // A file left by an older save keeps its mode when opened.
        restrict_permissions(&self.path)?;
        file.write_all(key.as_bytes()).map_err(write_err)?;

        debug!(path = %self.path.display(), "API key saved");
        Ok(())
    }

    /// Removes the stored key. Clearing an empty store is not an error.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DaemonError::key_store_failed(format!(
                "cannot remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// Opens the key file for writing; new files are created owner-only.
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    File::create(path)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(|e| {
        DaemonError::key_store_failed(format!("cannot set permissions on {}: {}", path.display(), e))
    })
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Returns the platform-specific default key file.
///
/// - macOS: ~/Library/Application Support/genmedia/api_key
/// - Linux: ~/.config/genmedia/api_key
/// - Windows: C:\Users\<user>\AppData\Roaming\genmedia\config\api_key
fn default_key_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "genmedia") {
        proj_dirs.config_dir().join("api_key")
    } else {
        PathBuf::from("./genmedia_api_key")
    }
}

/// Masks a key for display, keeping the last four characters.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

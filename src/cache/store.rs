//! On-disk cache entries
//!
//! Layout: one file per entry, `{dir}/{digest}.{ext}`. Entries are written
//! through a uniquely named temporary file in the same directory and renamed
//! into place, so readers never observe a partially written image. Concurrent
//! writers of one key each use their own temp file and the last rename wins.
//! Entries that fail to decode are treated as missing and get overwritten by
//! the next render.

use super::key::CacheKey;
use crate::error::{MfenError, MfenResult};
use crate::output::{Encoding, MimeKind};
use image::RgbaImage;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where a cache entry lives: the file path and the public location string
/// handed to consumers that only need a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocation {
    pub path: PathBuf,
    pub public: String,
}

/// A cache hit: the stored bytes and their decoded image
#[derive(Debug, Clone)]
pub struct CachedImage {
    pub location: CacheLocation,
    pub bytes: Vec<u8>,
    pub image: RgbaImage,
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
    public_location: String,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>, public_location: impl Into<String>) -> Self {
        Self { dir: dir.into(), public_location: public_location.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `key` in `mime` format
    pub fn path_for(&self, key: &CacheKey, mime: MimeKind) -> PathBuf {
        self.dir.join(key.file_name(mime))
    }

    /// Location of the entry for `key`, whether or not it exists yet
    pub fn location_for(&self, key: &CacheKey, mime: MimeKind) -> CacheLocation {
        let file_name = key.file_name(mime);
        let public = match self.public_location.trim_end_matches('/') {
            "" if self.public_location.is_empty() => file_name.clone(),
            prefix => format!("{}/{}", prefix, file_name),
        };
        CacheLocation { path: self.dir.join(file_name), public }
    }

    /// Existence check only: the location of the entry if its file exists.
    ///
    /// The file is not decoded, so a corrupt entry still counts as present.
    pub fn contains(&self, key: &CacheKey, mime: MimeKind) -> Option<CacheLocation> {
        let location = self.location_for(key, mime);
        location.path.is_file().then_some(location)
    }

    /// Load and decode the entry for `key`.
    ///
    /// Missing, unreadable and undecodable entries all return `None`.
    pub fn lookup(&self, key: &CacheKey, encoding: &Encoding) -> Option<CachedImage> {
        let location = self.contains(key, encoding.mime)?;
        let bytes = match fs::read(&location.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %location.path.display(), error = %e, "unreadable cache entry, treating as miss");
                return None;
            }
        };
        match encoding.decode(&bytes) {
            Ok(image) => Some(CachedImage { location, bytes, image }),
            Err(e) => {
                tracing::warn!(path = %location.path.display(), error = %e, "corrupt cache entry, treating as miss");
                None
            }
        }
    }

    /// Write `bytes` as the entry for `key`, replacing any existing entry.
    ///
    /// # Errors
    ///
    /// `CacheDirectoryUnavailable` when the directory can't be created or
    /// made writable, `Io` when the write itself fails.
    pub fn store(&self, key: &CacheKey, mime: MimeKind, bytes: &[u8]) -> MfenResult<CacheLocation> {
        self.ensure_dir()?;

        let location = self.location_for(key, mime);
        // Unique per writer; dropped (and deleted) if the persist fails
        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", key.file_name(mime)))
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;
        temp.write_all(bytes)?;
        temp.persist(&location.path).map_err(|e| MfenError::Io(e.error))?;
        tracing::debug!(path = %location.path.display(), bytes = bytes.len(), "stored cache entry");
        Ok(location)
    }

    /// Create the cache directory if needed and make sure it is writable.
    pub fn ensure_dir(&self) -> MfenResult<()> {
        if !self.dir.is_dir() {
            fs::create_dir_all(&self.dir).map_err(|e| MfenError::cache_dir(&self.dir, e))?;
            tracing::info!(dir = %self.dir.display(), "created cache directory");
        }

        let metadata = fs::metadata(&self.dir).map_err(|e| MfenError::cache_dir(&self.dir, e))?;
        if metadata.permissions().readonly() {
            make_writable(&self.dir, metadata.permissions())
                .map_err(|e| MfenError::cache_dir(&self.dir, e))?;
        }
        Ok(())
    }

    /// Remove every cached image in the directory. Returns how many entries
    /// were deleted; a missing directory counts as empty.
    pub fn clear(&self) -> MfenResult<usize> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(MfenError::Io(e)),
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_cache_file(&path) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        tracing::info!(dir = %self.dir.display(), removed, "cleared cache");
        Ok(removed)
    }
}

/// Cache entries are `{64 hex digits}.{png|jpg}`
fn is_cache_file(path: &Path) -> bool {
    let ext_ok = matches!(path.extension().and_then(|e| e.to_str()), Some("png") | Some("jpg"));
    let stem_ok = path
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit()));
    ext_ok && stem_ok
}

#[cfg(unix)]
fn make_writable(dir: &Path, permissions: fs::Permissions) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = permissions;
    permissions.set_mode(permissions.mode() | 0o700);
    fs::set_permissions(dir, permissions)
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn make_writable(dir: &Path, permissions: fs::Permissions) -> std::io::Result<()> {
    let mut permissions = permissions;
    permissions.set_readonly(false);
    fs::set_permissions(dir, permissions)
}

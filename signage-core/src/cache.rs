// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Manifest cache on local storage
//!
//! The last accepted required-files and schedule manifests are kept as raw
//! bytes under fixed names in the save directory. They decide whether a
//! freshly fetched manifest changed, and the schedule copy stands in when
//! the CMS cannot be reached. Writes are atomic so an interrupted write
//! never leaves a truncated manifest behind.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::integrity::file_matches;
use crate::types::ScheduleManifest;

/// The two manifests the loop caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestKind {
    /// Required-files manifest
    RequiredFiles,
    /// Schedule manifest
    Schedule,
}

impl ManifestKind {
    /// Cache file name, kept compatible with existing player installs
    pub fn file_name(&self) -> &'static str {
        match self {
            ManifestKind::RequiredFiles => "rf.xml",
            ManifestKind::Schedule => "schedule.xml",
        }
    }
}

/// Raw-bytes cache of the last accepted manifests
pub struct ManifestCache {
    save_dir: PathBuf,
}

impl ManifestCache {
    /// Open the cache in `save_dir`, creating the directory owner-only if
    /// it doesn't exist.
    pub fn new(save_dir: &Path) -> Result<Self, CacheError> {
        create_private_dir(save_dir)?;
        Ok(Self {
            save_dir: save_dir.to_path_buf(),
        })
    }

    /// The storage directory
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Location of a cached manifest
    pub fn path(&self, kind: ManifestKind) -> PathBuf {
        self.save_dir.join(kind.file_name())
    }

    /// Returns true if the cached manifest exists and its checksum equals
    /// `expected_hash`.
    pub fn is_unchanged(&self, kind: ManifestKind, expected_hash: &str) -> bool {
        file_matches(&self.path(kind), expected_hash)
    }

    /// Replace the cached manifest with `raw`
    pub fn save(&self, kind: ManifestKind, raw: &[u8]) -> Result<(), CacheError> {
        let path = self.path(kind);
        atomic_write(&path, raw)?;
        debug!(path = %path.display(), bytes = raw.len(), "manifest cached");
        Ok(())
    }

    /// Raw bytes of a cached manifest, if present
    pub fn load(&self, kind: ManifestKind) -> Option<Vec<u8>> {
        fs::read(self.path(kind)).ok()
    }

    /// Decode the cached schedule.
    ///
    /// Returns `None` when nothing is cached or the bytes don't decode.
    pub fn load_fallback<F, E>(&self, decode: F) -> Option<ScheduleManifest>
    where
        F: FnOnce(&[u8]) -> Result<ScheduleManifest, E>,
        E: std::fmt::Display,
    {
        let raw = self.load(ManifestKind::Schedule)?;
        match decode(&raw) {
            Ok(schedule) => Some(schedule),
            Err(e) => {
                debug!(error = %e, "cached schedule unreadable");
                None
            }
        }
    }
}

/// Atomic file write
///
/// Data goes to a sibling temp file which is flushed and synced before
/// being renamed over `path`. Either the old content remains or the new
/// content is fully on storage.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let temp_path = temp_path(path);

    if let Err(e) = write_synced(&temp_path, data) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path)
}

fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.flush()?;
    file.sync_all()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

pub(crate) fn create_private_dir(dir: &Path) -> io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

/// Errors that can occur with the manifest cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

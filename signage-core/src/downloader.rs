// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! File downloader
//!
//! Brings local storage in line with a required-files manifest, one
//! descriptor at a time:
//! - resources are always fetched
//! - media and layouts are skipped when the local copy matches the
//!   advertised checksum
//! - every write is atomic and synced before the next descriptor starts
//!
//! A failing descriptor is logged and reported; the batch carries on.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cache::atomic_write;
use crate::client::{DisplayClient, RemoteError};
use crate::config::SyncConfig;
use crate::events::{EventDispatcher, SyncEvent};
use crate::integrity::{file_matches, verify_checksum};
use crate::sync::StopSignal;
use crate::types::{FileDescriptor, ResourceFile};

/// What happened to a single descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Bytes were fetched and written
    Downloaded,
    /// Local copy already matched; no network call was made
    Skipped,
}

/// Result of a download batch
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Descriptors fetched and written
    pub downloaded: usize,
    /// Descriptors already present locally
    pub skipped: usize,
    /// Failed descriptors as (target, error)
    pub failed: Vec<(String, String)>,
    /// True if a stop request abandoned the rest of the batch
    pub aborted: bool,
}

/// Downloads required files into the save directory
#[derive(Debug, Clone)]
pub struct FileDownloader {
    save_dir: PathBuf,
    resource_ext: String,
    layout_ext: String,
}

impl FileDownloader {
    /// Creates a downloader writing below `save_dir`
    pub fn new(
        save_dir: impl Into<PathBuf>,
        resource_ext: impl Into<String>,
        layout_ext: impl Into<String>,
    ) -> Self {
        FileDownloader {
            save_dir: save_dir.into(),
            resource_ext: resource_ext.into(),
            layout_ext: layout_ext.into(),
        }
    }

    /// Downloader using the config's directory and extensions
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            config.save_dir.clone(),
            config.resource_ext.clone(),
            config.layout_ext.clone(),
        )
    }

    /// Local path a descriptor is stored at.
    ///
    /// Fails for paths that would escape the save directory.
    pub fn local_path(&self, file: &FileDescriptor) -> Result<PathBuf, DownloadError> {
        match file {
            FileDescriptor::Resource(resource) => {
                let name = format!(
                    "{}_{}_{}{}",
                    resource.layout_id, resource.region_id, resource.media_id, self.resource_ext
                );
                let mut components = Path::new(&name).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => Ok(self.save_dir.join(name)),
                    _ => Err(DownloadError::UnsafePath(name)),
                }
            }
            FileDescriptor::Media(media) => self.relative(&media.path, ""),
            FileDescriptor::Layout(layout) => self.relative(&layout.path, &self.layout_ext),
        }
    }

    fn relative(&self, path: &str, ext: &str) -> Result<PathBuf, DownloadError> {
        let relative = format!("{}{}", path, ext);
        let components = Path::new(&relative).components();
        let safe = !path.is_empty()
            && components
                .clone()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        let normalized: PathBuf = components
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();

        if safe && !normalized.as_os_str().is_empty() {
            Ok(self.save_dir.join(normalized))
        } else {
            Err(DownloadError::UnsafePath(relative))
        }
    }

    /// Processes a batch in order.
    ///
    /// The stop signal is checked before each descriptor; once it is set
    /// the remaining descriptors are left for a later cycle.
    pub fn download_all<C: DisplayClient + ?Sized>(
        &self,
        client: &mut C,
        files: &[FileDescriptor],
        events: &EventDispatcher,
        stop: &StopSignal,
    ) -> DownloadReport {
        let mut report = DownloadReport::default();

        for file in files {
            if stop.is_requested() {
                info!(
                    remaining = files.len() - report.downloaded - report.skipped - report.failed.len(),
                    "stop requested, abandoning download batch"
                );
                report.aborted = true;
                break;
            }

            match self.download(client, file, events) {
                Ok(DownloadOutcome::Downloaded) => report.downloaded += 1,
                Ok(DownloadOutcome::Skipped) => report.skipped += 1,
                Err(e) => report.failed.push((describe(file), e.to_string())),
            }
        }

        report
    }

    /// Makes local storage reflect one descriptor.
    pub fn download<C: DisplayClient + ?Sized>(
        &self,
        client: &mut C,
        file: &FileDescriptor,
        events: &EventDispatcher,
    ) -> Result<DownloadOutcome, DownloadError> {
        let path = self.local_path(file).inspect_err(|e| {
            warn!(file = %describe(file), error = %e, "refusing download");
        })?;

        let (fetched, expected) = match file {
            FileDescriptor::Resource(resource) => {
                emit_started(events, file, &path);
                (client.get_resource(resource), None)
            }
            FileDescriptor::Media(media) | FileDescriptor::Layout(media) => {
                if file_matches(&path, &media.checksum) {
                    debug!(path = %path.display(), "checksum match, skipping");
                    return Ok(DownloadOutcome::Skipped);
                }
                emit_started(events, file, &path);
                (client.get_file(media, file.kind()), Some(media.checksum.as_str()))
            }
        };

        let data = fetched.inspect_err(|e| {
            warn!(path = %path.display(), error = %e, "download failed");
        })?;

        // Stored anyway; the next manifest change fetches it again
        if let Some(Err(e)) = expected.map(|expected| verify_checksum(&data, expected)) {
            warn!(path = %path.display(), error = %e, "downloaded content failed verification");
        }

        write_file(&path, &data).inspect_err(|e| {
            error!(path = %path.display(), error = %e, "download failed");
        })?;

        info!(kind = %file.kind(), path = %path.display(), bytes = data.len(), "downloaded");
        events.dispatch(SyncEvent::DownloadCompleted { file: file.clone() });
        Ok(DownloadOutcome::Downloaded)
    }
}

fn emit_started(events: &EventDispatcher, file: &FileDescriptor, path: &Path) {
    events.dispatch(SyncEvent::DownloadStarted {
        kind: file.kind(),
        path: path.to_path_buf(),
    });
}

fn write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    atomic_write(path, data)
}

fn describe(file: &FileDescriptor) -> String {
    match file {
        FileDescriptor::Resource(ResourceFile {
            layout_id,
            region_id,
            media_id,
        }) => format!("resource {}/{}/{}", layout_id, region_id, media_id),
        FileDescriptor::Media(media) | FileDescriptor::Layout(media) => {
            format!("{} {} ({})", file.kind(), media.id, media.path)
        }
    }
}

/// Errors for a single descriptor
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The CMS call failed
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Writing the file failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The descriptor names a path outside the save directory
    #[error("unsafe path: {0}")]
    UnsafePath(String),
}

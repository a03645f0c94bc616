// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Signage Core Library
//!
//! Synchronization core of a digital-signage player. Polls the CMS, keeps
//! media and layouts on local storage current, and decides which layout
//! the display should show.
//! All checksums use the audited `ring` crate.

pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod downloader;
pub mod events;
pub mod integrity;
pub mod schedule;
pub mod sync;
pub mod types;

pub use cache::{CacheError, ManifestCache, ManifestKind};
pub use client::{
    DisplayClient, DisplayStatus, MockDisplayClient, RegisterResult, RemoteError, RemoteResult,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, SyncConfig};
pub use downloader::{DownloadError, DownloadOutcome, DownloadReport, FileDownloader};
pub use events::{CallbackHandler, ChannelHandler, EventDispatcher, EventHandler, SyncEvent};
pub use integrity::{checksum_file, compute_checksum, verify_checksum, IntegrityError};
pub use schedule::{ScheduleError, ScheduleEvaluator};
pub use sync::{
    CycleReport, LoopState, RequiredFilesOutcome, RunningGuard, ScheduleSource, StopSignal,
    SyncController, SyncError, SyncHandle, SyncLoop, SyncResult,
};
pub use types::{
    ActiveLayout, FileDescriptor, FileKind, MediaFile, RequiredFilesManifest, ResourceFile,
    ScheduleEntry, ScheduleManifest,
};

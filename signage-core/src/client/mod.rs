// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! CMS Client Trait
//!
//! The synchronization loop talks to the CMS through [`DisplayClient`].
//! The wire protocol, its encoding and authentication live in the
//! implementation; the loop only sees decoded manifests and file bytes.
//!
//! # Synchronous Interface
//!
//! Calls block until the CMS answers or the implementation gives up.
//! Every call may fail, and a failure is always reported as an error,
//! never as an empty or unchanged result.

mod mock;

pub use mock::{MockCalls, MockDisplayClient};

use std::time::Duration;

use thiserror::Error;

use crate::types::{
    FileKind, MediaFile, RequiredFilesManifest, ResourceFile, ScheduleManifest,
};

/// Result type for CMS calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Registration status reported by the CMS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayStatus {
    /// Display is licensed and may sync.
    Ready,
    /// Display was just added and awaits authorization.
    Added,
    /// Display is known but not yet authorized.
    Waiting,
    /// Any other status code.
    Other(String),
}

impl DisplayStatus {
    /// Map a CMS status code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "READY" => DisplayStatus::Ready,
            "ADDED" => DisplayStatus::Added,
            "WAITING" => DisplayStatus::Waiting,
            other => DisplayStatus::Other(other.to_string()),
        }
    }
}

/// Answer to a display registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterResult {
    /// Registration status.
    pub status: DisplayStatus,
    /// Human readable message from the CMS.
    pub message: String,
    /// Poll interval advertised by the CMS, if any.
    pub collect_interval: Option<Duration>,
}

impl RegisterResult {
    /// A ready registration advertising `collect_interval`.
    pub fn ready(collect_interval: Option<Duration>) -> Self {
        RegisterResult {
            status: DisplayStatus::Ready,
            message: "Display is active and ready to start.".to_string(),
            collect_interval,
        }
    }

    /// Returns true if the display may sync.
    pub fn is_ready(&self) -> bool {
        self.status == DisplayStatus::Ready
    }
}

/// Client for the CMS display service.
///
/// Implemented by the protocol layer; [`MockDisplayClient`] serves tests.
pub trait DisplayClient: Send {
    /// Registers the display and reads its settings.
    fn register_display(&mut self) -> RemoteResult<RegisterResult>;

    /// Fetches the required-files manifest.
    fn required_files(&mut self) -> RemoteResult<RequiredFilesManifest>;

    /// Fetches the schedule manifest.
    fn schedule(&mut self) -> RemoteResult<ScheduleManifest>;

    /// Fetches a media or layout file.
    fn get_file(&mut self, file: &MediaFile, kind: FileKind) -> RemoteResult<Vec<u8>>;

    /// Fetches a rendered region resource.
    fn get_resource(&mut self, resource: &ResourceFile) -> RemoteResult<Vec<u8>>;

    /// Decodes a schedule payload previously returned by [`schedule`].
    ///
    /// Used to read the cached schedule when the CMS is unreachable.
    ///
    /// [`schedule`]: DisplayClient::schedule
    fn decode_schedule(&self, raw: &[u8]) -> RemoteResult<ScheduleManifest>;
}

/// Errors reported by a [`DisplayClient`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// Network or transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The CMS answered with a protocol-level fault.
    #[error("CMS fault {code}: {message}")]
    Fault {
        /// Fault code.
        code: String,
        /// Fault description.
        message: String,
    },

    /// The display is not authorized for this call.
    #[error("display not authorized: {0}")]
    NotAuthorized(String),

    /// A payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

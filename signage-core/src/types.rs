// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Manifest and file types exchanged with the CMS
//!
//! These types describe what the CMS wants on disk (the required-files
//! manifest), when each layout should play (the schedule manifest), and
//! the layout decision handed to the renderer.

use serde::{Deserialize, Serialize};

use crate::integrity::compute_checksum;

/// Kind of a required file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Region resource rendered by the CMS (e.g. a text or ticker widget)
    Resource,
    /// Media file (image, video, ...)
    Media,
    /// Layout definition
    Layout,
}

impl FileKind {
    /// Wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Resource => "resource",
            FileKind::Media => "media",
            FileKind::Layout => "layout",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resource identified by its position in a layout.
///
/// Resources carry no checksum, so they are fetched every time the
/// required-files manifest changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFile {
    /// Layout the resource belongs to
    pub layout_id: String,
    /// Region within the layout
    pub region_id: String,
    /// Media item within the region
    pub media_id: String,
}

/// A media or layout file stored under the save directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    /// CMS file id
    pub id: u64,
    /// Path relative to the save directory
    pub path: String,
    /// Size hint in bytes
    pub size: u64,
    /// Expected checksum in format "sha256:hexstring"
    pub checksum: String,
}

/// One entry of the required-files manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileDescriptor {
    /// Region resource
    Resource(ResourceFile),
    /// Media file
    Media(MediaFile),
    /// Layout file
    Layout(MediaFile),
}

impl FileDescriptor {
    /// The kind of this descriptor
    pub fn kind(&self) -> FileKind {
        match self {
            FileDescriptor::Resource(_) => FileKind::Resource,
            FileDescriptor::Media(_) => FileKind::Media,
            FileDescriptor::Layout(_) => FileKind::Layout,
        }
    }
}

/// Files the CMS requires the display to hold locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFilesManifest {
    /// Descriptors in manifest order
    pub files: Vec<FileDescriptor>,
    /// Raw payload as received from the CMS
    pub raw: Vec<u8>,
}

impl RequiredFilesManifest {
    /// Checksum of the raw payload
    pub fn content_hash(&self) -> String {
        compute_checksum(&self.raw)
    }
}

/// A scheduled layout with its validity window.
///
/// Times are CMS wall-clock strings; see
/// [`ScheduleEvaluator`](crate::schedule::ScheduleEvaluator) for how they
/// are interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Layout to play
    pub layout_id: String,
    /// Schedule event id
    pub schedule_id: String,
    /// Start of the window (inclusive)
    pub from_dt: String,
    /// End of the window (inclusive)
    pub to_dt: String,
    /// Priority flag as sent by the CMS. Not used for selection.
    #[serde(default)]
    pub priority: u32,
}

/// The display's schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleManifest {
    /// Scheduled layouts in manifest order; first match wins
    pub entries: Vec<ScheduleEntry>,
    /// Layout to play when no entry is active
    pub default_layout: String,
    /// Raw payload as received from the CMS
    pub raw: Vec<u8>,
}

impl ScheduleManifest {
    /// Checksum of the raw payload
    pub fn content_hash(&self) -> String {
        compute_checksum(&self.raw)
    }
}

/// The layout the display should be showing now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveLayout {
    /// Layout id
    pub layout_id: String,
    /// Schedule event id, `None` when the default layout is active
    pub schedule_id: Option<String>,
    /// Validity window in epoch seconds, `(0, 0)` for the default layout
    pub window: (i64, i64),
}

impl ActiveLayout {
    /// Decision for the manifest's default layout
    pub fn default_layout(layout_id: impl Into<String>) -> Self {
        ActiveLayout {
            layout_id: layout_id.into(),
            schedule_id: None,
            window: (0, 0),
        }
    }

    /// Returns true if this is the default-layout decision.
    pub fn is_default(&self) -> bool {
        self.schedule_id.is_none()
    }
}

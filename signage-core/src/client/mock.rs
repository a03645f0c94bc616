// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory CMS for tests.
//!
//! Clones share state, so a test keeps one handle to script responses and
//! read call counts while the loop owns another. Manifest payloads are
//! JSON documents.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use super::{DisplayClient, RegisterResult, RemoteError, RemoteResult};
use crate::types::{
    FileDescriptor, FileKind, MediaFile, RequiredFilesManifest, ResourceFile, ScheduleEntry,
    ScheduleManifest,
};

/// Number of calls made to each CMS method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockCalls {
    /// `register_display` calls.
    pub register: usize,
    /// `required_files` calls.
    pub required_files: usize,
    /// `schedule` calls.
    pub schedule: usize,
    /// `get_file` calls.
    pub get_file: usize,
    /// `get_resource` calls.
    pub get_resource: usize,
}

impl MockCalls {
    /// Calls that transfer file content.
    pub fn transfers(&self) -> usize {
        self.get_file + self.get_resource
    }
}

#[derive(Serialize, Deserialize)]
struct RequiredFilesDocument {
    files: Vec<FileDescriptor>,
}

#[derive(Serialize, Deserialize)]
struct ScheduleDocument {
    default_layout: String,
    entries: Vec<ScheduleEntry>,
}

type ResourceKey = (String, String, String);

struct MockState {
    register: RemoteResult<RegisterResult>,
    required_files: RemoteResult<RequiredFilesManifest>,
    schedule: RemoteResult<ScheduleManifest>,
    files: HashMap<u64, Vec<u8>>,
    resources: HashMap<ResourceKey, Vec<u8>>,
    calls: MockCalls,
}

impl Default for MockState {
    fn default() -> Self {
        MockState {
            register: Ok(RegisterResult::ready(None)),
            required_files: Ok(MockDisplayClient::required_files_manifest(Vec::new())),
            schedule: Err(RemoteError::Transport("no schedule scripted".into())),
            files: HashMap::new(),
            resources: HashMap::new(),
            calls: MockCalls::default(),
        }
    }
}

/// Scriptable in-memory [`DisplayClient`].
#[derive(Clone, Default)]
pub struct MockDisplayClient {
    state: Arc<Mutex<MockState>>,
}

impl MockDisplayClient {
    /// Creates a client that registers as ready, requires no files and
    /// fails schedule requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a required-files manifest with a JSON payload.
    pub fn required_files_manifest(files: Vec<FileDescriptor>) -> RequiredFilesManifest {
        let document = RequiredFilesDocument { files };
        let raw = serde_json::to_vec(&document).unwrap_or_default();
        RequiredFilesManifest {
            files: document.files,
            raw,
        }
    }

    /// Builds a schedule manifest with a JSON payload.
    pub fn schedule_manifest(
        default_layout: impl Into<String>,
        entries: Vec<ScheduleEntry>,
    ) -> ScheduleManifest {
        let document = ScheduleDocument {
            default_layout: default_layout.into(),
            entries,
        };
        let raw = serde_json::to_vec(&document).unwrap_or_default();
        ScheduleManifest {
            entries: document.entries,
            default_layout: document.default_layout,
            raw,
        }
    }

    /// Scripts the registration answer.
    pub fn set_register(&self, result: RemoteResult<RegisterResult>) {
        self.state().register = result;
    }

    /// Scripts the required-files manifest.
    pub fn set_required_files(&self, files: Vec<FileDescriptor>) {
        self.state().required_files = Ok(Self::required_files_manifest(files));
    }

    /// Makes required-files requests fail.
    pub fn fail_required_files(&self, error: RemoteError) {
        self.state().required_files = Err(error);
    }

    /// Scripts the schedule manifest.
    pub fn set_schedule(&self, default_layout: impl Into<String>, entries: Vec<ScheduleEntry>) {
        self.state().schedule = Ok(Self::schedule_manifest(default_layout, entries));
    }

    /// Makes schedule requests fail.
    pub fn fail_schedule(&self, error: RemoteError) {
        self.state().schedule = Err(error);
    }

    /// Serves `data` for file `id`.
    pub fn add_file(&self, id: u64, data: &[u8]) {
        self.state().files.insert(id, data.to_vec());
    }

    /// Serves `data` for a resource.
    pub fn add_resource(&self, layout_id: &str, region_id: &str, media_id: &str, data: &[u8]) {
        self.state().resources.insert(
            (
                layout_id.to_string(),
                region_id.to_string(),
                media_id.to_string(),
            ),
            data.to_vec(),
        );
    }

    /// Call counts so far.
    pub fn calls(&self) -> MockCalls {
        self.state().calls.clone()
    }

    /// Resets call counts.
    pub fn reset_calls(&self) {
        self.state().calls = MockCalls::default();
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DisplayClient for MockDisplayClient {
    fn register_display(&mut self) -> RemoteResult<RegisterResult> {
        let mut state = self.state();
        state.calls.register += 1;
        state.register.clone()
    }

    fn required_files(&mut self) -> RemoteResult<RequiredFilesManifest> {
        let mut state = self.state();
        state.calls.required_files += 1;
        state.required_files.clone()
    }

    fn schedule(&mut self) -> RemoteResult<ScheduleManifest> {
        let mut state = self.state();
        state.calls.schedule += 1;
        state.schedule.clone()
    }

    fn get_file(&mut self, file: &MediaFile, kind: FileKind) -> RemoteResult<Vec<u8>> {
        let mut state = self.state();
        state.calls.get_file += 1;
        state.files.get(&file.id).cloned().ok_or_else(|| RemoteError::Fault {
            code: "Sender".into(),
            message: format!("unknown {} {}", kind, file.id),
        })
    }

    fn get_resource(&mut self, resource: &ResourceFile) -> RemoteResult<Vec<u8>> {
        let mut state = self.state();
        state.calls.get_resource += 1;
        let key = (
            resource.layout_id.clone(),
            resource.region_id.clone(),
            resource.media_id.clone(),
        );
        state.resources.get(&key).cloned().ok_or_else(|| RemoteError::Fault {
            code: "Sender".into(),
            message: format!("unknown resource {}/{}/{}", key.0, key.1, key.2),
        })
    }

    fn decode_schedule(&self, raw: &[u8]) -> RemoteResult<ScheduleManifest> {
        let document: ScheduleDocument =
            serde_json::from_slice(raw).map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(ScheduleManifest {
            entries: document.entries,
            default_layout: document.default_layout,
            raw: raw.to_vec(),
        })
    }
}

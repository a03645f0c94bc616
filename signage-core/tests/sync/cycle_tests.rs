// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for a single synchronization cycle
//!
//! Scenarios:
//! - Unchanged required files trigger no downloads
//! - A failed schedule request falls back to the cached schedule
//! - The decision is published every cycle

use std::fs::{self, File};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use signage_core::{
    DisplayStatus, ManifestKind, ManualClock, MockDisplayClient, RegisterResult, RemoteError,
    RequiredFilesOutcome, ScheduleSource,
};
use tempfile::TempDir;

use super::support::{entry, media_descriptor, new_loop, Recorder};

#[test]
fn test_unchanged_required_files_skip_downloads() {
    let temp = TempDir::new().unwrap();
    let client = MockDisplayClient::new();
    client.add_file(1, b"image");
    client.set_required_files(vec![media_descriptor(1, "1.png", b"image")]);
    let recorder = Arc::new(Recorder::default());
    let mut sync_loop = new_loop(&temp, &client, &ManualClock::new(0), &recorder);

    let first = sync_loop.run_cycle();
    match first.required_files {
        RequiredFilesOutcome::Applied(report) => assert_eq!(report.downloaded, 1),
        other => panic!("expected applied manifest, got {:?}", other),
    }
    assert_eq!(recorder.downloads_started(), 1);
    let transfers = client.calls().transfers();

    recorder.clear();
    let second = sync_loop.run_cycle();

    assert_eq!(second.required_files, RequiredFilesOutcome::Unchanged);
    assert_eq!(recorder.downloads_started(), 0);
    assert_eq!(client.calls().transfers(), transfers);
}

#[test]
fn test_unchanged_manifests_are_not_rewritten() {
    let temp = TempDir::new().unwrap();
    let client = MockDisplayClient::new();
    client.add_file(1, b"image");
    client.set_required_files(vec![media_descriptor(1, "1.png", b"image")]);
    client.set_schedule("Default", vec![entry("L1", 100, 200)]);
    let recorder = Arc::new(Recorder::default());
    let mut sync_loop = new_loop(&temp, &client, &ManualClock::new(150), &recorder);
    sync_loop.run_cycle();

    // Backdate both cached manifests; a rewrite would replace the file
    let marker = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
    let kinds = [ManifestKind::RequiredFiles, ManifestKind::Schedule];
    for kind in kinds {
        File::options()
            .write(true)
            .open(sync_loop.cache().path(kind))
            .unwrap()
            .set_modified(marker)
            .unwrap();
    }

    let report = sync_loop.run_cycle();

    assert_eq!(report.required_files, RequiredFilesOutcome::Unchanged);
    assert_eq!(report.schedule_source, ScheduleSource::Remote);
    for kind in kinds {
        let modified = fs::metadata(sync_loop.cache().path(kind))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(modified, marker, "{:?} was rewritten", kind);
    }
}

#[test]
fn test_changed_required_files_are_applied() {
    let temp = TempDir::new().unwrap();
    let client = MockDisplayClient::new();
    client.add_file(1, b"one");
    client.add_file(2, b"two");
    client.set_required_files(vec![media_descriptor(1, "1.png", b"one")]);
    let recorder = Arc::new(Recorder::default());
    let mut sync_loop = new_loop(&temp, &client, &ManualClock::new(0), &recorder);
    sync_loop.run_cycle();

    client.set_required_files(vec![
        media_descriptor(1, "1.png", b"one"),
        media_descriptor(2, "2.png", b"two"),
    ]);
    let report = sync_loop.run_cycle();

    match report.required_files {
        RequiredFilesOutcome::Applied(report) => {
            assert_eq!(report.downloaded, 1);
            assert_eq!(report.skipped, 1);
        }
        other => panic!("expected applied manifest, got {:?}", other),
    }
    assert!(temp.path().join("res/2.png").is_file());
}

#[test]
fn test_required_files_manifest_cached_before_downloads() {
    let temp = TempDir::new().unwrap();
    let client = MockDisplayClient::new();
    // Nothing served for id 9, so the download fails
    client.set_required_files(vec![media_descriptor(9, "9.png", b"nine")]);
    let recorder = Arc::new(Recorder::default());
    let mut sync_loop = new_loop(&temp, &client, &ManualClock::new(0), &recorder);

    let report = sync_loop.run_cycle();

    match report.required_files {
        RequiredFilesOutcome::Applied(report) => assert_eq!(report.failed.len(), 1),
        other => panic!("expected applied manifest, got {:?}", other),
    }
    let expected = MockDisplayClient::required_files_manifest(vec![media_descriptor(
        9, "9.png", b"nine",
    )]);
    assert_eq!(
        sync_loop.cache().load(ManifestKind::RequiredFiles).unwrap(),
        expected.raw
    );
}

#[test]
fn test_required_files_failure_does_not_stop_cycle() {
    let temp = TempDir::new().unwrap();
    let client = MockDisplayClient::new();
    client.fail_required_files(RemoteError::Transport("connection refused".into()));
    client.set_schedule("Default", vec![entry("L1", 100, 200)]);
    let recorder = Arc::new(Recorder::default());
    let mut sync_loop = new_loop(&temp, &client, &ManualClock::new(150), &recorder);

    let report = sync_loop.run_cycle();

    assert!(matches!(
        report.required_files,
        RequiredFilesOutcome::FetchFailed(_)
    ));
    assert_eq!(report.schedule_source, ScheduleSource::Remote);
    assert_eq!(recorder.layouts(), vec!["L1".to_string()]);
}

#[test]
fn test_unready_display_still_syncs() {
    let temp = TempDir::new().unwrap();
    let client = MockDisplayClient::new();
    client.set_register(Ok(RegisterResult {
        status: DisplayStatus::Waiting,
        message: "Display is awaiting licensing.".into(),
        collect_interval: None,
    }));
    client.set_schedule("Default", Vec::new());
    let recorder = Arc::new(Recorder::default());
    let mut sync_loop = new_loop(&temp, &client, &ManualClock::new(0), &recorder);

    let report = sync_loop.run_cycle();

    assert!(!report.registered);
    assert_eq!(client.calls().required_files, 1);
    assert_eq!(client.calls().schedule, 1);
    assert_eq!(recorder.layouts(), vec!["Default".to_string()]);
}

#[test]
fn test_schedule_cached_when_fetched() {
    let temp = TempDir::new().unwrap();
    let client = MockDisplayClient::new();
    let entries = vec![entry("L1", 100, 200)];
    client.set_schedule("Default", entries.clone());
    let recorder = Arc::new(Recorder::default());
    let mut sync_loop = new_loop(&temp, &client, &ManualClock::new(0), &recorder);

    let report = sync_loop.run_cycle();

    assert_eq!(report.schedule_source, ScheduleSource::Remote);
    let expected = MockDisplayClient::schedule_manifest("Default", entries);
    assert_eq!(
        fs::read(temp.path().join("res/schedule.xml")).unwrap(),
        expected.raw
    );
}

#[test]
fn test_failed_schedule_uses_cached_copy() {
    let temp = TempDir::new().unwrap();
    let client = MockDisplayClient::new();
    let recorder = Arc::new(Recorder::default());
    let mut sync_loop = new_loop(&temp, &client, &ManualClock::new(175), &recorder);

    let cached = MockDisplayClient::schedule_manifest(
        "Default",
        vec![entry("L1", 100, 200), entry("L2", 150, 250)],
    );
    sync_loop
        .cache()
        .save(ManifestKind::Schedule, &cached.raw)
        .unwrap();
    client.fail_schedule(RemoteError::Fault {
        code: "Receiver".into(),
        message: "database unavailable".into(),
    });

    let report = sync_loop.run_cycle();

    assert_eq!(report.schedule_source, ScheduleSource::Cache);
    assert_eq!(report.decision.unwrap().layout_id, "L1");
    assert_eq!(recorder.layouts(), vec!["L1".to_string()]);
}

#[test]
fn test_cache_survives_failed_fetch_between_cycles() {
    let temp = TempDir::new().unwrap();
    let client = MockDisplayClient::new();
    client.set_schedule("Default", vec![entry("L1", 100, 200)]);
    let clock = ManualClock::new(150);
    let recorder = Arc::new(Recorder::default());
    let mut sync_loop = new_loop(&temp, &client, &clock, &recorder);
    sync_loop.run_cycle();

    client.fail_schedule(RemoteError::Transport("timed out".into()));
    clock.set(300);
    let report = sync_loop.run_cycle();

    assert_eq!(report.schedule_source, ScheduleSource::Cache);
    assert_eq!(recorder.layouts(), vec!["L1".to_string(), "Default".to_string()]);
}

#[test]
fn test_decision_published_every_cycle() {
    let temp = TempDir::new().unwrap();
    let client = MockDisplayClient::new();
    client.set_schedule(
        "Default",
        vec![entry("L1", 100, 200), entry("L2", 150, 250)],
    );
    let clock = ManualClock::new(175);
    let recorder = Arc::new(Recorder::default());
    let mut sync_loop = new_loop(&temp, &client, &clock, &recorder);

    sync_loop.run_cycle();
    sync_loop.run_cycle();
    clock.set(225);
    sync_loop.run_cycle();

    assert_eq!(
        recorder.layouts(),
        vec!["L1".to_string(), "L1".to_string(), "L2".to_string()]
    );
    assert_eq!(sync_loop.last_decision().unwrap().window, (150, 250));
}

#[test]
fn test_collect_interval_from_registration() {
    let temp = TempDir::new().unwrap();
    let client = MockDisplayClient::new();
    client.set_register(Ok(RegisterResult::ready(Some(
        std::time::Duration::from_secs(900),
    ))));
    let recorder = Arc::new(Recorder::default());
    let mut sync_loop = new_loop(&temp, &client, &ManualClock::new(0), &recorder);

    let report = sync_loop.run_cycle();

    assert!(report.registered);
    assert_eq!(report.poll_interval.as_secs(), 900);
}

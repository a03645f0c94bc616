// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the manifest cache
//!
//! Scenarios:
//! - Detect unchanged manifests
//! - Fall back to the cached schedule

use signage_core::{
    DisplayClient, ManifestCache, ManifestKind, MockDisplayClient, RemoteError,
};
use tempfile::TempDir;

use super::support::entry;

#[test]
fn test_cache_file_names() {
    let temp = TempDir::new().unwrap();
    let cache = ManifestCache::new(temp.path()).unwrap();

    assert_eq!(cache.path(ManifestKind::RequiredFiles), temp.path().join("rf.xml"));
    assert_eq!(cache.path(ManifestKind::Schedule), temp.path().join("schedule.xml"));
}

#[test]
fn test_cache_new_creates_nested_directory() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("player").join("res");

    let cache = ManifestCache::new(&dir).unwrap();
    assert!(dir.is_dir());
    assert_eq!(cache.save_dir(), dir.as_path());
}

#[test]
fn test_unchanged_after_save() {
    let temp = TempDir::new().unwrap();
    let cache = ManifestCache::new(temp.path()).unwrap();
    let manifest = MockDisplayClient::schedule_manifest("1", vec![entry("2", 100, 200)]);

    assert!(!cache.is_unchanged(ManifestKind::Schedule, &manifest.content_hash()));

    cache.save(ManifestKind::Schedule, &manifest.raw).unwrap();
    assert!(cache.is_unchanged(ManifestKind::Schedule, &manifest.content_hash()));

    let changed = MockDisplayClient::schedule_manifest("1", vec![entry("3", 100, 200)]);
    assert!(!cache.is_unchanged(ManifestKind::Schedule, &changed.content_hash()));
}

#[test]
fn test_fallback_roundtrip() {
    let temp = TempDir::new().unwrap();
    let cache = ManifestCache::new(temp.path()).unwrap();
    let client = MockDisplayClient::new();
    let manifest = MockDisplayClient::schedule_manifest(
        "Default",
        vec![entry("L1", 100, 200), entry("L2", 150, 250)],
    );

    cache.save(ManifestKind::Schedule, &manifest.raw).unwrap();
    let loaded = cache
        .load_fallback(|raw| client.decode_schedule(raw))
        .unwrap();

    assert_eq!(loaded.entries, manifest.entries);
    assert_eq!(loaded.default_layout, "Default");
    assert_eq!(loaded.content_hash(), manifest.content_hash());
}

#[test]
fn test_fallback_absent() {
    let temp = TempDir::new().unwrap();
    let cache = ManifestCache::new(temp.path()).unwrap();
    let client = MockDisplayClient::new();

    assert!(cache
        .load_fallback(|raw| client.decode_schedule(raw))
        .is_none());
}

#[test]
fn test_fallback_unreadable() {
    let temp = TempDir::new().unwrap();
    let cache = ManifestCache::new(temp.path()).unwrap();
    let client = MockDisplayClient::new();

    cache
        .save(ManifestKind::Schedule, b"<schedule><trunc")
        .unwrap();
    assert!(cache
        .load_fallback(|raw| client.decode_schedule(raw))
        .is_none());

    let failing = cache.load_fallback(|_| {
        Err::<signage_core::ScheduleManifest, _>(RemoteError::Decode("bad".into()))
    });
    assert!(failing.is_none());
}

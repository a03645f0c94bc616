// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for schedule evaluation
//!
//! Scenarios:
//! - Overlapping windows resolve to the first entry
//! - No matching window falls back to the default layout

use proptest::prelude::*;
use signage_core::{ActiveLayout, MockDisplayClient, ScheduleEntry, ScheduleEvaluator};

use super::support::{at, entry, FORMAT};

fn evaluator() -> ScheduleEvaluator {
    ScheduleEvaluator::new(FORMAT, 0)
}

#[test]
fn test_first_match_wins() {
    let schedule = MockDisplayClient::schedule_manifest(
        "Default",
        vec![entry("L1", 100, 200), entry("L2", 150, 250)],
    );

    let decision = evaluator().evaluate(&schedule, 175);
    assert_eq!(decision.layout_id, "L1");
    assert_eq!(decision.schedule_id.as_deref(), Some("sched-L1"));
    assert_eq!(decision.window, (100, 200));

    assert_eq!(evaluator().evaluate(&schedule, 225).layout_id, "L2");
}

#[test]
fn test_no_match_uses_default() {
    let schedule =
        MockDisplayClient::schedule_manifest("Default", vec![entry("L1", 100, 200)]);

    let decision = evaluator().evaluate(&schedule, 300);
    assert_eq!(decision, ActiveLayout::default_layout("Default"));
    assert!(decision.schedule_id.is_none());
    assert_eq!(decision.window, (0, 0));
}

#[test]
fn test_window_bounds_are_inclusive() {
    let schedule =
        MockDisplayClient::schedule_manifest("Default", vec![entry("L1", 100, 200)]);

    assert_eq!(evaluator().evaluate(&schedule, 100).layout_id, "L1");
    assert_eq!(evaluator().evaluate(&schedule, 200).layout_id, "L1");
    assert!(evaluator().evaluate(&schedule, 99).is_default());
    assert!(evaluator().evaluate(&schedule, 201).is_default());
}

#[test]
fn test_cms_offset_shifts_windows() {
    // CMS one hour east of UTC: its 01:00 is 00:00 UTC
    let evaluator = ScheduleEvaluator::new(FORMAT, 3600);
    let schedule = MockDisplayClient::schedule_manifest(
        "Default",
        vec![entry("L1", 10_000 + 3600, 20_000 + 3600)],
    );

    let decision = evaluator.evaluate(&schedule, 15_000);
    assert_eq!(decision.layout_id, "L1");
    assert_eq!(decision.window, (10_000, 20_000));
    assert!(evaluator.evaluate(&schedule, 20_000 + 1800).is_default());
}

#[test]
fn test_malformed_entry_is_skipped() {
    let broken = ScheduleEntry {
        layout_id: "Broken".into(),
        schedule_id: "s0".into(),
        from_dt: "yesterday".into(),
        to_dt: at(500),
        priority: 0,
    };
    let schedule = MockDisplayClient::schedule_manifest(
        "Default",
        vec![broken, entry("L1", 100, 200)],
    );

    assert_eq!(evaluator().evaluate(&schedule, 150).layout_id, "L1");
    assert!(evaluator().evaluate(&schedule, 400).is_default());
}

#[test]
fn test_empty_schedule_uses_default() {
    let schedule = MockDisplayClient::schedule_manifest("Idle", Vec::new());
    assert_eq!(
        evaluator().evaluate(&schedule, 0),
        ActiveLayout::default_layout("Idle")
    );
}

proptest! {
    #[test]
    fn prop_decision_is_first_containing_window(
        windows in prop::collection::vec((0i64..10_000, 0i64..5_000), 0..8),
        now in 0i64..16_000,
    ) {
        let entries: Vec<_> = windows
            .iter()
            .enumerate()
            .map(|(i, (from, len))| entry(&format!("L{}", i), *from, from + len))
            .collect();
        let schedule = MockDisplayClient::schedule_manifest("Default", entries);

        let expected = windows
            .iter()
            .position(|(from, len)| *from <= now && now <= from + len)
            .map(|i| format!("L{}", i))
            .unwrap_or_else(|| "Default".to_string());

        let decision = evaluator().evaluate(&schedule, now);
        prop_assert_eq!(decision.layout_id, expected);
    }
}

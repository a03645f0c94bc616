// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Synchronization Loop
//!
//! One cycle registers the display, refreshes the required files, fetches
//! the schedule, and publishes the layout to show. The loop repeats cycles
//! with a sleep in between until a stop is requested.
//!
//! Every CMS failure is local to its step: the cycle falls back to cached
//! data or skips the step, and the loop always sleeps before retrying.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::cache::{ManifestCache, ManifestKind};
use crate::client::DisplayClient;
use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::downloader::{DownloadReport, FileDownloader};
use crate::events::{EventDispatcher, SyncEvent};
use crate::schedule::ScheduleEvaluator;
use crate::types::{ActiveLayout, ScheduleManifest};

use super::error::SyncResult;
use super::state::{LoopMonitor, LoopState, StopSignal};

/// What a cycle did with the required-files manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredFilesOutcome {
    /// Manifest matched the cached copy; nothing was downloaded.
    Unchanged,
    /// Manifest changed and its files were processed.
    Applied(DownloadReport),
    /// The CMS request failed.
    FetchFailed(String),
}

/// Where the evaluated schedule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleSource {
    /// Fetched from the CMS this cycle.
    Remote,
    /// Read back from the cached `schedule.xml`.
    Cache,
    /// Neither was available; evaluation was skipped.
    Unavailable,
}

/// Summary of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// The CMS reported the display ready.
    pub registered: bool,
    /// Poll interval in force after registration.
    pub poll_interval: Duration,
    /// Required-files handling.
    pub required_files: RequiredFilesOutcome,
    /// Schedule origin.
    pub schedule_source: ScheduleSource,
    /// Published decision, if a schedule was available.
    pub decision: Option<ActiveLayout>,
}

/// The display synchronization loop.
///
/// Owns the CMS client and is the only writer of the save directory.
pub struct SyncLoop<C: DisplayClient, K: Clock> {
    config: SyncConfig,
    client: C,
    clock: K,
    cache: ManifestCache,
    downloader: FileDownloader,
    evaluator: ScheduleEvaluator,
    events: Arc<EventDispatcher>,
    stop: StopSignal,
    monitor: LoopMonitor,
    poll_interval: Duration,
    last_decision: Option<ActiveLayout>,
}

impl<C: DisplayClient, K: Clock> SyncLoop<C, K> {
    /// Creates a loop, preparing the save directory.
    pub fn new(
        config: SyncConfig,
        client: C,
        clock: K,
        events: Arc<EventDispatcher>,
    ) -> SyncResult<Self> {
        config.validate()?;
        let cache = ManifestCache::new(&config.save_dir)?;

        info!(
            cms = %config.cms_url,
            display = %config.display_name,
            save_dir = %config.save_dir.display(),
            "sync loop created"
        );

        Ok(SyncLoop {
            downloader: FileDownloader::from_config(&config),
            evaluator: ScheduleEvaluator::from_config(&config),
            poll_interval: config.poll_interval,
            config,
            client,
            clock,
            cache,
            events,
            stop: StopSignal::new(),
            monitor: LoopMonitor::new(),
            last_decision: None,
        })
    }

    /// Signal that stops this loop.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Read access to the loop state.
    pub fn monitor(&self) -> LoopMonitor {
        self.monitor.clone()
    }

    /// Current state.
    pub fn state(&self) -> LoopState {
        self.monitor.state()
    }

    /// Poll interval for the next sleep.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Decision published by the most recent cycle.
    pub fn last_decision(&self) -> Option<&ActiveLayout> {
        self.last_decision.as_ref()
    }

    /// The configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The manifest cache.
    pub fn cache(&self) -> &ManifestCache {
        &self.cache
    }

    /// Runs cycles until stopped, or exactly one in single-shot mode.
    pub fn run(&mut self, single_shot: bool) {
        let _stopped = StoppedOnExit(self.monitor.clone());
        info!(single_shot, "sync loop started");

        while !self.stop.is_requested() {
            let report = self.cycle();
            debug!(
                registered = report.registered,
                schedule = ?report.schedule_source,
                "cycle finished"
            );

            if single_shot {
                break;
            }
            self.sleep(self.poll_interval);
        }

        self.monitor.set(LoopState::Stopping);
        info!("sync loop finished");
    }

    /// Runs a single cycle without sleeping, outside of [`run`].
    ///
    /// [`run`]: SyncLoop::run
    pub fn run_cycle(&mut self) -> CycleReport {
        let resting = self.monitor.state();
        let report = self.cycle();
        if !resting.is_running() {
            self.monitor.set(resting);
        }
        report
    }

    fn cycle(&mut self) -> CycleReport {
        self.monitor.set(LoopState::Registering);
        let registered = self.register();

        self.monitor.set(LoopState::FetchingRequiredFiles);
        let required_files = self.sync_required_files();

        self.monitor.set(LoopState::FetchingSchedule);
        let (schedule, schedule_source) = self.fetch_schedule();

        let decision = match schedule {
            Some(schedule) => {
                self.monitor.set(LoopState::Evaluating);
                let decision = self
                    .evaluator
                    .evaluate(&schedule, self.clock.now().timestamp());

                self.monitor.set(LoopState::Publishing);
                self.publish(&decision);
                Some(decision)
            }
            None => None,
        };

        CycleReport {
            registered,
            poll_interval: self.poll_interval,
            required_files,
            schedule_source,
            decision,
        }
    }

    fn register(&mut self) -> bool {
        match self.client.register_display() {
            Ok(result) if result.is_ready() => {
                let interval = result
                    .collect_interval
                    .filter(|interval| !interval.is_zero())
                    .unwrap_or(self.config.poll_interval);
                if interval != self.poll_interval {
                    info!(seconds = interval.as_secs(), "poll interval changed");
                    self.poll_interval = interval;
                }
                true
            }
            Ok(result) => {
                warn!(status = ?result.status, message = %result.message, "display not ready");
                false
            }
            Err(e) => {
                warn!(error = %e, "register display failed");
                false
            }
        }
    }

    fn sync_required_files(&mut self) -> RequiredFilesOutcome {
        let manifest = match self.client.required_files() {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(error = %e, "required files request failed");
                return RequiredFilesOutcome::FetchFailed(e.to_string());
            }
        };

        if self
            .cache
            .is_unchanged(ManifestKind::RequiredFiles, &manifest.content_hash())
        {
            debug!("required files unchanged");
            return RequiredFilesOutcome::Unchanged;
        }

        if let Err(e) = self.cache.save(ManifestKind::RequiredFiles, &manifest.raw) {
            error!(error = %e, "failed to cache required files manifest");
        }

        self.monitor.set(LoopState::Downloading);
        let report = self.downloader.download_all(
            &mut self.client,
            &manifest.files,
            &self.events,
            &self.stop,
        );
        info!(
            downloaded = report.downloaded,
            skipped = report.skipped,
            failed = report.failed.len(),
            aborted = report.aborted,
            "required files processed"
        );

        RequiredFilesOutcome::Applied(report)
    }

    fn fetch_schedule(&mut self) -> (Option<ScheduleManifest>, ScheduleSource) {
        match self.client.schedule() {
            Ok(schedule) => {
                if !self
                    .cache
                    .is_unchanged(ManifestKind::Schedule, &schedule.content_hash())
                {
                    if let Err(e) = self.cache.save(ManifestKind::Schedule, &schedule.raw) {
                        error!(error = %e, "failed to cache schedule");
                    }
                    info!(entries = schedule.entries.len(), "schedule updated");
                }
                (Some(schedule), ScheduleSource::Remote)
            }
            Err(e) => {
                warn!(error = %e, "schedule request failed, trying cached copy");
                let client = &self.client;
                match self
                    .cache
                    .load_fallback(|raw| client.decode_schedule(raw))
                {
                    Some(schedule) => (Some(schedule), ScheduleSource::Cache),
                    None => {
                        warn!("no usable schedule, skipping evaluation");
                        (None, ScheduleSource::Unavailable)
                    }
                }
            }
        }
    }

    fn publish(&mut self, decision: &ActiveLayout) {
        if self.last_decision.as_ref() != Some(decision) {
            info!(
                layout_id = %decision.layout_id,
                schedule_id = ?decision.schedule_id,
                from = decision.window.0,
                to = decision.window.1,
                "active layout changed"
            );
        }
        self.events
            .dispatch(SyncEvent::ActiveLayoutChanged(decision.clone()));
        self.last_decision = Some(decision.clone());
    }

    /// Sleeps for `interval` in stop-tick steps, returning early on stop.
    fn sleep(&self, interval: Duration) {
        self.monitor.set(LoopState::Sleeping);
        let deadline = self
            .clock
            .now()
            .timestamp_millis()
            .saturating_add(i64::try_from(interval.as_millis()).unwrap_or(i64::MAX));

        while !self.stop.is_requested() {
            let remaining = deadline - self.clock.now().timestamp_millis();
            if remaining <= 0 {
                break;
            }
            let step = self
                .config
                .stop_tick
                .min(Duration::from_millis(remaining as u64));
            self.clock.sleep(step);
        }
    }
}

/// Marks the loop stopped when `run` returns or unwinds.
struct StoppedOnExit(LoopMonitor);

impl Drop for StoppedOnExit {
    fn drop(&mut self) {
        self.0.set(LoopState::Stopped);
    }
}

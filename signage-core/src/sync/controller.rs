// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Controller
//!
//! Runs a [`SyncLoop`] on its own thread and controls its lifecycle:
//! - `start` spawns the worker, continuous or single-shot
//! - `stop` requests a stop and blocks until the loop has wound down
//! - `enter` hands out a guard that stops the loop when dropped
//!
//! The loop comes back from its thread on stop, so a controller can be
//! started again.

use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use crate::client::DisplayClient;
use crate::clock::Clock;

use super::cycle::SyncLoop;
use super::error::{SyncError, SyncResult};
use super::state::{LoopMonitor, LoopState, StopSignal};

/// Owns a sync loop and the thread running it.
pub struct SyncController<C, K>
where
    C: DisplayClient + 'static,
    K: Clock + 'static,
{
    idle: Option<SyncLoop<C, K>>,
    worker: Option<JoinHandle<SyncLoop<C, K>>>,
    stop: StopSignal,
    monitor: LoopMonitor,
}

impl<C, K> SyncController<C, K>
where
    C: DisplayClient + 'static,
    K: Clock + 'static,
{
    /// Wraps a loop that is not yet running.
    pub fn new(sync_loop: SyncLoop<C, K>) -> Self {
        SyncController {
            stop: sync_loop.stop_signal(),
            monitor: sync_loop.monitor(),
            idle: Some(sync_loop),
            worker: None,
        }
    }

    /// Handle for stopping or observing the loop from other threads.
    pub fn handle(&self) -> SyncHandle {
        SyncHandle {
            stop: self.stop.clone(),
            monitor: self.monitor.clone(),
        }
    }

    /// Current loop state.
    pub fn state(&self) -> LoopState {
        self.monitor.state()
    }

    /// Returns true while the worker thread is alive.
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// The loop, when no run is in progress.
    pub fn sync_loop(&self) -> Option<&SyncLoop<C, K>> {
        self.idle.as_ref()
    }

    /// Spawns the worker thread.
    ///
    /// In single-shot mode the loop stops by itself after one cycle.
    pub fn start(&mut self, single_shot: bool) -> SyncResult<()> {
        if self.is_running() {
            return Err(SyncError::AlreadyRunning);
        }
        self.reap();

        let mut sync_loop = self.idle.take().ok_or(SyncError::LoopLost)?;
        self.stop.reset();
        // Running from here on, so a stop issued before the worker's first
        // state change still waits for it
        self.monitor.starting();

        let spawned = thread::Builder::new()
            .name("signage-sync".to_string())
            .spawn(move || {
                sync_loop.run(single_shot);
                sync_loop
            });
        let worker = match spawned {
            Ok(worker) => worker,
            Err(e) => {
                self.monitor.set(LoopState::Stopped);
                return Err(SyncError::Spawn(e));
            }
        };

        debug!(single_shot, "sync worker spawned");
        self.worker = Some(worker);
        Ok(())
    }

    /// Stops the loop and waits for it to finish.
    ///
    /// Idempotent, and a no-op when the loop was never started.
    pub fn stop(&mut self) {
        self.stop.request();
        self.monitor.wait_until_stopped();
        self.reap();
    }

    /// Waits for the worker thread to finish on its own.
    ///
    /// Only returns for single-shot runs or after a stop was requested
    /// through a [`SyncHandle`].
    pub fn join(&mut self) {
        self.reap();
    }

    /// Starts the loop and returns a guard that stops it on drop.
    pub fn enter(&mut self, single_shot: bool) -> SyncResult<RunningGuard<'_, C, K>> {
        self.start(single_shot)?;
        Ok(RunningGuard { controller: self })
    }

    /// Stops the loop and hands it back.
    pub fn into_loop(mut self) -> Option<SyncLoop<C, K>> {
        self.stop();
        self.idle.take()
    }

    fn reap(&mut self) {
        if let Some(worker) = self.worker.take() {
            match worker.join() {
                Ok(sync_loop) => self.idle = Some(sync_loop),
                Err(_) => error!("sync worker panicked, loop lost"),
            }
        }
    }
}

impl<C, K> Drop for SyncController<C, K>
where
    C: DisplayClient + 'static,
    K: Clock + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}

/// Scoped access to a running loop; stops it when dropped.
pub struct RunningGuard<'a, C, K>
where
    C: DisplayClient + 'static,
    K: Clock + 'static,
{
    controller: &'a mut SyncController<C, K>,
}

impl<C, K> RunningGuard<'_, C, K>
where
    C: DisplayClient + 'static,
    K: Clock + 'static,
{
    /// Current loop state.
    pub fn state(&self) -> LoopState {
        self.controller.state()
    }

    /// Handle for stopping or observing the loop from other threads.
    pub fn handle(&self) -> SyncHandle {
        self.controller.handle()
    }
}

impl<C, K> Drop for RunningGuard<'_, C, K>
where
    C: DisplayClient + 'static,
    K: Clock + 'static,
{
    fn drop(&mut self) {
        self.controller.stop();
    }
}

/// Cloneable, thread-safe view of a loop.
#[derive(Debug, Clone)]
pub struct SyncHandle {
    stop: StopSignal,
    monitor: LoopMonitor,
}

impl SyncHandle {
    /// Current loop state.
    pub fn state(&self) -> LoopState {
        self.monitor.state()
    }

    /// Asks the loop to stop without waiting.
    pub fn request_stop(&self) {
        self.stop.request();
    }

    /// Asks the loop to stop and waits until it is no longer running.
    ///
    /// Called from the loop's own thread (e.g. from an event handler) this
    /// only requests the stop.
    pub fn stop(&self) {
        self.stop.request();
        if self.monitor.is_loop_thread() {
            return;
        }
        self.monitor.wait_until_stopped();
    }
}

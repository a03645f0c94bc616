// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Loop state and stop signalling
//!
//! The loop owns its [`LoopState`] and is the only writer; other threads
//! read it through a [`LoopMonitor`] and ask it to finish through a
//! [`StopSignal`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// Phase of the synchronization loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    /// Not started
    Idle,
    /// Worker spawned, first cycle not yet begun
    Starting,
    /// Registering the display
    Registering,
    /// Requesting the required-files manifest
    FetchingRequiredFiles,
    /// Downloading changed files
    Downloading,
    /// Requesting the schedule manifest
    FetchingSchedule,
    /// Selecting the active layout
    Evaluating,
    /// Publishing the decision
    Publishing,
    /// Waiting for the next cycle
    Sleeping,
    /// Stop observed, winding down
    Stopping,
    /// Finished
    Stopped,
}

impl LoopState {
    /// Returns true while a run is in progress.
    pub fn is_running(&self) -> bool {
        !matches!(self, LoopState::Idle | LoopState::Stopped)
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoopState::Idle => "idle",
            LoopState::Starting => "starting",
            LoopState::Registering => "registering",
            LoopState::FetchingRequiredFiles => "fetching-required-files",
            LoopState::Downloading => "downloading",
            LoopState::FetchingSchedule => "fetching-schedule",
            LoopState::Evaluating => "evaluating",
            LoopState::Publishing => "publishing",
            LoopState::Sleeping => "sleeping",
            LoopState::Stopping => "stopping",
            LoopState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Cooperative stop request shared between the loop and its controllers.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    requested: Arc<AtomicBool>,
}

impl StopSignal {
    /// Creates a signal with no stop requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the loop to stop at its next check.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Returns true once a stop has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Clears the request before a new run.
    pub(crate) fn reset(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct Status {
    state: LoopState,
    worker: Option<ThreadId>,
}

/// Read side of the loop state, with blocking waits.
#[derive(Debug, Clone)]
pub struct LoopMonitor {
    inner: Arc<(Mutex<Status>, Condvar)>,
}

impl Default for LoopMonitor {
    fn default() -> Self {
        LoopMonitor {
            inner: Arc::new((
                Mutex::new(Status {
                    state: LoopState::Idle,
                    worker: None,
                }),
                Condvar::new(),
            )),
        }
    }
}

impl LoopMonitor {
    /// Creates a monitor in the `Idle` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> LoopState {
        self.status().state
    }

    /// Returns true if the calling thread is the one running the loop.
    pub fn is_loop_thread(&self) -> bool {
        self.status().worker == Some(thread::current().id())
    }

    /// Blocks until the loop is not running.
    pub fn wait_until_stopped(&self) {
        let (_, condvar) = &*self.inner;
        let mut status = self.status();
        while status.state.is_running() {
            status = condvar
                .wait(status)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Marks a run as begun before its worker thread exists.
    ///
    /// The worker adopts the run on its first [`set`](Self::set).
    pub(crate) fn starting(&self) {
        let (_, condvar) = &*self.inner;
        let mut status = self.status();
        status.state = LoopState::Starting;
        status.worker = None;
        condvar.notify_all();
    }

    pub(crate) fn set(&self, state: LoopState) {
        let (_, condvar) = &*self.inner;
        let mut status = self.status();
        if state.is_running() && (!status.state.is_running() || status.worker.is_none()) {
            status.worker = Some(thread::current().id());
        } else if !state.is_running() {
            status.worker = None;
        }
        status.state = state;
        condvar.notify_all();
    }

    fn status(&self) -> MutexGuard<'_, Status> {
        let (lock, _) = &*self.inner;
        lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Display Synchronization
//!
//! The polling loop that keeps a display in step with its CMS, and the
//! controller that runs it on a background thread.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use signage_core::{EventDispatcher, SyncConfig, SyncController, SyncLoop, SystemClock};
//!
//! let events = Arc::new(EventDispatcher::new());
//! let sync_loop = SyncLoop::new(SyncConfig::default(), client, SystemClock, events)?;
//! let mut controller = SyncController::new(sync_loop);
//!
//! controller.start(false)?;
//! // ...
//! controller.stop();
//! ```

mod controller;
mod cycle;
mod error;
mod state;

pub use controller::{RunningGuard, SyncController, SyncHandle};
pub use cycle::{CycleReport, RequiredFilesOutcome, ScheduleSource, SyncLoop};
pub use error::{SyncError, SyncResult};
pub use state::{LoopMonitor, LoopState, StopSignal};

// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Error Types
//!
//! Errors that prevent the loop from being built or started. Failures
//! inside a cycle never surface here; they are logged and the cycle
//! degrades instead.

use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigError;

/// Error type for loop construction and lifecycle operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration is unusable.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Save directory could not be prepared.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// A run is already in progress.
    #[error("sync loop already running")]
    AlreadyRunning,

    /// The loop was lost when its thread panicked.
    #[error("sync loop unavailable: worker thread panicked")]
    LoopLost,

    /// The worker thread could not be spawned.
    #[error("failed to spawn sync thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Result type for sync lifecycle operations.
pub type SyncResult<T> = Result<T, SyncError>;

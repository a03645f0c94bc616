// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Event System
//!
//! Notifications published by the synchronization loop. Handlers run on
//! the loop's thread; [`ChannelHandler`] hands events to a consumer on
//! another thread.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::types::{ActiveLayout, FileDescriptor, FileKind};

/// Events emitted by the synchronization loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A file transfer is about to start.
    DownloadStarted {
        /// Kind of the file.
        kind: FileKind,
        /// Local path the file will be written to.
        path: PathBuf,
    },

    /// A file was written to local storage.
    DownloadCompleted {
        /// The descriptor that was fetched.
        file: FileDescriptor,
    },

    /// The layout to show, published once per cycle even when unchanged.
    ActiveLayoutChanged(ActiveLayout),
}

/// Event handler trait.
///
/// Implement this trait to receive sync events.
pub trait EventHandler: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: SyncEvent);
}

/// Simple callback-based event handler.
pub struct CallbackHandler<F>
where
    F: Fn(SyncEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(SyncEvent) + Send + Sync,
{
    /// Creates a new callback handler.
    pub fn new(callback: F) -> Self {
        CallbackHandler { callback }
    }
}

impl<F> EventHandler for CallbackHandler<F>
where
    F: Fn(SyncEvent) + Send + Sync,
{
    fn on_event(&self, event: SyncEvent) {
        (self.callback)(event);
    }
}

/// Forwards events into an mpsc channel.
///
/// Events are dropped once the receiving side is gone.
pub struct ChannelHandler {
    sender: Mutex<Sender<SyncEvent>>,
}

impl ChannelHandler {
    /// Creates a handler and the receiver that consumes its events.
    pub fn new() -> (Self, Receiver<SyncEvent>) {
        let (sender, receiver) = mpsc::channel();
        (
            ChannelHandler {
                sender: Mutex::new(sender),
            },
            receiver,
        )
    }
}

impl EventHandler for ChannelHandler {
    fn on_event(&self, event: SyncEvent) {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if sender.send(event).is_err() {
            debug!("event receiver dropped");
        }
    }
}

/// Event dispatcher for managing multiple handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    /// Creates a new event dispatcher.
    pub fn new() -> Self {
        EventDispatcher {
            handlers: Vec::new(),
        }
    }

    /// Adds an event handler.
    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Removes all handlers.
    pub fn clear_handlers(&mut self) {
        self.handlers.clear();
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatches an event to all handlers.
    pub fn dispatch(&self, event: SyncEvent) {
        for handler in &self.handlers {
            handler.on_event(event.clone());
        }
    }
}

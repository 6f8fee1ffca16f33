//! Structured events emitted while mirroring
//!
//! The engine reports everything it does through [`EventSink`]; what a sink
//! does with an event (tracing output, JSONL log, test capture) is its own
//! business. Paths in events are the replica-side paths that were touched.

use super::PassStats;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Why a scheduler tick did not start a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    AlreadyRunning,
}

/// Discrete progress and error events for mirror passes.
///
/// Failure events carry the rendered error message rather than the error
/// value itself so events stay cheap to clone and serialize.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SyncEvent {
    /// A scheduler tick fired while the previous pass was still running.
    PassSkipped { reason: SkipReason },
    /// A pass began walking the tree.
    PassStarted,
    /// A pass finished (with or without per-entry failures).
    PassCompleted { stats: PassStats },
    DirCreated { path: PathBuf },
    DirCreateFailed { path: PathBuf, error: String },
    /// A file absent from the replica was copied in.
    FileCreated { path: PathBuf },
    /// An existing replica file was overwritten.
    FileCopied { path: PathBuf },
    FileUnchanged { path: PathBuf },
    FileCopyFailed { path: PathBuf, error: String },
    FileDeleted { path: PathBuf },
    FileDeleteFailed { path: PathBuf, error: String },
    DirDeleted { path: PathBuf },
    DirDeleteFailed { path: PathBuf, error: String },
    /// The pass could not run or continue (source root gone).
    Fatal { error: String },
}

/// Receives engine events. Implementations must tolerate being called from
/// a blocking worker thread.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &SyncEvent);
}

impl<F> EventSink for F
where
    F: Fn(&SyncEvent) + Send + Sync,
{
    fn emit(&self, event: &SyncEvent) {
        self(event)
    }
}

/// Forwards every event to each inner sink, in order.
pub struct Fanout {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl Fanout {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for Fanout {
    fn emit(&self, event: &SyncEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

//! Periodic pass scheduling
//!
//! A fixed-interval ticker drives the engine, with one rule: if a pass is
//! still running when the next tick fires, that tick is dropped whole. No
//! queuing, no catch-up; skipped ticks are never made up. The run-guard is
//! a single atomic flag, acquired with a compare-exchange so two ticks can
//! never both win it.

use crate::engine::Syncer;
use crate::types::{EventSink, SkipReason, SyncEvent};
use scopeguard::defer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

/// Drives [`Syncer::run_pass`] on a fixed period, at most one pass at a
/// time. The first pass starts immediately on activation.
pub struct Scheduler {
    syncer: Arc<Syncer>,
    interval: Duration,
    running: Arc<AtomicBool>,
    sink: Arc<dyn EventSink>,
}

impl Scheduler {
    pub fn new(syncer: Syncer, interval: Duration, sink: Arc<dyn EventSink>) -> Self {
        Self {
            syncer: Arc::new(syncer),
            interval,
            running: Arc::new(AtomicBool::new(false)),
            sink,
        }
    }

    /// Tick until `shutdown` flips (or its sender is dropped), then drain:
    /// an in-flight pass runs to completion, it is never aborted.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut in_flight: Option<JoinHandle<()>> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(handle) = self.dispatch() {
                        in_flight = Some(handle);
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        if let Some(handle) = in_flight.take() {
            debug!("waiting for in-flight pass to finish");
            let _ = handle.await;
        }
    }

    /// Try to start a pass on the blocking pool.
    ///
    /// Returns `None` and emits `pass-skipped` when the previous pass still
    /// holds the run-guard.
    fn dispatch(&self) -> Option<JoinHandle<()>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.sink.emit(&SyncEvent::PassSkipped {
                reason: SkipReason::AlreadyRunning,
            });
            return None;
        }

        let syncer = Arc::clone(&self.syncer);
        let running = Arc::clone(&self.running);
        let sink = Arc::clone(&self.sink);

        Some(tokio::task::spawn_blocking(move || {
            // Released on every exit path, panics included; the guard must
            // never stay set once a pass has exited.
            defer! {
                running.store(false, Ordering::Release);
            }
            if let Err(err) = syncer.run_pass() {
                sink.emit(&SyncEvent::Fatal {
                    error: err.to_string(),
                });
            }
        }))
    }

    /// Whether a pass currently holds the run-guard.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    #[cfg(test)]
    fn hold_guard(&self) {
        self.running.store(true, Ordering::Release);
    }
}

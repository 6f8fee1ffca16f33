//! Main mirror command
//!
//! Wires configuration, reporters, engine, and scheduler together. With
//! `--once` the scheduler is bypassed and a single pass decides the exit
//! status.

use crate::config::Config;
use crate::engine::Syncer;
use crate::report::{JsonlSink, TraceSink};
use crate::scheduler::Scheduler;
use crate::types::{EventSink, Fanout, MirraError, SyncEvent};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Run the mirror: one pass with `--once`, the periodic scheduler otherwise.
pub async fn run(config: Config) -> Result<(), MirraError> {
    let sink = build_sink(&config)?;
    let syncer = Syncer::new(&config, Arc::clone(&sink))?;

    info!(
        "mirroring {} -> {} every {} ms",
        config.source.display(),
        config.replica.display(),
        config.interval.as_millis()
    );

    if config.once {
        return match syncer.run_pass() {
            Ok(_) => Ok(()),
            Err(err) => {
                sink.emit(&SyncEvent::Fatal {
                    error: err.to_string(),
                });
                Err(err)
            }
        };
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested; draining in-flight pass");
            let _ = stop_tx.send(true);
        }
    });

    Scheduler::new(syncer, config.interval, sink)
        .run(stop_rx)
        .await;
    info!("shutdown complete");
    Ok(())
}

fn build_sink(config: &Config) -> Result<Arc<dyn EventSink>, MirraError> {
    let mut sinks: Vec<Arc<dyn EventSink>> = vec![Arc::new(TraceSink)];
    if let Some(path) = &config.log_file {
        sinks.push(Arc::new(JsonlSink::open(path)?));
    }
    Ok(Arc::new(Fanout::new(sinks)))
}

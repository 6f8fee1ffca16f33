//! # mirra - One-Way Folder Mirroring
//!
//! Keeps a replica directory identical to a source directory on a fixed
//! period: new and changed files are copied in full, entries gone from the
//! source are removed, and a single run-guard flag keeps passes from ever
//! overlapping.

// Module declarations
pub mod commands;
pub mod compare;
pub mod config;
pub mod engine;
pub mod hash;
pub mod report;
pub mod scheduler;
pub mod types;

// Re-export commonly used types
pub use compare::{Comparator, Verdict, DEFAULT_HASH_THRESHOLD};
pub use config::Config;
pub use engine::Syncer;
pub use scheduler::Scheduler;
pub use types::{EventSink, MirraError, PassStats, SyncEvent};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

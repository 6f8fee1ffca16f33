//! The recursive mirror engine
//!
//! One pass walks the source tree top-down and reconciles each directory
//! level in a fixed order:
//!
//! 1. ensure the replica-side directory exists
//! 2. create/overwrite files from the source
//! 3. delete replica files with no source counterpart
//! 4. delete replica subdirectories with no source counterpart
//! 5. recurse into source subdirectories, depth-first, in enumeration order
//!
//! Deleting directories before recursing means a subtree removed from the
//! source is dropped in a single recursive delete and never walked. Every
//! per-entry failure is reported through the sink and skipped; only a
//! missing source root fails the pass.

mod copy;

pub use copy::copy_file;

use crate::compare::{Comparator, Verdict};
use crate::config::Config;
use crate::types::{EventSink, MirraError, PassStats, SyncEvent};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// One-way tree synchronizer.
///
/// Stateless between passes: every pass re-lists the filesystem from
/// scratch, which is what makes retries of failed entries automatic.
pub struct Syncer {
    source: PathBuf,
    replica: PathBuf,
    comparator: Comparator,
    excludes: Option<GlobSet>,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Syncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Syncer")
            .field("source", &self.source)
            .field("replica", &self.replica)
            .field("comparator", &self.comparator)
            .field("excludes", &self.excludes)
            .finish_non_exhaustive()
    }
}

/// Names directly under one directory, split by kind, in enumeration order.
#[derive(Debug, Default)]
struct Level {
    files: Vec<OsString>,
    dirs: Vec<OsString>,
}

impl Syncer {
    pub fn new(config: &Config, sink: Arc<dyn EventSink>) -> Result<Self, MirraError> {
        Ok(Self {
            source: config.source.clone(),
            replica: config.replica.clone(),
            comparator: Comparator::new(config.hash_threshold),
            excludes: build_excludes(&config.exclude)?,
            sink,
        })
    }

    /// Run one complete mirror pass.
    ///
    /// # Errors
    /// Only a missing source root is an error here. Per-entry failures are
    /// reported through the sink, counted in the stats, and skipped.
    pub fn run_pass(&self) -> Result<PassStats, MirraError> {
        if !self.source.is_dir() {
            return Err(MirraError::SourceMissing {
                path: self.source.clone(),
            });
        }

        self.sink.emit(&SyncEvent::PassStarted);
        let started = Instant::now();
        let mut stats = PassStats::default();

        self.sync_level(Path::new(""), &mut stats);

        stats.duration_ms = started.elapsed().as_millis() as u64;
        self.sink.emit(&SyncEvent::PassCompleted {
            stats: stats.clone(),
        });
        Ok(stats)
    }

    /// Reconcile one directory level, then recurse.
    fn sync_level(&self, rel: &Path, stats: &mut PassStats) {
        let source_dir = self.source.join(rel);
        let replica_dir = self.replica.join(rel);

        // A failed directory creation skips the file phases for this level;
        // recursion below still proceeds best-effort.
        let replica_ready = self.ensure_replica_dir(&replica_dir, stats);

        let source_level = match list_source(&source_dir) {
            Ok(level) => level,
            Err(err) => {
                warn!("cannot list source {}: {err}", source_dir.display());
                stats.errors += 1;
                return;
            }
        };

        if replica_ready {
            for name in &source_level.files {
                self.sync_file(rel, name, stats);
            }
            self.delete_orphans(rel, &source_level, &replica_dir, stats);
        }

        for name in &source_level.dirs {
            let child = rel.join(name);
            if self.excluded(&child) {
                continue;
            }
            self.sync_level(&child, stats);
        }
    }

    /// Step 1: make sure the replica-side directory exists.
    ///
    /// Non-recursive create; the parent level was created or verified by the
    /// caller. Returns false when the file phases must be skipped.
    fn ensure_replica_dir(&self, replica_dir: &Path, stats: &mut PassStats) -> bool {
        match fs::symlink_metadata(replica_dir) {
            Ok(meta) if meta.is_dir() => return true,
            Ok(_) => {
                // A file squats on the directory name. The parent level's
                // file deletion normally clears this before recursion; a
                // squatter at the replica root has no parent to clear it.
                stats.errors += 1;
                self.sink.emit(&SyncEvent::DirCreateFailed {
                    path: replica_dir.to_path_buf(),
                    error: "path exists but is not a directory".to_string(),
                });
                return false;
            }
            Err(_) => {}
        }

        match fs::create_dir(replica_dir) {
            Ok(()) => {
                stats.dirs_created += 1;
                self.sink.emit(&SyncEvent::DirCreated {
                    path: replica_dir.to_path_buf(),
                });
                true
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => true,
            Err(err) => {
                stats.errors += 1;
                self.sink.emit(&SyncEvent::DirCreateFailed {
                    path: replica_dir.to_path_buf(),
                    error: MirraError::io(replica_dir, err).to_string(),
                });
                false
            }
        }
    }

    /// Step 2 for one file: classify the pair and copy if needed.
    fn sync_file(&self, rel_dir: &Path, name: &OsStr, stats: &mut PassStats) {
        let rel = rel_dir.join(name);
        if self.excluded(&rel) {
            return;
        }
        let source = self.source.join(&rel);
        let replica = self.replica.join(&rel);

        let verdict = match self.comparator.verdict(&source, &replica) {
            Ok(verdict) => verdict,
            Err(err) => {
                // Unreadable pairs are treated as changed and go down the
                // copy path, where the real failure surfaces as an event.
                warn!("comparison failed for {}: {err}", rel.display());
                stats.errors += 1;
                Verdict::Different
            }
        };

        match verdict {
            Verdict::Identical => {
                stats.files_unchanged += 1;
                self.sink.emit(&SyncEvent::FileUnchanged { path: replica });
            }
            Verdict::ReplicaMissing | Verdict::Different => {
                let creating = verdict == Verdict::ReplicaMissing;
                match copy_file(&source, &replica) {
                    Ok(bytes) => {
                        stats.bytes_copied += bytes;
                        if creating {
                            stats.files_created += 1;
                            self.sink.emit(&SyncEvent::FileCreated { path: replica });
                        } else {
                            stats.files_copied += 1;
                            self.sink.emit(&SyncEvent::FileCopied { path: replica });
                        }
                    }
                    Err(err) => {
                        stats.errors += 1;
                        self.sink.emit(&SyncEvent::FileCopyFailed {
                            path: replica,
                            error: err.to_string(),
                        });
                    }
                }
            }
        }
    }

    /// Steps 3 and 4: remove replica entries with no source counterpart.
    /// Files go first, then whole subdirectories in one recursive delete
    /// each.
    fn delete_orphans(
        &self,
        rel: &Path,
        source_level: &Level,
        replica_dir: &Path,
        stats: &mut PassStats,
    ) {
        let replica_level = match list_replica(replica_dir) {
            Ok(level) => level,
            Err(err) => {
                warn!("cannot list replica {}: {err}", replica_dir.display());
                stats.errors += 1;
                return;
            }
        };

        let source_files: HashSet<&OsString> = source_level.files.iter().collect();
        let source_dirs: HashSet<&OsString> = source_level.dirs.iter().collect();

        for name in &replica_level.files {
            if source_files.contains(name) || self.excluded(&rel.join(name)) {
                continue;
            }
            let path = replica_dir.join(name);
            match fs::remove_file(&path) {
                Ok(()) => {
                    stats.files_deleted += 1;
                    self.sink.emit(&SyncEvent::FileDeleted { path });
                }
                Err(err) => {
                    stats.errors += 1;
                    self.sink.emit(&SyncEvent::FileDeleteFailed {
                        error: MirraError::io(&path, err).to_string(),
                        path,
                    });
                }
            }
        }

        for name in &replica_level.dirs {
            if source_dirs.contains(name) || self.excluded(&rel.join(name)) {
                continue;
            }
            let path = replica_dir.join(name);
            match fs::remove_dir_all(&path) {
                Ok(()) => {
                    stats.dirs_deleted += 1;
                    self.sink.emit(&SyncEvent::DirDeleted { path });
                }
                Err(err) => {
                    stats.errors += 1;
                    self.sink.emit(&SyncEvent::DirDeleteFailed {
                        error: MirraError::io(&path, err).to_string(),
                        path,
                    });
                }
            }
        }
    }

    fn excluded(&self, rel: &Path) -> bool {
        self.excludes.as_ref().is_some_and(|set| set.is_match(rel))
    }
}

/// List one source directory level. Symlinks and special files are skipped;
/// the mirror carries only regular files and directories.
fn list_source(dir: &Path) -> Result<Level, MirraError> {
    let mut level = Level::default();
    for entry in fs::read_dir(dir).map_err(|e| MirraError::io(dir, e))? {
        let entry = entry.map_err(|e| MirraError::io(dir, e))?;
        match entry.file_type() {
            Ok(kind) if kind.is_dir() => level.dirs.push(entry.file_name()),
            Ok(kind) if kind.is_file() => level.files.push(entry.file_name()),
            Ok(_) => debug!("skipping special entry {}", entry.path().display()),
            Err(err) => warn!("cannot stat {}: {err}", entry.path().display()),
        }
    }
    Ok(level)
}

/// List one replica directory level. Anything that is not a directory is a
/// deletion candidate, symlinks included.
fn list_replica(dir: &Path) -> Result<Level, MirraError> {
    let mut level = Level::default();
    for entry in fs::read_dir(dir).map_err(|e| MirraError::io(dir, e))? {
        let entry = entry.map_err(|e| MirraError::io(dir, e))?;
        match entry.file_type() {
            Ok(kind) if kind.is_dir() => level.dirs.push(entry.file_name()),
            Ok(_) => level.files.push(entry.file_name()),
            Err(err) => warn!("cannot stat {}: {err}", entry.path().display()),
        }
    }
    Ok(level)
}

/// Build the exclusion matcher from relative-path glob patterns.
fn build_excludes(patterns: &[String]) -> Result<Option<GlobSet>, MirraError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            MirraError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e))
        })?;
        builder.add(glob);
    }
    let set = builder
        .build()
        .map_err(|e| MirraError::Config(format!("Failed to build exclude set: {}", e)))?;
    Ok(Some(set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<SyncEvent>>);

    impl EventSink for RecordingSink {
        fn emit(&self, event: &SyncEvent) {
            self.0.lock().expect("lock sink").push(event.clone());
        }
    }

    impl RecordingSink {
        fn labels(&self) -> Vec<String> {
            self.0
                .lock()
                .expect("lock sink")
                .iter()
                .map(|event| {
                    serde_json::to_value(event).expect("serialize")["event"]
                        .as_str()
                        .expect("tag")
                        .to_string()
                })
                .collect()
        }
    }

    fn syncer_for(config: &Config) -> (Arc<RecordingSink>, Syncer) {
        let sink = Arc::new(RecordingSink::default());
        let dyn_sink: Arc<dyn EventSink> = sink.clone();
        let syncer = Syncer::new(config, dyn_sink).expect("build syncer");
        (sink, syncer)
    }

    #[test]
    fn test_pass_creates_replica_root_and_copies() {
        let source = TempDir::new().expect("create source");
        let parent = TempDir::new().expect("create replica parent");
        let replica = parent.path().join("replica");
        fs::write(source.path().join("a.txt"), b"hello").expect("write source file");

        let config = Config::new(source.path(), &replica);
        let (sink, syncer) = syncer_for(&config);

        let stats = syncer.run_pass().expect("run pass");

        assert_eq!(stats.dirs_created, 1);
        assert_eq!(stats.files_created, 1);
        assert_eq!(fs::read(replica.join("a.txt")).expect("read replica"), b"hello");
        assert!(sink.labels().contains(&"dir-created".to_string()));
        assert!(sink.labels().contains(&"file-created".to_string()));
    }

    #[test]
    fn test_excluded_paths_are_invisible() {
        let source = TempDir::new().expect("create source");
        let replica = TempDir::new().expect("create replica");
        fs::write(source.path().join("keep.txt"), b"keep").expect("write keep");
        fs::write(source.path().join("skip.log"), b"skip").expect("write skip");
        // A replica-only file matching the pattern must also survive.
        fs::write(replica.path().join("local.log"), b"local").expect("write local");

        let mut config = Config::new(source.path(), replica.path());
        config.exclude = vec!["*.log".to_string()];
        let (_sink, syncer) = syncer_for(&config);

        syncer.run_pass().expect("run pass");

        assert!(replica.path().join("keep.txt").exists());
        assert!(!replica.path().join("skip.log").exists());
        assert!(replica.path().join("local.log").exists());
    }

    #[test]
    fn test_missing_source_root_is_fatal_before_any_event() {
        let parent = TempDir::new().expect("create parent");
        let config = Config::new(parent.path().join("nope"), parent.path().join("replica"));
        let (sink, syncer) = syncer_for(&config);

        let err = syncer.run_pass().unwrap_err();

        assert!(matches!(err, MirraError::SourceMissing { .. }));
        assert!(sink.labels().is_empty(), "no events for a pass that never started");
        assert!(!parent.path().join("replica").exists());
    }

    #[test]
    fn test_invalid_exclude_pattern_is_config_error() {
        let source = TempDir::new().expect("create source");
        let replica = TempDir::new().expect("create replica");
        let mut config = Config::new(source.path(), replica.path());
        config.exclude = vec!["[".to_string()];

        let err = Syncer::new(&config, Arc::new(|_: &SyncEvent| {})).unwrap_err();
        assert!(matches!(err, MirraError::Config(_)));
    }
}

//! Per-pass counters

use indicatif::HumanBytes;
use serde::Serialize;

/// Counters for one complete mirror pass.
///
/// `errors` counts per-entry failures that were reported and skipped; a pass
/// with a non-zero error count still completed in the best-effort sense.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    /// Files copied into the replica that did not exist there before.
    pub files_created: usize,
    /// Existing replica files overwritten with source content.
    pub files_copied: usize,
    /// Files classified identical; no I/O performed.
    pub files_unchanged: usize,
    pub files_deleted: usize,
    pub dirs_created: usize,
    /// Replica subtrees removed (one count per recursive delete).
    pub dirs_deleted: usize,
    /// Per-entry failures reported and skipped past.
    pub errors: usize,
    /// Aggregate bytes written by create/overwrite copies.
    pub bytes_copied: u64,
    /// Wall-clock duration of the pass.
    pub duration_ms: u64,
}

impl PassStats {
    /// Number of replica mutations this pass performed.
    pub fn changes(&self) -> usize {
        self.files_created
            + self.files_copied
            + self.files_deleted
            + self.dirs_created
            + self.dirs_deleted
    }

    /// One-line human summary for the pass log.
    pub fn summary(&self) -> String {
        format!(
            "created: {}  copied: {}  unchanged: {}  deleted: {} file(s) + {} dir(s)  \
             errors: {}  transferred: {}  in {} ms",
            self.files_created,
            self.files_copied,
            self.files_unchanged,
            self.files_deleted,
            self.dirs_deleted,
            self.errors,
            HumanBytes(self.bytes_copied),
            self.duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_counts_mutations_only() {
        let stats = PassStats {
            files_created: 2,
            files_copied: 1,
            files_unchanged: 40,
            files_deleted: 3,
            dirs_created: 1,
            dirs_deleted: 1,
            errors: 5,
            ..Default::default()
        };
        assert_eq!(stats.changes(), 8);
    }

    #[test]
    fn test_summary_is_human_readable() {
        let stats = PassStats {
            files_created: 1,
            bytes_copied: 5 * 1024 * 1024,
            duration_ms: 42,
            ..Default::default()
        };
        let summary = stats.summary();
        assert!(summary.contains("created: 1"));
        assert!(summary.contains("MiB"), "expected human bytes: {summary}");
        assert!(summary.contains("42 ms"));
    }

    #[test]
    fn test_quiet_pass_has_no_changes() {
        let stats = PassStats {
            files_unchanged: 10,
            ..Default::default()
        };
        assert_eq!(stats.changes(), 0);
    }
}

//! Configuration and CLI surface

use crate::compare::DEFAULT_HASH_THRESHOLD;
use crate::types::MirraError;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line interface
#[derive(Debug, Parser)]
#[command(
    name = "mirra",
    version,
    about = "One-way folder mirroring - periodic, predictable, verifiable"
)]
pub struct Cli {
    /// Directory to mirror from
    pub source: PathBuf,

    /// Directory to mirror into
    pub replica: PathBuf,

    /// Milliseconds between passes
    #[arg(long, default_value_t = 30_000, value_name = "MS")]
    pub interval: u64,

    /// Append structured events to this JSONL file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Relative-path glob to leave alone on both sides (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Source size in bytes at which contents are digested instead of re-copied
    #[arg(long, default_value_t = DEFAULT_HASH_THRESHOLD, value_name = "BYTES")]
    pub hash_threshold: u64,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Source directory (mirrored from)
    pub source: PathBuf,

    /// Replica directory (mirrored into)
    pub replica: PathBuf,

    /// Time between scheduler ticks
    pub interval: Duration,

    /// Optional JSONL event log destination
    pub log_file: Option<PathBuf>,

    /// Exclude patterns (globs against relative paths)
    pub exclude: Vec<String>,

    /// Comparator size cutoff for content digesting
    pub hash_threshold: u64,

    /// Single-pass mode; the scheduler is bypassed
    pub once: bool,
}

impl Config {
    /// Configuration with defaults for everything but the two roots.
    pub fn new(source: impl Into<PathBuf>, replica: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            replica: replica.into(),
            interval: Duration::from_millis(30_000),
            log_file: None,
            exclude: Vec::new(),
            hash_threshold: DEFAULT_HASH_THRESHOLD,
            once: false,
        }
    }

    /// Validate configuration. Any failure here is fatal at startup; the
    /// scheduler must not begin ticking.
    pub fn validate(&self) -> Result<(), MirraError> {
        if self.interval.is_zero() {
            return Err(MirraError::Config(
                "Interval must be a positive number of milliseconds".to_string(),
            ));
        }

        if !self.source.is_dir() {
            return Err(MirraError::Config(format!(
                "Source path is not an existing directory: {}",
                self.source.display()
            )));
        }

        if self.replica.exists() && !self.replica.is_dir() {
            return Err(MirraError::Config(format!(
                "Replica path exists but is not a directory: {}",
                self.replica.display()
            )));
        }

        // A replica under the source would mirror itself into itself on
        // every pass.
        let source = self
            .source
            .canonicalize()
            .map_err(|e| MirraError::io(&self.source, e))?;
        let replica = if self.replica.exists() {
            self.replica
                .canonicalize()
                .map_err(|e| MirraError::io(&self.replica, e))?
        } else {
            std::path::absolute(&self.replica).map_err(|e| MirraError::io(&self.replica, e))?
        };
        if replica == source || replica.starts_with(&source) {
            return Err(MirraError::Config(format!(
                "Replica cannot be the source or live inside it: {}",
                self.replica.display()
            )));
        }

        Ok(())
    }
}

impl TryFrom<Cli> for Config {
    type Error = MirraError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let config = Config {
            source: cli.source,
            replica: cli.replica,
            interval: Duration::from_millis(cli.interval),
            log_file: cli.log_file,
            exclude: cli.exclude,
            hash_threshold: cli.hash_threshold,
            once: cli.once,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_accepts_two_directories() {
        let source = TempDir::new().expect("create source");
        let replica = TempDir::new().expect("create replica");
        let config = Config::new(source.path(), replica.path());
        config.validate().expect("valid config");
    }

    #[test]
    fn test_validate_accepts_missing_replica() {
        let source = TempDir::new().expect("create source");
        let parent = TempDir::new().expect("create parent");
        let config = Config::new(source.path(), parent.path().join("not-yet"));
        config.validate().expect("valid config");
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let source = TempDir::new().expect("create source");
        let replica = TempDir::new().expect("create replica");
        let mut config = Config::new(source.path(), replica.path());
        config.interval = Duration::ZERO;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Interval"));
    }

    #[test]
    fn test_validate_rejects_missing_source() {
        let parent = TempDir::new().expect("create parent");
        let config = Config::new(parent.path().join("absent"), parent.path().join("replica"));

        let err = config.validate().unwrap_err();
        assert!(matches!(err, MirraError::Config(_)));
        assert!(err.to_string().contains("Source path"));
    }

    #[test]
    fn test_validate_rejects_replica_equal_to_source() {
        let source = TempDir::new().expect("create source");
        let config = Config::new(source.path(), source.path());

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_replica_inside_source() {
        let source = TempDir::new().expect("create source");
        let config = Config::new(source.path(), source.path().join("replica"));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("inside"));
    }

    #[test]
    fn test_validate_rejects_replica_that_is_a_file() {
        let source = TempDir::new().expect("create source");
        let parent = TempDir::new().expect("create parent");
        let replica = parent.path().join("squatter");
        std::fs::write(&replica, b"not a directory").expect("write squatter");

        let err = Config::new(source.path(), &replica).validate().unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_cli_maps_into_config() {
        let source = TempDir::new().expect("create source");
        let replica = TempDir::new().expect("create replica");

        let cli = Cli::try_parse_from([
            "mirra",
            source.path().to_str().expect("utf8 source"),
            replica.path().to_str().expect("utf8 replica"),
            "--interval",
            "500",
            "--exclude",
            "*.tmp",
            "--once",
        ])
        .expect("parse cli");

        let config = Config::try_from(cli).expect("convert cli");
        assert_eq!(config.interval, Duration::from_millis(500));
        assert_eq!(config.exclude, vec!["*.tmp".to_string()]);
        assert!(config.once);
        assert_eq!(config.hash_threshold, DEFAULT_HASH_THRESHOLD);
    }

    #[test]
    fn test_cli_rejects_non_numeric_interval() {
        assert!(Cli::try_parse_from(["mirra", "/s", "/r", "--interval", "soon"]).is_err());
    }
}

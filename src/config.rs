//! Construction-time configuration for a [`Database`](crate::Database).
//!
//! Supports:
//! - CLI arguments via clap (flatten [`DatabaseConfig`] into any parser)
//! - Environment variable overrides
//! - Defaults for an in-memory cache

use clap::Args;
use std::path::{Path, PathBuf};

/// Where the database lives and how its worker is set up.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// SQLite database file (in-memory when omitted)
    ///
    /// Always a filesystem path, never a SQLite URI: a relative `file:x.db`
    /// names a file called `file:x.db` in the working directory.
    #[arg(long = "database", env = "IGSTORE_DATABASE")]
    pub location: Option<PathBuf>,

    /// Maximum number of operations queued for the database worker
    #[arg(long, env = "IGSTORE_QUEUE_SIZE", default_value_t = 64)]
    pub queue_size: usize,

    /// Name given to the database worker thread
    #[arg(long, env = "IGSTORE_LABEL", default_value = "io.igstore.database")]
    pub label: String,
}

impl DatabaseConfig {
    pub const DEFAULT_QUEUE_SIZE: usize = 64;
    pub const DEFAULT_LABEL: &'static str = "io.igstore.database";

    /// Memory-only database, discarded when closed.
    pub fn in_memory() -> Self {
        Self {
            location: None,
            queue_size: Self::DEFAULT_QUEUE_SIZE,
            label: Self::DEFAULT_LABEL.into(),
        }
    }

    /// Database persisted at `path`. Missing parent directories are created on open.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Some(path.into()),
            ..Self::in_memory()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.location.as_deref()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        database: DatabaseConfig,
    }

    #[test]
    fn test_default_config() {
        let config = DatabaseConfig::default();
        assert!(config.path().is_none());
        assert_eq!(config.queue_size, 64);
        assert_eq!(config.label, "io.igstore.database");
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["igstore", "--database", "/tmp/cache.db", "--queue-size", "8"]);
        assert_eq!(cli.database.path(), Some(Path::new("/tmp/cache.db")));
        assert_eq!(cli.database.queue_size, 8);
        assert_eq!(cli.database.label, DatabaseConfig::DEFAULT_LABEL);
    }
}

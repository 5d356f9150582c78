use std::path::PathBuf;
use std::time::Duration;

use hacksteader_db::pool::PoolOptions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub steaders: SteaderConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite database file; `~` is expanded
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Maximum pooled connections
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// How long a connection waits on a locked database (default: 5000)
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("hacksteader.db")
}

fn default_pool_size() -> u32 {
    4
}

fn default_busy_timeout() -> u64 {
    5000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            pool_size: default_pool_size(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

impl DatabaseConfig {
    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            max_size: self.pool_size,
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SteaderConfig {
    /// Empty tiles handed to a new steader
    #[serde(default = "default_starting_tiles")]
    pub starting_tiles: usize,
}

fn default_starting_tiles() -> usize {
    1
}

impl Default for SteaderConfig {
    fn default() -> Self {
        Self {
            starting_tiles: default_starting_tiles(),
        }
    }
}

//! Engine configuration
//!
//! # Environment Variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | WORK_DIR | /var/lib/pick-station | Directory holding the order database |

use std::path::PathBuf;

/// Engine configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Data directory for the redb database
    pub work_dir: String,
}

impl EngineConfig {
    /// Load configuration from environment variables, with defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR")
                .unwrap_or_else(|_| "/var/lib/pick-station".into()),
        }
    }

    /// Path of the order database file
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("orders.redb")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_path_lives_under_work_dir() {
        let config = EngineConfig {
            work_dir: "/tmp/pick".to_string(),
        };
        assert_eq!(config.db_path(), PathBuf::from("/tmp/pick/orders.redb"));
    }
}

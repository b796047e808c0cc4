//! CLI configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults; command-line flags override both. The core engine itself is
//! configured only through explicit `VerifyOptions`.

use std::env;
use std::path::PathBuf;

/// Veritax CLI configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the SQLite snapshot database.
    pub database_path: PathBuf,

    /// Default log filter when RUST_LOG is unset.
    pub log_filter: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// ## Variables
    /// - `VERITAX_DB_PATH` - snapshot database path (default `./veritax.db`)
    /// - `VERITAX_LOG` - fallback log filter (default `info`)
    pub fn load() -> Self {
        AppConfig {
            database_path: env::var("VERITAX_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./veritax.db")),

            log_filter: env::var("VERITAX_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Applies a command-line database path override, when given.
    pub fn with_db_override(mut self, db: Option<PathBuf>) -> Self {
        if let Some(path) = db {
            self.database_path = path;
        }
        self
    }
}

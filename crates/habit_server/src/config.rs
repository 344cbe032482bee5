//! Server configuration from command-line flags and environment.
//!
//! Every flag falls back to an environment variable, then to a default, so
//! the server starts with no arguments at all.

use clap::Parser;
use habit_core::default_log_level;
use std::io;
use std::path::PathBuf;

const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Clone, Parser)]
#[command(name = "habit-server", version, about = "Habit tracker HTTP API")]
pub struct ServerConfig {
    /// Address to bind to
    #[arg(long, env = "HABIT_BIND", default_value = "127.0.0.1")]
    pub bind: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// SQLite file holding the habit collection
    #[arg(long, env = "HABIT_DB_PATH", default_value = "habit_tracker.sqlite3")]
    pub db_path: PathBuf,

    /// trace|debug|info|warn|error (defaults by build mode)
    #[arg(long, env = "HABIT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Directory for rolling log files (relative paths resolve against cwd)
    #[arg(long, env = "HABIT_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or_else(|| default_log_level())
    }

    /// Absolute log directory; logging refuses relative paths.
    pub fn resolved_log_dir(&self) -> io::Result<PathBuf> {
        let dir = self
            .log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
        if dir.is_absolute() {
            return Ok(dir);
        }
        Ok(std::env::current_dir()?.join(dir))
    }
}

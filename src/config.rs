//! Configuration management for shell-queue.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::pty::{DEFAULT_ESCALATION, DEFAULT_SHELL};
use crate::session::{SessionConfig, DEFAULT_STARTUP_TIMEOUT};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shell launch settings.
    pub shell: ShellSection,
    /// Command execution settings.
    pub execution: ExecutionSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Shell configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSection {
    /// Shell program for normal sessions.
    pub program: String,
    /// Arguments passed to the shell.
    pub args: Vec<String>,
    /// Escalation broker followed by its arguments.
    pub escalation: Vec<String>,
    /// Directory to start in.
    pub working_dir: Option<PathBuf>,
    /// Variables exported into the shell.
    pub env: BTreeMap<String, String>,
    /// Startup handshake timeout in milliseconds.
    pub startup_timeout_ms: u64,
}

impl Default for ShellSection {
    fn default() -> Self {
        Self {
            program: DEFAULT_SHELL.to_string(),
            args: Vec::new(),
            escalation: vec![DEFAULT_ESCALATION.to_string()],
            working_dir: None,
            env: BTreeMap::new(),
            startup_timeout_ms: DEFAULT_STARTUP_TIMEOUT.as_millis() as u64,
        }
    }
}

/// Execution configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSection {
    /// Per-command wait timeout in seconds; none waits indefinitely.
    pub default_timeout_secs: Option<u64>,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or a full filter.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(shell) = std::env::var("SHELL_QUEUE_SHELL") {
            if !shell.is_empty() {
                self.shell.program = shell;
            }
        }

        if let Ok(broker) = std::env::var("SHELL_QUEUE_ESCALATION") {
            let words: Vec<String> = broker.split_whitespace().map(str::to_string).collect();
            if !words.is_empty() {
                self.shell.escalation = words;
            }
        }

        if let Ok(timeout) = std::env::var("SHELL_QUEUE_TIMEOUT") {
            let secs = timeout
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SHELL_QUEUE_TIMEOUT", timeout))?;
            self.execution.default_timeout_secs = Some(secs);
        }

        if let Ok(level) = std::env::var("SHELL_QUEUE_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref shell) = args.shell {
            self.shell.program = shell.clone();
        }

        if let Some(secs) = args.timeout {
            self.execution.default_timeout_secs = Some(secs);
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env()?;
        config.apply_args(args);

        Ok(config)
    }

    /// Build the session configuration, escalated if `elevated`.
    pub fn to_session_config(&self, elevated: bool) -> Result<SessionConfig, ConfigError> {
        if self.shell.program.is_empty() {
            return Err(ConfigError::InvalidValue("shell.program", String::new()));
        }
        if self.shell.startup_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "shell.startup_timeout_ms",
                "0".to_string(),
            ));
        }

        let mut session = SessionConfig::new()
            .shell(self.shell.program.clone())
            .elevated(elevated)
            .startup_timeout(Duration::from_millis(self.shell.startup_timeout_ms));
        session.shell_args = self.shell.args.clone();
        session.env = self.shell.env.clone();
        session.working_dir = self.shell.working_dir.clone();
        if !self.shell.escalation.is_empty() {
            session = session.escalation(self.shell.escalation.iter().cloned());
        }
        if let Some(secs) = self.execution.default_timeout_secs {
            session = session.default_timeout(Duration::from_secs(secs));
        }

        Ok(session)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// A setting holds an unusable value.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for {}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

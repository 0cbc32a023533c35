use crate::sequencer::ReorderStrategy;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Back-office configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|--------|------|
/// | DATABASE_PATH | entrega.db | SQLite file (`:memory:` for an ephemeral store) |
/// | LOG_LEVEL | info | Default level when `RUST_LOG` is unset |
/// | LOG_DIR | (none) | Daily rolling log files are written here when set |
/// | PRINTER_ADDR | (none) | Receipt printer `ip[:port]` |
/// | RECEIPT_WIDTH | 48 | Characters per receipt line (32 for 58mm paper) |
/// | REORDER_STRATEGY | sequential | `sequential` or `atomic` |
/// | ENVIRONMENT | development | development / staging / production |
///
/// # Example
///
/// ```ignore
/// DATABASE_PATH=/var/lib/entrega/entrega.db PRINTER_ADDR=192.168.0.50 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub printer_addr: Option<String>,
    pub receipt_width: usize,
    pub reorder_strategy: ReorderStrategy,
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "entrega.db".into(),
            log_level: "info".into(),
            log_dir: None,
            printer_addr: None,
            receipt_width: 48,
            reorder_strategy: ReorderStrategy::default(),
            environment: "development".into(),
        }
    }
}

impl Config {
    /// Load configuration from the environment
    ///
    /// Unset variables take their defaults; malformed numeric or enum values
    /// are rejected instead of silently replaced.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, test map, ...)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let receipt_width = match non_empty("RECEIPT_WIDTH") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(width) if width >= 24 => width,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "RECEIPT_WIDTH",
                        value: raw,
                    });
                }
            },
            None => defaults.receipt_width,
        };

        let reorder_strategy = match non_empty("REORDER_STRATEGY") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "REORDER_STRATEGY",
                    value: raw,
                })?,
            None => defaults.reorder_strategy,
        };

        Ok(Self {
            database_path: non_empty("DATABASE_PATH").unwrap_or(defaults.database_path),
            log_level: non_empty("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: non_empty("LOG_DIR"),
            printer_addr: non_empty("PRINTER_ADDR"),
            receipt_width,
            reorder_strategy,
            environment: non_empty("ENVIRONMENT").unwrap_or(defaults.environment),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

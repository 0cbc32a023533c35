//! Core module - configuration

pub mod config;

pub use config::{Config, ConfigError};

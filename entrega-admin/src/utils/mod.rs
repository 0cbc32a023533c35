//! Utilities - logging

pub mod logger;

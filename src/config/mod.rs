//! Configuration module for Rivalscope
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so an empty file is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use rivalscope::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("rivalscope.toml")).unwrap();
//! println!("Session budget: {}", config.fetch.max_requests);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AnalysisConfig, CacheConfig, Config, FetchConfig, ProbeConfig, ProxyEntry,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;

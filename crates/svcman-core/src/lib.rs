//! # svcman-core
//!
//! Service definitions, structured lifecycle outcomes and the configuration
//! store consumed by `svcman-engine`.

pub mod builder;
pub mod config;
pub mod error;
pub mod types;

pub use builder::ServiceDefinitionBuilder;
pub use config::{ConfigStore, Settings, DEFAULT_CONFIG_FILE};
pub use error::ConfigError;
pub use types::*;

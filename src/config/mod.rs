// src/config/mod.rs

//! Configuration loading and validation for spoolr.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).
//! - Expose named settings to components that only need a few values
//!   (`settings.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_and_validate, load_from_path, parse_str};
pub use model::{
    ConfigFile, ConnectionsSection, DevicesSection, NetworkSection, RawConfigFile,
    StartupSection, SystemSection, UpdateSection,
};
pub use settings::{Settings, TomlSettings};
pub use validate::validate_config;

// src/config/validate.rs

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SpoolrError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SpoolrError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Run every semantic check on a raw config.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_raw_config(cfg)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_system(cfg)?;
    validate_attempts("network", cfg.network.max_attempts)?;
    validate_attempts("devices", cfg.devices.max_attempts)?;
    validate_device_pattern(cfg)?;
    Ok(())
}

fn validate_system(cfg: &RawConfigFile) -> Result<()> {
    if cfg.system.scripts_dir.as_os_str().is_empty() {
        return Err(SpoolrError::ConfigError(
            "[system].scripts_dir must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_attempts(section: &str, max_attempts: Option<u32>) -> Result<()> {
    if max_attempts == Some(0) {
        return Err(SpoolrError::ConfigError(format!(
            "[{section}].max_attempts must be >= 1 (got 0)"
        )));
    }
    Ok(())
}

fn validate_device_pattern(cfg: &RawConfigFile) -> Result<()> {
    if !cfg.devices.enabled {
        return Ok(());
    }
    Regex::new(&cfg.devices.pattern).map_err(|e| {
        SpoolrError::ConfigError(format!(
            "[devices].pattern '{}' is not a valid regex: {e}",
            cfg.devices.pattern
        ))
    })?;
    Ok(())
}

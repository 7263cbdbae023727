// src/config/settings.rs

//! Named, read-only settings.
//!
//! Components that only need a handful of values (credentials, feature flags)
//! take an `Arc<dyn Settings>` instead of the whole typed config. Keys are
//! dotted paths into the config document, e.g. `"network.apn"`.

use std::fmt::Debug;

use toml::{Table, Value};

pub trait Settings: Send + Sync + Debug {
    fn get_string(&self, key: &str) -> Option<String>;
    fn get_bool(&self, key: &str) -> Option<bool>;

    /// String lookup with an empty-string fallback.
    fn string_or_empty(&self, key: &str) -> String {
        self.get_string(key).unwrap_or_default()
    }
}

/// [`Settings`] backed by a parsed TOML document.
#[derive(Debug, Clone, Default)]
pub struct TomlSettings {
    document: Table,
}

impl TomlSettings {
    pub fn new(document: Table) -> Self {
        Self { document }
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let first = parts.next()?;
        let mut current = self.document.get(first)?;
        for part in parts {
            current = current.as_table()?.get(part)?;
        }
        Some(current)
    }
}

impl Settings for TomlSettings {
    fn get_string(&self, key: &str) -> Option<String> {
        match self.lookup(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.lookup(key)? {
            Value::Boolean(b) => Some(*b),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "on" => Some(true),
                "false" | "no" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

//! Reconciler settings loaded from the environment.
//!
//! Supported environment variables:
//! - ARCANUM_SETTLE_DELAY_MS: wait between engine steps of a pass (default 50)
//! - ARCANUM_VERIFY_DELAY_MS: delay before the verification pass (default 1500)
//! - ARCANUM_DOMAIN_ROW_LIMIT: rows of domains.2da scanned (default 64)
//! - ARCANUM_DATA_PATH: directory holding the 2DA tables

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_SETTLE_DELAY_MS: u64 = 50;
const DEFAULT_VERIFY_DELAY_MS: u64 = 1500;
const DEFAULT_DOMAIN_ROW_LIMIT: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerSettings {
    /// Wait after each engine mutation so the engine applies it before the next step
    pub settle_delay: Duration,
    pub verify_delay: Duration,
    pub domain_row_limit: usize,
    pub data_path: PathBuf,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            verify_delay: Duration::from_millis(DEFAULT_VERIFY_DELAY_MS),
            domain_row_limit: DEFAULT_DOMAIN_ROW_LIMIT,
            data_path: default_data_path(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

impl ReconcilerSettings {
    /// Defaults overridden by any valid environment variable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(ms) = parse_var::<u64>(&lookup, "ARCANUM_SETTLE_DELAY_MS") {
            settings.settle_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "ARCANUM_VERIFY_DELAY_MS") {
            settings.verify_delay = Duration::from_millis(ms);
        }
        if let Some(limit) = parse_var::<usize>(&lookup, "ARCANUM_DOMAIN_ROW_LIMIT") {
            if limit > 0 {
                settings.domain_row_limit = limit;
            } else {
                tracing::warn!("ARCANUM_DOMAIN_ROW_LIMIT must be positive, ignoring");
            }
        }
        if let Some(path) = lookup("ARCANUM_DATA_PATH").filter(|p| !p.trim().is_empty()) {
            settings.data_path = PathBuf::from(path);
        }

        settings
    }

    /// Zero delays, for tests driving passes directly.
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            verify_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let val = lookup(key)?;
    match val.trim().parse::<T>() {
        Ok(parsed) => {
            tracing::info!(key, val = %val, "Applied environment override");
            Some(parsed)
        }
        Err(_) => {
            tracing::warn!(key, val = %val, "Environment variable is not a valid number, ignoring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let settings = ReconcilerSettings::from_lookup(lookup(&[]));
        assert_eq!(settings, ReconcilerSettings::default());
        assert_eq!(settings.settle_delay, Duration::from_millis(50));
        assert_eq!(settings.verify_delay, Duration::from_millis(1500));
        assert_eq!(settings.domain_row_limit, 64);
    }

    #[test]
    fn applies_valid_overrides() {
        let settings = ReconcilerSettings::from_lookup(lookup(&[
            ("ARCANUM_SETTLE_DELAY_MS", "5"),
            ("ARCANUM_VERIFY_DELAY_MS", " 250 "),
            ("ARCANUM_DOMAIN_ROW_LIMIT", "32"),
            ("ARCANUM_DATA_PATH", "/srv/rules"),
        ]));
        assert_eq!(settings.settle_delay, Duration::from_millis(5));
        assert_eq!(settings.verify_delay, Duration::from_millis(250));
        assert_eq!(settings.domain_row_limit, 32);
        assert_eq!(settings.data_path, PathBuf::from("/srv/rules"));
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let settings = ReconcilerSettings::from_lookup(lookup(&[
            ("ARCANUM_SETTLE_DELAY_MS", "soon"),
            ("ARCANUM_DOMAIN_ROW_LIMIT", "0"),
        ]));
        assert_eq!(settings.settle_delay, Duration::from_millis(50));
        assert_eq!(settings.domain_row_limit, 64);
    }
}

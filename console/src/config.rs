use crate::error::ConsoleError;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct ConsoleConfig {
    pub bind_addr: String,
    pub fleet_size: usize,
    /// Used by the compliance check while no recommendation is active.
    pub required_categories: Vec<String>,
    pub playback_interval: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".into(),
            fleet_size: 80,
            required_categories: vec!["RTW".into(), "NEF".into(), "HLF".into()],
            playback_interval: Duration::from_millis(2500),
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self, ConsoleError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConsoleError> {
        let defaults = Self::default();

        let bind_addr = lookup("DISPATCH_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let fleet_size = match lookup("DISPATCH_FLEET_SIZE") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .map_err(|e| ConsoleError::Config(format!("DISPATCH_FLEET_SIZE '{v}': {e}")))?,
            None => defaults.fleet_size,
        };

        let required_categories = match lookup("DISPATCH_REQUIRED_CATEGORIES") {
            Some(v) => v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect(),
            None => defaults.required_categories,
        };

        let playback_interval = match lookup("DISPATCH_PLAYBACK_INTERVAL_MS") {
            Some(v) => {
                let ms = v.trim().parse::<u64>().map_err(|e| {
                    ConsoleError::Config(format!("DISPATCH_PLAYBACK_INTERVAL_MS '{v}': {e}"))
                })?;
                if ms == 0 {
                    return Err(ConsoleError::Config(
                        "DISPATCH_PLAYBACK_INTERVAL_MS must be positive".into(),
                    ));
                }
                Duration::from_millis(ms)
            }
            None => defaults.playback_interval,
        };

        Ok(Self {
            bind_addr,
            fleet_size,
            required_categories,
            playback_interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ConsoleConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, ConsoleConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = ConsoleConfig::from_lookup(lookup(&[
            ("DISPATCH_BIND_ADDR", "127.0.0.1:9000"),
            ("DISPATCH_FLEET_SIZE", "12"),
            ("DISPATCH_REQUIRED_CATEGORIES", "RTW, HLF,,"),
            ("DISPATCH_PLAYBACK_INTERVAL_MS", "100"),
        ]))
        .expect("config");
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.fleet_size, 12);
        assert_eq!(config.required_categories, vec!["RTW", "HLF"]);
        assert_eq!(config.playback_interval, Duration::from_millis(100));
    }

    #[test]
    fn rejects_invalid_numbers() {
        assert!(matches!(
            ConsoleConfig::from_lookup(lookup(&[("DISPATCH_FLEET_SIZE", "many")])),
            Err(ConsoleError::Config(_))
        ));
        assert!(matches!(
            ConsoleConfig::from_lookup(lookup(&[("DISPATCH_PLAYBACK_INTERVAL_MS", "0")])),
            Err(ConsoleError::Config(_))
        ));
    }
}

use log::warn;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const BIND_VAR: &str = "TIMETABLE_BIND";
pub const TIME_LIMIT_VAR: &str = "TIMETABLE_TIME_LIMIT_MS";
pub const MAX_CONCURRENT_SOLVES_VAR: &str = "TIMETABLE_MAX_CONCURRENT_SOLVES";

/// Runtime settings for the server and the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    /// Used when a request does not carry its own `timeLimitMs`.
    pub time_limit: Duration,
    pub max_concurrent_solves: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            time_limit: Duration::from_secs(30),
            max_concurrent_solves: 4,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through `lookup`; unparsable values fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind: parse_or(&lookup, BIND_VAR, defaults.bind),
            time_limit: Duration::from_millis(parse_or(
                &lookup,
                TIME_LIMIT_VAR,
                defaults.time_limit.as_millis() as u64,
            )),
            max_concurrent_solves: parse_or(
                &lookup,
                MAX_CONCURRENT_SOLVES_VAR,
                defaults.max_concurrent_solves,
            )
            .max(1),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring {}={:?}: not a valid value.", key, raw);
            default
        }),
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        assert_eq!(AppConfig::from_lookup(|_| None), AppConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (BIND_VAR, "0.0.0.0:9000"),
            (TIME_LIMIT_VAR, "1500"),
            (MAX_CONCURRENT_SOLVES_VAR, "0"),
        ]));
        assert_eq!(config.bind, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.time_limit, Duration::from_millis(1500));
        assert_eq!(config.max_concurrent_solves, 1);
    }

    #[test]
    fn ignores_garbage() {
        let config = AppConfig::from_lookup(lookup(&[(TIME_LIMIT_VAR, "soon")]));
        assert_eq!(config.time_limit, Duration::from_secs(30));
    }
}

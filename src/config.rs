// Configuration for iceberg
// Reads from environment variables with sensible defaults

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Namespace components used to group exported nodes (ICEBERG_NAMESPACE_SPECIFICITY)
    pub namespace_specificity: usize,

    /// Default export path (ICEBERG_OUTPUT)
    pub output: PathBuf,

    /// Projects whose names contain this are not searched for callers
    /// (ICEBERG_DOWNSTREAM_EXCLUDE). Empty disables the exclusion.
    pub downstream_exclude: String,

    /// Parser threads, 0 for the rayon default (ICEBERG_PARSE_THREADS)
    pub parse_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace_specificity: 2,
            output: PathBuf::from("dependency_map.gen.dgml"),
            downstream_exclude: "Test".to_string(),
            parse_threads: 0,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();

        parse_into(
            &lookup,
            "ICEBERG_NAMESPACE_SPECIFICITY",
            &mut config.namespace_specificity,
        );
        parse_into(&lookup, "ICEBERG_PARSE_THREADS", &mut config.parse_threads);

        if let Some(val) = lookup("ICEBERG_OUTPUT") {
            if val.trim().is_empty() {
                warn!(
                    "Invalid ICEBERG_OUTPUT value: empty, using default: {}",
                    config.output.display()
                );
            } else {
                config.output = PathBuf::from(val);
            }
        }

        if let Some(val) = lookup("ICEBERG_DOWNSTREAM_EXCLUDE") {
            config.downstream_exclude = val.trim().to_string();
        }

        config
    }
}

fn parse_into<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T)
where
    T: FromStr + std::fmt::Display,
{
    let Some(val) = lookup(key) else {
        return;
    };
    match val.trim().parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!("Invalid {key} value: {val}, using default: {slot}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.namespace_specificity, 2);
        assert_eq!(config.output, PathBuf::from("dependency_map.gen.dgml"));
        assert_eq!(config.downstream_exclude, "Test");
        assert_eq!(config.parse_threads, 0);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("ICEBERG_NAMESPACE_SPECIFICITY", "3"),
            ("ICEBERG_OUTPUT", "out/map.dgml"),
            ("ICEBERG_DOWNSTREAM_EXCLUDE", ""),
            ("ICEBERG_PARSE_THREADS", "4"),
        ]);
        assert_eq!(config.namespace_specificity, 3);
        assert_eq!(config.output, PathBuf::from("out/map.dgml"));
        assert!(config.downstream_exclude.is_empty());
        assert_eq!(config.parse_threads, 4);
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let config = config_from(&[
            ("ICEBERG_NAMESPACE_SPECIFICITY", "two"),
            ("ICEBERG_OUTPUT", "  "),
        ]);
        assert_eq!(config, Config::default());
    }
}

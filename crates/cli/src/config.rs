//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use llm::ProviderConfig;
use nodes::PipelineSettings;
use thiserror::Error;

/// A configuration value that could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was set to something that does not parse.
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// What the variable should contain.
        expected: &'static str,
        /// What it actually contained.
        value: String,
    },
}

/// Everything the composition root needs to build the pipeline.
///
/// | Env Var                     | Default                     |
/// |-----------------------------|-----------------------------|
/// | `TASKGEN_LLM_API_KEY`       | unset (service unavailable) |
/// | `TASKGEN_LLM_BASE_URL`      | `https://api.openai.com/v1` |
/// | `TASKGEN_LLM_MODEL`         | `gpt-4o-mini`               |
/// | `TASKGEN_LLM_TIMEOUT_SECS`  | `30`                        |
/// | `TASKGEN_LOCALE`            | `English`                   |
/// | `TASKGEN_STORE_PATH`        | `taskgen-data.json`         |
/// | `OTEL_EXPORTER_OTLP_ENDPOINT` | unset (no OTLP export)    |
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Language-model connection.
    pub provider: ProviderConfig,
    /// Output language for generated text.
    pub locale: String,
    /// Path of the JSON record store.
    pub store_path: PathBuf,
    /// OTLP collector endpoint, if traces should be exported.
    pub otlp_endpoint: Option<String>,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unparseable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`; blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unparseable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut provider = ProviderConfig::new(var("TASKGEN_LLM_API_KEY"));
        if let Some(base_url) = var("TASKGEN_LLM_BASE_URL") {
            provider.base_url = base_url;
        }
        if let Some(model) = var("TASKGEN_LLM_MODEL") {
            provider.model = model;
        }
        if let Some(raw) = var("TASKGEN_LLM_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::Invalid {
                    name: "TASKGEN_LLM_TIMEOUT_SECS",
                    expected: "a positive whole number of seconds",
                    value: raw.clone(),
                })?;
            provider.timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            provider,
            locale: var("TASKGEN_LOCALE").unwrap_or_else(|| "English".to_string()),
            store_path: var("TASKGEN_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("taskgen-data.json")),
            otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// Orchestrator settings. The gateway bound sits slightly above the HTTP
    /// client timeout so the client's own timeout fires first.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            locale: self.locale.clone(),
            model_timeout: self.provider.timeout + Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.provider.api_key.is_none());
        assert_eq!(config.provider.base_url, llm::DEFAULT_BASE_URL);
        assert_eq!(config.provider.timeout, llm::DEFAULT_TIMEOUT);
        assert_eq!(config.locale, "English");
        assert_eq!(config.store_path, PathBuf::from("taskgen-data.json"));
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn variables_override_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("TASKGEN_LLM_API_KEY", "sk-test"),
            ("TASKGEN_LLM_MODEL", "llama-3.1-8b-instant"),
            ("TASKGEN_LLM_TIMEOUT_SECS", "12"),
            ("TASKGEN_LOCALE", "Portuguese (Brazil)"),
            ("TASKGEN_STORE_PATH", "/tmp/db.json"),
        ]))
        .unwrap();

        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.provider.model, "llama-3.1-8b-instant");
        assert_eq!(config.provider.timeout, Duration::from_secs(12));
        assert_eq!(config.locale, "Portuguese (Brazil)");
        assert_eq!(
            config.pipeline_settings().model_timeout,
            Duration::from_secs(17)
        );
    }

    #[test]
    fn blank_key_counts_as_unset() {
        let config = AppConfig::from_lookup(lookup(&[("TASKGEN_LLM_API_KEY", "  ")])).unwrap();
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        for raw in ["soon", "0", "-5"] {
            let err = AppConfig::from_lookup(lookup(&[("TASKGEN_LLM_TIMEOUT_SECS", raw)]))
                .unwrap_err();
            assert_matches!(err, ConfigError::Invalid { name: "TASKGEN_LLM_TIMEOUT_SECS", .. });
        }
    }
}

//! Runtime configuration, read once at startup and passed down explicitly.

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_BATCH_SIZE, DEFAULT_DB_POOL_SIZE, DEFAULT_FREQUENCY_PENALTY,
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_JOB_TIMEOUT_SECS, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_PRESENCE_PENALTY, DEFAULT_PROCESS_INTERVAL_SECS, DEFAULT_SWEEP_INTERVAL_SECS,
    DEFAULT_TEMPERATURE, DEFAULT_TOP_P, DEFAULT_VISIBILITY_TIMEOUT_SECS,
};
use crate::content::OutputTarget;
use crate::env_config::{env_lookup, parse_with_default};
use crate::error::CoreError;

/// Generation backend selected at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Single chat completion, free-form text.
    Direct,
    /// Forced function call returning title/description/body.
    #[default]
    Structured,
    /// External HTTP endpoint that wraps the model.
    Proxy,
}

impl StrategyKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Direct => "direct",
            Self::Structured => "structured",
            Self::Proxy => "proxy",
        }
    }
}

impl Display for StrategyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "structured" => Ok(Self::Structured),
            "proxy" => Ok(Self::Proxy),
            other => Err(CoreError::InvalidStrategy(other.to_owned())),
        }
    }
}

/// Sampling parameters sent with every chat completion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecodingParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            frequency_penalty: DEFAULT_FREQUENCY_PENALTY,
            presence_penalty: DEFAULT_PRESENCE_PENALTY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub db_path: PathBuf,
    /// PostgreSQL URL; takes precedence over `db_path` when the backend is compiled in.
    pub database_url: Option<String>,
    pub pool_size: u32,
}

#[derive(Clone, PartialEq)]
pub struct GenerationConfig {
    pub strategy: StrategyKind,
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub proxy_url: Option<String>,
    pub proxy_token: Option<String>,
    /// System message for the structured strategy.
    pub system_prompt: Option<String>,
    pub decoding: DecodingParams,
    pub http_timeout: Duration,
}

impl Debug for GenerationConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GenerationConfig")
            .field("strategy", &self.strategy)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("proxy_url", &self.proxy_url)
            .field("proxy_token", &self.proxy_token.as_ref().map(|_| "***"))
            .field("system_prompt", &self.system_prompt.as_ref().map(String::len))
            .field("decoding", &self.decoding)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            api_key: None,
            api_url: DEFAULT_API_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            proxy_url: None,
            proxy_token: None,
            system_prompt: None,
            decoding: DecodingParams::default(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// Settings read by the queue processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Global fallback template used when no stored template matches.
    pub default_prompt: Option<String>,
    pub default_author: Option<String>,
    pub output_target: OutputTarget,
    pub batch_size: usize,
    pub job_timeout: Duration,
    pub visibility_timeout_secs: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_prompt: None,
            default_author: None,
            output_target: OutputTarget::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            job_timeout: Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS),
            visibility_timeout_secs: DEFAULT_VISIBILITY_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub process_interval: Duration,
    pub sweep_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            process_interval: Duration::from_secs(DEFAULT_PROCESS_INTERVAL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub storage: StorageConfig,
    pub generation: GenerationConfig,
    pub pipeline: PipelineConfig,
    pub scheduler: SchedulerConfig,
}

/// `<data dir>/storyflow/storyflow.db`, or the working directory when no
/// data dir is known.
#[must_use]
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")).join("storyflow").join("storyflow.db")
}

impl Config {
    /// Reads `STORYFLOW_*` variables from the process environment.
    ///
    /// # Errors
    /// Returns `CoreError` when the strategy or output target names an unknown value.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(&env_lookup)
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Numeric values that fail to parse fall back to their default with a
    /// warning. Enumerated values fail hard so a typo never silently picks
    /// another backend.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidStrategy` or `CoreError::InvalidOutputTarget`.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let storage = StorageConfig {
            db_path: get("STORYFLOW_DB_PATH").map_or_else(default_db_path, PathBuf::from),
            database_url: get("STORYFLOW_DATABASE_URL"),
            pool_size: parse_with_default(lookup, "STORYFLOW_DB_POOL_SIZE", DEFAULT_DB_POOL_SIZE)
                .max(1),
        };

        let strategy = get("STORYFLOW_STRATEGY")
            .map(|s| s.parse::<StrategyKind>())
            .transpose()?
            .unwrap_or_default();

        let decoding = DecodingParams {
            max_tokens: parse_with_default(lookup, "STORYFLOW_MAX_TOKENS", DEFAULT_MAX_TOKENS),
            temperature: parse_with_default(lookup, "STORYFLOW_TEMPERATURE", DEFAULT_TEMPERATURE),
            top_p: parse_with_default(lookup, "STORYFLOW_TOP_P", DEFAULT_TOP_P),
            frequency_penalty: parse_with_default(
                lookup,
                "STORYFLOW_FREQUENCY_PENALTY",
                DEFAULT_FREQUENCY_PENALTY,
            ),
            presence_penalty: parse_with_default(
                lookup,
                "STORYFLOW_PRESENCE_PENALTY",
                DEFAULT_PRESENCE_PENALTY,
            ),
        };

        let generation = GenerationConfig {
            strategy,
            api_key: get("STORYFLOW_API_KEY").or_else(|| get("OPENAI_API_KEY")),
            api_url: get("STORYFLOW_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned()),
            model: get("STORYFLOW_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            proxy_url: get("STORYFLOW_PROXY_URL"),
            proxy_token: get("STORYFLOW_PROXY_TOKEN"),
            system_prompt: get("STORYFLOW_SYSTEM_PROMPT"),
            decoding,
            http_timeout: Duration::from_secs(parse_with_default(
                lookup,
                "STORYFLOW_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
        };

        let output_target = get("STORYFLOW_OUTPUT_TARGET")
            .map(|s| s.parse::<OutputTarget>())
            .transpose()?
            .unwrap_or_default();

        let pipeline = PipelineConfig {
            default_prompt: get("STORYFLOW_DEFAULT_PROMPT"),
            default_author: get("STORYFLOW_DEFAULT_AUTHOR"),
            output_target,
            batch_size: parse_with_default(lookup, "STORYFLOW_BATCH_SIZE", DEFAULT_BATCH_SIZE)
                .max(1),
            job_timeout: Duration::from_secs(parse_with_default(
                lookup,
                "STORYFLOW_JOB_TIMEOUT_SECS",
                DEFAULT_JOB_TIMEOUT_SECS,
            )),
            visibility_timeout_secs: parse_with_default(
                lookup,
                "STORYFLOW_VISIBILITY_TIMEOUT_SECS",
                DEFAULT_VISIBILITY_TIMEOUT_SECS,
            ),
        };

        let scheduler = SchedulerConfig {
            process_interval: Duration::from_secs(
                parse_with_default(
                    lookup,
                    "STORYFLOW_PROCESS_INTERVAL_SECS",
                    DEFAULT_PROCESS_INTERVAL_SECS,
                )
                .max(1),
            ),
            sweep_interval: Duration::from_secs(
                parse_with_default(lookup, "STORYFLOW_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)
                    .max(1),
            ),
        };

        Ok(Self { storage, generation, pipeline, scheduler })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(&lookup_from(&[])).unwrap();
        assert_eq!(config.generation.strategy, StrategyKind::Structured);
        assert_eq!(config.generation.model, "gpt-4");
        assert_eq!(config.generation.decoding, DecodingParams::default());
        assert_eq!(config.generation.decoding.max_tokens, 2500);
        assert_eq!(config.pipeline.batch_size, 5);
        assert_eq!(config.pipeline.output_target, OutputTarget::Draft);
        assert_eq!(config.scheduler.process_interval, Duration::from_secs(300));
        assert_eq!(config.scheduler.sweep_interval, Duration::from_secs(60));
        assert!(config.storage.db_path.ends_with("storyflow/storyflow.db"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(&lookup_from(&[
            ("STORYFLOW_STRATEGY", "Proxy"),
            ("STORYFLOW_PROXY_URL", "http://proxy.local/generate"),
            ("STORYFLOW_BATCH_SIZE", "12"),
            ("STORYFLOW_OUTPUT_TARGET", "pitch"),
            ("STORYFLOW_DB_PATH", "/tmp/x.db"),
            ("STORYFLOW_TEMPERATURE", "0.9"),
        ]))
        .unwrap();
        assert_eq!(config.generation.strategy, StrategyKind::Proxy);
        assert_eq!(config.generation.proxy_url.as_deref(), Some("http://proxy.local/generate"));
        assert_eq!(config.pipeline.batch_size, 12);
        assert_eq!(config.pipeline.output_target, OutputTarget::Pitch);
        assert_eq!(config.storage.db_path, PathBuf::from("/tmp/x.db"));
        assert!((config.generation.decoding.temperature - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_api_key_fallback() {
        let config = Config::from_lookup(&lookup_from(&[("OPENAI_API_KEY", "sk-fallback")])).unwrap();
        assert_eq!(config.generation.api_key.as_deref(), Some("sk-fallback"));
        let config = Config::from_lookup(&lookup_from(&[
            ("OPENAI_API_KEY", "sk-fallback"),
            ("STORYFLOW_API_KEY", "sk-primary"),
        ]))
        .unwrap();
        assert_eq!(config.generation.api_key.as_deref(), Some("sk-primary"));
    }

    #[test]
    fn test_unknown_strategy_is_error() {
        let err = Config::from_lookup(&lookup_from(&[("STORYFLOW_STRATEGY", "magic")])).unwrap_err();
        assert_eq!(err, CoreError::InvalidStrategy("magic".into()));
    }

    #[test]
    fn test_invalid_number_falls_back() {
        let config =
            Config::from_lookup(&lookup_from(&[("STORYFLOW_BATCH_SIZE", "lots")])).unwrap();
        assert_eq!(config.pipeline.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_debug_masks_secrets() {
        let config = Config::from_lookup(&lookup_from(&[
            ("STORYFLOW_API_KEY", "sk-secret"),
            ("STORYFLOW_PROXY_TOKEN", "tok-secret"),
        ]))
        .unwrap();
        let debug = format!("{:?}", config.generation);
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("tok-secret"));
    }
}

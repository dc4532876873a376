//! Configuration types for the quote service.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file). Parsing goes through a lookup function so tests can supply their
//! own variables without touching the real environment.

use crate::error::{Result, ServiceError};
use crate::scheduler::DailyTime;
use std::time::Duration;
use tracing::debug;

/// Top-level configuration for the quote service.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Text-generation provider settings.
    pub generator: GeneratorConfig,
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Shared-secret header enforcement.
    pub auth: AuthConfig,
    /// Recurring generation settings.
    pub schedule: ScheduleConfig,
}

/// How many variants a pool offers for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variety {
    /// Always use the first entry of the pool.
    #[default]
    Single,
    /// Pick uniformly at random from the whole pool.
    Random,
}

impl std::str::FromStr for Variety {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "fixed" => Ok(Self::Single),
            "random" => Ok(Self::Random),
            other => Err(format!("unknown variety '{other}' (expected single or random)")),
        }
    }
}

/// Text-generation provider configuration.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Bearer credential sent to the provider.
    pub api_key: String,
    /// Full chat-completions URL.
    pub endpoint: String,
    /// Model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Timeout for the whole provider request in seconds.
    pub timeout_secs: u64,
    /// Prompt selection strategy.
    pub prompt_variety: Variety,
    /// Fallback selection strategy.
    pub fallback_variety: Variety,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            max_tokens: 100,
            temperature: 0.8,
            timeout_secs: 30,
            prompt_variety: Variety::Single,
            fallback_variety: Variety::Single,
        }
    }
}

impl GeneratorConfig {
    /// Provider request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port (`0` picks a free port).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 8000,
        }
    }
}

/// API-key enforcement for the HTTP surface.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Whether requests must carry the `X-API-Key` header.
    pub enabled: bool,
    /// Expected header value.
    pub api_key: Option<String>,
}

impl AuthConfig {
    /// The key requests must present, or `None` when auth is off.
    pub fn required_key(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.api_key.as_deref()
    }
}

/// Recurring generation configuration.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Schedule installed at startup.
    pub default: DailyTime,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            default: DailyTime::DEFAULT,
        }
    }
}

impl ServiceConfig {
    /// Build from the process environment, loading `.env` first when present.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if a variable cannot be parsed or the
    /// resulting configuration is invalid.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ServiceError::Config(format!("cannot read .env: {e}"))),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// Unset or blank variables keep their defaults. Values are trimmed,
    /// except `SERVICE_API_KEY`, which is kept verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] naming the offending variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        let generator = &mut config.generator;
        if let Some(v) = get("API_KEY") {
            generator.api_key = v;
        }
        if let Some(v) = get("OPENAI_ENDPOINT") {
            generator.endpoint = v;
        }
        if let Some(v) = get("MODEL") {
            generator.model = v;
        }
        if let Some(v) = get("MAX_TOKENS") {
            generator.max_tokens = parse_var("MAX_TOKENS", &v)?;
        }
        if let Some(v) = get("TEMPERATURE") {
            generator.temperature = parse_var("TEMPERATURE", &v)?;
        }
        if let Some(v) = get("GENERATION_TIMEOUT_SECS") {
            generator.timeout_secs = parse_var("GENERATION_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("PROMPT_VARIETY") {
            generator.prompt_variety = parse_var("PROMPT_VARIETY", &v)?;
        }
        if let Some(v) = get("FALLBACK_VARIETY") {
            generator.fallback_variety = parse_var("FALLBACK_VARIETY", &v)?;
        }

        if let Some(v) = get("HOST") {
            config.server.host = v;
        }
        if let Some(v) = get("PORT") {
            config.server.port = parse_var("PORT", &v)?;
        }

        if let Some(v) = get("REQUIRE_API_KEY") {
            config.auth.enabled = parse_bool("REQUIRE_API_KEY", &v)?;
        }
        // Compared byte-for-byte, so only blank values are dropped.
        config.auth.api_key = lookup("SERVICE_API_KEY").filter(|v| !v.trim().is_empty());

        if let Some(v) = get("DEFAULT_SCHEDULE") {
            config.schedule.default = parse_var("DEFAULT_SCHEDULE", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.auth.enabled && self.auth.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(ServiceError::Config(
                "REQUIRE_API_KEY is set but SERVICE_API_KEY is empty".to_owned(),
            ));
        }
        if self.generator.timeout_secs == 0 {
            return Err(ServiceError::Config(
                "GENERATION_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }
        if self.generator.endpoint.is_empty() {
            return Err(ServiceError::Config("OPENAI_ENDPOINT is empty".to_owned()));
        }
        Ok(())
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| ServiceError::Config(format!("invalid {key} '{raw}': {e}")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ServiceError::Config(format!(
            "invalid {key} '{raw}': expected true or false"
        ))),
    }
}

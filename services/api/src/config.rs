//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Delays that pace a conversation. Tests shrink or fast-forward them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowTimings {
    /// Simulated thinking time before the assistant answers a turn.
    pub reply_latency: Duration,
    /// Simulated round trip of a login or registration.
    pub login_latency: Duration,
    /// Delay between a successful sign-in and leaving the conversation.
    pub exit_delay: Duration,
    /// One character of the typewriter reveal.
    pub reveal_tick: Duration,
    /// One half-period of the blinking cursor.
    pub cursor_blink: Duration,
}

impl Default for FlowTimings {
    fn default() -> Self {
        Self {
            reply_latency: Duration::from_millis(1500),
            login_latency: Duration::from_millis(1000),
            exit_delay: Duration::from_millis(3000),
            reveal_tick: Duration::from_millis(18),
            cursor_blink: Duration::from_millis(500),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: Option<String>,
    pub log_level: Level,
    pub cors_origin: String,
    pub openai_api_key: Option<String>,
    pub chat_model: String,
    pub chat_max_tokens: u32,
    pub chat_max_input_chars: usize,
    pub timings: FlowTimings,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Database Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:8081".to_string());

        // --- Chat Completion Settings ---
        let openai_api_key = lookup("OPENAI_API_KEY");
        let chat_model = lookup("CHAT_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string());
        let chat_max_tokens = parse_or(&lookup, "CHAT_MAX_TOKENS", 500)?;
        let chat_max_input_chars = parse_or(&lookup, "CHAT_MAX_INPUT_CHARS", 1000)?;

        // --- Conversation Pacing ---
        let defaults = FlowTimings::default();
        let timings = FlowTimings {
            reply_latency: millis_or(&lookup, "REPLY_LATENCY_MS", defaults.reply_latency)?,
            login_latency: millis_or(&lookup, "LOGIN_LATENCY_MS", defaults.login_latency)?,
            exit_delay: millis_or(&lookup, "EXIT_DELAY_MS", defaults.exit_delay)?,
            reveal_tick: millis_or(&lookup, "REVEAL_TICK_MS", defaults.reveal_tick)?,
            cursor_blink: millis_or(&lookup, "CURSOR_BLINK_MS", defaults.cursor_blink)?,
        };
        if timings.reveal_tick.is_zero() || timings.cursor_blink.is_zero() {
            return Err(ConfigError::InvalidValue(
                "REVEAL_TICK_MS/CURSOR_BLINK_MS".to_string(),
                "animation intervals must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            openai_api_key,
            chat_model,
            chat_max_tokens,
            chat_max_input_chars,
            timings,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}

fn millis_or<F>(lookup: &F, name: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let ms = parse_or(lookup, name, default.as_millis() as u64)?;
    Ok(Duration::from_millis(ms))
}

use silverline_core::interview::{DEFAULT_ESCALATION_THRESHOLD, MAX_TOTAL};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_GREETING: &str = "Hi, this is Silver-Line. May I ask you a few questions?";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Host name Twilio uses to reach the media stream endpoint.
    pub public_host: String,
    pub openai_api_key: String,
    pub realtime_model: String,
    pub transcription_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub greeting: String,
    pub escalation_threshold: u32,
    pub idle_timeout: Duration,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let public_host = std::env::var("PUBLIC_HOST")
            .or_else(|_| std::env::var("RENDER_EXTERNAL_URL"))
            .map(|host| normalize_host(&host))
            .unwrap_or_else(|_| "localhost".to_string());

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;

        let realtime_model = std::env::var("REALTIME_MODEL")
            .unwrap_or_else(|_| "gpt-4o-realtime-preview-2024-10-01".to_string());
        let transcription_model =
            std::env::var("TRANSCRIPTION_MODEL").unwrap_or_else(|_| "whisper-1".to_string());
        let tts_model = std::env::var("TTS_MODEL").unwrap_or_else(|_| "tts-1".to_string());
        let tts_voice = std::env::var("TTS_VOICE")
            .map(|v| v.to_lowercase())
            .unwrap_or_else(|_| "alloy".to_string());
        let greeting = std::env::var("GREETING").unwrap_or_else(|_| DEFAULT_GREETING.to_string());

        let escalation_threshold = match std::env::var("ESCALATION_THRESHOLD") {
            Ok(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|t| *t <= MAX_TOTAL)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "ESCALATION_THRESHOLD".to_string(),
                        format!("'{}' is not a score between 0 and {}", raw, MAX_TOTAL),
                    )
                })?,
            Err(_) => DEFAULT_ESCALATION_THRESHOLD,
        };

        let idle_timeout_secs = match std::env::var("IDLE_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "IDLE_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", raw),
                )
            })?,
            Err(_) => 300,
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            public_host,
            openai_api_key,
            realtime_model,
            transcription_model,
            tts_model,
            tts_voice,
            greeting,
            escalation_threshold,
            idle_timeout: Duration::from_secs(idle_timeout_secs),
            log_level,
        })
    }

    /// The WebSocket URL handed to Twilio in the `<Stream>` verb.
    pub fn stream_url(&self) -> String {
        format!("wss://{}/stream", self.public_host)
    }
}

/// Strips a scheme and trailing slash so a full URL can be used as a host.
fn normalize_host(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("BIND_ADDRESS");
            env::remove_var("PUBLIC_HOST");
            env::remove_var("RENDER_EXTERNAL_URL");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("REALTIME_MODEL");
            env::remove_var("TRANSCRIPTION_MODEL");
            env::remove_var("TTS_MODEL");
            env::remove_var("TTS_VOICE");
            env::remove_var("GREETING");
            env::remove_var("ESCALATION_THRESHOLD");
            env::remove_var("IDLE_TIMEOUT_SECS");
            env::remove_var("RUST_LOG");
        }
    }

    fn set_minimal_env() {
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("https://silver.onrender.com/"), "silver.onrender.com");
        assert_eq!(normalize_host("example.org"), "example.org");
        assert_eq!(normalize_host(" wss://a.b:8443 "), "a.b:8443");
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal() {
        clear_env_vars();
        set_minimal_env();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.public_host, "localhost");
        assert_eq!(config.openai_api_key, "test-openai-key");
        assert_eq!(config.realtime_model, "gpt-4o-realtime-preview-2024-10-01");
        assert_eq!(config.transcription_model, "whisper-1");
        assert_eq!(config.tts_model, "tts-1");
        assert_eq!(config.tts_voice, "alloy");
        assert_eq!(config.greeting, DEFAULT_GREETING);
        assert_eq!(config.escalation_threshold, 10);
        assert_eq!(config.idle_timeout, Duration::from_secs(300));
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.stream_url(), "wss://localhost/stream");
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            env::set_var("RENDER_EXTERNAL_URL", "https://silver-line.onrender.com");
            env::set_var("OPENAI_API_KEY", "custom-openai-key");
            env::set_var("TRANSCRIPTION_MODEL", "gpt-4o-transcribe");
            env::set_var("TTS_MODEL", "tts-1-hd");
            env::set_var("TTS_VOICE", "Nova");
            env::set_var("GREETING", "Hello there.");
            env::set_var("ESCALATION_THRESHOLD", "15");
            env::set_var("IDLE_TIMEOUT_SECS", "60");
            env::set_var("RUST_LOG", "debug");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.public_host, "silver-line.onrender.com");
        assert_eq!(config.transcription_model, "gpt-4o-transcribe");
        assert_eq!(config.tts_model, "tts-1-hd");
        assert_eq!(config.tts_voice, "nova");
        assert_eq!(config.greeting, "Hello there.");
        assert_eq!(config.escalation_threshold, 15);
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(
            config.stream_url(),
            "wss://silver-line.onrender.com/stream"
        );
    }

    #[test]
    #[serial]
    fn test_public_host_takes_precedence() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("PUBLIC_HOST", "calls.example.org");
            env::set_var("RENDER_EXTERNAL_URL", "https://ignored.onrender.com");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.public_host, "calls.example.org");
    }

    #[test]
    #[serial]
    fn test_config_missing_openai_key() {
        clear_env_vars();

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => assert!(msg.contains("OPENAI_API_KEY")),
            _ => panic!("Expected MissingVar for OPENAI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
            _ => panic!("Expected InvalidValue for BIND_ADDRESS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_threshold_out_of_range() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("ESCALATION_THRESHOLD", "28");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "ESCALATION_THRESHOLD"),
            _ => panic!("Expected InvalidValue for ESCALATION_THRESHOLD"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_idle_timeout() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("IDLE_TIMEOUT_SECS", "0");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "IDLE_TIMEOUT_SECS"),
            _ => panic!("Expected InvalidValue for IDLE_TIMEOUT_SECS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        set_minimal_env();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }
}

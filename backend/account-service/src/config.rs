//! Configuration management for Account Service
//!
//! Loads settings from environment variables, with a `.env` file picked up
//! in debug builds for local development.
//!
//! # Example
//!
//! ```no_run
//! use account_service::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     println!("activation topic: {}", settings.kafka.user_activated_topic);
//!     Ok(())
//! }
//! ```

use crate::models::activation::DEFAULT_ACTIVATION_TTL_SECS;
use crate::security::token::DEFAULT_TOKEN_TTL_SECS;
use anyhow::{Context, Result};
use std::env;
use std::fmt;
use tracing::info;

const REDACTED: &str = "[REDACTED]";

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub kafka: KafkaSettings,
    pub email: EmailSettings,
    pub jwt: JwtSettings,
    pub activation: ActivationSettings,
}

impl Settings {
    pub fn load() -> Result<Self> {
        // Load .env file in development
        if cfg!(debug_assertions) && dotenvy::dotenv().is_ok() {
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            kafka: KafkaSettings::from_env()?,
            email: EmailSettings::from_env()?,
            jwt: JwtSettings::from_env()?,
            activation: ActivationSettings::from_env()?,
        })
    }
}

/// Database connection settings
#[derive(Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("Invalid DATABASE_MIN_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }
}

// The URL embeds credentials
impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &REDACTED)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

/// Kafka event streaming settings
#[derive(Debug, Clone)]
pub struct KafkaSettings {
    /// Empty when no broker is configured; events are then dropped with a warning
    pub brokers: Vec<String>,
    pub user_activated_topic: String,
    /// Milliseconds
    pub producer_timeout_ms: u64,
    pub acks: String,
}

impl KafkaSettings {
    fn from_env() -> Result<Self> {
        let brokers = env::var("KAFKA_BROKERS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            brokers,
            user_activated_topic: env::var("KAFKA_USER_ACTIVATED_TOPIC")
                .unwrap_or_else(|_| "user-activated".to_string()),
            producer_timeout_ms: env::var("KAFKA_PRODUCER_TIMEOUT_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("Invalid KAFKA_PRODUCER_TIMEOUT_MS")?,
            acks: env::var("KAFKA_ACKS").unwrap_or_else(|_| "all".to_string()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        !self.brokers.is_empty()
    }
}

/// Email service configuration
#[derive(Clone)]
pub struct EmailSettings {
    /// Empty host puts the mailer in no-op mode
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub use_starttls: bool,
}

impl EmailSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .context("Invalid SMTP_PORT")?,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "noreply@ceramicraft.dev".to_string()),
            use_starttls: env::var("SMTP_STARTTLS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        })
    }
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSettings")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &self.smtp_password.as_ref().map(|_| REDACTED))
            .field("smtp_from", &self.smtp_from)
            .field("use_starttls", &self.use_starttls)
            .finish()
    }
}

/// JWT authentication settings
#[derive(Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub expiry_seconds: i64,
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        Ok(Self {
            secret,
            expiry_seconds: env::var("JWT_EXPIRY_SECONDS")
                .unwrap_or_else(|_| DEFAULT_TOKEN_TTL_SECS.to_string())
                .parse()
                .context("Invalid JWT_EXPIRY_SECONDS")?,
        })
    }
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &REDACTED)
            .field("expiry_seconds", &self.expiry_seconds)
            .finish()
    }
}

/// Activation code settings
#[derive(Debug, Clone)]
pub struct ActivationSettings {
    pub code_ttl_seconds: i64,
}

impl ActivationSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            code_ttl_seconds: env::var("ACTIVATION_CODE_TTL_SECONDS")
                .unwrap_or_else(|_| DEFAULT_ACTIVATION_TTL_SECS.to_string())
                .parse()
                .context("Invalid ACTIVATION_CODE_TTL_SECONDS")?,
        })
    }
}

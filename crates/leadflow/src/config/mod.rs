use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::notifications::Channel;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the lead pipeline service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub session: SessionConfig,
    pub notifications: NotificationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let secret =
            env::var("SESSION_SECRET").unwrap_or_else(|_| "development-secret".to_string());
        let ttl_minutes = env::var("SESSION_TTL_MINUTES")
            .unwrap_or_else(|_| "720".to_string())
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidSessionTtl)?;
        if ttl_minutes <= 0 {
            return Err(ConfigError::InvalidSessionTtl);
        }

        let notifications = NotificationConfig {
            email_to: env::var("NOTIFY_EMAIL_TO").ok().filter(|v| !v.trim().is_empty()),
            whatsapp_to: env::var("NOTIFY_WHATSAPP_TO")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            provider_key: env::var("NOTIFY_PROVIDER_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            session: SessionConfig {
                secret,
                ttl_minutes,
            },
            notifications,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Signing key and lifetime for operator session tokens.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

/// Outbound notification channels. A channel with no recipient is simply
/// not configured; a missing provider key means delivery attempts are
/// recorded as failed intents while lead capture proceeds.
#[derive(Debug, Clone, Default)]
pub struct NotificationConfig {
    pub email_to: Option<String>,
    pub whatsapp_to: Option<String>,
    pub provider_key: Option<String>,
}

impl NotificationConfig {
    pub fn configured_channels(&self) -> Vec<(Channel, String)> {
        let mut channels = Vec::new();
        if let Some(recipient) = &self.email_to {
            channels.push((Channel::Email, recipient.clone()));
        }
        if let Some(recipient) = &self.whatsapp_to {
            channels.push((Channel::Whatsapp, recipient.clone()));
        }
        channels
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidSessionTtl,
    InvalidHost { source: std::net::AddrParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidSessionTtl => {
                write!(f, "SESSION_TTL_MINUTES must be a positive integer")
            }
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidSessionTtl => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

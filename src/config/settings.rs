//! Application settings loaded from environment variables.

use std::env;

use super::constants::{
    DEFAULT_DATABASE_URL, DEFAULT_ENROLLMENT_FANOUT, DEFAULT_JWT_EXPIRATION_HOURS,
    DEFAULT_OTP_TTL_MINUTES, DEFAULT_REDIS_URL, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
    DEFAULT_SMTP_FROM, DEFAULT_SMTP_PORT, MIN_JWT_SECRET_LENGTH,
};

/// Development JWT secret, only used by debug builds and tests
const DEV_JWT_SECRET: &str = "dev-secret-key-minimum-32-chars!!";

/// SMTP transport settings
#[derive(Clone)]
pub struct SmtpSettings {
    /// Relay host; `None` selects the logging transport
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pass: Option<String>,
    pub from: String,
}

impl SmtpSettings {
    /// Whether a real relay is configured
    pub fn is_configured(&self) -> bool {
        self.host.is_some()
    }

    /// SMTP password, if any.
    pub fn password(&self) -> Option<&str> {
        self.pass.as_deref()
    }
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_SMTP_PORT,
            user: None,
            pass: None,
            from: DEFAULT_SMTP_FROM.to_string(),
        }
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub smtp: SmtpSettings,
    /// Lifetime of an activation code
    pub otp_ttl_minutes: i64,
    /// Concurrent activation emails during bulk enrollment
    pub enrollment_fanout: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("smtp_host", &self.smtp.host)
            .field("smtp_port", &self.smtp.port)
            .field("otp_ttl_minutes", &self.otp_ttl_minutes)
            .field("enrollment_fanout", &self.enrollment_fanout)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if JWT_SECRET is not set or is too short (security requirement).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                // Development mode: use default but warn
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                DEV_JWT_SECRET.to_string()
            } else {
                panic!("JWT_SECRET environment variable must be set in production");
            }
        });

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            panic!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let smtp = SmtpSettings {
            host: env::var("SMTP_HOST").ok().filter(|h| !h.trim().is_empty()),
            port: parse_var("SMTP_PORT").unwrap_or(DEFAULT_SMTP_PORT),
            user: env::var("SMTP_USER").ok(),
            pass: env::var("SMTP_PASS").ok(),
            from: env::var("SMTP_FROM").unwrap_or_else(|_| DEFAULT_SMTP_FROM.to_string()),
        };

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            jwt_secret,
            jwt_expiration_hours: parse_var("JWT_EXPIRATION_HOURS")
                .unwrap_or(DEFAULT_JWT_EXPIRATION_HOURS),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: parse_var("SERVER_PORT").unwrap_or(DEFAULT_SERVER_PORT),
            smtp,
            otp_ttl_minutes: parse_var("OTP_TTL_MINUTES")
                .filter(|m: &i64| *m > 0)
                .unwrap_or(DEFAULT_OTP_TTL_MINUTES),
            enrollment_fanout: parse_var("ENROLLMENT_FANOUT")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(DEFAULT_ENROLLMENT_FANOUT),
        }
    }

    /// Development configuration with defaults and the development JWT secret.
    ///
    /// Used by tests and local tooling; never reads the environment.
    pub fn development(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            smtp: SmtpSettings::default(),
            otp_ttl_minutes: DEFAULT_OTP_TTL_MINUTES,
            enrollment_fanout: DEFAULT_ENROLLMENT_FANOUT,
        }
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

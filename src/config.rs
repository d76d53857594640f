use std::env;
use anyhow::{Context, Result};
use tower_cookies::Key;
use zeroize::Zeroize;

/// Development-only cookie secret. Used when SESSION_SECRET is unset so the
/// server still boots locally; never acceptable in production.
const DEV_SESSION_SECRET: &[u8] = b"gatehouse-insecure-development-cookie-secret";

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The URL of the Redis server.
    pub redis_url: String,
    /// Session lifetime in seconds. Also drives the cookie Max-Age.
    pub session_ttl_secs: u64,
    /// Interval between expiry sweeps of the session store, in seconds.
    pub sweep_interval_secs: u64,
    /// The key that encrypts the session cookie envelope.
    pub cookie_key: Key,
    /// Deployment environment ("development" or "production").
    pub app_env: String,
    /// TCP port to listen on.
    pub port: u16,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        let cookie_key = match env::var("SESSION_SECRET") {
            Ok(mut secret_hex) => {
                let mut secret = hex::decode(&secret_hex)
                    .context("SESSION_SECRET must be valid hexadecimal")?;
                secret_hex.zeroize();

                if secret.len() < 32 {
                    anyhow::bail!(
                        "SESSION_SECRET must be at least 32 bytes (64 hex characters)"
                    );
                }

                let key = Key::derive_from(&secret);
                secret.zeroize();
                key
            }
            Err(_) => {
                tracing::warn!(
                    "SESSION_SECRET not set, falling back to an insecure development key"
                );
                Key::derive_from(DEV_SESSION_SECRET)
            }
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("Invalid SESSION_TTL_SECS")?,
            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("Invalid SWEEP_INTERVAL_SECS")?,
            cookie_key,
            app_env: env::var("APP_ENV")
                .unwrap_or_else(|_| "development".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5500".to_string())
                .parse()
                .context("Invalid PORT")?,
        })
    }

    /// Whether the server runs with production hardening (Secure cookies).
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}

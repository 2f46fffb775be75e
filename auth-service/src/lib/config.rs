use std::env;

use chrono::Duration;
use chrono::Utc;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

/// Token signing configuration.
///
/// Both secrets are required; there is no built-in fallback value.
#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    #[serde(default = "default_access_ttl_minutes")]
    pub access_ttl_minutes: i64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: i64,
}

fn default_access_ttl_minutes() -> i64 {
    auth::TokenSigner::DEFAULT_ACCESS_TTL_MINUTES
}

fn default_refresh_ttl_days() -> i64 {
    auth::TokenSigner::DEFAULT_REFRESH_TTL_DAYS
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

impl JwtConfig {
    pub fn access_ttl(&self) -> Result<Duration, ConfigError> {
        Duration::try_minutes(self.access_ttl_minutes)
            .ok_or_else(|| out_of_range("jwt.access_ttl_minutes", self.access_ttl_minutes))
    }

    pub fn refresh_ttl(&self) -> Result<Duration, ConfigError> {
        Duration::try_days(self.refresh_ttl_days)
            .ok_or_else(|| out_of_range("jwt.refresh_ttl_days", self.refresh_ttl_days))
    }

    /// Reject configurations that would weaken token separation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "jwt.access_secret (JWT_ACCESS_SECRET) must not be empty".to_string(),
            ));
        }
        if self.refresh_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "jwt.refresh_secret (JWT_REFRESH_SECRET) must not be empty".to_string(),
            ));
        }
        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::Message(
                "access and refresh token secrets must differ".to_string(),
            ));
        }
        if self.access_ttl_minutes <= 0 || self.refresh_ttl_days <= 0 {
            return Err(ConfigError::Message(
                "token lifetimes must be positive".to_string(),
            ));
        }

        // Expiry timestamps are computed as now + ttl and must stay representable.
        let now = Utc::now();
        if now.checked_add_signed(self.access_ttl()?).is_none() {
            return Err(out_of_range("jwt.access_ttl_minutes", self.access_ttl_minutes));
        }
        if now.checked_add_signed(self.refresh_ttl()?).is_none() {
            return Err(out_of_range("jwt.refresh_ttl_days", self.refresh_ttl_days));
        }
        Ok(())
    }

    pub fn token_signer(&self) -> Result<auth::TokenSigner, ConfigError> {
        Ok(
            auth::TokenSigner::new(self.access_secret.as_bytes(), self.refresh_secret.as_bytes())
                .with_access_ttl(self.access_ttl()?)
                .with_refresh_ttl(self.refresh_ttl()?),
        )
    }
}

fn out_of_range(key: &str, value: i64) -> ConfigError {
    ConfigError::Message(format!("{} is out of range: {}", key, value))
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Flat variables JWT_ACCESS_SECRET, JWT_REFRESH_SECRET, APP_PORT, DATABASE_URL
    /// 2. Environment variables (DATABASE__URL, JWT__ACCESS_SECRET, etc.)
    /// 3. Environment-specific config file (config/{environment}.toml)
    /// 4. Default config file (config/default.toml)
    ///
    /// Fails when either token secret is missing or unusable.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::default().separator("__"))
            .set_override_option("jwt.access_secret", env::var("JWT_ACCESS_SECRET").ok())?
            .set_override_option("jwt.refresh_secret", env::var("JWT_REFRESH_SECRET").ok())?
            .set_override_option("server.http_port", env::var("APP_PORT").ok())?
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.jwt.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            access_secret: "access-secret-at-least-32-bytes-long".to_string(),
            refresh_secret: "refresh-secret-at-least-32-bytes-long".to_string(),
            access_ttl_minutes: 15,
            refresh_ttl_days: 7,
        }
    }

    #[test]
    fn test_valid_jwt_config() {
        assert!(jwt_config().validate().is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut config = jwt_config();
        config.access_secret = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = jwt_config();
        config.refresh_secret = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shared_secret_rejected() {
        let mut config = jwt_config();
        config.refresh_secret = config.access_secret.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let mut config = jwt_config();
        config.access_ttl_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_ttl_rejected_without_panicking() {
        let mut config = jwt_config();
        config.access_ttl_minutes = i64::MAX;
        assert!(config.access_ttl().is_err());
        assert!(config.validate().is_err());
        assert!(config.token_signer().is_err());

        let mut config = jwt_config();
        config.refresh_ttl_days = i64::MAX / 2;
        assert!(config.validate().is_err());

        // Representable as a Duration, but past the last representable date
        let mut config = jwt_config();
        config.refresh_ttl_days = 100_000_000;
        assert!(config.refresh_ttl().is_ok());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_token_signer_uses_configured_ttls() {
        let mut config = jwt_config();
        config.access_ttl_minutes = 5;
        let signer = config.token_signer().expect("Failed to build signer");
        assert_eq!(signer.ttl(auth::TokenKind::Access), Duration::minutes(5));
        assert_eq!(signer.ttl(auth::TokenKind::Refresh), Duration::days(7));
    }

    #[test]
    fn test_missing_secret_fails_deserialization() {
        let result = ConfigBuilder::builder()
            .set_override("jwt.access_secret", "access-secret-at-least-32-bytes-long")
            .and_then(|builder| builder.build())
            .and_then(|config| config.get::<JwtConfig>("jwt"));

        assert!(result.is_err());
    }

    #[test]
    fn test_ttl_defaults() {
        let jwt: JwtConfig = ConfigBuilder::builder()
            .set_override("jwt.access_secret", "a")
            .and_then(|builder| builder.set_override("jwt.refresh_secret", "b"))
            .and_then(|builder| builder.build())
            .and_then(|config| config.get("jwt"))
            .expect("Failed to build config");

        assert_eq!(jwt.access_ttl().unwrap(), Duration::minutes(15));
        assert_eq!(jwt.refresh_ttl().unwrap(), Duration::days(7));
    }
}

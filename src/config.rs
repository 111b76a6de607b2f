// src/config.rs
//! Application configuration.
//!
//! Built-in defaults, overlaid by the matching section of an optional
//! `config.yaml`, overlaid by environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Longest session a token may be issued for
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 3600);

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub client_url: String,
    pub jwt: JwtConfig,
    pub linkedin: LinkedInConfig,
    pub gemini: GeminiConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    /// humantime duration, e.g. `7d` or `12h`
    pub expires_in: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinkedInConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub analyses_per_hour: u32,
    /// Requests each client may make to `/api` per window
    pub api_requests_per_window: u32,
    pub api_window_minutes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 5000,
            database_path: PathBuf::from("data/flowbase.db"),
            client_url: "http://localhost:5173".to_string(),
            jwt: JwtConfig::default(),
            linkedin: LinkedInConfig::default(),
            gemini: GeminiConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            expires_in: "7d".to_string(),
        }
    }
}

impl Default for LinkedInConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://localhost:5000/api/auth/linkedin/callback".to_string(),
            scopes: vec![
                "openid".to_string(),
                "profile".to_string(),
                "email".to_string(),
            ],
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-1.5-flash".to_string(),
            api_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_seconds: 60,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            analyses_per_hour: 10,
            api_requests_per_window: 100,
            api_window_minutes: 15,
        }
    }
}

impl JwtConfig {
    pub fn expiry(&self) -> Result<Duration> {
        let ttl = humantime::parse_duration(self.expires_in.trim())
            .with_context(|| format!("Invalid JWT_EXPIRES_IN value: {}", self.expires_in))?;

        if ttl > MAX_TOKEN_TTL {
            anyhow::bail!(
                "JWT_EXPIRES_IN must not exceed {}, got {}",
                humantime::format_duration(MAX_TOKEN_TTL),
                self.expires_in
            );
        }

        Ok(ttl)
    }
}

impl AppConfig {
    /// Environment name from `FLOWBASE_ENV` or `NODE_ENV`, read before logging starts
    pub fn environment_from_env() -> String {
        Self::environment_name(&|key: &str| std::env::var(key).ok())
    }

    /// Load configuration for the current process environment
    pub fn load() -> Result<Self> {
        let lookup = |key: &str| std::env::var(key).ok();
        let environment = Self::environment_name(&lookup);

        let mut config = match Self::config_file(&lookup) {
            Some(path) => Self::from_file(&path, &environment)?,
            None => Self::default(),
        };
        config.environment = environment;
        config.apply_env(&lookup)?;

        Ok(config)
    }

    fn environment_name(lookup: &impl Fn(&str) -> Option<String>) -> String {
        lookup("FLOWBASE_ENV")
            .or_else(|| lookup("NODE_ENV"))
            .unwrap_or_else(|| "development".to_string())
    }

    fn config_file(lookup: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
        match lookup("FLOWBASE_CONFIG") {
            Some(path) => Some(PathBuf::from(path)),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            }
        }
    }

    /// Read the section named after `environment` from a YAML file keyed by
    /// environment name.
    pub fn from_file(path: &Path, environment: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content, environment)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml(content: &str, environment: &str) -> Result<Self> {
        let mut sections: HashMap<String, AppConfig> = serde_yaml::from_str(content)?;

        match sections.remove(environment) {
            Some(config) => Ok(config),
            None => {
                warn!(
                    "No '{}' section in configuration file, using defaults",
                    environment
                );
                Ok(Self::default())
            }
        }
    }

    /// Overlay values taken from environment variables
    pub fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = lookup("PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got {}", port))?;
        }

        let strings: [(&str, &mut String); 9] = [
            ("CLIENT_URL", &mut self.client_url),
            ("JWT_SECRET", &mut self.jwt.secret),
            ("JWT_EXPIRES_IN", &mut self.jwt.expires_in),
            ("LINKEDIN_CLIENT_ID", &mut self.linkedin.client_id),
            ("LINKEDIN_CLIENT_SECRET", &mut self.linkedin.client_secret),
            ("LINKEDIN_REDIRECT_URI", &mut self.linkedin.redirect_uri),
            ("GEMINI_API_KEY", &mut self.gemini.api_key),
            ("GEMINI_MODEL", &mut self.gemini.model),
            ("GEMINI_API_URL", &mut self.gemini.api_url),
        ];
        for (key, slot) in strings {
            if let Some(value) = lookup(key) {
                *slot = value;
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }

        if let Some(limit) = lookup("ANALYSES_PER_HOUR") {
            self.rate_limit.analyses_per_hour = limit
                .parse()
                .with_context(|| format!("ANALYSES_PER_HOUR must be a number, got {}", limit))?;
        }

        if let Some(limit) = lookup("API_REQUESTS_PER_WINDOW") {
            self.rate_limit.api_requests_per_window = limit.parse().with_context(|| {
                format!("API_REQUESTS_PER_WINDOW must be a number, got {}", limit)
            })?;
        }

        if let Some(minutes) = lookup("API_WINDOW_MINUTES") {
            self.rate_limit.api_window_minutes = minutes
                .parse()
                .with_context(|| format!("API_WINDOW_MINUTES must be a number, got {}", minutes))?;
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Required settings that are still empty
    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            ("JWT_SECRET", &self.jwt.secret),
            ("LINKEDIN_CLIENT_ID", &self.linkedin.client_id),
            ("LINKEDIN_CLIENT_SECRET", &self.linkedin.client_secret),
            ("GEMINI_API_KEY", &self.gemini.api_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect()
    }

    pub fn validate(&self) -> Result<()> {
        self.jwt.expiry()?;

        for key in self.missing_required() {
            warn!("Missing configuration value: {}", key);
        }

        if self.is_production() && self.jwt.secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must be set in production");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.linkedin.scopes, vec!["openid", "profile", "email"]);
        assert_eq!(config.jwt.expiry().unwrap(), Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.rate_limit.analyses_per_hour, 10);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(&env(&[
                ("PORT", "8080"),
                ("JWT_SECRET", "s3cret"),
                ("JWT_EXPIRES_IN", "12h"),
                ("CLIENT_URL", "https://app.example.com"),
                ("DATABASE_PATH", "/tmp/flowbase.db"),
            ]))
            .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt.secret, "s3cret");
        assert_eq!(config.jwt.expiry().unwrap(), Duration::from_secs(12 * 3600));
        assert_eq!(config.client_url, "https://app.example.com");
        assert_eq!(config.database_path, PathBuf::from("/tmp/flowbase.db"));
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(&env(&[("PORT", "http")])).is_err());
    }

    #[test]
    fn test_environment_name_fallbacks() {
        assert_eq!(AppConfig::environment_name(&env(&[])), "development");
        assert_eq!(
            AppConfig::environment_name(&env(&[("NODE_ENV", "production")])),
            "production"
        );
        assert_eq!(
            AppConfig::environment_name(&env(&[("FLOWBASE_ENV", "test"), ("NODE_ENV", "production")])),
            "test"
        );
    }

    #[test]
    fn test_yaml_sections() {
        let yaml = r#"
development:
  port: 4000
  jwt:
    secret: dev-secret
production:
  port: 80
  client_url: https://flowbase.app
  gemini:
    model: gemini-1.5-pro
"#;
        let dev = AppConfig::from_yaml(yaml, "development").unwrap();
        assert_eq!(dev.port, 4000);
        assert_eq!(dev.jwt.secret, "dev-secret");
        assert_eq!(dev.jwt.expires_in, "7d");

        let prod = AppConfig::from_yaml(yaml, "production").unwrap();
        assert_eq!(prod.client_url, "https://flowbase.app");
        assert_eq!(prod.gemini.model, "gemini-1.5-pro");
        assert_eq!(prod.gemini.api_url, "https://generativelanguage.googleapis.com");

        let staging = AppConfig::from_yaml(yaml, "staging").unwrap();
        assert_eq!(staging.port, 5000);
    }

    #[test]
    fn test_missing_required() {
        let mut config = AppConfig::default();
        assert_eq!(config.missing_required().len(), 4);

        config.jwt.secret = "x".into();
        config.gemini.api_key = "y".into();
        assert_eq!(
            config.missing_required(),
            vec!["LINKEDIN_CLIENT_ID", "LINKEDIN_CLIENT_SECRET"]
        );
    }

    #[test]
    fn test_production_requires_jwt_secret() {
        let mut config = AppConfig::default();
        config.environment = "production".into();
        assert!(config.validate().is_err());

        config.jwt.secret = "prod".into();
        assert!(config.validate().is_ok());

        config.jwt.expires_in = "soon".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expiry_is_capped() {
        let mut jwt = JwtConfig::default();
        jwt.expires_in = "365d".into();
        assert_eq!(jwt.expiry().unwrap(), MAX_TOKEN_TTL);

        jwt.expires_in = "1000000years".into();
        let err = jwt.expiry().unwrap_err();
        assert!(err.to_string().contains("must not exceed"));
    }

    #[test]
    fn test_api_rate_limit_overrides() {
        let mut config = AppConfig::default();
        assert_eq!(config.rate_limit.api_requests_per_window, 100);
        assert_eq!(config.rate_limit.api_window_minutes, 15);

        config
            .apply_env(&env(&[("API_REQUESTS_PER_WINDOW", "20"), ("API_WINDOW_MINUTES", "5")]))
            .unwrap();
        assert_eq!(config.rate_limit.api_requests_per_window, 20);
        assert_eq!(config.rate_limit.api_window_minutes, 5);

        assert!(config
            .apply_env(&env(&[("API_WINDOW_MINUTES", "soon")]))
            .is_err());
    }
}

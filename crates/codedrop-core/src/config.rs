//! Configuration module
//!
//! Settings for the HTTP server, the code store and the content area. Values come
//! from the process environment (optionally seeded from a `.env` file).

use std::env;
use std::path::PathBuf;

// Common constants
const DEFAULT_PORT: u16 = 3000;
const CODE_TTL_SECS: u64 = 600;
const SWEEP_INTERVAL_SECS: u64 = 60;
const MAX_UPLOAD_SIZE_MB: u64 = 2048;
const MAX_FILES_PER_UPLOAD: usize = 20;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Server settings independent of the transfer domain
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub http_concurrency_limit: usize,
    /// `pretty` or `json`
    pub log_format: String,
}

/// Code store and content area configuration
#[derive(Clone, Debug)]
pub struct TransferConfig {
    pub base: BaseConfig,
    /// Lifetime of a code entry from the moment it is issued
    pub code_ttl_secs: u64,
    /// Period of the background sweep
    pub sweep_interval_secs: u64,
    /// Total bytes accepted in one upload request, across all files
    pub max_upload_size_bytes: u64,
    pub max_files_per_upload: usize,
    /// Root of the content area
    pub content_dir: PathBuf,
    /// Wipe files left behind by a previous process before serving
    pub purge_content_on_startup: bool,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<TransferConfig>);

impl Config {
    fn as_transfer(&self) -> &TransferConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_transfer().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = TransferConfig::from_source(lookup)?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_transfer().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.as_transfer().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_transfer().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_transfer().base.environment
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_transfer().base.http_concurrency_limit
    }

    pub fn log_format(&self) -> &str {
        &self.as_transfer().base.log_format
    }

    pub fn code_ttl_secs(&self) -> u64 {
        self.as_transfer().code_ttl_secs
    }

    pub fn sweep_interval_secs(&self) -> u64 {
        self.as_transfer().sweep_interval_secs
    }

    pub fn max_upload_size_bytes(&self) -> u64 {
        self.as_transfer().max_upload_size_bytes
    }

    pub fn max_files_per_upload(&self) -> usize {
        self.as_transfer().max_files_per_upload
    }

    pub fn content_dir(&self) -> &PathBuf {
        &self.as_transfer().content_dir
    }

    pub fn purge_content_on_startup(&self) -> bool {
        self.as_transfer().purge_content_on_startup
    }
}

fn is_production_env(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    value
        .map(|s| s.trim().to_lowercase())
        .and_then(|s| match s.as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

impl TransferConfig {
    pub fn from_source<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: lookup("PORT")
                .unwrap_or_else(|| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            http_concurrency_limit: lookup("HTTP_CONCURRENCY_LIMIT")
                .unwrap_or_else(|| HTTP_CONCURRENCY_LIMIT.to_string())
                .parse()
                .unwrap_or(HTTP_CONCURRENCY_LIMIT),
            log_format: lookup("LOG_FORMAT").unwrap_or_else(|| "pretty".to_string()),
        };

        let max_upload_size_mb = lookup("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let content_dir = lookup("CONTENT_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("codedrop"));

        let config = TransferConfig {
            base,
            code_ttl_secs: lookup("CODE_TTL_SECS")
                .unwrap_or_else(|| CODE_TTL_SECS.to_string())
                .parse()
                .unwrap_or(CODE_TTL_SECS),
            sweep_interval_secs: lookup("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|| SWEEP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(SWEEP_INTERVAL_SECS),
            max_upload_size_bytes: max_upload_size_mb.saturating_mul(1024 * 1024),
            max_files_per_upload: lookup("MAX_FILES_PER_UPLOAD")
                .unwrap_or_else(|| MAX_FILES_PER_UPLOAD.to_string())
                .parse()
                .unwrap_or(MAX_FILES_PER_UPLOAD),
            content_dir,
            purge_content_on_startup: parse_bool(lookup("PURGE_CONTENT_ON_STARTUP"), true),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.code_ttl_secs == 0 {
            return Err(anyhow::anyhow!("CODE_TTL_SECS must be greater than zero"));
        }

        if self.sweep_interval_secs == 0 {
            return Err(anyhow::anyhow!(
                "SWEEP_INTERVAL_SECS must be greater than zero"
            ));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_UPLOAD_SIZE_MB must be greater than zero"
            ));
        }

        if self.max_files_per_upload == 0 {
            return Err(anyhow::anyhow!(
                "MAX_FILES_PER_UPLOAD must be greater than zero"
            ));
        }

        if self.base.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!(
                "HTTP_CONCURRENCY_LIMIT must be greater than zero"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_port(), 3000);
        assert_eq!(config.code_ttl_secs(), 600);
        assert_eq!(config.sweep_interval_secs(), 60);
        assert_eq!(config.max_upload_size_bytes(), 2048 * 1024 * 1024);
        assert_eq!(config.max_files_per_upload(), 20);
        assert_eq!(config.http_concurrency_limit(), 10_000);
        assert!(config.purge_content_on_startup());
        assert!(config.content_dir().ends_with("codedrop"));
        assert_eq!(config.cors_origins(), ["*".to_string()]);
        assert_eq!(config.log_format(), "pretty");
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("CODE_TTL_SECS", "30"),
            ("SWEEP_INTERVAL_SECS", "5"),
            ("MAX_UPLOAD_SIZE_MB", "1"),
            ("MAX_FILES_PER_UPLOAD", "3"),
            ("CONTENT_DIR", "/srv/codedrop"),
            ("PURGE_CONTENT_ON_STARTUP", "false"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
        ])
        .unwrap();
        assert_eq!(config.server_port(), 8080);
        assert_eq!(config.code_ttl_secs(), 30);
        assert_eq!(config.sweep_interval_secs(), 5);
        assert_eq!(config.max_upload_size_bytes(), 1024 * 1024);
        assert_eq!(config.max_files_per_upload(), 3);
        assert_eq!(config.content_dir(), &PathBuf::from("/srv/codedrop"));
        assert!(!config.purge_content_on_startup());
        assert_eq!(
            config.cors_origins(),
            ["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        let err = config_from(&[("CODE_TTL_SECS", "0")]).unwrap_err();
        assert!(err.to_string().contains("CODE_TTL_SECS"));
    }

    #[test]
    fn test_zero_sweep_interval_is_rejected() {
        assert!(config_from(&[("SWEEP_INTERVAL_SECS", "0")]).is_err());
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        assert!(config_from(&[("MAX_UPLOAD_SIZE_MB", "0")]).is_err());
        assert!(config_from(&[("MAX_FILES_PER_UPLOAD", "0")]).is_err());
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        assert!(config_from(&[("ENVIRONMENT", "production")]).is_err());

        let config = config_from(&[
            ("APP_ENV", "prod"),
            ("CORS_ORIGINS", "https://drop.example"),
        ])
        .unwrap();
        assert!(config.is_production());
    }
}

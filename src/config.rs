//! Environment-driven configuration
//!
//! All settings come from environment variables (loaded through dotenvy in
//! main). Remote-store and OCR credentials are required; everything else has
//! a default.

use thiserror::Error;

/// Default bucket name, matching the original deployment convention
const DEFAULT_BUCKET: &str = "libraries";
/// Default OCR endpoint
const DEFAULT_OCR_ENDPOINT: &str = "https://api.ocr.space/parse/image";
/// Cache validity window in seconds
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
}

/// Full application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub ocr: OcrConfig,
    pub cache: CacheConfig,
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Remote object store settings (S3-compatible)
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Custom endpoint URL for S3-compatible services (MinIO, Supabase, B2)
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}

/// Text-extraction service settings
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub endpoint: String,
    pub api_key: String,
    /// Language hint passed with every request
    pub language: String,
}

/// Library cache settings
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Validity window for cached remote state, in seconds
    pub ttl_secs: u64,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Credentials have no fallback: a missing S3 key or OCR API key refuses
    /// startup rather than deferring the failure to the first remote call.
    pub fn from_env() -> Result<Self, ConfigError> {
        let server = ServerConfig {
            host: env_or("HOST", "0.0.0.0"),
            port: parse_env("PORT", 3000)?,
        };

        let storage = StorageConfig {
            endpoint: std::env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),
            region: env_or("S3_REGION", "us-east-1"),
            bucket: env_or("S3_BUCKET", DEFAULT_BUCKET),
            access_key: required("S3_ACCESS_KEY_ID")?,
            secret_key: required("S3_SECRET_ACCESS_KEY")?,
        };

        let ocr = OcrConfig {
            endpoint: env_or("OCR_ENDPOINT", DEFAULT_OCR_ENDPOINT),
            api_key: required("OCR_API_KEY")?,
            language: env_or("OCR_LANGUAGE", "eng"),
        };

        let cache = CacheConfig {
            ttl_secs: parse_env("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?,
        };

        Ok(Self {
            server,
            storage,
            ocr,
            cache,
        })
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(var))
}

fn parse_env<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => {
            value.parse().map_err(|_| ConfigError::InvalidVar { var, value })
        }
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_fall_back_to_defaults() {
        assert_eq!(env_or("LIBRARIUM_UNSET_VAR", "fallback"), "fallback");
        assert!(required("LIBRARIUM_UNSET_VAR").is_err());
        assert_eq!(parse_env::<u64>("LIBRARIUM_UNSET_VAR", 300).unwrap(), 300);
    }

    // Environment mutation is process-wide, so the missing-credential and
    // fully-configured paths run in one sequential test.
    #[test]
    fn absent_credentials_refuse_configuration() {
        let credentials = [
            ("S3_ACCESS_KEY_ID", "minio-access"),
            ("S3_SECRET_ACCESS_KEY", "minio-secret"),
            ("OCR_API_KEY", "ocr-key"),
        ];
        for (var, _) in &credentials {
            std::env::remove_var(var);
        }

        // Each credential in turn is the one that halts configuration
        for missing in 0..credentials.len() {
            for (i, (var, value)) in credentials.iter().enumerate() {
                if i == missing {
                    std::env::remove_var(var);
                } else {
                    std::env::set_var(var, value);
                }
            }
            let err = Config::from_env().unwrap_err();
            assert!(
                matches!(err, ConfigError::MissingVar(var) if var == credentials[missing].0),
                "expected {} to be reported missing",
                credentials[missing].0
            );
        }

        // With all credentials present, defaults fill the rest
        for (var, value) in &credentials {
            std::env::set_var(var, value);
        }
        let config = Config::from_env().unwrap();
        assert_eq!(config.storage.bucket, "libraries");
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.cache.ttl_secs, 300);

        for (var, _) in &credentials {
            std::env::remove_var(var);
        }
    }
}

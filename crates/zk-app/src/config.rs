use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;
use zk_core::request::UploadPolicy;
use zk_core::session::DEFAULT_MAX_TEXT_CHARS;
use zk_core::validator::{AcceptPattern, ValidatorConfig, DEFAULT_ACCEPT, MIB};

use crate::error::AppError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_EXPECTED_SECS: u64 = 45;

/// Bearer credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout: Option<Duration>,
    pub upload_policy: UploadPolicy,
}

#[derive(Debug, Clone, Default)]
pub struct TextToImageConfig {
    pub url: Option<String>,
    pub api_key: Option<ApiKey>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub validator: ValidatorConfig,
    pub max_text_chars: usize,
    /// Typical backend turnaround; drives the advisory progress estimate
    pub expected_generation: Duration,
    pub text_to_image: TextToImageConfig,
}

impl AppConfig {
    /// Read `.env` (if present) and then the process environment
    pub fn load() -> anyhow::Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }

        Ok(Self::from_lookup(|key| env::var(key).ok())?)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let base_url = lookup("ZK_BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let request_timeout = parse_opt::<u64>(&lookup, "ZK_REQUEST_TIMEOUT_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let upload_policy = parse_opt::<UploadPolicy>(&lookup, "ZK_UPLOAD_POLICY")?.unwrap_or_default();

        let max_file_size_mb = parse_opt::<u64>(&lookup, "ZK_MAX_FILE_SIZE_MB")?.unwrap_or(10);
        let max_file_size_bytes = max_file_size_mb.checked_mul(MIB).ok_or_else(|| {
            AppError::Config(format!("ZK_MAX_FILE_SIZE_MB={max_file_size_mb}: too large"))
        })?;
        let max_file_count = parse_opt::<usize>(&lookup, "ZK_MAX_FILES")?.unwrap_or(5);
        let accepted_types = AcceptPattern::parse(
            &lookup("ZK_ACCEPT").unwrap_or_else(|| DEFAULT_ACCEPT.to_string()),
        );

        let max_text_chars =
            parse_opt::<usize>(&lookup, "ZK_MAX_TEXT_CHARS")?.unwrap_or(DEFAULT_MAX_TEXT_CHARS);

        let expected_secs =
            parse_opt::<u64>(&lookup, "ZK_EXPECTED_SECS")?.unwrap_or(DEFAULT_EXPECTED_SECS);

        Ok(Self {
            backend: BackendConfig {
                base_url,
                request_timeout,
                upload_policy,
            },
            validator: ValidatorConfig {
                max_file_size_bytes,
                max_file_count,
                accepted_types,
            },
            max_text_chars,
            expected_generation: Duration::from_secs(expected_secs.max(1)),
            text_to_image: TextToImageConfig {
                url: lookup("TEXT_TO_IMAGE_URL").filter(|url| !url.trim().is_empty()),
                api_key: lookup("TEXT_TO_IMAGE_API_KEY")
                    .filter(|key| !key.trim().is_empty())
                    .map(ApiKey::new),
            },
        })
    }
}

fn parse_opt<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AppError::Config(format!("{key}={raw}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.backend.request_timeout, None);
        assert_eq!(config.backend.upload_policy, UploadPolicy::FirstOnly);
        assert_eq!(config.validator, ValidatorConfig::default());
        assert_eq!(config.max_text_chars, 1000);
        assert_eq!(config.expected_generation, Duration::from_secs(45));
        assert!(config.text_to_image.api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ZK_BACKEND_URL", "http://gpu-box:9000"),
            ("ZK_REQUEST_TIMEOUT_SECS", "120"),
            ("ZK_UPLOAD_POLICY", "all"),
            ("ZK_MAX_FILE_SIZE_MB", "2"),
            ("ZK_MAX_FILES", "1"),
            ("ZK_ACCEPT", "image/png,image/jpeg"),
            ("ZK_MAX_TEXT_CHARS", "200"),
            ("TEXT_TO_IMAGE_URL", "https://imagine.example/api"),
            ("TEXT_TO_IMAGE_API_KEY", "secret-token"),
        ]))
        .unwrap();

        assert_eq!(config.backend.base_url, "http://gpu-box:9000");
        assert_eq!(config.backend.request_timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.backend.upload_policy, UploadPolicy::All);
        assert_eq!(config.validator.max_file_size_bytes, 2 * MIB);
        assert_eq!(config.validator.max_file_count, 1);
        assert_eq!(config.max_text_chars, 200);
        assert!(config.validator.accepted_types.matches("image/jpeg", "a.jpg"));
        assert!(!config.validator.accepted_types.matches("image/gif", "a.gif"));
        assert_eq!(config.text_to_image.api_key.as_ref().unwrap().expose(), "secret-token");
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = AppConfig::from_lookup(lookup(&[("ZK_MAX_FILES", "five")])).unwrap_err();
        assert!(matches!(err, AppError::Config(ref msg) if msg.starts_with("ZK_MAX_FILES=five")));
    }

    #[test]
    fn test_oversized_file_limit_is_config_error() {
        let err = AppConfig::from_lookup(lookup(&[("ZK_MAX_FILE_SIZE_MB", "18446744073709551615")])).unwrap_err();
        assert!(
            matches!(err, AppError::Config(ref msg) if msg == "ZK_MAX_FILE_SIZE_MB=18446744073709551615: too large")
        );

        let config = AppConfig::from_lookup(lookup(&[("ZK_MAX_FILE_SIZE_MB", "1024")])).unwrap();
        assert_eq!(config.validator.max_file_size_bytes, 1024 * MIB);
    }

    #[test]
    fn test_api_key_is_redacted() {
        let config = AppConfig::from_lookup(lookup(&[("TEXT_TO_IMAGE_API_KEY", "test-secret-token")])).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("test-secret-token"));
        assert!(debug.contains("ApiKey(***)"));
    }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::modules::auth::otp::OtpLimits;
use crate::modules::auth::validation::{OtpFormat, PasswordPolicy};
use crate::{DEFAULT_OTP_ATTEMPTS, OTP_COOLDOWN_SECONDS};

pub const ENV_CONFIG_FILE: &str = "PORTAL_CONFIG";
pub const ENV_BASE_URL: &str = "PORTAL_BASE_URL";
pub const ENV_CHAT_URL: &str = "PORTAL_CHAT_URL";
pub const ENV_TIMEOUT_MS: &str = "PORTAL_TIMEOUT_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Remote endpoints and client-side policies for the portal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PortalConfig {
    pub base_url: String,
    pub login_path: String,
    pub send_otp_path: String,
    pub reset_password_path: String,
    pub forgot_username_path: String,
    pub face_login_path: String,
    pub chat_url: String,
    pub timeout_ms: u64,
    pub otp_attempts: u32,
    pub otp_cooldown_secs: u32,
    pub otp_format: OtpFormat,
    pub reset_password_policy: PasswordPolicy,
    pub login_password_policy: PasswordPolicy,
    pub redirect_url: Option<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://100014.pythonanywhere.com".to_string(),
            login_path: "/api/mobilelogin/".to_string(),
            send_otp_path: "/api/emailotp/".to_string(),
            reset_password_path: "/api/forgot_password/".to_string(),
            forgot_username_path: "/api/forgot_username/".to_string(),
            face_login_path: "/api/face_login/".to_string(),
            chat_url: "https://100096.pythonanywhere.com/chat/login/".to_string(),
            timeout_ms: 5000,
            otp_attempts: DEFAULT_OTP_ATTEMPTS,
            otp_cooldown_secs: OTP_COOLDOWN_SECONDS,
            otp_format: OtpFormat::Numeric,
            reset_password_policy: PasswordPolicy::Standard,
            login_password_policy: PasswordPolicy::WithSymbol,
            redirect_url: None,
        }
    }
}

impl PortalConfig {
    /// Load from an optional JSON file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(chat_url) = lookup(ENV_CHAT_URL) {
            self.chat_url = chat_url;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_TIMEOUT_MS.to_string(),
                value: timeout.clone(),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.base_url)?;
        Url::parse(&self.chat_url)?;
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_ms".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve an endpoint path against the base url
    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        Ok(Url::parse(&self.base_url)?.join(path)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn otp_limits(&self) -> OtpLimits {
        OtpLimits {
            max_attempts: self.otp_attempts,
            cooldown_secs: self.otp_cooldown_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = PortalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.otp_limits().max_attempts, 5);
        assert_eq!(config.otp_limits().cooldown_secs, 60);
    }

    #[test]
    fn test_endpoint_joins_base() {
        let config = PortalConfig::default();
        let url = config.endpoint(&config.login_path).unwrap();
        assert_eq!(
            url.as_str(),
            "https://100014.pythonanywhere.com/api/mobilelogin/"
        );
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "base_url": "http://127.0.0.1:9000", "otp_format": "any" }}"#
        )
        .unwrap();

        let config = PortalConfig::from_file(file.path()).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.otp_format, OtpFormat::Any);
        assert_eq!(config.login_path, "/api/mobilelogin/");
        assert_eq!(config.timeout_ms, 5000);
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            PortalConfig::from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_BASE_URL, "http://localhost:8080"),
            (ENV_TIMEOUT_MS, "1500"),
        ]
        .into_iter()
        .collect();

        let mut config = PortalConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_ms, 1500);
        assert_eq!(config.chat_url, PortalConfig::default().chat_url);
    }

    #[test]
    fn test_bad_timeout_override() {
        let mut config = PortalConfig::default();
        let result = config.apply_overrides(|key| {
            (key == ENV_TIMEOUT_MS).then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_invalid_base_url() {
        let config = PortalConfig {
            base_url: "not a url".to_string(),
            ..PortalConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));
    }
}

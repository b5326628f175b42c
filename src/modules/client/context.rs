use chrono::Local;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::modules::utils::time::{local_time_string, local_timezone};
use crate::SESSION_TOKEN_LEN;

/// Device and session details attached to login and upload requests.
/// The portal forwards these verbatim and never interprets them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientContext {
    pub time: String,
    pub ip: String,
    pub os: String,
    pub device: String,
    pub location: String,
    pub timezone: String,
    pub language: String,
    pub browser: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mainparams: Option<String>,
    #[serde(rename = "randomSession")]
    pub random_session: String,
    #[serde(rename = "redirectUrl", skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl ClientContext {
    /// Gather what the local host can tell us
    pub fn collect(redirect_url: Option<String>) -> Self {
        let now = Local::now();
        Self {
            time: local_time_string(now),
            ip: String::new(),
            os: std::env::consts::OS.to_string(),
            device: "Computer".to_string(),
            location: std::env::var("PORTAL_LOCATION").unwrap_or_default(),
            timezone: local_timezone(now),
            language: detect_language(std::env::var("LANG").ok()),
            browser: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            mainparams: None,
            random_session: random_session_token(),
            redirect_url,
        }
    }

    /// Flatten into name/value pairs for multipart forms
    pub fn form_fields(&self) -> Vec<(String, String)> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map
                .into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (key, value)
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Turn a POSIX locale such as `en_US.UTF-8` into `en-US`
fn detect_language(lang: Option<String>) -> String {
    lang.as_deref()
        .and_then(|l| l.split('.').next())
        .filter(|l| !l.is_empty() && *l != "C" && *l != "POSIX")
        .map(|l| l.replace('_', "-"))
        .unwrap_or_else(|| "en-US".to_string())
}

/// Random correlation token for one portal session
pub fn random_session_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

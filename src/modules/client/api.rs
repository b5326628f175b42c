use async_trait::async_trait;
use log::debug;
use reqwest::{multipart::Form, Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use url::Url;

use super::context::ClientContext;
use super::error::PortalError;
use crate::modules::config::PortalConfig;

pub const OTP_SENT: &str = "OTP sent";
pub const PASSWORD_CHANGED: &str = "Password changed successfully";
pub const FACE_LOGIN_ACCEPTED: &str = "Face login successful";

/// Why an OTP is being requested; sent as `usage`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    ForgotPassword,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendOtpRequest {
    pub username: String,
    pub email: String,
    pub usage: OtpPurpose,
}

#[derive(Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub username: String,
    pub email: String,
    pub otp: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl fmt::Debug for ResetPasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetPasswordRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Body for the username-recovery endpoint; without `otp` it asks for one
#[derive(Debug, Clone, Serialize)]
pub struct UsernameOtpRequest {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(flatten)]
    pub context: ClientContext,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// An authenticated portal session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: String,
    pub profile: Value,
}

/// Calls behind the credential recovery journeys
#[async_trait]
pub trait RecoveryService: Send + Sync {
    async fn send_otp(&self, request: &SendOtpRequest) -> Result<String, PortalError>;

    async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<String, PortalError>;

    async fn send_username_otp(&self, request: &UsernameOtpRequest) -> Result<String, PortalError>;

    async fn recover_username(&self, request: &UsernameOtpRequest)
        -> Result<Vec<String>, PortalError>;
}

#[async_trait]
pub trait LoginService: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<Session, PortalError>;
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    info: Value,
}

#[derive(Debug, Clone)]
struct Endpoints {
    login: Url,
    send_otp: Url,
    reset_password: Url,
    forgot_username: Url,
    face_login: Url,
}

/// HTTP client for the portal's remote services
#[derive(Debug, Clone)]
pub struct PortalClient {
    http: Client,
    endpoints: Endpoints,
}

impl PortalClient {
    pub fn new(config: &PortalConfig) -> Result<Self, PortalError> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        let endpoints = Endpoints {
            login: config.endpoint(&config.login_path)?,
            send_otp: config.endpoint(&config.send_otp_path)?,
            reset_password: config.endpoint(&config.reset_password_path)?,
            forgot_username: config.endpoint(&config.forgot_username_path)?,
            face_login: config.endpoint(&config.face_login_path)?,
        };
        Ok(Self { http, endpoints })
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &Url,
        body: &T,
    ) -> Result<Value, PortalError> {
        debug!("POST {}", url);
        let response = self.http.post(url.clone()).json(body).send().await?;
        read_envelope(response).await
    }

    /// Post a multipart form to the face-login endpoint
    pub async fn post_face_form(&self, form: Form) -> Result<String, PortalError> {
        let url = &self.endpoints.face_login;
        debug!("POST {} (multipart)", url);
        let response = self.http.post(url.clone()).multipart(form).send().await?;
        let info = read_envelope(response).await?;
        Ok(message_or(&info, FACE_LOGIN_ACCEPTED))
    }
}

#[async_trait]
impl RecoveryService for PortalClient {
    async fn send_otp(&self, request: &SendOtpRequest) -> Result<String, PortalError> {
        let info = self.post_json(&self.endpoints.send_otp, request).await?;
        Ok(message_or(&info, OTP_SENT))
    }

    async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<String, PortalError> {
        let info = self.post_json(&self.endpoints.reset_password, request).await?;
        Ok(message_or(&info, PASSWORD_CHANGED))
    }

    async fn send_username_otp(&self, request: &UsernameOtpRequest) -> Result<String, PortalError> {
        let info = self.post_json(&self.endpoints.forgot_username, request).await?;
        Ok(message_or(&info, OTP_SENT))
    }

    async fn recover_username(
        &self,
        request: &UsernameOtpRequest,
    ) -> Result<Vec<String>, PortalError> {
        let info = self.post_json(&self.endpoints.forgot_username, request).await?;
        Ok(username_list(info))
    }
}

#[async_trait]
impl LoginService for PortalClient {
    async fn login(&self, request: &LoginRequest) -> Result<Session, PortalError> {
        let url = &self.endpoints.login;
        debug!("POST {}", url);
        let response = self.http.post(url.clone()).json(request).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body: Value = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(_) if !status.is_success() => return Err(PortalError::Rejected(None)),
            Err(e) => return Err(PortalError::Decode(e.to_string())),
        };

        let profile = match body.get("userinfo") {
            Some(profile) if status.is_success() && profile.is_object() => profile.clone(),
            _ => {
                let reason = body
                    .get("info")
                    .or_else(|| body.get("message"))
                    .or(Some(&body))
                    .and_then(info_text);
                return Err(PortalError::Rejected(reason));
            }
        };

        let session_id = body
            .get("session_id")
            .or_else(|| profile.get("session_id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| PortalError::Decode("login response has no session_id".to_string()))?;

        Ok(Session {
            session_id,
            profile,
        })
    }
}

/// Unwrap `{ "msg": "success", "info": ... }`; anything else is a rejection
async fn read_envelope(response: Response) -> Result<Value, PortalError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    debug!("response status {}", status);

    let envelope: Envelope = match serde_json::from_slice(&bytes) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => return Err(PortalError::Rejected(None)),
        Err(e) => return Err(PortalError::Decode(e.to_string())),
    };

    if status.is_success() && envelope.msg.as_deref() == Some("success") {
        Ok(envelope.info)
    } else {
        Err(PortalError::Rejected(info_text(&envelope.info)))
    }
}

fn info_text(info: &Value) -> Option<String> {
    match info {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Server text, or `fallback` when a success carries none
fn message_or(info: &Value, fallback: &str) -> String {
    info_text(info)
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn username_list(info: Value) -> Vec<String> {
    match info {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::Null => Vec::new(),
        Value::String(s) => vec![s],
        other => vec![other.to_string()],
    }
}

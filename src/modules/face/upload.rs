use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::multipart::Form;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::modules::client::{ClientContext, PortalClient, RequestOutcome};
use crate::modules::utils::logging::log_auth_event;

#[derive(Debug, Error)]
pub enum FaceError {
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("No image to upload.")]
    Empty,

    #[error("unsupported image format; expected JPEG or PNG")]
    UnsupportedFormat,
}

/// A captured face image, held as a data URL the way a camera screenshot arrives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceCapture {
    data_url: String,
}

impl FaceCapture {
    pub fn from_file(path: &Path) -> Result<Self, FaceError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FaceError> {
        if bytes.is_empty() {
            return Err(FaceError::Empty);
        }
        let mime = sniff_mime(bytes).ok_or(FaceError::UnsupportedFormat)?;
        Ok(Self {
            data_url: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        })
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("image/png")
    } else {
        None
    }
}

/// Upload the capture together with every client-context field
pub async fn upload_face(
    client: &PortalClient,
    capture: &FaceCapture,
    context: &ClientContext,
) -> RequestOutcome {
    let form = context
        .form_fields()
        .into_iter()
        .fold(Form::new().text("image", capture.data_url.clone()), |form, (key, value)| {
            form.text(key, value)
        });

    let outcome = RequestOutcome::from_result(client.post_face_form(form).await);
    log_auth_event(
        "face_login",
        &context.random_session,
        outcome.is_success(),
        Some(outcome.message()),
    );
    outcome
}

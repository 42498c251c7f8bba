#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod event;
pub mod gateway;
pub mod geography;
pub mod model;
pub mod validate;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub use app::{App, ViewModel};
pub use capabilities::{Capabilities, Effect};
pub use event::Event;
pub use model::Model;

pub const API_BASE_URL: &str = "https://credit-backend.netlify.app/api";
pub const CLOUDINARY_CLOUD_NAME: &str = "pendev";
pub const CLOUDINARY_UPLOAD_PRESET: &str = "CreditApp";
pub const DOCUMENT_UPLOAD_FOLDER: &str = "credit-app/documents";

pub const REVIEW_PAGE_SIZE: u32 = 15;
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

// Enforced by the shell's HTTP client; part of the shell contract rather
// than anything the core awaits on.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(60);
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

#[must_use]
pub fn cloudinary_upload_url() -> String {
    format!("https://api.cloudinary.com/v1_1/{CLOUDINARY_CLOUD_NAME}/image/upload")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Validation,
    Conflict,
    NotFound,
    Serialization,
    Deserialization,
    Camera,
    CameraPermissionDenied,
    FaceDetection,
    Upload,
    ImageTooLarge,
    InvalidState,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Validation => "VALIDATION_ERROR",
            Self::Conflict => "CONFLICT",
            Self::NotFound => "NOT_FOUND",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Camera => "CAMERA_ERROR",
            Self::CameraPermissionDenied => "CAMERA_PERMISSION_DENIED",
            Self::FaceDetection => "FACE_DETECTION_ERROR",
            Self::Upload => "UPLOAD_ERROR",
            Self::ImageTooLarge => "IMAGE_TOO_LARGE",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::Internal | Self::Camera | Self::Upload
        )
    }
}

/// Normalized application error. Every failure that reaches the model is one
/// of these; raw transport or device errors never escape the capability
/// boundary unwrapped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::Conflict => "An application with this information already exists.".into(),
            ErrorKind::NotFound => "The requested record could not be found.".into(),
            ErrorKind::Serialization | ErrorKind::Deserialization => {
                "A data error occurred. Please contact support if this persists.".into()
            }
            ErrorKind::Camera => "Camera error. Please close and reopen the camera.".into(),
            ErrorKind::CameraPermissionDenied => {
                "Camera access is required. Please enable camera permissions in Settings.".into()
            }
            ErrorKind::FaceDetection => self.message.clone(),
            ErrorKind::Upload => "The image could not be uploaded. Please try again.".into(),
            ErrorKind::ImageTooLarge => format!(
                "The image is too large. Please use an image smaller than {} MB.",
                MAX_IMAGE_BYTES / 1_000_000
            ),
            ErrorKind::InvalidState => {
                "The app is in an invalid state. Please restart the app.".into()
            }
            ErrorKind::Internal | ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again.".into()
            }
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let kind = match status {
            400 => ErrorKind::Validation,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            409 => ErrorKind::Conflict,
            500..=599 => ErrorKind::Internal,
            _ => ErrorKind::Unknown,
        };

        let message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorResponse>(b).ok())
            .and_then(|e| e.error.or(e.message))
            .unwrap_or_else(|| format!("HTTP error: {status}"));

        Self::new(kind, message).with_context("http_status", status.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)
    }
}

impl std::error::Error for AppError {}

/// Error body shape used by the remote API (`{ "error": ... }`, with
/// `{ "message": ... }` seen from some proxies).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub type AppResult<T> = Result<T, AppError>;

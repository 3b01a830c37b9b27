//! Product image upload through the hosted image service
//!
//! Files go straight to the host with an unsigned upload preset; only the
//! returned public URL is kept.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::multipart;
use serde::Deserialize;
use thiserror::Error;

use crate::config::UploadConfig;

pub const ALLOWED_FORMATS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

static PUBLIC_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/v\d+/(.+)\.[a-zA-Z]+$").expect("public id pattern is valid"));

#[derive(Debug, Clone, Error, PartialEq)]
pub enum UploadError {
    #[error("Image upload is not configured")]
    NotConfigured,
    #[error("File must be an image")]
    NotAnImage,
    #[error("Supported formats: JPEG, PNG, GIF, WebP")]
    UnsupportedFormat,
    #[error("File size must be less than {0}MB")]
    TooLarge(u64),
    #[error("Could not read {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("Upload failed: {0}")]
    Failed(String),
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    #[serde(default)]
    error: Option<UploadErrorBody>,
}

#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    message: String,
}

/// Image types recognized by extension
fn image_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Check type and size before anything is sent
pub fn validate_image(path: &Path, size: u64, max_size: u64) -> Result<(), UploadError> {
    let ext = image_extension(path).ok_or(UploadError::NotAnImage)?;
    if !ALLOWED_FORMATS.contains(&ext.as_str()) {
        const OTHER_IMAGES: [&str; 6] = ["bmp", "tif", "tiff", "svg", "ico", "heic"];
        return Err(if OTHER_IMAGES.contains(&ext.as_str()) {
            UploadError::UnsupportedFormat
        } else {
            UploadError::NotAnImage
        });
    }
    if size > max_size {
        return Err(UploadError::TooLarge(max_size / 1_000_000));
    }
    Ok(())
}

/// `https://res.cloudinary.com/<cloud>/image/upload/v123/folder/name.png`
/// → `folder/name`
pub fn public_id_from_url(url: &str) -> Option<String> {
    PUBLIC_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[derive(Debug, Clone)]
pub struct Uploader {
    client: reqwest::Client,
    config: UploadConfig,
}

impl Uploader {
    pub fn new(config: UploadConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint().is_some()
    }

    fn endpoint(&self) -> Option<String> {
        let cloud = self.config.cloud_name.as_deref()?;
        self.config.upload_preset.as_ref()?;
        Some(format!("https://api.cloudinary.com/v1_1/{}/image/upload", cloud))
    }

    /// Upload a local file, returning its public URL
    pub async fn upload(&self, path: &Path) -> Result<String, UploadError> {
        let endpoint = self.endpoint().ok_or(UploadError::NotConfigured)?;
        let preset = self.config.upload_preset.clone().unwrap_or_default();

        let read_err = |e: std::io::Error| UploadError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        };
        let size = tokio::fs::metadata(path).await.map_err(read_err)?.len();
        validate_image(path, size, self.config.max_file_size)?;
        let bytes = tokio::fs::read(path).await.map_err(read_err)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let ext = image_extension(path).unwrap_or_default();
        let mime = match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg".to_string(),
            other => format!("image/{}", other),
        };
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(&mime)
            .map_err(|e| UploadError::Failed(e.to_string()))?;
        let form = multipart::Form::new()
            .text("upload_preset", preset)
            .part("file", part);

        tracing::info!("Uploading {:?} ({} bytes)", path, size);
        let response = self
            .client
            .post(&endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Failed(e.to_string()))?;
        let status = response.status();
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Failed(e.to_string()))?;

        match (status.is_success(), body.secure_url, body.error) {
            (true, Some(url), _) => {
                tracing::info!("Uploaded image to {}", url);
                Ok(url)
            }
            (_, _, Some(err)) => Err(UploadError::Failed(err.message)),
            _ => Err(UploadError::Failed(format!("host answered {}", status))),
        }
    }
}

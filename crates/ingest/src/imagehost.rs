//! Thumbnail upload to an image-hosting service.
//!
//! The imgbb API takes a multipart form with the image as a base64 text
//! field and the API key as a query parameter, and answers with
//! `{ "success": bool, "data": { "url": ... } }`.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;

use crate::error::IngestError;

/// Image hosting as seen by the record finalizer.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload image bytes and return their public URL.
    async fn upload(&self, image: &[u8]) -> Result<String, IngestError>;
}

/// HTTP client for the imgbb upload API.
pub struct ImgbbClient {
    client: reqwest::Client,
    upload_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: String,
}

impl ImgbbClient {
    pub fn new(upload_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url,
            api_key,
        }
    }
}

#[async_trait]
impl ImageHost for ImgbbClient {
    async fn upload(&self, image: &[u8]) -> Result<String, IngestError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let form = reqwest::multipart::Form::new().text("image", encoded);

        let response = self
            .client
            .post(&self.upload_url)
            .query(&[("key", self.api_key.as_str())])
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(IngestError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let body: UploadResponse = response.json().await?;
        hosted_url(body)
    }
}

fn hosted_url(body: UploadResponse) -> Result<String, IngestError> {
    match body {
        UploadResponse {
            success: true,
            data: Some(UploadData { url }),
        } if !url.is_empty() => Ok(url),
        _ => Err(IngestError::MalformedResponse(
            "image host did not report a hosted url".into(),
        )),
    }
}

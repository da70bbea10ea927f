use async_trait::async_trait;

use clinical_core::dto::{Upload, UploadInput};
use clinical_core::{ClinicalError, MediaUploader, Result};

/// [`MediaUploader`] backed by the media service
#[derive(Clone)]
pub struct HttpMediaUploader {
    http: reqwest::Client,
    base_url: String,
}

impl HttpMediaUploader {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaUploader for HttpMediaUploader {
    async fn upload(&self, input: UploadInput) -> Result<Upload> {
        let url = format!("{}/upload/", self.base_url);
        let context = format!("upload {}", input.filename);
        let response = self
            .http
            .post(&url)
            .json(&input)
            .send()
            .await
            .map_err(|e| ClinicalError::upstream("media", &context, e))?;
        if !response.status().is_success() {
            return Err(ClinicalError::upstream("media", &context, response.status()));
        }
        response
            .json::<Upload>()
            .await
            .map_err(|e| ClinicalError::upstream("media", &context, e))
    }
}

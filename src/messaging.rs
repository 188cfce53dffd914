// messaging.rs
// Outbound messages through the Gzappy HTTP API; PDFs are staged on Supabase storage first.

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use reqwest::{StatusCode, header::CONTENT_TYPE};
use serde::Serialize;

use crate::{
    config::{MessagingConfig, StorageConfig},
    error::DispatchError,
};

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(
        &self,
        phone: &str,
        text: &str,
        attachment: Option<&Path>,
    ) -> Result<(), DispatchError>;
}

/// Puts a local file somewhere the messaging API can fetch it and returns the public URL.
#[async_trait]
pub trait AttachmentStager: Send + Sync {
    async fn stage(&self, path: &Path) -> Result<String, DispatchError>;
}

/// Keeps only the digits of a phone number.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TextPayload<'a> {
    pub phone: [String; 1],
    pub message: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MediaPayload<'a> {
    pub phone: [String; 1],
    pub message: &'a str,
    pub media_public_url: &'a str,
    pub file_name: &'a str,
}

/// Object name under the bucket: file stem plus a unix timestamp, so re-sent receipts never collide.
pub fn staged_object_name(path: &Path, unix: i64) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("recibo");
    format!("{stem}_{unix}.pdf")
}

pub struct SupabaseStager {
    http: reqwest::Client,
    config: StorageConfig,
}

impl SupabaseStager {
    pub fn new(http: reqwest::Client, config: StorageConfig) -> Self {
        Self { http, config }
    }

    pub fn upload_url(&self, base: &str, object: &str) -> String {
        format!("{base}/storage/v1/object/{}/{object}", self.config.bucket)
    }

    pub fn public_url(&self, base: &str, object: &str) -> String {
        format!("{base}/storage/v1/object/public/{}/{object}", self.config.bucket)
    }
}

#[async_trait]
impl AttachmentStager for SupabaseStager {
    async fn stage(&self, path: &Path) -> Result<String, DispatchError> {
        let (Some(base), Some(key)) = (self.config.url.as_deref(), self.config.key.as_deref())
        else {
            return Err(DispatchError::Staging(
                "SUPABASE_URL / SUPABASE_KEY not configured".into(),
            ));
        };

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DispatchError::Staging(format!("{}: {e}", path.display())))?;
        let object = staged_object_name(path, chrono::Utc::now().timestamp());

        let response = self
            .http
            .post(self.upload_url(base, &object))
            .bearer_auth(key)
            .header(CONTENT_TYPE, "application/pdf")
            .header("Cache-Control", "no-cache")
            .body(bytes)
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Staging(format!("upload answered {status}: {body}")));
        }

        let public = self.public_url(base, &object);
        let check = self.http.get(&public).send().await?;
        if check.status() != StatusCode::OK {
            return Err(DispatchError::Staging(format!(
                "{public} not publicly reachable ({})",
                check.status()
            )));
        }
        tracing::debug!(url = %public, "attachment staged");
        Ok(public)
    }
}

pub struct GzappyMessenger {
    http: reqwest::Client,
    config: MessagingConfig,
    stager: Arc<dyn AttachmentStager>,
}

impl GzappyMessenger {
    pub fn new(
        http: reqwest::Client,
        config: MessagingConfig,
        stager: Arc<dyn AttachmentStager>,
    ) -> Self {
        Self {
            http,
            config,
            stager,
        }
    }

    async fn post<T: Serialize + Sync>(
        &self,
        url: &str,
        token: &str,
        payload: &T,
    ) -> Result<(), DispatchError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for GzappyMessenger {
    async fn send(
        &self,
        phone: &str,
        text: &str,
        attachment: Option<&Path>,
    ) -> Result<(), DispatchError> {
        let token = self
            .config
            .token
            .as_deref()
            .ok_or(DispatchError::MissingToken)?;
        let phone = normalize_phone(phone);

        match attachment {
            Some(path) => {
                let public_url = self.stager.stage(path).await?;
                let file_name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("recibo.pdf");
                let payload = MediaPayload {
                    phone: [phone.clone()],
                    message: text,
                    media_public_url: &public_url,
                    file_name,
                };
                self.post(&self.config.media_url, token, &payload).await?;
            }
            None => {
                let payload = TextPayload {
                    phone: [phone.clone()],
                    message: text,
                };
                self.post(&self.config.text_url, token, &payload).await?;
            }
        }
        tracing::info!(phone = %phone, with_attachment = attachment.is_some(), "message sent");
        Ok(())
    }
}

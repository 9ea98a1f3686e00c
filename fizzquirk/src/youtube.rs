//! YouTube publishing client.
//!
//! Speaks the resumable upload protocol of the YouTube Data API v3: one
//! initiation request carrying the metadata, then a single PUT of the whole
//! video file to the session URL the API hands back.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, error, info};

use fizzquirk_core::contract::{PublishReceipt, Publisher, StageError, VideoMetadata};

const UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/videos";

/// Upload client for one configured YouTube channel.
pub struct YouTubeClient {
    client: reqwest::Client,
    access_token: String,
    channel_name: String,
    category_id: String,
    privacy: String,
    tags: Vec<String>,
}

impl YouTubeClient {
    /// Reads the OAuth access token from `YOUTUBE_ACCESS_TOKEN`.
    pub fn new_from_env(
        channel_name: impl Into<String>,
        category_id: impl Into<String>,
        privacy: impl Into<String>,
        tags: Vec<String>,
    ) -> Result<Self, StageError> {
        let access_token = std::env::var("YOUTUBE_ACCESS_TOKEN")
            .map_err(|_| "YOUTUBE_ACCESS_TOKEN must be set in the environment")?;
        Ok(Self {
            client: reqwest::Client::new(),
            access_token,
            channel_name: channel_name.into(),
            category_id: category_id.into(),
            privacy: privacy.into(),
            tags,
        })
    }

    /// Opens a resumable upload session and returns its URL.
    async fn initiate_session(
        &self,
        metadata: &VideoMetadata,
        content_length: u64,
    ) -> Result<String, StageError> {
        let body = serde_json::json!({
            "snippet": {
                "title": metadata.title,
                "description": metadata.description,
                "tags": self.tags,
                "categoryId": self.category_id,
            },
            "status": {
                "privacyStatus": self.privacy,
            },
        });

        let response = self
            .client
            .post(UPLOAD_URL)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&self.access_token)
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", content_length.to_string())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            error!(
                status = %status,
                channel = %self.channel_name,
                "YouTube upload initiation failed: {body}"
            );
            return Err(format!("YouTube upload initiation failed: status {status}").into());
        }

        let session_url = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .ok_or("YouTube did not return an upload session URL")?;
        debug!(channel = %self.channel_name, "Upload session created");
        Ok(session_url)
    }
}

#[async_trait]
impl Publisher for YouTubeClient {
    fn platform(&self) -> &str {
        "youtube"
    }

    async fn publish(
        &self,
        video: &Path,
        metadata: &VideoMetadata,
    ) -> Result<PublishReceipt, StageError> {
        info!(
            channel = %self.channel_name,
            video = %video.display(),
            title = %metadata.title,
            "Uploading video to YouTube"
        );
        let bytes = std::fs::read(video).map_err(|e| -> StageError {
            format!("failed to read video {}: {e}", video.display()).into()
        })?;

        let session_url = self.initiate_session(metadata, bytes.len() as u64).await?;

        let response = self
            .client
            .put(&session_url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, "video/mp4")
            .body(bytes)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            error!(
                status = %status,
                channel = %self.channel_name,
                "YouTube upload failed: {body}"
            );
            return Err(format!("YouTube upload failed: status {status}").into());
        }

        let payload: serde_json::Value = response.json().await?;
        let remote_id = payload
            .get("id")
            .and_then(|id| id.as_str())
            .map(str::to_owned);
        info!(
            channel = %self.channel_name,
            video_id = ?remote_id,
            "YouTube upload complete"
        );
        Ok(PublishReceipt { remote_id })
    }
}

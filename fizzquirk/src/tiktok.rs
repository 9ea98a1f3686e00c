//! TikTok publishing client.
//!
//! TikTok offers no supported upload API for this use case, so this client
//! drives a remote WebDriver session (chromedriver or compatible) through
//! the W3C WebDriver REST protocol: open the upload page headless, feed the
//! file input, set the caption, press Post. The session is always deleted,
//! also when a step fails.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use fizzquirk_core::contract::{PublishReceipt, Publisher, StageError, VideoMetadata};

const UPLOAD_PAGE: &str = "https://www.tiktok.com/upload?lang=en";
// W3C WebDriver key under which element ids are returned.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Upload client for one configured TikTok channel.
pub struct TikTokClient {
    client: reqwest::Client,
    webdriver_url: String,
    channel_name: String,
    settle: Duration,
}

impl TikTokClient {
    pub fn new(
        channel_name: impl Into<String>,
        webdriver_url: impl Into<String>,
        settle_secs: u64,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            webdriver_url: webdriver_url.into().trim_end_matches('/').to_string(),
            channel_name: channel_name.into(),
            settle: Duration::from_secs(settle_secs),
        }
    }

    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, StageError> {
        let url = format!("{}/{}", self.webdriver_url, path);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let payload: serde_json::Value = response.json().await.unwrap_or_default();
        if !status.is_success() {
            let message = payload
                .get("value")
                .and_then(|value| value.get("message"))
                .and_then(|message| message.as_str())
                .unwrap_or("no error message");
            return Err(format!("WebDriver call {path} failed: status {status}: {message}").into());
        }
        Ok(payload)
    }

    async fn open_session(&self) -> Result<String, StageError> {
        let capabilities = serde_json::json!({
            "capabilities": {
                "alwaysMatch": {
                    "goog:chromeOptions": {
                        "args": ["--headless=new", "--disable-gpu", "--window-size=1280,1024"],
                    },
                },
            },
        });
        let payload = self.post("session", &capabilities).await?;
        payload
            .get("value")
            .and_then(|value| value.get("sessionId"))
            .and_then(|id| id.as_str())
            .map(str::to_owned)
            .ok_or_else(|| "WebDriver did not return a session id".into())
    }

    async fn close_session(&self, session: &str) {
        let url = format!("{}/session/{session}", self.webdriver_url);
        if let Err(e) = self.client.delete(&url).send().await {
            warn!(error = %e, channel = %self.channel_name, "Failed to close WebDriver session");
        }
    }

    async fn navigate(&self, session: &str, url: &str) -> Result<(), StageError> {
        self.post(
            &format!("session/{session}/url"),
            &serde_json::json!({ "url": url }),
        )
        .await?;
        Ok(())
    }

    async fn find_element(&self, session: &str, xpath: &str) -> Result<String, StageError> {
        let body = serde_json::json!({ "using": "xpath", "value": xpath });
        let payload = self
            .post(&format!("session/{session}/element"), &body)
            .await?;
        payload
            .get("value")
            .and_then(|value| value.get(ELEMENT_KEY))
            .and_then(|id| id.as_str())
            .map(str::to_owned)
            .ok_or_else(|| format!("no element found for {xpath}").into())
    }

    async fn send_keys(&self, session: &str, element: &str, text: &str) -> Result<(), StageError> {
        self.post(
            &format!("session/{session}/element/{element}/value"),
            &serde_json::json!({ "text": text }),
        )
        .await?;
        Ok(())
    }

    async fn click(&self, session: &str, element: &str) -> Result<(), StageError> {
        self.post(
            &format!("session/{session}/element/{element}/click"),
            &serde_json::json!({}),
        )
        .await?;
        Ok(())
    }

    async fn drive_upload(
        &self,
        session: &str,
        video: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), StageError> {
        self.navigate(session, UPLOAD_PAGE).await?;
        tokio::time::sleep(self.settle).await;

        let file_input = self.find_element(session, "//input[@type='file']").await?;
        self.send_keys(session, &file_input, &video.to_string_lossy())
            .await?;
        tokio::time::sleep(self.settle).await;

        let caption = self
            .find_element(session, "//div[@contenteditable='true']")
            .await?;
        self.send_keys(session, &caption, &metadata.description)
            .await?;

        let post_button = self
            .find_element(session, "//button[.//div[text()='Post']]")
            .await?;
        self.click(session, &post_button).await?;
        tokio::time::sleep(self.settle).await;
        debug!(channel = %self.channel_name, "Post button clicked");
        Ok(())
    }
}

#[async_trait]
impl Publisher for TikTokClient {
    fn platform(&self) -> &str {
        "tiktok"
    }

    async fn publish(
        &self,
        video: &Path,
        metadata: &VideoMetadata,
    ) -> Result<PublishReceipt, StageError> {
        // The browser needs an absolute path to the file input.
        let video = video.canonicalize().map_err(|e| -> StageError {
            format!("failed to resolve video path {}: {e}", video.display()).into()
        })?;
        info!(
            channel = %self.channel_name,
            video = %video.display(),
            "Uploading video to TikTok"
        );

        let session = self.open_session().await?;
        let result = self.drive_upload(&session, &video, metadata).await;
        self.close_session(&session).await;
        result?;

        info!(channel = %self.channel_name, "TikTok upload complete");
        // TikTok's upload page exposes no stable video id to scrape.
        Ok(PublishReceipt::default())
    }
}

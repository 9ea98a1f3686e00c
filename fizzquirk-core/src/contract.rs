//! Contracts between the pipeline core and its external collaborators.
//!
//! The orchestrator in [`crate::pipeline`] only ever talks to narration,
//! composition and publishing through the traits defined here, and the queue
//! only reaches the outside world through [`ThemeSource`]. Concrete adapters
//! (TTS processes, ffmpeg, platform upload clients) live in the binary crate;
//! tests substitute mocks generated by `mockall`.
//!
//! Every trait returns boxed errors: a collaborator failure is data for the
//! failure policy, not a crash.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mockall::automock;

use crate::theme::Theme;

/// Error type for the theme provider boundary.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for stage adapter boundaries (narration, composition, publish).
pub type StageError = Box<dyn std::error::Error + Send + Sync>;

/// External provider of candidate topics.
///
/// Implementations call out over the network and may answer with anything:
/// empty text, markup, numbered lists, prose. Cleaning and filtering the
/// answer is the generator's job, not the source's.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ThemeSource: Send + Sync {
    /// Asks for a batch of candidate topics, returning the provider's raw text.
    async fn propose(&self, prompt: &str) -> Result<String, SourceError>;
}

/// Turns narration text into an audio artifact.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Synthesizes `text` into an audio file at `out_path` and returns the
    /// path actually written.
    async fn narrate(&self, text: &str, out_path: &Path) -> Result<PathBuf, StageError>;
}

/// One composition request: everything needed to render a single video.
#[derive(Debug, Clone)]
pub struct CompositionJob<'a> {
    /// Still image shown for the whole clip.
    pub background: &'a Path,
    /// Narration audio; its duration bounds the clip.
    pub audio: &'a Path,
    /// Title text overlaid on the video.
    pub title: &'a str,
    /// Where the rendered video must land.
    pub out_path: &'a Path,
}

/// Renders a video from a background, an audio track and a title overlay.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Compositor: Send + Sync {
    /// Renders the job and returns the path of the finished video.
    async fn compose<'a>(&self, job: CompositionJob<'a>) -> Result<PathBuf, StageError>;
}

/// Presentation of a video on a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
}

impl VideoMetadata {
    /// Derives upload metadata from a theme. The description falls back to a
    /// stock phrase when the theme carries none.
    pub fn for_theme(theme: &Theme) -> Self {
        let description = match &theme.description {
            Some(description) if !description.trim().is_empty() => description.trim().to_string(),
            _ => format!(
                "Discover more about {} in this fascinating video!",
                theme.title
            ),
        };
        Self {
            title: theme.title.clone(),
            description,
        }
    }
}

/// Proof that a platform accepted an upload.
#[derive(Debug, Clone, Default)]
pub struct PublishReceipt {
    /// Platform-side identifier of the uploaded video, where the platform
    /// reports one.
    pub remote_id: Option<String>,
}

/// Uploads a finished video to one platform.
///
/// One `Publisher` per configured channel; a failure in one must never stop
/// the orchestrator from trying the rest.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Short platform label used in logs and reports, e.g. `"youtube"`.
    fn platform(&self) -> &str;

    /// Uploads the video at `video` with the given metadata.
    async fn publish(
        &self,
        video: &Path,
        metadata: &VideoMetadata,
    ) -> Result<PublishReceipt, StageError>;
}

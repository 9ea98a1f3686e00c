//! Pipeline orchestration: drives one theme through script, narration,
//! composition and publishing, applying the per-stage failure policy.
//!
//! Narration and composition failures abort the run; the theme stays
//! consumed, so a flaky collaborator can never cause the same content to be
//! produced twice. Publish failures are per platform and never abort the run.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::contract::{CompositionJob, Compositor, Narrator, Publisher, StageError, VideoMetadata};
use crate::theme::Theme;

/// Stages of one pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Script,
    Narration,
    Composition,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Script => "script",
            Stage::Narration => "narration",
            Stage::Composition => "composition",
            Stage::Publish => "publish",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Completed,
    Failed,
}

/// Result of one attempted stage.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage: Stage,
    pub status: StageStatus,
    pub artifact: Option<PathBuf>,
    pub error: Option<String>,
}

impl StageResult {
    fn completed(stage: Stage, artifact: Option<PathBuf>) -> Self {
        Self {
            stage,
            status: StageStatus::Completed,
            artifact,
            error: None,
        }
    }

    fn failed(stage: Stage, error: String) -> Self {
        Self {
            stage,
            status: StageStatus::Failed,
            artifact: None,
            error: Some(error),
        }
    }
}

/// Result of one platform upload attempt.
#[derive(Debug, Clone)]
pub struct PublishResult {
    pub platform: String,
    pub remote_id: Option<String>,
    pub error: Option<String>,
}

impl PublishResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every stage, including every platform upload, succeeded.
    Success,
    /// The video was produced, but uploading failed on the named platforms.
    PartialFailure(Vec<String>),
    /// Narration or composition failed; no video exists for this theme, and
    /// the theme stays consumed.
    FatalFailure(Stage),
}

/// Everything an operator needs to know about one run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub theme: Theme,
    pub stages: Vec<StageResult>,
    pub publishes: Vec<PublishResult>,
    pub outcome: Outcome,
}

impl RunReport {
    /// Path of the rendered video, when composition completed.
    pub fn video_path(&self) -> Option<&Path> {
        self.stages
            .iter()
            .find(|s| s.stage == Stage::Composition)
            .and_then(|s| s.artifact.as_deref())
    }

    /// Multi-line, human-readable account of the run.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!(
            "run {} for theme \"{}\"",
            self.run_id, self.theme.title
        ));
        for stage in &self.stages {
            match (&stage.status, &stage.artifact) {
                (StageStatus::Completed, Some(artifact)) => {
                    lines.push(format!("  {}: ok ({})", stage.stage, artifact.display()))
                }
                (StageStatus::Completed, None) => lines.push(format!("  {}: ok", stage.stage)),
                (StageStatus::Failed, _) => lines.push(format!(
                    "  {}: FAILED ({})",
                    stage.stage,
                    stage.error.as_deref().unwrap_or("unknown error")
                )),
            }
        }
        for publish in &self.publishes {
            match (&publish.remote_id, &publish.error) {
                (_, Some(error)) => lines.push(format!(
                    "  publish {}: FAILED ({error})",
                    publish.platform
                )),
                (Some(id), None) => lines.push(format!(
                    "  publish {}: ok (remote id {id})",
                    publish.platform
                )),
                (None, None) => lines.push(format!("  publish {}: ok", publish.platform)),
            }
        }
        let outcome = match &self.outcome {
            Outcome::Success => "success".to_string(),
            Outcome::PartialFailure(platforms) => {
                format!("partial failure ({})", platforms.join(", "))
            }
            Outcome::FatalFailure(stage) => format!("fatal failure at {stage}"),
        };
        lines.push(format!("outcome: {outcome}"));
        lines.join("\n")
    }
}

/// Fixed inputs shared by every run: the background asset and the artifact
/// directories.
#[derive(Debug, Clone)]
pub struct Pipeline {
    background: PathBuf,
    audio_dir: PathBuf,
    video_dir: PathBuf,
}

impl Pipeline {
    pub fn new(
        background: impl Into<PathBuf>,
        audio_dir: impl Into<PathBuf>,
        video_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            background: background.into(),
            audio_dir: audio_dir.into(),
            video_dir: video_dir.into(),
        }
    }

    /// Runs the full pipeline for one theme. Infallible at the signature:
    /// every way a run can go wrong is captured in the report's outcome.
    pub async fn run(
        &self,
        theme: &Theme,
        narrator: &impl Narrator,
        compositor: &impl Compositor,
        publishers: &[Box<dyn Publisher>],
    ) -> RunReport {
        let run_id = Uuid::new_v4();
        let stem = artifact_stem(theme, &run_id);
        info!(run_id = %run_id, theme = %theme.title, "Starting pipeline run");

        let mut stages = Vec::new();

        // Script: pure derivation, cannot fail.
        let text = theme.narration_text();
        stages.push(StageResult::completed(Stage::Script, None));
        debug!(run_id = %run_id, chars = text.len(), "Narration text ready");

        // Narration: fatal on failure.
        let audio_path = self.audio_dir.join(format!("{stem}.mp3"));
        let narration = match ensure_dir(&self.audio_dir) {
            Ok(()) => narrator.narrate(&text, &audio_path).await,
            Err(e) => Err(e),
        };
        let audio_path = match narration {
            Ok(path) => {
                info!(run_id = %run_id, audio = %path.display(), "Narration complete");
                stages.push(StageResult::completed(Stage::Narration, Some(path.clone())));
                path
            }
            Err(e) => {
                error!(
                    run_id = %run_id,
                    theme = %theme.title,
                    error = %e,
                    "Narration failed, aborting run"
                );
                stages.push(StageResult::failed(Stage::Narration, e.to_string()));
                return RunReport {
                    run_id,
                    theme: theme.clone(),
                    stages,
                    publishes: Vec::new(),
                    outcome: Outcome::FatalFailure(Stage::Narration),
                };
            }
        };

        // Composition: fatal on failure, and success without a file on disk
        // counts as failure.
        let video_path = self.video_dir.join(format!("{stem}.mp4"));
        let composition = match ensure_dir(&self.video_dir) {
            Ok(()) => {
                compositor
                    .compose(CompositionJob {
                        background: &self.background,
                        audio: &audio_path,
                        title: &theme.title,
                        out_path: &video_path,
                    })
                    .await
            }
            Err(e) => Err(e),
        };
        let video_path = match composition {
            Ok(path) if path.exists() => {
                info!(run_id = %run_id, video = %path.display(), "Composition complete");
                stages.push(StageResult::completed(Stage::Composition, Some(path.clone())));
                path
            }
            Ok(path) => {
                let message = format!(
                    "compositor reported success but {} does not exist",
                    path.display()
                );
                error!(run_id = %run_id, theme = %theme.title, "{message}");
                stages.push(StageResult::failed(Stage::Composition, message));
                return RunReport {
                    run_id,
                    theme: theme.clone(),
                    stages,
                    publishes: Vec::new(),
                    outcome: Outcome::FatalFailure(Stage::Composition),
                };
            }
            Err(e) => {
                error!(
                    run_id = %run_id,
                    theme = %theme.title,
                    error = %e,
                    "Composition failed, aborting run"
                );
                stages.push(StageResult::failed(Stage::Composition, e.to_string()));
                return RunReport {
                    run_id,
                    theme: theme.clone(),
                    stages,
                    publishes: Vec::new(),
                    outcome: Outcome::FatalFailure(Stage::Composition),
                };
            }
        };

        // Publish: every platform gets its attempt, failures are collected.
        let metadata = VideoMetadata::for_theme(theme);
        let mut publishes = Vec::new();
        for publisher in publishers {
            let platform = publisher.platform().to_string();
            match publisher.publish(&video_path, &metadata).await {
                Ok(receipt) => {
                    info!(
                        run_id = %run_id,
                        platform = %platform,
                        remote_id = ?receipt.remote_id,
                        "Published video"
                    );
                    publishes.push(PublishResult {
                        platform,
                        remote_id: receipt.remote_id,
                        error: None,
                    });
                }
                Err(e) => {
                    error!(
                        run_id = %run_id,
                        platform = %platform,
                        error = %e,
                        "Publish failed, continuing with remaining platforms"
                    );
                    publishes.push(PublishResult {
                        platform,
                        remote_id: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }
        stages.push(StageResult::completed(Stage::Publish, Some(video_path)));

        let failed: Vec<String> = publishes
            .iter()
            .filter(|p| !p.succeeded())
            .map(|p| p.platform.clone())
            .collect();
        let outcome = if failed.is_empty() {
            info!(run_id = %run_id, theme = %theme.title, "Pipeline run succeeded");
            Outcome::Success
        } else {
            warn!(
                run_id = %run_id,
                theme = %theme.title,
                failed = ?failed,
                "Pipeline run finished with publish failures"
            );
            Outcome::PartialFailure(failed)
        };

        RunReport {
            run_id,
            theme: theme.clone(),
            stages,
            publishes,
            outcome,
        }
    }
}

/// File stem shared by a run's artifacts: theme slug plus a run id prefix, so
/// reruns of recycled titles never overwrite older artifacts.
fn artifact_stem(theme: &Theme, run_id: &Uuid) -> String {
    let id = run_id.simple().to_string();
    format!("{}_{}", theme.slug(), &id[..8])
}

fn ensure_dir(dir: &Path) -> Result<(), StageError> {
    fs::create_dir_all(dir)
        .map_err(|e| -> StageError { format!("failed to create {}: {e}", dir.display()).into() })
}

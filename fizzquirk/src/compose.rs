//! Composition adapter: renders the final video with ffmpeg.

use std::path::PathBuf;
use std::process::Command;

use async_trait::async_trait;
use tracing::{error, info};

use fizzquirk_core::contract::{CompositionJob, Compositor, StageError};

/// Renders a still background plus narration audio into a portrait
/// H.264/AAC video, with the theme title drawn over the image. `-shortest`
/// bounds the clip to the narration length.
#[derive(Debug, Clone)]
pub struct FfmpegCompositor {
    program: String,
}

impl FfmpegCompositor {
    pub fn new() -> Self {
        Self {
            program: "ffmpeg".to_string(),
        }
    }

    /// Points the adapter at a specific ffmpeg binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfmpegCompositor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Compositor for FfmpegCompositor {
    async fn compose<'a>(&self, job: CompositionJob<'a>) -> Result<PathBuf, StageError> {
        if !job.background.exists() {
            return Err(format!(
                "background image {} not found",
                job.background.display()
            )
            .into());
        }

        info!(video = %job.out_path.display(), "Rendering video with ffmpeg");
        let filter = drawtext_filter(job.title);
        let status = Command::new(&self.program)
            .arg("-y")
            .args(["-loop", "1"])
            .arg("-i")
            .arg(job.background)
            .arg("-i")
            .arg(job.audio)
            .arg("-vf")
            .arg(&filter)
            .args(["-map", "0:v:0", "-map", "1:a:0"])
            .args(["-c:v", "libx264", "-tune", "stillimage"])
            .args(["-c:a", "aac", "-b:a", "192k"])
            .args(["-pix_fmt", "yuv420p", "-r", "30"])
            .arg("-shortest")
            .arg(job.out_path)
            .status()
            .map_err(|e| -> StageError { format!("failed to run {}: {e}", self.program).into() })?;

        if !status.success() {
            error!(status = %status, "ffmpeg failed to render the video");
            return Err(format!("{} exited with {status}", self.program).into());
        }

        info!(video = %job.out_path.display(), "Video rendered");
        Ok(job.out_path.to_path_buf())
    }
}

/// Builds the scale and drawtext filter for the title overlay. Characters
/// with meaning inside ffmpeg filter arguments are dropped rather than
/// escaped.
fn drawtext_filter(title: &str) -> String {
    let safe: String = title
        .chars()
        .filter(|c| !matches!(c, '\'' | ':' | '\\' | '%' | ',' | ';' | '[' | ']'))
        .collect();
    format!(
        "scale=1080:1920,drawtext=text='{safe}':fontcolor=white:fontsize=64:borderw=3:\
         bordercolor=black:x=(w-text_w)/2:y=h*0.12"
    )
}

//! Narration adapter: drives a local text-to-speech program.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use async_trait::async_trait;
use tracing::{error, info};

use fizzquirk_core::contract::{Narrator, StageError};

use crate::load_config::NarratorSection;

/// Runs the configured TTS program once per narration: text on stdin, audio
/// file out. Works with `piper` and anything speaking the same convention.
#[derive(Debug, Clone)]
pub struct CommandNarrator {
    program: String,
    voice: Option<String>,
}

impl CommandNarrator {
    pub fn new(section: &NarratorSection) -> Self {
        Self {
            program: section.program.clone(),
            voice: section.voice.clone(),
        }
    }
}

#[async_trait]
impl Narrator for CommandNarrator {
    async fn narrate(&self, text: &str, out_path: &Path) -> Result<PathBuf, StageError> {
        info!(program = %self.program, out = %out_path.display(), "Synthesizing narration");

        let mut command = Command::new(&self.program);
        if let Some(voice) = &self.voice {
            command.args(["--model", voice.as_str()]);
        }
        let mut child = command
            .arg("--output_file")
            .arg(out_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| -> StageError { format!("failed to spawn {}: {e}", self.program).into() })?;

        // Closing stdin signals end of input to the TTS program.
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).map_err(|e| -> StageError {
                format!("failed to feed narration text to {}: {e}", self.program).into()
            })?;
        }

        let status = child
            .wait()
            .map_err(|e| -> StageError { format!("failed to wait for {}: {e}", self.program).into() })?;
        if !status.success() {
            error!(program = %self.program, status = %status, "TTS program failed");
            return Err(format!("{} exited with {status}", self.program).into());
        }
        if !out_path.exists() {
            return Err(format!(
                "{} exited successfully but {} was not written",
                self.program,
                out_path.display()
            )
            .into());
        }

        info!(out = %out_path.display(), "Narration written");
        Ok(out_path.to_path_buf())
    }
}

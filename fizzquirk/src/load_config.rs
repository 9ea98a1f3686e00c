//! `load_config` module: loads the static YAML configuration into typed
//! sections for the CLI.
//!
//! This is the only place untrusted YAML is parsed. Secrets never live in
//! the file: API keys and tokens are read from the environment by the
//! clients that need them, so a config file can be committed without leaking
//! credentials.
//!
//! # Errors
//! All errors here use `anyhow::Error` for context-rich diagnostics and are
//! surfaced at the CLI boundary.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::{error, info};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory holding the queue state files.
    pub data_dir: PathBuf,
    pub assets: AssetsSection,
    pub output: OutputSection,
    #[serde(default)]
    pub generator: GeneratorSection,
    pub narrator: NarratorSection,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetsSection {
    /// Background still image used for every video.
    pub background: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSection {
    pub audio_dir: PathBuf,
    pub video_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorSection {
    /// Model identifier passed to the Gemini endpoint.
    pub model: String,
    /// How many candidate topics to request per generation attempt.
    pub batch_size: usize,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            batch_size: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NarratorSection {
    /// Text-to-speech program, e.g. `piper`. It receives the narration text
    /// on stdin and writes the audio file named by `--output_file`.
    pub program: String,
    /// Voice model passed as `--model`, when the program takes one.
    #[serde(default)]
    pub voice: Option<String>,
}

/// One publishing destination, discriminated by its `platform` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum ChannelConfig {
    Youtube {
        name: String,
        #[serde(default = "default_category_id")]
        category_id: String,
        #[serde(default = "default_privacy")]
        privacy: String,
        #[serde(default)]
        tags: Vec<String>,
    },
    Tiktok {
        name: String,
        /// Remote WebDriver endpoint, e.g. `http://localhost:9515`.
        webdriver_url: String,
        /// Seconds to wait for the upload page to settle between steps.
        #[serde(default = "default_settle_secs")]
        settle_secs: u64,
    },
}

fn default_category_id() -> String {
    // 27 is YouTube's Education category.
    "27".to_string()
}

fn default_privacy() -> String {
    "public".to_string()
}

fn default_settle_secs() -> u64 {
    5
}

/// Loads a static YAML config file. Secrets are not part of the schema.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: AppConfig = match serde_yaml::from_str(&config_content) {
        Ok(config) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            config
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    Ok(config)
}

//! Command-line interface for fizzquirk.
//!
//! All business logic lives in `fizzquirk-core`; this module is CLI glue:
//! argument parsing, wiring the configured adapters into the pipeline, and
//! reporting outcomes. The async [`run`] entrypoint is shared by `main` and
//! the integration tests.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use fizzquirk_core::contract::Publisher;
use fizzquirk_core::generate::{GeminiThemeSource, ThemeGenerator};
use fizzquirk_core::pipeline::{Outcome, Pipeline};
use fizzquirk_core::queue::ThemeQueue;
use fizzquirk_core::store::ThemeStore;

use crate::compose::FfmpegCompositor;
use crate::load_config::{load_config, AppConfig, ChannelConfig};
use crate::narrate::CommandNarrator;
use crate::tiktok::TikTokClient;
use crate::youtube::YouTubeClient;

/// CLI for fizzquirk: produce and publish short curiosity videos.
#[derive(Parser)]
#[clap(
    name = "fizzquirk",
    version,
    about = "Generate, narrate, compose and publish short curiosity videos"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Produce one video from the next queued theme and publish it
    Run {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Show queue counts and upcoming themes without producing anything
    Status {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "run", "Starting pipeline run");
            run_pipeline(config).await
        }
        Commands::Status { config } => {
            let config = load_config(config)?;
            print_status(&config);
            Ok(())
        }
    }
}

/// Pops the next theme and drives it through the full pipeline.
async fn run_pipeline(config: AppConfig) -> Result<()> {
    let store = ThemeStore::new(&config.data_dir);
    let generator = ThemeGenerator {
        batch_size: config.generator.batch_size,
        ..ThemeGenerator::default()
    };
    let source = GeminiThemeSource::new_from_env(config.generator.model.as_str())
        .map_err(|e| anyhow::anyhow!("Failed to construct theme source: {e}"))?;

    // Every adapter must be ready before the pop: popping marks the theme
    // consumed, so a misconfigured run has to fail while the queue is intact.
    let narrator = CommandNarrator::new(&config.narrator);
    let compositor = FfmpegCompositor::new();
    let publishers = build_publishers(&config)?;

    let mut queue = ThemeQueue::new(store, generator, source);
    let theme = queue
        .next()
        .await
        .map_err(|e| anyhow::anyhow!("Could not obtain a theme: {e}"))?;

    let pipeline = Pipeline::new(
        &config.assets.background,
        &config.output.audio_dir,
        &config.output.video_dir,
    );
    let report = pipeline
        .run(&theme, &narrator, &compositor, &publishers)
        .await;
    println!("{}", report.summary());

    // Stage and publish failures exit zero: the theme is burned and the next
    // scheduled run moves on. Only an empty queue or broken bootstrap should
    // stop the schedule.
    if let Outcome::FatalFailure(stage) = &report.outcome {
        tracing::error!(
            theme = %report.theme.title,
            stage = %stage,
            "Run failed and the theme stays consumed"
        );
    }
    Ok(())
}

/// One boxed upload client per configured channel.
fn build_publishers(config: &AppConfig) -> Result<Vec<Box<dyn Publisher>>> {
    let mut publishers: Vec<Box<dyn Publisher>> = Vec::new();
    for channel in &config.channels {
        match channel {
            ChannelConfig::Youtube {
                name,
                category_id,
                privacy,
                tags,
            } => {
                let client = YouTubeClient::new_from_env(
                    name.as_str(),
                    category_id.as_str(),
                    privacy.as_str(),
                    tags.clone(),
                )
                .map_err(|e| {
                    anyhow::anyhow!("Failed to construct YouTube client for {name}: {e}")
                })?;
                publishers.push(Box::new(client));
            }
            ChannelConfig::Tiktok {
                name,
                webdriver_url,
                settle_secs,
            } => {
                publishers.push(Box::new(TikTokClient::new(
                    name.as_str(),
                    webdriver_url.as_str(),
                    *settle_secs,
                )));
            }
        }
    }
    Ok(publishers)
}

fn print_status(config: &AppConfig) {
    let snapshot = ThemeStore::new(&config.data_dir).load();
    println!(
        "pending: {} themes, consumed: {} themes",
        snapshot.pending.len(),
        snapshot.consumed.len()
    );
    for theme in snapshot.pending.iter().take(5) {
        println!("  next: {}", theme.title);
    }
    if let Some(last) = snapshot.consumed.last() {
        println!(
            "  last consumed: {} at {}",
            last.theme.title, last.consumed_at
        );
    }
}

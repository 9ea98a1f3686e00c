//! Theme generation: a bounded-retry policy around an external provider,
//! with a hardcoded fallback list so the pipeline keeps moving when the
//! provider is down.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::contract::{SourceError, ThemeSource};
use crate::error::GenerateError;
use crate::theme::{clean_title, Theme};

/// Themes used when the provider yields nothing after all retries.
const FALLBACK_TITLES: &[&str] = &[
    "The Unexpected Physics Of Sneezing",
    "The Art Of Minimalism",
    "The Science Behind Whispering Galleries",
    "Why Cats Always Land On Their Feet",
    "The Hidden Life Of Deep Sea Creatures",
    "How Honey Never Spoils",
];

/// The built-in fallback batch, in its fixed order.
pub fn fallback_themes() -> Vec<Theme> {
    FALLBACK_TITLES.iter().map(|title| Theme::new(*title)).collect()
}

/// Retry-then-fallback generation policy.
///
/// Each attempt asks the source for a fresh batch, cleans it and filters it
/// against `excluding`; an attempt that yields nothing usable counts as a
/// failure. After the last attempt the fallback list is used, run through the
/// same exclusion filter so fallback themes are also produced at most once.
#[derive(Debug, Clone)]
pub struct ThemeGenerator {
    /// How many candidate titles to request per attempt.
    pub batch_size: usize,
    /// Attempts against the provider before falling back.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
}

impl Default for ThemeGenerator {
    fn default() -> Self {
        Self {
            batch_size: 5,
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
        }
    }
}

impl ThemeGenerator {
    /// Produces a batch of themes not present in `excluding`. Never fails:
    /// the worst case is the (possibly empty) filtered fallback list.
    pub async fn generate<S>(&self, source: &S, excluding: &HashSet<String>) -> Vec<Theme>
    where
        S: ThemeSource + ?Sized,
    {
        for attempt in 1..=self.max_attempts {
            match self.attempt(source, excluding).await {
                Ok(themes) => {
                    info!(attempt, count = themes.len(), "Generated fresh themes");
                    return themes;
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Theme generation attempt failed"
                    );
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        let fallback = filter_candidates(fallback_themes(), excluding);
        error!(
            count = fallback.len(),
            "Theme provider exhausted after retries, using fallback themes"
        );
        fallback
    }

    async fn attempt<S>(
        &self,
        source: &S,
        excluding: &HashSet<String>,
    ) -> Result<Vec<Theme>, GenerateError>
    where
        S: ThemeSource + ?Sized,
    {
        let prompt = self.build_prompt(excluding);
        let raw = source.propose(&prompt).await.map_err(GenerateError::Provider)?;
        debug!(chars = raw.len(), "Theme provider answered");

        let themes = filter_candidates(parse_candidates(&raw), excluding);
        if themes.is_empty() {
            return Err(GenerateError::NoUsableTitles);
        }
        Ok(themes)
    }

    fn build_prompt(&self, excluding: &HashSet<String>) -> String {
        let mut prompt = format!(
            "Provide {} unique and interesting curiosity topics in English, one per line, \
             without numbering or commentary. Each topic should be concise and suitable for \
             a short educational video.",
            self.batch_size
        );
        if !excluding.is_empty() {
            let mut used: Vec<&str> = excluding.iter().map(String::as_str).collect();
            used.sort_unstable();
            prompt.push_str("\nDo not repeat any of these already used topics:\n");
            for title in used {
                prompt.push_str("- ");
                prompt.push_str(title);
                prompt.push('\n');
            }
        }
        prompt
    }
}

/// Splits raw provider text into candidate themes, stripping list markers and
/// markup before cleaning each line.
fn parse_candidates(raw: &str) -> Vec<Theme> {
    raw.lines()
        .map(strip_list_marker)
        .filter_map(clean_title)
        .map(Theme::new)
        .collect()
}

/// Drops a leading bullet (`-`, `*`) or numbering (`3.`, `12)`) from a line.
fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let line = line.trim_start_matches(['-', '*']).trim_start();
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim_start();
        }
    }
    line
}

/// Keeps candidates whose dedup key is new: not in `excluding` and not seen
/// earlier in the same batch.
fn filter_candidates(candidates: Vec<Theme>, excluding: &HashSet<String>) -> Vec<Theme> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::new();
    for theme in candidates {
        let key = theme.dedup_key();
        if excluding.contains(&key) {
            debug!(title = %theme.title, "Dropping already known candidate");
            continue;
        }
        if !seen.insert(key) {
            debug!(title = %theme.title, "Dropping duplicate candidate within batch");
            continue;
        }
        kept.push(theme);
    }
    kept
}

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Theme provider backed by the Gemini `generateContent` REST endpoint.
pub struct GeminiThemeSource {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiThemeSource {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Reads the API key from the `GEMINI_API_KEY` environment variable.
    pub fn new_from_env(model: impl Into<String>) -> Result<Self, SourceError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| "GEMINI_API_KEY must be set in the environment")?;
        Ok(Self::new(api_key, model))
    }
}

#[async_trait::async_trait]
impl ThemeSource for GeminiThemeSource {
    async fn propose(&self, prompt: &str) -> Result<String, SourceError> {
        let url = format!(
            "{GEMINI_ENDPOINT}/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            error!(status = %status, model = %self.model, "Gemini API returned an error: {body}");
            return Err(format!("Gemini API error: status {status}").into());
        }

        let payload: serde_json::Value = response.json().await?;
        let text = payload
            .get("candidates")
            .and_then(|candidates| candidates.get(0))
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(|parts| parts.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();
        debug!(model = %self.model, chars = text.len(), "Gemini answered");
        Ok(text)
    }
}

use serde::{Deserialize, Serialize};

/// A unit of content: one topic to be turned into a short video.
///
/// Identity is the cleaned, case-normalized title; two themes with the same
/// [`dedup_key`](Theme::dedup_key) are the same theme as far as the queue is
/// concerned, across the whole lifetime of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Theme {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: Some(description.into()),
        }
    }

    /// Case-normalized identity key used for dedup across pending and consumed.
    pub fn dedup_key(&self) -> String {
        self.title.trim().to_lowercase()
    }

    /// Text handed to the narration stage: the description when present,
    /// otherwise a stock phrase derived from the title.
    pub fn narration_text(&self) -> String {
        match &self.description {
            Some(description) if !description.trim().is_empty() => description.trim().to_string(),
            _ => format!(
                "Did you know about {}? Let's dive into some fascinating facts!",
                self.title
            ),
        }
    }

    /// Filesystem-safe stem for artifact file names.
    pub fn slug(&self) -> String {
        self.title
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect()
    }
}

/// Cleans a raw candidate title from the provider: strips markup leftovers,
/// collapses whitespace and title-cases the words. Returns `None` when
/// nothing usable remains.
pub fn clean_title(raw: &str) -> Option<String> {
    let stripped = regex::Regex::new(r"[^A-Za-z0-9\s\-]")
        .unwrap()
        .replace_all(raw, "");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    Some(title_case(&collapsed))
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

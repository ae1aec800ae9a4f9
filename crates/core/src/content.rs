//! Generated article content.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_SEO_DESCRIPTION_CHARS, MAX_TITLE_CHARS};
use crate::error::CoreError;
use crate::json_utils::{collapse_whitespace, truncate_chars};
use crate::pitch::{Pitch, PitchStatus};

/// Article produced by a generation strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub title: String,
    pub body: String,
    pub seo_description: String,
}

impl GeneratedContent {
    /// Derives title and SEO description from free-form model output.
    ///
    /// Returns `None` when the text is blank.
    #[must_use]
    pub fn from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let mut lines = text.lines();
        let first = lines.by_ref().find(|l| !l.trim().is_empty()).unwrap_or(text).trim();
        let is_heading = first.starts_with('#');
        let title_line = first.trim_start_matches('#').trim();
        let title = truncate_chars(strip_emphasis(title_line), MAX_TITLE_CHARS).trim().to_owned();

        let body = if is_heading {
            let rest = lines.collect::<Vec<_>>().join("\n");
            let rest = rest.trim();
            if rest.is_empty() { text.to_owned() } else { rest.to_owned() }
        } else {
            text.to_owned()
        };

        let seo_description = first_paragraph(&body)
            .map(|p| truncate_chars(&collapse_whitespace(p), MAX_SEO_DESCRIPTION_CHARS).to_owned())
            .unwrap_or_default();

        Some(Self { title, body, seo_description })
    }

    /// Whether the body carries any text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

fn strip_emphasis(s: &str) -> &str {
    s.trim_start_matches("**").trim_end_matches("**")
}

/// First non-heading paragraph, paragraphs being separated by blank lines.
fn first_paragraph(body: &str) -> Option<&str> {
    body.split("\n\n").map(str::trim).find(|p| !p.is_empty() && !p.starts_with('#'))
}

/// Where generated content is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputTarget {
    /// New draft article record attributed to the default author.
    #[default]
    Draft,
    /// Overwrite the pitch's suggested text with the generated body.
    Pitch,
}

impl OutputTarget {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Draft => "draft",
            Self::Pitch => "pitch",
        }
    }
}

impl Display for OutputTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputTarget {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "pitch" => Ok(Self::Pitch),
            other => Err(CoreError::InvalidOutputTarget(other.to_owned())),
        }
    }
}

/// A draft article row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredContent {
    pub id: i64,
    pub pitch_id: i64,
    pub title: String,
    pub body: String,
    pub seo_description: String,
    pub author: Option<String>,
    /// Name of the strategy that produced the content.
    pub strategy: String,
    pub created_at: DateTime<Utc>,
}

/// Result of storing generated output and moving its pitch to `generated`
/// in one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationCommit {
    /// Status the pitch was completed from.
    pub from: PitchStatus,
    pub pitch: Pitch,
    /// `None` when the output went into the pitch text.
    pub draft: Option<StoredContent>,
}

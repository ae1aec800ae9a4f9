//! Prompt templates and placeholder rendering.

use std::borrow::Cow;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::pitch::{Pillar, Pitch};

static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(\w+)\}").unwrap());

/// Operator-authored prompt with `{placeholder}` tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: i64,
    pub pillar: Option<Pillar>,
    pub category: String,
    pub topic: Option<String>,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPromptTemplate {
    pub pillar: Option<Pillar>,
    pub category: String,
    pub topic: Option<String>,
    pub prompt: String,
}

impl NewPromptTemplate {
    #[must_use]
    pub fn new(category: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self { pillar: None, category: category.into(), topic: None, prompt: prompt.into() }
    }

    #[must_use]
    pub fn pillar(mut self, pillar: Pillar) -> Self {
        self.pillar = Some(pillar);
        self
    }

    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// # Errors
    /// Returns `CoreError::InvalidInput` when category or prompt is blank.
    pub fn validated(self) -> Result<Self, CoreError> {
        let category = self.category.trim().to_owned();
        if category.is_empty() {
            return Err(CoreError::InvalidInput("template category must not be empty".into()));
        }
        if self.prompt.trim().is_empty() {
            return Err(CoreError::InvalidInput("template prompt must not be empty".into()));
        }
        Ok(Self {
            pillar: self.pillar,
            category,
            topic: self.topic.map(|t| t.trim().to_owned()).filter(|t| !t.is_empty()),
            prompt: self.prompt,
        })
    }
}

/// Which resolution tier produced a prompt, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTier {
    /// pillar + category + topic
    Exact,
    /// category + topic
    CategoryTopic,
    /// category with no topic
    Category,
    /// configured global default
    Default,
}

impl Display for PromptTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match *self {
            Self::Exact => "exact",
            Self::CategoryTopic => "category_topic",
            Self::Category => "category",
            Self::Default => "default",
        })
    }
}

/// A template rendered against a pitch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPrompt {
    pub text: String,
    pub tier: PromptTier,
    /// `None` when the global default was used.
    pub template_id: Option<i64>,
    /// Placeholder names that rendered as `[MISSING: name]`.
    pub missing: Vec<String>,
}

/// Output of [`render_template`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub text: String,
    pub missing: Vec<String>,
}

/// Value a placeholder name maps to on `pitch`, if any.
fn placeholder_value<'a>(pitch: &'a Pitch, name: &str) -> Option<&'a str> {
    let value = match name {
        "pitch" => Some(pitch.suggested_pitch.as_str()),
        "topic" => pitch.topic.as_deref(),
        "keywords" => pitch.main_seo_keyword.as_deref(),
        "category" => Some(pitch.category.as_str()),
        _ => None,
    };
    value.filter(|v| !v.trim().is_empty())
}

/// Replaces `{name}` tokens with pitch fields.
///
/// Unknown names, and known names whose pitch field is empty, become a
/// visible `[MISSING: name]` marker so template/data mismatches show up in
/// the generated text instead of aborting the batch.
#[must_use]
pub fn render_template(template: &str, pitch: &Pitch) -> RenderedPrompt {
    let mut missing = Vec::new();
    let text = PLACEHOLDER_REGEX.replace_all(template, |caps: &Captures<'_>| {
        let name = caps.get(1).map_or("", |m| m.as_str());
        match placeholder_value(pitch, name) {
            Some(value) => Cow::Owned(value.to_owned()),
            None => {
                if !missing.iter().any(|m| m == name) {
                    missing.push(name.to_owned());
                }
                Cow::Owned(format!("[MISSING: {name}]"))
            },
        }
    });
    RenderedPrompt { text: text.into_owned(), missing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::{PitchOrigin, PitchStatus};

    fn pitch(text: &str, keywords: Option<&str>) -> Pitch {
        let now = Utc::now();
        Pitch {
            id: 7,
            pillar: Some(Pillar::Sport),
            category: "Fitness".to_owned(),
            topic: None,
            main_seo_keyword: keywords.map(ToOwned::to_owned),
            suggested_pitch: text.to_owned(),
            origin: PitchOrigin::Manual,
            status: PitchStatus::Approved,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_render_replaces_known_placeholders() {
        let rendered = render_template("Write about {pitch} using {keywords}", &pitch("X", Some("Y")));
        assert_eq!(rendered.text, "Write about X using Y");
        assert!(rendered.missing.is_empty());
    }

    #[test]
    fn test_render_marks_unknown_placeholder() {
        let rendered = render_template("Tone: {unknown}", &pitch("X", None));
        assert!(rendered.text.contains("[MISSING: unknown]"));
        assert_eq!(rendered.missing, vec!["unknown".to_owned()]);
    }

    #[test]
    fn test_render_marks_empty_pitch_field() {
        let rendered = render_template("{topic} / {category}", &pitch("X", None));
        assert_eq!(rendered.text, "[MISSING: topic] / Fitness");
        assert_eq!(rendered.missing, vec!["topic".to_owned()]);
    }

    #[test]
    fn test_render_without_tokens_is_unchanged() {
        let template = "Plain prompt with a } brace and {not closed";
        assert_eq!(render_template(template, &pitch("X", None)).text, template);
    }

    #[test]
    fn test_render_repeated_missing_reported_once() {
        let rendered = render_template("{a} {a}", &pitch("X", None));
        assert_eq!(rendered.text, "[MISSING: a] [MISSING: a]");
        assert_eq!(rendered.missing.len(), 1);
    }

    #[test]
    fn test_new_template_validation() {
        assert!(NewPromptTemplate::new(" ", "p").validated().is_err());
        assert!(NewPromptTemplate::new("c", "  ").validated().is_err());
        let t = NewPromptTemplate::new(" c ", "p").topic(" ").validated().unwrap();
        assert_eq!(t.category, "c");
        assert_eq!(t.topic, None);
    }
}

//! Pitch entity: a proposed article awaiting approval and generation.

mod status;

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub use status::{Actor, PitchAction, PitchStatus, SideEffect, Transition};

/// Editorial pillar a pitch or prompt template belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Pillar {
    Sport,
    StrategicContent,
    PartnerContent,
    ProprietaryContent,
}

impl Pillar {
    pub const ALL: &'static [Pillar] =
        &[Self::Sport, Self::StrategicContent, Self::PartnerContent, Self::ProprietaryContent];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Sport => "sport",
            Self::StrategicContent => "strategic-content",
            Self::PartnerContent => "partner-content",
            Self::ProprietaryContent => "proprietary-content",
        }
    }
}

impl Display for Pillar {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pillar {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sport" => Ok(Self::Sport),
            "strategic-content" => Ok(Self::StrategicContent),
            "partner-content" => Ok(Self::PartnerContent),
            "proprietary-content" => Ok(Self::ProprietaryContent),
            other => Err(CoreError::InvalidPillar(other.to_owned())),
        }
    }
}

/// Where a pitch came from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PitchOrigin {
    #[default]
    Manual,
    Automated,
}

impl PitchOrigin {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Manual => "manual",
            Self::Automated => "automated",
        }
    }
}

impl FromStr for PitchOrigin {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "automated" => Ok(Self::Automated),
            other => Err(CoreError::InvalidOrigin(other.to_owned())),
        }
    }
}

/// The human-editable fields of a pitch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchContent {
    pub pillar: Option<Pillar>,
    pub category: String,
    pub topic: Option<String>,
    pub main_seo_keyword: Option<String>,
    pub suggested_pitch: String,
}

impl PitchContent {
    #[must_use]
    pub fn new(category: impl Into<String>, suggested_pitch: impl Into<String>) -> Self {
        Self {
            pillar: None,
            category: category.into(),
            topic: None,
            main_seo_keyword: None,
            suggested_pitch: suggested_pitch.into(),
        }
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

    #[must_use]
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.main_seo_keyword = Some(keyword.into());
        self
    }

    /// Trims every field, turns blank optionals into `None` and rejects a
    /// blank category or pitch text.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidInput` when a required field is blank.
    pub fn validated(self) -> Result<Self, CoreError> {
        let category = self.category.trim().to_owned();
        let suggested_pitch = self.suggested_pitch.trim().to_owned();
        if category.is_empty() {
            return Err(CoreError::InvalidInput("category must not be empty".to_owned()));
        }
        if suggested_pitch.is_empty() {
            return Err(CoreError::InvalidInput("suggested pitch must not be empty".to_owned()));
        }
        Ok(Self {
            pillar: self.pillar,
            category,
            topic: non_blank(self.topic),
            main_seo_keyword: non_blank(self.main_seo_keyword),
            suggested_pitch,
        })
    }
}

/// Partial update of a pitch's content. `Some("")` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchEdit {
    pub pillar: Option<Pillar>,
    pub category: Option<String>,
    pub topic: Option<String>,
    pub main_seo_keyword: Option<String>,
    pub suggested_pitch: Option<String>,
}

impl PitchEdit {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pillar.is_none()
            && self.category.is_none()
            && self.topic.is_none()
            && self.main_seo_keyword.is_none()
            && self.suggested_pitch.is_none()
    }

    /// Produces the content that results from applying this edit to `pitch`.
    ///
    /// # Errors
    /// Returns `CoreError::NotEditable` unless the pitch is pending, or
    /// `CoreError::InvalidInput` when the result misses a required field.
    pub fn apply(&self, pitch: &Pitch) -> Result<PitchContent, CoreError> {
        if !pitch.status.is_editable() {
            return Err(CoreError::NotEditable(pitch.status));
        }
        let mut content = pitch.content();
        if let Some(pillar) = self.pillar {
            content.pillar = Some(pillar);
        }
        if let Some(category) = &self.category {
            content.category.clone_from(category);
        }
        if let Some(topic) = &self.topic {
            content.topic = Some(topic.clone());
        }
        if let Some(keyword) = &self.main_seo_keyword {
            content.main_seo_keyword = Some(keyword.clone());
        }
        if let Some(text) = &self.suggested_pitch {
            content.suggested_pitch.clone_from(text);
        }
        content.validated()
    }
}

/// A stored pitch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pitch {
    pub id: i64,
    pub pillar: Option<Pillar>,
    pub category: String,
    pub topic: Option<String>,
    pub main_seo_keyword: Option<String>,
    pub suggested_pitch: String,
    pub origin: PitchOrigin,
    pub status: PitchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pitch {
    #[must_use]
    pub fn content(&self) -> PitchContent {
        PitchContent {
            pillar: self.pillar,
            category: self.category.clone(),
            topic: self.topic.clone(),
            main_seo_keyword: self.main_seo_keyword.clone(),
            suggested_pitch: self.suggested_pitch.clone(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

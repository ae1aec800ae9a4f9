//! Picks the most specific prompt template for a pitch and renders it.

use std::sync::Arc;

use storyflow_core::{Pitch, PromptTemplate, PromptTier, ResolvedPrompt, render_template};
use storyflow_storage::StorageBackend;
use storyflow_storage::traits::PromptTemplateStore;

use crate::ServiceError;

pub struct PromptResolver {
    storage: Arc<StorageBackend>,
    default_prompt: Option<String>,
}

fn lookup_topic(pitch: &Pitch) -> Option<&str> {
    pitch.topic.as_deref().map(str::trim).filter(|t| !t.is_empty())
}

/// Applies the tier rules to candidate templates.
///
/// `topic_matches` are templates for the pitch's (category, topic);
/// `category_matches` are templates for its category with no topic. Both
/// are expected in ascending id order.
pub(crate) fn select_template<'a>(
    pitch: &Pitch,
    topic_matches: &'a [PromptTemplate],
    category_matches: &'a [PromptTemplate],
) -> Option<(&'a PromptTemplate, PromptTier)> {
    if lookup_topic(pitch).is_some() {
        if let Some(pillar) = pitch.pillar {
            if let Some(exact) = topic_matches.iter().find(|t| t.pillar == Some(pillar)) {
                return Some((exact, PromptTier::Exact));
            }
        }
        let by_topic = topic_matches
            .iter()
            .find(|t| t.pillar.is_none())
            .or_else(|| topic_matches.first());
        if let Some(template) = by_topic {
            return Some((template, PromptTier::CategoryTopic));
        }
    }

    let same_pillar =
        pitch.pillar.and_then(|pillar| category_matches.iter().find(|t| t.pillar == Some(pillar)));
    same_pillar
        .or_else(|| category_matches.iter().find(|t| t.pillar.is_none()))
        .or_else(|| category_matches.first())
        .map(|template| (template, PromptTier::Category))
}

impl PromptResolver {
    #[must_use]
    pub fn new(storage: Arc<StorageBackend>, default_prompt: Option<String>) -> Self {
        let default_prompt = default_prompt.filter(|p| !p.trim().is_empty());
        Self { storage, default_prompt }
    }

    /// Returns `None` when no template applies and no default is configured.
    pub async fn resolve(&self, pitch: &Pitch) -> Result<Option<ResolvedPrompt>, ServiceError> {
        let topic_matches = match lookup_topic(pitch) {
            Some(topic) => self.storage.find_templates(&pitch.category, Some(topic)).await?,
            None => Vec::new(),
        };
        let category_matches = self.storage.find_templates(&pitch.category, None).await?;

        let (text, tier, template_id) =
            match select_template(pitch, &topic_matches, &category_matches) {
                Some((template, tier)) => (template.prompt.as_str(), tier, Some(template.id)),
                None => match self.default_prompt.as_deref() {
                    Some(default) => (default, PromptTier::Default, None),
                    None => return Ok(None),
                },
            };

        let rendered = render_template(text, pitch);
        if !rendered.missing.is_empty() {
            tracing::warn!(
                pitch_id = pitch.id,
                template_id,
                missing = ?rendered.missing,
                "prompt rendered with missing placeholders"
            );
        }
        tracing::debug!(pitch_id = pitch.id, %tier, template_id, "prompt resolved");
        Ok(Some(ResolvedPrompt { text: rendered.text, tier, template_id, missing: rendered.missing }))
    }
}

use std::sync::Arc;

use storyflow_core::{NewPromptTemplate, PromptTemplate, ResolvedPrompt};
use storyflow_storage::StorageBackend;
use storyflow_storage::traits::{PitchStore, PromptTemplateStore};

use crate::{PromptResolver, ServiceError};

/// Template administration plus a preview of what a pitch would be sent.
pub struct PromptService {
    storage: Arc<StorageBackend>,
    resolver: PromptResolver,
}

impl PromptService {
    #[must_use]
    pub fn new(storage: Arc<StorageBackend>, default_prompt: Option<String>) -> Self {
        let resolver = PromptResolver::new(Arc::clone(&storage), default_prompt);
        Self { storage, resolver }
    }

    pub async fn create_template(
        &self,
        template: NewPromptTemplate,
    ) -> Result<PromptTemplate, ServiceError> {
        let template = template.validated()?;
        let created = self.storage.create_template(&template).await?;
        tracing::info!(
            template_id = created.id,
            category = %created.category,
            topic = ?created.topic,
            pillar = ?created.pillar,
            "prompt template created"
        );
        Ok(created)
    }

    pub async fn list_templates(&self) -> Result<Vec<PromptTemplate>, ServiceError> {
        Ok(self.storage.list_templates().await?)
    }

    pub async fn delete_template(&self, id: i64) -> Result<(), ServiceError> {
        if self.storage.delete_template(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound { entity: "prompt template", id })
        }
    }

    pub async fn preview(&self, pitch_id: i64) -> Result<Option<ResolvedPrompt>, ServiceError> {
        let pitch = self
            .storage
            .get_pitch(pitch_id)
            .await?
            .ok_or(ServiceError::NotFound { entity: "pitch", id: pitch_id })?;
        self.resolver.resolve(&pitch).await
    }
}

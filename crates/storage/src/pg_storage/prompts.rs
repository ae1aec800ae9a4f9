//! PromptTemplateStore implementation for PgStorage.

use async_trait::async_trait;
use storyflow_core::NewPromptTemplate;

use super::*;
use crate::traits::PromptTemplateStore;

#[async_trait]
impl PromptTemplateStore for PgStorage {
    async fn create_template(
        &self,
        template: &NewPromptTemplate,
    ) -> Result<PromptTemplate, StorageError> {
        let now = Utc::now().timestamp();
        let row = sqlx::query(&format!(
            "INSERT INTO prompt_templates
               (pillar, category, topic, prompt, created_at_epoch, updated_at_epoch)
               VALUES ($1, $2, $3, $4, $5, $5)
               RETURNING {TEMPLATE_COLUMNS}"
        ))
        .bind(template.pillar.map(|p| p.as_str()))
        .bind(&template.category)
        .bind(&template.topic)
        .bind(&template.prompt)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        row_to_template(&row)
    }

    async fn get_template(&self, id: i64) -> Result<Option<PromptTemplate>, StorageError> {
        let row =
            sqlx::query(&format!("SELECT {TEMPLATE_COLUMNS} FROM prompt_templates WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.as_ref().map(row_to_template).transpose()
    }

    async fn list_templates(&self) -> Result<Vec<PromptTemplate>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM prompt_templates
               ORDER BY category, topic NULLS FIRST, pillar NULLS FIRST, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_template).collect()
    }

    async fn find_templates(
        &self,
        category: &str,
        topic: Option<&str>,
    ) -> Result<Vec<PromptTemplate>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM prompt_templates
               WHERE category = $1 AND topic IS NOT DISTINCT FROM $2
               ORDER BY id ASC"
        ))
        .bind(category)
        .bind(topic)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_template).collect()
    }

    async fn delete_template(&self, id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM prompt_templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

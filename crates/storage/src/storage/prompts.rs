use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use storyflow_core::{NewPromptTemplate, Pillar, PromptTemplate};

use super::{Storage, from_epoch, get_conn, log_row_error, parse_opt_column};
use crate::error::StorageError;

const TEMPLATE_COLUMNS: &str =
    "id, pillar, category, topic, prompt, created_at_epoch, updated_at_epoch";

fn row_to_template(row: &rusqlite::Row<'_>) -> rusqlite::Result<PromptTemplate> {
    Ok(PromptTemplate {
        id: row.get(0)?,
        pillar: parse_opt_column::<Pillar>(row.get(1)?)?,
        category: row.get(2)?,
        topic: row.get(3)?,
        prompt: row.get(4)?,
        created_at: from_epoch(row.get(5)?),
        updated_at: from_epoch(row.get(6)?),
    })
}

impl Storage {
    /// # Errors
    /// Returns `Duplicate` when the (pillar, category, topic) key is taken.
    pub fn create_template(
        &self,
        template: &NewPromptTemplate,
    ) -> Result<PromptTemplate, StorageError> {
        let conn = get_conn(&self.pool)?;
        let now = Utc::now().timestamp();
        conn.execute(
            "INSERT INTO prompt_templates
               (pillar, category, topic, prompt, created_at_epoch, updated_at_epoch)
               VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                template.pillar.map(|p| p.as_str()),
                template.category,
                template.topic,
                template.prompt,
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        self.get_template(id)?
            .ok_or_else(|| StorageError::NotFound { entity: "prompt_template", id: id.to_string() })
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn get_template(&self, id: i64) -> Result<Option<PromptTemplate>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM prompt_templates WHERE id = ?1");
        Ok(conn.query_row(&sql, params![id], row_to_template).optional()?)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn list_templates(&self) -> Result<Vec<PromptTemplate>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let sql = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM prompt_templates ORDER BY category, topic, pillar, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let templates =
            stmt.query_map([], row_to_template)?.filter_map(log_row_error).collect();
        Ok(templates)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn find_templates(
        &self,
        category: &str,
        topic: Option<&str>,
    ) -> Result<Vec<PromptTemplate>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let sql = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM prompt_templates
               WHERE category = ?1 AND topic IS ?2
               ORDER BY id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let templates = stmt
            .query_map(params![category, topic], row_to_template)?
            .filter_map(log_row_error)
            .collect();
        Ok(templates)
    }

    /// # Errors
    /// Returns error if database delete fails.
    pub fn delete_template(&self, id: i64) -> Result<bool, StorageError> {
        let conn = get_conn(&self.pool)?;
        let affected = conn.execute("DELETE FROM prompt_templates WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

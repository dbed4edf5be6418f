// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Favourites, templates and the agent message queue.

use rusqlite::{params, OptionalExtension, Row};

use mh_core::{
    AgentMessage, AgentRole, DomainEvent, Favorite, FavoriteId, MessageId, TaskTemplate, TemplateId,
};

use crate::{Store, StoreError};

impl Store {
    pub fn save_favorite(&self, favorite: &Favorite) -> Result<(), StoreError> {
        let updated_at = self.next_stamp() as i64;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO favorites (id, kind, ref_id, label, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    favorite.id.as_str(),
                    favorite.kind,
                    favorite.ref_id,
                    favorite.label,
                    favorite.created_at as i64,
                    updated_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn favorites(&self) -> Result<Vec<Favorite>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM favorites ORDER BY created_at")?;
            let rows = stmt.query_map([], row_to_favorite)?;
            let mut favorites = Vec::new();
            for row in rows {
                favorites.push(row?);
            }
            Ok(favorites)
        })
    }

    pub fn delete_favorite(&self, id: &FavoriteId) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM favorites WHERE id = ?1", params![id.as_str()])?;
            Ok(n > 0)
        })
    }

    pub fn save_template(&self, template: &TaskTemplate) -> Result<(), StoreError> {
        let updated_at = self.next_stamp() as i64;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO templates
                    (id, name, description, details, role, built_in, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    template.id.as_str(),
                    template.name,
                    template.description,
                    template.details,
                    template.role.map(|r| r.as_str()),
                    template.built_in,
                    template.created_at as i64,
                    updated_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn template(&self, id: &TemplateId) -> Result<Option<TaskTemplate>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM templates WHERE id = ?1",
                params![id.as_str()],
                row_to_template,
            )
            .optional()
            .map_err(StoreError::from)
        })
    }

    pub fn templates(&self) -> Result<Vec<TaskTemplate>, StoreError> {
        self.query_templates("SELECT * FROM templates ORDER BY created_at", params![])
    }

    pub fn templates_for_role(&self, role: AgentRole) -> Result<Vec<TaskTemplate>, StoreError> {
        self.query_templates(
            "SELECT * FROM templates WHERE role = ?1 ORDER BY created_at",
            params![role.as_str()],
        )
    }

    fn query_templates(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<TaskTemplate>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params, row_to_template)?;
            let mut templates = Vec::new();
            for row in rows {
                templates.push(row?);
            }
            Ok(templates)
        })
    }

    /// Deletes a template unless it is built-in; returns whether a row
    /// was removed.
    pub fn delete_template(&self, id: &TemplateId) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM templates WHERE id = ?1 AND built_in = 0",
                params![id.as_str()],
            )?;
            Ok(n > 0)
        })
    }

    /// Seed built-in templates once.
    pub fn seed_templates(&self, templates: &[TaskTemplate]) -> Result<(), StoreError> {
        let existing: i64 = self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM templates WHERE built_in = 1", [], |row| {
                row.get(0)
            })
            .map_err(StoreError::from)
        })?;
        if existing > 0 {
            return Ok(());
        }
        for template in templates {
            self.save_template(template)?;
        }
        Ok(())
    }

    /// Queue a message for its recipient; fires `agent.message`.
    pub fn post_message(&self, message: &AgentMessage) -> Result<(), StoreError> {
        let updated_at = self.next_stamp() as i64;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO agent_messages
                    (id, from_agent, to_agent, content, ts, read, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    message.id.as_str(),
                    message.from.as_str(),
                    message.to.as_str(),
                    message.content,
                    message.ts as i64,
                    message.read,
                    updated_at,
                ],
            )?;
            Ok(())
        })?;
        self.publish(DomainEvent::AgentMessagePosted { message: message.clone() });
        Ok(())
    }

    /// Unread messages queued for a recipient, oldest first.
    pub fn unread_messages(&self, to_agent: &str) -> Result<Vec<AgentMessage>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM agent_messages WHERE to_agent = ?1 AND read = 0 ORDER BY ts",
            )?;
            let rows = stmt.query_map(params![to_agent], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
    }

    pub fn mark_messages_read(&self, to_agent: &str) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE agent_messages SET read = 1 WHERE to_agent = ?1 AND read = 0",
                params![to_agent],
            )?;
            Ok(n)
        })
    }
}

fn row_to_favorite(row: &Row<'_>) -> rusqlite::Result<Favorite> {
    Ok(Favorite {
        id: FavoriteId::from_string(row.get::<_, String>("id")?),
        kind: row.get("kind")?,
        ref_id: row.get("ref_id")?,
        label: row.get("label")?,
        created_at: row.get::<_, i64>("created_at")? as u64,
    })
}

fn row_to_template(row: &Row<'_>) -> rusqlite::Result<TaskTemplate> {
    let role: Option<String> = row.get("role")?;
    Ok(TaskTemplate {
        id: TemplateId::from_string(row.get::<_, String>("id")?),
        name: row.get("name")?,
        description: row.get("description")?,
        details: row.get("details")?,
        role: role.as_deref().and_then(AgentRole::parse),
        built_in: row.get("built_in")?,
        created_at: row.get::<_, i64>("created_at")? as u64,
    })
}

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<AgentMessage> {
    Ok(AgentMessage {
        id: MessageId::from_string(row.get::<_, String>("id")?),
        from: row.get::<_, String>("from_agent")?.into(),
        to: row.get::<_, String>("to_agent")?.into(),
        content: row.get("content")?,
        ts: row.get::<_, i64>("ts")? as u64,
        read: row.get("read")?,
    })
}

#[cfg(test)]
#[path = "misc_tests.rs"]
mod tests;

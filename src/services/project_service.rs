use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::project::{Project, ProjectSummary};
use crate::services::project_cache::ProjectCache;

const PROJECT_COLUMNS: &str =
    "id, user_id, name, code, subject, topic, created_at, updated_at";

pub struct NewProject {
    pub name: String,
    pub code: String,
    pub subject: Option<String>,
    pub topic: Option<String>,
}

/// Per-user document store. Every query is scoped by `user_id`, so another
/// user's project id behaves exactly like a missing one.
#[derive(Clone)]
pub struct ProjectService {
    pool: PgPool,
    cache: ProjectCache,
}

fn not_found() -> Error {
    Error::NotFound("Project not found".to_string())
}

impl ProjectService {
    pub fn new(pool: PgPool, cache: ProjectCache) -> Self {
        Self { pool, cache }
    }

    pub async fn create(&self, user_id: Uuid, new: NewProject) -> Result<Project> {
        let query = format!(
            r#"INSERT INTO projects (id, user_id, name, code, subject, topic)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {}"#,
            PROJECT_COLUMNS
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&new.name)
            .bind(&new.code)
            .bind(&new.subject)
            .bind(&new.topic)
            .fetch_one(&self.pool)
            .await?;

        self.cache.upsert(user_id, ProjectSummary::from(&project));
        tracing::info!(project_id = %project.id, %user_id, "project created");
        Ok(project)
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<ProjectSummary>> {
        if let Some(items) = self.cache.get(user_id) {
            return Ok(items);
        }

        let loaded_at = self.cache.version(user_id);
        let items = sqlx::query_as::<_, ProjectSummary>(
            r#"SELECT id, name, subject, topic, created_at, updated_at
               FROM projects
               WHERE user_id = $1
               ORDER BY updated_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.cache.fill(user_id, items.clone(), loaded_at);
        Ok(items)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Project> {
        let query = format!(
            "SELECT {} FROM projects WHERE id = $1 AND user_id = $2",
            PROJECT_COLUMNS
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(not_found)
    }

    /// Replaces the document source and moves the project to the top of the
    /// listing.
    pub async fn save_code(&self, user_id: Uuid, id: Uuid, code: &str) -> Result<Project> {
        let query = format!(
            r#"UPDATE projects SET code = $3, updated_at = NOW()
               WHERE id = $1 AND user_id = $2
               RETURNING {}"#,
            PROJECT_COLUMNS
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(user_id)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(not_found)?;

        self.cache.upsert(user_id, ProjectSummary::from(&project));
        Ok(project)
    }

    /// Renames without touching the date; the listing order is unchanged.
    pub async fn rename(&self, user_id: Uuid, id: Uuid, name: &str) -> Result<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::BadRequest("Name must not be empty".to_string()));
        }

        let query = format!(
            r#"UPDATE projects SET name = $3
               WHERE id = $1 AND user_id = $2
               RETURNING {}"#,
            PROJECT_COLUMNS
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(user_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(not_found)?;

        self.cache.upsert(user_id, ProjectSummary::from(&project));
        Ok(project)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(not_found());
        }
        self.cache.remove(user_id, id);
        tracing::info!(project_id = %id, %user_id, "project deleted");
        Ok(())
    }
}

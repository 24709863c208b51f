use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::project::{Project, ProjectSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            name: p.name,
            code: p.code,
            subject: p.subject,
            topic: p.topic,
            date: p.updated_at,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummaryResponse {
    pub id: Uuid,
    pub name: String,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub date: DateTime<Utc>,
}

impl From<ProjectSummary> for ProjectSummaryResponse {
    fn from(p: ProjectSummary) -> Self {
        Self {
            id: p.id,
            name: p.name,
            subject: p.subject,
            topic: p.topic,
            date: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectListResponse {
    pub items: Vec<ProjectSummaryResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedProjectResponse {
    pub project: ProjectResponse,
    pub question_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveCodePayload {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameProjectPayload {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewPayload {
    pub code: String,
}

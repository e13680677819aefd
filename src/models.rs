//! Project records as stored in the registry and returned by the API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    /// Soft-deleted: the row stays, the project is hidden.
    Deleted,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ProjectStatus::Active),
            "deleted" => Some(ProjectStatus::Deleted),
            _ => None,
        }
    }
}

/// A registered project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub repository_url: String,
    pub branch_name: String,
    pub creator: Option<String>,
    pub status: ProjectStatus,
    pub has_repository: bool,
    pub has_documentation: bool,
    pub created_at: String, // ISO8601
    pub updated_at: String, // ISO8601
}

/// Input for registering a project.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub repository_url: String,
    pub branch_name: Option<String>,
    pub creator: Option<String>,
}

impl NewProject {
    pub fn description_or_default(&self) -> String {
        self.description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("Brief description of {}", self.title))
    }
}

/// Aggregate counts over the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_projects: i64,
    pub active_projects: i64,
    pub deleted_projects: i64,
    pub projects_with_repo: i64,
    pub projects_with_docs: i64,
}

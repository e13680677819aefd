//! Project registry backed by SQLite.
//!
//! Records are soft-deleted: deleting flips `status` to `deleted`, and
//! registering the same slug again revives the row in place.

use anyhow::{bail, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use crate::models::{NewProject, Project, ProjectStats, ProjectStatus};
use crate::slug::generate_slug;

/// File the init script leaves in a project's docs directory once the
/// repository has been processed.
pub const DIGEST_FILE: &str = "digest.txt";

#[derive(Clone)]
pub struct ProjectStore {
    pool: SqlitePool,
}

const COLUMNS: &str = "id, title, slug, description, repository_url, branch_name, creator, \
     status, has_repository, has_documentation, created_at, updated_at";

impl ProjectStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: &NewProject, default_branch: &str) -> Result<Project> {
        let slug = generate_slug(&input.title);
        if slug.is_empty() {
            bail!("project title '{}' does not produce a usable slug", input.title);
        }

        let existing = self.find_by_slug(&slug).await?;
        if existing
            .as_ref()
            .is_some_and(|p| p.status == ProjectStatus::Active)
        {
            bail!("Project with slug \"{}\" already exists", slug);
        }

        let now = chrono::Utc::now().timestamp();
        let branch = input
            .branch_name
            .clone()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| default_branch.to_string());

        if existing.is_some() {
            sqlx::query(
                r#"
                UPDATE projects
                SET title = ?, description = ?, repository_url = ?, branch_name = ?,
                    creator = ?, status = 'active', has_repository = 0,
                    has_documentation = 0, created_at = ?, updated_at = ?
                WHERE slug = ?
                "#,
            )
            .bind(&input.title)
            .bind(input.description_or_default())
            .bind(&input.repository_url)
            .bind(&branch)
            .bind(&input.creator)
            .bind(now)
            .bind(now)
            .bind(&slug)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                r#"
                INSERT INTO projects (title, slug, description, repository_url, branch_name,
                                      creator, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&input.title)
            .bind(&slug)
            .bind(input.description_or_default())
            .bind(&input.repository_url)
            .bind(&branch)
            .bind(&input.creator)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await?;
        }

        match self.find_by_slug(&slug).await? {
            Some(project) => Ok(project),
            None => bail!("project '{}' vanished after insert", slug),
        }
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        let row = sqlx::query(&format!("SELECT {} FROM projects WHERE slug = ?", COLUMNS))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(project_from_row).transpose()
    }

    /// Projects with `status`, newest first.
    pub async fn list(
        &self,
        status: ProjectStatus,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Project>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM projects WHERE status = ? \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            COLUMNS
        ))
        .bind(status.as_str())
        .bind(limit.unwrap_or(-1))
        .bind(offset.unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(project_from_row).collect()
    }

    /// Case-insensitive substring match over title, description and slug.
    pub async fn search(
        &self,
        term: &str,
        status: ProjectStatus,
        limit: i64,
    ) -> Result<Vec<Project>> {
        let pattern = format!("%{}%", escape_like(term));
        let rows = sqlx::query(&format!(
            "SELECT {} FROM projects WHERE status = ? \
             AND (title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\' OR slug LIKE ? ESCAPE '\\') \
             ORDER BY created_at DESC, id DESC LIMIT ?",
            COLUMNS
        ))
        .bind(status.as_str())
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(project_from_row).collect()
    }

    pub async fn set_status(&self, slug: &str, status: ProjectStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE projects SET status = ?, updated_at = ? WHERE slug = ?")
            .bind(status.as_str())
            .bind(chrono::Utc::now().timestamp())
            .bind(slug)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn soft_delete(&self, slug: &str) -> Result<bool> {
        self.set_status(slug, ProjectStatus::Deleted).await
    }

    pub async fn hard_delete(&self, slug: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE slug = ?")
            .bind(slug)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Refresh `has_repository` / `has_documentation` from the site tree.
    pub async fn sync_filesystem_status(
        &self,
        slug: &str,
        site_root: &Path,
    ) -> Result<(bool, bool)> {
        let doc_dir = site_root.join(slug);
        let has_repository = doc_dir.join(DIGEST_FILE).exists();
        let has_documentation = doc_dir.exists();

        sqlx::query(
            "UPDATE projects SET has_repository = ?, has_documentation = ?, updated_at = ? WHERE slug = ?",
        )
        .bind(has_repository)
        .bind(has_documentation)
        .bind(chrono::Utc::now().timestamp())
        .bind(slug)
        .execute(&self.pool)
        .await?;

        Ok((has_repository, has_documentation))
    }

    pub async fn statistics(&self) -> Result<ProjectStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_projects,
                COUNT(CASE WHEN status = 'active' THEN 1 END) AS active_projects,
                COUNT(CASE WHEN status = 'deleted' THEN 1 END) AS deleted_projects,
                COUNT(CASE WHEN has_repository = 1 THEN 1 END) AS projects_with_repo,
                COUNT(CASE WHEN has_documentation = 1 THEN 1 END) AS projects_with_docs
            FROM projects
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ProjectStats {
            total_projects: row.try_get("total_projects")?,
            active_projects: row.try_get("active_projects")?,
            deleted_projects: row.try_get("deleted_projects")?,
            projects_with_repo: row.try_get("projects_with_repo")?,
            projects_with_docs: row.try_get("projects_with_docs")?,
        })
    }
}

fn project_from_row(row: &SqliteRow) -> Result<Project> {
    let status: String = row.try_get("status")?;
    let created_at: i64 = row.try_get("created_at")?;
    let updated_at: i64 = row.try_get("updated_at")?;

    Ok(Project {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        repository_url: row.try_get("repository_url")?,
        branch_name: row.try_get("branch_name")?,
        creator: row.try_get("creator")?,
        status: ProjectStatus::parse(&status).unwrap_or(ProjectStatus::Active),
        has_repository: row.try_get("has_repository")?,
        has_documentation: row.try_get("has_documentation")?,
        created_at: format_ts_iso(created_at),
        updated_at: format_ts_iso(updated_at),
    })
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}

//! Project lifecycle: create and delete a whole project.
//!
//! Creating a project runs the workspace initialization script, records the
//! project in the registry and wires it into the site configuration. Deleting
//! moves its directories into a timestamped backup, soft-deletes the record
//! and unwires it.
//!
//! Site configuration failures never undo the filesystem or registry work.
//! They come back as warnings on the outcome instead.

use regex::Regex;
use serde::Serialize;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backup::file_timestamp;
use crate::config::Config;
use crate::models::{NewProject, Project, ProjectStats, ProjectStatus};
use crate::mutator::{ConfigMutator, MutationReport};
use crate::projects::ProjectStore;
use crate::slug::generate_slug;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Timeout(String),
    #[error("{message}")]
    ScriptFailed {
        message: String,
        stdout: String,
        stderr: String,
    },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Upper bound on one search page.
pub const MAX_SEARCH_RESULTS: i64 = 100;

#[derive(Debug, Clone, Default)]
pub struct CreateProjectRequest {
    pub title: String,
    pub repository_url: String,
    pub branch_name: Option<String>,
    pub description: Option<String>,
    pub creator: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleOutcome {
    pub project: Project,
    pub script_output: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub slug: String,
    pub backup: PathBuf,
    pub moved_repository: bool,
    pub moved_documentation: bool,
    pub warnings: Vec<String>,
}

pub struct ProjectLifecycle {
    config: Arc<Config>,
    store: ProjectStore,
    mutator: Arc<ConfigMutator>,
}

impl ProjectLifecycle {
    pub fn new(config: Arc<Config>, pool: SqlitePool) -> Self {
        let mutator = Arc::new(ConfigMutator::new(config.site_layout()));
        Self {
            config,
            store: ProjectStore::new(pool),
            mutator,
        }
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub async fn create_project(
        &self,
        request: CreateProjectRequest,
    ) -> LifecycleResult<LifecycleOutcome> {
        let title = request.title.trim();
        let url = request.repository_url.trim();
        if title.is_empty() || url.is_empty() {
            return Err(LifecycleError::InvalidRequest(
                "Project title and repository URL are required".to_string(),
            ));
        }
        if !is_valid_repository_url(url) {
            return Err(LifecycleError::InvalidRequest(
                "Please provide a valid repository URL (http://, https://, \
                 git@host:user/repo.git, or ssh://git@host/path/repo.git)"
                    .to_string(),
            ));
        }

        let slug = generate_slug(title);
        if slug.is_empty() {
            return Err(LifecycleError::InvalidRequest(format!(
                "Project title '{}' must contain letters or digits",
                title
            )));
        }
        if let Some(existing) = self.store.find_by_slug(&slug).await? {
            if existing.status == ProjectStatus::Active {
                return Err(LifecycleError::Conflict(format!(
                    "A project with slug '{}' already exists",
                    slug
                )));
            }
        }

        let input = NewProject {
            title: title.to_string(),
            description: request.description.clone(),
            repository_url: url.to_string(),
            branch_name: request.branch_name.clone(),
            creator: request.creator.clone(),
        };
        let branch = input
            .branch_name
            .clone()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| self.config.workspace.default_branch.clone());

        let script_output = self
            .run_init_script(title, url, &branch, &input.description_or_default())
            .await?;
        info!(slug = %slug, "initialization script finished");

        self.store
            .create(&input, &self.config.workspace.default_branch)
            .await?;
        self.store
            .sync_filesystem_status(&slug, &self.config.site.root)
            .await?;

        let mut warnings = Vec::new();
        let mutator = self.mutator.clone();
        let owned_title = title.to_string();
        let report = tokio::task::spawn_blocking(move || mutator.add_project(&owned_title)).await;
        collect_mutation_warnings(report, "update", &mut warnings);

        let project = match self.store.find_by_slug(&slug).await? {
            Some(project) => project,
            None => {
                return Err(LifecycleError::Internal(anyhow::anyhow!(
                    "project '{}' missing after create",
                    slug
                )))
            }
        };

        Ok(LifecycleOutcome {
            project,
            script_output,
            warnings,
        })
    }

    pub async fn delete_project(&self, slug: &str) -> LifecycleResult<DeleteOutcome> {
        validate_slug(slug)?;

        let repo_path = self.config.workspace.repositories.join(slug);
        let doc_path = self.config.site.root.join(slug);
        let record = self.store.find_by_slug(slug).await?;
        let active = record
            .as_ref()
            .is_some_and(|p| p.status == ProjectStatus::Active);

        if !repo_path.exists() && !doc_path.exists() && !active {
            return Err(LifecycleError::NotFound("Project not found".to_string()));
        }

        let backup = self.config.workspace.backups.join(format!(
            "{}_deleted_{}",
            slug,
            file_timestamp(chrono::Utc::now())
        ));
        std::fs::create_dir_all(&backup).map_err(|e| {
            anyhow::anyhow!("failed to create backup dir {}: {}", backup.display(), e)
        })?;

        let moved_repository = move_into(&repo_path, &backup.join("repository"))?;
        let moved_documentation = move_into(&doc_path, &backup.join("documentation"))?;
        info!(
            slug = %slug,
            backup = %backup.display(),
            moved_repository,
            moved_documentation,
            "project directories moved to backup"
        );

        if record.is_some() {
            self.store.soft_delete(slug).await?;
        }

        let mut warnings = Vec::new();
        let mutator = self.mutator.clone();
        let owned_slug = slug.to_string();
        let report =
            tokio::task::spawn_blocking(move || mutator.remove_project(&owned_slug)).await;
        collect_mutation_warnings(report, "remove from", &mut warnings);

        Ok(DeleteOutcome {
            slug: slug.to_string(),
            backup,
            moved_repository,
            moved_documentation,
            warnings,
        })
    }

    /// Active projects, newest first, with filesystem flags refreshed.
    pub async fn list_projects(&self) -> LifecycleResult<Vec<Project>> {
        let projects = self.store.list(ProjectStatus::Active, None, None).await?;
        for project in &projects {
            self.store
                .sync_filesystem_status(&project.slug, &self.config.site.root)
                .await?;
        }
        Ok(self.store.list(ProjectStatus::Active, None, None).await?)
    }

    /// Active projects whose title, description or slug contains `term`.
    pub async fn search_projects(&self, term: &str, limit: i64) -> LifecycleResult<Vec<Project>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(LifecycleError::InvalidRequest(
                "Search term is required".to_string(),
            ));
        }
        Ok(self
            .store
            .search(term, ProjectStatus::Active, limit.clamp(1, MAX_SEARCH_RESULTS))
            .await?)
    }

    /// Drop the registry record of a deleted project, freeing it from the
    /// statistics. Active projects have to be deleted first.
    pub async fn purge_project(&self, slug: &str) -> LifecycleResult<()> {
        validate_slug(slug)?;
        match self.store.find_by_slug(slug).await? {
            None => Err(LifecycleError::NotFound("Project not found".to_string())),
            Some(p) if p.status == ProjectStatus::Active => Err(LifecycleError::Conflict(format!(
                "Project \"{}\" is still active; delete it first",
                slug
            ))),
            Some(_) => {
                self.store.hard_delete(slug).await?;
                info!(slug = %slug, "registry record purged");
                Ok(())
            }
        }
    }

    pub async fn statistics(&self) -> LifecycleResult<ProjectStats> {
        Ok(self.store.statistics().await?)
    }

    async fn run_init_script(
        &self,
        title: &str,
        url: &str,
        branch: &str,
        description: &str,
    ) -> LifecycleResult<String> {
        let workspace = &self.config.workspace;
        let script = &workspace.init_script;
        let cwd = workspace
            .script_cwd
            .clone()
            .or_else(|| script.parent().map(Path::to_path_buf))
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("."));

        debug!(script = %script.display(), cwd = %cwd.display(), title, "running initialization script");

        let child = tokio::process::Command::new("bash")
            .arg(script)
            .arg(title)
            .arg(url)
            .arg(branch)
            .arg(description)
            .current_dir(&cwd)
            .kill_on_drop(true)
            .output();

        let limit = Duration::from_secs(workspace.script_timeout_secs);
        let output = match tokio::time::timeout(limit, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(LifecycleError::Internal(anyhow::anyhow!(
                    "failed to run {}: {}",
                    script.display(),
                    e
                )))
            }
            Err(_) => {
                warn!(title, secs = workspace.script_timeout_secs, "initialization script timed out");
                return Err(LifecycleError::Timeout(
                    "Operation timed out. The repository might be too large or network is slow."
                        .to_string(),
                ));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if output.status.success() {
            return Ok(stdout.trim().to_string());
        }

        warn!(title, status = ?output.status.code(), "initialization script failed");
        Err(classify_script_failure(stdout, stderr))
    }
}

fn collect_mutation_warnings(
    report: Result<crate::error::MutatorResult<MutationReport>, tokio::task::JoinError>,
    action: &str,
    warnings: &mut Vec<String>,
) {
    match report {
        Ok(Ok(report)) => {
            warnings.extend(report.warnings.iter().map(|w| w.to_string()));
        }
        Ok(Err(e)) => {
            warn!(error = %e, "failed to {} site config", action);
            warnings.push(format!("Failed to {} site config: {}", action, e));
        }
        Err(e) => {
            warnings.push(format!("Site config task failed: {}", e));
        }
    }
}

/// A slug names a directory under the workspace and site roots, so it must
/// be its own slug.
fn validate_slug(slug: &str) -> LifecycleResult<()> {
    if slug.is_empty() || generate_slug(slug) != slug {
        return Err(LifecycleError::InvalidRequest(format!(
            "'{}' is not a valid project slug",
            slug
        )));
    }
    Ok(())
}

/// HTTP(S) URLs, scp-style `git@host:path` and `ssh://git@...`.
pub fn is_valid_repository_url(url: &str) -> bool {
    static HTTP_RE: OnceLock<Regex> = OnceLock::new();
    static SSH_RE: OnceLock<Regex> = OnceLock::new();
    let http = HTTP_RE.get_or_init(|| Regex::new(r"^https?://.+").unwrap());
    let ssh = SSH_RE.get_or_init(|| Regex::new(r"^(git@[^:]+:.+|ssh://git@.+)").unwrap());
    http.is_match(url) || ssh.is_match(url)
}

/// Map a failed script run to an error from what it printed.
pub fn classify_script_failure(stdout: String, stderr: String) -> LifecycleError {
    let combined = format!("{}\n{}", stdout, stderr);

    if stdout.contains("Project workspace already exists") {
        LifecycleError::Conflict(
            "A project with this title already exists. Please choose a different project \
             title or delete the existing project first."
                .to_string(),
        )
    } else if stderr.contains("not a valid repository name")
        || stderr.contains("fatal: remote error")
    {
        LifecycleError::InvalidRequest(
            "Invalid repository URL. Please check that the repository exists and you have \
             access to it."
                .to_string(),
        )
    } else if combined.contains("git clone") || stderr.contains("Cloning into") {
        LifecycleError::InvalidRequest(
            "Failed to clone repository. Please check the repository URL and branch name."
                .to_string(),
        )
    } else if combined.contains("Permission denied") {
        LifecycleError::Forbidden(
            "Permission denied. Please check file permissions or repository access.".to_string(),
        )
    } else {
        let message = if !stdout.trim().is_empty() {
            stdout.trim().to_string()
        } else if !stderr.trim().is_empty() {
            stderr.trim().to_string()
        } else {
            "Failed to create project".to_string()
        };
        LifecycleError::ScriptFailed {
            message,
            stdout,
            stderr,
        }
    }
}

/// Rename `from` to `to` if `from` exists.
fn move_into(from: &Path, to: &Path) -> LifecycleResult<bool> {
    if !from.exists() {
        return Ok(false);
    }
    std::fs::rename(from, to).map_err(|e| {
        anyhow::anyhow!(
            "failed to move {} to {}: {}",
            from.display(),
            to.display(),
            e
        )
    })?;
    Ok(true)
}

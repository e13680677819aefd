//! CLI command implementations. Results go to stdout, diagnostics to the
//! tracing subscriber on stderr.

use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::db;
use crate::lifecycle::{CreateProjectRequest, ProjectLifecycle};
use crate::migrate::migrate_pool;
use crate::mutator::{ConfigMutator, MutationReport};
use crate::slug::title_from_slug;

pub fn run_add(config: &Config, title: &str) -> Result<()> {
    let mutator = ConfigMutator::new(config.site_layout());
    let report = mutator.add_project(title)?;
    print_report(&report);
    Ok(())
}

pub fn run_remove(config: &Config, slug: &str) -> Result<()> {
    let mutator = ConfigMutator::new(config.site_layout());
    let report = mutator.remove_project(slug)?;
    print_report(&report);
    Ok(())
}

pub fn run_nav(config: &Config) -> Result<()> {
    let mutator = ConfigMutator::new(config.site_layout());
    let projects = mutator.list_projects()?;

    if projects.is_empty() {
        println!("No projects in {}.", config.site.config_path().display());
        return Ok(());
    }

    println!("{:<30} {:<30} LABEL", "SLUG", "SIDEBAR");
    for project in projects {
        println!(
            "{:<30} {:<30} {}",
            project.slug,
            project.sidebar_id.as_deref().unwrap_or("-"),
            project
                .label
                .unwrap_or_else(|| format!("{} (no navbar item)", title_from_slug(&project.slug))),
        );
    }
    Ok(())
}

pub async fn run_create(
    config: &Config,
    title: &str,
    repo: &str,
    branch: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let lifecycle = open_lifecycle(config).await?;
    let outcome = lifecycle
        .create_project(CreateProjectRequest {
            title: title.to_string(),
            repository_url: repo.to_string(),
            branch_name: branch,
            description,
            creator: None,
        })
        .await?;

    if !outcome.script_output.is_empty() {
        println!("{}", outcome.script_output);
    }
    println!(
        "Created project '{}' (slug: {}, branch: {})",
        outcome.project.title, outcome.project.slug, outcome.project.branch_name
    );
    for warning in &outcome.warnings {
        println!("  warning: {}", warning);
    }
    Ok(())
}

pub async fn run_delete(config: &Config, slug: &str) -> Result<()> {
    let lifecycle = open_lifecycle(config).await?;
    let outcome = lifecycle.delete_project(slug).await?;

    println!("Deleted project '{}'", outcome.slug);
    println!("  backup: {}", outcome.backup.display());
    for warning in &outcome.warnings {
        println!("  warning: {}", warning);
    }
    Ok(())
}

pub async fn run_list(config: &Config) -> Result<()> {
    let lifecycle = open_lifecycle(config).await?;
    let projects = lifecycle.list_projects().await?;

    if projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }

    println!(
        "{:<24} {:<30} {:<10} {:<5} {:<5} CREATED",
        "SLUG", "TITLE", "BRANCH", "REPO", "DOCS"
    );
    for p in projects {
        println!(
            "{:<24} {:<30} {:<10} {:<5} {:<5} {}",
            p.slug,
            p.title,
            p.branch_name,
            yes_no(p.has_repository),
            yes_no(p.has_documentation),
            p.created_at
        );
    }
    Ok(())
}

pub async fn run_search(config: &Config, term: &str, limit: i64) -> Result<()> {
    let lifecycle = open_lifecycle(config).await?;
    let projects = lifecycle.search_projects(term, limit).await?;

    if projects.is_empty() {
        println!("No projects match '{}'.", term);
        return Ok(());
    }

    println!("{:<24} {:<30} DESCRIPTION", "SLUG", "TITLE");
    for p in projects {
        println!("{:<24} {:<30} {}", p.slug, p.title, p.description);
    }
    Ok(())
}

pub async fn run_purge(config: &Config, slug: &str) -> Result<()> {
    let lifecycle = open_lifecycle(config).await?;
    lifecycle.purge_project(slug).await?;
    println!("Purged registry record for '{}'", slug);
    Ok(())
}

pub async fn run_stats(config: &Config) -> Result<()> {
    let lifecycle = open_lifecycle(config).await?;
    let stats = lifecycle.statistics().await?;

    println!("Projects:           {}", stats.total_projects);
    println!("  active:           {}", stats.active_projects);
    println!("  deleted:          {}", stats.deleted_projects);
    println!("  with repository:  {}", stats.projects_with_repo);
    println!("  with docs:        {}", stats.projects_with_docs);
    Ok(())
}

async fn open_lifecycle(config: &Config) -> Result<ProjectLifecycle> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    Ok(ProjectLifecycle::new(Arc::new(config.clone()), pool))
}

fn print_report(report: &MutationReport) {
    let status = serde_json::to_value(report.status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    println!("{}: {} (sidebar: {})", status, report.slug, report.sidebar_id);
    if let Some(backup) = &report.backup {
        println!("  backup: {}", backup.display());
    }
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

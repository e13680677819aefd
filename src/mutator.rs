//! Config mutation orchestrator.
//!
//! [`ConfigMutator`] owns the read → backup → edit → write → sidebar cycle for
//! the site configuration. All mutations go through one mutex, so two
//! concurrent calls in this process can never interleave their read and
//! write of the document.
//!
//! # Outcome contract
//!
//! | Result | Meaning |
//! |--------|---------|
//! | `Ok` + [`MutationStatus::Applied`] | plugin entry, navbar item and sidebar all in place / all gone |
//! | `Ok` + [`MutationStatus::AlreadyPresent`] / [`MutationStatus::AlreadyAbsent`] | nothing to do; document not rewritten |
//! | `Ok` + [`MutationStatus::Partial`] | some step was skipped or failed; see `warnings` |
//! | `Err` | rejected before the document was rewritten |

use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::backup;
use crate::error::{MutatorError, MutatorResult};
use crate::jsdoc;
use crate::navigation::{Edit, NavbarItem, PluginEntry, ProjectNav, SiteNavigation};
use crate::sidebar;
use crate::slug::{generate_slug, sidebar_id};

/// Where the site lives on disk and how new entries are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    pub root: PathBuf,
    pub config_file: String,
    pub backup_dir: PathBuf,
    pub edit_url: Option<String>,
}

impl SiteLayout {
    /// A layout with backups next to the config and no `editUrl`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            backup_dir: root.clone(),
            root,
            config_file: "docusaurus.config.js".to_string(),
            edit_url: None,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(&self.config_file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationStatus {
    Applied,
    AlreadyPresent,
    AlreadyAbsent,
    Partial,
}

/// A step of a mutation that did not fully happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationWarning {
    /// No `plugins: [...]` array in the document.
    PluginsArrayNotFound,
    /// No object with `type: 'dropdown'` and `label: 'Projects'` holding an
    /// `items` array.
    ProjectsDropdownNotFound,
    /// The sidebar file could not be written or removed.
    Sidebar { message: String },
}

impl std::fmt::Display for MutationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationWarning::PluginsArrayNotFound => {
                write!(f, "plugins array not found in site config")
            }
            MutationWarning::ProjectsDropdownNotFound => {
                write!(f, "Projects dropdown not found in site config navbar")
            }
            MutationWarning::Sidebar { message } => write!(f, "sidebar file: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationReport {
    pub slug: String,
    pub sidebar_id: String,
    pub backup: Option<PathBuf>,
    pub status: MutationStatus,
    pub warnings: Vec<MutationWarning>,
}

/// Serialized editor for one site configuration document.
pub struct ConfigMutator {
    layout: SiteLayout,
    lock: Mutex<()>,
}

impl ConfigMutator {
    pub fn new(layout: SiteLayout) -> Self {
        Self {
            layout,
            lock: Mutex::new(()),
        }
    }

    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    /// Add the plugin entry, navbar item and sidebar file for `title`.
    ///
    /// Idempotent: when nothing new can be inserted, neither the document nor
    /// the sidebar file is written, only the backup. When only the navbar item
    /// is missing it is added.
    pub fn add_project(&self, title: &str) -> MutatorResult<MutationReport> {
        let slug = generate_slug(title);
        if slug.is_empty() {
            return Err(MutatorError::InvalidTitle(title.to_string()));
        }
        let sidebar_id = sidebar_id(&slug);

        let _guard = self.lock.lock();
        let (config_path, content, backup) = self.read_and_backup()?;

        let mut nav = SiteNavigation::parse(&content)?;
        let mut warnings = Vec::new();

        let plugin_edit = nav.insert_plugin(&PluginEntry::for_slug(
            &slug,
            self.layout.edit_url.as_deref(),
        ));
        if plugin_edit == Edit::Missing {
            warnings.push(MutationWarning::PluginsArrayNotFound);
        }
        let navbar_edit = nav.insert_navbar_item(&NavbarItem::for_project(&slug, title));
        if navbar_edit == Edit::Missing {
            warnings.push(MutationWarning::ProjectsDropdownNotFound);
        }
        debug!(slug = %slug, ?plugin_edit, ?navbar_edit, "site config edits computed");

        if !nav.is_dirty() {
            let status = if plugin_edit == Edit::AlreadyPresent {
                info!(slug = %slug, "project already present in site config");
                MutationStatus::AlreadyPresent
            } else {
                for warning in &warnings {
                    warn!(slug = %slug, "{}", warning);
                }
                MutationStatus::Partial
            };
            return Ok(MutationReport {
                slug,
                sidebar_id,
                backup: Some(backup.path),
                status,
                warnings,
            });
        }

        self.write_checked(&config_path, &nav.render()?)?;
        info!(slug = %slug, path = %config_path.display(), "site config updated");

        if let Err(e) = sidebar::emit(&self.layout.root, &slug, &sidebar_id) {
            warnings.push(MutationWarning::Sidebar {
                message: e.to_string(),
            });
        }

        Ok(self.finish(slug, sidebar_id, backup.path, warnings))
    }

    /// Remove the plugin entry, navbar item and sidebar file for `slug`.
    ///
    /// Removing a project that is not there leaves the document untouched.
    /// `slug` must be its own slug, so it can only name a directory directly
    /// under the site root.
    pub fn remove_project(&self, slug: &str) -> MutatorResult<MutationReport> {
        if slug.is_empty() || generate_slug(slug) != slug {
            return Err(MutatorError::InvalidSlug(slug.to_string()));
        }
        let slug = slug.to_string();
        let sidebar_id = sidebar_id(&slug);

        let _guard = self.lock.lock();
        let (config_path, content, backup) = self.read_and_backup()?;

        let mut nav = SiteNavigation::parse(&content)?;
        let mut warnings = Vec::new();

        let plugin_edit = nav.remove_plugin(&slug);
        if plugin_edit == Edit::Missing {
            warnings.push(MutationWarning::PluginsArrayNotFound);
        }
        let navbar_edit = nav.remove_navbar_item(&slug);
        if navbar_edit == Edit::Missing {
            warnings.push(MutationWarning::ProjectsDropdownNotFound);
        }
        debug!(slug = %slug, ?plugin_edit, ?navbar_edit, "site config edits computed");

        let changed = nav.is_dirty();
        if changed {
            self.write_checked(&config_path, &nav.render()?)?;
            info!(slug = %slug, path = %config_path.display(), "removed project from site config");
        }

        let removal = match sidebar::remove(&self.layout.root, &slug) {
            Ok(removal) => removal,
            Err(e) => {
                warnings.push(MutationWarning::Sidebar {
                    message: e.to_string(),
                });
                Default::default()
            }
        };

        if !changed && warnings.is_empty() && !removal.file_removed {
            return Ok(MutationReport {
                slug,
                sidebar_id,
                backup: Some(backup.path),
                status: MutationStatus::AlreadyAbsent,
                warnings,
            });
        }

        Ok(self.finish(slug, sidebar_id, backup.path, warnings))
    }

    /// Projects currently wired into the site config.
    pub fn list_projects(&self) -> MutatorResult<Vec<ProjectNav>> {
        let config_path = self.layout.config_path();
        let content = read_document(&config_path)?;
        let nav = SiteNavigation::parse(&content)?;
        Ok(nav.projects())
    }

    fn read_and_backup(&self) -> MutatorResult<(PathBuf, String, backup::BackupHandle)> {
        let config_path = self.layout.config_path();
        let content = read_document(&config_path)?;
        let backup = backup::backup(&config_path, &content, &self.layout.backup_dir)?;
        info!(path = %backup.path.display(), "config backup created");
        Ok((config_path, content, backup))
    }

    /// Re-parse `text` and, if it is still a valid module, atomically
    /// replace the document with it.
    fn write_checked(&self, path: &Path, text: &str) -> MutatorResult<()> {
        jsdoc::check(text)?;
        write_atomic(path, text)
    }

    fn finish(
        &self,
        slug: String,
        sidebar_id: String,
        backup: PathBuf,
        warnings: Vec<MutationWarning>,
    ) -> MutationReport {
        for warning in &warnings {
            warn!(slug = %slug, "{}", warning);
        }
        let status = if warnings.is_empty() {
            MutationStatus::Applied
        } else {
            MutationStatus::Partial
        };
        MutationReport {
            slug,
            sidebar_id,
            backup: Some(backup),
            status,
            warnings,
        }
    }
}

fn read_document(path: &Path) -> MutatorResult<String> {
    if !path.is_file() {
        return Err(MutatorError::ConfigNotFound(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|e| MutatorError::io(path, e))
}

/// Write to a temporary file beside `path`, then rename it over `path`.
fn write_atomic(path: &Path, text: &str) -> MutatorResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| MutatorError::io(dir, e))?;
    tmp.write_all(text.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| MutatorError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| MutatorError::io(path, e.error))?;
    Ok(())
}

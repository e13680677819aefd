//! Per-project `sidebars.js` files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{MutatorError, MutatorResult};

pub const SIDEBAR_FILE: &str = "sidebars.js";

pub fn sidebar_path(site_root: &Path, slug: &str) -> PathBuf {
    site_root.join(slug).join(SIDEBAR_FILE)
}

/// Sidebar document with an `intro` page followed by everything else in the
/// project directory.
pub fn render_sidebar(sidebar_id: &str) -> String {
    format!(
        r#"// @ts-check

/** @type {{import('@docusaurus/plugin-content-docs').SidebarsConfig}} */
const sidebars = {{
  {sidebar_id}: [
    {{
      type: 'doc',
      id: 'intro',
      label: 'Introduction'
    }},
    {{
      type: 'autogenerated',
      dirName: '.',
    }},
  ],
}};

export default sidebars;
"#
    )
}

/// Write `<site_root>/<slug>/sidebars.js`, creating the directory if needed.
pub fn emit(site_root: &Path, slug: &str, sidebar_id: &str) -> MutatorResult<PathBuf> {
    let path = sidebar_path(site_root, slug);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| MutatorError::io(dir, e))?;
    }
    std::fs::write(&path, render_sidebar(sidebar_id)).map_err(|e| MutatorError::io(&path, e))?;
    Ok(path)
}

/// What [`remove`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SidebarRemoval {
    pub file_removed: bool,
    pub dir_removed: bool,
}

/// Delete the sidebar file if present, then the project directory if that
/// left it empty. A non-empty directory is kept.
pub fn remove(site_root: &Path, slug: &str) -> MutatorResult<SidebarRemoval> {
    let path = sidebar_path(site_root, slug);
    let mut removal = SidebarRemoval::default();

    match std::fs::remove_file(&path) {
        Ok(()) => removal.file_removed = true,
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(MutatorError::io(&path, e)),
    }

    let dir = site_root.join(slug);
    if dir.is_dir() {
        // remove_dir refuses non-empty directories; that is the signal to keep it.
        removal.dir_removed = std::fs::remove_dir(&dir).is_ok();
    }

    Ok(removal)
}

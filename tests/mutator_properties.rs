//! Behavioral tests for site config mutation against a realistic
//! `docusaurus.config.js`.

use docupilot::jsdoc::check;
use docupilot::mutator::{ConfigMutator, MutationStatus, MutationWarning, SiteLayout};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const SITE_CONFIG: &str = r#"// @ts-check
import {themes as prismThemes} from 'prism-react-renderer';

/** @type {import('@docusaurus/types').Config} */
const config = {
  title: 'DocuPilot',
  url: 'https://docs.example.com',
  baseUrl: '/',

  presets: [
    [
      'classic',
      ({
        docs: false,
        theme: {
          customCss: './src/css/custom.css',
        },
      }),
    ],
  ],

  plugins: [
    [
      '@docusaurus/plugin-content-docs',
      {
        id: 'tesla-rhbme',
        path: 'tesla-rhbme',
        routeBasePath: 'tesla-rhbme',
        sidebarPath: './tesla-rhbme/sidebars.js'
      }
    ]
  ],

  themeConfig: {
    navbar: {
      title: 'DocuPilot',
      items: [
        {
          label: 'Projects',
          position: 'left',
          type: 'dropdown',
          items: [
            {
              type: 'docSidebar',
              sidebarId: 'teslaRhbmeSidebar',
              label: 'Tesla RHBme',
              docsPluginId: 'tesla-rhbme'
            }
          ]
        },
        {href: 'https://github.com/acme/docupilot', label: 'GitHub', position: 'right'},
      ],
    },
    footer: {
      copyright: `Copyright © ${new Date().getFullYear()} DocuPilot`,
    },
    prism: {
      theme: prismThemes.github,
    },
  },
};

export default config;
"#;

fn setup_site(config: &str) -> (TempDir, ConfigMutator) {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("docusaurus.config.js"), config).unwrap();
    let mut layout = SiteLayout::new(tmp.path());
    layout.backup_dir = tmp.path().join("config-backups");
    (tmp, ConfigMutator::new(layout))
}

fn read_config(root: &Path) -> String {
    fs::read_to_string(root.join("docusaurus.config.js")).unwrap()
}

fn backups(root: &Path) -> Vec<PathBuf> {
    let dir = root.join("config-backups");
    if !dir.exists() {
        return Vec::new();
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    paths.sort();
    paths
}

fn slugs(mutator: &ConfigMutator) -> Vec<String> {
    mutator
        .list_projects()
        .unwrap()
        .into_iter()
        .map(|p| p.slug)
        .collect()
}

#[test]
fn test_add_wires_plugin_navbar_and_sidebar() {
    let (tmp, mutator) = setup_site(SITE_CONFIG);

    let report = mutator.add_project("UBEDA AFB").unwrap();
    assert_eq!(report.status, MutationStatus::Applied);
    assert_eq!(report.slug, "ubeda-afb");
    assert_eq!(report.sidebar_id, "ubedaAfbSidebar");
    assert!(report.warnings.is_empty());

    let text = read_config(tmp.path());
    assert!(check(&text).is_ok());
    assert!(text.contains(
        "      {\n        id: 'ubeda-afb',\n        path: 'ubeda-afb',\n        routeBasePath: 'ubeda-afb',\n        sidebarPath: './ubeda-afb/sidebars.js'\n      }"
    ));
    assert!(text.contains("              docsPluginId: 'ubeda-afb'\n"));

    let projects = mutator.list_projects().unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[1].slug, "ubeda-afb");
    assert_eq!(projects[1].label.as_deref(), Some("UBEDA AFB"));
    assert_eq!(projects[1].sidebar_id.as_deref(), Some("ubedaAfbSidebar"));

    let sidebar = fs::read_to_string(tmp.path().join("ubeda-afb").join("sidebars.js")).unwrap();
    assert!(sidebar.contains("ubedaAfbSidebar: ["));
}

#[test]
fn test_add_is_idempotent() {
    let (tmp, mutator) = setup_site(SITE_CONFIG);

    mutator.add_project("UBEDA AFB").unwrap();
    let after_first = read_config(tmp.path());

    let report = mutator.add_project("UBEDA AFB").unwrap();
    assert_eq!(report.status, MutationStatus::AlreadyPresent);
    assert_eq!(read_config(tmp.path()), after_first);
    assert_eq!(after_first.matches("id: 'ubeda-afb'").count(), 1);
    assert_eq!(after_first.matches("docsPluginId: 'ubeda-afb'").count(), 1);
}

#[test]
fn test_existing_project_is_already_present() {
    let (tmp, mutator) = setup_site(SITE_CONFIG);
    let report = mutator.add_project("Tesla RHBme").unwrap();
    assert_eq!(report.status, MutationStatus::AlreadyPresent);
    assert_eq!(read_config(tmp.path()), SITE_CONFIG);
}

#[test]
fn test_add_then_remove_restores_document() {
    let (tmp, mutator) = setup_site(SITE_CONFIG);

    mutator.add_project("UBEDA AFB").unwrap();
    let report = mutator.remove_project("ubeda-afb").unwrap();
    assert_eq!(report.status, MutationStatus::Applied);

    assert_eq!(read_config(tmp.path()), SITE_CONFIG);
    assert!(!tmp.path().join("ubeda-afb").exists());
}

#[test]
fn test_remove_then_add_restores_document() {
    let (tmp, mutator) = setup_site(SITE_CONFIG);

    mutator.remove_project("tesla-rhbme").unwrap();
    let emptied = read_config(tmp.path());
    assert!(emptied.contains("  plugins: [],\n"));
    assert!(emptied.contains("          items: []\n"));
    assert!(slugs(&mutator).is_empty());

    mutator.add_project("Tesla RHBme").unwrap();
    assert_eq!(read_config(tmp.path()), SITE_CONFIG);
}

#[test]
fn test_remove_one_of_two_keeps_the_other() {
    let (tmp, mutator) = setup_site(SITE_CONFIG);

    mutator.add_project("Alpha").unwrap();
    mutator.add_project("Beta").unwrap();
    assert_eq!(slugs(&mutator), vec!["tesla-rhbme", "alpha", "beta"]);

    mutator.remove_project("beta").unwrap();
    assert_eq!(slugs(&mutator), vec!["tesla-rhbme", "alpha"]);

    let text = read_config(tmp.path());
    assert!(check(&text).is_ok());
    assert!(!text.contains("'beta'"));
    assert!(!text.contains("betaSidebar"));
    assert!(text.contains("docsPluginId: 'alpha'"));
}

#[test]
fn test_remove_absent_leaves_document_untouched() {
    let (tmp, mutator) = setup_site(SITE_CONFIG);
    let report = mutator.remove_project("ghost").unwrap();
    assert_eq!(report.status, MutationStatus::AlreadyAbsent);
    assert_eq!(read_config(tmp.path()), SITE_CONFIG);
}

#[test]
fn test_every_call_backs_up_the_prior_document() {
    let (tmp, mutator) = setup_site(SITE_CONFIG);

    let first = mutator.add_project("Alpha").unwrap();
    let after_add = read_config(tmp.path());
    let second = mutator.add_project("Alpha").unwrap();
    let third = mutator.remove_project("alpha").unwrap();

    let all = backups(tmp.path());
    assert_eq!(all.len(), 3);

    let first_backup = first.backup.unwrap();
    assert_eq!(fs::read_to_string(&first_backup).unwrap(), SITE_CONFIG);
    assert_eq!(fs::read_to_string(second.backup.unwrap()).unwrap(), after_add);
    assert_eq!(fs::read_to_string(third.backup.unwrap()).unwrap(), after_add);

    let name = first_backup.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("docusaurus.config."));
    assert!(name.ends_with(".backup.js"));
    assert!(!name.contains(':'));
}

#[test]
fn test_first_project_into_empty_arrays() {
    let config = r#"export default {
  plugins: [],
  themeConfig: {
    navbar: {
      items: [
        {type: 'dropdown', label: 'Projects', position: 'left', items: []},
      ],
    },
  },
};
"#;
    let (tmp, mutator) = setup_site(config);
    let report = mutator.add_project("First One").unwrap();
    assert_eq!(report.status, MutationStatus::Applied);

    let text = read_config(tmp.path());
    assert!(check(&text).is_ok());
    assert!(text.contains("  plugins: [\n    [\n      '@docusaurus/plugin-content-docs',\n"));
    assert!(text.contains("sidebarId: 'firstOneSidebar'"));
    assert_eq!(slugs(&mutator), vec!["first-one"]);
}

#[test]
fn test_missing_arrays_are_reported() {
    let config = "module.exports = { title: 'No plugins here' };\n";
    let (tmp, mutator) = setup_site(config);

    let report = mutator.add_project("Alpha").unwrap();
    assert_eq!(report.status, MutationStatus::Partial);
    assert_eq!(
        report.warnings,
        vec![
            MutationWarning::PluginsArrayNotFound,
            MutationWarning::ProjectsDropdownNotFound
        ]
    );
    assert_eq!(read_config(tmp.path()), config);
}

#[test]
fn test_title_with_quote_is_escaped() {
    let (tmp, mutator) = setup_site(SITE_CONFIG);
    mutator.add_project("O'Reilly Guide").unwrap();

    let text = read_config(tmp.path());
    assert!(check(&text).is_ok());
    assert!(text.contains(r"label: 'O\'Reilly Guide'"));

    let projects = mutator.list_projects().unwrap();
    let guide = projects.iter().find(|p| p.slug == "o-reilly-guide").unwrap();
    assert_eq!(guide.label.as_deref(), Some("O'Reilly Guide"));
}

#[test]
fn test_concurrent_adds_all_land() {
    let (tmp, mutator) = setup_site(SITE_CONFIG);
    let mutator = Arc::new(mutator);

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let mutator = mutator.clone();
            std::thread::spawn(move || mutator.add_project(&format!("Project {}", i)).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().status, MutationStatus::Applied);
    }

    let text = read_config(tmp.path());
    assert!(check(&text).is_ok());
    let found = slugs(&mutator);
    assert_eq!(found.len(), 7);
    for i in 0..6 {
        assert!(found.contains(&format!("project-{}", i)));
    }
    assert_eq!(backups(tmp.path()).len(), 6);
}

//! Site navigation records and the editors that keep them in the config.
//!
//! A project shows up in `docusaurus.config.js` twice: as a
//! `@docusaurus/plugin-content-docs` entry in the top-level `plugins` array,
//! and as a `docSidebar` item inside the navbar dropdown labelled
//! `Projects`. [`SiteNavigation`] loads both arrays as ordered element lists,
//! edits them, and renders the document back with only those two arrays
//! rewritten.

use serde::Serialize;
use tracing::warn;

use crate::error::MutatorResult;
use crate::jsdoc::{
    apply_splices, parse_value, quote, render_array, ArrayLiteral, Block, JsValue, Source,
    Splice, INDENT,
};
use crate::slug::sidebar_id;

pub const DOCS_PLUGIN: &str = "@docusaurus/plugin-content-docs";

/// One documentation source mounted into the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginEntry {
    pub id: String,
    pub path: String,
    pub route_base_path: String,
    pub sidebar_path: String,
    pub edit_url: Option<String>,
}

impl PluginEntry {
    pub fn for_slug(slug: &str, edit_url: Option<&str>) -> Self {
        Self {
            id: slug.to_string(),
            path: slug.to_string(),
            route_base_path: slug.to_string(),
            sidebar_path: format!("./{}/sidebars.js", slug),
            edit_url: edit_url.map(str::to_string),
        }
    }

    /// Lift a `[pluginName, options]` element. Only docs plugins with a
    /// string `id` qualify.
    pub fn from_value(value: &JsValue) -> Option<Self> {
        let id = plugin_id(value)?;
        let options = value.as_array()?.get(1)?;
        Some(Self {
            id: id.to_string(),
            path: options.get_str("path").unwrap_or(id).to_string(),
            route_base_path: options.get_str("routeBasePath").unwrap_or(id).to_string(),
            sidebar_path: options.get_str("sidebarPath").unwrap_or_default().to_string(),
            edit_url: options.get_str("editUrl").map(str::to_string),
        })
    }

    pub fn to_block(&self) -> Block {
        let mut fields = vec![
            format!("id: {}", quote(&self.id)),
            format!("path: {}", quote(&self.path)),
            format!("routeBasePath: {}", quote(&self.route_base_path)),
            format!("sidebarPath: {}", quote(&self.sidebar_path)),
        ];
        if let Some(url) = &self.edit_url {
            fields.push(format!("editUrl: {}", quote(url)));
        }

        let options = fields
            .iter()
            .map(|f| format!("{INDENT}{INDENT}{f}"))
            .collect::<Vec<_>>()
            .join(",\n");
        Block::new(format!(
            "[\n{INDENT}{},\n{INDENT}{{\n{}\n{INDENT}}}\n]",
            quote(DOCS_PLUGIN),
            options
        ))
    }
}

/// The `id` of a docs plugin element, if it is one.
fn plugin_id(value: &JsValue) -> Option<&str> {
    let items = value.as_array()?;
    if items.first()?.as_str()? != DOCS_PLUGIN {
        return None;
    }
    items.get(1)?.get_str("id")
}

/// One entry of the Projects dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavbarItem {
    pub sidebar_id: String,
    pub label: String,
    pub docs_plugin_id: String,
}

impl NavbarItem {
    pub const ITEM_TYPE: &'static str = "docSidebar";

    pub fn for_project(slug: &str, title: &str) -> Self {
        Self {
            sidebar_id: sidebar_id(slug),
            label: title.to_string(),
            docs_plugin_id: slug.to_string(),
        }
    }

    pub fn from_value(value: &JsValue) -> Option<Self> {
        if value.get_str("type")? != Self::ITEM_TYPE {
            return None;
        }
        Some(Self {
            sidebar_id: value.get_str("sidebarId")?.to_string(),
            label: value.get_str("label").unwrap_or_default().to_string(),
            docs_plugin_id: value.get_str("docsPluginId").unwrap_or_default().to_string(),
        })
    }

    pub fn belongs_to(&self, slug: &str) -> bool {
        self.docs_plugin_id == slug || self.sidebar_id == sidebar_id(slug)
    }

    pub fn to_block(&self) -> Block {
        Block::new(format!(
            "{{\n{INDENT}type: {},\n{INDENT}sidebarId: {},\n{INDENT}label: {},\n{INDENT}docsPluginId: {}\n}}",
            quote(Self::ITEM_TYPE),
            quote(&self.sidebar_id),
            quote(&self.label),
            quote(&self.docs_plugin_id),
        ))
    }
}

/// A project as seen through the site configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectNav {
    pub slug: String,
    pub label: Option<String>,
    pub sidebar_id: Option<String>,
}

/// Result of one array edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Inserted,
    Removed(usize),
    AlreadyPresent,
    Absent,
    /// The array to edit could not be located in the document.
    Missing,
}

struct Element {
    block: Block,
    value: JsValue,
}

struct EditableArray {
    start: usize,
    end: usize,
    base_indent: String,
    elements: Vec<Element>,
    dirty: bool,
}

impl EditableArray {
    fn load(source: &Source<'_>, array: &ArrayLiteral) -> Self {
        let elements = array
            .elements
            .iter()
            .map(|element| Element {
                block: source.element_block(element),
                value: element.value.clone(),
            })
            .collect();
        Self {
            start: array.start,
            end: array.end,
            base_indent: source.line_indent(array.start).to_string(),
            elements,
            dirty: false,
        }
    }

    fn overlaps(&self, other: &EditableArray) -> bool {
        self.start < other.end && other.start < self.end
    }

    fn splice(&self) -> Option<Splice> {
        self.dirty.then(|| {
            let blocks: Vec<Block> = self.elements.iter().map(|e| e.block.clone()).collect();
            Splice {
                start: self.start,
                end: self.end,
                replacement: render_array(&self.base_indent, &blocks),
            }
        })
    }

    fn push(&mut self, block: Block, value: JsValue) {
        self.elements.push(Element { block, value });
        self.dirty = true;
    }

    fn remove_where(&mut self, matches: impl Fn(&JsValue) -> bool) -> usize {
        let before = self.elements.len();
        self.elements.retain(|e| !matches(&e.value));
        let removed = before - self.elements.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }
}

/// The plugins array and the Projects dropdown of one config document.
pub struct SiteNavigation<'a> {
    text: &'a str,
    plugins: Option<EditableArray>,
    projects: Option<EditableArray>,
}

impl<'a> SiteNavigation<'a> {
    pub fn parse(text: &'a str) -> MutatorResult<Self> {
        let source = Source::parse(text)?;

        let plugins = source
            .find_property_array("plugins")
            .map(|array| EditableArray::load(&source, array));

        let mut projects = source
            .find_object_with(&[("type", "dropdown"), ("label", "Projects")])
            .and_then(|dropdown| dropdown.array("items"))
            .map(|array| EditableArray::load(&source, array));

        // One array nested in the other cannot be rewritten independently.
        if let (Some(plugins), Some(items)) = (&plugins, &projects) {
            if plugins.overlaps(items) {
                warn!("Projects dropdown sits inside the plugins array; leaving it alone");
                projects = None;
            }
        }

        Ok(Self {
            text,
            plugins,
            projects,
        })
    }

    pub fn has_plugins_array(&self) -> bool {
        self.plugins.is_some()
    }

    pub fn has_projects_dropdown(&self) -> bool {
        self.projects.is_some()
    }

    pub fn has_plugin(&self, slug: &str) -> bool {
        self.plugins.as_ref().is_some_and(|array| {
            array
                .elements
                .iter()
                .any(|e| plugin_id(&e.value) == Some(slug))
        })
    }

    pub fn has_navbar_item(&self, slug: &str) -> bool {
        self.projects.as_ref().is_some_and(|array| {
            array
                .elements
                .iter()
                .filter_map(|e| NavbarItem::from_value(&e.value))
                .any(|item| item.belongs_to(slug))
        })
    }

    pub fn plugin_entries(&self) -> Vec<PluginEntry> {
        self.plugins
            .iter()
            .flat_map(|array| array.elements.iter())
            .filter_map(|e| PluginEntry::from_value(&e.value))
            .collect()
    }

    pub fn navbar_items(&self) -> Vec<NavbarItem> {
        self.projects
            .iter()
            .flat_map(|array| array.elements.iter())
            .filter_map(|e| NavbarItem::from_value(&e.value))
            .collect()
    }

    /// Every project with a plugin entry, joined with its navbar item.
    pub fn projects(&self) -> Vec<ProjectNav> {
        let items = self.navbar_items();
        self.plugin_entries()
            .into_iter()
            .map(|entry| {
                let item = items.iter().find(|i| i.belongs_to(&entry.id));
                ProjectNav {
                    label: item.map(|i| i.label.clone()),
                    sidebar_id: item.map(|i| i.sidebar_id.clone()),
                    slug: entry.id,
                }
            })
            .collect()
    }

    pub fn insert_plugin(&mut self, entry: &PluginEntry) -> Edit {
        if self.has_plugin(&entry.id) {
            return Edit::AlreadyPresent;
        }
        let Some(array) = self.plugins.as_mut() else {
            return Edit::Missing;
        };
        let block = entry.to_block();
        let value = block_value(&block);
        array.push(block, value);
        Edit::Inserted
    }

    pub fn remove_plugin(&mut self, slug: &str) -> Edit {
        let Some(array) = self.plugins.as_mut() else {
            return Edit::Missing;
        };
        match array.remove_where(|v| plugin_id(v) == Some(slug)) {
            0 => Edit::Absent,
            n => Edit::Removed(n),
        }
    }

    pub fn insert_navbar_item(&mut self, item: &NavbarItem) -> Edit {
        if self.has_navbar_item(&item.docs_plugin_id) {
            return Edit::AlreadyPresent;
        }
        let Some(array) = self.projects.as_mut() else {
            return Edit::Missing;
        };
        let block = item.to_block();
        let value = block_value(&block);
        array.push(block, value);
        Edit::Inserted
    }

    pub fn remove_navbar_item(&mut self, slug: &str) -> Edit {
        let Some(array) = self.projects.as_mut() else {
            return Edit::Missing;
        };
        let removed = array.remove_where(|v| {
            NavbarItem::from_value(v).is_some_and(|item| item.belongs_to(slug))
        });
        match removed {
            0 => Edit::Absent,
            n => Edit::Removed(n),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.plugins.as_ref().is_some_and(|a| a.dirty)
            || self.projects.as_ref().is_some_and(|a| a.dirty)
    }

    /// The document with edited arrays re-rendered and everything else as
    /// it was read.
    pub fn render(&self) -> MutatorResult<String> {
        let splices: Vec<Splice> = [&self.plugins, &self.projects]
            .into_iter()
            .flatten()
            .filter_map(EditableArray::splice)
            .collect();
        apply_splices(self.text, splices)
    }
}

/// Parsed value of a block we rendered ourselves.
fn block_value(block: &Block) -> JsValue {
    parse_value(block.text()).unwrap_or_else(|_| JsValue::Opaque(block.text().to_string()))
}

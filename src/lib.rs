//! # DocuPilot
//!
//! Project management for a Docusaurus documentation site.
//!
//! Each project gets a docs plugin instance, an entry in the navbar's
//! `Projects` dropdown and its own `sidebars.js`. DocuPilot edits
//! `docusaurus.config.js` structurally: the document is parsed with oxc, the
//! `plugins` array and the dropdown's `items` array are located in the syntax
//! tree, and only those arrays are re-rendered. Every edit is preceded by a
//! timestamped backup, and the result is parsed again before it is written.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌────────────┐   ┌──────────────────┐
//! │ CLI/HTTP │──▶│ Lifecycle │──▶│  Mutator   │──▶│ docusaurus.config│
//! └──────────┘   └─────┬─────┘   │ backup+nav │   │ + sidebars.js    │
//!                      │         └────────────┘   └──────────────────┘
//!                      ▼
//!                ┌──────────┐
//!                │  SQLite  │
//!                │ registry │
//!                └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docupilot init
//! docupilot add "Tesla RHBme"
//! docupilot nav
//! docupilot create "UBEDA AFB" --repo https://github.com/acme/ubeda.git
//! docupilot serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Site config mutation errors |
//! | [`slug`] | Slug and sidebar id derivation |
//! | [`jsdoc`] | Parsed outline and array rendering for JS config documents |
//! | [`navigation`] | Plugin entries and navbar items of the site config |
//! | [`backup`] | Timestamped config backups |
//! | [`sidebar`] | Per-project `sidebars.js` files |
//! | [`mutator`] | Serialized add/remove of projects in the site config |
//! | [`models`] | Registry record types |
//! | [`projects`] | SQLite project registry |
//! | [`lifecycle`] | End-to-end project create/delete |
//! | [`commands`] | CLI command implementations |
//! | [`server`] | HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod backup;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod jsdoc;
pub mod lifecycle;
pub mod migrate;
pub mod models;
pub mod mutator;
pub mod navigation;
pub mod projects;
pub mod server;
pub mod sidebar;
pub mod slug;

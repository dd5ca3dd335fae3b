//! Utilities for refreshing a project index README with live GitHub data.
//!
//! The library loads a YAML document describing tracked repositories,
//! augments it with metadata and CI status fetched from GitHub, merges manual
//! overrides with the fetched values and rewrites marker-delimited regions of
//! an existing README. Per-repository failures degrade to placeholders; only
//! setup failures are reported as [`Error`].

mod badge;
mod config;
mod error;
mod github;
mod merge;
mod pipeline;
mod readme;
mod render;

pub use badge::{LANGUAGE_DISPLAY, MATURITY_BADGES, ci_glyph, language_display, maturity_badge};
pub use config::{Category, IndexConfig, Maturity, RepoConfig, load_config, parse_config};
pub use error::{Error, io_error, write_error};
pub use github::{CiStatus, FetchedMeta, GitHubClient, RepositorySource};
pub use merge::{MergedRepo, merge_repos};
pub use pipeline::{RefreshOptions, RefreshReport, refresh, refresh_with_source};
pub use readme::{
    OVERVIEW_MARKER, PatchOutcome, REPOS_MARKER, UPDATED_MARKER, patch_document, replace_section,
    update_readme,
};
pub use render::{render_category_table, render_overview, render_repos_section, render_updated};

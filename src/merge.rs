// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

/// Combines manual configuration with live GitHub data.
///
/// Manual values win over fetched ones, except that a repository GitHub
/// reports as archived is always rendered as archived.
use std::collections::HashMap;

use crate::{
    config::{IndexConfig, Maturity},
    github::{CiStatus, FetchedMeta},
};

/// Normalized record rendered for a single tracked repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRepo {
    /// Repository name.
    pub name: String,
    /// Category identifier from the configuration.
    pub category: String,
    /// Repository URL, canonical GitHub URL when none was fetched.
    pub url: String,
    /// Manual description, else fetched description, else empty.
    pub description: String,
    /// Primary language or empty.
    pub language: String,
    /// Last commit date (`YYYY-MM-DD`) or empty.
    pub last_commit: String,
    /// Manual version tag or empty.
    pub version: String,
    /// Effective maturity label.
    pub maturity: Maturity,
    /// CI status of the latest completed run.
    pub ci: CiStatus,
    /// Whether the repository is private.
    pub private: bool,
    /// Whether GitHub reports the repository as archived.
    pub archived: bool,
}

/// Merges configuration entries with fetched metadata and CI results.
///
/// Produces exactly one record per configured repository, in configuration
/// order. Repositories absent from `fetched` or `ci` fall back to empty
/// fields and [`CiStatus::Unknown`].
pub fn merge_repos(
    config: &IndexConfig,
    fetched: &HashMap<String, FetchedMeta>,
    ci: &HashMap<String, CiStatus>
) -> Vec<MergedRepo> {
    let empty = FetchedMeta::default();

    config
        .repos
        .iter()
        .map(|repo| {
            let meta = fetched.get(&repo.name).unwrap_or(&empty);

            let description = repo
                .short_description
                .clone()
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| meta.description.clone());

            let url = if meta.url.is_empty() {
                format!("https://github.com/{}/{}", config.owner, repo.name)
            } else {
                meta.url.clone()
            };

            let maturity = if meta.archived {
                Maturity::Archived
            } else {
                repo.maturity.clone()
            };

            MergedRepo {
                name: repo.name.clone(),
                category: repo.category.clone(),
                url,
                description,
                language: meta.language.clone(),
                last_commit: meta.last_commit.clone(),
                version: repo.version.clone().unwrap_or_default(),
                maturity,
                ci: ci.get(&repo.name).copied().unwrap_or_default(),
                private: repo.private,
                archived: meta.archived,
            }
        })
        .collect()
}

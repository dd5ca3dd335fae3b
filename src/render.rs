// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

/// Markdown generation for the managed README sections.
///
/// Produces the overview summary, one table per category and the
/// last-updated footer from merged repository records.
use chrono::{DateTime, Utc};

use crate::{
    badge::{PLACEHOLDER, ci_glyph, language_display, maturity_badge},
    config::{Category, IndexConfig, Maturity},
    merge::MergedRepo,
};

/// Renders the overview summary: repository counts, language distribution
/// and maturity counts.
///
/// Languages are ordered by descending repository count; ties keep the order
/// in which the languages were first encountered.
///
/// # Example
///
/// ```
/// use repo_index::render_overview;
///
/// let overview = render_overview(&[]);
/// assert_eq!(
///     overview,
///     "**0 repos** — 0 public, 0 private\n\n0 actively developed · 0 experimental"
/// );
/// ```
pub fn render_overview(repos: &[MergedRepo]) -> String {
    let total = repos.len();
    let private = repos.iter().filter(|repo| repo.private).count();
    let public = total - private;

    let mut languages: Vec<(&str, usize)> = Vec::new();
    for repo in repos.iter().filter(|repo| !repo.language.is_empty()) {
        match languages
            .iter_mut()
            .find(|(language, _)| *language == repo.language)
        {
            Some((_, count)) => *count += 1,
            None => languages.push((repo.language.as_str(), 1))
        }
    }
    languages.sort_by(|left, right| right.1.cmp(&left.1));

    let active = count_maturity(repos, &Maturity::Active);
    let experimental = count_maturity(repos, &Maturity::Experimental);

    let mut overview = format!("**{total} repos** — {public} public, {private} private\n\n");
    if !languages.is_empty() {
        let parts: Vec<String> = languages
            .iter()
            .map(|(language, count)| format!("**{}** ({count})", language_display(language)))
            .collect();
        overview.push_str(&format!("Languages: {}\n\n", parts.join(" · ")));
    }
    overview.push_str(&format!(
        "{active} actively developed · {experimental} experimental"
    ));

    overview
}

fn count_maturity(repos: &[MergedRepo], maturity: &Maturity) -> usize {
    repos.iter().filter(|repo| &repo.maturity == maturity).count()
}

/// Renders every non-empty category table in configuration order, separated
/// by blank lines.
pub fn render_repos_section(config: &IndexConfig, repos: &[MergedRepo]) -> String {
    config
        .categories
        .iter()
        .filter_map(|category| render_category_table(category, &config.version_label, repos))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders the table for one category, or `None` when no repository belongs
/// to it.
pub fn render_category_table(
    category: &Category,
    version_label: &str,
    repos: &[MergedRepo]
) -> Option<String> {
    let members: Vec<&MergedRepo> = repos
        .iter()
        .filter(|repo| repo.category == category.id)
        .collect();
    if members.is_empty() {
        return None;
    }

    let heading = if category.icon.is_empty() {
        format!("### {}", category.title)
    } else {
        format!("### {} {}", category.icon, category.title)
    };

    let mut lines = Vec::with_capacity(members.len() + 4);
    lines.push(heading);
    lines.push(String::new());
    lines.push(format!(
        "| Repo | Description | Language | Last Commit | {} | Status | CI |",
        escape_cell(version_label)
    ));
    lines.push("|------|-------------|----------|-------------|-------|--------|----|".to_owned());
    lines.extend(members.into_iter().map(render_row));

    Some(lines.join("\n"))
}

fn render_row(repo: &MergedRepo) -> String {
    let link = if repo.private {
        format!("{} *(private)*", escape_cell(&repo.name))
    } else {
        format!("[{}]({})", escape_cell(&repo.name), repo.url)
    };

    format!(
        "| {link} | {} | {} | {} | {} | {} | {} |",
        escape_cell(&repo.description),
        or_placeholder(&repo.language),
        or_placeholder(&repo.last_commit),
        or_placeholder(&repo.version),
        escape_cell(maturity_badge(&repo.maturity)),
        ci_glyph(repo.ci)
    )
}

fn or_placeholder(value: &str) -> String {
    if value.is_empty() {
        PLACEHOLDER.to_owned()
    } else {
        escape_cell(value)
    }
}

/// Keeps cell text on one line and prevents it from splitting the row.
fn escape_cell(text: &str) -> String {
    text.replace(['\r', '\n'], " ").replace('|', "\\|")
}

/// Renders the last-updated footer with minute precision.
pub fn render_updated(now: DateTime<Utc>) -> String {
    format!("*Last auto-update: {}*", now.format("%Y-%m-%d %H:%M UTC"))
}

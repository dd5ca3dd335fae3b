// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Static lookup tables used when rendering repository rows.
//!
//! Maturity labels map to shields.io badge images, a handful of language
//! names are shortened for the overview, and CI statuses map to glyphs.
//! Lookups that miss fall back to the raw input.

use crate::{config::Maturity, github::CiStatus};

/// Badge image markdown keyed by maturity label.
pub const MATURITY_BADGES: &[(&str, &str)] = &[
    ("active", "![active](https://img.shields.io/badge/active-brightgreen)"),
    ("maintained", "![maintained](https://img.shields.io/badge/maintained-blue)"),
    ("experimental", "![experimental](https://img.shields.io/badge/experimental-yellow)"),
    ("archived", "![archived](https://img.shields.io/badge/archived-lightgrey)")
];

/// Display names substituted for GitHub language names in the overview.
pub const LANGUAGE_DISPLAY: &[(&str, &str)] = &[
    ("C#", "C#"),
    ("Python", "Python"),
    ("JavaScript", "JS"),
    ("TypeScript", "TS"),
    ("HTML", "HTML"),
    ("GDScript", "GDScript")
];

/// Placeholder rendered for empty cells and unknown CI status.
pub const PLACEHOLDER: &str = "—";

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, value)| *value)
}

/// Returns the badge markdown for a maturity label, or the label itself when
/// no badge is registered for it.
pub fn maturity_badge(maturity: &Maturity) -> &str {
    lookup(MATURITY_BADGES, maturity.as_str()).unwrap_or(maturity.as_str())
}

/// Returns the overview display name for a GitHub language name.
pub fn language_display(language: &str) -> &str {
    lookup(LANGUAGE_DISPLAY, language).unwrap_or(language)
}

/// Returns the glyph rendered in the CI column.
pub fn ci_glyph(status: CiStatus) -> &'static str {
    match status {
        CiStatus::Pass => "✅",
        CiStatus::Fail => "❌",
        CiStatus::Unknown => PLACEHOLDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_maturity_labels_render_badges() {
        assert_eq!(
            maturity_badge(&Maturity::Active),
            "![active](https://img.shields.io/badge/active-brightgreen)"
        );
        assert_eq!(
            maturity_badge(&Maturity::Archived),
            "![archived](https://img.shields.io/badge/archived-lightgrey)"
        );
        assert!(maturity_badge(&Maturity::Maintained).contains("maintained-blue"));
        assert!(maturity_badge(&Maturity::Experimental).contains("experimental-yellow"));
    }

    #[test]
    fn unknown_maturity_label_falls_back_to_text() {
        let maturity = Maturity::Other("legacy".to_owned());
        assert_eq!(maturity_badge(&maturity), "legacy");
    }

    #[test]
    fn language_display_shortens_known_names() {
        assert_eq!(language_display("JavaScript"), "JS");
        assert_eq!(language_display("TypeScript"), "TS");
        assert_eq!(language_display("Python"), "Python");
        assert_eq!(language_display("Rust"), "Rust");
    }

    #[test]
    fn ci_glyphs_cover_every_status() {
        assert_eq!(ci_glyph(CiStatus::Pass), "✅");
        assert_eq!(ci_glyph(CiStatus::Fail), "❌");
        assert_eq!(ci_glyph(CiStatus::Unknown), "—");
    }
}

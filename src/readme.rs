// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

/// Updates marker-delimited regions of a README.
///
/// Each managed region is bounded by two comment lines:
///
/// ```text
/// <!-- overview starts -->
/// ...generated content...
/// <!-- overview ends -->
/// ```
///
/// Only the text between the markers is replaced; the marker lines and the
/// rest of the document are left untouched. A region whose markers are
/// missing is skipped with a warning.
use std::{fs, path::Path};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{self, Error};

/// Marker name of the overview summary region.
pub const OVERVIEW_MARKER: &str = "overview";
/// Marker name of the category tables region.
pub const REPOS_MARKER: &str = "repos";
/// Marker name of the last-updated footer region.
pub const UPDATED_MARKER: &str = "updated";

/// Result of patching a document in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Patched document text.
    pub document: String,
    /// Marker names that were not found, in the order they were requested.
    pub missing_markers: Vec<String>,
}

/// Replaces the interior of the first `marker` region with `content`.
///
/// Returns `None` when the document contains no complete marker pair for
/// `marker`. The content is inserted literally.
///
/// # Example
///
/// ```
/// use repo_index::replace_section;
///
/// let document = "intro\n<!-- repos starts -->\nold\n<!-- repos ends -->\noutro\n";
/// let patched = replace_section(document, "repos", "new").expect("markers present");
/// assert_eq!(
///     patched,
///     "intro\n<!-- repos starts -->\nnew\n<!-- repos ends -->\noutro\n"
/// );
/// ```
pub fn replace_section(document: &str, marker: &str, content: &str) -> Option<String> {
    let escaped = regex::escape(marker);
    let pattern = format!(r"(?s)<!-- {escaped} starts -->\n(.*?)<!-- {escaped} ends -->");
    let Ok(region) = Regex::new(&pattern) else {
        warn!("Marker '{}' cannot be matched", marker);
        return None;
    };

    let interior = region.captures(document)?.get(1)?;

    let mut result = String::with_capacity(document.len() + content.len());
    result.push_str(&document[..interior.start()]);
    result.push_str(content);
    result.push('\n');
    result.push_str(&document[interior.end()..]);

    Some(result)
}

/// Applies `(marker, content)` replacements in order.
///
/// Missing markers are logged and collected; the document is otherwise
/// unchanged for those regions.
pub fn patch_document(document: &str, sections: &[(&str, String)]) -> PatchOutcome {
    let mut patched = document.to_owned();
    let mut missing_markers = Vec::new();

    for (marker, content) in sections {
        match replace_section(&patched, marker, content) {
            Some(updated) => {
                debug!("Replaced '{}' region", marker);
                patched = updated;
            }
            None => {
                warn!("Marker '{}' not found in README", marker);
                missing_markers.push((*marker).to_owned());
            }
        }
    }

    PatchOutcome {
        document: patched,
        missing_markers
    }
}

/// Reads the README, patches the given regions and writes it back when the
/// text changed.
///
/// Returns the patch outcome together with whether the file was rewritten.
///
/// # Errors
///
/// Returns [`Error::Io`] when the README cannot be read and
/// [`Error::Write`] when the patched text cannot be written.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use repo_index::update_readme;
///
/// # fn main() -> Result<(), repo_index::Error> {
/// let sections = [("updated", "*Last auto-update: never*".to_owned())];
/// update_readme(Path::new("README.md"), &sections)?;
/// # Ok(())
/// # }
/// ```
pub fn update_readme(
    readme_path: &Path,
    sections: &[(&str, String)]
) -> Result<(PatchOutcome, bool), Error> {
    info!("Reading README from {}", readme_path.display());
    let content =
        fs::read_to_string(readme_path).map_err(|source| error::io_error(readme_path, source))?;

    let outcome = patch_document(&content, sections);
    let changed = outcome.document != content;

    if changed {
        info!("Writing updated README to {}", readme_path.display());
        fs::write(readme_path, &outcome.document)
            .map_err(|source| error::write_error(readme_path, source))?;
        info!("README updated successfully");
    } else {
        info!("No changes to README");
    }

    Ok((outcome, changed))
}

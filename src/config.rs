//! Configuration document types describing the tracked repositories.
//!
//! The YAML document consumed by the CLI lists the account that owns the
//! repositories, per-repository manual metadata and the presentational
//! category definitions. Mapping order is significant: repositories and
//! categories are rendered in the order they are declared, so both mappings
//! are decoded into ordered vectors instead of hash maps.

use std::{collections::HashSet, fmt, fs, marker::PhantomData, path::Path};

use serde::{
    Deserialize, Deserializer,
    de::{MapAccess, Visitor},
};
use tracing::{debug, warn};

use crate::error::{self, Error};

const DEFAULT_VERSION_LABEL: &str = "Version";

/// Root configuration describing every tracked repository.
///
/// # Examples
///
/// ```
/// use repo_index::parse_config;
///
/// let yaml = r#"
/// owner: octocat
/// repos:
///   hello-world:
///     category: tools
/// categories:
///   tools:
///     icon: "🔧"
///     title: Tools
/// "#;
/// let config = parse_config(yaml).expect("valid configuration");
/// assert_eq!(config.repos.len(), 1);
/// assert_eq!(config.repos[0].name, "hello-world");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// GitHub account that owns every tracked repository.
    pub owner: String,
    /// Tracked repositories in declaration order.
    pub repos: Vec<RepoConfig>,
    /// Category definitions in declaration order.
    pub categories: Vec<Category>,
    /// Header used for the version column of the category tables.
    pub version_label: String,
}

impl IndexConfig {
    /// Returns the names of repositories that are not flagged private.
    ///
    /// Only these names are sent to the GitHub API.
    pub fn public_repo_names(&self) -> Vec<String> {
        self.repos.iter().filter(|repo| !repo.private).map(|repo| repo.name.clone()).collect()
    }

    /// Looks up a category definition by identifier.
    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }
}

/// Manual metadata recorded for a single repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoConfig {
    /// Repository name under the configured owner.
    pub name: String,
    /// Identifier of the category the repository is listed under.
    pub category: String,
    /// Manual description overriding the one reported by GitHub.
    pub short_description: Option<String>,
    /// Manual version tag shown in the version column.
    pub version: Option<String>,
    /// Maturity label, `maintained` unless configured otherwise.
    pub maturity: Maturity,
    /// Private repositories are never queried and are rendered unlinked.
    pub private: bool,
}

/// Presentational category definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Identifier referenced by [`RepoConfig::category`].
    pub id: String,
    /// Icon prefixed to the category heading. May be empty.
    pub icon: String,
    /// Heading text, falling back to the identifier.
    pub title: String,
}

/// Maturity label attached to a repository.
///
/// Unknown labels are preserved verbatim so they can still be rendered as
/// plain text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum Maturity {
    /// Under active development.
    Active,
    /// Stable and receiving fixes.
    #[default]
    Maintained,
    /// Early-stage or exploratory work.
    Experimental,
    /// No longer developed. Forced when GitHub reports the repository as
    /// archived.
    Archived,
    /// Any other label supplied by the configuration.
    Other(String),
}

impl Maturity {
    /// Returns the label as written in the configuration.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Maintained => "maintained",
            Self::Experimental => "experimental",
            Self::Archived => "archived",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for Maturity {
    fn from(label: String) -> Self {
        match label.trim() {
            "active" => Self::Active,
            "" | "maintained" => Self::Maintained,
            "experimental" => Self::Experimental,
            "archived" => Self::Archived,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for Maturity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    owner: String,

    #[serde(deserialize_with = "deserialize_ordered")]
    repos: Vec<(String, RepoEntry)>,

    #[serde(deserialize_with = "deserialize_ordered")]
    categories: Vec<(String, CategoryEntry)>,

    #[serde(default)]
    version_label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepoEntry {
    category: String,

    #[serde(default, alias = "description")]
    short_description: Option<String>,

    #[serde(default, alias = "rhino_version", alias = "version_tag")]
    version: Option<String>,

    #[serde(default)]
    maturity: Option<Maturity>,

    #[serde(default)]
    private: bool,
}

#[derive(Debug, Default, Deserialize)]
struct CategoryEntry {
    #[serde(default)]
    icon: Option<String>,

    #[serde(default)]
    title: Option<String>,
}

/// Loads the configuration from the provided YAML file path.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read and propagates the
/// errors of [`parse_config`].
pub fn load_config(path: &Path) -> Result<IndexConfig, Error> {
    debug!("Reading config from {}", path.display());
    let contents = fs::read_to_string(path).map_err(|source| error::io_error(path, source))?;
    parse_config(&contents)
}

/// Parses the configuration from a YAML document string.
///
/// # Errors
///
/// Returns [`Error::Parse`] when the YAML cannot be decoded and
/// [`Error::Validation`] when the owner is blank, no repositories are
/// listed, or a repository or category is declared twice.
pub fn parse_config(contents: &str) -> Result<IndexConfig, Error> {
    let document: ConfigDocument = serde_yaml::from_str(contents)?;

    let owner = document.owner.trim();
    if owner.is_empty() {
        return Err(Error::validation("owner must not be empty"));
    }
    if document.repos.is_empty() {
        return Err(Error::validation("configuration must include at least one repository"));
    }

    let mut seen_categories = HashSet::with_capacity(document.categories.len());
    let mut categories = Vec::with_capacity(document.categories.len());
    for (id, entry) in document.categories {
        if !seen_categories.insert(id.clone()) {
            return Err(Error::validation(format!("duplicate category '{id}'")));
        }
        categories.push(Category {
            icon: entry.icon.map(|icon| icon.trim().to_owned()).unwrap_or_default(),
            title: non_blank(entry.title).unwrap_or_else(|| id.clone()),
            id,
        });
    }

    let mut seen_repos = HashSet::with_capacity(document.repos.len());
    let mut repos = Vec::with_capacity(document.repos.len());
    for (name, entry) in document.repos {
        let name = name.trim().to_owned();
        if name.is_empty() {
            return Err(Error::validation("repository names cannot be empty strings"));
        }
        if !seen_repos.insert(name.clone()) {
            return Err(Error::validation(format!("duplicate repository '{name}'")));
        }
        if !seen_categories.contains(&entry.category) {
            warn!("Repository '{}' references undeclared category '{}'", name, entry.category);
        }

        repos.push(RepoConfig {
            name,
            category: entry.category,
            short_description: non_blank(entry.short_description),
            version: non_blank(entry.version),
            maturity: entry.maturity.unwrap_or_default(),
            private: entry.private,
        });
    }

    Ok(IndexConfig {
        owner: owner.to_owned(),
        repos,
        categories,
        version_label: non_blank(document.version_label)
            .unwrap_or_else(|| DEFAULT_VERSION_LABEL.to_owned()),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|text| text.trim().to_owned()).filter(|text| !text.is_empty())
}

/// Decodes a YAML mapping into `(key, value)` pairs in declaration order.
fn deserialize_ordered<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct OrderedVisitor<T>(PhantomData<T>);

    impl<'de, T> Visitor<'de> for OrderedVisitor<T>
    where
        T: Deserialize<'de>,
    {
        type Value = Vec<(String, T)>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a mapping keyed by name")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, T>()? {
                entries.push((key, value));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_any(OrderedVisitor(PhantomData))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{Maturity, load_config, parse_config};
    use crate::Error;

    const SAMPLE: &str = r#"
owner: octocat
repos:
  zeta-tool:
    category: tools
    short_description: "  Manual zeta  "
    rhino_version: "8"
    maturity: active
  alpha-lib:
    category: libs
    private: true
  beta-tool:
    category: tools
    maturity: legacy
categories:
  tools:
    icon: "🔧"
    title: Tools
  libs:
    title: Libraries
"#;

    #[test]
    fn parse_config_preserves_declaration_order() {
        let config = parse_config(SAMPLE).expect("valid configuration");

        let names: Vec<&str> = config.repos.iter().map(|repo| repo.name.as_str()).collect();
        assert_eq!(names, ["zeta-tool", "alpha-lib", "beta-tool"]);

        let categories: Vec<&str> =
            config.categories.iter().map(|category| category.id.as_str()).collect();
        assert_eq!(categories, ["tools", "libs"]);
    }

    #[test]
    fn parse_config_applies_defaults_and_aliases() {
        let config = parse_config(SAMPLE).expect("valid configuration");

        let zeta = &config.repos[0];
        assert_eq!(zeta.short_description.as_deref(), Some("Manual zeta"));
        assert_eq!(zeta.version.as_deref(), Some("8"));
        assert_eq!(zeta.maturity, Maturity::Active);
        assert!(!zeta.private);

        let alpha = &config.repos[1];
        assert!(alpha.private);
        assert_eq!(alpha.maturity, Maturity::Maintained);
        assert!(alpha.short_description.is_none());

        let libs = config.category("libs").expect("libs category");
        assert_eq!(libs.icon, "");
        assert_eq!(libs.title, "Libraries");
        assert_eq!(config.version_label, "Version");
    }

    #[test]
    fn unknown_maturity_label_is_kept_verbatim() {
        let config = parse_config(SAMPLE).expect("valid configuration");
        assert_eq!(config.repos[2].maturity, Maturity::Other("legacy".to_owned()));
        assert_eq!(config.repos[2].maturity.as_str(), "legacy");
    }

    #[test]
    fn public_repo_names_skip_private_entries() {
        let config = parse_config(SAMPLE).expect("valid configuration");
        assert_eq!(config.public_repo_names(), ["zeta-tool", "beta-tool"]);
    }

    #[test]
    fn category_title_defaults_to_identifier() {
        let yaml = r#"
owner: octocat
version_label: Rhino
repos:
  one:
    category: misc
categories:
  misc: {}
"#;
        let config = parse_config(yaml).expect("valid configuration");
        assert_eq!(config.categories[0].title, "misc");
        assert_eq!(config.version_label, "Rhino");
    }

    #[test]
    fn parse_config_rejects_duplicate_repository() {
        let yaml = r#"
owner: octocat
repos:
  one:
    category: misc
  " one ":
    category: misc
categories:
  misc: {}
"#;
        let error = parse_config(yaml).expect_err("expected duplicate error");
        match error {
            Error::Validation { message } => assert_eq!(message, "duplicate repository 'one'"),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn parse_config_rejects_blank_owner() {
        let yaml = "owner: '  '\nrepos:\n  one:\n    category: misc\ncategories: {}\n";
        let error = parse_config(yaml).expect_err("expected validation error");
        assert!(matches!(error, Error::Validation { .. }));
    }

    #[test]
    fn parse_config_rejects_empty_repos() {
        let error = parse_config("owner: octocat\nrepos: {}\ncategories: {}\n")
            .expect_err("expected error");
        assert!(error.to_string().contains("at least one repository"));
    }

    #[test]
    fn parse_config_reports_missing_keys_as_parse_errors() {
        let error = parse_config("repos: {}\n").expect_err("expected parse error");
        assert!(matches!(error, Error::Parse { .. }));

        let error = parse_config("owner: octocat\nrepos:\n  one: {}\ncategories: {}\n")
            .expect_err("category is required");
        assert!(matches!(error, Error::Parse { .. }));

        let error = parse_config("owner: octocat\nrepos:\n  one:\n    category: games\n")
            .expect_err("categories are required");
        match error {
            Error::Parse { source } => assert!(source.to_string().contains("categories")),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn load_config_reports_missing_file() {
        let temp = tempdir().expect("failed to create tempdir");
        let error =
            load_config(&temp.path().join("repos.yaml")).expect_err("expected io error");
        assert!(matches!(error, Error::Io { .. }));
    }

    #[test]
    fn load_config_reads_file() {
        let temp = tempdir().expect("failed to create tempdir");
        let path = temp.path().join("repos.yaml");
        fs::write(&path, SAMPLE).expect("failed to write config");

        let config = load_config(&path).expect("valid configuration");
        assert_eq!(config.owner, "octocat");
    }
}

// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

/// End-to-end README refresh.
///
/// Loads the configuration, fetches live data for public repositories,
/// merges it with the manual metadata, renders the managed sections and
/// patches them into the README. Only setup failures abort the run.
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::{
    config::{IndexConfig, load_config},
    error::{self, Error},
    github::{CiStatus, GitHubClient, RepositorySource},
    merge::merge_repos,
    readme::{OVERVIEW_MARKER, REPOS_MARKER, UPDATED_MARKER, update_readme},
    render::{render_overview, render_repos_section, render_updated},
};

/// Inputs of a refresh run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOptions {
    /// README whose marker regions are rewritten.
    pub readme_path: PathBuf,
    /// YAML configuration listing the tracked repositories.
    pub config_path: PathBuf,
    /// Skips the per-repository CI status requests.
    pub skip_ci: bool,
}

/// Summary of a completed refresh run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Number of configured repositories.
    pub total: usize,
    /// Number of public repositories.
    pub public: usize,
    /// Number of private repositories.
    pub private: usize,
    /// Repositories for which GitHub returned metadata.
    pub fetched: usize,
    /// Repositories whose latest completed run passed.
    pub ci_passing: usize,
    /// Repositories whose latest completed run failed.
    pub ci_failing: usize,
    /// Marker regions that were absent from the README.
    pub missing_markers: Vec<String>,
    /// Whether the README file was rewritten.
    pub changed: bool,
}

/// Refreshes the README using the GitHub API.
///
/// The configuration is loaded and the README is checked for existence
/// before any request is issued.
///
/// # Errors
///
/// Returns [`Error`] when the configuration cannot be loaded, the README is
/// missing or unwritable, or the GitHub client cannot be created.
///
/// # Example
///
/// ```no_run
/// use repo_index::{RefreshOptions, refresh};
///
/// # async fn example() -> Result<(), repo_index::Error> {
/// let options = RefreshOptions {
///     readme_path: "README.md".into(),
///     config_path: "repos.yaml".into(),
///     skip_ci:     false,
/// };
/// let token = std::env::var("GITHUB_TOKEN").ok();
/// let report = refresh(&options, token.as_deref()).await?;
/// println!("{} repositories rendered", report.total);
/// # Ok(())
/// # }
/// ```
pub async fn refresh(
    options: &RefreshOptions,
    token: Option<&str>,
) -> Result<RefreshReport, Error> {
    info!("Config: {}", options.config_path.display());
    info!("README: {}", options.readme_path.display());

    let config = load_config(&options.config_path)?;
    ensure_readable(&options.readme_path)?;

    let client = GitHubClient::new(&config.owner, token)?;
    info!("Querying repositories of {}", client.owner());
    refresh_with_source(&config, options, &client, Utc::now()).await
}

/// Refreshes the README from an already loaded configuration using the
/// provided repository source.
///
/// `now` is rendered into the last-updated footer.
///
/// # Errors
///
/// Returns [`Error::Io`] when the README cannot be read and
/// [`Error::Write`] when it cannot be written back.
pub async fn refresh_with_source<S>(
    config: &IndexConfig,
    options: &RefreshOptions,
    source: &S,
    now: DateTime<Utc>
) -> Result<RefreshReport, Error>
where
    S: RepositorySource
{
    let public_names = config.public_repo_names();
    let total = config.repos.len();
    info!(
        "Found {} repos in config: {} public, {} private",
        total,
        public_names.len(),
        total - public_names.len()
    );

    info!("Fetching repository metadata");
    let fetched = source.fetch_bulk_metadata(&public_names).await;
    info!("Got data for {} repos", fetched.len());

    let ci = if options.skip_ci || !source.has_credential() {
        info!("Skipping CI status checks");
        HashMap::new()
    } else {
        fetch_ci_statuses(source, &public_names).await
    };

    let repos = merge_repos(config, &fetched, &ci);

    let sections = [
        (OVERVIEW_MARKER, render_overview(&repos)),
        (REPOS_MARKER, render_repos_section(config, &repos)),
        (UPDATED_MARKER, render_updated(now)),
    ];
    let (outcome, changed) = update_readme(&options.readme_path, &sections)?;

    Ok(RefreshReport {
        total,
        public: public_names.len(),
        private: total - public_names.len(),
        fetched: fetched.len(),
        ci_passing: count_status(&ci, CiStatus::Pass),
        ci_failing: count_status(&ci, CiStatus::Fail),
        missing_markers: outcome.missing_markers,
        changed
    })
}

async fn fetch_ci_statuses<S>(source: &S, names: &[String]) -> HashMap<String, CiStatus>
where
    S: RepositorySource
{
    let pb = ProgressBar::new(names.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.yellow} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    );

    let mut statuses = HashMap::with_capacity(names.len());
    for name in names {
        pb.set_message(format!("Fetching CI status for {name}..."));
        let status = source.fetch_ci_status(name).await;
        if status != CiStatus::Unknown {
            info!("  {}: {:?}", name, status);
        } else {
            debug!("  {}: no CI status", name);
        }
        statuses.insert(name.clone(), status);
        pb.inc(1);
    }
    pb.finish_and_clear();

    statuses
}

fn count_status(statuses: &HashMap<String, CiStatus>, wanted: CiStatus) -> usize {
    statuses.values().filter(|status| **status == wanted).count()
}

fn ensure_readable(path: &Path) -> Result<(), Error> {
    fs::metadata(path)
        .map(|_| ())
        .map_err(|source| error::io_error(path, source))
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap};

    use chrono::TimeZone;
    use tempfile::{TempDir, tempdir};

    use super::*;
    use crate::{config::parse_config, github::FetchedMeta};

    const README: &str = "# Hub\n\n<!-- overview starts -->\n<!-- overview ends -->\n\n\
                          <!-- repos starts -->\nstale\n<!-- repos ends -->\n\n\
                          <!-- updated starts -->\n<!-- updated ends -->\n";

    const CONFIG: &str = r#"
owner: octocat
repos:
  A:
    category: tools
    maturity: active
  B:
    category: tools
    private: true
categories:
  tools:
    icon: "🔧"
    title: Tools
  empty:
    title: Nothing Here
"#;

    struct FakeSource {
        credential: bool,
        metadata: HashMap<String, FetchedMeta>,
        ci: HashMap<String, CiStatus>,
        requested: RefCell<Vec<String>>,
    }

    impl FakeSource {
        fn new(credential: bool) -> Self {
            Self {
                credential,
                metadata: HashMap::from([(
                    "A".to_owned(),
                    FetchedMeta {
                        description: "Alpha tool".to_owned(),
                        url: "https://github.com/octocat/A".to_owned(),
                        language: "Rust".to_owned(),
                        last_commit: "2024-05-01".to_owned(),
                        archived: false,
                    }
                )]),
                ci: HashMap::from([("A".to_owned(), CiStatus::Pass)]),
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl RepositorySource for FakeSource {
        fn has_credential(&self) -> bool {
            self.credential
        }

        async fn fetch_bulk_metadata(&self, names: &[String]) -> HashMap<String, FetchedMeta> {
            self.requested.borrow_mut().extend(names.iter().cloned());
            names
                .iter()
                .filter_map(|name| self.metadata.get(name).map(|meta| (name.clone(), meta.clone())))
                .collect()
        }

        async fn fetch_ci_status(&self, name: &str) -> CiStatus {
            self.ci.get(name).copied().unwrap_or_default()
        }
    }

    fn workspace() -> (TempDir, RefreshOptions) {
        let temp = tempdir().expect("failed to create tempdir");
        let readme_path = temp.path().join("README.md");
        let config_path = temp.path().join("repos.yaml");
        fs::write(&readme_path, README).expect("failed to write README");
        fs::write(&config_path, CONFIG).expect("failed to write config");

        let options = RefreshOptions {
            readme_path,
            config_path,
            skip_ci: true,
        };
        (temp, options)
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 2, 8, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn refresh_renders_public_and_private_rows() {
        let (_temp, options) = workspace();
        let config = load_config(&options.config_path).expect("valid configuration");
        let source = FakeSource::new(true);

        let report = refresh_with_source(&config, &options, &source, fixed_now())
            .await
            .expect("refresh failed");

        assert_eq!(*source.requested.borrow(), ["A"]);
        assert_eq!(report.total, 2);
        assert_eq!(report.public, 1);
        assert_eq!(report.private, 1);
        assert_eq!(report.fetched, 1);
        assert_eq!(report.ci_passing, 0);
        assert!(report.missing_markers.is_empty());
        assert!(report.changed);

        let readme = fs::read_to_string(&options.readme_path).expect("README readable");
        assert!(readme.contains(
            "<!-- overview starts -->\n**2 repos** — 1 public, 1 private\n\n\
             Languages: **Rust** (1)\n\n1 actively developed · 0 experimental\n<!-- overview ends -->"
        ));
        assert!(readme.contains(
            "| [A](https://github.com/octocat/A) | Alpha tool | Rust | 2024-05-01 | — | \
             ![active](https://img.shields.io/badge/active-brightgreen) | — |"
        ));
        assert!(readme.contains(
            "| B *(private)* |  | — | — | — | \
             ![maintained](https://img.shields.io/badge/maintained-blue) | — |"
        ));
        assert!(!readme.contains("Nothing Here"));
        assert!(!readme.contains("stale"));
        assert!(readme.contains(
            "<!-- updated starts -->\n*Last auto-update: 2024-06-02 08:30 UTC*\n<!-- updated ends -->"
        ));
    }

    #[tokio::test]
    async fn refresh_fetches_ci_when_enabled() {
        let (_temp, mut options) = workspace();
        options.skip_ci = false;
        let config = load_config(&options.config_path).expect("valid configuration");

        let report = refresh_with_source(&config, &options, &FakeSource::new(true), fixed_now())
            .await
            .expect("refresh failed");

        assert_eq!(report.ci_passing, 1);
        let readme = fs::read_to_string(&options.readme_path).expect("README readable");
        assert!(readme.contains("brightgreen) | ✅ |"));
    }

    #[tokio::test]
    async fn refresh_skips_ci_without_credential() {
        let (_temp, mut options) = workspace();
        options.skip_ci = false;
        let config = load_config(&options.config_path).expect("valid configuration");

        let report = refresh_with_source(&config, &options, &FakeSource::new(false), fixed_now())
            .await
            .expect("refresh failed");

        assert_eq!(report.ci_passing, 0);
    }

    #[tokio::test]
    async fn refresh_reports_missing_markers_and_continues() {
        let (_temp, options) = workspace();
        fs::write(&options.readme_path, "# Hub\n<!-- repos starts -->\n<!-- repos ends -->\n")
            .expect("failed to write README");
        let config = parse_config(CONFIG).expect("valid configuration");

        let report = refresh_with_source(&config, &options, &FakeSource::new(true), fixed_now())
            .await
            .expect("refresh failed");

        assert_eq!(report.missing_markers, ["overview", "updated"]);
        let readme = fs::read_to_string(&options.readme_path).expect("README readable");
        assert!(readme.starts_with("# Hub\n<!-- repos starts -->\n### 🔧 Tools\n"));
    }

    #[tokio::test]
    async fn refresh_fails_when_readme_is_missing() {
        let (temp, mut options) = workspace();
        options.readme_path = temp.path().join("MISSING.md");

        let error = refresh(&options, None).await.expect_err("expected io error");
        assert!(matches!(error, Error::Io { .. }));
    }

    #[tokio::test]
    async fn refresh_fails_when_config_is_invalid() {
        let (_temp, options) = workspace();
        fs::write(&options.config_path, "owner: [unterminated").expect("failed to write config");

        let error = refresh(&options, None).await.expect_err("expected parse error");
        assert!(matches!(error, Error::Parse { .. }));
    }

    #[tokio::test]
    async fn refresh_without_token_uses_manual_data() {
        let (_temp, options) = workspace();

        let report = refresh(&options, None).await.expect("refresh failed");

        assert_eq!(report.fetched, 0);
        let readme = fs::read_to_string(&options.readme_path).expect("README readable");
        assert!(readme.contains("| [A](https://github.com/octocat/A) |  | — | — | — |"));
    }
}

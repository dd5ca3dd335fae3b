// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! GitHub API access for repository metadata and CI status.
//!
//! Metadata for every public repository is fetched with one aliased GraphQL
//! query; CI status is fetched per repository from the Actions REST API.
//! Neither operation fails: unresolvable repositories are omitted from the
//! metadata map and CI lookups that go wrong collapse to
//! [`CiStatus::Unknown`].
use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, Utc};
use masterror::AppError;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tokio::time::timeout;
use tracing::{debug, info, warn};

const BULK_TIMEOUT: Duration = Duration::from_secs(30);
const CI_TIMEOUT: Duration = Duration::from_secs(10);

const REPOSITORY_FRAGMENT: &str = "fragment RepositoryFields on Repository {
  name
  description
  url
  primaryLanguage { name }
  defaultBranchRef { target { ... on Commit { committedDate } } }
  isArchived
}";

/// Metadata reported by GitHub for a single repository.
///
/// Missing values are represented by empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedMeta {
    /// Repository description.
    pub description: String,
    /// Canonical repository URL.
    pub url: String,
    /// Name of the primary language.
    pub language: String,
    /// Date of the latest commit on the default branch, `YYYY-MM-DD`.
    pub last_commit: String,
    /// Whether the repository is archived.
    pub archived: bool,
}

/// Outcome of the most recent completed workflow run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CiStatus {
    /// The run concluded successfully.
    Pass,
    /// The run failed or timed out.
    Fail,
    /// No run, no CI, another conclusion, or the lookup failed.
    #[default]
    Unknown,
}

impl CiStatus {
    /// Maps a workflow run conclusion to a status.
    pub fn from_conclusion(conclusion: Option<&str>) -> Self {
        match conclusion {
            Some("success") => Self::Pass,
            Some("failure" | "timed_out" | "timed-out") => Self::Fail,
            _ => Self::Unknown,
        }
    }
}

/// Source of live repository data consumed by the refresh pipeline.
pub trait RepositorySource {
    /// Reports whether authenticated requests can be issued.
    fn has_credential(&self) -> bool;

    /// Fetches metadata for the given repository names.
    ///
    /// Names that cannot be resolved are absent from the returned map.
    fn fetch_bulk_metadata(
        &self,
        names: &[String],
    ) -> impl Future<Output = HashMap<String, FetchedMeta>>;

    /// Fetches the conclusion of the latest completed workflow run.
    fn fetch_ci_status(&self, name: &str) -> impl Future<Output = CiStatus>;
}

/// GitHub-backed [`RepositorySource`].
///
/// The access token is supplied at construction time. Without one the
/// client issues no requests and every lookup degrades to its default.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    owner: String,
    octocrab: Option<Octocrab>,
}

impl GitHubClient {
    /// Creates a client for repositories owned by `owner`.
    ///
    /// Blank tokens are treated as absent. Must be called from within a
    /// Tokio runtime when a token is supplied.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] when the HTTP client cannot be initialized.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use repo_index::GitHubClient;
    ///
    /// # async fn example() -> Result<(), masterror::AppError> {
    /// let token = std::env::var("GITHUB_TOKEN").ok();
    /// let client = GitHubClient::new("octocat", token.as_deref())?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(owner: impl Into<String>, token: Option<&str>) -> Result<Self, AppError> {
        let owner = owner.into();
        let Some(token) = token.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(Self { owner, octocrab: None });
        };

        let octocrab = Octocrab::builder().personal_token(token).build().map_err(|e| {
            AppError::unauthorized(format!("failed to initialize GitHub client: {e}"))
        })?;
        Ok(Self::with_octocrab(owner, octocrab))
    }

    /// Creates an authenticated client around a preconfigured instance.
    pub(crate) fn with_octocrab(owner: impl Into<String>, octocrab: Octocrab) -> Self {
        Self { owner: owner.into(), octocrab: Some(octocrab) }
    }

    /// Account that owns the queried repositories.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    async fn query_bulk(
        &self,
        octocrab: &Octocrab,
        names: &[String],
    ) -> Result<BulkResponse, AppError> {
        let payload = json!({
            "query": build_bulk_query(names.len()),
            "variables": build_bulk_variables(&self.owner, names),
        });

        let response: BulkResponse = timeout(BULK_TIMEOUT, octocrab.graphql(&payload))
            .await
            .map_err(|_| {
                AppError::service(format!(
                    "GraphQL request timed out after {}s",
                    BULK_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| AppError::service(format!("GraphQL request failed: {e}")))?;

        Ok(response)
    }
}

impl RepositorySource for GitHubClient {
    fn has_credential(&self) -> bool {
        self.octocrab.is_some()
    }

    async fn fetch_bulk_metadata(&self, names: &[String]) -> HashMap<String, FetchedMeta> {
        let Some(octocrab) = self.octocrab.as_ref() else {
            warn!("No GitHub token supplied, using manual configuration only");
            return HashMap::new();
        };
        if names.is_empty() {
            return HashMap::new();
        }

        debug!("Fetching metadata for {} repositories of {}", names.len(), self.owner);
        match self.query_bulk(octocrab, names).await {
            Ok(response) => {
                let fetched = collect_bulk_response(&self.owner, names, response);
                info!("Fetched metadata for {}/{} repositories", fetched.len(), names.len());
                fetched
            }
            Err(error) => {
                warn!("Repository metadata unavailable: {}", error);
                HashMap::new()
            }
        }
    }

    async fn fetch_ci_status(&self, name: &str) -> CiStatus {
        let Some(octocrab) = self.octocrab.as_ref() else {
            return CiStatus::Unknown;
        };

        let route = format!("/repos/{}/{name}/actions/runs", self.owner);
        let query = RunsQuery {
            per_page: 1,
            status: "completed",
        };
        let request = octocrab.get::<WorkflowRuns, _, _>(route, Some(&query));

        match timeout(CI_TIMEOUT, request).await {
            Ok(Ok(runs)) => {
                let status = CiStatus::from_conclusion(runs.latest_conclusion());
                debug!("CI status for {}: {:?}", name, status);
                status
            }
            Ok(Err(octocrab::Error::GitHub { source, .. }))
                if source.status_code.as_u16() == 404 =>
            {
                debug!("No workflow runs available for {}", name);
                CiStatus::Unknown
            }
            Ok(Err(error)) => {
                warn!("CI status lookup failed for {}: {}", name, error);
                CiStatus::Unknown
            }
            Err(_) => {
                warn!("CI status lookup for {} timed out after {}s", name, CI_TIMEOUT.as_secs());
                CiStatus::Unknown
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct RunsQuery<'a> {
    per_page: u8,
    status: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct WorkflowRuns {
    #[serde(default)]
    workflow_runs: Vec<WorkflowRun>,
}

impl WorkflowRuns {
    fn latest_conclusion(&self) -> Option<&str> {
        self.workflow_runs.first().and_then(|run| run.conclusion.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct WorkflowRun {
    #[serde(default)]
    conclusion: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    data: Option<HashMap<String, Option<RepositoryNode>>>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    primary_language: Option<LanguageNode>,
    #[serde(default)]
    default_branch_ref: Option<BranchRef>,
    #[serde(default)]
    is_archived: bool,
}

#[derive(Debug, Deserialize)]
struct LanguageNode {
    name: String,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    #[serde(default)]
    target: Option<CommitTarget>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitTarget {
    #[serde(default)]
    committed_date: Option<String>,
}

/// Builds an aliased query selecting one repository per variable `$r{n}`.
fn build_bulk_query(count: usize) -> String {
    let mut declarations = String::from("$owner: String!");
    let mut selections = String::new();
    for index in 0..count {
        declarations.push_str(&format!(", $r{index}: String!"));
        selections.push_str(&format!(
            "\n  r{index}: repository(owner: $owner, name: $r{index}) {{ ...RepositoryFields }}"
        ));
    }

    format!("query({declarations}) {{{selections}\n}}\n{REPOSITORY_FRAGMENT}")
}

fn build_bulk_variables(owner: &str, names: &[String]) -> Value {
    let mut variables = Map::with_capacity(names.len() + 1);
    variables.insert("owner".to_owned(), Value::String(owner.to_owned()));
    for (index, name) in names.iter().enumerate() {
        variables.insert(format!("r{index}"), Value::String(name.clone()));
    }
    Value::Object(variables)
}

fn collect_bulk_response(
    owner: &str,
    names: &[String],
    response: BulkResponse,
) -> HashMap<String, FetchedMeta> {
    if !response.errors.is_empty() {
        let messages: Vec<&str> =
            response.errors.iter().map(|error| error.message.as_str()).collect();
        warn!("GraphQL reported {} error(s): {}", messages.len(), messages.join("; "));
    }

    let mut nodes = response.data.unwrap_or_default();
    let mut fetched = HashMap::with_capacity(names.len());
    for (index, name) in names.iter().enumerate() {
        let Some(node) = nodes.remove(&format!("r{index}")).flatten() else {
            debug!("No metadata returned for {}", name);
            continue;
        };

        let last_commit = node
            .default_branch_ref
            .and_then(|branch| branch.target)
            .and_then(|target| target.committed_date)
            .map(|date| commit_day(&date))
            .unwrap_or_default();

        fetched.insert(
            name.clone(),
            FetchedMeta {
                description: node.description.unwrap_or_default(),
                url: node
                    .url
                    .filter(|url| !url.is_empty())
                    .unwrap_or_else(|| format!("https://github.com/{owner}/{name}")),
                language: node.primary_language.map(|language| language.name).unwrap_or_default(),
                last_commit,
                archived: node.is_archived,
            },
        );
    }

    fetched
}

/// Reduces an RFC 3339 timestamp to its UTC calendar day.
fn commit_day(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(parsed) => parsed.with_timezone(&Utc).format("%Y-%m-%d").to_string(),
        Err(_) => timestamp.get(..10).unwrap_or(timestamp).to_owned(),
    }
}

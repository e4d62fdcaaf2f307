use chrono::Duration;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::ProjectConfig;
use crate::error::Result;
use crate::models::issue::Issue;
use crate::store::CacheStore;
use crate::tracker::{dedupe_issues, IssueQuery, RedmineClient};

/// Storage key for the raw issue cache.
pub const ISSUES_KEY: &str = "issues";

/// Fetch result for one configured project. A failed fetch stays
/// distinguishable from a project that legitimately has zero issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFetch {
    pub project: String,
    pub outcome: FetchOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchOutcome {
    Fetched(Vec<Issue>),
    NotFound,
    Failed(String),
}

/// Fetch issues for every configured project, one project at a time.
/// A failure is recorded on that project's outcome and the loop moves
/// on; only cancellation stops the walk early.
pub async fn fetch_all_projects(
    projects: &[ProjectConfig],
    query: &IssueQuery,
    cancel: &CancellationToken,
) -> Vec<ProjectFetch> {
    let mut outcomes = Vec::with_capacity(projects.len());
    for project in projects {
        if cancel.is_cancelled() {
            warn!("fetch cancelled before project '{}'", project.redmine_name);
            break;
        }

        let outcome = fetch_one_project(project, query, cancel).await;
        match &outcome {
            FetchOutcome::Fetched(issues) => {
                info!("fetched {} issues for project '{}'", issues.len(), project.redmine_name)
            }
            FetchOutcome::NotFound => {
                warn!("project '{}' not found in its tracker", project.redmine_name)
            }
            FetchOutcome::Failed(reason) => {
                warn!("fetch failed for project '{}': {reason}", project.redmine_name)
            }
        }
        outcomes.push(ProjectFetch {
            project: project.redmine_name.clone(),
            outcome,
        });
    }
    outcomes
}

async fn fetch_one_project(
    project: &ProjectConfig,
    query: &IssueQuery,
    cancel: &CancellationToken,
) -> FetchOutcome {
    let client = match RedmineClient::new(&project.redmine_url, &project.redmine_api_key) {
        Ok(client) => client,
        Err(err) => return FetchOutcome::Failed(err.to_string()),
    };

    let resolved = match client.resolve_project(&project.redmine_name).await {
        Ok(Some(found)) => found,
        Ok(None) => return FetchOutcome::NotFound,
        Err(err) => return FetchOutcome::Failed(err.to_string()),
    };

    match client
        .fetch_issues(&resolved.id.to_string(), query, cancel)
        .await
    {
        Ok(issues) => FetchOutcome::Fetched(issues),
        Err(err) => FetchOutcome::Failed(err.to_string()),
    }
}

/// Flatten the successful outcomes into one list, deduplicated by
/// issue id. Aggregation is order-independent; failed and not-found
/// projects contribute nothing.
pub fn merge_outcomes(outcomes: &[ProjectFetch]) -> Vec<Issue> {
    let merged: Vec<Issue> = outcomes
        .iter()
        .filter_map(|fetch| match &fetch.outcome {
            FetchOutcome::Fetched(issues) => Some(issues.clone()),
            FetchOutcome::NotFound | FetchOutcome::Failed(_) => None,
        })
        .flatten()
        .collect();
    dedupe_issues(merged)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResult {
    pub outcomes: Vec<ProjectFetch>,
    pub issues: Vec<Issue>,
}

/// Fetch every configured project, merge the results, and overwrite
/// the local issue cache. Per-project fetch failures are carried in the
/// outcomes; a persistence failure propagates.
pub async fn refresh_issue_cache(
    projects: &[ProjectConfig],
    query: &IssueQuery,
    store: &CacheStore,
    cancel: &CancellationToken,
) -> Result<RefreshResult> {
    let outcomes = fetch_all_projects(projects, query, cancel).await;
    let issues = merge_outcomes(&outcomes);
    store.save(ISSUES_KEY, &issues)?;
    Ok(RefreshResult { outcomes, issues })
}

/// Read the issue cache written by `refresh_issue_cache`, if fresh.
pub fn load_cached_issues(store: &CacheStore, max_age: Duration) -> Result<Option<Vec<Issue>>> {
    store.load(ISSUES_KEY, max_age)
}

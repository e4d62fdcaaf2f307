use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::models::issue::Issue;

/// Issues are fetched in pages of this size; a page shorter than this
/// ends the scan.
const PAGE_SIZE: usize = 100;
/// Upper bound on the project list request.
const PROJECT_LIST_LIMIT: usize = 1000;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Entry from the tracker's project list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerProject {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ProjectsPage {
    #[serde(default)]
    projects: Vec<TrackerProject>,
}

/// One page of the issues listing. The response also carries a
/// `total_count`, which is not deserialized: it can lag behind
/// concurrent writes on the server, so pagination never consults it.
#[derive(Debug, Deserialize)]
struct IssuesPage {
    #[serde(default)]
    issues: Vec<Issue>,
}

/// Caller-supplied fetch constraints. The assignee filter is explicit;
/// nothing defaults to the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueQuery {
    pub status_id: String,
    pub assigned_to_id: Option<String>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    pub include_attachments: bool,
}

impl Default for IssueQuery {
    fn default() -> Self {
        IssueQuery {
            status_id: "*".to_string(),
            assigned_to_id: None,
            created_from: None,
            created_to: None,
            include_attachments: false,
        }
    }
}

impl IssueQuery {
    /// Redmine `created_on` filter expression for the configured
    /// window, if any bound is set.
    fn created_on_param(&self) -> Option<String> {
        match (self.created_from, self.created_to) {
            (Some(from), Some(to)) => Some(format!("><{}|{}", from.format("%Y-%m-%d"), to.format("%Y-%m-%d"))),
            (Some(from), None) => Some(format!(">={}", from.format("%Y-%m-%d"))),
            (None, Some(to)) => Some(format!("<={}", to.format("%Y-%m-%d"))),
            (None, None) => None,
        }
    }
}

/// Client for one tracker endpoint/key pair. Credentials come in
/// through the constructor; there is no ambient configuration.
pub struct RedmineClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RedmineClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Unavailable(format!("failed to build http client: {e}")))?;
        let base_url: String = base_url.into();
        Ok(RedmineClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Find a project by its human-readable name. The match is exact on
    /// the trimmed name; no match is a warning and `None`, not an error.
    pub async fn resolve_project(&self, name: &str) -> Result<Option<TrackerProject>> {
        let url = format!("{}/projects.json", self.base_url);
        let params = vec![("limit", PROJECT_LIST_LIMIT.to_string())];
        let page: ProjectsPage = self.get_json(&url, &params).await?;

        let wanted = name.trim();
        let matched = page.projects.into_iter().find(|p| p.name.trim() == wanted);
        if matched.is_none() {
            warn!("project '{wanted}' not found in tracker project list");
        }
        Ok(matched)
    }

    /// Fetch every issue for a project, paginating until the tracker
    /// returns a short page. The caller's token aborts between pages.
    pub async fn fetch_issues(
        &self,
        project_id: &str,
        query: &IssueQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<Issue>> {
        let url = format!("{}/issues.json", self.base_url);
        let mut all = Vec::new();
        let mut offset = 0usize;
        let mut pages = 0usize;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let mut params = vec![
                ("project_id", project_id.to_string()),
                ("status_id", query.status_id.clone()),
                ("limit", PAGE_SIZE.to_string()),
                ("offset", offset.to_string()),
            ];
            if let Some(assignee) = &query.assigned_to_id {
                params.push(("assigned_to_id", assignee.clone()));
            }
            if let Some(range) = query.created_on_param() {
                params.push(("created_on", range));
            }
            if query.include_attachments {
                params.push(("include", "attachments".to_string()));
            }

            let page: IssuesPage = self.get_json(&url, &params).await?;
            let fetched = page.issues.len();
            all.extend(page.issues);
            pages += 1;
            offset += fetched;

            if fetched < PAGE_SIZE {
                break;
            }
        }

        info!(
            "fetched {} issues for project {project_id} over {pages} page(s)",
            all.len()
        );
        Ok(all)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, String)]) -> Result<T> {
        let response = self
            .http
            .get(url)
            .query(params)
            .header("X-Redmine-API-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| Error::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Unavailable(format!("{url} answered {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Unavailable(format!("bad response from {url}: {e}")))
    }
}

/// Merge issues gathered from sequential fetches (e.g. two API keys for
/// the same logical project). Later records replace earlier ones with
/// the same id but keep the first-seen position.
pub fn dedupe_issues(issues: Vec<Issue>) -> Vec<Issue> {
    let mut slot_by_id: HashMap<i64, usize> = HashMap::new();
    let mut out: Vec<Issue> = Vec::with_capacity(issues.len());
    for issue in issues {
        match slot_by_id.get(&issue.id) {
            Some(&slot) => out[slot] = issue,
            None => {
                slot_by_id.insert(issue.id, out.len());
                out.push(issue);
            }
        }
    }
    out
}

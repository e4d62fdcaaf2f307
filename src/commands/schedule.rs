use chrono::Duration;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::models::program::Program;
use crate::models::tracking_issue::normalize_issue;
use crate::models::workbook::Workbook;
use crate::reconcile::{reconcile_programs, ReconcileConfig};
use crate::schedule::{build_programs, extract};
use crate::store::CacheStore;
use crate::tracker::{IssueQuery, RedmineClient};

/// Storage key for the reconciled program snapshot.
pub const SCHEDULES_KEY: &str = "schedules";

/// Extract the schedule table from an imported workbook and build the
/// program list from it.
pub fn import_programs(workbook: &Workbook) -> Result<Vec<Program>> {
    let rows = extract(workbook)?;
    Ok(build_programs(&rows))
}

/// Fetch the project's tracking issues once and fold them onto the
/// program list. Reconciliation is all-or-nothing per pass: any fetch
/// failure returns the input unchanged.
pub async fn reconcile_with_tracker(
    client: &RedmineClient,
    project_id: &str,
    programs: &[Program],
    config: &ReconcileConfig,
    cancel: &CancellationToken,
) -> Vec<Program> {
    let query = IssueQuery {
        include_attachments: true,
        ..IssueQuery::default()
    };

    let issues = match client.fetch_issues(project_id, &query, cancel).await {
        Ok(issues) => issues,
        Err(err) => {
            warn!("tracking fetch failed for project {project_id}: {err}; programs left unchanged");
            return programs.to_vec();
        }
    };

    info!(
        "reconciling {} fetched issues against {} programs for project {project_id}",
        issues.len(),
        programs.len()
    );
    let tracked: Vec<_> = issues.iter().map(normalize_issue).collect();
    reconcile_programs(programs, &tracked, config)
}

/// Persist the program list as the schedule snapshot.
pub fn save_snapshot(store: &CacheStore, programs: &[Program]) -> Result<()> {
    store.save(SCHEDULES_KEY, programs)
}

/// Read back the schedule snapshot, if present and fresh.
pub fn load_snapshot(store: &CacheStore, max_age: Duration) -> Result<Option<Vec<Program>>> {
    store.load(SCHEDULES_KEY, max_age)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::default_max_age;

    #[test]
    fn import_fails_on_an_empty_workbook() {
        let result = import_programs(&Workbook::default());
        assert!(matches!(result, Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn snapshot_round_trips_through_the_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CacheStore::new(dir.path());

        let programs = vec![Program::new("P100", "Login"), Program::new("P200", "Billing")];
        save_snapshot(&store, &programs).expect("save");

        let loaded = load_snapshot(&store, default_max_age())
            .expect("load")
            .expect("snapshot present");
        assert_eq!(loaded, programs);
    }

    #[test]
    fn missing_snapshot_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CacheStore::new(dir.path());
        let loaded = load_snapshot(&store, default_max_age()).expect("load");
        assert_eq!(loaded, None);
    }
}

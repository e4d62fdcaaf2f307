use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::models::program::Program;
use crate::models::tracking_issue::TrackingIssue;

/// How an issue's module field is matched against a program id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    /// `module` contains the prgid anywhere (matches `P100-UI` to `P100`).
    Substring,
    /// `module` equals the prgid after trimming.
    Exact,
}

/// Labels and matching rules the reconciliation counts depend on.
/// These varied across deployments (notably the resolved-status label,
/// which is locale-dependent), so they are configuration, not literals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    pub bug_tracker: String,
    pub qa_tracker: String,
    pub resolved_statuses: Vec<String>,
    pub join: JoinMode,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        ReconcileConfig {
            bug_tracker: "Bug".to_string(),
            qa_tracker: "Q&A".to_string(),
            resolved_statuses: vec!["Resolved".to_string()],
            join: JoinMode::Substring,
        }
    }
}

impl ReconcileConfig {
    fn matches_program(&self, issue: &TrackingIssue, prgid: &str) -> bool {
        match self.join {
            JoinMode::Substring => issue.module.contains(prgid),
            JoinMode::Exact => issue.module.trim() == prgid,
        }
    }

    fn is_resolved(&self, issue: &TrackingIssue) -> bool {
        self.resolved_statuses
            .iter()
            .any(|status| status == &issue.status)
    }
}

/// Fold fetched issues onto the program list. Each program's issue list
/// and counts are overwritten wholesale; nothing is merged across
/// passes. An empty fetch leaves the input untouched so a transient
/// blank response cannot wipe previously reconciled state.
pub fn reconcile_programs(
    programs: &[Program],
    issues: &[TrackingIssue],
    config: &ReconcileConfig,
) -> Vec<Program> {
    if issues.is_empty() {
        warn!("no issues fetched; keeping {} programs as-is", programs.len());
        return programs.to_vec();
    }

    let reconciled: Vec<Program> = programs
        .iter()
        .map(|program| {
            let matched: Vec<TrackingIssue> = issues
                .iter()
                .filter(|issue| config.matches_program(issue, &program.prgid))
                .cloned()
                .collect();

            let bug_count = matched
                .iter()
                .filter(|i| i.tracker_name == config.bug_tracker)
                .count();
            let qa_count = matched
                .iter()
                .filter(|i| i.tracker_name == config.qa_tracker)
                .count();
            let bug_resolved_count = matched
                .iter()
                .filter(|i| i.tracker_name == config.bug_tracker && config.is_resolved(i))
                .count();
            let qa_resolved_count = matched
                .iter()
                .filter(|i| i.tracker_name == config.qa_tracker && config.is_resolved(i))
                .count();

            Program {
                tracking_issues: matched,
                bug_count,
                qa_count,
                bug_resolved_count,
                qa_resolved_count,
                ..program.clone()
            }
        })
        .collect();

    info!(
        "reconciled {} issues across {} programs",
        issues.len(),
        reconciled.len()
    );
    reconciled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(module: &str, tracker: &str, status: &str) -> TrackingIssue {
        TrackingIssue {
            issue_id: 1,
            module: module.to_string(),
            tracker_name: tracker.to_string(),
            status: status.to_string(),
            ..TrackingIssue::default()
        }
    }

    #[test]
    fn substring_join_assigns_issues_to_programs() {
        let programs = vec![Program::new("P100", "Login"), Program::new("P200", "Billing")];
        let issues = vec![
            issue("P100-UI", "Bug", "New"),
            issue("P200", "Q&A", "Resolved"),
            issue("unrelated", "Bug", "New"),
        ];

        let reconciled = reconcile_programs(&programs, &issues, &ReconcileConfig::default());
        assert_eq!(reconciled[0].tracking_issues.len(), 1);
        assert_eq!(reconciled[0].tracking_issues[0].module, "P100-UI");
        assert_eq!(reconciled[1].tracking_issues.len(), 1);
        assert_eq!(reconciled[1].tracking_issues[0].module, "P200");
    }

    #[test]
    fn exact_join_rejects_partial_matches() {
        let programs = vec![Program::new("P100", "Login")];
        let issues = vec![issue("P100-UI", "Bug", "New"), issue("P100", "Bug", "New")];
        let config = ReconcileConfig {
            join: JoinMode::Exact,
            ..ReconcileConfig::default()
        };

        let reconciled = reconcile_programs(&programs, &issues, &config);
        assert_eq!(reconciled[0].tracking_issues.len(), 1);
        assert_eq!(reconciled[0].tracking_issues[0].module, "P100");
    }

    #[test]
    fn counts_partition_by_tracker_and_resolution() {
        let programs = vec![Program::new("P100", "Login")];
        let issues = vec![
            issue("P100", "Bug", "New"),
            issue("P100", "Bug", "Resolved"),
            issue("P100", "Q&A", "Resolved"),
            issue("P100", "Q&A", "Resolved"),
            issue("P100", "Support", "Resolved"),
        ];

        let reconciled = reconcile_programs(&programs, &issues, &ReconcileConfig::default());
        let program = &reconciled[0];
        assert_eq!(program.bug_count, 2);
        assert_eq!(program.qa_count, 2);
        assert_eq!(program.bug_resolved_count, 1);
        assert_eq!(program.qa_resolved_count, 2);
        assert_eq!(program.tracking_issues.len(), 5);
    }

    #[test]
    fn locale_resolved_labels_come_from_config() {
        let programs = vec![Program::new("P100", "Login")];
        let issues = vec![issue("P100", "Bug", "解決")];
        let config = ReconcileConfig {
            resolved_statuses: vec!["解決".to_string(), "Resolved".to_string()],
            ..ReconcileConfig::default()
        };

        let reconciled = reconcile_programs(&programs, &issues, &config);
        assert_eq!(reconciled[0].bug_resolved_count, 1);
    }

    #[test]
    fn empty_fetch_keeps_existing_state() {
        let mut program = Program::new("P100", "Login");
        program.tracking_issues = vec![issue("P100", "Bug", "New")];
        program.bug_count = 1;
        let programs = vec![program];

        let reconciled = reconcile_programs(&programs, &[], &ReconcileConfig::default());
        assert_eq!(reconciled, programs);
    }

    #[test]
    fn counts_are_overwritten_not_accumulated() {
        let mut program = Program::new("P100", "Login");
        program.bug_count = 99;
        program.qa_resolved_count = 99;
        let programs = vec![program];

        let issues = vec![issue("P100", "Bug", "New")];
        let reconciled = reconcile_programs(&programs, &issues, &ReconcileConfig::default());
        assert_eq!(reconciled[0].bug_count, 1);
        assert_eq!(reconciled[0].qa_resolved_count, 0);
    }

    #[test]
    fn program_with_no_matches_ends_up_empty() {
        let mut program = Program::new("P900", "Orphan");
        program.tracking_issues = vec![issue("P900", "Bug", "New")];
        let programs = vec![program];

        let issues = vec![issue("P100", "Bug", "New")];
        let reconciled = reconcile_programs(&programs, &issues, &ReconcileConfig::default());
        assert!(reconciled[0].tracking_issues.is_empty());
        assert_eq!(reconciled[0].bug_count, 0);
    }
}

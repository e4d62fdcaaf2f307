use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::ProjectConfig;
use crate::filter::{CF_FJN_ERROR_TYPE, CF_RESPONSE_DELIVERY_DATE};
use crate::models::issue::{custom_field_or, Issue};

const MISSING: &str = "N/A";

/// Issues per project name, in first-seen order.
pub fn project_counts(issues: &[Issue]) -> Vec<(String, usize)> {
    tally(issues, project_name)
}

/// Issues per response delivery date, `N/A` excluded. Keeps the seven
/// busiest dates, then orders those chronologically for the chart axis.
pub fn due_date_counts(issues: &[Issue]) -> Vec<(String, usize)> {
    let mut dated: Vec<(String, usize)> = tally(issues, |issue| {
        custom_field_or(&issue.custom_fields, CF_RESPONSE_DELIVERY_DATE, MISSING)
    })
    .into_iter()
    .filter(|(date, _)| date != MISSING)
    .collect();

    dated.sort_by(|a, b| b.1.cmp(&a.1));
    dated.truncate(7);
    dated.sort_by(|a, b| a.0.cmp(&b.0));
    dated
}

/// Issues per priority name, in first-seen order.
pub fn priority_counts(issues: &[Issue]) -> Vec<(String, usize)> {
    tally(issues, |issue| {
        issue
            .priority
            .as_ref()
            .and_then(|p| p.name.clone())
            .unwrap_or_else(|| MISSING.to_string())
    })
}

/// Per-project breakdown of FJN error types, shaped for a stacked
/// chart: one count row per error type, one column per project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorMatrix {
    pub projects: Vec<String>,
    pub error_types: Vec<String>,
    /// `counts[error_type][project]`.
    pub counts: Vec<Vec<usize>>,
}

pub fn project_error_matrix(issues: &[Issue]) -> ErrorMatrix {
    let mut projects: Vec<String> = Vec::new();
    let mut error_types: Vec<String> = Vec::new();
    let mut cells: HashMap<(String, String), usize> = HashMap::new();

    for issue in issues {
        let project = project_name(issue);
        let error_type = custom_field_or(&issue.custom_fields, CF_FJN_ERROR_TYPE, MISSING);
        if !projects.contains(&project) {
            projects.push(project.clone());
        }
        if !error_types.contains(&error_type) {
            error_types.push(error_type.clone());
        }
        *cells.entry((project, error_type)).or_insert(0) += 1;
    }

    let counts = error_types
        .iter()
        .map(|error_type| {
            projects
                .iter()
                .map(|project| {
                    cells
                        .get(&(project.clone(), error_type.clone()))
                        .copied()
                        .unwrap_or(0)
                })
                .collect()
        })
        .collect();

    ErrorMatrix {
        projects,
        error_types,
        counts,
    }
}

/// Browse link for one issue, resolved through the project
/// configuration. Issues whose project has no config entry get `#`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueLink {
    pub issue_id: i64,
    pub url: String,
}

pub fn issue_links(issues: &[Issue], projects: &[ProjectConfig]) -> Vec<IssueLink> {
    issues
        .iter()
        .map(|issue| {
            let name = project_name(issue);
            let url = projects
                .iter()
                .find(|p| p.redmine_name.trim() == name.trim())
                .map(|p| format!("{}/issues/{}", p.redmine_url.trim_end_matches('/'), issue.id))
                .unwrap_or_else(|| "#".to_string());
            IssueLink {
                issue_id: issue.id,
                url,
            }
        })
        .collect()
}

fn project_name(issue: &Issue) -> String {
    issue
        .project
        .as_ref()
        .and_then(|p| p.name.clone())
        .unwrap_or_else(|| MISSING.to_string())
}

fn tally(issues: &[Issue], key: impl Fn(&Issue) -> String) -> Vec<(String, usize)> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for issue in issues {
        let label = key(issue);
        if !counts.contains_key(&label) {
            order.push(label.clone());
        }
        *counts.entry(label).or_insert(0) += 1;
    }
    order
        .into_iter()
        .map(|label| {
            let count = counts[&label];
            (label, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::issue::{CustomField, NamedRef, ProjectRef};

    fn issue(id: i64, project: &str, priority: &str, fields: &[(&str, &str)]) -> Issue {
        Issue {
            id,
            project: Some(ProjectRef {
                id: 1,
                name: Some(project.to_string()),
            }),
            priority: Some(NamedRef {
                id: None,
                name: Some(priority.to_string()),
            }),
            custom_fields: fields
                .iter()
                .map(|(name, value)| CustomField {
                    name: name.to_string(),
                    value: Some(value.to_string()),
                })
                .collect(),
            ..Issue::default()
        }
    }

    #[test]
    fn project_counts_keep_first_seen_order() {
        let issues = vec![
            issue(1, "Portal", "High", &[]),
            issue(2, "Billing", "Low", &[]),
            issue(3, "Portal", "High", &[]),
        ];
        assert_eq!(
            project_counts(&issues),
            vec![("Portal".to_string(), 2), ("Billing".to_string(), 1)]
        );
    }

    #[test]
    fn due_dates_exclude_missing_and_order_chronologically() {
        let mut issues = Vec::new();
        // Three dates with different weights plus one issue without the field.
        for _ in 0..3 {
            issues.push(issue(1, "Portal", "High", &[(CF_RESPONSE_DELIVERY_DATE, "2024-06-10")]));
        }
        for _ in 0..2 {
            issues.push(issue(2, "Portal", "High", &[(CF_RESPONSE_DELIVERY_DATE, "2024-05-01")]));
        }
        issues.push(issue(3, "Portal", "High", &[(CF_RESPONSE_DELIVERY_DATE, "2024-07-20")]));
        issues.push(issue(4, "Portal", "High", &[]));

        assert_eq!(
            due_date_counts(&issues),
            vec![
                ("2024-05-01".to_string(), 2),
                ("2024-06-10".to_string(), 3),
                ("2024-07-20".to_string(), 1),
            ]
        );
    }

    #[test]
    fn due_dates_keep_only_the_seven_busiest() {
        let mut issues = Vec::new();
        for day in 1..=9 {
            let date = format!("2024-06-{day:02}");
            // Later days get more issues, so days 1 and 2 drop out.
            for _ in 0..day {
                issues.push(issue(
                    day as i64,
                    "Portal",
                    "High",
                    &[(CF_RESPONSE_DELIVERY_DATE, date.as_str())],
                ));
            }
        }

        let top = due_date_counts(&issues);
        assert_eq!(top.len(), 7);
        assert_eq!(top.first().map(|(date, _)| date.as_str()), Some("2024-06-03"));
        assert_eq!(top.last().map(|(date, _)| date.as_str()), Some("2024-06-09"));
    }

    #[test]
    fn priority_counts_default_missing_priority() {
        let mut no_priority = issue(5, "Portal", "x", &[]);
        no_priority.priority = None;
        let issues = vec![issue(1, "Portal", "High", &[]), no_priority];
        assert_eq!(
            priority_counts(&issues),
            vec![("High".to_string(), 1), ("N/A".to_string(), 1)]
        );
    }

    #[test]
    fn error_matrix_covers_every_project_type_pair() {
        let issues = vec![
            issue(1, "Portal", "High", &[(CF_FJN_ERROR_TYPE, "Logic")]),
            issue(2, "Portal", "High", &[(CF_FJN_ERROR_TYPE, "Logic")]),
            issue(3, "Billing", "High", &[(CF_FJN_ERROR_TYPE, "Spec")]),
            issue(4, "Billing", "High", &[]),
        ];

        let matrix = project_error_matrix(&issues);
        assert_eq!(matrix.projects, vec!["Portal".to_string(), "Billing".to_string()]);
        assert_eq!(
            matrix.error_types,
            vec!["Logic".to_string(), "Spec".to_string(), "N/A".to_string()]
        );
        // Logic: 2 in Portal, 0 in Billing.
        assert_eq!(matrix.counts[0], vec![2, 0]);
        assert_eq!(matrix.counts[1], vec![0, 1]);
        assert_eq!(matrix.counts[2], vec![0, 1]);
    }

    #[test]
    fn links_resolve_through_config_or_fall_back() {
        let projects = vec![ProjectConfig {
            redmine_name: "Portal".to_string(),
            redmine_url: "http://redmine.local/".to_string(),
            ..ProjectConfig::default()
        }];
        let issues = vec![issue(42, "Portal", "High", &[]), issue(7, "Unknown", "High", &[])];

        let links = issue_links(&issues, &projects);
        assert_eq!(links[0].url, "http://redmine.local/issues/42");
        assert_eq!(links[1].url, "#");
    }
}

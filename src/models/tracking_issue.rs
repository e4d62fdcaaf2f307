use serde::{Deserialize, Serialize};

use crate::models::issue::{custom_field_or, Issue};

/// Flat, fully-defaulted view of a tracker issue. Every field a raw
/// issue may omit is an empty string (or zero) here, so downstream
/// rendering and joins never have to null-check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingIssue {
    pub issue_id: i64,
    pub qa_no: String,
    pub subject: String,
    pub status: String,
    pub priority: String,
    pub assignee: String,
    pub author: String,
    pub created_on: String,
    pub updated_on: String,
    pub tracker_name: String,
    pub module: String,
    pub description: String,
    pub attachments: Vec<Attachment>,
    pub project_id: i64,
    pub project_name: String,
    pub fix_method: String,
    pub question_vn: String,
    pub question_jp: String,
    pub answer_vn: String,
    pub answer_jp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub filename: String,
    pub content_url: String,
    pub created_on: String,
}

/// Map one raw issue into its flat tracking form. Pure and total:
/// missing optional fields become empty strings, never an error.
pub fn normalize_issue(issue: &Issue) -> TrackingIssue {
    let name_of = |named: &Option<crate::models::issue::NamedRef>| {
        named
            .as_ref()
            .and_then(|n| n.name.clone())
            .unwrap_or_default()
    };

    TrackingIssue {
        issue_id: issue.id,
        qa_no: custom_field_or(&issue.custom_fields, "Q&A No.", ""),
        subject: issue.subject.clone().unwrap_or_default(),
        status: name_of(&issue.status),
        priority: name_of(&issue.priority),
        assignee: name_of(&issue.assigned_to),
        author: name_of(&issue.author),
        created_on: issue.created_on.clone().unwrap_or_default(),
        updated_on: issue.updated_on.clone().unwrap_or_default(),
        tracker_name: name_of(&issue.tracker),
        module: custom_field_or(&issue.custom_fields, "Module", ""),
        description: issue.description.clone().unwrap_or_default(),
        attachments: issue
            .attachments
            .iter()
            .map(|att| Attachment {
                id: att.id,
                filename: att.filename.clone().unwrap_or_default(),
                content_url: att.content_url.clone().unwrap_or_default(),
                created_on: att.created_on.clone().unwrap_or_default(),
            })
            .collect(),
        project_id: issue.project.as_ref().map(|p| p.id).unwrap_or_default(),
        project_name: issue
            .project
            .as_ref()
            .and_then(|p| p.name.clone())
            .unwrap_or_default(),
        fix_method: custom_field_or(&issue.custom_fields, "Fix Method", ""),
        question_vn: custom_field_or(&issue.custom_fields, "Question (VN)", ""),
        question_jp: custom_field_or(&issue.custom_fields, "Question (JP)", ""),
        answer_vn: custom_field_or(&issue.custom_fields, "Answer (VN)", ""),
        answer_jp: custom_field_or(&issue.custom_fields, "Answer (JP)", ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::issue::{CustomField, NamedRef, ProjectRef, RawAttachment};

    fn sample_issue() -> Issue {
        Issue {
            id: 1200,
            subject: Some("Screen freezes".to_string()),
            description: Some("Repro steps attached".to_string()),
            status: Some(NamedRef {
                id: Some(3),
                name: Some("Resolved".to_string()),
            }),
            priority: Some(NamedRef {
                id: None,
                name: Some("High".to_string()),
            }),
            author: Some(NamedRef {
                id: None,
                name: Some("sato".to_string()),
            }),
            assigned_to: None,
            tracker: Some(NamedRef {
                id: None,
                name: Some("Bug".to_string()),
            }),
            project: Some(ProjectRef {
                id: 77,
                name: Some("Billing".to_string()),
            }),
            created_on: Some("2024-04-01T00:00:00Z".to_string()),
            updated_on: None,
            custom_fields: vec![
                CustomField {
                    name: "Module".to_string(),
                    value: Some("P100-UI".to_string()),
                },
                CustomField {
                    name: "Q&A No.".to_string(),
                    value: None,
                },
            ],
            attachments: vec![RawAttachment {
                id: 5,
                filename: Some("repro.mp4".to_string()),
                content_url: None,
                created_on: Some("2024-04-02T00:00:00Z".to_string()),
            }],
        }
    }

    #[test]
    fn flattens_nested_refs_and_custom_fields() {
        let tracked = normalize_issue(&sample_issue());
        assert_eq!(tracked.issue_id, 1200);
        assert_eq!(tracked.status, "Resolved");
        assert_eq!(tracked.tracker_name, "Bug");
        assert_eq!(tracked.module, "P100-UI");
        assert_eq!(tracked.project_id, 77);
        assert_eq!(tracked.project_name, "Billing");
    }

    #[test]
    fn absent_fields_become_empty_not_missing() {
        let tracked = normalize_issue(&sample_issue());
        assert_eq!(tracked.assignee, "");
        assert_eq!(tracked.qa_no, "");
        assert_eq!(tracked.updated_on, "");
        assert_eq!(tracked.fix_method, "");
    }

    #[test]
    fn attachments_map_one_to_one() {
        let tracked = normalize_issue(&sample_issue());
        assert_eq!(tracked.attachments.len(), 1);
        assert_eq!(tracked.attachments[0].filename, "repro.mp4");
        assert_eq!(tracked.attachments[0].content_url, "");
    }

    #[test]
    fn normalization_is_idempotent_per_input() {
        let issue = sample_issue();
        assert_eq!(normalize_issue(&issue), normalize_issue(&issue));
    }

    #[test]
    fn bare_issue_normalizes_to_defaults() {
        let issue = Issue {
            id: 9,
            ..Issue::default()
        };
        let tracked = normalize_issue(&issue);
        assert_eq!(tracked.issue_id, 9);
        assert_eq!(tracked.subject, "");
        assert_eq!(tracked.project_id, 0);
        assert!(tracked.attachments.is_empty());
    }
}

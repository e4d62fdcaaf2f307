use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::issue::{custom_field_or, Issue};

/// Custom-field labels the dashboard table reads off each issue.
pub const CF_GENERATED_PG_ID: &str = "発生PGID";
pub const CF_DESIRED_DELIVERY_DATE: &str = "希望納期";
pub const CF_RESPONSE_DELIVERY_DATE: &str = "回答納期";
pub const CF_FJN_ERROR_TYPE: &str = "FJN側障害種別";
pub const CF_UCD_ERROR_TYPE: &str = "UCD側障害種別";
pub const CF_UNIT_ID: &str = "部品ID";
pub const CF_EDIT_PG_ID: &str = "修正PGID";

const MISSING: &str = "N/A";

/// Per-column substring filters. Empty string means no constraint on
/// that column; all populated columns must match (logical AND).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFilter {
    pub row_no: String,
    pub ticket_no: String,
    pub generated_pg_id: String,
    pub project_name: String,
    pub author: String,
    pub desired_delivery_date: String,
    pub response_delivery_date: String,
    pub fjn_error_type: String,
    pub ucd_error_type: String,
    pub unit_id: String,
    pub edit_pg_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    TicketNo,
    GeneratedPgId,
    ProjectName,
    Author,
    DesiredDeliveryDate,
    ResponseDeliveryDate,
    FjnErrorType,
    UcdErrorType,
    UnitId,
    EditPgId,
}

impl SortKey {
    /// Parse the UI's column key. Unknown keys sort nothing.
    pub fn parse(key: &str) -> Option<SortKey> {
        match key {
            "ticketNo" => Some(SortKey::TicketNo),
            "generatedPgId" => Some(SortKey::GeneratedPgId),
            "projectName" => Some(SortKey::ProjectName),
            "author" => Some(SortKey::Author),
            "desiredDeliveryDate" => Some(SortKey::DesiredDeliveryDate),
            "responseDeliveryDate" => Some(SortKey::ResponseDeliveryDate),
            "fjnErrorType" => Some(SortKey::FjnErrorType),
            "ucdErrorType" => Some(SortKey::UcdErrorType),
            "unitId" => Some(SortKey::UnitId),
            "editPgId" => Some(SortKey::EditPgId),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: Option<SortKey>,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec {
            key: None,
            direction: SortDirection::Ascending,
        }
    }
}

/// Coarse post-fetch conditions applied before the table filters:
/// status whitelist, subject keyword, and a created-on date window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConditions {
    pub statuses: Vec<String>,
    pub keyword: String,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
}

/// Filter then sort, as a pure function of its inputs. Ties keep their
/// filtered order (the sort is stable).
pub fn apply_filters_and_sort(
    issues: &[Issue],
    filter: &IssueFilter,
    sort: &SortSpec,
) -> Vec<Issue> {
    let mut result: Vec<Issue> = issues
        .iter()
        .enumerate()
        .filter(|(index, issue)| matches_filter(issue, *index, filter))
        .map(|(_, issue)| issue.clone())
        .collect();

    if let Some(key) = sort.key {
        result.sort_by(|a, b| {
            let ordering = compare_by_key(a, b, key);
            match sort.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }

    result
}

/// Apply the coarse fetch-time conditions. Unset pieces are no-ops.
pub fn apply_conditions(issues: &[Issue], conditions: &FilterConditions) -> Vec<Issue> {
    issues
        .iter()
        .filter(|issue| {
            if !conditions.statuses.is_empty() {
                let status = issue
                    .status
                    .as_ref()
                    .and_then(|s| s.name.as_deref())
                    .unwrap_or("");
                if !conditions.statuses.iter().any(|s| s == status) {
                    return false;
                }
            }
            if !conditions.keyword.is_empty() {
                let subject = issue.subject.as_deref().unwrap_or("");
                if !subject.contains(&conditions.keyword) {
                    return false;
                }
            }
            if conditions.created_from.is_some() || conditions.created_to.is_some() {
                let created = created_date(issue);
                if let Some(from) = conditions.created_from {
                    if created.map_or(true, |date| date < from) {
                        return false;
                    }
                }
                if let Some(to) = conditions.created_to {
                    if created.map_or(true, |date| date > to) {
                        return false;
                    }
                }
            }
            true
        })
        .cloned()
        .collect()
}

fn matches_filter(issue: &Issue, index: usize, filter: &IssueFilter) -> bool {
    let contains = |haystack: &str, needle: &str| {
        needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
    };

    (index + 1).to_string().contains(&filter.row_no)
        && issue.id.to_string().contains(&filter.ticket_no)
        && contains(
            &custom_field_or(&issue.custom_fields, CF_GENERATED_PG_ID, MISSING),
            &filter.generated_pg_id,
        )
        && contains(project_name(issue), &filter.project_name)
        && contains(author_name(issue), &filter.author)
        && contains(
            &custom_field_or(&issue.custom_fields, CF_DESIRED_DELIVERY_DATE, MISSING),
            &filter.desired_delivery_date,
        )
        && contains(
            &custom_field_or(&issue.custom_fields, CF_RESPONSE_DELIVERY_DATE, MISSING),
            &filter.response_delivery_date,
        )
        && contains(
            &custom_field_or(&issue.custom_fields, CF_FJN_ERROR_TYPE, MISSING),
            &filter.fjn_error_type,
        )
        && contains(
            &custom_field_or(&issue.custom_fields, CF_UCD_ERROR_TYPE, MISSING),
            &filter.ucd_error_type,
        )
        && contains(
            &custom_field_or(&issue.custom_fields, CF_UNIT_ID, MISSING),
            &filter.unit_id,
        )
        && contains(
            &custom_field_or(&issue.custom_fields, CF_EDIT_PG_ID, MISSING),
            &filter.edit_pg_id,
        )
}

fn compare_by_key(a: &Issue, b: &Issue, key: SortKey) -> Ordering {
    let by_field = |name: &str| {
        custom_field_or(&a.custom_fields, name, MISSING)
            .cmp(&custom_field_or(&b.custom_fields, name, MISSING))
    };

    match key {
        SortKey::TicketNo => a.id.cmp(&b.id),
        SortKey::ProjectName => project_name(a).cmp(project_name(b)),
        SortKey::Author => author_name(a).cmp(author_name(b)),
        SortKey::GeneratedPgId => by_field(CF_GENERATED_PG_ID),
        SortKey::DesiredDeliveryDate => by_field(CF_DESIRED_DELIVERY_DATE),
        SortKey::ResponseDeliveryDate => by_field(CF_RESPONSE_DELIVERY_DATE),
        SortKey::FjnErrorType => by_field(CF_FJN_ERROR_TYPE),
        SortKey::UcdErrorType => by_field(CF_UCD_ERROR_TYPE),
        SortKey::UnitId => by_field(CF_UNIT_ID),
        SortKey::EditPgId => by_field(CF_EDIT_PG_ID),
    }
}

fn project_name(issue: &Issue) -> &str {
    issue
        .project
        .as_ref()
        .and_then(|p| p.name.as_deref())
        .unwrap_or("")
}

fn author_name(issue: &Issue) -> &str {
    issue
        .author
        .as_ref()
        .and_then(|a| a.name.as_deref())
        .unwrap_or(MISSING)
}

fn created_date(issue: &Issue) -> Option<NaiveDate> {
    let created = issue.created_on.as_deref()?;
    NaiveDate::parse_from_str(created.get(..10)?, "%Y-%m-%d").ok()
}

use serde::{Deserialize, Serialize};

/// Raw issue record as the tracker API returns it. Everything the API
/// may omit is optional or defaulted so a partial payload always
/// deserializes; the normalizer is the one place that fills gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Issue {
    pub id: i64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<NamedRef>,
    #[serde(default)]
    pub priority: Option<NamedRef>,
    #[serde(default)]
    pub author: Option<NamedRef>,
    #[serde(default)]
    pub assigned_to: Option<NamedRef>,
    #[serde(default)]
    pub tracker: Option<NamedRef>,
    #[serde(default)]
    pub project: Option<ProjectRef>,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub updated_on: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
    #[serde(default)]
    pub attachments: Vec<RawAttachment>,
}

/// Nested `{name}` reference (status, priority, author, tracker, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Nested `{id, name}` project reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Sparse tracker-defined name/value pair attached to an issue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomField {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Attachment sub-record on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAttachment {
    pub id: i64,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_url: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
}

/// Look up a custom field by name. A missing entry and an entry whose
/// value is absent or empty are indistinguishable to callers.
pub fn custom_field<'a>(fields: &'a [CustomField], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|field| field.name == name)
        .and_then(|field| field.value.as_deref())
        .filter(|value| !value.is_empty())
}

/// Shared "missing field" semantics for every custom-field consumer:
/// the sentinel is returned for absent entries, absent values, and
/// empty values alike.
pub fn custom_field_or(fields: &[CustomField], name: &str, sentinel: &str) -> String {
    custom_field(fields, name).unwrap_or(sentinel).to_string()
}

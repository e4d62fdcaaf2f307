use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Static per-project configuration, stored as local JSON. The key
/// names match the document the desktop app has always shipped, so an
/// existing projects file keeps loading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(rename = "ProjectID")]
    pub project_id: String,
    #[serde(rename = "RootPath")]
    pub root_path: String,
    #[serde(rename = "ScheduleFileName")]
    pub schedule_file_name: String,
    #[serde(rename = "TrackingURL")]
    pub tracking_url: String,
    #[serde(rename = "TrackingAPIKey")]
    pub tracking_api_key: String,
    #[serde(rename = "RedmineName")]
    pub redmine_name: String,
    #[serde(rename = "RedmineURL")]
    pub redmine_url: String,
    #[serde(rename = "RedmineAPIKey")]
    pub redmine_api_key: String,
}

impl ProjectConfig {
    pub fn design_path(&self) -> PathBuf {
        Path::new(&self.root_path).join("design")
    }

    pub fn testing_path(&self) -> PathBuf {
        Path::new(&self.root_path).join("testing")
    }

    pub fn schedule_path(&self) -> PathBuf {
        Path::new(&self.root_path)
            .join("schedule")
            .join(&self.schedule_file_name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ProjectsDocument {
    #[serde(default)]
    projects: Vec<ProjectConfig>,
}

/// Read the `{"projects": [...]}` document. A missing file is an empty
/// project list, not an error.
pub fn load_projects(path: &Path) -> Result<Vec<ProjectConfig>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::Persistence(format!("failed to read {}: {e}", path.display())))?;
    let document: ProjectsDocument = serde_json::from_str(&raw)
        .map_err(|e| Error::Persistence(format!("failed to parse {}: {e}", path.display())))?;
    Ok(document.projects)
}

pub fn save_projects(path: &Path, projects: &[ProjectConfig]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Persistence(format!("failed to create {}: {e}", parent.display())))?;
    }
    let document = ProjectsDocument {
        projects: projects.to_vec(),
    };
    let raw = serde_json::to_string_pretty(&document)
        .map_err(|e| Error::Persistence(format!("failed to serialize projects: {e}")))?;
    fs::write(path, raw)
        .map_err(|e| Error::Persistence(format!("failed to write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_hang_off_root() {
        let project = ProjectConfig {
            project_id: "PRJ-1".to_string(),
            root_path: "/work/billing".to_string(),
            schedule_file_name: "billing-schedule.xlsx".to_string(),
            ..ProjectConfig::default()
        };
        assert_eq!(project.design_path(), PathBuf::from("/work/billing/design"));
        assert_eq!(project.testing_path(), PathBuf::from("/work/billing/testing"));
        assert_eq!(
            project.schedule_path(),
            PathBuf::from("/work/billing/schedule/billing-schedule.xlsx")
        );
    }

    #[test]
    fn round_trips_through_original_key_names() {
        let raw = r#"{
            "projects": [{
                "ProjectID": "PRJ-1",
                "RootPath": "/work/billing",
                "ScheduleFileName": "s.xlsx",
                "TrackingURL": "http://tracker.local",
                "TrackingAPIKey": "k1",
                "RedmineName": "Billing",
                "RedmineURL": "http://redmine.local",
                "RedmineAPIKey": "k2"
            }]
        }"#;
        let document: ProjectsDocument = serde_json::from_str(raw).expect("parse");
        assert_eq!(document.projects.len(), 1);
        assert_eq!(document.projects[0].redmine_name, "Billing");

        let out = serde_json::to_string(&document).expect("serialize");
        assert!(out.contains("\"ProjectID\""));
        assert!(out.contains("\"RedmineAPIKey\""));
    }

    #[test]
    fn load_and_save_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("projects.json");

        assert!(load_projects(&path).expect("missing file is empty").is_empty());

        let projects = vec![ProjectConfig {
            project_id: "PRJ-9".to_string(),
            redmine_name: "Billing".to_string(),
            ..ProjectConfig::default()
        }];
        save_projects(&path, &projects).expect("save");

        let loaded = load_projects(&path).expect("load");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].project_id, "PRJ-9");
    }
}

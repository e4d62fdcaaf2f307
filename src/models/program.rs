use serde::{Deserialize, Serialize};

use crate::models::tracking_issue::TrackingIssue;

/// The four phases of a program, in schedule order. Column headers in
/// the schedule sheet carry a numeric suffix 1-4 matching this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseName {
    Design,
    Review,
    Coding,
    Testing,
}

impl PhaseName {
    pub const ALL: [PhaseName; 4] = [
        PhaseName::Design,
        PhaseName::Review,
        PhaseName::Coding,
        PhaseName::Testing,
    ];

    /// Column suffix used by the schedule sheet for this phase.
    pub fn column_suffix(self) -> u8 {
        match self {
            PhaseName::Design => 1,
            PhaseName::Review => 2,
            PhaseName::Coding => 3,
            PhaseName::Testing => 4,
        }
    }
}

/// Planned/actual dates and effort for one phase of a program.
/// `progress` is a ratio in 0..=1; rendering multiplies by 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub phase_name: PhaseName,
    pub delivery_date: String,
    pub baseline_effort: f64,
    pub planned_start_date: String,
    pub planned_end_date: String,
    pub actual_start_date: String,
    pub actual_end_date: String,
    pub assignee: String,
    pub progress: f64,
    pub actual_effort: f64,
    pub design_pages: u32,
    pub test_cases: u32,
    pub defects: u32,
    pub notes: String,
}

impl Phase {
    pub fn empty(phase_name: PhaseName) -> Self {
        Phase {
            phase_name,
            delivery_date: String::new(),
            baseline_effort: 0.0,
            planned_start_date: String::new(),
            planned_end_date: String::new(),
            actual_start_date: String::new(),
            actual_end_date: String::new(),
            assignee: String::new(),
            progress: 0.0,
            actual_effort: 0.0,
            design_pages: 0,
            test_cases: 0,
            defects: 0,
            notes: String::new(),
        }
    }
}

/// One unit of work from the schedule sheet. The tracking issues and
/// the four counts are derived state, fully overwritten by each
/// reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub prgid: String,
    pub prgname: String,
    pub frame: String,
    pub phases: Vec<Phase>,
    pub tracking_issues: Vec<TrackingIssue>,
    pub bug_count: usize,
    pub qa_count: usize,
    pub bug_resolved_count: usize,
    pub qa_resolved_count: usize,
}

impl Program {
    /// A program with its four empty phases and no derived state.
    pub fn new(prgid: impl Into<String>, prgname: impl Into<String>) -> Self {
        Program {
            prgid: prgid.into(),
            prgname: prgname.into(),
            frame: String::new(),
            phases: PhaseName::ALL.iter().map(|p| Phase::empty(*p)).collect(),
            tracking_issues: Vec::new(),
            bug_count: 0,
            qa_count: 0,
            bug_resolved_count: 0,
            qa_resolved_count: 0,
        }
    }

    pub fn phase(&self, name: PhaseName) -> Option<&Phase> {
        self.phases.iter().find(|p| p.phase_name == name)
    }
}

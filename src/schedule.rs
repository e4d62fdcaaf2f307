use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use log::{info, warn};

use crate::error::{Error, Result};
use crate::models::program::{Phase, PhaseName, Program};
use crate::models::workbook::{Cell, Sheet, Workbook};

/// Named range that marks the schedule table when the workbook has one.
const SCHEDULE_RANGE: &str = "schedule";
/// Without a named range, data begins this many rows below the top.
const HEADER_ROW_OFFSET: usize = 4;

const COL_PRGID: &str = "PGID";
const COL_PRGNAME: &str = "PG名称";

/// Day 0 of the 1900 serial-number system. Using Dec 30 (not 31)
/// absorbs the inherited 1900 leap-year artifact, so serials produced
/// by spreadsheet software land on the calendar date the user sees.
fn serial_date_base() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("valid base date")
}

/// Raw per-phase column values, untyped strings straight from the
/// sheet. Dates are already normalized to `YYYY-MM-DD` here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPhaseRow {
    pub delivery_date: String,
    pub baseline_effort: String,
    pub planned_start_date: String,
    pub planned_end_date: String,
    pub actual_start_date: String,
    pub actual_end_date: String,
    pub assignee: String,
    pub progress: String,
    pub actual_effort: String,
    pub design_pages: String,
    pub test_cases: String,
    pub defects: String,
    pub notes: String,
}

/// One data row of the schedule table with its four phase sub-records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawProgramRow {
    pub prgid: String,
    pub prgname: String,
    pub frame: String,
    pub phases: [RawPhaseRow; 4],
}

struct PhaseColumns {
    delivery_date: String,
    baseline_effort: String,
    planned_start_date: String,
    planned_end_date: String,
    actual_start_date: String,
    actual_end_date: String,
    assignee: String,
    progress: String,
    actual_effort: String,
    design_pages: String,
    test_cases: String,
    defects: String,
    notes: String,
}

/// Column labels for one phase. Parenthesized suffixes are the planned
/// columns, bare suffixes the actuals.
fn phase_columns(phase: PhaseName) -> PhaseColumns {
    let n = phase.column_suffix();
    PhaseColumns {
        delivery_date: format!("納品({n})"),
        baseline_effort: format!("工数({n})"),
        planned_start_date: format!("開始日({n})"),
        planned_end_date: format!("終了日({n})"),
        actual_start_date: format!("開始日{n}"),
        actual_end_date: format!("終了日{n}"),
        assignee: format!("担当{n}"),
        progress: format!("進捗率{n}"),
        actual_effort: format!("工数{n}"),
        design_pages: format!("PageTK{n}"),
        test_cases: format!("テスト{n}"),
        defects: format!("不具合{n}"),
        notes: format!("コメント{n}"),
    }
}

/// Headers the extractor refuses to work without: the row identifier
/// pair plus each phase's planned effort/dates, assignee, and progress.
/// Everything else defaults to empty when its column is absent.
fn required_headers() -> Vec<String> {
    let mut headers = vec![COL_PRGID.to_string(), COL_PRGNAME.to_string()];
    for phase in PhaseName::ALL {
        let cols = phase_columns(phase);
        headers.push(cols.baseline_effort);
        headers.push(cols.planned_start_date);
        headers.push(cols.planned_end_date);
        headers.push(cols.assignee);
        headers.push(cols.progress);
    }
    headers
}

/// Read a serialized workbook document from disk.
pub fn load_workbook(path: &Path) -> Result<Workbook> {
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::Persistence(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| Error::InvalidFormat(format!("failed to parse {}: {e}", path.display())))
}

/// Extract raw program rows from the workbook. The `schedule` named
/// range wins over the positional fallback; the fallback reads the
/// first sheet starting four rows down.
pub fn extract(workbook: &Workbook) -> Result<Vec<RawProgramRow>> {
    let (sheet, start_row, end_row) = locate_data_region(workbook)?;

    let rows = &sheet.rows;
    if start_row >= rows.len() {
        return Err(Error::InvalidFormat(format!(
            "no data found in sheet '{}' from row {}",
            sheet.name,
            start_row + 1
        )));
    }
    let end_row = end_row.min(rows.len().saturating_sub(1));

    let header_index = build_header_index(&rows[start_row]);
    check_required_headers(&header_index)?;

    let mut out = Vec::new();
    for row in rows.iter().take(end_row + 1).skip(start_row + 1) {
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        out.push(map_row(&header_index, row));
    }
    Ok(out)
}

/// Build full Program records from raw rows. Rows without an
/// identifier or name are dropped with a warning.
pub fn build_programs(rows: &[RawProgramRow]) -> Vec<Program> {
    let programs: Vec<Program> = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            if row.prgid.is_empty() || row.prgname.is_empty() {
                warn!("skipping schedule row {}: missing prgid or prgname", index + 1);
                return None;
            }
            Some(build_program(row))
        })
        .collect();
    info!("built {} programs from {} schedule rows", programs.len(), rows.len());
    programs
}

fn locate_data_region(workbook: &Workbook) -> Result<(&Sheet, usize, usize)> {
    if let Some(range) = workbook.named_range(SCHEDULE_RANGE) {
        let sheet = workbook.sheet(&range.sheet).ok_or_else(|| {
            Error::InvalidFormat(format!(
                "named range '{SCHEDULE_RANGE}' points at missing sheet '{}'",
                range.sheet
            ))
        })?;
        return Ok((sheet, range.start_row, range.end_row));
    }

    let sheet = workbook
        .sheets
        .first()
        .ok_or_else(|| Error::InvalidFormat("workbook has no sheets".to_string()))?;
    Ok((sheet, HEADER_ROW_OFFSET, usize::MAX))
}

fn build_header_index(header_row: &[Cell]) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for (column, cell) in header_row.iter().enumerate() {
        let header = cell.as_header();
        if !header.is_empty() {
            // First occurrence wins on duplicate headers.
            index.entry(header).or_insert(column);
        }
    }
    index
}

fn check_required_headers(header_index: &HashMap<String, usize>) -> Result<()> {
    let missing: Vec<String> = required_headers()
        .into_iter()
        .filter(|header| !header_index.contains_key(header))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidFormat(format!(
            "schedule table is missing required headers: {}",
            missing.join(", ")
        )))
    }
}

fn map_row(header_index: &HashMap<String, usize>, row: &[Cell]) -> RawProgramRow {
    let text = |header: &str| -> String {
        header_index
            .get(header)
            .and_then(|&column| row.get(column))
            .map(cell_text)
            .unwrap_or_default()
    };
    let date = |header: &str| -> String {
        header_index
            .get(header)
            .and_then(|&column| row.get(column))
            .map(cell_date)
            .unwrap_or_default()
    };

    let phase_row = |phase: PhaseName| -> RawPhaseRow {
        let cols = phase_columns(phase);
        RawPhaseRow {
            delivery_date: date(&cols.delivery_date),
            baseline_effort: text(&cols.baseline_effort),
            planned_start_date: date(&cols.planned_start_date),
            planned_end_date: date(&cols.planned_end_date),
            actual_start_date: date(&cols.actual_start_date),
            actual_end_date: date(&cols.actual_end_date),
            assignee: text(&cols.assignee),
            progress: text(&cols.progress),
            actual_effort: text(&cols.actual_effort),
            design_pages: text(&cols.design_pages),
            test_cases: text(&cols.test_cases),
            defects: text(&cols.defects),
            notes: text(&cols.notes),
        }
    };

    RawProgramRow {
        prgid: text(COL_PRGID),
        prgname: text(COL_PRGNAME),
        frame: String::new(),
        phases: [
            phase_row(PhaseName::Design),
            phase_row(PhaseName::Review),
            phase_row(PhaseName::Coding),
            phase_row(PhaseName::Testing),
        ],
    }
}

fn build_program(row: &RawProgramRow) -> Program {
    let mut program = Program::new(row.prgid.clone(), row.prgname.clone());
    program.frame = row.frame.clone();
    program.phases = PhaseName::ALL
        .iter()
        .zip(row.phases.iter())
        .map(|(&name, raw)| build_phase(name, raw))
        .collect();
    program
}

fn build_phase(name: PhaseName, raw: &RawPhaseRow) -> Phase {
    Phase {
        phase_name: name,
        delivery_date: raw.delivery_date.clone(),
        baseline_effort: parse_f64(&raw.baseline_effort),
        planned_start_date: raw.planned_start_date.clone(),
        planned_end_date: raw.planned_end_date.clone(),
        actual_start_date: raw.actual_start_date.clone(),
        actual_end_date: raw.actual_end_date.clone(),
        assignee: raw.assignee.clone(),
        progress: parse_f64(&raw.progress),
        actual_effort: parse_f64(&raw.actual_effort),
        design_pages: parse_u32(&raw.design_pages),
        test_cases: parse_u32(&raw.test_cases),
        defects: parse_u32(&raw.defects),
        notes: raw.notes.clone(),
    }
}

fn parse_f64(value: &str) -> f64 {
    value.trim().parse().unwrap_or(0.0)
}

fn parse_u32(value: &str) -> u32 {
    let trimmed = value.trim();
    trimmed
        .parse()
        .or_else(|_| trimmed.parse::<f64>().map(|v| v.max(0.0) as u32))
        .unwrap_or(0)
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(text) => text.trim().to_string(),
        Cell::Number(n) => format!("{n}"),
        Cell::Date(date) => date.clone(),
    }
}

/// Date-column view of a cell: serial numbers and native dates both
/// normalize to `YYYY-MM-DD`, text passes through unchanged.
fn cell_date(cell: &Cell) -> String {
    match cell {
        Cell::Number(serial) => serial_to_iso_date(*serial).unwrap_or_else(|| format!("{serial}")),
        other => cell_text(other),
    }
}

fn serial_to_iso_date(serial: f64) -> Option<String> {
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let date = serial_date_base().checked_add_signed(Duration::days(serial as i64))?;
    Some(date.format("%Y-%m-%d").to_string())
}

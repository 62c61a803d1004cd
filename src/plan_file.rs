//! Markdown reports: the read-only preview and the editable plan.
//!
//! Both are a single Markdown table. The plan can be edited by hand between
//! `--prepare` and `--execute`: deleting a row skips that rename and editing
//! the "New Name" cell changes the target. Rows that no longer make sense
//! are dropped quietly when the plan is read back.
//!
//! ```text
//! | Type | Original Name | New Name | Action | Notes |
//! |------|---------------|----------|--------|-------|
//! | Folder | Old Photos | 000_old_photos | Renamed | editable |
//! | File | Old Photos/IMG 1.JPG | 000_img_1.JPG | Renamed | editable |
//! ```

use crate::apply::RenameOp;
use crate::error::{Result, TidyError};
use crate::plan::{Action, ChangeTable, EntryKind};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Default file name of the dry-run preview.
pub const PREVIEW_FILE_NAME: &str = "standardization_preview.md";
/// Default file name of the editable plan.
pub const PLAN_FILE_NAME: &str = "standardization_plan.md";

const EDITABLE_NOTE: &str = "editable";

/// Which report to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Read-only dry-run output.
    Preview,
    /// Plan with a Notes column and editing instructions.
    Editable,
}

/// Renders the change table as a Markdown document.
pub fn render_markdown(
    table: &ChangeTable,
    kind: ReportKind,
    generated_at: DateTime<Local>,
) -> String {
    let generated = format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let mut lines: Vec<String> = match kind {
        ReportKind::Editable => vec![
            "# Standardization Plan (Editable)".to_string(),
            String::new(),
            "**Instructions:**".to_string(),
            "- Edit the 'New Name' column to customize the new names".to_string(),
            "- Delete entire rows to skip those changes".to_string(),
            "- Keep the table format intact".to_string(),
            "- Run `tidy-tree --execute` to apply changes from this file".to_string(),
            String::new(),
            generated,
            String::new(),
            "| Type | Original Name | New Name | Action | Notes |".to_string(),
            "|------|---------------|----------|--------|-------|".to_string(),
        ],
        ReportKind::Preview => vec![
            "# Standardization Preview".to_string(),
            String::new(),
            generated,
            String::new(),
            "| Type | Original Name | New Name | Action |".to_string(),
            "|------|---------------|----------|--------|".to_string(),
        ],
    };

    for entry in table {
        let original = escape_cell(&display_relative(&entry.original));
        let new_name = escape_cell(&entry.proposed_name());
        let row = match kind {
            ReportKind::Editable => {
                let notes = if entry.action == Action::Renamed {
                    EDITABLE_NOTE
                } else {
                    ""
                };
                format!(
                    "| {} | {} | {} | {} | {} |",
                    entry.kind, original, new_name, entry.action, notes
                )
            }
            ReportKind::Preview => format!(
                "| {} | {} | {} | {} |",
                entry.kind, original, new_name, entry.action
            ),
        };
        lines.push(row);
    }

    let mut document = lines.join("\n");
    document.push('\n');
    document
}

/// Joins path components with `/` regardless of platform.
pub fn display_relative(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Escapes a cell for the table.
///
/// A pipe becomes `\|`. Whitespace at either edge of the cell is written as
/// `\ ` so that it survives the trimming of cell padding.
fn escape_cell(text: &str) -> String {
    let lead = text.len() - text.trim_start().len();
    let trail_from = text.trim_end().len().max(lead);

    let mut escaped = String::with_capacity(text.len());
    for (index, c) in text.char_indices() {
        let at_edge = index < lead || index >= trail_from;
        if c == '|' || (at_edge && c.is_whitespace()) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Splits a table row into trimmed cells.
///
/// Returns `None` if the line is not a pipe-delimited row. A `\|` inside a
/// cell is a literal pipe, and a backslash before whitespace keeps that
/// whitespace from being trimmed.
pub fn split_cells(line: &str) -> Option<Vec<String>> {
    let line = line.trim();
    let inner = line.strip_prefix('|')?;

    let mut cells = Vec::new();
    // Each char with whether it was escaped.
    let mut current: Vec<(char, bool)> = Vec::new();
    let mut chars = inner.chars().peekable();
    let mut closed = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek().is_some_and(|&n| n == '|' || n.is_whitespace()) => {
                if let Some(next) = chars.next() {
                    current.push((next, true));
                }
                closed = false;
            }
            '|' => {
                cells.push(finish_cell(&current));
                current.clear();
                closed = true;
            }
            other => {
                current.push((other, false));
                closed = false;
            }
        }
    }

    // Text after the last pipe means the row was never closed.
    closed.then_some(cells)
}

fn finish_cell(raw: &[(char, bool)]) -> String {
    let is_padding = |&(c, escaped): &(char, bool)| !escaped && c.is_whitespace();
    let start = raw.iter().position(|e| !is_padding(e)).unwrap_or(raw.len());
    let end = raw.iter().rposition(|e| !is_padding(e)).map_or(start, |i| i + 1);
    raw[start..end].iter().map(|&(c, _)| c).collect()
}

/// A structurally valid row of an edited plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRow {
    pub kind: EntryKind,
    pub original: PathBuf,
    pub new_name: String,
    pub action: Action,
}

impl PlanRow {
    /// The rename this row asks for; only `Renamed` rows produce one.
    pub fn into_rename(self) -> Option<RenameOp> {
        if self.action != Action::Renamed {
            return None;
        }
        let to = self.original.with_file_name(&self.new_name);
        Some(RenameOp {
            kind: self.kind,
            from: self.original,
            to,
        })
    }
}

/// Result of tokenizing one line of the table body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowParse {
    Row(PlanRow),
    /// The line is not a usable row; carries the reason for logging.
    Unparseable(String),
}

/// Parses one table body line into a typed row.
pub fn parse_row(line: &str) -> RowParse {
    let Some(cells) = split_cells(line) else {
        return RowParse::Unparseable("not a table row".to_string());
    };
    if !(4..=5).contains(&cells.len()) {
        return RowParse::Unparseable(format!("expected 4 or 5 cells, found {}", cells.len()));
    }

    let kind = match cells[0].parse::<EntryKind>() {
        Ok(kind) => kind,
        Err(reason) => return RowParse::Unparseable(reason),
    };
    let action = match cells[3].parse::<Action>() {
        Ok(action) => action,
        Err(reason) => return RowParse::Unparseable(reason),
    };

    let original = PathBuf::from(&cells[1]);
    if !is_plain_relative(&original) {
        return RowParse::Unparseable(format!("unusable original path '{}'", cells[1]));
    }

    let new_name = cells[2].clone();
    if !is_plain_name(&new_name) {
        return RowParse::Unparseable(format!("unusable new name '{new_name}'"));
    }

    RowParse::Row(PlanRow {
        kind,
        original,
        new_name,
        action,
    })
}

fn is_plain_relative(path: &Path) -> bool {
    path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)))
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn is_table_start(line: &str) -> bool {
    line.starts_with("| Type |") || line.starts_with("|---")
}

/// Reads the change list back out of a (possibly edited) plan.
///
/// Everything before the table header or separator is ignored. Malformed
/// rows are skipped, and only `Renamed` rows are returned.
pub fn parse_plan(text: &str) -> Vec<RenameOp> {
    let mut in_table = false;
    let mut changes = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if !in_table {
            in_table = is_table_start(line);
            continue;
        }
        if !line.starts_with('|') || line.starts_with("|---") {
            continue;
        }

        match parse_row(line) {
            RowParse::Row(row) => changes.extend(row.into_rename()),
            RowParse::Unparseable(reason) => {
                debug!(line = number + 1, %reason, "skipping plan row");
            }
        }
    }

    changes
}

/// Writes a report to `path`, stamped with the current time.
pub fn write_report(path: &Path, table: &ChangeTable, kind: ReportKind) -> Result<()> {
    let document = render_markdown(table, kind, Local::now());
    fs::write(path, document).map_err(|e| TidyError::io(path, e))
}

/// Loads the change list from a plan file.
///
/// # Errors
///
/// Returns [`TidyError::PlanFileMissing`] if there is no plan at `path`.
pub fn load_plan(path: &Path) -> Result<Vec<RenameOp>> {
    if !path.exists() {
        return Err(TidyError::PlanFileMissing(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|e| TidyError::io(path, e))?;
    Ok(parse_plan(&text))
}

/// Removes the plan file if it exists.
pub fn delete_plan(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).map_err(|e| TidyError::io(path, e))?;
    }
    Ok(())
}

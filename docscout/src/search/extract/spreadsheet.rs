use calamine::{open_workbook_auto, Data, Reader, SheetType, SheetVisible, Sheets};
use std::collections::{BTreeMap, VecDeque};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::{ContentExtractor, ContentUnit, ContentUnits, ExtractOptions};
use crate::errors::{ExtractError, ExtractResult};

/// Converts a 1-based column index into spreadsheet letters (1 -> A, 27 -> AA)
pub fn column_letter(index: u32) -> String {
    if index == 0 {
        return "#".to_string();
    }
    let mut letters = Vec::new();
    let mut n = index;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders a cell value the way it is searched.
///
/// Date cells read as `2024-01-15 00:00:00` rather than their serial number
/// and booleans as `True`/`False`.
fn cell_text(value: &Data) -> String {
    match value {
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::DateTime(date) if !date.is_duration() => date
            .as_datetime()
            .map(|dt| dt.format(DATE_TIME_FORMAT).to_string())
            .unwrap_or_else(|| value.to_string()),
        Data::DateTimeIso(iso) => iso.replacen('T', " ", 1),
        other => other.to_string(),
    }
}

/// Reads `.xlsx` and `.xls` workbooks through calamine.
///
/// Visible worksheets are read in workbook order, each one row by row and
/// left to right. Blank cells produce no unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetExtractor;

impl ContentExtractor for SpreadsheetExtractor {
    fn open(&self, path: &Path, options: ExtractOptions) -> ExtractResult<ContentUnits> {
        let workbook = open_workbook_auto(path).map_err(|e| {
            let reason = e.to_string();
            if reason.to_lowercase().contains("password") {
                ExtractError::protected(path)
            } else {
                ExtractError::unreadable(path, reason)
            }
        })?;

        let pending: VecDeque<String> = workbook
            .sheets_metadata()
            .iter()
            .filter(|sheet| {
                let searchable = matches!(sheet.visible, SheetVisible::Visible)
                    && matches!(sheet.typ, SheetType::WorkSheet);
                if !searchable {
                    debug!("Skipping sheet '{}' in {}", sheet.name, path.display());
                }
                searchable
            })
            .map(|sheet| sheet.name.clone())
            .collect();

        Ok(Box::new(SheetUnits {
            path: path.to_path_buf(),
            workbook,
            pending,
            current: Vec::new().into_iter(),
            content_only: options.content_only,
        }))
    }
}

/// Cells of an open workbook, loaded one sheet at a time
struct SheetUnits {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
    pending: VecDeque<String>,
    current: std::vec::IntoIter<ContentUnit>,
    content_only: bool,
}

impl SheetUnits {
    fn load_sheet(&mut self, name: &str) -> ExtractResult<Vec<ContentUnit>> {
        let range = self
            .workbook
            .worksheet_range(name)
            .map_err(|e| ExtractError::partial_read(&self.path, format!("sheet '{}'", name), e))?;

        // Keyed by absolute (row, column) so iteration is row-major
        let mut cells: BTreeMap<(u32, u32), String> = BTreeMap::new();
        if let Some((first_row, first_col)) = range.start() {
            for (row, col, value) in range.used_cells() {
                cells.insert(
                    (first_row + row as u32, first_col + col as u32),
                    cell_text(value),
                );
            }
        }

        if !self.content_only {
            match self.workbook.worksheet_formula(name) {
                Ok(formulas) => {
                    if let Some((first_row, first_col)) = formulas.start() {
                        for (row, col, formula) in formulas.used_cells() {
                            if formula.trim().is_empty() {
                                continue;
                            }
                            let text = if formula.starts_with('=') {
                                formula.clone()
                            } else {
                                format!("={}", formula)
                            };
                            cells.insert((first_row + row as u32, first_col + col as u32), text);
                        }
                    }
                }
                Err(e) => debug!("No formulas read from sheet '{}': {}", name, e),
            }
        }

        let units: Vec<ContentUnit> = cells
            .into_iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|((row, col), text)| {
                ContentUnit::new(
                    format!("Sheet '{}', Cell {}{}", name, column_letter(col + 1), row + 1),
                    text,
                )
            })
            .collect();

        trace!("Sheet '{}' yielded {} cells", name, units.len());
        Ok(units)
    }
}

impl Iterator for SheetUnits {
    type Item = ExtractResult<ContentUnit>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(unit) = self.current.next() {
                return Some(Ok(unit));
            }
            let name = self.pending.pop_front()?;
            match self.load_sheet(&name) {
                Ok(units) => self.current = units.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

//! Excel planning workbook renderer
//!
//! Generates XLSX files with:
//! - Planning: one row per scheduled test, dates stored as real Excel dates
//! - Overlaps: one row per overlapping pair (only when there are any)
//!
//! Alert flags are highlighted together with the date that triggered them,
//! and the test cells of overlapping tests are tinted.
//!
//! ## Example Output Structure
//!
//! ```text
//! Sheet: Planning
//! | Vehicle | Test   | Responsible | Start      | End        | Days | Week | SOPM       | ... |
//! |---------|--------|-------------|------------|------------|------|------|------------|-----|
//! | V001    | Brakes | Lab A       | 2025-01-01 | 2025-01-03 | 3    | 1    | 2025-01-01 | ... |
//! ```

use chrono::Datelike;
use rust_xlsxwriter::{ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use testplan_core::rows::{OVERLAP_FIELDS, SCHEDULE_FIELDS};
use testplan_core::{CellValue, PlanView, RenderError, Renderer, Row};
use tracing::debug;

use crate::{alert_field_for, column_label};

/// Excel planning workbook renderer
#[derive(Clone, Debug)]
pub struct ExcelRenderer {
    /// Name of the schedule sheet
    pub sheet_name: String,
    /// Excel number format for date cells
    pub date_format: String,
    /// Whether to add the Overlaps sheet when overlaps exist
    pub include_overlaps: bool,
}

impl Default for ExcelRenderer {
    fn default() -> Self {
        Self {
            sheet_name: "Planning".into(),
            date_format: "yyyy-mm-dd".into(),
            include_overlaps: true,
        }
    }
}

impl ExcelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the schedule sheet name
    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Set the date number format, e.g. `dd/mm/yyyy`
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Never add the Overlaps sheet
    pub fn no_overlap_sheet(mut self) -> Self {
        self.include_overlaps = false;
        self
    }

    /// Generate Excel workbook bytes
    pub fn render_to_bytes(&self, view: &PlanView) -> Result<Vec<u8>, RenderError> {
        let mut workbook = Workbook::new();
        let formats = self.create_formats();

        self.add_planning_sheet(&mut workbook, view, &formats)?;
        if self.include_overlaps && !view.overlaps.is_empty() {
            self.add_overlaps_sheet(&mut workbook, view, &formats)?;
        }

        let buffer = workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))?;

        debug!(
            tests = view.schedule.tests.len(),
            overlaps = view.overlaps.len(),
            bytes = buffer.len(),
            "rendered workbook"
        );
        Ok(buffer)
    }

    /// Create reusable formats
    fn create_formats(&self) -> ExcelFormats {
        let header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(0x4472C4)
            .set_font_color(0xFFFFFF)
            .set_border(FormatBorder::Thin);

        let text = Format::new().set_border(FormatBorder::Thin);

        let integer = Format::new()
            .set_num_format("0")
            .set_border(FormatBorder::Thin);

        let date = Format::new()
            .set_num_format(&self.date_format)
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin);

        // Light red for anything an alert points at
        let alert = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(0xF8CBAD)
            .set_font_color(0x9C0006)
            .set_border(FormatBorder::Thin);

        let alert_date = Format::new()
            .set_num_format(&self.date_format)
            .set_align(FormatAlign::Center)
            .set_background_color(0xF8CBAD)
            .set_font_color(0x9C0006)
            .set_border(FormatBorder::Thin);

        // Light orange for tests involved in an overlap
        let overlap_text = Format::new()
            .set_background_color(0xFCE4D6)
            .set_border(FormatBorder::Thin);

        ExcelFormats {
            header,
            text,
            integer,
            date,
            alert,
            alert_date,
            overlap_text,
        }
    }

    /// Add the Planning sheet
    fn add_planning_sheet(
        &self,
        workbook: &mut Workbook,
        view: &PlanView,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(&self.sheet_name)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        write_headers(sheet, &SCHEDULE_FIELDS, formats)?;

        for (idx, row) in view.schedule_rows().iter().enumerate() {
            let excel_row = idx as u32 + 1;
            let overlapping = match (row.get("vehicle"), row.get("test")) {
                (Some(CellValue::Text(vehicle)), Some(CellValue::Text(test))) => {
                    view.is_overlapping(vehicle, test)
                }
                _ => false,
            };

            for (col, (name, value)) in row.iter().enumerate() {
                let format = schedule_cell_format(name, value, row, overlapping, formats);
                write_cell(sheet, excel_row, col as u16, value, format)?;
            }
        }

        set_widths(sheet, &SCHEDULE_FIELDS);
        sheet.set_freeze_panes(1, 2).ok();
        Ok(())
    }

    /// Add the Overlaps sheet
    fn add_overlaps_sheet(
        &self,
        workbook: &mut Workbook,
        view: &PlanView,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name("Overlaps")
            .map_err(|e| RenderError::Format(e.to_string()))?;

        write_headers(sheet, &OVERLAP_FIELDS, formats)?;
        for (idx, row) in view.overlap_rows().iter().enumerate() {
            for (col, (_, value)) in row.iter().enumerate() {
                let format = match value {
                    CellValue::Date(_) => &formats.date,
                    CellValue::Int(_) => &formats.integer,
                    _ => &formats.text,
                };
                write_cell(sheet, idx as u32 + 1, col as u16, value, format)?;
            }
        }

        set_widths(sheet, &OVERLAP_FIELDS);
        sheet.set_freeze_panes(1, 0).ok();
        Ok(())
    }
}

/// Reusable cell formats
struct ExcelFormats {
    header: Format,
    text: Format,
    integer: Format,
    date: Format,
    alert: Format,
    alert_date: Format,
    overlap_text: Format,
}

fn schedule_cell_format<'a>(
    name: &str,
    value: &CellValue,
    row: &Row,
    overlapping: bool,
    formats: &'a ExcelFormats,
) -> &'a Format {
    match value {
        CellValue::Flag(true) => &formats.alert,
        CellValue::Date(_) => {
            let alerted = alert_field_for(name)
                .and_then(|flag| row.get(flag))
                .is_some_and(|flag| *flag == CellValue::Flag(true));
            if alerted {
                &formats.alert_date
            } else {
                &formats.date
            }
        }
        CellValue::Int(_) => &formats.integer,
        _ if overlapping && name == "test" => &formats.overlap_text,
        _ => &formats.text,
    }
}

fn write_headers(
    sheet: &mut Worksheet,
    fields: &[&str],
    formats: &ExcelFormats,
) -> Result<(), RenderError> {
    for (col, field) in fields.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, column_label(field), &formats.header)
            .map_err(|e| RenderError::Format(e.to_string()))?;
    }
    Ok(())
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: &Format,
) -> Result<(), RenderError> {
    let result = match value {
        CellValue::Text(s) => sheet.write_string_with_format(row, col, s, format),
        CellValue::Int(n) => sheet.write_number_with_format(row, col, *n as f64, format),
        CellValue::Date(d) => {
            let excel_date = u16::try_from(d.year())
                .ok()
                .and_then(|y| ExcelDateTime::from_ymd(y, d.month() as u8, d.day() as u8).ok());
            match excel_date {
                Some(date) => sheet.write_datetime_with_format(row, col, &date, format),
                // Outside the range Excel can represent
                None => sheet.write_string_with_format(row, col, value.to_string(), format),
            }
        }
        CellValue::Flag(true) => sheet.write_string_with_format(row, col, "yes", format),
        CellValue::Flag(false) | CellValue::Empty => sheet.write_blank(row, col, format),
    };
    result
        .map(|_| ())
        .map_err(|e| RenderError::Format(e.to_string()))
}

fn set_widths(sheet: &mut Worksheet, fields: &[&str]) {
    for (col, field) in fields.iter().enumerate() {
        let width = match *field {
            "start" | "end" | "sopm" | "lrm" | "start_a" | "end_a" | "start_b" | "end_b" => 12.0,
            "test" | "test_a" | "test_b" | "responsible" => 22.0,
            "vehicle" => 12.0,
            _ => 10.0,
        };
        sheet.set_column_width(col as u16, width).ok();
    }
}

impl Renderer for ExcelRenderer {
    type Output = Vec<u8>;

    fn render(&self, view: &PlanView) -> Result<Vec<u8>, RenderError> {
        if view.schedule.is_empty() {
            return Err(RenderError::InvalidData("No tests to render".into()));
        }
        self.render_to_bytes(view)
    }
}

//! CSV export of schedule rows

use testplan_core::rows::{OVERLAP_FIELDS, SCHEDULE_FIELDS};
use testplan_core::{PlanView, RenderError, Renderer, Row};

/// Schedule rows as delimited text, headed by the field names
#[derive(Clone, Debug)]
pub struct CsvRenderer {
    pub delimiter: u8,
    /// Export the overlap rows instead of the schedule rows
    pub overlaps: bool,
}

impl Default for CsvRenderer {
    fn default() -> Self {
        Self {
            delimiter: b',',
            overlaps: false,
        }
    }
}

impl CsvRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another delimiter, e.g. `b';'` for spreadsheet locales with decimal commas
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn overlaps(mut self) -> Self {
        self.overlaps = true;
        self
    }

    fn write(&self, fields: &[&str], rows: &[Row]) -> Result<String, RenderError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());

        writer
            .write_record(fields)
            .map_err(|e| RenderError::Format(e.to_string()))?;
        for row in rows {
            writer
                .write_record(row.values().map(ToString::to_string))
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| RenderError::Format(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| RenderError::Format(format!("Invalid UTF-8: {}", e)))
    }
}

impl Renderer for CsvRenderer {
    type Output = String;

    fn render(&self, view: &PlanView) -> Result<String, RenderError> {
        if self.overlaps {
            self.write(&OVERLAP_FIELDS, &view.overlap_rows())
        } else {
            self.write(&SCHEDULE_FIELDS, &view.schedule_rows())
        }
    }
}

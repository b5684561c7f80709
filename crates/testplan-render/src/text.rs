//! Plain text renderer for console output

use testplan_core::{PlanView, RenderError, Renderer, Row};

use crate::column_label;

/// Boxed text tables: the schedule, then the overlaps
#[derive(Clone, Debug, Default)]
pub struct TextRenderer {
    /// Leave out the overlap section
    pub schedule_only: bool,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_only(mut self) -> Self {
        self.schedule_only = true;
        self
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, view: &PlanView) -> Result<String, RenderError> {
        let schedule = &view.schedule;
        let mut out = format!(
            "Project: {} (reference date {})\n\n",
            schedule.project,
            schedule.today.format("%Y-%m-%d")
        );

        if schedule.is_empty() {
            out.push_str("No tests scheduled.\n");
            return Ok(out);
        }

        out.push_str(&render_table(&view.schedule_rows()));
        out.push_str(&format!(
            "{} tests on {} vehicles, {} alerts\n",
            schedule.tests.len(),
            schedule.vehicles().len(),
            schedule.alert_count()
        ));

        if !self.schedule_only {
            out.push('\n');
            if view.overlaps.is_empty() {
                out.push_str("No overlaps.\n");
            } else {
                out.push_str(&format!("Overlaps ({}):\n", view.overlaps.len()));
                out.push_str(&render_table(&view.overlap_rows()));
            }
        }

        Ok(out)
    }
}

/// Render rows as a boxed table; headings come from the first row's fields
pub fn render_table(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };
    let headers: Vec<&str> = first.names().map(column_label).collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.values().map(ToString::to_string).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (col, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(col) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(w + 2));
        sep.push('+');
    }
    sep.push('\n');

    let mut out = sep.clone();
    push_line(&mut out, headers.iter().copied(), &widths);
    out.push_str(&sep);
    for row in &cells {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out.push_str(&sep);
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    out.push('|');
    for (cell, width) in cells.zip(widths) {
        let pad = width.saturating_sub(cell.chars().count());
        out.push(' ');
        out.push_str(cell);
        out.push_str(&" ".repeat(pad));
        out.push_str(" |");
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use testplan_core::CellValue;

    #[test]
    fn table_pads_columns_to_widest_cell() {
        let rows = vec![
            Row::new()
                .with("vehicle", CellValue::Text("V1".into()))
                .with("week", CellValue::Int(3)),
            Row::new()
                .with("vehicle", CellValue::Text("V0042".into()))
                .with("week", CellValue::Int(52)),
        ];
        let table = render_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "+---------+------+");
        assert_eq!(lines[1], "| Vehicle | Week |");
        assert_eq!(lines[3], "| V1      | 3    |");
        assert_eq!(lines[4], "| V0042   | 52   |");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn empty_table_is_empty_string() {
        assert_eq!(render_table(&[]), "");
    }
}

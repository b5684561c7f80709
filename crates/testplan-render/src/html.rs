//! Printable HTML report renderer
//!
//! Generates a standalone HTML document: title, schedule table, overlap
//! table and the SVG timeline. Styles include a print stylesheet (A4
//! landscape), so printing the page from a browser yields the PDF report.

use testplan_core::rows::{OVERLAP_FIELDS, SCHEDULE_FIELDS};
use testplan_core::{CellValue, PlanView, RenderError, Renderer, Row};

use crate::{alert_field_for, column_label, SvgTimelineRenderer};

/// HTML report renderer configuration
#[derive(Clone, Debug)]
pub struct HtmlReportRenderer {
    /// Heading; defaults to the project name
    pub title: Option<String>,
    /// Embed the SVG timeline below the tables
    pub include_timeline: bool,
    /// Timeline settings
    pub timeline: SvgTimelineRenderer,
}

impl Default for HtmlReportRenderer {
    fn default() -> Self {
        Self {
            title: None,
            include_timeline: true,
            timeline: SvgTimelineRenderer::default(),
        }
    }
}

impl HtmlReportRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn without_timeline(mut self) -> Self {
        self.include_timeline = false;
        self
    }

    pub fn timeline(mut self, timeline: SvgTimelineRenderer) -> Self {
        self.timeline = timeline;
        self
    }

    fn generate_html(&self, view: &PlanView, timeline: &str) -> String {
        let schedule = &view.schedule;
        let title = self.title.as_deref().unwrap_or(&schedule.project);

        let overlaps = if view.overlaps.is_empty() {
            "<p class=\"none\">No overlaps.</p>".to_string()
        } else {
            render_table(&OVERLAP_FIELDS, &view.overlap_rows(), |_, _| false)
        };

        let schedule_table = render_table(&SCHEDULE_FIELDS, &view.schedule_rows(), |row, field| {
            field == "test"
                && matches!(
                    (row.get("vehicle"), row.get("test")),
                    (Some(CellValue::Text(v)), Some(CellValue::Text(t))) if view.is_overlapping(v, t)
                )
        });

        let timeline_section = if timeline.is_empty() {
            String::new()
        } else {
            format!("    <h2>Timeline</h2>\n    <div class=\"timeline\">\n{timeline}\n    </div>\n")
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Test Planning</title>
    <style>
{css}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <p class="meta">Reference date {today} &middot; {tests} tests on {vehicles} vehicles &middot; {alerts} alerts &middot; {overlap_count} overlaps</p>
    <h2>Planning</h2>
{schedule_table}
    <h2>Overlaps</h2>
{overlaps}
{timeline_section}</body>
</html>
"#,
            title = html_escape(title),
            css = CSS,
            today = schedule.today.format("%Y-%m-%d"),
            tests = schedule.tests.len(),
            vehicles = schedule.vehicles().len(),
            alerts = schedule.alert_count(),
            overlap_count = view.overlaps.len(),
        )
    }
}

const CSS: &str = r#"        body {
            font-family: system-ui, -apple-system, sans-serif;
            color: #2c3e50;
            margin: 24px;
        }
        h1 { font-size: 1.5rem; margin-bottom: 4px; }
        h2 { font-size: 1.1rem; margin-top: 24px; }
        .meta { color: #7f8c8d; margin-top: 0; }
        table { border-collapse: collapse; font-size: 12px; }
        th {
            background: #4472c4;
            color: #ffffff;
            padding: 4px 8px;
            border: 1px solid #8ea9db;
        }
        td { padding: 3px 8px; border: 1px solid #d9d9d9; }
        td.date, td.int { text-align: center; white-space: nowrap; }
        td.alert { background: #f8cbad; color: #9c0006; font-weight: bold; }
        td.overlap { background: #fce4d6; }
        .none { color: #27ae60; }
        .timeline svg { max-width: 100%; height: auto; }
        @media print {
            @page { size: A4 landscape; margin: 12mm; }
            body { margin: 0; }
            h2 { break-after: avoid; }
            tr { break-inside: avoid; }
            .timeline { break-before: page; }
        }"#;

fn render_table(fields: &[&str], rows: &[Row], highlight: impl Fn(&Row, &str) -> bool) -> String {
    let mut out = String::from("    <table>\n        <thead><tr>");
    for field in fields {
        out.push_str(&format!("<th>{}</th>", html_escape(column_label(field))));
    }
    out.push_str("</tr></thead>\n        <tbody>\n");

    for row in rows {
        out.push_str("            <tr>");
        for (name, value) in row.iter() {
            let class = cell_class(name, value, row, &highlight);
            let text = html_escape(&value.to_string());
            match class {
                Some(class) => out.push_str(&format!("<td class=\"{class}\">{text}</td>")),
                None => out.push_str(&format!("<td>{text}</td>")),
            }
        }
        out.push_str("</tr>\n");
    }

    out.push_str("        </tbody>\n    </table>");
    out
}

fn cell_class(
    name: &str,
    value: &CellValue,
    row: &Row,
    highlight: &impl Fn(&Row, &str) -> bool,
) -> Option<&'static str> {
    let alerted = alert_field_for(name)
        .and_then(|flag| row.get(flag))
        .is_some_and(|flag| *flag == CellValue::Flag(true));

    match value {
        CellValue::Flag(true) => Some("alert"),
        _ if alerted => Some("alert"),
        _ if highlight(row, name) => Some("overlap"),
        CellValue::Date(_) => Some("date"),
        CellValue::Int(_) => Some("int"),
        _ => None,
    }
}

impl Renderer for HtmlReportRenderer {
    type Output = String;

    fn render(&self, view: &PlanView) -> Result<String, RenderError> {
        if view.schedule.is_empty() {
            return Err(RenderError::InvalidData("No tests to render".into()));
        }

        let timeline = if self.include_timeline {
            self.timeline.render(view)?
        } else {
            String::new()
        };

        Ok(self.generate_html(view, &timeline))
    }
}

/// HTML-escape a string
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_escape_works() {
        assert_eq!(html_escape("<a & \"b\">"), "&lt;a &amp; &quot;b&quot;&gt;");
    }

    #[test]
    fn html_report_options() {
        let renderer = HtmlReportRenderer::new().title("Essais").without_timeline();
        assert_eq!(renderer.title.as_deref(), Some("Essais"));
        assert!(!renderer.include_timeline);
    }

    #[test]
    fn alert_date_cells_get_alert_class() {
        let row = Row::new()
            .with("end", CellValue::Date(chrono::NaiveDate::from_ymd_opt(2025, 1, 3).unwrap()))
            .with("end_alert", CellValue::Flag(true));
        let none = |_: &Row, _: &str| false;
        assert_eq!(cell_class("end", row.get("end").unwrap(), &row, &none), Some("alert"));
        assert_eq!(cell_class("end_alert", row.get("end_alert").unwrap(), &row, &none), Some("alert"));
    }
}

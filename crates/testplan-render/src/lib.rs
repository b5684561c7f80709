//! # testplan-render
//!
//! Rendering backends for derived test plans.
//!
//! This crate provides:
//! - SVG timeline, one row per vehicle (`SvgTimelineRenderer`)
//! - Boxed text tables for the console (`TextRenderer`)
//! - Excel workbooks with real dates and highlighted alerts (`ExcelRenderer`)
//! - CSV export of the schedule rows (`CsvRenderer`)
//! - A printable standalone HTML report (`HtmlReportRenderer`)
//!
//! Every renderer consumes a [`PlanView`] and never derives anything itself.
//!
//! ## Example
//!
//! ```rust,ignore
//! use testplan_core::Renderer;
//! use testplan_render::{ExcelRenderer, SvgTimelineRenderer, TextRenderer};
//!
//! let view = testplan_solver::plan_view(&plan, &config, today)?;
//!
//! println!("{}", TextRenderer::new().render(&view)?);
//!
//! let svg = SvgTimelineRenderer::default().render(&view)?;
//!
//! let xlsx_bytes = ExcelRenderer::new().render(&view)?;
//! std::fs::write("planning.xlsx", xlsx_bytes)?;
//! ```

pub mod delimited;
pub mod excel;
pub mod html;
pub mod text;

pub use delimited::CsvRenderer;
pub use excel::ExcelRenderer;
pub use html::HtmlReportRenderer;
pub use text::TextRenderer;

use chrono::{Datelike, Days, NaiveDate};
use svg::node::element::{Element, Group, Line, Rectangle, Text};
use svg::node::Node;
use svg::Document;
use testplan_core::{DateRange, PlanView, RenderError, Renderer, ScheduledTest};

/// SVG timeline renderer configuration
#[derive(Clone, Debug)]
pub struct SvgTimelineRenderer {
    /// Width of the chart area (excluding labels) in pixels
    pub chart_width: u32,
    /// Height per vehicle row in pixels
    pub row_height: u32,
    /// Width of the vehicle label column in pixels
    pub label_width: u32,
    /// Header height in pixels
    pub header_height: u32,
    /// Padding around the chart
    pub padding: u32,
    /// Bar colours, assigned to test names in first-seen order
    pub palette: Vec<String>,
    /// Outline for bars involved in an overlap
    pub overlap_color: String,
    /// Colour of the reference date marker
    pub today_color: String,
    /// Background color
    pub background_color: String,
    /// Grid line color
    pub grid_color: String,
    /// Text color
    pub text_color: String,
    /// Font family
    pub font_family: String,
    /// Font size in pixels
    pub font_size: u32,
    /// Legend entries per line
    pub legend_columns: usize,
}

impl Default for SvgTimelineRenderer {
    fn default() -> Self {
        Self {
            chart_width: 800,
            row_height: 32,
            label_width: 140,
            header_height: 50,
            padding: 20,
            palette: [
                "#3498db", "#2ecc71", "#e67e22", "#9b59b6", "#1abc9c", "#f1c40f", "#34495e",
                "#e84393",
            ]
            .iter()
            .map(|c| (*c).to_string())
            .collect(),
            overlap_color: "#e74c3c".into(),
            today_color: "#c0392b".into(),
            background_color: "#ffffff".into(),
            grid_color: "#ecf0f1".into(),
            text_color: "#2c3e50".into(),
            font_family: "system-ui, -apple-system, sans-serif".into(),
            font_size: 12,
            legend_columns: 5,
        }
    }
}

impl SvgTimelineRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure chart width
    pub fn chart_width(mut self, width: u32) -> Self {
        self.chart_width = width;
        self
    }

    /// Configure row height
    pub fn row_height(mut self, height: u32) -> Self {
        self.row_height = height;
        self
    }

    /// Calculate the total width of the SVG
    fn total_width(&self) -> u32 {
        self.padding * 2 + self.label_width + self.chart_width
    }

    fn chart_top(&self) -> u32 {
        self.padding + self.header_height
    }

    /// Pixels per calendar day; every day of the span gets a full column
    fn pixels_per_day(&self, span: &DateRange) -> f64 {
        self.chart_width as f64 / span.days().max(1) as f64
    }

    /// Convert a date to x position
    fn date_to_x(&self, date: NaiveDate, start: NaiveDate, px_per_day: f64) -> f64 {
        let days = (date - start).num_days() as f64;
        self.padding as f64 + self.label_width as f64 + (days * px_per_day)
    }

    /// Colour of a test name
    fn color_for<'a>(&'a self, name: &str, names: &[&str]) -> &'a str {
        let idx = names.iter().position(|n| *n == name).unwrap_or(0);
        self.palette
            .get(idx % self.palette.len().max(1))
            .map_or("#3498db", String::as_str)
    }

    /// Create the header with date labels
    fn render_header(&self, span: &DateRange, px_per_day: f64) -> Group {
        let mut group = Group::new().set("class", "header");

        let header_bg = Rectangle::new()
            .set("x", self.padding)
            .set("y", self.padding)
            .set("width", self.label_width + self.chart_width)
            .set("height", self.header_height)
            .set("fill", "#f8f9fa");
        group = group.add(header_bg);

        let interval_days = label_interval(span.days());
        for current in day_steps(span, interval_days) {
            let x = self.date_to_x(current, span.start, px_per_day);

            let tick = Line::new()
                .set("x1", x)
                .set("y1", self.chart_top() - 10)
                .set("x2", x)
                .set("y2", self.chart_top())
                .set("stroke", self.text_color.as_str())
                .set("stroke-width", 1);
            group = group.add(tick);

            let label = if interval_days == 1 {
                current.format("%d").to_string()
            } else {
                current.format("%b %d").to_string()
            };
            let text = Text::new(label)
                .set("x", x)
                .set("y", self.chart_top() - 15)
                .set("font-family", self.font_family.as_str())
                .set("font-size", self.font_size.saturating_sub(1))
                .set("fill", self.text_color.as_str())
                .set("text-anchor", "middle");
            group = group.add(text);
        }

        let period = if (span.start.year(), span.start.month()) == (span.end.year(), span.end.month()) {
            span.start.format("%B %Y").to_string()
        } else {
            format!("{} - {}", span.start.format("%b %Y"), span.end.format("%b %Y"))
        };
        let period_text = Text::new(period)
            .set("x", self.padding + self.label_width + self.chart_width / 2)
            .set("y", self.padding + 18)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size + 2)
            .set("font-weight", "bold")
            .set("fill", self.text_color.as_str())
            .set("text-anchor", "middle");
        group = group.add(period_text);

        group
    }

    /// Render grid lines
    fn render_grid(&self, row_count: usize, span: &DateRange, px_per_day: f64) -> Group {
        let mut group = Group::new().set("class", "grid");

        let chart_top = self.chart_top();
        let chart_bottom = chart_top + (row_count as u32 * self.row_height);

        for i in 0..=row_count {
            let y = chart_top + (i as u32 * self.row_height);
            let line = Line::new()
                .set("x1", self.padding)
                .set("y1", y)
                .set("x2", self.padding + self.label_width + self.chart_width)
                .set("y2", y)
                .set("stroke", self.grid_color.as_str())
                .set("stroke-width", 1);
            group = group.add(line);
        }

        let interval = if span.days() <= 31 { 1 } else { 7 };
        for current in day_steps(span, interval) {
            let x = self.date_to_x(current, span.start, px_per_day);
            let line = Line::new()
                .set("x1", x)
                .set("y1", chart_top)
                .set("x2", x)
                .set("y2", chart_bottom)
                .set("stroke", self.grid_color.as_str())
                .set("stroke-width", 1);
            group = group.add(line);
        }

        group
    }

    /// Render one test bar
    fn render_test(
        &self,
        test: &ScheduledTest,
        row: usize,
        color: &str,
        overlapping: bool,
        span: &DateRange,
        px_per_day: f64,
    ) -> Group {
        let class = if overlapping { "test overlap" } else { "test" };
        let mut group = Group::new().set("class", class);

        let y = self.chart_top() + (row as u32 * self.row_height);
        let bar_height = (self.row_height as f64 * 0.6) as u32;
        let bar_y = y + (self.row_height - bar_height) / 2;

        let x_start = self.date_to_x(test.start, span.start, px_per_day);
        // Bars cover the end day itself
        let bar_width = (test.duration_days as f64 * px_per_day).max(4.0);

        let mut tooltip = Element::new("title");
        tooltip.append(svg::node::Text::new(format!(
            "{} / {}: {} to {} ({} days, W{})",
            test.vehicle_id,
            test.test_name,
            test.start.format("%Y-%m-%d"),
            test.end.format("%Y-%m-%d"),
            test.duration_days,
            test.week
        )));

        let mut bar = Rectangle::new()
            .set("x", x_start)
            .set("y", bar_y)
            .set("width", bar_width)
            .set("height", bar_height)
            .set("rx", 3)
            .set("ry", 3)
            .set("fill", color)
            .set("fill-opacity", 0.85);
        if overlapping {
            bar = bar
                .set("stroke", self.overlap_color.as_str())
                .set("stroke-width", 2);
        }
        group = group.add(bar.add(tooltip));

        // Name inside the bar when it fits
        let max_chars = (bar_width / (self.font_size as f64 * 0.6)) as usize;
        if max_chars >= 4 {
            let label = Text::new(truncate(&test.test_name, max_chars))
                .set("x", x_start + 4.0)
                .set("y", y + self.row_height / 2 + 4)
                .set("font-family", self.font_family.as_str())
                .set("font-size", self.font_size.saturating_sub(1))
                .set("fill", "#ffffff");
            group = group.add(label);
        }

        group
    }

    /// Render the reference date marker
    fn render_today(&self, today: NaiveDate, row_count: usize, span: &DateRange, px_per_day: f64) -> Group {
        let mut group = Group::new().set("class", "today");
        let x = self.date_to_x(today, span.start, px_per_day);
        let line = Line::new()
            .set("x1", x)
            .set("y1", self.chart_top())
            .set("x2", x)
            .set("y2", self.chart_top() + row_count as u32 * self.row_height)
            .set("stroke", self.today_color.as_str())
            .set("stroke-width", 1.5)
            .set("stroke-dasharray", "4 3");
        group = group.add(line);
        let label = Text::new("Today")
            .set("x", x + 3.0)
            .set("y", self.chart_top() + 10)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size.saturating_sub(2))
            .set("fill", self.today_color.as_str());
        group.add(label)
    }

    fn legend_lines(&self, names: &[&str]) -> u32 {
        // One extra entry for the overlap marker
        (names.len() + 1).div_ceil(self.legend_columns.max(1)) as u32
    }

    /// Render the legend: one entry per test name, then the overlap marker
    fn render_legend(&self, names: &[&str], y_offset: u32) -> Group {
        let mut group = Group::new().set("class", "legend");
        let box_size = 12.0;
        let spacing = 150.0;
        let columns = self.legend_columns.max(1);

        let entry_position = |idx: usize| {
            let x = self.padding as f64 + (idx % columns) as f64 * spacing;
            let y = y_offset as f64 + 15.0 + (idx / columns) as f64 * 20.0;
            (x, y)
        };

        for (idx, name) in names.iter().enumerate() {
            let (x, y) = entry_position(idx);
            let swatch = Rectangle::new()
                .set("x", x)
                .set("y", y - box_size + 2.0)
                .set("width", box_size)
                .set("height", box_size)
                .set("rx", 2)
                .set("fill", self.color_for(name, names));
            group = group.add(swatch);

            let label = Text::new(truncate(name, 20))
                .set("x", x + box_size + 5.0)
                .set("y", y)
                .set("font-family", self.font_family.as_str())
                .set("font-size", self.font_size.saturating_sub(1))
                .set("fill", self.text_color.as_str());
            group = group.add(label);
        }

        let (x, y) = entry_position(names.len());
        let marker = Rectangle::new()
            .set("x", x)
            .set("y", y - box_size + 2.0)
            .set("width", box_size)
            .set("height", box_size)
            .set("rx", 2)
            .set("fill", "none")
            .set("stroke", self.overlap_color.as_str())
            .set("stroke-width", 2);
        group = group.add(marker);
        let label = Text::new("Overlap")
            .set("x", x + box_size + 5.0)
            .set("y", y)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size.saturating_sub(1))
            .set("fill", self.text_color.as_str());
        group.add(label)
    }
}

impl Renderer for SvgTimelineRenderer {
    type Output = String;

    fn render(&self, view: &PlanView) -> Result<String, RenderError> {
        let schedule = &view.schedule;
        let Some(span) = schedule.span() else {
            return Err(RenderError::InvalidData("No tests to render".into()));
        };

        let vehicles = schedule.vehicles();
        let names = test_names(view);
        let row_count = vehicles.len();
        let px_per_day = self.pixels_per_day(&span);

        let width = self.total_width();
        let legend_y = self.chart_top() + row_count as u32 * self.row_height + 10;
        let height = legend_y + self.legend_lines(&names) * 20 + self.padding;

        let mut document = Document::new()
            .set("width", width)
            .set("height", height)
            .set("viewBox", (0, 0, width, height))
            .set("xmlns", "http://www.w3.org/2000/svg");

        let background = Rectangle::new()
            .set("width", "100%")
            .set("height", "100%")
            .set("fill", self.background_color.as_str());
        document = document.add(background);

        let title = Text::new(schedule.project.as_str())
            .set("x", self.padding)
            .set("y", self.padding + 15)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size + 4)
            .set("font-weight", "bold")
            .set("fill", self.text_color.as_str());
        document = document.add(title);

        document = document.add(self.render_grid(row_count, &span, px_per_day));
        document = document.add(self.render_header(&span, px_per_day));

        for (row, vehicle_id) in vehicles.iter().enumerate() {
            let y = self.chart_top() + (row as u32 * self.row_height);
            let label = Text::new(truncate(vehicle_id, 18))
                .set("x", self.padding + 8)
                .set("y", y + self.row_height / 2 + 4)
                .set("font-family", self.font_family.as_str())
                .set("font-size", self.font_size)
                .set("font-weight", "bold")
                .set("fill", self.text_color.as_str());
            document = document.add(label);

            for test in schedule.for_vehicle(vehicle_id) {
                let color = self.color_for(&test.test_name, &names);
                let overlapping = view.is_overlapping(vehicle_id, &test.test_name);
                document = document.add(self.render_test(test, row, color, overlapping, &span, px_per_day));
            }
        }

        if span.contains(schedule.today) {
            document = document.add(self.render_today(schedule.today, row_count, &span, px_per_day));
        }

        document = document.add(self.render_legend(&names, legend_y));

        let mut output = Vec::new();
        svg::write(&mut output, &document)
            .map_err(|e| RenderError::Format(format!("Failed to write SVG: {}", e)))?;

        String::from_utf8(output).map_err(|e| RenderError::Format(format!("Invalid UTF-8: {}", e)))
    }
}

/// Distinct test names in first-seen order
fn test_names(view: &PlanView) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for test in &view.schedule.tests {
        if !names.contains(&test.test_name.as_str()) {
            names.push(&test.test_name);
        }
    }
    names
}

fn label_interval(total_days: i64) -> u64 {
    if total_days <= 14 {
        1
    } else if total_days <= 60 {
        7
    } else if total_days <= 180 {
        14
    } else {
        30
    }
}

/// Dates from the start of `span` up to its end, `step` days apart
fn day_steps(span: &DateRange, step: u64) -> impl Iterator<Item = NaiveDate> + '_ {
    std::iter::successors(Some(span.start), move |d| d.checked_add_days(Days::new(step)))
        .take_while(move |d| *d <= span.end)
}

/// Human-readable column heading for a row field
pub(crate) fn column_label(field: &str) -> &str {
    match field {
        "vehicle" => "Vehicle",
        "test" => "Test",
        "responsible" => "Responsible",
        "start" => "Start",
        "end" => "End",
        "duration_days" => "Days",
        "week" => "Week",
        "sopm" => "SOPM",
        "lrm" => "LRM",
        "sopm_alert" => "SOPM alert",
        "lrm_alert" => "LRM alert",
        "end_alert" => "End alert",
        "test_a" => "Test A",
        "start_a" => "Start A",
        "end_a" => "End A",
        "test_b" => "Test B",
        "start_b" => "Start B",
        "end_b" => "End B",
        "shared_days" => "Shared days",
        other => other,
    }
}

/// Alert flag field that highlights a date field
pub(crate) fn alert_field_for(date_field: &str) -> Option<&'static str> {
    match date_field {
        "sopm" => Some("sopm_alert"),
        "lrm" => Some("lrm_alert"),
        "end" => Some("end_alert"),
        _ => None,
    }
}

/// Truncate a string to a maximum number of characters with ellipsis
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

//! Command handlers
//!
//! Mutating commands load the plan, apply one [`PlanEdit`], check the input
//! limits and save. Reporting commands load the plan and derive a fresh
//! [`PlanView`]; nothing derived is ever stored.

use std::path::Path;

use anyhow::{bail, Context as _, Result};
use chrono::NaiveDate;
use testplan_core::{DerivationConfig, PlanEdit, PlanView, Renderer, Test, TestPlan, Vehicle};
use testplan_render::text::render_table;
use testplan_render::{
    CsvRenderer, ExcelRenderer, HtmlReportRenderer, SvgTimelineRenderer, TextRenderer,
};
use testplan_store::{import_flat_csv, open_store, PlanStore};
use tracing::info;

use crate::config::Settings;
use crate::{ExportFormat, OutputFormat};

/// Store and derivation settings shared by all commands
pub struct Context {
    store: Box<dyn PlanStore>,
    derivation: DerivationConfig,
}

impl Context {
    pub fn open(settings: &Settings) -> Result<Self> {
        let store = open_store(settings.store, &settings.data_dir).with_context(|| {
            format!(
                "Failed to open {} store in {}",
                settings.store,
                settings.data_dir.display()
            )
        })?;
        Ok(Self {
            store,
            derivation: settings.derivation,
        })
    }

    fn load(&self, project: &str) -> Result<TestPlan> {
        Ok(self.store.load(project)?)
    }

    /// Load, edit, check and save a plan
    fn edit(&self, project: &str, edit: PlanEdit) -> Result<TestPlan> {
        self.edit_with(project, |_| Ok(edit))
    }

    /// Like [`Context::edit`], building the edit from the loaded plan
    fn edit_with(
        &self,
        project: &str,
        build: impl FnOnce(&TestPlan) -> Result<PlanEdit>,
    ) -> Result<TestPlan> {
        let mut plan = self.load(project)?;
        let edit = build(&plan)?;
        plan.apply(edit)?;
        self.derivation.limits.check(&plan)?;
        self.store.save(&plan)?;
        Ok(plan)
    }

    fn view(&self, project: &str, today: Option<NaiveDate>) -> Result<PlanView> {
        let plan = self.load(project)?;
        let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
        let view = testplan_solver::plan_view(&plan, &self.derivation, today)
            .with_context(|| format!("Cannot schedule project '{project}'"))?;
        Ok(view)
    }
}

/// A test as given on the command line
pub struct NewTest {
    pub name: String,
    pub duration: i64,
    pub responsible: String,
    pub start: Option<NaiveDate>,
}

impl NewTest {
    fn into_test(self) -> Test {
        let test = Test::new(self.name, self.duration).responsible(self.responsible);
        match self.start {
            Some(start) => test.starting(start),
            None => test,
        }
    }
}

pub fn init(ctx: &Context, project: &str) -> Result<()> {
    ctx.store.create(&TestPlan::new(project))?;
    println!("Created project '{project}'");
    Ok(())
}

pub fn list(ctx: &Context) -> Result<()> {
    let projects = ctx.store.list()?;
    if projects.is_empty() {
        println!("No projects.");
    }
    for project in projects {
        println!("{project}");
    }
    Ok(())
}

pub fn add_vehicle(
    ctx: &Context,
    project: &str,
    id: &str,
    sopm: Option<NaiveDate>,
    lrm: Option<NaiveDate>,
    vin: Option<String>,
    chassis: Option<String>,
) -> Result<()> {
    let vehicle = Vehicle {
        sopm,
        lrm,
        vin,
        chassis,
        ..Vehicle::new(id)
    };
    let plan = ctx.edit(project, PlanEdit::AddVehicle(vehicle))?;
    println!(
        "Added vehicle '{id}' to '{project}' ({} vehicles)",
        plan.vehicles.len()
    );
    Ok(())
}

pub fn remove_vehicle(ctx: &Context, project: &str, id: &str) -> Result<()> {
    ctx.edit(
        project,
        PlanEdit::RemoveVehicle {
            vehicle: id.to_string(),
        },
    )?;
    println!("Removed vehicle '{id}' from '{project}'");
    Ok(())
}

pub fn milestones(
    ctx: &Context,
    project: &str,
    id: &str,
    sopm: Option<NaiveDate>,
    lrm: Option<NaiveDate>,
    clear_lrm: bool,
) -> Result<()> {
    let plan = ctx.edit_with(project, |plan| {
        let Some(vehicle) = plan.get_vehicle(id) else {
            bail!("Unknown vehicle '{id}' in project '{project}'");
        };
        Ok(PlanEdit::SetMilestones {
            vehicle: id.to_string(),
            sopm: sopm.or(vehicle.sopm),
            lrm: if clear_lrm { None } else { lrm.or(vehicle.lrm) },
        })
    })?;

    if let Some(vehicle) = plan.get_vehicle(id) {
        println!(
            "Vehicle '{id}': SOPM {}, LRM {}",
            show_date(vehicle.sopm),
            show_date(vehicle.lrm)
        );
    }
    Ok(())
}

pub fn add_test(
    ctx: &Context,
    project: &str,
    test: NewTest,
    vehicle: Option<String>,
) -> Result<()> {
    let name = test.name.clone();
    let edit = match vehicle {
        Some(vehicle) => PlanEdit::AddTest {
            vehicle,
            test: test.into_test(),
        },
        None => PlanEdit::AddTestToAll(test.into_test()),
    };
    let all = matches!(edit, PlanEdit::AddTestToAll(_));

    let plan = ctx.edit(project, edit)?;
    if all {
        println!(
            "Added test '{name}' to {} vehicles in '{project}'",
            plan.vehicles.len()
        );
    } else {
        println!("Added test '{name}' to '{project}'");
    }
    Ok(())
}

pub fn remove_test(ctx: &Context, project: &str, vehicle: &str, name: &str) -> Result<()> {
    ctx.edit(
        project,
        PlanEdit::RemoveTest {
            vehicle: vehicle.to_string(),
            test: name.to_string(),
        },
    )?;
    println!("Removed test '{name}' from vehicle '{vehicle}'");
    Ok(())
}

pub fn set_duration(
    ctx: &Context,
    project: &str,
    vehicle: &str,
    name: &str,
    days: i64,
) -> Result<()> {
    ctx.edit(
        project,
        PlanEdit::SetDuration {
            vehicle: vehicle.to_string(),
            test: name.to_string(),
            days,
        },
    )?;
    println!("Test '{name}' on vehicle '{vehicle}' now lasts {days} days");
    Ok(())
}

pub fn set_start(
    ctx: &Context,
    project: &str,
    vehicle: &str,
    name: &str,
    start: Option<NaiveDate>,
) -> Result<()> {
    ctx.edit(
        project,
        PlanEdit::SetStart {
            vehicle: vehicle.to_string(),
            test: name.to_string(),
            start,
        },
    )?;
    match start {
        Some(date) => println!("Test '{name}' on vehicle '{vehicle}' starts {date}"),
        None => println!("Cleared start date of test '{name}' on vehicle '{vehicle}'"),
    }
    Ok(())
}

pub fn move_test(
    ctx: &Context,
    project: &str,
    vehicle: &str,
    name: &str,
    position: usize,
) -> Result<()> {
    let Some(index) = position.checked_sub(1) else {
        bail!("Positions start at 1");
    };
    ctx.edit(
        project,
        PlanEdit::MoveTest {
            vehicle: vehicle.to_string(),
            test: name.to_string(),
            position: index,
        },
    )?;
    println!("Moved test '{name}' to position {position} on vehicle '{vehicle}'");
    Ok(())
}

pub fn schedule(
    ctx: &Context,
    project: &str,
    format: OutputFormat,
    today: Option<NaiveDate>,
) -> Result<()> {
    let view = ctx.view(project, today)?;
    match format {
        OutputFormat::Table => print!("{}", TextRenderer::new().schedule_only().render(&view)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view.schedule_rows())?),
    }
    Ok(())
}

pub fn overlaps(
    ctx: &Context,
    project: &str,
    format: OutputFormat,
    today: Option<NaiveDate>,
) -> Result<()> {
    let view = ctx.view(project, today)?;
    match format {
        OutputFormat::Table if view.overlaps.is_empty() => println!("No overlaps."),
        OutputFormat::Table => {
            println!("Overlaps ({}):", view.overlaps.len());
            print!("{}", render_table(&view.overlap_rows()));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view.overlap_rows())?),
    }
    Ok(())
}

pub fn export(
    ctx: &Context,
    project: &str,
    format: ExportFormat,
    output: &Path,
    today: Option<NaiveDate>,
) -> Result<()> {
    let view = ctx.view(project, today)?;

    let bytes = match format {
        ExportFormat::Xlsx => ExcelRenderer::new().render(&view)?,
        ExportFormat::Csv => CsvRenderer::new().render(&view)?.into_bytes(),
        ExportFormat::Svg => SvgTimelineRenderer::new().render(&view)?.into_bytes(),
        ExportFormat::Html => HtmlReportRenderer::new().render(&view)?.into_bytes(),
    };
    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        project,
        format = ?format,
        bytes = bytes.len(),
        path = %output.display(),
        "exported planning"
    );
    println!(
        "Exported {} tests to {}",
        view.schedule.tests.len(),
        output.display()
    );
    Ok(())
}

pub fn import(ctx: &Context, file: &Path, project: &str) -> Result<()> {
    let plan = import_flat_csv(file, project)
        .with_context(|| format!("Failed to import {}", file.display()))?;
    ctx.derivation.limits.check(&plan)?;
    ctx.store.create(&plan)?;
    println!(
        "Imported {} vehicles and {} tests into '{project}'",
        plan.vehicles.len(),
        plan.test_count()
    );
    Ok(())
}

fn show_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

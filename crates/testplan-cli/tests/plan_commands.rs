//! Tests for the plan editing commands

mod common;

use common::{stderr, stdout, Workspace};
use pretty_assertions::assert_eq;

fn stored_plan(ws: &Workspace, project: &str) -> serde_json::Value {
    let text = std::fs::read_to_string(ws.data_dir().join(format!("{project}.json")))
        .expect("plan file should exist");
    serde_json::from_str(&text).expect("plan file should be JSON")
}

fn test_names(plan: &serde_json::Value, vehicle: usize) -> Vec<String> {
    plan["vehicles"][vehicle]["tests"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// init / list
// ============================================================================

#[test]
fn init_creates_plan_file() {
    let ws = Workspace::new();
    let out = ws.ok(&["init", "fleet"]);
    assert!(out.contains("Created project 'fleet'"));
    assert!(ws.data_dir().join("fleet.json").exists());

    let plan = stored_plan(&ws, "fleet");
    assert_eq!(plan["name"], "fleet");
    assert_eq!(plan["vehicles"].as_array().unwrap().len(), 0);
}

#[test]
fn init_refuses_to_overwrite() {
    let ws = Workspace::new();
    ws.sequential_project("fleet");

    let err = ws.fails(&["init", "fleet"]);
    assert!(err.contains("already exists"), "stderr: {err}");
    // Existing content is untouched
    assert_eq!(test_names(&stored_plan(&ws, "fleet"), 0), vec!["A", "B"]);
}

#[test]
fn init_rejects_unsafe_names() {
    let ws = Workspace::new();
    let err = ws.fails(&["init", "../escape"]);
    assert!(err.contains("Invalid project name"), "stderr: {err}");
}

#[test]
fn list_shows_projects_sorted() {
    let ws = Workspace::new();
    assert!(ws.ok(&["list"]).contains("No projects."));

    ws.ok(&["init", "zeta"]);
    ws.ok(&["init", "alpha"]);
    assert_eq!(ws.ok(&["list"]), "alpha\nzeta\n");
}

#[test]
fn no_subcommand_prints_banner() {
    let ws = Workspace::new();
    let output = ws.command().output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("Vehicle Test Plan Scheduler"));
}

// ============================================================================
// Vehicles
// ============================================================================

#[test]
fn add_vehicle_with_attributes() {
    let ws = Workspace::new();
    ws.ok(&["init", "fleet"]);
    ws.ok(&[
        "add-vehicle", "fleet", "V001", "--sopm", "2025-01-06", "--vin", "VF1AB000123", "--chassis", "CH-7",
    ]);

    let plan = stored_plan(&ws, "fleet");
    let vehicle = &plan["vehicles"][0];
    assert_eq!(vehicle["id"], "V001");
    assert_eq!(vehicle["sopm"], "2025-01-06");
    assert_eq!(vehicle["lrm"], serde_json::Value::Null);
    assert_eq!(vehicle["vin"], "VF1AB000123");
    assert_eq!(vehicle["chassis"], "CH-7");
}

#[test]
fn duplicate_vehicle_is_rejected() {
    let ws = Workspace::new();
    ws.ok(&["init", "fleet"]);
    ws.ok(&["add-vehicle", "fleet", "V001"]);
    let err = ws.fails(&["add-vehicle", "fleet", "V001"]);
    assert!(err.contains("Duplicate vehicle id: V001"), "stderr: {err}");
}

#[test]
fn vehicle_limit_applies() {
    let ws = Workspace::new();
    let config = ws.path().join("testplan.toml");
    std::fs::write(&config, "[limits]\nmax_vehicles = 1\n").unwrap();
    let config = config.to_str().unwrap();

    ws.ok(&["--config", config, "init", "fleet"]);
    ws.ok(&["--config", config, "add-vehicle", "fleet", "V001"]);
    let err = ws.fails(&["--config", config, "add-vehicle", "fleet", "V002"]);
    assert!(err.contains("Limit exceeded"), "stderr: {err}");
    assert_eq!(stored_plan(&ws, "fleet")["vehicles"].as_array().unwrap().len(), 1);
}

#[test]
fn milestones_keep_dates_not_given() {
    let ws = Workspace::new();
    ws.sequential_project("fleet");

    let out = ws.ok(&["milestones", "fleet", "V001", "--sopm", "2025-02-03"]);
    assert!(out.contains("SOPM 2025-02-03, LRM 2025-03-01"), "stdout: {out}");

    let plan = stored_plan(&ws, "fleet");
    assert_eq!(plan["vehicles"][0]["sopm"], "2025-02-03");
    assert_eq!(plan["vehicles"][0]["lrm"], "2025-03-01");
}

#[test]
fn milestones_can_clear_the_lrm() {
    let ws = Workspace::new();
    ws.sequential_project("fleet");

    let out = ws.ok(&["milestones", "fleet", "V001", "--clear-lrm"]);
    assert!(out.contains("SOPM 2025-01-01, LRM -"), "stdout: {out}");

    let plan = stored_plan(&ws, "fleet");
    assert_eq!(plan["vehicles"][0]["sopm"], "2025-01-01");
    assert_eq!(plan["vehicles"][0]["lrm"], serde_json::Value::Null);

    let output = ws.run(&["milestones", "fleet", "V001", "--clear-lrm", "--lrm", "2025-04-01"]);
    assert!(!output.status.success());
}

#[test]
fn milestones_of_unknown_vehicle() {
    let ws = Workspace::new();
    ws.ok(&["init", "fleet"]);
    let err = ws.fails(&["milestones", "fleet", "V404", "--sopm", "2025-01-01"]);
    assert!(err.contains("Unknown vehicle 'V404'"), "stderr: {err}");
}

#[test]
fn remove_vehicle_drops_its_tests() {
    let ws = Workspace::new();
    ws.sequential_project("fleet");
    ws.ok(&["add-vehicle", "fleet", "V002", "--sopm", "2025-01-01"]);

    ws.ok(&["remove-vehicle", "fleet", "V001"]);
    let plan = stored_plan(&ws, "fleet");
    assert_eq!(plan["vehicles"].as_array().unwrap().len(), 1);
    assert_eq!(plan["vehicles"][0]["id"], "V002");

    let err = ws.fails(&["remove-vehicle", "fleet", "V001"]);
    assert!(err.contains("Vehicle not found: V001"), "stderr: {err}");
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn add_test_to_all_vehicles() {
    let ws = Workspace::new();
    ws.ok(&["init", "fleet"]);
    ws.ok(&["add-vehicle", "fleet", "V001"]);
    ws.ok(&["add-vehicle", "fleet", "V002"]);

    let out = ws.ok(&["add-test", "fleet", "Noise", "-d", "2", "--all", "-r", "Acoustics"]);
    assert!(out.contains("to 2 vehicles"), "stdout: {out}");

    let plan = stored_plan(&ws, "fleet");
    for idx in 0..2 {
        assert_eq!(test_names(&plan, idx), vec!["Noise"]);
        assert_eq!(plan["vehicles"][idx]["tests"][0]["responsible"], "Acoustics");
        assert_eq!(plan["vehicles"][idx]["tests"][0]["duration_days"], 2);
    }
}

#[test]
fn add_test_rejects_bad_durations() {
    let ws = Workspace::new();
    ws.ok(&["init", "fleet"]);
    ws.ok(&["add-vehicle", "fleet", "V001"]);

    let err = ws.fails(&["add-test", "fleet", "A", "-d", "0", "--vehicle", "V001"]);
    assert!(err.contains("invalid duration 0"), "stderr: {err}");

    let err = ws.fails(&["add-test", "fleet", "A", "-d", "31", "--vehicle", "V001"]);
    assert!(err.contains("Limit exceeded"), "stderr: {err}");

    let plan = stored_plan(&ws, "fleet");
    assert!(test_names(&plan, 0).is_empty());
}

#[test]
fn add_test_rejects_duplicate_names() {
    let ws = Workspace::new();
    ws.sequential_project("fleet");
    let err = ws.fails(&["add-test", "fleet", "A", "-d", "1", "--vehicle", "V001"]);
    assert!(err.contains("Duplicate test 'A'"), "stderr: {err}");
}

#[test]
fn add_test_to_unknown_vehicle() {
    let ws = Workspace::new();
    ws.ok(&["init", "fleet"]);
    let err = ws.fails(&["add-test", "fleet", "A", "-d", "1", "--vehicle", "V404"]);
    assert!(err.contains("Vehicle not found: V404"), "stderr: {err}");
}

#[test]
fn set_duration_and_remove_test() {
    let ws = Workspace::new();
    ws.sequential_project("fleet");

    ws.ok(&["set-duration", "fleet", "V001", "B", "5"]);
    assert_eq!(stored_plan(&ws, "fleet")["vehicles"][0]["tests"][1]["duration_days"], 5);

    let err = ws.fails(&["set-duration", "fleet", "V001", "B", "-1"]);
    assert!(err.contains("invalid duration -1"), "stderr: {err}");

    ws.ok(&["remove-test", "fleet", "V001", "A"]);
    assert_eq!(test_names(&stored_plan(&ws, "fleet"), 0), vec!["B"]);

    let err = ws.fails(&["remove-test", "fleet", "V001", "A"]);
    assert!(err.contains("Test 'A' not found on vehicle 'V001'"), "stderr: {err}");
}

#[test]
fn set_start_and_clear_it() {
    let ws = Workspace::new();
    ws.sequential_project("fleet");

    let out = ws.ok(&["set-start", "fleet", "V001", "A", "2025-01-10"]);
    assert!(out.contains("starts 2025-01-10"), "stdout: {out}");
    assert_eq!(stored_plan(&ws, "fleet")["vehicles"][0]["tests"][0]["start"], "2025-01-10");

    let out = ws.ok(&["set-start", "fleet", "V001", "A"]);
    assert!(out.contains("Cleared start date"), "stdout: {out}");
    assert_eq!(
        stored_plan(&ws, "fleet")["vehicles"][0]["tests"][0]["start"],
        serde_json::Value::Null
    );
}

#[test]
fn move_test_uses_one_based_positions() {
    let ws = Workspace::new();
    ws.sequential_project("fleet");
    ws.ok(&["add-test", "fleet", "C", "-d", "1", "--vehicle", "V001"]);

    ws.ok(&["move-test", "fleet", "V001", "C", "1"]);
    assert_eq!(test_names(&stored_plan(&ws, "fleet"), 0), vec!["C", "A", "B"]);

    let err = ws.fails(&["move-test", "fleet", "V001", "C", "0"]);
    assert!(err.contains("Positions start at 1"), "stderr: {err}");

    let err = ws.fails(&["move-test", "fleet", "V001", "C", "4"]);
    assert!(err.contains("out of range"), "stderr: {err}");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn unknown_project_fails() {
    let ws = Workspace::new();
    let output = ws.run(&["add-vehicle", "ghost", "V001"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Project not found: ghost"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn usage_errors_are_not_success() {
    let ws = Workspace::new();
    let output = ws.run(&["add-test", "fleet", "A"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--duration"));
}

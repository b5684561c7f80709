//! Tests for schedule, overlaps, export and import

mod common;

use common::{stderr, stdout, Workspace};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const TODAY: &str = "2024-12-30";

fn json_output(text: &str) -> Value {
    serde_json::from_str(text).expect("stdout should be JSON")
}

// ============================================================================
// schedule
// ============================================================================

#[test]
fn schedule_table_for_sequential_vehicle() {
    let ws = Workspace::new();
    ws.sequential_project("fleet");

    let out = ws.ok(&["schedule", "fleet", "--today", TODAY]);
    assert!(out.starts_with("Project: fleet (reference date 2024-12-30)"), "stdout: {out}");
    assert!(out.contains("| Vehicle"));
    assert!(out.contains("2025-01-03"));
    assert!(out.contains("2025-01-05"));
    assert!(out.contains("2 tests on 1 vehicles, 2 alerts"));
    // schedule leaves overlaps to the overlaps command
    assert!(!out.contains("overlaps"));
}

#[test]
fn schedule_json_rows() {
    let ws = Workspace::new();
    ws.sequential_project("fleet");

    let rows = json_output(&ws.ok(&["schedule", "fleet", "--format", "json", "--today", TODAY]));
    assert_eq!(
        rows,
        json!([
            {
                "vehicle": "V001", "test": "A", "responsible": "Lab A",
                "start": "2025-01-01", "end": "2025-01-03", "duration_days": 3, "week": 1,
                "sopm": "2025-01-01", "lrm": "2025-03-01",
                "sopm_alert": true, "lrm_alert": false, "end_alert": false
            },
            {
                "vehicle": "V001", "test": "B", "responsible": "Lab B",
                "start": "2025-01-04", "end": "2025-01-05", "duration_days": 2, "week": 1,
                "sopm": "2025-01-01", "lrm": "2025-03-01",
                "sopm_alert": true, "lrm_alert": false, "end_alert": false
            }
        ])
    );
}

#[test]
fn milestone_view_flags_ends_a_week_ahead() {
    let ws = Workspace::new();
    ws.sequential_project("fleet");

    let rows = json_output(&ws.ok(&[
        "schedule", "fleet", "--format", "json", "--milestone-view", "--today", TODAY,
    ]));
    assert_eq!(rows[0]["end_alert"], true);
    assert_eq!(rows[1]["end_alert"], true);
}

#[test]
fn alert_windows_come_from_config() {
    let ws = Workspace::new();
    ws.sequential_project("fleet");
    let config = ws.path().join("testplan.toml");
    std::fs::write(&config, "[alerts]\nsopm_days = 1\ntest_end_days = 4\n").unwrap();

    let rows = json_output(&ws.ok(&[
        "--config", config.to_str().unwrap(), "schedule", "fleet", "-f", "json", "--today", TODAY,
    ]));
    assert_eq!(rows[0]["sopm_alert"], false);
    assert_eq!(rows[0]["end_alert"], true);
    assert_eq!(rows[1]["end_alert"], false);
}

#[test]
fn schedule_reports_missing_sopm() {
    let ws = Workspace::new();
    ws.ok(&["init", "fleet"]);
    ws.ok(&["add-vehicle", "fleet", "V001"]);
    ws.ok(&["add-test", "fleet", "A", "-d", "3", "--vehicle", "V001"]);

    let err = ws.fails(&["schedule", "fleet", "--today", TODAY]);
    assert!(err.contains("Cannot schedule project 'fleet'"), "stderr: {err}");
    assert!(err.contains("no SOPM date"), "stderr: {err}");
}

#[test]
fn schedule_rejects_mixed_modes() {
    let ws = Workspace::new();
    ws.sequential_project("fleet");
    ws.ok(&["set-start", "fleet", "V001", "B", "2025-01-02"]);

    let err = ws.fails(&["schedule", "fleet", "--today", TODAY]);
    assert!(err.contains("mixes explicit and sequential"), "stderr: {err}");

    // Forcing sequential ignores the explicit date
    let rows = json_output(&ws.ok(&[
        "--mode", "sequential", "schedule", "fleet", "-f", "json", "--today", TODAY,
    ]));
    assert_eq!(rows[1]["start"], "2025-01-04");
}

#[test]
fn forced_sequential_warns_once_per_vehicle() {
    let ws = Workspace::new();
    ws.explicit_project("fleet");
    ws.ok(&["milestones", "fleet", "V001", "--sopm", "2025-01-01"]);

    let output = ws.run(&["--mode", "sequential", "schedule", "fleet", "--today", TODAY]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stderr(&output)
            .matches("ignoring explicit start dates in sequential mode")
            .count(),
        1
    );
}

#[test]
fn empty_plan_schedules_nothing() {
    let ws = Workspace::new();
    ws.ok(&["init", "fleet"]);
    let out = ws.ok(&["schedule", "fleet", "--today", TODAY]);
    assert!(out.contains("No tests scheduled."));
}

// ============================================================================
// overlaps
// ============================================================================

#[test]
fn overlaps_table_and_json() {
    let ws = Workspace::new();
    ws.explicit_project("fleet");

    let out = ws.ok(&["overlaps", "fleet", "--today", TODAY]);
    assert!(out.contains("Overlaps (1):"), "stdout: {out}");
    assert!(out.contains("Shared"), "stdout: {out}");

    let rows = json_output(&ws.ok(&["overlaps", "fleet", "-f", "json", "--today", TODAY]));
    assert_eq!(
        rows,
        json!([{
            "vehicle": "V001",
            "test_a": "A", "start_a": "2025-01-01", "end_a": "2025-01-03",
            "test_b": "B", "start_b": "2025-01-02", "end_b": "2025-01-03",
            "shared_days": 2
        }])
    );
}

#[test]
fn sequential_plan_has_no_overlaps() {
    let ws = Workspace::new();
    ws.sequential_project("fleet");
    assert_eq!(ws.ok(&["overlaps", "fleet", "--today", TODAY]), "No overlaps.\n");
    assert_eq!(
        json_output(&ws.ok(&["overlaps", "fleet", "-f", "json", "--today", TODAY])),
        json!([])
    );
}

#[test]
fn explicit_tests_touching_on_one_day_overlap() {
    let ws = Workspace::new();
    ws.ok(&["init", "fleet"]);
    ws.ok(&["add-vehicle", "fleet", "V001"]);
    ws.ok(&["add-test", "fleet", "A", "-d", "3", "--vehicle", "V001", "--start", "2025-01-01"]);
    ws.ok(&["add-test", "fleet", "B", "-d", "1", "--vehicle", "V001", "--start", "2025-01-03"]);

    let rows = json_output(&ws.ok(&["overlaps", "fleet", "-f", "json", "--today", TODAY]));
    assert_eq!(rows[0]["shared_days"], 1);

    ws.ok(&["set-start", "fleet", "V001", "B", "2025-01-04"]);
    let rows = json_output(&ws.ok(&["overlaps", "fleet", "-f", "json", "--today", TODAY]));
    assert_eq!(rows, json!([]));
}

// ============================================================================
// export
// ============================================================================

#[test]
fn export_csv_contains_derived_rows() {
    let ws = Workspace::new();
    ws.sequential_project("fleet");
    let path = ws.path().join("planning.csv");

    let out = ws.ok(&[
        "export", "fleet", "--format", "csv", "-o", path.to_str().unwrap(), "--today", TODAY,
    ]);
    assert!(out.contains("Exported 2 tests"), "stdout: {out}");

    let csv = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "vehicle,test,responsible,start,end,duration_days,week,sopm,lrm,sopm_alert,lrm_alert,end_alert",
            "V001,A,Lab A,2025-01-01,2025-01-03,3,1,2025-01-01,2025-03-01,yes,,",
            "V001,B,Lab B,2025-01-04,2025-01-05,2,1,2025-01-01,2025-03-01,yes,,",
        ]
    );
}

#[test]
fn export_binary_and_markup_formats() {
    let ws = Workspace::new();
    ws.explicit_project("fleet");

    let xlsx = ws.path().join("planning.xlsx");
    ws.ok(&["export", "fleet", "-f", "xlsx", "-o", xlsx.to_str().unwrap(), "--today", TODAY]);
    let bytes = std::fs::read(&xlsx).unwrap();
    assert_eq!(&bytes[..2], b"PK");

    let svg = ws.path().join("timeline.svg");
    ws.ok(&["export", "fleet", "-f", "svg", "-o", svg.to_str().unwrap(), "--today", TODAY]);
    let svg = std::fs::read_to_string(&svg).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("overlap"));

    let html = ws.path().join("report.html");
    ws.ok(&["export", "fleet", "-f", "html", "-o", html.to_str().unwrap(), "--today", TODAY]);
    let html = std::fs::read_to_string(&html).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<h1>fleet</h1>"));
}

#[test]
fn export_of_empty_plan_fails() {
    let ws = Workspace::new();
    ws.ok(&["init", "fleet"]);
    let path = ws.path().join("empty.xlsx");

    let err = ws.fails(&["export", "fleet", "-f", "xlsx", "-o", path.to_str().unwrap()]);
    assert!(err.contains("No tests to render"), "stderr: {err}");
    assert!(!path.exists());
}

#[test]
fn verbose_logs_go_to_stderr() {
    let ws = Workspace::new();
    ws.sequential_project("fleet");
    let path = ws.path().join("planning.csv");

    let output = ws.run(&[
        "-v", "export", "fleet", "-f", "csv", "-o", path.to_str().unwrap(), "--today", TODAY,
    ]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("exported planning"));
    assert!(!stdout(&output).contains("exported planning"));
}

// ============================================================================
// import
// ============================================================================

const FLAT_CSV: &str = "\
vehicle_id,sopm,lrm,vin,chassis,test,responsible,duration_days,start
V001,2025-01-01,2025-06-01,VF1X,CH-1,Brakes,Lab A,3,
V001,,,,,Noise,Lab B,2,
V002,2025-02-01,,,,,,,
";

#[test]
fn import_creates_project() {
    let ws = Workspace::new();
    let csv = ws.path().join("legacy.csv");
    std::fs::write(&csv, FLAT_CSV).unwrap();

    let out = ws.ok(&["import", csv.to_str().unwrap(), "--project", "legacy"]);
    assert!(out.contains("Imported 2 vehicles and 2 tests into 'legacy'"), "stdout: {out}");

    let rows = json_output(&ws.ok(&["schedule", "legacy", "-f", "json", "--today", TODAY]));
    assert_eq!(rows[0]["test"], "Brakes");
    assert_eq!(rows[1]["test"], "Noise");
    assert_eq!(rows[1]["start"], "2025-01-04");

    let err = ws.fails(&["import", csv.to_str().unwrap(), "--project", "legacy"]);
    assert!(err.contains("already exists"), "stderr: {err}");
}

#[test]
fn import_of_missing_file_fails() {
    let ws = Workspace::new();
    let err = ws.fails(&["import", "nope.csv", "--project", "legacy"]);
    assert!(err.contains("Failed to import nope.csv"), "stderr: {err}");
}

// ============================================================================
// Stores and settings
// ============================================================================

#[test]
fn sqlite_store_round_trip() {
    let ws = Workspace::new();
    ws.ok(&["--store", "sqlite", "init", "fleet"]);
    ws.ok(&["--store", "sqlite", "add-vehicle", "fleet", "V001", "--sopm", "2025-01-01"]);
    ws.ok(&["--store", "sqlite", "add-test", "fleet", "A", "-d", "3", "--vehicle", "V001"]);

    assert!(ws.data_dir().join("testplan.db").exists());
    assert!(!ws.data_dir().join("fleet.json").exists());
    assert_eq!(ws.ok(&["--store", "sqlite", "list"]), "fleet\n");

    let rows = json_output(&ws.ok(&[
        "--store", "sqlite", "schedule", "fleet", "-f", "json", "--today", TODAY,
    ]));
    assert_eq!(rows[0]["end"], "2025-01-03");
}

#[test]
fn store_and_data_dir_from_config_file() {
    let ws = Workspace::new();
    let config = ws.path().join("testplan.toml");
    std::fs::write(&config, "store = \"sqlite\"\ndata_dir = \"shared\"\n").unwrap();

    let output = ws
        .command()
        .env("TESTPLAN_CONFIG", &config)
        .args(["init", "fleet"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(ws.path().join("shared").join("testplan.db").exists());
}

#[test]
fn data_dir_from_environment() {
    let ws = Workspace::new();
    let dir = ws.path().join("from-env");

    let output = ws
        .command()
        .env("TESTPLAN_DATA_DIR", &dir)
        .args(["init", "fleet"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.join("fleet.json").exists());
}

#[test]
fn invalid_config_file_fails() {
    let ws = Workspace::new();
    let config = ws.path().join("testplan.toml");
    std::fs::write(&config, "mode = \"whenever\"\n").unwrap();

    let err = ws.fails(&["--config", config.to_str().unwrap(), "list"]);
    assert!(err.contains("Invalid config file"), "stderr: {err}");
}

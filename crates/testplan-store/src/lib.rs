//! # testplan-store
//!
//! Persistence for test plans.
//!
//! This crate provides:
//! - One JSON document per project in a data directory (`JsonFileStore`)
//! - A relational SQLite database holding every project (`SqliteStore`)
//! - Migration from the legacy flat CSV layout (`import_flat_csv`)
//!
//! Only the plan is stored. Schedules and overlaps are derived again after
//! every load.
//!
//! ## Example
//!
//! ```rust
//! use testplan_core::{TestPlan, Vehicle};
//! use testplan_store::{JsonFileStore, PlanStore};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = JsonFileStore::new(dir.path()).unwrap();
//!
//! let plan = TestPlan::new("fleet").vehicle(Vehicle::new("V001"));
//! store.save(&plan).unwrap();
//!
//! assert_eq!(store.load("fleet").unwrap(), plan);
//! assert_eq!(store.list().unwrap(), vec!["fleet".to_string()]);
//! ```

pub mod import;
pub mod json;
pub mod sqlite;

pub use import::{import_flat_csv, read_flat_csv};
pub use json::JsonFileStore;
pub use sqlite::SqliteStore;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use testplan_core::{PlanError, TestPlan};
use thiserror::Error;

/// Longest accepted project name
pub const MAX_PROJECT_NAME_LEN: usize = 64;

/// File name of the SQLite database inside a data directory
pub const SQLITE_FILE_NAME: &str = "testplan.db";

/// Storage error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Project not found: {0}")]
    NotFound(String),

    #[error("Project already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid project name '{0}' (use letters, digits, '-', '_' or '.')")]
    InvalidProjectName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid plan: {0}")]
    Plan(#[from] PlanError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Load and save test plans by project name
pub trait PlanStore {
    /// Load a stored plan
    fn load(&self, project: &str) -> StoreResult<TestPlan>;

    /// Store a plan under its own name, replacing any previous version
    fn save(&self, plan: &TestPlan) -> StoreResult<()>;

    /// Names of all stored projects, sorted
    fn list(&self) -> StoreResult<Vec<String>>;

    /// Whether a project is stored
    fn exists(&self, project: &str) -> StoreResult<bool>;

    /// Store a new plan, refusing to replace an existing one
    fn create(&self, plan: &TestPlan) -> StoreResult<()> {
        if self.exists(&plan.name)? {
            return Err(StoreError::AlreadyExists(plan.name.clone()));
        }
        self.save(plan)
    }
}

/// Available storage backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Json,
    Sqlite,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Json => write!(f, "json"),
            StoreKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(StoreKind::Json),
            "sqlite" | "db" => Ok(StoreKind::Sqlite),
            other => Err(format!("unknown store '{other}' (expected json or sqlite)")),
        }
    }
}

/// Open a store of the given kind rooted at `data_dir`
pub fn open_store(kind: StoreKind, data_dir: &Path) -> StoreResult<Box<dyn PlanStore>> {
    match kind {
        StoreKind::Json => Ok(Box::new(JsonFileStore::new(data_dir)?)),
        StoreKind::Sqlite => {
            std::fs::create_dir_all(data_dir)?;
            Ok(Box::new(SqliteStore::open(data_dir.join(SQLITE_FILE_NAME))?))
        }
    }
}

/// Check that a project name is usable as a file name and database key
pub fn validate_project_name(name: &str) -> StoreResult<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_PROJECT_NAME_LEN
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidProjectName(name.to_string()))
    }
}

/// Checks run on every plan crossing the storage boundary
pub(crate) fn check_plan(plan: &TestPlan) -> StoreResult<()> {
    validate_project_name(&plan.name)?;
    plan.check_structure()?;
    Ok(())
}

pub(crate) fn format_date(date: Option<chrono::NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

pub(crate) fn parse_date(input: &str) -> StoreResult<Option<chrono::NaiveDate>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    chrono::NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| StoreError::InvalidData(format!("invalid date '{input}': {e}")))
}

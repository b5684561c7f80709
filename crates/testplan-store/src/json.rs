//! JSON document store
//!
//! Each project is a pretty-printed `<project>.json` file in the data
//! directory. Saves write a sibling temporary file first and rename it over
//! the target, so an interrupted save never leaves a truncated document.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use testplan_core::TestPlan;
use tracing::{debug, info};

use crate::{check_plan, validate_project_name, PlanStore, StoreError, StoreResult};

const EXTENSION: &str = "json";

/// Plans stored as JSON files in one directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Use `dir` as the data directory, creating it if needed
    pub fn new(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a project's document
    pub fn path_for(&self, project: &str) -> StoreResult<PathBuf> {
        validate_project_name(project)?;
        Ok(self.dir.join(format!("{project}.{EXTENSION}")))
    }
}

impl PlanStore for JsonFileStore {
    fn load(&self, project: &str) -> StoreResult<TestPlan> {
        let path = self.path_for(project)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(project.to_string()));
        }
        let reader = BufReader::new(File::open(&path)?);
        let plan: TestPlan = serde_json::from_reader(reader)?;
        if plan.name != project {
            return Err(StoreError::InvalidData(format!(
                "{} holds project '{}'",
                path.display(),
                plan.name
            )));
        }
        check_plan(&plan)?;
        debug!(project, vehicles = plan.vehicles.len(), "loaded plan");
        Ok(plan)
    }

    fn save(&self, plan: &TestPlan) -> StoreResult<()> {
        check_plan(plan)?;
        let path = self.path_for(&plan.name)?;
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));

        let written = (|| -> StoreResult<()> {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, plan)?;
            writer.write_all(b"\n")?;
            writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
            Ok(())
        })();
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }

        fs::rename(&tmp, &path)?;
        info!(project = %plan.name, path = %path.display(), "saved plan");
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_project_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn exists(&self, project: &str) -> StoreResult<bool> {
        Ok(self.path_for(project)?.is_file())
    }
}

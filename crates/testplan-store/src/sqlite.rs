//! SQLite store
//!
//! All projects live in one database. Vehicles and tests keep their plan
//! order through an explicit `position` column.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use testplan_core::{Test, TestPlan, Vehicle};
use tracing::{debug, info};

use crate::{
    check_plan, format_date, parse_date, validate_project_name, PlanStore, StoreError, StoreResult,
};

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;
    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );
    CREATE TABLE IF NOT EXISTS vehicles (
        id INTEGER PRIMARY KEY,
        project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        vehicle_id TEXT NOT NULL,
        sopm TEXT,
        lrm TEXT,
        vin TEXT,
        chassis TEXT,
        UNIQUE (project_id, vehicle_id)
    );
    CREATE TABLE IF NOT EXISTS tests (
        id INTEGER PRIMARY KEY,
        vehicle_row INTEGER NOT NULL REFERENCES vehicles(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        name TEXT NOT NULL,
        responsible TEXT NOT NULL DEFAULT '',
        duration_days INTEGER NOT NULL,
        start TEXT,
        UNIQUE (vehicle_row, name)
    );
"#;

/// Plans stored in a SQLite database
pub struct SqliteStore {
    connection: Connection,
}

impl SqliteStore {
    /// Open or create a database file
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    /// Database held in memory, discarded on drop
    pub fn in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> StoreResult<Self> {
        connection.execute_batch(SCHEMA)?;
        Ok(Self { connection })
    }

    fn project_id(&self, project: &str) -> StoreResult<Option<i64>> {
        let id = self
            .connection
            .query_row(
                "SELECT id FROM projects WHERE name = ?1",
                params![project],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn load_vehicles(&self, project_id: i64) -> StoreResult<Vec<Vehicle>> {
        let mut stmt = self.connection.prepare(
            "SELECT id, vehicle_id, sopm, lrm, vin, chassis FROM vehicles
             WHERE project_id = ?1 ORDER BY position ASC",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut vehicles = Vec::new();
        for row in rows {
            let (row_id, id, sopm, lrm, vin, chassis) = row?;
            let mut vehicle = Vehicle::new(id);
            vehicle.sopm = parse_date(sopm.as_deref().unwrap_or_default())?;
            vehicle.lrm = parse_date(lrm.as_deref().unwrap_or_default())?;
            vehicle.vin = vin;
            vehicle.chassis = chassis;
            vehicle.tests = self.load_tests(row_id)?;
            vehicles.push(vehicle);
        }
        Ok(vehicles)
    }

    fn load_tests(&self, vehicle_row: i64) -> StoreResult<Vec<Test>> {
        let mut stmt = self.connection.prepare(
            "SELECT name, responsible, duration_days, start FROM tests
             WHERE vehicle_row = ?1 ORDER BY position ASC",
        )?;
        let rows = stmt.query_map(params![vehicle_row], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut tests = Vec::new();
        for row in rows {
            let (name, responsible, duration_days, start) = row?;
            let mut test = Test::new(name, duration_days).responsible(responsible);
            test.start = parse_date(start.as_deref().unwrap_or_default())?;
            tests.push(test);
        }
        Ok(tests)
    }

    fn save_vehicles(tx: &Transaction, project_id: i64, plan: &TestPlan) -> StoreResult<()> {
        let mut vehicle_stmt = tx.prepare(
            "INSERT INTO vehicles (project_id, position, vehicle_id, sopm, lrm, vin, chassis)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        let mut test_stmt = tx.prepare(
            "INSERT INTO tests (vehicle_row, position, name, responsible, duration_days, start)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;

        for (position, vehicle) in plan.vehicles.iter().enumerate() {
            let vehicle_row = vehicle_stmt.insert(params![
                project_id,
                position as i64,
                vehicle.id,
                format_date(vehicle.sopm),
                format_date(vehicle.lrm),
                vehicle.vin,
                vehicle.chassis,
            ])?;
            for (position, test) in vehicle.tests.iter().enumerate() {
                test_stmt.execute(params![
                    vehicle_row,
                    position as i64,
                    test.name,
                    test.responsible,
                    test.duration_days,
                    format_date(test.start),
                ])?;
            }
        }
        Ok(())
    }
}

impl PlanStore for SqliteStore {
    fn load(&self, project: &str) -> StoreResult<TestPlan> {
        validate_project_name(project)?;
        let Some(project_id) = self.project_id(project)? else {
            return Err(StoreError::NotFound(project.to_string()));
        };

        let mut plan = TestPlan::new(project);
        plan.vehicles = self.load_vehicles(project_id)?;
        check_plan(&plan)?;
        debug!(project, vehicles = plan.vehicles.len(), "loaded plan");
        Ok(plan)
    }

    fn save(&self, plan: &TestPlan) -> StoreResult<()> {
        check_plan(plan)?;
        // Rolled back on drop unless committed
        let tx = self.connection.unchecked_transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO projects (name) VALUES (?1)",
            params![plan.name],
        )?;
        let project_id: i64 = tx.query_row(
            "SELECT id FROM projects WHERE name = ?1",
            params![plan.name],
            |row| row.get(0),
        )?;
        tx.execute(
            "DELETE FROM tests WHERE vehicle_row IN (SELECT id FROM vehicles WHERE project_id = ?1)",
            params![project_id],
        )?;
        tx.execute("DELETE FROM vehicles WHERE project_id = ?1", params![project_id])?;
        Self::save_vehicles(&tx, project_id, plan)?;
        tx.commit()?;

        info!(project = %plan.name, vehicles = plan.vehicles.len(), "saved plan");
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .connection
            .prepare("SELECT name FROM projects ORDER BY name ASC")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn exists(&self, project: &str) -> StoreResult<bool> {
        validate_project_name(project)?;
        Ok(self.project_id(project)?.is_some())
    }
}

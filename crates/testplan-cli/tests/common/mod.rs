//! Helpers for running the built binary against a scratch data directory

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

pub fn testplan_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_testplan"))
}

/// A temporary directory used as the plan store
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("plans")
    }

    /// Command with the environment cleared of testplan settings
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(testplan_binary());
        cmd.current_dir(self.path())
            .env_remove("TESTPLAN_CONFIG")
            .env_remove("TESTPLAN_DATA_DIR")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run with `--data-dir` pointing into the workspace
    pub fn run(&self, args: &[&str]) -> Output {
        self.command()
            .arg("--data-dir")
            .arg(self.data_dir())
            .args(args)
            .output()
            .expect("Failed to execute testplan")
    }

    /// Run and require success
    pub fn ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "testplan {:?} failed: {}",
            args,
            stderr(&output)
        );
        stdout(&output)
    }

    /// Run and require failure with exit code 1
    pub fn fails(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert_eq!(
            output.status.code(),
            Some(1),
            "testplan {:?} should fail, stdout: {}",
            args,
            stdout(&output)
        );
        stderr(&output)
    }

    /// A project with one sequential vehicle (V001, SOPM 2025-01-01, tests A 3d then B 2d)
    pub fn sequential_project(&self, project: &str) {
        self.ok(&["init", project]);
        self.ok(&["add-vehicle", project, "V001", "--sopm", "2025-01-01", "--lrm", "2025-03-01"]);
        self.ok(&["add-test", project, "A", "-d", "3", "--vehicle", "V001", "-r", "Lab A"]);
        self.ok(&["add-test", project, "B", "-d", "2", "--vehicle", "V001", "-r", "Lab B"]);
    }

    /// A project with one explicit vehicle whose tests overlap on 2025-01-02..03
    pub fn explicit_project(&self, project: &str) {
        self.ok(&["init", project]);
        self.ok(&["add-vehicle", project, "V001"]);
        self.ok(&["add-test", project, "A", "-d", "3", "--vehicle", "V001", "--start", "2025-01-01"]);
        self.ok(&["add-test", project, "B", "-d", "2", "--vehicle", "V001", "--start", "2025-01-02"]);
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

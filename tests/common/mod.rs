//! Common test utilities for prefedit integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't read the
//! user's `~/.config/prefedit/config.toml`.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with an isolated working directory and config.
///
/// The `pfe()` method returns a `Command` that points `PFE_CONFIG` at a
/// per-environment path, making tests parallel-safe and independent of the
/// user's real config.
pub struct TestEnv {
    /// Directory holding the preference files under test
    pub work_dir: TempDir,
    /// Directory holding the (usually absent) config file
    pub config_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            work_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the pfe binary with isolated config.
    pub fn pfe(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_pfe"));
        cmd.current_dir(self.work_dir.path());
        cmd.env("PFE_CONFIG", self.config_path());
        cmd.env_remove("PFE_HUMAN");
        cmd
    }

    /// Path of a preference file inside the working directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.work_dir.path().join(name)
    }

    /// Write a preference file and return its path.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.file(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Path of the isolated config file.
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.path().join("config.toml")
    }

    /// Install a config file for this environment.
    pub fn write_config(&self, content: &str) {
        std::fs::write(self.config_path(), content).unwrap();
    }

    /// Get the path to the working directory.
    pub fn path(&self) -> &Path {
        self.work_dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

//! Shared test infrastructure for integration tests.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Temporary base directory plus helpers for running the binary against it.
pub struct SimFixture {
    pub temp_dir: TempDir,
}

impl Default for SimFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl SimFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn base_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        self.base_dir().join("configs/instances.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.base_dir().join("logs/provisioning.log")
    }

    /// Run `infrasim --base-dir <tmp> <args>` with `stdin` piped in.
    pub fn run(&self, args: &[&str], stdin: &str) -> Output {
        let mut child = Command::new(env!("CARGO_BIN_EXE_infrasim"))
            .arg("--base-dir")
            .arg(self.base_dir())
            .args(args)
            .env_remove("RUST_LOG")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn infrasim");
        if let Some(mut input) = child.stdin.take() {
            // Commands that never read stdin may exit before the write lands.
            let _ = input.write_all(stdin.as_bytes());
        }
        child.wait_with_output().expect("wait for infrasim")
    }

    /// Parse the JSON array store.
    pub fn stored(&self) -> serde_json::Value {
        let text = std::fs::read_to_string(self.store_path()).expect("read store");
        serde_json::from_str(&text).expect("parse store")
    }

    pub fn log(&self) -> String {
        std::fs::read_to_string(self.log_path()).expect("read log")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

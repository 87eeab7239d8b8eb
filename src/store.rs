//! Persistence for accepted machine records.
//!
//! The store is an ordered, append-only collection kept in a single file.
//! Loading never fails on missing or malformed content; it degrades to what
//! can be recovered and logs a warning. Any other I/O failure is returned.
use crate::machine::MachineSpec;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// On-disk layout of the machine store.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum StoreFormat {
    /// A single pretty-printed JSON array, rewritten on every append.
    #[default]
    #[serde(rename = "json")]
    #[value(name = "json")]
    JsonArray,
    /// One JSON object per line, appended in place.
    #[serde(rename = "jsonl")]
    #[value(name = "jsonl")]
    JsonLines,
}

/// Read/append contract shared by every store format.
pub trait MachineStore {
    /// Backing file for this store.
    fn path(&self) -> &Path;

    /// Load every record in insertion order.
    fn load(&self) -> Result<Vec<MachineSpec>>;

    /// Persist one more record after the existing ones.
    fn append(&self, record: &MachineSpec) -> Result<()>;
}

/// Open the store implementation for `format` backed by `path`.
pub fn open_store(format: StoreFormat, path: PathBuf) -> Box<dyn MachineStore> {
    match format {
        StoreFormat::JsonArray => Box::new(JsonArrayStore::new(path)),
        StoreFormat::JsonLines => Box::new(JsonLinesStore::new(path)),
    }
}

/// Whole-file JSON array store (read-modify-write on append).
#[derive(Debug, Clone)]
pub struct JsonArrayStore {
    path: PathBuf,
}

impl JsonArrayStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl MachineStore for JsonArrayStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<MachineSpec>> {
        let Some(bytes) = read_optional(&self.path)? else {
            return Ok(Vec::new());
        };
        let entries = match serde_json::from_slice::<Vec<serde_json::Value>>(&bytes) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "machine store is malformed; treating it as empty"
                );
                return Ok(Vec::new());
            }
        };
        let mut records = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<MachineSpec>(entry) {
                Ok(record) => records.push(record),
                Err(err) => tracing::warn!(
                    path = %self.path.display(),
                    index,
                    error = %err,
                    "skipping invalid machine record"
                ),
            }
        }
        Ok(records)
    }

    fn append(&self, record: &MachineSpec) -> Result<()> {
        let mut records = self.load()?;
        records.push(record.clone());
        let mut text =
            serde_json::to_string_pretty(&records).context("serialize machine records")?;
        text.push('\n');
        replace_file(&self.path, text.as_bytes())?;
        tracing::debug!(
            path = %self.path.display(),
            count = records.len(),
            "machine store rewritten"
        );
        Ok(())
    }
}

/// Append-only JSON Lines store; unreadable lines are skipped on load.
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    path: PathBuf,
}

impl JsonLinesStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl MachineStore for JsonLinesStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<MachineSpec>> {
        let Some(bytes) = read_optional(&self.path)? else {
            return Ok(Vec::new());
        };
        let text = String::from_utf8_lossy(&bytes);
        let mut records = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<MachineSpec>(line) {
                Ok(record) => records.push(record),
                Err(err) => tracing::warn!(
                    path = %self.path.display(),
                    line = index + 1,
                    error = %err,
                    "skipping malformed machine record"
                ),
            }
        }
        Ok(records)
    }

    fn append(&self, record: &MachineSpec) -> Result<()> {
        ensure_parent(&self.path)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        let mut line = String::new();
        // An interrupted earlier write must not swallow this record.
        if ends_mid_line(&mut file).with_context(|| format!("read {}", self.path.display()))? {
            line.push('\n');
        }
        line.push_str(&serde_json::to_string(record).context("serialize machine record")?);
        line.push('\n');
        file.write_all(line.as_bytes())
            .with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("read store {}", path.display())),
    }
}

fn ends_mid_line(file: &mut fs::File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    Ok(())
}

/// Write through a sibling temp file and rename over the target.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent(path)?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("write {}", tmp.path().display()))?;
    tmp.persist(path)
        .with_context(|| format!("publish {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

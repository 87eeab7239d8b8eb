//! Runtime settings shared by every command.
//!
//! Settings are resolved once in `main` from defaults rooted at a base
//! directory, the optional `configs/settings.json`, and CLI overrides, then
//! passed by reference. Nothing here is process-global.
use crate::store::{open_store, MachineStore, StoreFormat};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Current schema version for `configs/settings.json`.
pub const SETTINGS_SCHEMA_VERSION: u32 = 1;

pub const SETTINGS_REL: &str = "configs/settings.json";
pub const STORE_REL: &str = "configs/instances.json";
pub const LOG_REL: &str = "logs/provisioning.log";
pub const SCRIPT_REL: &str = "scripts/install_services.sh";

/// Optional on-disk settings; relative paths resolve against the base dir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsFile {
    pub schema_version: u32,
    #[serde(default)]
    pub store_format: StoreFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<PathBuf>,
}

/// Per-invocation overrides, taken as given (relative to the working dir).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub store: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub script: Option<PathBuf>,
    pub store_format: Option<StoreFormat>,
}

/// Fully resolved paths and options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_dir: PathBuf,
    pub store_path: PathBuf,
    pub log_path: PathBuf,
    pub script_path: PathBuf,
    pub store_format: StoreFormat,
}

impl Settings {
    /// Default layout under `base_dir`.
    pub fn defaults(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            store_path: base_dir.join(STORE_REL),
            log_path: base_dir.join(LOG_REL),
            script_path: base_dir.join(SCRIPT_REL),
            store_format: StoreFormat::default(),
        }
    }

    /// Layer the settings file (if present) and CLI overrides over defaults.
    pub fn resolve(base_dir: &Path, overrides: &Overrides) -> Result<Self> {
        let mut settings = Self::defaults(base_dir);
        if let Some(file) = load_settings_file(base_dir)? {
            validate_settings_file(&file)?;
            settings.store_format = file.store_format;
            if let Some(store) = &file.store {
                settings.store_path = base_dir.join(store);
            }
            if let Some(log_file) = &file.log_file {
                settings.log_path = base_dir.join(log_file);
            }
            if let Some(script) = &file.script {
                settings.script_path = resolve_script(base_dir.join(script), script);
            }
        }
        if let Some(store) = &overrides.store {
            settings.store_path = store.clone();
        }
        if let Some(log_file) = &overrides.log_file {
            settings.log_path = log_file.clone();
        }
        if let Some(script) = &overrides.script {
            settings.script_path = resolve_script(script.clone(), script);
        }
        if let Some(format) = overrides.store_format {
            settings.store_format = format;
        }
        Ok(settings)
    }

    /// Log path usable before the settings file has been read.
    ///
    /// Only the `--log-file` override applies, so failures while resolving
    /// the rest of the settings still reach a log.
    pub fn startup_log_path(base_dir: &Path, overrides: &Overrides) -> PathBuf {
        overrides
            .log_file
            .clone()
            .unwrap_or_else(|| base_dir.join(LOG_REL))
    }

    /// Create the directories the store and log file live in.
    pub fn ensure_dirs(&self) -> Result<()> {
        for path in [&self.store_path, &self.log_path] {
            create_parent_dir(path)?;
        }
        Ok(())
    }

    pub fn open_store(&self) -> Box<dyn MachineStore> {
        open_store(self.store_format, self.store_path.clone())
    }

    /// Settings file contents that reproduce this store format.
    pub fn to_file(&self) -> SettingsFile {
        SettingsFile {
            store_format: self.store_format,
            ..default_settings_file()
        }
    }
}

pub fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    Ok(())
}

pub fn default_settings_file() -> SettingsFile {
    SettingsFile {
        schema_version: SETTINGS_SCHEMA_VERSION,
        store_format: StoreFormat::default(),
        store: None,
        log_file: None,
        script: None,
    }
}

pub fn settings_path(base_dir: &Path) -> PathBuf {
    base_dir.join(SETTINGS_REL)
}

/// Load `configs/settings.json` when it exists.
pub fn load_settings_file(base_dir: &Path) -> Result<Option<SettingsFile>> {
    let path = settings_path(base_dir);
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(&path).with_context(|| format!("read settings {}", path.display()))?;
    let file: SettingsFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse settings JSON {}", path.display()))?;
    Ok(Some(file))
}

/// Persist a settings file in a stable JSON format.
pub fn write_settings_file(base_dir: &Path, file: &SettingsFile) -> Result<()> {
    let path = settings_path(base_dir);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create configs dir")?;
    }
    let text = serde_json::to_string_pretty(file).context("serialize settings")?;
    fs::write(&path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn validate_settings_file(file: &SettingsFile) -> Result<()> {
    if file.schema_version != SETTINGS_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported settings schema_version {}",
            file.schema_version
        ));
    }
    let empty = [
        ("store", &file.store),
        ("log_file", &file.log_file),
        ("script", &file.script),
    ]
    .into_iter()
    .find(|(_, path)| path.as_ref().is_some_and(|p| p.as_os_str().is_empty()));
    if let Some((label, _)) = empty {
        return Err(anyhow!("{label} must be non-empty"));
    }
    Ok(())
}

/// A bare script name that is not present locally is looked up on `PATH`.
fn resolve_script(candidate: PathBuf, raw: &Path) -> PathBuf {
    let mut components = raw.components();
    let bare = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if candidate.exists() || !bare {
        return candidate;
    }
    which::which(raw).unwrap_or(candidate)
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;

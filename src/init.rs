//! Layout bootstrap for a simulator base directory.
//!
//! Init creates the directory layout, the sample install script, and
//! `configs/settings.json` so later commands run without extra flags.
use crate::settings::{settings_path, write_settings_file, Settings};
use crate::templates;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Run init; existing files are kept unless `force` is set.
pub fn run_init(settings: &Settings, force: bool) -> Result<()> {
    fs::create_dir_all(&settings.base_dir)
        .with_context(|| format!("create {}", settings.base_dir.display()))?;
    settings.ensure_dirs()?;

    if write_layout_file(&settings.script_path, templates::INSTALL_SERVICES_SH, force)? {
        make_executable(&settings.script_path)?;
        println!("wrote {}", settings.script_path.display());
    }

    let config_path = settings_path(&settings.base_dir);
    if force || !config_path.is_file() {
        write_settings_file(&settings.base_dir, &settings.to_file())?;
        println!("wrote {}", config_path.display());
    }
    tracing::info!(base_dir = %settings.base_dir.display(), force, "layout initialized");
    Ok(())
}

/// Returns whether the file was written.
fn write_layout_file(path: &Path, contents: &str, force: bool) -> Result<bool> {
    if path.is_file() && !force {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, contents.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(true)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    fs::set_permissions(path, permissions)
        .with_context(|| format!("chmod {}", path.display()))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

use anyhow::{Context, Result};
use carelog_core::{Appointment, RawInstance};
use std::fs;
use std::path::{Path, PathBuf};

/// `$CARELOG_HOME`, else `~/.carelog`.
pub fn carelog_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("CARELOG_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".carelog"))
}

pub fn ensure_carelog_home() -> Result<PathBuf> {
    let dir = carelog_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Read a JSON array of reminder instances as the backend would return it.
pub fn read_snapshot(path: &Path) -> Result<Vec<RawInstance>> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn write_snapshot(path: &Path, raws: &[RawInstance]) -> Result<()> {
    let json = serde_json::to_string_pretty(raws).context("serialize snapshot")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn read_appointments(path: &Path) -> Result<Vec<Appointment>> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

//! Common utilities for spimi-cmd

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Checks that a path exists and is a directory
pub fn validate_dir_exists(path: &str) -> Result<()> {
    let dir = Path::new(path);
    if !dir.exists() {
        anyhow::bail!("Directory does not exist: {}", path);
    }
    if !dir.is_dir() {
        anyhow::bail!("Path is not a directory: {}", path);
    }
    Ok(())
}

/// The `disk` directory next to the running executable.
pub fn default_work_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let parent = exe
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Executable path has no parent: {}", exe.display()))?;
    Ok(parent.join("disk"))
}

/// Formats file size in human-readable format
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

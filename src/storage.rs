use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create dir {}", path.display()))?;
    Ok(())
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "scriven", "scriven").context("resolve app dirs")
}

/// Default model directory when no `models_folder` preference is set.
pub fn models_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("models"))
}

pub fn logs_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("logs"))
}

/// Path of the log file for the current day, created lazily by the file
/// logging layer.
pub fn log_file_path(logs_dir: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y-%m-%d");
    logs_dir.join(format!("scriven-{stamp}.log"))
}

/// Contents of the most recent log file, or an empty string when no logs
/// exist yet. An unreadable log directory degrades to empty output.
pub fn read_logs(logs_dir: &Path) -> String {
    let mut log_files: Vec<PathBuf> = match fs::read_dir(logs_dir) {
        Ok(entries) => entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "log"))
            .collect(),
        Err(err) => {
            tracing::warn!(error = %err, path = %logs_dir.display(), "logs unavailable");
            return String::new();
        }
    };
    log_files.sort();
    let Some(latest) = log_files.last() else {
        return String::new();
    };
    fs::read_to_string(latest).unwrap_or_default()
}

/// Opens a path with the platform file manager. Best-effort: failures are
/// logged and ignored.
pub fn open_path(path: &Path) {
    #[cfg(target_os = "macos")]
    let launcher = "open";
    #[cfg(target_os = "windows")]
    let launcher = "explorer";
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let launcher = "xdg-open";

    if let Err(err) = Command::new(launcher).arg(path).spawn() {
        tracing::warn!(error = %err, path = %path.display(), "open path failed");
    }
}

//! Where refugemap keeps its files.
//!
//! Development builds use the working directory. Installed builds use the
//! platform directories from `dirs` (`~/.config/refugemap` for config on
//! Linux, the data directory for everything else). `REFUGEMAP_DATA_DIR`
//! relocates data and logs, e.g. onto removable storage on a field kiosk.

use std::path::{Path, PathBuf};

/// Environment variable that overrides the data directory
pub const ENV_DATA_DIR: &str = "REFUGEMAP_DATA_DIR";

const APP_DIR_NAME: &str = "refugemap";

/// True under `cargo run` or in debug builds.
pub fn is_dev_mode() -> bool {
    std::env::var("CARGO").is_ok() || cfg!(debug_assertions)
}

/// Directory of `config.json`.
pub fn config_dir() -> Option<PathBuf> {
    if is_dev_mode() {
        return Some(PathBuf::from("."));
    }

    #[cfg(target_os = "linux")]
    {
        dirs::config_dir().map(|p| p.join(APP_DIR_NAME))
    }

    #[cfg(not(target_os = "linux"))]
    {
        data_dir()
    }
}

/// Directory for the local store and logs.
pub fn data_dir() -> Option<PathBuf> {
    resolve_data_dir(std::env::var(ENV_DATA_DIR).ok().as_deref(), is_dev_mode())
}

fn resolve_data_dir(override_dir: Option<&str>, dev: bool) -> Option<PathBuf> {
    match override_dir.map(str::trim) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ if dev => Some(PathBuf::from(".")),
        _ => dirs::data_dir().map(|p| p.join(APP_DIR_NAME)),
    }
}

fn in_dir(dir: Option<PathBuf>, name: &str) -> PathBuf {
    dir.map(|d| d.join(name))
        .unwrap_or_else(|| Path::new(name).to_path_buf())
}

pub fn config_file() -> PathBuf {
    in_dir(config_dir(), "config.json")
}

/// File backing the local refuge store
pub fn local_store_file() -> PathBuf {
    in_dir(data_dir(), "refuges.json")
}

pub fn logs_dir() -> PathBuf {
    in_dir(data_dir(), "logs")
}

/// Create config, data and log directories. A no-op in development unless
/// the data directory is overridden.
pub fn ensure_directories() -> std::io::Result<()> {
    let dirs = [config_dir(), data_dir(), Some(logs_dir())];
    for dir in dirs.into_iter().flatten() {
        if dir != Path::new(".") {
            std::fs::create_dir_all(&dir)?;
        }
    }
    Ok(())
}

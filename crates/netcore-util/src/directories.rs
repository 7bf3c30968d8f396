use std::path::PathBuf;

use directories::BaseDirs;
use tracing::warn;

/// Resolves the directory used for PID files, logs, and script staging
/// when the runtime config leaves the corresponding path unset.
pub fn local_share_dir<S: AsRef<str>>(app_name: S) -> PathBuf {
    let Some(base_dirs) = BaseDirs::new() else {
        warn!("couldn't find basedirs, storing data in /tmp/<app_name>");
        return PathBuf::from(format!("/tmp/{}", app_name.as_ref()));
    };
    base_dirs.data_dir().join(app_name.as_ref())
}

pub fn logs_dir<S: AsRef<str>>(app_name: S) -> PathBuf {
    local_share_dir(app_name).join("logs")
}

pub fn scripts_dir<S: AsRef<str>>(app_name: S) -> PathBuf {
    local_share_dir(app_name).join("scripts")
}

/// Returns `configured` if set, otherwise the XDG-derived default under `sub`.
pub fn resolve_or_default(configured: Option<&str>, app_name: &str, sub: &str) -> PathBuf {
    match configured {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => local_share_dir(app_name).join(sub),
    }
}

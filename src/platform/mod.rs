use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "LEADRELAY_DATA_DIR";

/// OS-specific filesystem concerns, so call sites stay free of `#[cfg]` blocks.
pub trait Platform {
    /// Set restrictive *directory* permissions (0o700 on Unix, no-op on Windows).
    fn restrict_dir_permissions(path: &Path);

    /// Set restrictive *file* permissions (0o600 on Unix, no-op on Windows).
    fn restrict_file_permissions(path: &Path);

    /// Root data directory.
    /// Unix: `~/.leadrelay`, Windows: `%APPDATA%\leadrelay`.
    fn data_dir() -> PathBuf;
}

/// `LEADRELAY_DATA_DIR` when set and non-empty, otherwise `default`.
pub fn resolve_data_dir(default: PathBuf) -> PathBuf {
    match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => default,
    }
}

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::NativePlatform;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::NativePlatform;

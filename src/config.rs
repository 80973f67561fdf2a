use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "LabRisk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subdirectory of the data directory holding reference tables.
pub const REFERENCE_SUBDIR: &str = "reference";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "labrisk=info,labrisk_lib=info"
}

/// Get the application data directory (`<data dir>/LabRisk`).
/// `None` when the platform exposes no data directory.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_NAME))
}

/// Get the user-level reference tables directory.
pub fn reference_dir() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(REFERENCE_SUBDIR))
}

/// The user-level reference directory, if it exists. `None` means the
/// built-in tables apply.
pub fn existing_reference_dir() -> Option<PathBuf> {
    reference_dir().filter(|dir| dir.is_dir())
}

use std::path::PathBuf;
use std::sync::OnceLock;

/// Folder name under the user's documents directory.
const DATA_DIR_NAME: &str = "GenshinArtifactScanner";

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the per-user data directory: `<documents>/GenshinArtifactScanner/`,
/// or `<exe_dir>/data/` when there is no documents directory.
pub fn get_data_dir() -> PathBuf {
    dirs::document_dir()
        .map(|d| d.join(DATA_DIR_NAME))
        .unwrap_or_else(|| get_exe_dir().join("data"))
}

/// Returns the logs directory: `<data_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_data_dir().join("logs")
}

/// Returns the export directory: `<data_dir>/export/`
pub fn get_export_dir() -> PathBuf {
    get_data_dir().join("export")
}

/// Returns the configuration file: `<exe_dir>/config.json`
pub fn get_config_path() -> PathBuf {
    get_exe_dir().join("config.json")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    std::fs::create_dir_all(get_export_dir())?;
    Ok(())
}

//! Where presets live on disk, and how a preset name is resolved.
//!
//! | Kind | Linux | macOS | Windows |
//! |------|-------|-------|---------|
//! | user config | `~/.config/kinetone/` | `~/Library/Application Support/kinetone/` | `%APPDATA%\kinetone\` |
//! | user presets | `<user config>/presets/` | `<user config>/presets/` | `<user config>\presets\` |
//! | system presets | `/usr/share/kinetone/presets/` | `/Library/Application Support/kinetone/presets/` | `%LOCALAPPDATA%\kinetone\presets\` |
//!
//! Directories listed in the `KINETONE_PRESET_PATH` environment variable (separated like
//! `PATH`) are searched before the user directory.
//!
//! ```rust,no_run
//! use kinetone_config::paths;
//!
//! let preset = paths::resolve_preset("wah").unwrap();
//! println!("{} ({} effects)", preset.name, preset.len());
//! ```

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, IoAction};
use crate::factory_presets::get_factory_preset;
use crate::preset::Preset;

const APP_NAME: &str = "kinetone";
const PRESETS_SUBDIR: &str = "presets";
const PRESET_EXTENSION: &str = "toml";

/// Environment variable holding extra preset directories.
pub const PRESET_PATH_ENV: &str = "KINETONE_PRESET_PATH";

/// The user configuration directory, falling back to `./kinetone`.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// The user presets directory.
pub fn user_presets_dir() -> PathBuf {
    user_config_dir().join(PRESETS_SUBDIR)
}

/// The system-wide (usually read-only) presets directory.
pub fn system_presets_dir() -> PathBuf {
    let base = if cfg!(target_os = "linux") {
        PathBuf::from("/usr/share")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/Library/Application Support")
    } else {
        dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."))
    };
    base.join(APP_NAME).join(PRESETS_SUBDIR)
}

/// Directories searched for presets, in priority order.
pub fn preset_search_dirs() -> Vec<PathBuf> {
    let mut search: Vec<PathBuf> = std::env::var_os(PRESET_PATH_ENV)
        .map(|value| std::env::split_paths(&value).collect())
        .unwrap_or_default();
    search.push(user_presets_dir());
    search.push(system_presets_dir());
    search
}

/// Find a preset file by path or by name.
///
/// An existing file path is returned as is. Otherwise `name` (with `.toml` appended if
/// missing) is looked up in [`preset_search_dirs`].
pub fn find_preset(name: &str) -> Option<PathBuf> {
    find_preset_in(name, &preset_search_dirs())
}

/// [`find_preset`] over an explicit list of directories.
pub fn find_preset_in(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let path = Path::new(name);
    if path.is_file() {
        return Some(path.to_path_buf());
    }

    let file_name = if path.extension().is_some_and(|ext| ext == PRESET_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}.{PRESET_EXTENSION}")
    };
    dirs.iter()
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}

/// Load a preset by path, by name from the search directories, or from the factory set.
///
/// Files take precedence, so a user preset named like a factory preset overrides it.
///
/// # Errors
///
/// [`ConfigError::PresetNotFound`] if nothing matches, or the load errors of
/// [`Preset::load`].
pub fn resolve_preset(name: &str) -> Result<Preset, ConfigError> {
    if let Some(path) = find_preset(name) {
        return Preset::load(path);
    }
    get_factory_preset(name).ok_or_else(|| ConfigError::PresetNotFound(name.to_string()))
}

/// Create the user presets directory if needed and return it.
///
/// # Errors
///
/// [`ConfigError::Io`].
pub fn ensure_user_presets_dir() -> Result<PathBuf, ConfigError> {
    ensure_dir(user_presets_dir())
}

/// Create the user configuration directory if needed and return it.
///
/// # Errors
///
/// [`ConfigError::Io`].
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    ensure_dir(user_config_dir())
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf, ConfigError> {
    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::io(IoAction::CreateDir, &dir, e))?;
    Ok(dir)
}

/// Preset files in the user presets directory.
pub fn list_user_presets() -> Vec<PathBuf> {
    list_presets_in_dir(&user_presets_dir())
}

/// Preset files in the system presets directory.
pub fn list_system_presets() -> Vec<PathBuf> {
    list_presets_in_dir(&system_presets_dir())
}

/// Preset files in every search directory, highest priority first. Names may repeat.
pub fn list_all_presets() -> Vec<PathBuf> {
    preset_search_dirs()
        .iter()
        .flat_map(|dir| list_presets_in_dir(dir))
        .collect()
}

/// `.toml` files directly inside `dir`, sorted by name. Unreadable directories are empty.
pub fn list_presets_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut presets: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == PRESET_EXTENSION))
        .collect();
    presets.sort();
    presets
}

/// Preset name from a file path (the file stem).
///
/// ```rust
/// use kinetone_config::paths::preset_name_from_path;
/// use std::path::Path;
///
/// assert_eq!(
///     preset_name_from_path(Path::new("/presets/slapback.toml")),
///     Some("slapback".to_string())
/// );
/// ```
pub fn preset_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

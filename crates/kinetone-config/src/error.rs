//! Configuration errors.
//!
//! Everything here happens off the audio thread: reading and writing preset files,
//! parsing TOML, resolving preset names and checking parameters against the effect
//! registry. Parameter problems always arrive as a [`ValidationError`], whether they
//! came from a whole-preset check or a single `set_param`.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::validation::ValidationError;

/// File-system operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoAction {
    /// Reading a preset.
    Read,
    /// Writing a preset.
    Write,
    /// Creating a preset directory.
    CreateDir,
}

impl fmt::Display for IoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::CreateDir => "create directory",
        })
    }
}

/// Errors from loading, saving, resolving and building presets.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A preset file or directory could not be accessed.
    #[error("cannot {action} '{}': {source}", path.display())]
    Io {
        /// What was being attempted.
        action: IoAction,
        /// File or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Preset text is not valid TOML or does not have the preset layout.
    #[error("malformed preset: {0}")]
    Parse(#[from] toml::de::Error),

    /// Preset could not be encoded as TOML.
    #[error("cannot encode preset: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Name is not a file, not in any preset directory and not a factory preset.
    #[error("preset not found: {0}")]
    PresetNotFound(String),

    /// An effect type, parameter name or value was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A chain or preset position past the last entry.
    #[error("no effect at position {index} (chain has {len})")]
    NoSuchEntry {
        /// Requested position.
        index: usize,
        /// Number of entries.
        len: usize,
    },
}

impl ConfigError {
    /// Wrap an I/O error with the action and path that caused it.
    pub fn io(action: IoAction, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_io_names_action_and_path() {
        let err = ConfigError::io(
            IoAction::CreateDir,
            "/presets/mine",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("cannot create directory '/presets/mine'"), "{msg}");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_validation_is_transparent() {
        let err = ConfigError::from(ValidationError::UnknownEffect("shimmer".to_string()));
        assert_eq!(err.to_string(), "unknown effect type: shimmer");
    }

    #[test]
    fn test_no_such_entry() {
        let err = ConfigError::NoSuchEntry { index: 3, len: 2 };
        assert_eq!(err.to_string(), "no effect at position 3 (chain has 2)");
        assert!(err.source().is_none());
    }
}

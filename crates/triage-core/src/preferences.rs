use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::theme::Theme;

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("failed to write preferences: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode preferences: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Where the user's explicit theme choice is kept between runs.
pub trait PreferenceStore: Send {
    /// The persisted theme, if one was ever saved and is readable.
    fn load_theme(&self) -> Option<Theme>;

    fn save_theme(&mut self, theme: Theme) -> Result<(), PreferenceError>;
}

/// On-disk preferences document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Preferences {
    theme: Option<Theme>,
}

/// TOML-backed store, by default at `<data_local_dir>/triage/preferences.toml`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The platform location, or `None` when the platform has no data dir.
    pub fn default_location() -> Option<Self> {
        dirs::data_local_dir().map(|d| Self::new(d.join("triage").join("preferences.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Option<Preferences> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        toml::from_str(&content).ok()
    }
}

impl PreferenceStore for FileStore {
    fn load_theme(&self) -> Option<Theme> {
        self.read()?.theme
    }

    fn save_theme(&mut self, theme: Theme) -> Result<(), PreferenceError> {
        let mut prefs = self.read().unwrap_or_default();
        prefs.theme = Some(theme);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml::to_string_pretty(&prefs)?)?;
        Ok(())
    }
}

/// Store that forgets everything when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    theme: Option<Theme>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds a saved choice.
    pub fn with_theme(theme: Theme) -> Self {
        Self { theme: Some(theme) }
    }
}

impl PreferenceStore for MemoryStore {
    fn load_theme(&self) -> Option<Theme> {
        self.theme
    }

    fn save_theme(&mut self, theme: Theme) -> Result<(), PreferenceError> {
        self.theme = Some(theme);
        Ok(())
    }
}

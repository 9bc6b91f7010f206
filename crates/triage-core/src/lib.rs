use std::path::Path;

use serde::{Deserialize, Serialize};

pub mod api;
pub mod app;
pub mod config;
pub mod files;
pub mod form;
pub mod page;
pub mod preferences;
pub mod theme;
pub mod ui;
pub mod utils;

// Re-export for convenience
pub use api::{ApiError, ApiManager, PendingRequest, RequestId};
pub use app::{EmailFormApp, SubmitOutcome, SubmitState};
pub use config::{ConfigFile, Settings};
pub use files::FileManager;
pub use form::{FormData, FormValue};
pub use page::{ElementId, EventOutcome, Page, PageEvent};
pub use preferences::{FileStore, MemoryStore, PreferenceError, PreferenceStore};
pub use theme::{ColorFgBg, FixedScheme, SystemScheme, Theme, ThemeManager};
pub use ui::UiManager;

/// Path of the classification endpoint on the server.
pub const PROCESS_ENDPOINT: &str = "/process";

/// Category label the server uses for emails that need action.
pub const PRODUCTIVE_CATEGORY: &str = "produtivo";

/// Category label for everything else.
pub const WARNING_CATEGORY: &str = "warning";

/// A file picked through the file input or dropped on the upload area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    data: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, naming it after the last path component.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, data })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.name, self.data)
    }
}

/// A successful response from the classification endpoint.
///
/// Fields the client does not know about are kept in `extra`, so the
/// object round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "resposta")]
    pub response: String,
    /// Preview of the text the server classified.
    #[serde(
        rename = "texto_processado",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub processed_text: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ClassificationResult {
    pub fn is_productive(&self) -> bool {
        self.category == PRODUCTIVE_CATEGORY
    }

    /// The processed-text preview, if the server sent a non-empty one.
    pub fn preview(&self) -> Option<&str> {
        self.processed_text.as_deref().filter(|t| !t.is_empty())
    }
}

//! Diagram file format.
//!
//! The drawing engine owns the meaning of `elements`, `appState` and
//! `files`; this module only moves them between disk and memory, fills in a
//! few view defaults, and drops per-session collaborator state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::config::AppConfig;

pub const DOCUMENT_TYPE: &str = "excalidraw";
pub const DOCUMENT_VERSION: u32 = 2;
pub const DOCUMENT_SOURCE: &str = "sketchdir";

const BACKGROUND_KEY: &str = "viewBackgroundColor";
const FONT_FAMILY_KEY: &str = "currentItemFontFamily";
const ROUGHNESS_KEY: &str = "currentItemRoughness";
/// Live presence of other users, never meaningful once written to disk
const COLLABORATORS_KEY: &str = "collaborators";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramDocument {
    #[serde(default)]
    pub elements: Vec<Value>,
    #[serde(default)]
    pub app_state: Map<String, Value>,
    #[serde(default)]
    pub files: Map<String, Value>,
}

/// Values used for view settings a document leaves out
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDefaults {
    pub background: String,
    pub font_family: u32,
    pub roughness: u32,
}

impl Default for DocumentDefaults {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for DocumentDefaults {
    fn from(config: &AppConfig) -> Self {
        Self {
            background: config.default_background.clone(),
            font_family: config.default_font_family,
            roughness: config.default_roughness,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedDocument<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    version: u32,
    source: &'static str,
    elements: &'a [Value],
    app_state: &'a Map<String, Value>,
    files: &'a Map<String, Value>,
}

impl DiagramDocument {
    /// Empty diagram carrying the defaults
    pub fn empty(defaults: &DocumentDefaults) -> Self {
        let mut doc = Self::default();
        doc.apply_defaults(defaults);
        doc
    }

    /// Parse file text. Content that is not a diagram document yields an
    /// empty document instead of an error.
    pub fn from_text(text: &str, defaults: &DocumentDefaults) -> Self {
        match serde_json::from_str::<DiagramDocument>(text) {
            Ok(mut doc) => {
                doc.strip_collaborators();
                doc.apply_defaults(defaults);
                doc
            }
            Err(e) => {
                if !text.trim().is_empty() {
                    warn!("unreadable diagram content, starting empty: {}", e);
                }
                Self::empty(defaults)
            }
        }
    }

    pub fn strip_collaborators(&mut self) {
        self.app_state.remove(COLLABORATORS_KEY);
    }

    pub fn apply_defaults(&mut self, defaults: &DocumentDefaults) {
        self.app_state
            .entry(BACKGROUND_KEY)
            .or_insert_with(|| Value::from(defaults.background.clone()));
        self.app_state
            .entry(FONT_FAMILY_KEY)
            .or_insert_with(|| Value::from(defaults.font_family));
        self.app_state
            .entry(ROUGHNESS_KEY)
            .or_insert_with(|| Value::from(defaults.roughness));
    }

    pub fn background(&self) -> Option<&str> {
        self.app_state.get(BACKGROUND_KEY).and_then(Value::as_str)
    }

    /// Pretty-printed file content
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let mut app_state = self.app_state.clone();
        app_state.remove(COLLABORATORS_KEY);
        serde_json::to_string_pretty(&SavedDocument {
            kind: DOCUMENT_TYPE,
            version: DOCUMENT_VERSION,
            source: DOCUMENT_SOURCE,
            elements: &self.elements,
            app_state: &app_state,
            files: &self.files,
        })
    }
}

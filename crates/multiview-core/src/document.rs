//! Persisted layout document: schema types and the on-disk store.
//!
//! One JSON file holds an entry per workspace ever seen:
//!
//! ```text
//! { "<workspace>": { "multiviews": { "<id>": MultiviewRecord, ... }, "dock": <layout> }, ... }
//! ```
//!
//! The document is read wholesale, mutated in memory and written back
//! wholesale. Writes go to a sibling `.tmp` file that is renamed over the
//! real one only after every byte landed, so a failed write leaves the
//! previous document in place.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::error::StorageError;

/// Opaque layout payload handed to and received from widgets.
pub type LayoutPayload = Map<String, Value>;

/// Reserved instance id for the window migrated from the legacy format.
pub const DEFAULT_INSTANCE_ID: &str = "default";

/// Display name given to the migrated legacy window and the fallback instance.
pub const DEFAULT_INSTANCE_NAME: &str = "Main Window";

const MULTIVIEWS_KEY: &str = "multiviews";
const DOCK_KEY: &str = "dock";

// =============================================================================
// Schema types
// =============================================================================

/// Persisted state of one multiview.
///
/// Reading is lenient: missing or mistyped fields fall back to their
/// defaults instead of failing the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct MultiviewRecord {
    pub name: String,
    pub persistent: bool,
    pub visible: bool,
    /// Opaque payload; kept verbatim, including non-object values.
    pub layout: Value,
}

impl Default for MultiviewRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            persistent: true,
            visible: false,
            layout: Value::Object(Map::new()),
        }
    }
}

impl From<Value> for MultiviewRecord {
    fn from(value: Value) -> Self {
        let defaults = Self::default();
        let Value::Object(mut obj) = value else {
            return defaults;
        };
        Self {
            name: match obj.remove("name") {
                Some(Value::String(name)) => name,
                _ => defaults.name,
            },
            persistent: obj
                .get("persistent")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.persistent),
            visible: obj
                .get("visible")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.visible),
            layout: obj.remove("layout").unwrap_or(defaults.layout),
        }
    }
}

impl MultiviewRecord {
    /// The layout as an object; anything else reads as an empty layout.
    #[must_use]
    pub fn layout_payload(&self) -> LayoutPayload {
        as_payload(&self.layout)
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".to_string(), Value::String(self.name.clone()));
        obj.insert("persistent".to_string(), Value::Bool(self.persistent));
        obj.insert("visible".to_string(), Value::Bool(self.visible));
        obj.insert("layout".to_string(), self.layout.clone());
        Value::Object(obj)
    }
}

/// Current-schema state of one workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct WorkspaceEntry {
    /// Records keyed by instance id, in document order.
    pub multiviews: IndexMap<String, MultiviewRecord>,
    /// Layout of the legacy dock view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dock: Option<Value>,
}

impl From<Value> for WorkspaceEntry {
    fn from(value: Value) -> Self {
        let Value::Object(mut obj) = value else {
            return Self::default();
        };
        let multiviews = match obj.remove(MULTIVIEWS_KEY) {
            Some(Value::Object(records)) => records
                .into_iter()
                .map(|(id, record)| (id, MultiviewRecord::from(record)))
                .collect(),
            _ => IndexMap::new(),
        };
        let dock = match obj.remove(DOCK_KEY) {
            None | Some(Value::Null) => None,
            Some(dock) => Some(dock),
        };
        Self { multiviews, dock }
    }
}

impl WorkspaceEntry {
    /// The dock payload when it is a non-empty object.
    #[must_use]
    pub fn dock_payload(&self) -> Option<LayoutPayload> {
        self.dock
            .as_ref()
            .map(as_payload)
            .filter(|payload| !payload.is_empty())
    }

    /// Serialize to the current object schema. `multiviews` is always written.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let records: Map<String, Value> = self
            .multiviews
            .iter()
            .map(|(id, record)| (id.clone(), record.to_value()))
            .collect();
        let mut obj = Map::new();
        obj.insert(MULTIVIEWS_KEY.to_string(), Value::Object(records));
        if let Some(dock) = &self.dock {
            obj.insert(DOCK_KEY.to_string(), dock.clone());
        }
        Value::Object(obj)
    }
}

fn as_payload(value: &Value) -> LayoutPayload {
    match value {
        Value::Object(obj) => obj.clone(),
        _ => LayoutPayload::new(),
    }
}

// =============================================================================
// Document
// =============================================================================

/// The whole persisted document: workspace id → raw workspace entry.
///
/// Entries stay as raw JSON so that legacy and unknown shapes survive until
/// the migration engine looks at them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutDocument {
    entries: Map<String, Value>,
}

impl LayoutDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document; the top level must be a JSON object.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let entries: Map<String, Value> = serde_json::from_str(text)?;
        Ok(Self { entries })
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(&self.entries)
        } else {
            serde_json::to_string(&self.entries)
        }
    }

    #[must_use]
    pub fn entry(&self, workspace: &str) -> Option<&Value> {
        self.entries.get(workspace)
    }

    /// Replace (or insert) the raw entry for a workspace, keeping its position.
    pub fn set_entry(&mut self, workspace: &str, entry: Value) {
        self.entries.insert(workspace.to_string(), entry);
    }

    pub fn workspaces(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Store
// =============================================================================

/// How the last read resolved. Every variant carries a usable document.
#[derive(Debug)]
pub enum DocumentSource {
    /// Parsed from disk.
    Loaded,
    /// No file yet (first run).
    Missing,
    /// The directory could not be created; running on in-memory defaults.
    DirUnavailable(StorageError),
    /// The file exists but could not be read.
    Unreadable(StorageError),
    /// The file could not be parsed; a backup may have been kept.
    Corrupt(StorageError),
}

impl DocumentSource {
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Loaded | Self::Missing)
    }
}

/// Result of [`LayoutStore::read`].
#[derive(Debug)]
pub struct DocumentRead {
    pub document: LayoutDocument,
    pub source: DocumentSource,
}

/// Result of a successful [`LayoutStore::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub path: PathBuf,
    pub bytes: usize,
}

/// Reads and writes the layout document at a fixed path.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    path: PathBuf,
    pretty: bool,
    backup_corrupt: bool,
}

impl LayoutStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pretty: true,
            backup_corrupt: true,
        }
    }

    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[must_use]
    pub fn with_backup_corrupt(mut self, backup: bool) -> Self {
        self.backup_corrupt = backup;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn path_string(&self) -> String {
        self.path.display().to_string()
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Path of the copy kept when the document fails to parse.
    #[must_use]
    pub fn corrupt_backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };
        fs::create_dir_all(dir).map_err(|e| StorageError::ConfigDirUnavailable {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Read the document. Never fails: problems degrade to an empty document
    /// and are described by [`DocumentRead::source`].
    pub fn read(&self) -> DocumentRead {
        let empty = |source| DocumentRead {
            document: LayoutDocument::new(),
            source,
        };

        if let Err(err) = self.ensure_dir() {
            error!(path = %self.path.display(), error = %err, "Cannot save/load layouts");
            return empty(DocumentSource::DirUnavailable(err));
        }

        if !self.path.exists() {
            debug!(path = %self.path.display(), "No layout file yet");
            return empty(DocumentSource::Missing);
        }

        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                let err = StorageError::ReadFailed {
                    path: self.path_string(),
                    reason: e.to_string(),
                };
                warn!(path = %self.path.display(), error = %err, "Layout file unreadable");
                return empty(DocumentSource::Unreadable(err));
            }
        };

        match LayoutDocument::from_json(&text) {
            Ok(document) => {
                debug!(
                    path = %self.path.display(),
                    workspaces = document.len(),
                    "Layout document loaded"
                );
                DocumentRead {
                    document,
                    source: DocumentSource::Loaded,
                }
            }
            Err(e) => {
                let err = StorageError::Corrupt {
                    path: self.path_string(),
                    reason: e.to_string(),
                };
                error!(path = %self.path.display(), error = %err, "Layout file is corrupt");
                if self.backup_corrupt {
                    self.keep_corrupt_copy();
                }
                empty(DocumentSource::Corrupt(err))
            }
        }
    }

    fn keep_corrupt_copy(&self) {
        let backup = self.corrupt_backup_path();
        match fs::copy(&self.path, &backup) {
            Ok(_) => info!(backup = %backup.display(), "Kept copy of corrupt layout file"),
            Err(e) => warn!(backup = %backup.display(), error = %e, "Failed to back up corrupt layout file"),
        }
    }

    /// Serialize `document` into `writer`. Returns the byte count.
    ///
    /// Fails with [`StorageError::PartialWrite`] when the writer stops
    /// accepting bytes before the whole document landed.
    pub fn write_to<W: Write>(
        &self,
        document: &LayoutDocument,
        writer: &mut W,
    ) -> Result<usize, StorageError> {
        let write_failed = |reason: String| StorageError::WriteFailed {
            path: self.path_string(),
            reason,
        };
        let data = document
            .to_json(self.pretty)
            .map_err(|e| write_failed(e.to_string()))?;
        let bytes = data.as_bytes();

        let mut written = 0;
        while written < bytes.len() {
            match writer.write(&bytes[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(write_failed(e.to_string())),
            }
        }
        if written != bytes.len() {
            return Err(StorageError::PartialWrite {
                path: self.path_string(),
                expected: bytes.len(),
                written,
            });
        }
        writer.flush().map_err(|e| write_failed(e.to_string()))?;
        Ok(written)
    }

    /// Write the whole document.
    ///
    /// A short write is reported as [`StorageError::PartialWrite`] and the
    /// previous file is left untouched.
    pub fn write(&self, document: &LayoutDocument) -> Result<WriteReport, StorageError> {
        self.ensure_dir()?;

        let tmp = self.tmp_path();
        let write_failed = |e: std::io::Error| StorageError::WriteFailed {
            path: self.path_string(),
            reason: e.to_string(),
        };

        let mut file = File::create(&tmp).map_err(write_failed)?;
        let written = match self.write_to(document, &mut file) {
            Ok(written) => written,
            Err(err) => {
                drop(file);
                let _ = fs::remove_file(&tmp);
                return Err(err);
            }
        };
        file.sync_all().map_err(write_failed)?;
        drop(file);
        fs::rename(&tmp, &self.path).map_err(write_failed)?;

        debug!(path = %self.path.display(), bytes = written, "Layout document written");
        Ok(WriteReport {
            path: self.path.clone(),
            bytes: written,
        })
    }
}

//! One-way migration of workspace entries from the legacy array schema.
//!
//! Legacy entries are two-element arrays: `[default window layout, dock layout]`.
//! Current entries are objects with `multiviews` and `dock`. The shape alone
//! decides which one we are looking at; there is no version tag.
//!
//! Migrating rewrites the entry inside the cached [`LayoutDocument`] so the
//! next save persists the new shape. Objects pass through untouched, which
//! makes the migration a no-op the second time around.

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::document::{
    DEFAULT_INSTANCE_ID, DEFAULT_INSTANCE_NAME, LayoutDocument, MultiviewRecord, WorkspaceEntry,
};

/// What the migration engine found for a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryShape {
    /// Legacy array, rewritten in place.
    Migrated,
    /// Already the object schema.
    Current,
    /// No entry for this workspace.
    Missing,
    /// Present but neither array nor object.
    Anomalous,
}

/// Normalized entry plus how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOutcome {
    pub entry: WorkspaceEntry,
    pub shape: EntryShape,
}

/// Build the current-schema value for a legacy layout array.
///
/// Element 1 becomes `dock` verbatim; element 0 becomes the `"default"`
/// record. Extra elements are ignored.
#[must_use]
pub fn convert_legacy(layouts: &[Value]) -> Value {
    let mut converted = Map::new();

    if let Some(dock) = layouts.get(1) {
        converted.insert("dock".to_string(), dock.clone());
    }

    let mut multiviews = Map::new();
    if let Some(window) = layouts.first() {
        let record = MultiviewRecord {
            name: DEFAULT_INSTANCE_NAME.to_string(),
            persistent: true,
            visible: false,
            layout: window.clone(),
        };
        multiviews.insert(DEFAULT_INSTANCE_ID.to_string(), record.to_value());
    }
    converted.insert("multiviews".to_string(), Value::Object(multiviews));

    Value::Object(converted)
}

/// Resolve the entry for `workspace`, migrating a legacy array in place.
pub fn migrate_workspace_entry(document: &mut LayoutDocument, workspace: &str) -> MigrationOutcome {
    match document.entry(workspace) {
        Some(Value::Array(layouts)) => {
            info!(workspace, "Migrating old layout format to new format");
            let converted = convert_legacy(layouts);
            document.set_entry(workspace, converted.clone());
            MigrationOutcome {
                entry: WorkspaceEntry::from(converted),
                shape: EntryShape::Migrated,
            }
        }
        Some(value @ Value::Object(_)) => MigrationOutcome {
            entry: WorkspaceEntry::from(value.clone()),
            shape: EntryShape::Current,
        },
        Some(other) => {
            warn!(workspace, found = %json_kind(other), "No layouts found");
            MigrationOutcome {
                entry: WorkspaceEntry::default(),
                shape: EntryShape::Anomalous,
            }
        }
        None => {
            info!(workspace, "No layouts found");
            MigrationOutcome {
                entry: WorkspaceEntry::default(),
                shape: EntryShape::Missing,
            }
        }
    }
}

/// Migrate every legacy entry in the document. Returns the migrated workspaces.
pub fn migrate_document(document: &mut LayoutDocument) -> Vec<String> {
    let legacy: Vec<String> = document
        .workspaces()
        .filter(|ws| matches!(document.entry(ws), Some(Value::Array(_))))
        .map(str::to_string)
        .collect();

    for workspace in &legacy {
        migrate_workspace_entry(document, workspace);
    }
    legacy
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#![no_main]

use libfuzzer_sys::fuzz_target;
use multiview_core::migration::{EntryShape, migrate_document, migrate_workspace_entry};
use multiview_core::{LayoutDocument, MultiviewRecord, WorkspaceEntry};
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Lenient record and entry parsing must accept any JSON value.
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        let record = MultiviewRecord::from(value.clone());
        assert_eq!(MultiviewRecord::from(record.to_value()), record);
        let entry = WorkspaceEntry::from(value);
        let _ = entry.dock_payload();
        let _ = entry.to_value();
    }

    let Ok(mut document) = LayoutDocument::from_json(text) else {
        return;
    };
    let workspaces: Vec<String> = document.workspaces().map(str::to_string).collect();

    for workspace in &workspaces {
        let first = migrate_workspace_entry(&mut document, workspace);
        let snapshot = document.clone();
        let second = migrate_workspace_entry(&mut document, workspace);
        assert_eq!(document, snapshot, "second migration changed the document");
        assert_eq!(first.entry, second.entry);
        assert_ne!(second.shape, EntryShape::Migrated);
    }

    assert!(migrate_document(&mut document).is_empty());
    if let Ok(text) = document.to_json(false) {
        let reparsed = LayoutDocument::from_json(&text).expect("serialized document parses");
        assert_eq!(reparsed, document);
    }
});

//! End-to-end tests of the load/save cycle against a real layout file.
//!
//! Covers:
//! A. Save/load round trip (temporary instances vanish)
//! B. The loading guard as seen from widgets and host hooks
//! C. Legacy migration scenario and persistence of the migrated shape
//! D. Degraded reads (corrupt file, missing file)
//! E. Workspace switching through the lifecycle handler

use std::path::Path;
use std::sync::{Arc, Mutex};

use multiview_core::config::StorageConfig;
use multiview_core::document::DocumentSource;
use multiview_core::manager::LoadingFlag;
use multiview_core::migration::EntryShape;
use multiview_core::{
    EventOutcome, HeadlessFactory, HostEvent, LayoutPayload, LifecycleHandler, LoadOutcome,
    MultiviewManager, MultiviewWidget, SaveOutcome, StaticHost, WidgetFactory,
};
use serde_json::{Value, json};

// =============================================================================
// Helpers
// =============================================================================

fn manager_at(dir: &Path, workspace: &str) -> MultiviewManager<StaticHost> {
    MultiviewManager::new(
        StaticHost::new(workspace, dir),
        StorageConfig::default(),
        Box::new(HeadlessFactory::new()),
    )
}

fn read_file(dir: &Path) -> Value {
    let text = std::fs::read_to_string(dir.join("layout.json")).expect("layout file");
    serde_json::from_str(&text).expect("valid json")
}

fn payload(value: Value) -> LayoutPayload {
    match value {
        Value::Object(obj) => obj,
        other => panic!("not an object: {other}"),
    }
}

/// Widget that records whether the loading flag was held whenever it was
/// asked to load a layout.
struct RecordingWidget {
    flag: Arc<Mutex<Option<LoadingFlag>>>,
    seen: Arc<Mutex<Vec<bool>>>,
    layout: LayoutPayload,
    visible: bool,
}

impl MultiviewWidget for RecordingWidget {
    fn create_display(&mut self, _force_visible: bool) {}
    fn delete_display(&mut self) {}
    fn load(&mut self, layout: &LayoutPayload) {
        let loading = self
            .flag
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(LoadingFlag::is_loading);
        self.seen.lock().unwrap().push(loading);
        self.layout = layout.clone();
    }
    fn save(&self) -> LayoutPayload {
        self.layout.clone()
    }
    fn create_default_layout(&mut self) {
        self.layout = payload(json!({"recorded": true}));
    }
    fn clear_layout(&mut self) {}
    fn delete_layout(&mut self) {
        self.layout.clear();
    }
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
    fn is_visible(&self) -> bool {
        self.visible
    }
    fn set_title(&mut self, _title: &str) {}
    fn present(&mut self) {
        self.visible = true;
    }
}

#[derive(Clone, Default)]
struct RecordingFactory {
    flag: Arc<Mutex<Option<LoadingFlag>>>,
    seen: Arc<Mutex<Vec<bool>>>,
}

impl WidgetFactory for RecordingFactory {
    fn create_widget(&mut self) -> Box<dyn MultiviewWidget> {
        Box::new(RecordingWidget {
            flag: Arc::clone(&self.flag),
            seen: Arc::clone(&self.seen),
            layout: LayoutPayload::new(),
            visible: false,
        })
    }
}

// =============================================================================
// A. Round trip
// =============================================================================

#[test]
fn round_trip_keeps_persistent_and_drops_temporary() {
    let tmp = tempfile::TempDir::new().unwrap();
    let mut first = manager_at(tmp.path(), "sceneA");
    first.load();
    first.create_multiview("Recording Monitor", true).unwrap();
    first.create_multiview("Temp", false).unwrap();
    first.show_multiview("recording_monitor");
    first
        .registry_mut()
        .get_mut("recording_monitor")
        .unwrap()
        .widget_mut()
        .load(&payload(json!({"cells": [1, 2]})));
    first.save().unwrap();
    assert!(first.registry().contains("temp"));

    let mut second = manager_at(tmp.path(), "sceneA");
    second.load();
    assert_eq!(second.registry().ids(), ["default", "recording_monitor"]);
    let monitor = second.registry().get("recording_monitor").unwrap();
    assert_eq!(monitor.name(), "Recording Monitor");
    assert!(monitor.is_persistent());
    assert!(monitor.widget().is_visible());
    assert_eq!(monitor.widget().save(), payload(json!({"cells": [1, 2]})));
    assert!(second.registry().get("temp").is_none());
}

#[test]
fn creating_same_name_twice_suffixes_ids() {
    let tmp = tempfile::TempDir::new().unwrap();
    let mut mgr = manager_at(tmp.path(), "s");
    mgr.load();
    let a = mgr.create_multiview("Recording Monitor", true).unwrap();
    let b = mgr.create_multiview("Recording Monitor", true).unwrap();
    assert_eq!(a, "recording_monitor");
    assert_eq!(b, "recording_monitor_1");

    let file = read_file(tmp.path());
    let ids: Vec<&str> = file["s"]["multiviews"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(ids, ["default", "recording_monitor", "recording_monitor_1"]);
}

#[test]
fn temporary_instance_is_gone_after_reload() {
    let tmp = tempfile::TempDir::new().unwrap();
    let mut mgr = manager_at(tmp.path(), "s");
    mgr.load();
    mgr.create_multiview("Temp", false).unwrap();
    mgr.save().unwrap();
    mgr.load();
    assert!(mgr.registry().get("temp").is_none());
}

// =============================================================================
// B. Loading guard
// =============================================================================

#[test]
fn widgets_load_while_flag_is_held() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("layout.json"),
        json!({"s": {"multiviews": {"a": {"name": "A"}, "b": {"name": "B"}}, "dock": {"d": 1}}})
            .to_string(),
    )
    .unwrap();

    let factory = RecordingFactory::default();
    let seen = Arc::clone(&factory.seen);
    let flag_slot = Arc::clone(&factory.flag);
    let mut mgr = MultiviewManager::new(
        StaticHost::new("s", tmp.path()),
        StorageConfig::default(),
        Box::new(factory),
    );
    *flag_slot.lock().unwrap() = Some(mgr.loading_flag());

    mgr.load();
    let seen = seen.lock().unwrap().clone();
    // Two instances plus the dock.
    assert_eq!(seen, [true, true, true]);
    assert!(!mgr.is_loading());
}

#[test]
fn host_save_hook_during_load_leaves_file_untouched() {
    let tmp = tempfile::TempDir::new().unwrap();
    let original = json!({"s": [{"w": 1}, {"d": 1}]}).to_string();
    std::fs::write(tmp.path().join("layout.json"), &original).unwrap();

    let mut handler = LifecycleHandler::new();
    let mut mgr = manager_at(tmp.path(), "s");
    let flag = mgr.loading_flag();
    let _guard = flag.enter().unwrap();

    let outcome = handler.dispatch(&mut mgr, HostEvent::AboutToPersist);
    assert!(matches!(
        outcome,
        EventOutcome::Saved(SaveOutcome::SkippedWhileLoading)
    ));
    assert!(mgr.document().is_empty());
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("layout.json")).unwrap(),
        original
    );

    let reload = handler.dispatch(&mut mgr, HostEvent::WorkspaceChanged);
    assert!(matches!(reload, EventOutcome::Loaded(LoadOutcome::AlreadyLoading)));
}

// =============================================================================
// C. Migration scenario
// =============================================================================

#[test]
fn legacy_file_is_rewritten_in_object_form_on_save() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("layout.json"),
        json!({"sceneA": [{"w": 1}, {"d": 1}], "sceneB": [{"w": 2}]}).to_string(),
    )
    .unwrap();

    let mut mgr = manager_at(tmp.path(), "sceneA");
    let outcome = mgr.load();
    assert_eq!(outcome.report().unwrap().shape, EntryShape::Migrated);
    mgr.save().unwrap();

    let file = read_file(tmp.path());
    assert_eq!(
        file["sceneA"],
        json!({
            "multiviews": {
                "default": {"name": "Main Window", "persistent": true, "visible": false, "layout": {"w": 1}}
            },
            "dock": {"d": 1}
        })
    );
    // Only the active workspace is migrated by a load.
    assert_eq!(file["sceneB"], json!([{"w": 2}]));

    let mut again = manager_at(tmp.path(), "sceneA");
    assert_eq!(again.load().report().unwrap().shape, EntryShape::Current);
    assert_eq!(again.registry().ids(), ["default"]);
}

#[test]
fn removing_default_clears_alias_and_persists() {
    let tmp = tempfile::TempDir::new().unwrap();
    let mut mgr = manager_at(tmp.path(), "s");
    mgr.load();
    mgr.create_multiview("Other", true).unwrap();
    assert!(mgr.remove_multiview("default"));
    assert!(mgr.registry().legacy_default().is_none());
    mgr.save().unwrap();

    mgr.load();
    assert_eq!(mgr.registry().ids(), ["other"]);
    assert!(mgr.registry().legacy_default().is_none());
}

// =============================================================================
// D. Degraded reads
// =============================================================================

#[test]
fn corrupt_file_degrades_and_is_backed_up() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::write(tmp.path().join("layout.json"), "{\"s\": [").unwrap();

    let mut mgr = manager_at(tmp.path(), "s");
    let outcome = mgr.load();
    let report = outcome.report().unwrap();
    assert!(matches!(report.source, DocumentSource::Corrupt(_)));
    assert!(report.fallback_created);
    assert!(tmp.path().join("layout.json.corrupt").exists());

    mgr.save().unwrap();
    assert!(read_file(tmp.path())["s"]["multiviews"]["default"].is_object());
}

// =============================================================================
// E. Workspace switching
// =============================================================================

#[test]
fn switching_workspaces_keeps_entries_apart() {
    let tmp = tempfile::TempDir::new().unwrap();
    let mut handler = LifecycleHandler::new();
    let mut mgr = manager_at(tmp.path(), "alpha");

    handler.dispatch(&mut mgr, HostEvent::StartupComplete);
    mgr.create_multiview("Alpha Wall", true).unwrap();

    handler.dispatch(&mut mgr, HostEvent::WorkspaceChanging);
    mgr.host_mut().set_workspace("beta");
    handler.dispatch(&mut mgr, HostEvent::WorkspaceChanged);
    mgr.create_multiview("Beta Wall", true).unwrap();
    handler.dispatch(&mut mgr, HostEvent::AboutToPersist);

    let file = read_file(tmp.path());
    assert!(file["alpha"]["multiviews"]["alpha_wall"].is_object());
    assert!(file["alpha"]["multiviews"].get("beta_wall").is_none());
    assert!(file["beta"]["multiviews"]["beta_wall"].is_object());

    handler.dispatch(&mut mgr, HostEvent::Shutdown);
    assert!(mgr.registry().is_empty());
    assert!(matches!(
        handler.dispatch(&mut mgr, HostEvent::StartupComplete),
        EventOutcome::Ignored
    ));
}

#[test]
fn host_save_hook_mid_switch_keeps_outgoing_layouts() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("layout.json"),
        json!({"a": {"multiviews": {"wall": {
            "name": "Wall",
            "persistent": true,
            "visible": false,
            "layout": {"grid": {"columns": 2, "rows": 1},
                       "items": [{"source": "cam1"}, {"source": "cam2"}]}
        }}}})
        .to_string(),
    )
    .unwrap();
    let mut handler = LifecycleHandler::new();
    let mut mgr = manager_at(tmp.path(), "a");

    handler.dispatch(&mut mgr, HostEvent::StartupComplete);
    handler.dispatch(&mut mgr, HostEvent::WorkspaceChanging);
    let outcome = handler.dispatch(&mut mgr, HostEvent::AboutToPersist);
    assert!(matches!(
        outcome,
        EventOutcome::Saved(SaveOutcome::SkippedWhileSwitching)
    ));
    assert_eq!(
        read_file(tmp.path())["a"]["multiviews"]["wall"]["layout"]["items"],
        json!([{"source": "cam1"}, {"source": "cam2"}])
    );

    mgr.host_mut().set_workspace("b");
    handler.dispatch(&mut mgr, HostEvent::WorkspaceChanged);
    assert!(!mgr.is_switching());
    assert!(matches!(
        handler.dispatch(&mut mgr, HostEvent::AboutToPersist),
        EventOutcome::Saved(SaveOutcome::Written(_))
    ));
    let file = read_file(tmp.path());
    assert_eq!(
        file["a"]["multiviews"]["wall"]["layout"]["items"],
        json!([{"source": "cam1"}, {"source": "cam2"}])
    );
    assert!(file["b"]["multiviews"]["default"].is_object());
}

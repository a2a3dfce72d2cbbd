//! Authoritative in-memory registry of multiview instances.
//!
//! The registry exclusively owns every instance and its widget. Removing an
//! instance drops it, which releases its widget exactly once. The legacy
//! default alias is not stored anywhere: [`MultiviewRegistry::legacy_default`]
//! looks up the reserved id each time, so it can never dangle.

use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use crate::document::{DEFAULT_INSTANCE_ID, LayoutPayload, MultiviewRecord};
use crate::widget::{MultiviewWidget, WidgetFactory};

/// Base id for a display name: lower-cased, spaces become underscores.
#[must_use]
pub fn base_id_for(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// One named multiview and the widget it owns.
pub struct MultiviewInstance {
    id: String,
    name: String,
    persistent: bool,
    widget: Box<dyn MultiviewWidget>,
}

impl MultiviewInstance {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    #[must_use]
    pub fn widget(&self) -> &dyn MultiviewWidget {
        self.widget.as_ref()
    }

    pub fn widget_mut(&mut self) -> &mut dyn MultiviewWidget {
        self.widget.as_mut()
    }

    /// Persisted form of the live state.
    #[must_use]
    pub fn to_record(&self) -> MultiviewRecord {
        MultiviewRecord {
            name: self.name.clone(),
            persistent: self.persistent,
            visible: self.widget.is_visible(),
            layout: serde_json::Value::Object(self.widget.save()),
        }
    }
}

impl fmt::Debug for MultiviewInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiviewInstance")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("persistent", &self.persistent)
            .field("visible", &self.widget.is_visible())
            .finish()
    }
}

/// Instance id → instance, in insertion order.
pub struct MultiviewRegistry {
    instances: IndexMap<String, MultiviewInstance>,
    factory: Box<dyn WidgetFactory>,
}

impl fmt::Debug for MultiviewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiviewRegistry")
            .field("instances", &self.instances)
            .finish()
    }
}

impl MultiviewRegistry {
    #[must_use]
    pub fn new(factory: Box<dyn WidgetFactory>) -> Self {
        Self {
            instances: IndexMap::new(),
            factory,
        }
    }

    pub fn factory_mut(&mut self) -> &mut dyn WidgetFactory {
        self.factory.as_mut()
    }

    /// First free id for `name`: the base id, then `_1`, `_2`, ...
    #[must_use]
    pub fn unique_id_for(&self, name: &str) -> String {
        let base = base_id_for(name);
        if !self.instances.contains_key(&base) {
            return base;
        }
        (1usize..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| !self.instances.contains_key(candidate))
            .unwrap_or(base)
    }

    /// Create a new instance with a generated id and a default layout.
    pub fn create(&mut self, name: &str, persistent: bool) -> &MultiviewInstance {
        let id = self.unique_id_for(name);
        let mut widget = self.factory.create_widget();
        widget.set_title(name);
        widget.create_display(true);
        widget.create_default_layout();

        debug!(instance_id = %id, name, persistent, "Multiview created");
        self.insert(MultiviewInstance {
            id,
            name: name.to_string(),
            persistent,
            widget,
        })
    }

    /// Rebuild an instance from its persisted record under a known id.
    ///
    /// An existing instance with the same id is replaced (and released).
    pub fn restore(&mut self, id: &str, record: &MultiviewRecord) -> &MultiviewInstance {
        let mut widget = self.factory.create_widget();
        widget.set_title(&record.name);
        widget.create_display(true);
        widget.load(&record.layout_payload());
        widget.set_visible(record.visible);

        self.insert(MultiviewInstance {
            id: id.to_string(),
            name: record.name.clone(),
            persistent: record.persistent,
            widget,
        })
    }

    fn insert(&mut self, instance: MultiviewInstance) -> &MultiviewInstance {
        let (index, _previous) = self.instances.insert_full(instance.id.clone(), instance);
        &self.instances[index]
    }

    /// Remove and release an instance. Returns false when the id is unknown.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.instances.shift_remove(id) {
            Some(instance) => {
                debug!(instance_id = %id, "Multiview removed");
                drop(instance);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&MultiviewInstance> {
        self.instances.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut MultiviewInstance> {
        self.instances.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }

    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.instances.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MultiviewInstance> {
        self.instances.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MultiviewInstance> {
        self.instances.values_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Release every instance.
    pub fn clear(&mut self) {
        if !self.instances.is_empty() {
            debug!(count = self.instances.len(), "Clearing multiview registry");
        }
        self.instances.clear();
    }

    /// Change the display name and widget title. The id stays put.
    pub fn rename(&mut self, id: &str, new_name: &str) -> bool {
        let Some(instance) = self.instances.get_mut(id) else {
            return false;
        };
        instance.name = new_name.to_string();
        instance.widget.set_title(new_name);
        debug!(instance_id = %id, name = new_name, "Multiview renamed");
        true
    }

    /// Create a copy of `id` carrying its current live layout.
    ///
    /// The copy inherits the source's persistence unless overridden.
    pub fn duplicate(
        &mut self,
        id: &str,
        new_name: &str,
        persistent_override: Option<bool>,
    ) -> Option<&MultiviewInstance> {
        let source = self.instances.get(id)?;
        let layout: LayoutPayload = source.widget.save();
        let persistent = persistent_override.unwrap_or(source.persistent);

        let new_id = self.create(new_name, persistent).id.clone();
        let copy = self.instances.get_mut(&new_id)?;
        copy.widget.load(&layout);
        debug!(instance_id = %new_id, source = %id, "Multiview duplicated");
        self.instances.get(&new_id)
    }

    /// The instance under the reserved `"default"` id, resolved on every call.
    #[must_use]
    pub fn legacy_default(&self) -> Option<&MultiviewInstance> {
        self.instances.get(DEFAULT_INSTANCE_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{HeadlessFactory, WidgetLedger};
    use serde_json::json;

    fn registry() -> (MultiviewRegistry, WidgetLedger) {
        let factory = HeadlessFactory::new();
        let ledger = factory.ledger();
        (MultiviewRegistry::new(Box::new(factory)), ledger)
    }

    #[test]
    fn base_id_lowercases_and_replaces_spaces() {
        assert_eq!(base_id_for("Recording Monitor"), "recording_monitor");
        assert_eq!(base_id_for("A  B"), "a__b");
        assert_eq!(base_id_for("Main"), "main");
    }

    #[test]
    fn colliding_names_get_sequential_suffixes() {
        let (mut reg, _) = registry();
        assert_eq!(reg.create("Recording Monitor", true).id(), "recording_monitor");
        assert_eq!(reg.create("Recording Monitor", true).id(), "recording_monitor_1");
        // A different name that normalizes to the same base continues the sequence.
        assert_eq!(reg.create("recording monitor", true).id(), "recording_monitor_2");
        assert_eq!(reg.ids(), ["recording_monitor", "recording_monitor_1", "recording_monitor_2"]);
    }

    #[test]
    fn freed_ids_are_reused() {
        let (mut reg, _) = registry();
        reg.create("Cam", true);
        reg.create("Cam", true);
        assert!(reg.remove("cam"));
        assert_eq!(reg.create("Cam", true).id(), "cam");
    }

    #[test]
    fn create_applies_title_and_default_layout() {
        let (mut reg, _) = registry();
        let instance = reg.create("Stage", false);
        assert_eq!(instance.name(), "Stage");
        assert!(!instance.is_persistent());
        assert!(!instance.widget().is_visible());
        assert!(!instance.widget().save().is_empty());
    }

    #[test]
    fn create_and_restore_force_the_display() {
        let (mut reg, ledger) = registry();
        reg.create("Stage", true);
        assert_eq!(ledger.forced_displays(), 1);
        reg.restore("wall", &MultiviewRecord::default());
        assert_eq!(ledger.forced_displays(), 2);
        // Forcing the display does not show the window.
        assert!(!reg.get("stage").unwrap().widget().is_visible());
    }

    #[test]
    fn remove_releases_widget_exactly_once() {
        let (mut reg, ledger) = registry();
        reg.create("One", true);
        reg.create("Two", true);
        assert!(reg.remove("one"));
        assert_eq!(ledger.released(), 1);
        assert!(!reg.remove("one"));
        assert_eq!(ledger.released(), 1);
        assert_eq!(reg.ids(), ["two"]);
    }

    #[test]
    fn clear_releases_everything() {
        let (mut reg, ledger) = registry();
        reg.create("One", true);
        reg.create("Two", false);
        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(ledger.live(), 0);
    }

    #[test]
    fn legacy_alias_follows_the_reserved_id() {
        let (mut reg, _) = registry();
        assert!(reg.legacy_default().is_none());
        reg.restore(DEFAULT_INSTANCE_ID, &MultiviewRecord::default());
        assert!(reg.legacy_default().is_some());
        reg.remove(DEFAULT_INSTANCE_ID);
        assert!(reg.legacy_default().is_none());
    }

    #[test]
    fn restore_applies_record() {
        let (mut reg, _) = registry();
        let record = MultiviewRecord::from(json!({
            "name": "Wall",
            "persistent": false,
            "visible": true,
            "layout": {"w": 1}
        }));
        let instance = reg.restore("wall", &record);
        assert_eq!(instance.name(), "Wall");
        assert!(!instance.is_persistent());
        assert!(instance.widget().is_visible());
        assert_eq!(instance.widget().save()["w"], 1);
        assert_eq!(instance.to_record(), record);
    }

    #[test]
    fn restore_replaces_same_id_in_place() {
        let (mut reg, ledger) = registry();
        reg.create("A", true);
        reg.create("B", true);
        reg.restore("a", &MultiviewRecord::from(json!({"name": "A2"})));
        assert_eq!(reg.ids(), ["a", "b"]);
        assert_eq!(reg.get("a").unwrap().name(), "A2");
        assert_eq!(ledger.released(), 1);
    }

    #[test]
    fn rename_keeps_id() {
        let (mut reg, _) = registry();
        reg.create("Old", true);
        assert!(reg.rename("old", "New Name"));
        let instance = reg.get("old").unwrap();
        assert_eq!(instance.name(), "New Name");
        assert!(!reg.rename("missing", "x"));
    }

    #[test]
    fn duplicate_copies_live_layout_and_persistence() {
        let (mut reg, _) = registry();
        reg.create("Src", false);
        let mut layout = LayoutPayload::new();
        layout.insert("cells".to_string(), json!([1, 2, 3]));
        reg.get_mut("src").unwrap().widget_mut().load(&layout);

        let copy = reg.duplicate("src", "Src (Copy)", None).unwrap();
        assert_eq!(copy.id(), "src_(copy)");
        assert!(!copy.is_persistent());
        assert_eq!(copy.widget().save(), layout);

        let forced = reg.duplicate("src", "Kept", Some(true)).unwrap();
        assert!(forced.is_persistent());

        assert!(reg.duplicate("nope", "X", None).is_none());
        assert_eq!(reg.len(), 3);
    }
}

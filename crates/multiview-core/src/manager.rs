//! Load/save orchestration.
//!
//! [`MultiviewManager`] is the service object that ties the document store,
//! the migration engine, the registry and the dock together. It is created
//! once by the embedding host and passed around by `&mut`.
//!
//! # Loading guard
//!
//! While [`MultiviewManager::load`] runs, the shared [`LoadingFlag`] is held.
//! Widgets restoring their layout may make the host fire its save hook; any
//! save attempted during that window is dropped so that a half-built
//! registry never overwrites the document.
//!
//! # Workspace switch
//!
//! [`MultiviewManager::clear_transient`] empties the live layouts of the
//! outgoing workspace. From then until the next completed load, saves are
//! dropped as well, so the cleared state never replaces the saved entry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::StorageConfig;
use crate::dock::DockView;
use crate::document::{
    DEFAULT_INSTANCE_ID, DEFAULT_INSTANCE_NAME, DocumentSource, LayoutDocument, LayoutStore,
    MultiviewRecord, WorkspaceEntry, WriteReport,
};
use crate::error::Result;
use crate::host::Host;
use crate::migration::{EntryShape, migrate_document, migrate_workspace_entry};
use crate::registry::MultiviewRegistry;
use crate::widget::WidgetFactory;

// =============================================================================
// Loading flag
// =============================================================================

/// Shareable, non-reentrant "loading in progress" flag.
#[derive(Debug, Clone, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the loading state. `None` if it is already held.
    #[must_use]
    pub fn enter(&self) -> Option<LoadingGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LoadingGuard(Arc::clone(&self.0)))
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Holds the loading state; leaving scope (including by unwinding) resets it.
#[derive(Debug)]
pub struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// What a completed load did.
#[derive(Debug)]
pub struct LoadReport {
    pub workspace: String,
    /// How the document read resolved.
    pub source: DocumentSource,
    /// Shape of the workspace entry before normalization.
    pub shape: EntryShape,
    /// Instances rebuilt from records.
    pub restored: usize,
    /// Whether the empty-registry fallback instance was created.
    pub fallback_created: bool,
    /// Whether a persisted dock layout was applied.
    pub dock_restored: bool,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(LoadReport),
    /// Another load holds the loading flag; nothing was touched.
    AlreadyLoading,
}

impl LoadOutcome {
    #[must_use]
    pub fn report(&self) -> Option<&LoadReport> {
        match self {
            Self::Loaded(report) => Some(report),
            Self::AlreadyLoading => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written(WriteReport),
    /// Dropped because a load was in progress.
    SkippedWhileLoading,
    /// Dropped between a workspace switch starting and the reload.
    SkippedWhileSwitching,
}

// =============================================================================
// Manager
// =============================================================================

/// Owns the registry, the dock and the cached document for one host.
pub struct MultiviewManager<H: Host> {
    host: H,
    storage: StorageConfig,
    document: LayoutDocument,
    registry: MultiviewRegistry,
    dock: DockView,
    loading: LoadingFlag,
    switching: bool,
}

impl<H: Host> std::fmt::Debug for MultiviewManager<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiviewManager")
            .field("storage", &self.storage)
            .field("registry", &self.registry)
            .field("dock", &self.dock)
            .field("loading", &self.loading.is_loading())
            .field("switching", &self.switching)
            .finish_non_exhaustive()
    }
}

impl<H: Host> MultiviewManager<H> {
    pub fn new(host: H, storage: StorageConfig, mut factory: Box<dyn WidgetFactory>) -> Self {
        let dock = DockView::new(factory.create_dock_widget());
        Self {
            host,
            storage,
            document: LayoutDocument::new(),
            registry: MultiviewRegistry::new(factory),
            dock,
            loading: LoadingFlag::new(),
            switching: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn registry(&self) -> &MultiviewRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MultiviewRegistry {
        &mut self.registry
    }

    pub fn dock(&self) -> &DockView {
        &self.dock
    }

    /// Cached copy of the whole document as last read or written.
    pub fn document(&self) -> &LayoutDocument {
        &self.document
    }

    /// Handle to the loading flag, for hooks that may fire during a load.
    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// Whether a workspace switch started and the reload has not run yet.
    pub fn is_switching(&self) -> bool {
        self.switching
    }

    pub fn workspace(&self) -> String {
        self.host.current_workspace()
    }

    /// Store for the current module directory.
    pub fn store(&self) -> LayoutStore {
        LayoutStore::new(self.storage.layout_path(&self.host.module_dir()))
            .with_pretty(self.storage.pretty)
            .with_backup_corrupt(self.storage.backup_corrupt)
    }

    /// Replace the registry and dock state with the active workspace's entry.
    pub fn load(&mut self) -> LoadOutcome {
        let Some(_guard) = self.loading.enter() else {
            warn!("Load requested while a load is already running; ignored");
            return LoadOutcome::AlreadyLoading;
        };

        let workspace = self.host.current_workspace();
        let read = self.store().read();
        self.document = read.document;

        let outcome = migrate_workspace_entry(&mut self.document, &workspace);
        let WorkspaceEntry { multiviews, dock } = outcome.entry;

        self.registry.clear();
        for (id, record) in &multiviews {
            self.registry.restore(id, record);
        }
        let restored = self.registry.len();

        let fallback_created = self.registry.is_empty();
        if fallback_created {
            let record = MultiviewRecord {
                name: DEFAULT_INSTANCE_NAME.to_string(),
                ..MultiviewRecord::default()
            };
            self.registry.restore(DEFAULT_INSTANCE_ID, &record);
            if let Some(instance) = self.registry.get_mut(DEFAULT_INSTANCE_ID) {
                instance.widget_mut().create_default_layout();
            }
        }

        let factory = self.registry.factory_mut();
        self.dock.attach_with(|| factory.create_dock_widget());
        let dock_payload = WorkspaceEntry {
            dock,
            ..WorkspaceEntry::default()
        }
        .dock_payload();
        let dock_restored = self.dock.apply(dock_payload.as_ref());
        self.switching = false;

        info!(
            workspace = %workspace,
            restored,
            fallback_created,
            dock_restored,
            "Multiview layouts loaded"
        );

        LoadOutcome::Loaded(LoadReport {
            workspace,
            source: read.source,
            shape: outcome.shape,
            restored,
            fallback_created,
            dock_restored,
        })
    }

    /// Current workspace entry built from live state. Temporary instances are left out.
    pub fn snapshot_entry(&self) -> WorkspaceEntry {
        let multiviews = self
            .registry
            .iter()
            .filter(|instance| instance.is_persistent())
            .map(|instance| (instance.id().to_string(), instance.to_record()))
            .collect();

        let dock = match self.dock.save() {
            Some(layout) => Some(Value::Object(layout)),
            None => self
                .document
                .entry(&self.host.current_workspace())
                .cloned()
                .and_then(|raw| WorkspaceEntry::from(raw).dock),
        };

        WorkspaceEntry { multiviews, dock }
    }

    /// Write the live state of the current workspace into the document.
    ///
    /// Dropped while a load is in progress and during a workspace switch.
    /// On a write failure the cached document still holds the new entry and
    /// the previous file is kept.
    pub fn save(&mut self) -> Result<SaveOutcome> {
        if self.loading.is_loading() {
            info!("Save requested while loading layouts; skipped");
            return Ok(SaveOutcome::SkippedWhileLoading);
        }
        if self.switching {
            info!("Save requested during a workspace switch; skipped");
            return Ok(SaveOutcome::SkippedWhileSwitching);
        }

        let workspace = self.host.current_workspace();
        let entry = self.snapshot_entry();
        debug!(
            workspace = %workspace,
            instances = entry.multiviews.len(),
            "Saving multiview layouts"
        );
        self.document.set_entry(&workspace, entry.to_value());

        match self.store().write(&self.document) {
            Ok(report) => {
                info!(workspace = %workspace, path = %report.path.display(), bytes = report.bytes, "Multiview layouts saved");
                Ok(SaveOutcome::Written(report))
            }
            Err(err) => {
                error!(workspace = %workspace, error = %err, "Failed to save multiview layouts");
                Err(err.into())
            }
        }
    }

    /// Rewrite every legacy entry in the cached document. Returns the migrated workspaces.
    pub fn migrate_all(&mut self) -> Vec<String> {
        let migrated = migrate_document(&mut self.document);
        if !migrated.is_empty() {
            info!(count = migrated.len(), "Migrated legacy workspace entries");
        }
        migrated
    }

    /// Drop transient per-item state ahead of a workspace switch.
    ///
    /// Saves are skipped until the next load completes.
    pub fn clear_transient(&mut self) {
        self.switching = true;
        for instance in self.registry.iter_mut() {
            instance.widget_mut().clear_layout();
        }
        self.dock.clear_layout();
    }

    /// Show the dock with the layout cached for the current workspace.
    pub fn show_dock(&mut self) {
        let workspace = self.host.current_workspace();
        let payload = migrate_workspace_entry(&mut self.document, &workspace)
            .entry
            .dock_payload();
        let factory = self.registry.factory_mut();
        self.dock.attach_with(|| factory.create_dock_widget());
        self.dock.show(payload.as_ref());
    }

    /// Persist, then tear down the dock's layout and display.
    pub fn close_dock(&mut self) -> Result<SaveOutcome> {
        let saved = self.save();
        self.dock.close();
        saved
    }

    /// Release every instance and the dock. Never saves.
    pub fn shutdown(&mut self) {
        self.registry.clear();
        self.dock.release();
        debug!("Multiview manager shut down");
    }
}

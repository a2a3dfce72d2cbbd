//! Rendering widget seam.
//!
//! The widget that actually draws a grid of sources lives in the host. The
//! core talks to it only through [`MultiviewWidget`] and never looks inside
//! the layout payload. Dropping a widget releases it.
//!
//! [`HeadlessWidget`] keeps the payload in memory and is what the CLI and
//! the tests run against.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

use crate::document::LayoutPayload;

/// Contract of a multiview window (or the dock's embedded view).
pub trait MultiviewWidget {
    /// Materialize the display surface. `force_visible` connects rendering
    /// even while the window stays hidden.
    fn create_display(&mut self, force_visible: bool);
    fn delete_display(&mut self);
    /// Replace the current layout with `layout`.
    fn load(&mut self, layout: &LayoutPayload);
    /// Serialize the current live layout.
    fn save(&self) -> LayoutPayload;
    fn create_default_layout(&mut self);
    /// Drop per-item transient state while keeping the widget alive.
    fn clear_layout(&mut self);
    fn delete_layout(&mut self);
    fn set_visible(&mut self, visible: bool);
    fn is_visible(&self) -> bool;
    fn set_title(&mut self, title: &str);
    /// Show, raise and focus.
    fn present(&mut self);
}

/// Produces widgets for new instances and for the dock.
pub trait WidgetFactory {
    fn create_widget(&mut self) -> Box<dyn MultiviewWidget>;

    fn create_dock_widget(&mut self) -> Box<dyn MultiviewWidget> {
        self.create_widget()
    }
}

// =============================================================================
// Headless implementation
// =============================================================================

#[derive(Debug, Default)]
struct LedgerCounters {
    created: AtomicUsize,
    released: AtomicUsize,
    presented: AtomicUsize,
    forced_displays: AtomicUsize,
}

/// Shared counters of widget creation and release.
#[derive(Debug, Clone, Default)]
pub struct WidgetLedger(Arc<LedgerCounters>);

impl WidgetLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> usize {
        self.0.created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.0.released.load(Ordering::SeqCst)
    }

    /// Widgets created and not yet released.
    pub fn live(&self) -> usize {
        self.created() - self.released()
    }

    pub fn presented(&self) -> usize {
        self.0.presented.load(Ordering::SeqCst)
    }

    /// Displays created with rendering forced on.
    pub fn forced_displays(&self) -> usize {
        self.0.forced_displays.load(Ordering::SeqCst)
    }
}

/// In-memory widget: the layout is just a JSON object.
#[derive(Debug)]
pub struct HeadlessWidget {
    title: String,
    layout: LayoutPayload,
    visible: bool,
    has_display: bool,
    ledger: WidgetLedger,
}

impl HeadlessWidget {
    #[must_use]
    pub fn new(ledger: WidgetLedger) -> Self {
        ledger.0.created.fetch_add(1, Ordering::SeqCst);
        Self {
            title: String::new(),
            layout: LayoutPayload::new(),
            visible: false,
            has_display: false,
            ledger,
        }
    }

    /// Layout applied by [`MultiviewWidget::create_default_layout`]: an empty 2×2 grid.
    #[must_use]
    pub fn default_layout() -> LayoutPayload {
        match json!({"grid": {"columns": 2, "rows": 2}, "items": []}) {
            Value::Object(obj) => obj,
            _ => LayoutPayload::new(),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn has_display(&self) -> bool {
        self.has_display
    }
}

impl MultiviewWidget for HeadlessWidget {
    fn create_display(&mut self, force_visible: bool) {
        self.has_display = true;
        if force_visible {
            self.ledger.0.forced_displays.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn delete_display(&mut self) {
        self.has_display = false;
    }

    fn load(&mut self, layout: &LayoutPayload) {
        self.layout = layout.clone();
    }

    fn save(&self) -> LayoutPayload {
        self.layout.clone()
    }

    fn create_default_layout(&mut self) {
        self.layout = Self::default_layout();
    }

    fn clear_layout(&mut self) {
        // Items hold no transient resources here; keep the grid, drop the items.
        if let Some(Value::Array(items)) = self.layout.get_mut("items") {
            items.clear();
        }
    }

    fn delete_layout(&mut self) {
        self.layout.clear();
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn present(&mut self) {
        self.visible = true;
        self.ledger.0.presented.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for HeadlessWidget {
    fn drop(&mut self) {
        self.ledger.0.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Factory for [`HeadlessWidget`]s sharing one ledger.
#[derive(Debug, Clone, Default)]
pub struct HeadlessFactory {
    ledger: WidgetLedger,
}

impl HeadlessFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ledger(&self) -> WidgetLedger {
        self.ledger.clone()
    }
}

impl WidgetFactory for HeadlessFactory {
    fn create_widget(&mut self) -> Box<dyn MultiviewWidget> {
        Box::new(HeadlessWidget::new(self.ledger.clone()))
    }
}

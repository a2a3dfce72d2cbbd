//! The legacy dock view.
//!
//! A single multiview embedded in the host's dock area. It is not part of
//! the registry; its layout lives under the `dock` key of a workspace entry.

use std::fmt;

use tracing::debug;

use crate::document::LayoutPayload;
use crate::widget::MultiviewWidget;

/// Singleton dock view. The widget is absent once released at shutdown.
#[derive(Default)]
pub struct DockView {
    widget: Option<Box<dyn MultiviewWidget>>,
}

impl fmt::Debug for DockView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DockView")
            .field("attached", &self.widget.is_some())
            .field("visible", &self.is_visible())
            .finish()
    }
}

impl DockView {
    #[must_use]
    pub fn new(widget: Box<dyn MultiviewWidget>) -> Self {
        Self {
            widget: Some(widget),
        }
    }

    /// Replace the widget if it was released.
    pub fn attach_with(&mut self, make: impl FnOnce() -> Box<dyn MultiviewWidget>) {
        if self.widget.is_none() {
            self.widget = Some(make());
        }
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.widget.is_some()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.widget.as_ref().is_some_and(|w| w.is_visible())
    }

    /// Apply the persisted dock layout, or hide with a default layout when
    /// there is none. Returns true when a persisted layout was applied.
    pub fn apply(&mut self, layout: Option<&LayoutPayload>) -> bool {
        let Some(widget) = self.widget.as_mut() else {
            return false;
        };
        if let Some(layout) = layout {
            widget.load(layout);
            true
        } else {
            widget.set_visible(false);
            widget.create_default_layout();
            false
        }
    }

    /// Current live layout, if the widget is still attached.
    #[must_use]
    pub fn save(&self) -> Option<LayoutPayload> {
        self.widget.as_ref().map(|w| w.save())
    }

    /// Show the dock with the given layout (default layout when absent).
    pub fn show(&mut self, layout: Option<&LayoutPayload>) {
        let Some(widget) = self.widget.as_mut() else {
            return;
        };
        widget.create_display(false);
        match layout {
            Some(layout) => widget.load(layout),
            None => widget.create_default_layout(),
        }
        widget.set_visible(true);
        debug!("Dock shown");
    }

    /// Tear down layout and display after the dock was closed.
    pub fn close(&mut self) {
        let Some(widget) = self.widget.as_mut() else {
            return;
        };
        widget.set_visible(false);
        widget.delete_layout();
        widget.delete_display();
        debug!("Dock closed");
    }

    pub fn clear_layout(&mut self) {
        if let Some(widget) = self.widget.as_mut() {
            widget.clear_layout();
        }
    }

    /// Drop the widget.
    pub fn release(&mut self) {
        self.widget = None;
    }
}

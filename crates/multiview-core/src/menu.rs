//! Model of the host's tools submenu.
//!
//! The submenu is rebuilt from the registry after every mutation: two fixed
//! actions, a separator, then one entry per instance in registry order.

use serde::Serialize;

use crate::registry::MultiviewRegistry;

pub const NEW_WINDOW_LABEL: &str = "New Multiview Window...";
pub const MANAGE_WINDOWS_LABEL: &str = "Manage Windows...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuItem {
    /// Opens the new-window dialog.
    NewWindow { label: String },
    /// Opens the window manager list.
    ManageWindows { label: String },
    Separator,
    /// Shows, raises and focuses one instance.
    ShowInstance { id: String, label: String },
}

impl MenuItem {
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::NewWindow { label }
            | Self::ManageWindows { label }
            | Self::ShowInstance { label, .. } => Some(label),
            Self::Separator => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolsMenu {
    pub items: Vec<MenuItem>,
}

impl ToolsMenu {
    #[must_use]
    pub fn build(registry: &MultiviewRegistry) -> Self {
        let mut items = vec![
            MenuItem::NewWindow {
                label: NEW_WINDOW_LABEL.to_string(),
            },
            MenuItem::ManageWindows {
                label: MANAGE_WINDOWS_LABEL.to_string(),
            },
            MenuItem::Separator,
        ];
        items.extend(registry.iter().map(|instance| MenuItem::ShowInstance {
            id: instance.id().to_string(),
            label: instance.name().to_string(),
        }));
        Self { items }
    }

    /// Ids of the per-instance entries, in menu order.
    #[must_use]
    pub fn instance_ids(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match item {
                MenuItem::ShowInstance { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }
}

//! Host-facing commands: the operations behind the new-window dialog and the
//! window manager list.
//!
//! Names coming from the user are trimmed and must not be empty. Lookups of
//! unknown ids are not errors; they report `false` / `None`.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::host::Host;
use crate::manager::MultiviewManager;
use crate::menu::ToolsMenu;

/// Suffix shown after temporary instances in lists.
pub const TEMPORARY_SUFFIX: &str = " (Temporary)";

/// Suffix of the suggested name for a duplicate.
pub const COPY_SUFFIX: &str = " (Copy)";

/// One row of the window manager list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSummary {
    pub id: String,
    pub name: String,
    pub persistent: bool,
}

impl InstanceSummary {
    /// List text; temporary instances are marked.
    #[must_use]
    pub fn display_text(&self) -> String {
        if self.persistent {
            self.name.clone()
        } else {
            format!("{}{TEMPORARY_SUFFIX}", self.name)
        }
    }
}

/// Trim a user-supplied display name, rejecting empty ones.
pub fn validate_display_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_string())
}

#[must_use]
pub fn suggested_duplicate_name(name: &str) -> String {
    format!("{name}{COPY_SUFFIX}")
}

impl<H: Host> MultiviewManager<H> {
    /// Every instance in registry order.
    pub fn summaries(&self) -> Vec<InstanceSummary> {
        self.registry()
            .iter()
            .map(|instance| InstanceSummary {
                id: instance.id().to_string(),
                name: instance.name().to_string(),
                persistent: instance.is_persistent(),
            })
            .collect()
    }

    /// Tools submenu for the current registry contents.
    pub fn tools_menu(&self) -> ToolsMenu {
        ToolsMenu::build(self.registry())
    }

    /// Create an instance and save right away. Returns the new id.
    ///
    /// A failed save is logged; the instance still exists in memory.
    pub fn create_multiview(&mut self, name: &str, persistent: bool) -> Result<String> {
        let name = validate_display_name(name)?;
        let id = self.registry_mut().create(&name, persistent).id().to_string();
        info!(instance_id = %id, name = %name, persistent, "Created multiview");
        if let Err(err) = self.save() {
            warn!(instance_id = %id, error = %err, "Multiview created but not saved");
        }
        Ok(id)
    }

    pub fn rename_multiview(&mut self, id: &str, name: &str) -> Result<bool> {
        let name = validate_display_name(name)?;
        Ok(self.registry_mut().rename(id, &name))
    }

    pub fn remove_multiview(&mut self, id: &str) -> bool {
        let removed = self.registry_mut().remove(id);
        if removed {
            info!(instance_id = %id, "Removed multiview");
        }
        removed
    }

    /// Duplicate `id`, defaulting the name to `"<name> (Copy)"`. Returns the new id.
    pub fn duplicate_multiview(&mut self, id: &str, name: Option<&str>) -> Result<Option<String>> {
        let Some(source) = self.registry().get(id) else {
            return Ok(None);
        };
        let name = match name {
            Some(name) => validate_display_name(name)?,
            None => suggested_duplicate_name(source.name()),
        };
        Ok(self
            .registry_mut()
            .duplicate(id, &name, None)
            .map(|copy| copy.id().to_string()))
    }

    /// Show, raise and focus an instance's window.
    pub fn show_multiview(&mut self, id: &str) -> bool {
        match self.registry_mut().get_mut(id) {
            Some(instance) => {
                instance.widget_mut().present();
                true
            }
            None => false,
        }
    }
}

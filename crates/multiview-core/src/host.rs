//! Host application seam.

use std::path::PathBuf;

/// What the core needs from the host, resolved on demand.
pub trait Host {
    /// Identifier of the active workspace (scene collection).
    fn current_workspace(&self) -> String;

    /// Writable per-module directory that holds the layout document.
    fn module_dir(&self) -> PathBuf;
}

/// Host with a fixed module directory and a settable workspace.
#[derive(Debug, Clone)]
pub struct StaticHost {
    workspace: String,
    module_dir: PathBuf,
}

impl StaticHost {
    #[must_use]
    pub fn new(workspace: impl Into<String>, module_dir: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            module_dir: module_dir.into(),
        }
    }

    /// Switch the active workspace. Takes effect on the next load or save.
    pub fn set_workspace(&mut self, workspace: impl Into<String>) {
        self.workspace = workspace.into();
    }
}

impl Host for StaticHost {
    fn current_workspace(&self) -> String {
        self.workspace.clone()
    }

    fn module_dir(&self) -> PathBuf {
        self.module_dir.clone()
    }
}

//! Host lifecycle events and how the manager reacts to them.
//!
//! The host delivers events through [`LifecycleHandler::dispatch`]. The
//! handler holds a [`Subscription`]; once the subscription is cancelled
//! (at shutdown) every later event is ignored.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::error::Error;
use crate::host::Host;
use crate::manager::{LoadOutcome, MultiviewManager, SaveOutcome};

/// Events the host application emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    /// The host finished loading at startup.
    StartupComplete,
    /// The active workspace is about to change.
    WorkspaceChanging,
    /// A new workspace is active.
    WorkspaceChanged,
    /// The host is exiting.
    Shutdown,
    /// The host's native save hook is about to persist its own state.
    AboutToPersist,
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StartupComplete => "startup_complete",
            Self::WorkspaceChanging => "workspace_changing",
            Self::WorkspaceChanged => "workspace_changed",
            Self::Shutdown => "shutdown",
            Self::AboutToPersist => "about_to_persist",
        };
        f.write_str(name)
    }
}

/// Cloneable cancellation token.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Registration with the host's event source.
#[derive(Debug, Default)]
pub struct Subscription {
    token: CancellationToken,
}

impl Subscription {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Token shared with whoever delivers events.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// What handling an event did.
#[derive(Debug)]
pub enum EventOutcome {
    Loaded(LoadOutcome),
    TransientCleared,
    Saved(SaveOutcome),
    /// The save failed; in-memory state is unchanged and still authoritative.
    SaveFailed(Error),
    ShutDown,
    /// The subscription was already cancelled.
    Ignored,
}

/// Routes host events to the manager.
#[derive(Debug, Default)]
pub struct LifecycleHandler {
    subscription: Subscription,
}

impl LifecycleHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_subscription(subscription: Subscription) -> Self {
        Self { subscription }
    }

    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn dispatch<H: Host>(
        &mut self,
        manager: &mut MultiviewManager<H>,
        event: HostEvent,
    ) -> EventOutcome {
        if !self.subscription.is_active() {
            debug!(%event, "Subscription cancelled; event ignored");
            return EventOutcome::Ignored;
        }
        debug!(%event, workspace = %manager.workspace(), "Host event");

        match event {
            HostEvent::StartupComplete | HostEvent::WorkspaceChanged => {
                EventOutcome::Loaded(manager.load())
            }
            HostEvent::WorkspaceChanging => {
                manager.clear_transient();
                EventOutcome::TransientCleared
            }
            HostEvent::AboutToPersist => match manager.save() {
                Ok(outcome) => EventOutcome::Saved(outcome),
                Err(err) => {
                    warn!(error = %err, "Save on host persist failed");
                    EventOutcome::SaveFailed(err)
                }
            },
            HostEvent::Shutdown => {
                manager.shutdown();
                self.subscription.cancel();
                EventOutcome::ShutDown
            }
        }
    }
}

//! multiview-core: Core library for multiview layouts
//!
//! Manages named, independently persisted multiview layouts owned by a host
//! application, partitioned by the host's active workspace.
//!
//! # Architecture
//!
//! ```text
//! Host event → LifecycleHandler → MultiviewManager → LayoutStore (read)
//!                                        ↓
//!                              migration → MultiviewRegistry → widgets
//! ```
//!
//! Saving runs the other way and is dropped while a load is in progress.
//!
//! # Modules
//!
//! - `document`: layout document schema and the on-disk store
//! - `migration`: legacy array entries to the object schema
//! - `registry`: instance ownership and id assignment
//! - `manager`: load/save orchestration and the loading guard
//! - `lifecycle`: host events and the subscription
//! - `management`: host-facing commands
//! - `menu`: tools submenu model
//! - `dock`: the legacy dock view
//! - `widget`: rendering widget seam and the headless widget
//! - `host`: host seam
//! - `config`: configuration management
//! - `logging`: tracing subscriber setup
//!
//! # Safety
//!
//! This crate forbids unsafe code.

#![forbid(unsafe_code)]

pub mod config;
pub mod dock;
pub mod document;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod logging;
pub mod management;
pub mod manager;
pub mod menu;
pub mod migration;
pub mod registry;
pub mod widget;

pub use error::{Error, Result};

pub use document::{
    DEFAULT_INSTANCE_ID, DEFAULT_INSTANCE_NAME, LayoutDocument, LayoutPayload, LayoutStore,
    MultiviewRecord, WorkspaceEntry,
};
pub use host::{Host, StaticHost};
pub use lifecycle::{EventOutcome, HostEvent, LifecycleHandler, Subscription};
pub use management::InstanceSummary;
pub use manager::{LoadOutcome, LoadReport, LoadingFlag, MultiviewManager, SaveOutcome};
pub use registry::{MultiviewInstance, MultiviewRegistry};
pub use widget::{HeadlessFactory, HeadlessWidget, MultiviewWidget, WidgetFactory};

/// Version of the multiview-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#![forbid(unsafe_code)]

//! Overlays for scrim: stacking, focus trapping, and open/close lifecycle.
//!
//! - [`OverlayManager`]: the per-document overlay stack, shared backdrop,
//!   and capture-phase input routing to the topmost overlay
//! - [`OverlayController`]: one overlay's state machine, driven on
//!   animation frames
//! - [`OverlayConfig`]: the configuration switches, loadable from TOML/JSON
//!   with the `config` feature
//! - [`OverlayEvent`]: `Canceled`, `Opened` and `Closed` notifications
//!
//! # Example
//!
//! ```ignore
//! use scrim_core::Document;
//! use scrim_overlay::{OverlayConfig, OverlayController, OverlayManager};
//!
//! let doc = Document::new();
//! let manager = OverlayManager::new(doc.clone());
//! let host = doc.create_child(doc.body(), "x-dialog")?;
//! let dialog = OverlayController::new(&manager, host)
//!     .with_config(OverlayConfig::new().with_backdrop(true));
//! dialog.attach();
//! dialog.open();
//! manager.frames().run_frame();
//! ```

pub mod config;
pub mod controller;
pub mod manager;
pub mod notify;
pub mod reason;

pub use config::{ConfigError, OverlayConfig};
pub use controller::{Fit, FinishRender, ImmediateRender, NoFit, OverlayController, RenderHooks};
pub use manager::{OverlayId, OverlayManager, StackOverlay, MINIMUM_Z};
pub use notify::{OverlayEvent, OverlayEventKind};
pub use reason::ClosingReason;

#![forbid(unsafe_code)]

//! Single-threaded runtime pieces for scrim overlays.
//!
//! - [`frame`]: owner-keyed animation-frame scheduling with at most one
//!   pending callback per owner
//! - [`reactive`]: observable values, notification signals, and RAII
//!   subscriptions
//! - [`resize`]: the resize notification bus overlays publish on

pub mod frame;
pub mod reactive;
pub mod resize;

pub use frame::{FrameHandle, FrameScheduler};
pub use reactive::{Observable, Signal, Subscription, SubscriptionScope};
pub use resize::ResizeBus;

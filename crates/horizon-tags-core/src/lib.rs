//! Core plumbing for Horizon Tags.
//!
//! This crate provides the framework-neutral building blocks the tag input
//! component is made of:
//!
//! - **Event Bus**: A per-instance, synchronous publish/subscribe hub with
//!   ordered, short-circuiting dispatch
//! - **Debouncer**: Trailing-edge debouncing of calls on a Tokio timer
//! - **Property**: Shared values read and replaced through a lock
//! - **Runtime**: Spawning onto the ambient Tokio runtime, or a shared fallback
//!
//! # Event Bus Example
//!
//! ```
//! use std::str::FromStr;
//! use horizon_tags_core::{BusEvent, EventBus};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! struct Saved;
//!
//! impl FromStr for Saved {
//!     type Err = ();
//!     fn from_str(s: &str) -> Result<Self, ()> {
//!         if s == "saved" { Ok(Saved) } else { Err(()) }
//!     }
//! }
//!
//! impl BusEvent for Saved {
//!     type Name = Saved;
//!     fn name(&self) -> Saved { Saved }
//! }
//!
//! let bus = EventBus::new();
//! bus.on("saved", |_: &Saved| println!("saved")).unwrap();
//! bus.trigger(Saved);
//! ```

pub mod bus;
pub mod debounce;
mod error;
pub mod logging;
pub mod property;
pub mod runtime;

pub use bus::{BusEvent, Dispatch, EventBus, Flow, HandlerId, Placement};
pub use debounce::Debouncer;
pub use error::BusError;
pub use property::Property;
pub use runtime::RuntimeError;

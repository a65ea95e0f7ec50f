//! Host-facing model for launcher plugins.
//!
//! - `feedback`: the rendered result list and its items.
//! - `host`: lifecycle events delivered by the launcher and the output line
//!   written back for each one.

pub mod feedback;
pub mod host;

pub use feedback::{Feedback, Item, ItemIcon};
pub use host::{HostEvent, HostOutput};

//! Domain model (events read from instrument logs, queue keys).
//!
//! - events: `LifecycleEvent` / `EventKind`
//! - ids: `EntryKey`
//!
//! Queue entries and their state machine live in `crate::queue`.

pub mod events;
pub mod ids;

pub use events::{EventKind, LifecycleEvent};
pub use ids::EntryKey;

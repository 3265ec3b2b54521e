//! Ports - seams to the outside world.
//!
//! - **Clock**: current local wall-clock time (instrument logs carry no offset)
//! - **Transport**: moves one closed raw file to the archive
//! - **LogSource** lives in `crate::logs`, **QueueStore** in `crate::queue`

pub mod clock;
pub mod transport;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::transport::{Transport, TransferOutcome};

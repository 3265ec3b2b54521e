//! Impls - port implementations.
//!
//! - **ScpTransport**: external secure-copy tool (`scp`, `pscp.exe`, ...)
//! - **MemoryQueueStore**: in-process queue store (tests, dry runs)

pub mod memory_store;
pub mod scp;

pub use self::memory_store::MemoryQueueStore;
pub use self::scp::{RemoteTarget, ScpTransport};

//! Application layer.
//!
//! - **transfer**: TransferExecutor（CLOSED → DONE）
//! - **poll_loop**: PollLoop（1 サイクル / 無限ループ）
//! - **builder**: AppBuilder（設定 → PollLoop）

pub mod builder;
pub mod poll_loop;
pub mod transfer;

pub use self::builder::AppBuilder;
pub use self::poll_loop::PollLoop;
pub use self::transfer::TransferExecutor;

//! ferry-core
//!
//! Watches a mass-spectrometer's logs for raw files being written and
//! copies each finished file to a remote archive exactly once.
//!
//! # モジュール構成
//! - **domain**: ライフサイクルイベントとキー
//! - **queue**: キュー、状態遷移表、retention sweeper、永続化
//! - **logs**: 装置ログの読み取り（日次 / 最新ファイル）
//! - **lifecycle**: イベント → キューの状態遷移
//! - **ports**: Clock, Transport
//! - **impls**: ScpTransport, MemoryQueueStore
//! - **app**: TransferExecutor, PollLoop, AppBuilder
//! - **config**: TOML 設定

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod lifecycle;
pub mod logs;
pub mod observability;
pub mod ports;
pub mod queue;

#[cfg(test)]
mod testing;

pub use error::FerryError;

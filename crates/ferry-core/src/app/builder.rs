//! AppBuilder - 設定から PollLoop を組み立てる
//!
//! # Fail-fast
//! - build() の時点で設定を検証し、サイクル途中で落ちる設定は起動させない
//! - テストでは with_* で任意の port を差し替えられる

use std::sync::Arc;

use crate::config::FerryConfig;
use crate::error::FerryError;
use crate::impls::ScpTransport;
use crate::logs::{self, LogSource};
use crate::ports::{Clock, SystemClock, Transport};
use crate::queue::{JsonQueueStore, QueueStore};

use super::poll_loop::PollLoop;

/// Wires a [`PollLoop`] from a [`FerryConfig`].
///
/// ```ignore
/// let poll = AppBuilder::new(FerryConfig::from_file(path)?).build()?;
/// poll.run().await?;
/// ```
pub struct AppBuilder {
    config: FerryConfig,
    clock: Option<Arc<dyn Clock>>,
    store: Option<Arc<dyn QueueStore>>,
    transport: Option<Arc<dyn Transport>>,
    source: Option<Arc<dyn LogSource>>,
}

impl AppBuilder {
    pub fn new(config: FerryConfig) -> Self {
        Self {
            config,
            clock: None,
            store: None,
            transport: None,
            source: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn QueueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_source(mut self, source: Arc<dyn LogSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Validate the configuration and build the loop.
    ///
    /// Ports not set with `with_*` come from the configuration: the
    /// profile's log strategy, the JSON queue file, the copy tool and the
    /// system clock.
    pub fn build(self) -> Result<PollLoop, FerryError> {
        let config = self.config;
        config.validate()?;
        let profile = config.profile()?;

        let source = self
            .source
            .unwrap_or_else(|| Arc::from(logs::source_for(&profile, config.log_dir.clone(), config.retry())));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(JsonQueueStore::new(config.queue_file.clone())));
        let transport = self.transport.unwrap_or_else(|| {
            Arc::new(ScpTransport::new(
                config.copy_tool.clone(),
                config.identity_file.clone(),
                config.remote.clone(),
            ))
        });
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        Ok(PollLoop {
            source,
            store,
            transport,
            clock,
            retention: config.retention(&profile),
            interval: config.poll_interval(),
            profile,
        })
    }
}

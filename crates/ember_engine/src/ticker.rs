//! Background decay ticking.
//!
//! Between interactions the state still has to move — loneliness creeps up,
//! excitement bleeds off. The ticker applies decay on a fixed interval while
//! the process runs; boot-time catch-up covers the gaps when it doesn't.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::engine::EmotionEngine;

#[derive(Debug, Clone)]
pub struct TickerConfig {
    pub interval: Duration,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

impl TickerConfig {
    pub fn from_secs(secs: u64) -> Self {
        Self {
            interval: Duration::from_secs(secs.max(1)),
        }
    }
}

/// Spawn the decay loop. The handle can be aborted on shutdown; the last
/// persisted state plus boot catch-up makes an abrupt stop harmless.
pub fn spawn_ticker(engine: Arc<EmotionEngine>, config: TickerConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let now = chrono::Utc::now().timestamp();
            engine.tick(now).await;
        }
    })
}

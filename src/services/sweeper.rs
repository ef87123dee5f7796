use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::sessions::SessionMap;

/// Background task that evicts grid sessions nobody has touched for a
/// while. Each sweep is independent; a failed or empty sweep never stops
/// the loop.
pub struct SessionSweeper {
    sessions: Arc<SessionMap>,
    interval: Duration,
    ttl: Duration,
}

impl SessionSweeper {
    pub fn new(sessions: Arc<SessionMap>, interval_secs: u64, ttl_secs: u64) -> Self {
        Self {
            sessions,
            interval: Duration::from_secs(interval_secs),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    pub async fn start(self) {
        info!(
            "starting session sweeper (interval: {:?}, ttl: {:?})",
            self.interval, self.ttl
        );
        loop {
            tokio::time::sleep(self.interval).await;
            let evicted = self.sessions.sweep_idle(self.ttl);
            if evicted > 0 {
                info!("session sweep evicted {} idle sessions", evicted);
            }
        }
    }
}

use crate::AppState;
use cyt_database::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Periodically delete expired admin sessions.
///
/// Expiry is already enforced on every read; this only keeps the table tidy.
pub fn spawn_session_cleanup<S: SessionStore>(
    state: Arc<AppState<S>>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("Session cleanup task stopped");
                    break;
                }
                _ = interval.tick() => {
                    match state.sessions.cleanup_expired().await {
                        Ok(0) => {}
                        Ok(removed) => tracing::info!(removed, "Removed expired admin sessions"),
                        Err(e) => tracing::error!("Session cleanup failed: {}", e),
                    }
                }
            }
        }
    })
}

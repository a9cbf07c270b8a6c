use std::time::Duration;

use tokio::sync::watch;

use crate::state::SharedState;

/// Periodically drop idle sessions until shutdown is signaled.
pub async fn run(state: SharedState, mut shutdown: watch::Receiver<bool>, every: Duration) {
    tracing::debug!("Session sweeper started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let removed = state.sessions.cleanup();
        if removed > 0 {
            tracing::debug!("Removed {removed} expired sessions ({} active)", state.sessions.len());
        }

        tokio::select! {
            _ = tokio::time::sleep(every) => {}
            _ = shutdown.changed() => {}
        }
    }

    tracing::debug!("Session sweeper stopped");
}

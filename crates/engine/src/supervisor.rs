//! Disconnect supervisor
//!
//! One kick task per disconnected player. The task sleeps out the grace
//! window and then, only if the disconnect mark survived (no reconnect),
//! turns the disconnect into a permanent leave. Reconnects abort the task
//! outright, so an aborted sleep is the normal path, not an error.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use mistduel_core::duel::rules::DISCONNECT_GRACE_SECS;

use crate::actor::LobbyCommand;
use crate::snapshot::SnapshotStore;

/// Kick tasks keyed by user id. At most one per user: arming a new one
/// aborts the old.
#[derive(Default)]
pub struct KickTasks {
    tasks: HashMap<String, JoinHandle<()>>,
}

impl KickTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a kick task for `user_id`, replacing any previous one.
    pub fn arm(&mut self, user_id: &str, handle: JoinHandle<()>) {
        if let Some(old) = self.tasks.insert(user_id.to_string(), handle) {
            old.abort();
        }
    }

    /// Cancel the pending kick for `user_id`, if any.
    pub fn cancel(&mut self, user_id: &str) {
        if let Some(handle) = self.tasks.remove(user_id) {
            handle.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

impl Drop for KickTasks {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Spawn the grace-window kick task for a disconnected player.
///
/// Without a snapshot store (tests) the mark cannot be consulted, so the
/// kick proceeds unconditionally after the window.
pub fn spawn_kick(
    code: String,
    user_id: String,
    snapshots: Option<SnapshotStore>,
    lobby_tx: mpsc::Sender<LobbyCommand>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(DISCONNECT_GRACE_SECS)).await;

        if let Some(store) = &snapshots {
            match store.disconnect_pending(&code, &user_id).await {
                Ok(false) => return,
                Ok(true) => {
                    if let Err(e) = store.clear_disconnect(&code, &user_id).await {
                        tracing::warn!(code, user_id, error = %e, "Failed to clear disconnect mark");
                    }
                }
                Err(e) => {
                    tracing::warn!(code, user_id, error = %e, "Disconnect mark check failed, kicking");
                }
            }
        }

        tracing::info!(code, user_id, "Grace window expired, removing player");
        let _ = lobby_tx.send(LobbyCommand::Leave { user_id, conn_id: None }).await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_kick_fires_after_the_grace_window() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut tasks = KickTasks::new();
        tasks.arm("usr_a", spawn_kick("lobby1".into(), "usr_a".into(), None, tx));

        tokio::time::sleep(Duration::from_secs(DISCONNECT_GRACE_SECS + 1)).await;

        let cmd = rx.recv().await.expect("kick should produce a leave");
        assert!(matches!(
            cmd,
            LobbyCommand::Leave { ref user_id, conn_id: None } if user_id == "usr_a"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_kick_never_leaves() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut tasks = KickTasks::new();
        tasks.arm("usr_a", spawn_kick("lobby1".into(), "usr_a".into(), None, tx));

        // Reconnect within the window.
        tokio::time::sleep(Duration::from_secs(100)).await;
        tasks.cancel("usr_a");

        tokio::time::sleep(Duration::from_secs(DISCONNECT_GRACE_SECS * 2)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_arming_twice_replaces_the_old_task() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut tasks = KickTasks::new();
        tasks.arm("usr_a", spawn_kick("lobby1".into(), "usr_a".into(), None, tx.clone()));
        tasks.arm("usr_a", spawn_kick("lobby1".into(), "usr_a".into(), None, tx));
        assert_eq!(tasks.tasks.len(), 1);

        tokio::time::sleep(Duration::from_secs(DISCONNECT_GRACE_SECS + 1)).await;
        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }
}

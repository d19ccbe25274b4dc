//! Lobby actor lifecycle
//!
//! Maps invite codes to live actor mailboxes. Actors remove themselves from
//! the map when their roster empties; a handle whose mailbox has closed is
//! treated as absent and replaced.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};

use mistduel_db::DbPool;

use crate::actor::{LOBBY_MAILBOX, LobbyActor, LobbyCommand};
use crate::snapshot::SnapshotStore;
use crate::war::WarRegistry;

/// Mailbox sender for one lobby actor.
#[derive(Debug, Clone)]
pub struct LobbyHandle {
    pub tx: mpsc::Sender<LobbyCommand>,
}

pub(crate) type LobbyMap = Arc<RwLock<HashMap<String, LobbyHandle>>>;

/// Spawns and tracks lobby actors.
#[derive(Clone)]
pub struct LobbyManager {
    lobbies: LobbyMap,
    pool: DbPool,
    snapshots: Option<SnapshotStore>,
    wars: WarRegistry,
}

impl LobbyManager {
    pub fn new(pool: DbPool, snapshots: Option<SnapshotStore>, wars: WarRegistry) -> Self {
        Self { lobbies: Arc::new(RwLock::new(HashMap::new())), pool, snapshots, wars }
    }

    /// Live handle for a lobby, if its actor is running.
    pub async fn get(&self, code: &str) -> Option<LobbyHandle> {
        let lobbies = self.lobbies.read().await;
        lobbies.get(code).filter(|handle| !handle.tx.is_closed()).cloned()
    }

    /// Handle for a lobby, spawning its actor on first use.
    pub async fn get_or_create(&self, code: &str) -> LobbyHandle {
        let mut lobbies = self.lobbies.write().await;

        if let Some(handle) = lobbies.get(code)
            && !handle.tx.is_closed()
        {
            return handle.clone();
        }

        let (tx, rx) = mpsc::channel(LOBBY_MAILBOX);
        let handle = LobbyHandle { tx: tx.clone() };
        lobbies.insert(code.to_string(), handle.clone());

        let actor = LobbyActor::new(
            code,
            self.pool.clone(),
            self.snapshots.clone(),
            self.wars.clone(),
            rx,
            tx,
            Arc::clone(&self.lobbies),
        );
        tokio::spawn(actor.run());

        handle
    }
}

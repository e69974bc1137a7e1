use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};

use crate::state::{Action, RootState};

/// Holds the state tree and fans dispatched actions out to watchers.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: RwLock<RootState>,
    actions_tx: broadcast::Sender<Action>,
}

impl Store {
    pub fn new() -> Self {
        let (actions_tx, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(RootState::default()),
                actions_tx,
            }),
        }
    }

    /// Reduce `action` into the state, then notify subscribers.
    pub async fn dispatch(&self, action: Action) {
        self.inner.state.write().await.reduce(&action);
        // No subscribers is fine
        let _ = self.inner.actions_tx.send(action);
    }

    /// Receive every action dispatched from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Action> {
        self.inner.actions_tx.subscribe()
    }

    pub async fn snapshot(&self) -> RootState {
        self.inner.state.read().await.clone()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use qsapien_types::api::SignupRequest;

use crate::api::PortalApi;
use crate::error::ClientError;
use crate::history::History;
use crate::login::{LoginDeps, spawn_login_watcher};
use crate::signup::spawn_signup_watcher;
use crate::state::{Action, RootState};
use crate::storage::TokenStorage;
use crate::store::Store;

/// A running client: the store plus its watchers.
pub struct ClientApp<A: PortalApi> {
    api: Arc<A>,
    store: Store,
    history: History,
    tokens: Arc<TokenStorage>,
    watchers: Vec<JoinHandle<()>>,
}

impl<A: PortalApi> ClientApp<A> {
    /// Spawn the watchers. Must be called inside a Tokio runtime.
    pub fn start(api: A, tokens: TokenStorage) -> Self {
        let api = Arc::new(api);
        let store = Store::new();
        let history = History::default();
        let tokens = Arc::new(tokens);

        let watchers = vec![
            spawn_login_watcher(LoginDeps {
                api: api.clone(),
                store: store.clone(),
                tokens: tokens.clone(),
            }),
            spawn_signup_watcher(api.clone(), store.clone(), history.clone()),
        ];

        Self {
            api,
            store,
            history,
            tokens,
            watchers,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn state(&self) -> RootState {
        self.store.snapshot().await
    }

    pub async fn login(&self, email_id: &str, password: &str) {
        self.store
            .dispatch(Action::LoginRequesting {
                email_id: email_id.to_string(),
                password: password.to_string(),
            })
            .await;
    }

    pub async fn signup(&self, fields: SignupRequest) {
        self.store.dispatch(Action::SignupRequesting(fields)).await;
    }

    /// Pick up a token persisted by an earlier login and reload the portal.
    /// Returns whether a token was found.
    pub async fn restore(&self) -> Result<bool, ClientError> {
        let Some(token) = self.tokens.load().await? else {
            return Ok(false);
        };
        info!(user_id = %token.user_id, "restoring saved login");

        self.api.set_token(Some(token.token.clone()));
        let user_id = token.user_id.clone();
        self.store.dispatch(Action::SetClient(token)).await;
        self.store
            .dispatch(Action::InitializeState { user_id })
            .await;
        Ok(true)
    }

    /// Drop the token everywhere.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.tokens.clear().await?;
        self.api.set_token(None);
        self.store.dispatch(Action::UnsetClient).await;
        Ok(())
    }
}

impl<A: PortalApi> Drop for ClientApp<A> {
    fn drop(&mut self) {
        for watcher in &self.watchers {
            watcher.abort();
        }
    }
}

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use qsapien_types::api::SignupRequest;

use crate::api::PortalApi;
use crate::history::History;
use crate::state::Action;
use crate::store::Store;

/// Path signup sends the user to once the account exists.
pub const HOME: &str = "/";

/// Submit the signup form once; on success go home, otherwise surface the
/// server's answer.
pub async fn signup_flow<A: PortalApi>(
    api: &A,
    store: &Store,
    history: &History,
    fields: SignupRequest,
) {
    match api.signup(&fields).await {
        Ok(_) => {
            info!("signup completed");
            store.dispatch(Action::SignupSuccessful).await;
            history.push(HOME);
        }
        Err(e) => {
            info!("signup failed: {}", e);
            store.dispatch(Action::SignupError(e.into_payload())).await;
        }
    }
}

/// Watch for signup requests, forking one flow per request.
pub fn spawn_signup_watcher<A: PortalApi>(
    api: Arc<A>,
    store: Store,
    history: History,
) -> JoinHandle<()> {
    let mut actions = store.subscribe();

    tokio::spawn(async move {
        loop {
            match actions.recv().await {
                Ok(Action::SignupRequesting(fields)) => {
                    let (api, store, history) = (api.clone(), store.clone(), history.clone());
                    tokio::spawn(async move {
                        signup_flow(api.as_ref(), &store, &history, fields).await;
                    });
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!("signup watcher lagged, skipped {} actions", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

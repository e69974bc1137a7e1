use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use qsapien_types::api::{LoginRequest, LoginResponse, SessionToken};

use crate::api::PortalApi;
use crate::error::ClientError;
use crate::state::{Action, PortalContent};
use crate::storage::TokenStorage;
use crate::store::Store;

/// Error payload for any cascade failure, whichever step failed.
pub const CASCADE_ERROR: &str = "empty token error";

/// The fetches run after login, in the order they are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStep {
    UserProfile,
    PublicContacts,
    AvailableChallenges,
    AskedChallenges,
    SolvedChallenges,
    Leaderboard,
}

impl CascadeStep {
    pub const ORDER: [CascadeStep; 6] = [
        CascadeStep::UserProfile,
        CascadeStep::PublicContacts,
        CascadeStep::AvailableChallenges,
        CascadeStep::AskedChallenges,
        CascadeStep::SolvedChallenges,
        CascadeStep::Leaderboard,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CascadeStep::UserProfile => "user profile",
            CascadeStep::PublicContacts => "public contacts",
            CascadeStep::AvailableChallenges => "available challenges",
            CascadeStep::AskedChallenges => "asked challenges",
            CascadeStep::SolvedChallenges => "solved challenges",
            CascadeStep::Leaderboard => "leaderboard",
        }
    }
}

/// Shared handles a login flow works with.
pub struct LoginDeps<A> {
    pub api: Arc<A>,
    pub store: Store,
    pub tokens: Arc<TokenStorage>,
}

// Manual impl: `A` itself need not be Clone.
impl<A> Clone for LoginDeps<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            store: self.store.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

/// Log in, persist the token, then load the portal.
///
/// A response without `success` and a token is echoed as the error payload.
/// Transport failures become `{message}`.
pub async fn login_flow<A: PortalApi>(deps: &LoginDeps<A>, email_id: String, password: String) {
    let req = LoginRequest {
        email_id: Some(email_id),
        password: Some(password),
    };

    let response = match deps.api.login(&req).await {
        Ok(response) => response,
        Err(e) => {
            info!("login request failed: {}", e);
            deps.store.dispatch(Action::LoginError(e.into_payload())).await;
            return;
        }
    };

    let Some(token) = accepted_token(&response) else {
        debug!("login refused: {}", response);
        deps.store.dispatch(Action::LoginError(response)).await;
        return;
    };

    deps.store.dispatch(Action::SetClient(token.clone())).await;
    deps.api.set_token(Some(token.token.clone()));
    if let Err(e) = deps.tokens.save(&token).await {
        warn!("could not persist login token: {}", e);
    }

    deps.store.dispatch(Action::LoginInitializing).await;
    if initialize_state(deps, &token.user_id).await {
        deps.store.dispatch(Action::LoginSuccess).await;
    }
}

/// Run the portal cascade for `user_id`. All fetches must succeed before
/// anything reaches the portal slice; returns whether they did.
pub async fn initialize_state<A: PortalApi>(deps: &LoginDeps<A>, user_id: &str) -> bool {
    match run_cascade(deps.api.as_ref(), user_id).await {
        Ok(content) => {
            deps.store
                .dispatch(Action::PortalLoaded(Box::new(content)))
                .await;
            true
        }
        Err((step, e)) => {
            warn!(step = step.name(), "portal cascade failed: {}", e);
            deps.store
                .dispatch(Action::LoginError(json!({ "message": CASCADE_ERROR })))
                .await;
            false
        }
    }
}

async fn run_cascade<A: PortalApi>(
    api: &A,
    user_id: &str,
) -> Result<PortalContent, (CascadeStep, ClientError)> {
    use CascadeStep::*;
    let at = |step: CascadeStep| move |e: ClientError| (step, e);

    let user = api.get_user(user_id).await.map_err(at(UserProfile))?;
    let public_contacts = api.public_contacts(user_id).await.map_err(at(PublicContacts))?;
    let available_challenges = api
        .available_challenges(user_id)
        .await
        .map_err(at(AvailableChallenges))?;
    let asked_challenges = api.asked_challenges(user_id).await.map_err(at(AskedChallenges))?;
    let solved_challenges = api
        .solved_challenges(user_id)
        .await
        .map_err(at(SolvedChallenges))?;
    let leaderboard = api.leaderboard().await.map_err(at(Leaderboard))?;

    Ok(PortalContent {
        user,
        public_contacts,
        available_challenges,
        asked_challenges,
        solved_challenges,
        leaderboard,
    })
}

fn accepted_token(response: &Value) -> Option<SessionToken> {
    let parsed: LoginResponse = serde_json::from_value(response.clone()).ok()?;
    parsed.success.then_some(parsed.token)
}

/// Watch for login and initialize requests. Each kind keeps only its latest
/// flow: a new request aborts the one still running.
pub fn spawn_login_watcher<A: PortalApi>(deps: LoginDeps<A>) -> JoinHandle<()> {
    let mut actions = deps.store.subscribe();

    tokio::spawn(async move {
        let mut login_task: Option<JoinHandle<()>> = None;
        let mut init_task: Option<JoinHandle<()>> = None;

        loop {
            match actions.recv().await {
                Ok(Action::LoginRequesting { email_id, password }) => {
                    if let Some(previous) = login_task.take() {
                        previous.abort();
                    }
                    let deps = deps.clone();
                    login_task = Some(tokio::spawn(async move {
                        login_flow(&deps, email_id, password).await;
                    }));
                }
                Ok(Action::InitializeState { user_id }) => {
                    if let Some(previous) = init_task.take() {
                        previous.abort();
                    }
                    let deps = deps.clone();
                    init_task = Some(tokio::spawn(async move {
                        initialize_state(&deps, &user_id).await;
                    }));
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!("login watcher lagged, skipped {} actions", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

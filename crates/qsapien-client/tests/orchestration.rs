use std::sync::Mutex;
use std::time::Duration;

use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::broadcast;

use qsapien_client::login::{CASCADE_ERROR, CascadeStep};
use qsapien_client::signup::HOME;
use qsapien_client::state::{Action, LoginPhase, SignupPhase};
use qsapien_client::storage::TokenStorage;
use qsapien_client::{ClientApp, ClientError, PortalApi};
use qsapien_types::api::{LoginRequest, SessionToken, SignupRequest, SignupResponse, UserProfile};

const SLOW_EMAIL: &str = "slow@b.com";

/// In-memory backend that records every call in order.
#[derive(Default)]
struct ScriptedApi {
    calls: Mutex<Vec<String>>,
    token: Mutex<Option<String>>,
    fail_at: Option<CascadeStep>,
    refuse_login: bool,
    signup_error: Option<Value>,
}

impl ScriptedApi {
    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn step(&self, step: CascadeStep) -> Result<Value, ClientError> {
        self.record(step.name());
        if self.fail_at == Some(step) {
            return Err(ClientError::Status {
                status: 500,
                body: json!({"message": "boom"}),
            });
        }
        Ok(json!([step.name()]))
    }
}

impl PortalApi for ScriptedApi {
    fn set_token(&self, token: Option<String>) {
        *self.token.lock().unwrap() = token;
    }

    async fn login(&self, req: &LoginRequest) -> Result<Value, ClientError> {
        self.record("login");
        let email = req.email_id.clone().unwrap_or_default();
        if email == SLOW_EMAIL {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        if self.refuse_login {
            return Ok(json!({"message": "email id is not registered"}));
        }
        Ok(json!({
            "success": true,
            "message": "user verified successfully",
            "token": {"userId": email, "token": format!("tok-{}", email)}
        }))
    }

    async fn signup(&self, req: &SignupRequest) -> Result<SignupResponse, ClientError> {
        self.record("signup");
        if let Some(body) = &self.signup_error {
            return Err(ClientError::Status {
                status: 400,
                body: body.clone(),
            });
        }
        Ok(SignupResponse {
            success: true,
            message: "user completed signup successfully".into(),
            token: format!("tok-{}", req.username.clone().unwrap_or_default()),
        })
    }

    async fn get_user(&self, user_id: &str) -> Result<UserProfile, ClientError> {
        self.step(CascadeStep::UserProfile)?;
        Ok(UserProfile {
            name: "A".into(),
            first_name: "A".into(),
            last_name: None,
            location: None,
            bio: None,
            contact_no: None,
            user_id: user_id.to_string(),
            email_id: user_id.to_string(),
            credit_points: 0,
            profile_image_url: None,
        })
    }

    async fn public_contacts(&self, _user_id: &str) -> Result<Value, ClientError> {
        self.step(CascadeStep::PublicContacts)
    }

    async fn available_challenges(&self, _user_id: &str) -> Result<Value, ClientError> {
        self.step(CascadeStep::AvailableChallenges)
    }

    async fn asked_challenges(&self, _user_id: &str) -> Result<Value, ClientError> {
        self.step(CascadeStep::AskedChallenges)
    }

    async fn solved_challenges(&self, _user_id: &str) -> Result<Value, ClientError> {
        self.step(CascadeStep::SolvedChallenges)
    }

    async fn leaderboard(&self) -> Result<Value, ClientError> {
        self.step(CascadeStep::Leaderboard)
    }
}

async fn wait_for(rx: &mut broadcast::Receiver<Action>, pred: impl Fn(&Action) -> bool) -> Action {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let action = rx.recv().await.unwrap();
            if pred(&action) {
                return action;
            }
        }
    })
    .await
    .expect("timed out waiting for action")
}

fn login_done(action: &Action) -> bool {
    matches!(action, Action::LoginSuccess | Action::LoginError(_))
}

fn signup_done(action: &Action) -> bool {
    matches!(action, Action::SignupSuccessful | Action::SignupError(_))
}

fn cascade_names() -> Vec<String> {
    CascadeStep::ORDER.iter().map(|s| s.name().to_string()).collect()
}

// -- Login --

#[tokio::test]
async fn login_runs_full_cascade_in_order() {
    let app = ClientApp::start(ScriptedApi::default(), TokenStorage::in_memory());
    let mut rx = app.store().subscribe();

    app.login("a@b.com", "abc123").await;
    let done = wait_for(&mut rx, login_done).await;
    assert!(matches!(done, Action::LoginSuccess));

    let mut expected = vec!["login".to_string()];
    expected.extend(cascade_names());
    assert_eq!(app.api().calls(), expected);

    let state = app.state().await;
    assert_eq!(state.login.phase, LoginPhase::Ready);
    assert!(state.login.successful);
    let content = state.portal.content.expect("portal loaded");
    assert_eq!(content.leaderboard, json!(["leaderboard"]));
    assert_eq!(
        state.client.token,
        Some(SessionToken {
            user_id: "a@b.com".into(),
            token: "tok-a@b.com".into()
        })
    );
    assert_eq!(
        app.api().token.lock().unwrap().as_deref(),
        Some("tok-a@b.com")
    );
}

#[tokio::test]
async fn any_cascade_failure_aborts_without_partial_success() {
    for (index, failing) in CascadeStep::ORDER.iter().copied().enumerate() {
        let api = ScriptedApi {
            fail_at: Some(failing),
            ..Default::default()
        };
        let app = ClientApp::start(api, TokenStorage::in_memory());
        let mut rx = app.store().subscribe();

        app.login("a@b.com", "abc123").await;
        let done = wait_for(&mut rx, login_done).await;

        match done {
            Action::LoginError(payload) => {
                assert_eq!(payload, json!({"message": CASCADE_ERROR}), "step {:?}", failing)
            }
            other => panic!("expected error after {:?}, got {:?}", failing, other),
        }

        // Steps after the failing one never run
        let mut expected = vec!["login".to_string()];
        expected.extend(cascade_names().into_iter().take(index + 1));
        assert_eq!(app.api().calls(), expected);

        let state = app.state().await;
        assert_eq!(state.login.phase, LoginPhase::Error);
        assert!(!state.login.successful);
        assert!(state.portal.content.is_none());
    }
}

#[tokio::test]
async fn refused_login_echoes_response_body() {
    let api = ScriptedApi {
        refuse_login: true,
        ..Default::default()
    };
    let app = ClientApp::start(api, TokenStorage::in_memory());
    let mut rx = app.store().subscribe();

    app.login("a@b.com", "abc123").await;
    let done = wait_for(&mut rx, login_done).await;

    match done {
        Action::LoginError(payload) => {
            assert_eq!(payload, json!({"message": "email id is not registered"}))
        }
        other => panic!("expected error, got {:?}", other),
    }
    assert_eq!(app.api().calls(), vec!["login".to_string()]);
    assert!(app.state().await.client.token.is_none());
}

#[tokio::test]
async fn latest_login_wins() {
    let app = ClientApp::start(ScriptedApi::default(), TokenStorage::in_memory());
    let mut rx = app.store().subscribe();

    app.login(SLOW_EMAIL, "abc123").await;
    app.login("fast@b.com", "abc123").await;
    wait_for(&mut rx, |a| matches!(a, Action::LoginSuccess)).await;

    // Give the aborted flow time to have finished, had it survived
    tokio::time::sleep(Duration::from_millis(500)).await;

    let profile_fetches = app
        .api()
        .calls()
        .iter()
        .filter(|c| c.as_str() == CascadeStep::UserProfile.name())
        .count();
    assert_eq!(profile_fetches, 1);
    let state = app.state().await;
    assert_eq!(state.client.token.unwrap().user_id, "fast@b.com");
}

#[tokio::test]
async fn restore_reloads_portal_and_logout_clears_it() {
    let tokens = TokenStorage::in_memory();
    let saved = SessionToken {
        user_id: "u1".into(),
        token: "tok-u1".into(),
    };
    tokens.save(&saved).await.unwrap();

    let app = ClientApp::start(ScriptedApi::default(), tokens);
    let mut rx = app.store().subscribe();

    assert!(app.restore().await.unwrap());
    wait_for(&mut rx, |a| matches!(a, Action::PortalLoaded(_))).await;

    assert_eq!(app.api().calls(), cascade_names());
    let state = app.state().await;
    assert_eq!(state.client.token, Some(saved));
    assert_eq!(state.portal.content.unwrap().user.user_id, "u1");

    app.logout().await.unwrap();
    let state = app.state().await;
    assert!(state.client.token.is_none());
    assert!(state.portal.content.is_none());
}

#[tokio::test]
async fn accepted_login_token_is_written_to_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("token.json");
    let app = ClientApp::start(ScriptedApi::default(), TokenStorage::at(&path));
    let mut rx = app.store().subscribe();

    app.login("a@b.com", "abc123").await;
    wait_for(&mut rx, login_done).await;

    let saved = TokenStorage::at(&path).load().await.unwrap();
    assert_eq!(saved.map(|t| t.token).as_deref(), Some("tok-a@b.com"));
}

#[tokio::test]
async fn restore_without_saved_token() {
    let app = ClientApp::start(ScriptedApi::default(), TokenStorage::in_memory());
    assert!(!app.restore().await.unwrap());
    assert!(app.api().calls().is_empty());
}

// -- Signup --

fn signup_fields(username: &str) -> SignupRequest {
    SignupRequest {
        first_name: Some("A".into()),
        email_id: Some(format!("{}@b.com", username)),
        password: Some("abc123".into()),
        username: Some(username.into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn signup_success_navigates_home() {
    let app = ClientApp::start(ScriptedApi::default(), TokenStorage::in_memory());
    let mut rx = app.store().subscribe();

    app.signup(signup_fields("abcd")).await;
    let done = wait_for(&mut rx, signup_done).await;
    assert!(matches!(done, Action::SignupSuccessful));

    // History is pushed right after the success action
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(app.history().current().as_deref(), Some(HOME));
    assert_eq!(app.state().await.signup.phase, SignupPhase::Success);
}

#[tokio::test]
async fn signup_failure_surfaces_server_error() {
    let api = ScriptedApi {
        signup_error: Some(json!({"message": "email id already exists"})),
        ..Default::default()
    };
    let app = ClientApp::start(api, TokenStorage::in_memory());
    let mut rx = app.store().subscribe();

    app.signup(signup_fields("abcd")).await;
    let done = wait_for(&mut rx, signup_done).await;

    match done {
        Action::SignupError(payload) => {
            assert_eq!(payload, json!({"message": "email id already exists"}))
        }
        other => panic!("expected error, got {:?}", other),
    }
    let state = app.state().await;
    assert_eq!(state.signup.phase, SignupPhase::Error);
    assert_eq!(state.signup.errors.len(), 1);
    assert!(app.history().entries().is_empty());
}

#[tokio::test]
async fn every_signup_request_gets_its_own_flow() {
    let app = ClientApp::start(ScriptedApi::default(), TokenStorage::in_memory());
    let mut rx = app.store().subscribe();

    app.signup(signup_fields("first")).await;
    app.signup(signup_fields("second")).await;
    wait_for(&mut rx, |a| matches!(a, Action::SignupSuccessful)).await;
    wait_for(&mut rx, |a| matches!(a, Action::SignupSuccessful)).await;

    let signups = app.api().calls().iter().filter(|c| *c == "signup").count();
    assert_eq!(signups, 2);
}

use std::collections::HashMap;

use serde_json::Value;

use qsapien_types::api::{SessionToken, SignupRequest, UserProfile};

/// Everything that can change client state. Request actions also wake the
/// watchers (see [`crate::login`] and [`crate::signup`]).
#[derive(Debug, Clone)]
pub enum Action {
    // -- client --
    SetClient(SessionToken),
    UnsetClient,

    // -- login --
    LoginRequesting { email_id: String, password: String },
    /// Token accepted; the portal cascade is running.
    LoginInitializing,
    LoginSuccess,
    LoginError(Value),
    /// Run the portal cascade alone, e.g. after restoring a stored token.
    InitializeState { user_id: String },

    // -- signup --
    SignupRequesting(SignupRequest),
    SignupSuccessful,
    SignupError(Value),

    // -- portal --
    PortalLoaded(Box<PortalContent>),

    // -- form --
    FormChange {
        form: String,
        field: String,
        value: String,
    },
    FormReset { form: String },
}

// -- client --

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientState {
    pub token: Option<SessionToken>,
}

impl ClientState {
    fn reduce(&mut self, action: &Action) {
        match action {
            Action::SetClient(token) => self.token = Some(token.clone()),
            Action::UnsetClient => self.token = None,
            _ => {}
        }
    }
}

// -- login --

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginPhase {
    #[default]
    Idle,
    Requesting,
    Initializing,
    Ready,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginState {
    pub phase: LoginPhase,
    pub requesting: bool,
    pub successful: bool,
    pub messages: Vec<String>,
    pub errors: Vec<Value>,
}

impl LoginState {
    fn reduce(&mut self, action: &Action) {
        match action {
            Action::LoginRequesting { .. } => {
                *self = Self {
                    phase: LoginPhase::Requesting,
                    requesting: true,
                    messages: vec!["Logging in...".into()],
                    ..Self::default()
                };
            }
            Action::LoginInitializing => {
                self.phase = LoginPhase::Initializing;
                self.messages = vec!["Loading portal...".into()];
            }
            Action::LoginSuccess => {
                *self = Self {
                    phase: LoginPhase::Ready,
                    successful: true,
                    ..Self::default()
                };
            }
            Action::LoginError(error) => {
                self.phase = LoginPhase::Error;
                self.requesting = false;
                self.successful = false;
                self.messages.clear();
                self.errors.push(error.clone());
            }
            _ => {}
        }
    }
}

// -- signup --

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignupPhase {
    #[default]
    Idle,
    Requesting,
    Success,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignupState {
    pub phase: SignupPhase,
    pub errors: Vec<Value>,
}

impl SignupState {
    fn reduce(&mut self, action: &Action) {
        match action {
            Action::SignupRequesting(_) => {
                self.phase = SignupPhase::Requesting;
                self.errors.clear();
            }
            Action::SignupSuccessful => {
                self.phase = SignupPhase::Success;
                self.errors.clear();
            }
            Action::SignupError(error) => {
                self.phase = SignupPhase::Error;
                self.errors.push(error.clone());
            }
            _ => {}
        }
    }
}

// -- portal --

/// Data fetched by the login cascade. Only the user profile has a schema
/// owned by this project; the rest is kept as the services return it.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalContent {
    pub user: UserProfile,
    pub public_contacts: Value,
    pub available_challenges: Value,
    pub asked_challenges: Value,
    pub solved_challenges: Value,
    pub leaderboard: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortalState {
    pub content: Option<PortalContent>,
}

impl PortalState {
    fn reduce(&mut self, action: &Action) {
        match action {
            Action::PortalLoaded(content) => self.content = Some((**content).clone()),
            Action::UnsetClient => self.content = None,
            _ => {}
        }
    }
}

// -- form --

/// Field values per form name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub forms: HashMap<String, HashMap<String, String>>,
}

impl FormState {
    fn reduce(&mut self, action: &Action) {
        match action {
            Action::FormChange { form, field, value } => {
                self.forms
                    .entry(form.clone())
                    .or_default()
                    .insert(field.clone(), value.clone());
            }
            Action::FormReset { form } => {
                self.forms.remove(form);
            }
            _ => {}
        }
    }

    pub fn value(&self, form: &str, field: &str) -> Option<&str> {
        self.forms.get(form)?.get(field).map(String::as_str)
    }
}

/// The whole client state tree. Every action is offered to every slice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootState {
    pub client: ClientState,
    pub login: LoginState,
    pub signup: SignupState,
    pub portal: PortalState,
    pub form: FormState,
}

impl RootState {
    pub fn reduce(&mut self, action: &Action) {
        self.client.reduce(action);
        self.login.reduce(action);
        self.signup.reduce(action);
        self.portal.reduce(action);
        self.form.reduce(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token() -> SessionToken {
        SessionToken {
            user_id: "u1".into(),
            token: "t".into(),
        }
    }

    #[test]
    fn login_walks_through_phases() {
        let mut state = RootState::default();
        state.reduce(&Action::LoginRequesting {
            email_id: "a@b.com".into(),
            password: "abc123".into(),
        });
        assert_eq!(state.login.phase, LoginPhase::Requesting);
        assert!(state.login.requesting);

        state.reduce(&Action::SetClient(token()));
        state.reduce(&Action::LoginInitializing);
        assert_eq!(state.login.phase, LoginPhase::Initializing);

        state.reduce(&Action::LoginSuccess);
        assert_eq!(state.login.phase, LoginPhase::Ready);
        assert!(state.login.successful);
        assert!(!state.login.requesting);
        assert_eq!(state.client.token, Some(token()));
    }

    #[test]
    fn login_error_is_recorded_and_cleared_by_next_request() {
        let mut state = RootState::default();
        state.reduce(&Action::LoginError(json!({"message": "nope"})));
        assert_eq!(state.login.phase, LoginPhase::Error);
        assert_eq!(state.login.errors, vec![json!({"message": "nope"})]);

        state.reduce(&Action::LoginRequesting {
            email_id: "a@b.com".into(),
            password: "abc123".into(),
        });
        assert!(state.login.errors.is_empty());
    }

    #[test]
    fn slices_ignore_foreign_actions() {
        let mut state = RootState::default();
        state.reduce(&Action::SignupError(json!({"message": "taken"})));
        assert_eq!(state.signup.phase, SignupPhase::Error);
        assert_eq!(state.login, LoginState::default());
        assert_eq!(state.client, ClientState::default());
        assert_eq!(state.portal, PortalState::default());
    }

    #[test]
    fn unset_client_drops_portal_content() {
        let mut state = RootState::default();
        state.portal.content = Some(PortalContent {
            user: UserProfile {
                name: "A".into(),
                first_name: "A".into(),
                last_name: None,
                location: None,
                bio: None,
                contact_no: None,
                user_id: "u1".into(),
                email_id: "a@b.com".into(),
                credit_points: 0,
                profile_image_url: None,
            },
            public_contacts: json!([]),
            available_challenges: json!([]),
            asked_challenges: json!([]),
            solved_challenges: json!([]),
            leaderboard: json!([]),
        });
        state.reduce(&Action::SetClient(token()));
        state.reduce(&Action::UnsetClient);
        assert!(state.portal.content.is_none());
        assert!(state.client.token.is_none());
    }

    #[test]
    fn form_fields_update_and_reset() {
        let mut state = RootState::default();
        state.reduce(&Action::FormChange {
            form: "signup".into(),
            field: "username".into(),
            value: "abcd".into(),
        });
        assert_eq!(state.form.value("signup", "username"), Some("abcd"));

        state.reduce(&Action::FormReset {
            form: "signup".into(),
        });
        assert_eq!(state.form.value("signup", "username"), None);
    }
}

use std::future::Future;
use std::sync::RwLock;

use reqwest::{RequestBuilder, Response};
use serde_json::{Value, json};

use qsapien_types::api::{LoginRequest, SignupRequest, SignupResponse, UserProfile};

use crate::error::ClientError;

/// Backend calls the client flows depend on.
///
/// `login` hands back the raw response body whatever the status, because the
/// login flow inspects it itself. Every other call fails with
/// [`ClientError::Status`] on a non-2xx answer.
pub trait PortalApi: Send + Sync + 'static {
    /// Token attached to subsequent portal requests.
    fn set_token(&self, token: Option<String>);

    fn login(&self, req: &LoginRequest) -> impl Future<Output = Result<Value, ClientError>> + Send;

    fn signup(
        &self,
        req: &SignupRequest,
    ) -> impl Future<Output = Result<SignupResponse, ClientError>> + Send;

    fn get_user(&self, user_id: &str)
    -> impl Future<Output = Result<UserProfile, ClientError>> + Send;

    fn public_contacts(&self, user_id: &str)
    -> impl Future<Output = Result<Value, ClientError>> + Send;

    fn available_challenges(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Value, ClientError>> + Send;

    fn asked_challenges(&self, user_id: &str)
    -> impl Future<Output = Result<Value, ClientError>> + Send;

    fn solved_challenges(&self, user_id: &str)
    -> impl Future<Output = Result<Value, ClientError>> + Send;

    fn leaderboard(&self) -> impl Future<Output = Result<Value, ClientError>> + Send;
}

/// [`PortalApi`] over HTTP.
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self.token.read().ok().and_then(|t| t.clone());
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn fetch(&self, path: &str, user_id: Option<&str>) -> Result<Value, ClientError> {
        let mut builder = self.authorized(self.client.get(self.url(path)));
        if let Some(user_id) = user_id {
            builder = builder.query(&[("userId", user_id)]);
        }
        let resp = ensure_success(builder.send().await?).await?;
        Ok(resp.json().await?)
    }
}

impl PortalApi for HttpApi {
    fn set_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = token;
        }
    }

    async fn login(&self, req: &LoginRequest) -> Result<Value, ClientError> {
        let resp = self
            .client
            .post(self.url("/user/login"))
            .json(req)
            .send()
            .await?;
        Ok(resp.json().await?)
    }

    async fn signup(&self, req: &SignupRequest) -> Result<SignupResponse, ClientError> {
        let resp = self
            .client
            .post(self.url("/user/signup"))
            .json(req)
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json().await?)
    }

    async fn get_user(&self, user_id: &str) -> Result<UserProfile, ClientError> {
        let resp = self
            .authorized(self.client.post(self.url("/user/get")))
            .json(&json!({ "userId": user_id }))
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json().await?)
    }

    async fn public_contacts(&self, user_id: &str) -> Result<Value, ClientError> {
        self.fetch("/contacts/public", Some(user_id)).await
    }

    async fn available_challenges(&self, user_id: &str) -> Result<Value, ClientError> {
        self.fetch("/challenges", Some(user_id)).await
    }

    async fn asked_challenges(&self, user_id: &str) -> Result<Value, ClientError> {
        self.fetch("/challenges/asked", Some(user_id)).await
    }

    async fn solved_challenges(&self, user_id: &str) -> Result<Value, ClientError> {
        self.fetch("/challenges/solved", Some(user_id)).await
    }

    async fn leaderboard(&self) -> Result<Value, ClientError> {
        self.fetch("/leaderboard", None).await
    }
}

async fn ensure_success(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.json::<Value>().await.unwrap_or(Value::Null);
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

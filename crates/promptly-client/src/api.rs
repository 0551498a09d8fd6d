//! Promptly REST API client
//!
//! Every call goes through [`ApiClient::request`], which attaches the
//! stored bearer token, JSON-encodes bodies and normalizes failures. A 401
//! from any endpoint tears the session down before the error is returned.

use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use promptly_core::activity::TrackActivityRequest;
use promptly_core::models::{
    EvaluatePromptRequest, GeneratePromptRequest, Intent, Persona, PersonaDraft, Profile,
    ProfileDraft, Prompt, PromptDraft, PromptEvaluation, PromptTemplate, TemplateDraft,
    TemplateVersionDraft, User,
};
use promptly_core::storage::TOKEN_KEY;
use promptly_core::{ClientConfig, KeyValueStore, Navigator, Observable};

use crate::client::HttpClientConfig;
use crate::session::AuthState;
use crate::transport::{HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};
use crate::{ClientError, Result};

/// Per-call options for [`ApiClient::request`]
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// HTTP method (GET when left at the default)
    pub method: Method,
    /// JSON body; `None` and `Some(Value::Null)` both send no body
    pub body: Option<serde_json::Value>,
    /// Extra headers, applied before the client's own
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            ..Default::default()
        }
    }

    pub fn post<B: Serialize + ?Sized>(body: &B) -> Result<Self> {
        Self::with_json(Method::POST, body)
    }

    pub fn put<B: Serialize + ?Sized>(body: &B) -> Result<Self> {
        Self::with_json(Method::PUT, body)
    }

    pub fn with_json<B: Serialize + ?Sized>(method: Method, body: &B) -> Result<Self> {
        let body = serde_json::to_value(body)
            .map_err(|e| ClientError::InvalidRequest(format!("Failed to encode body: {}", e)))?;
        Ok(Self {
            method,
            body: Some(body),
            headers: HeaderMap::new(),
        })
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let header = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ClientError::InvalidRequest(format!("Invalid header name {}: {}", name, e))
        })?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::InvalidRequest(format!("Invalid header {}: {}", name, e)))?;
        self.headers.insert(header, value);
        Ok(self)
    }
}

/// Client for the Promptly backend
pub struct ApiClient {
    base_url: String,
    login_url: String,
    transport: Arc<dyn HttpTransport>,
    storage: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    auth_state: Observable<AuthState>,
}

impl ApiClient {
    /// Create a client over an explicit transport
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn HttpTransport>,
        storage: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            login_url: config.login_url(),
            transport,
            storage,
            navigator,
            auth_state: Observable::new(AuthState::initial()),
        }
    }

    /// Create a client that talks HTTP through reqwest
    pub fn from_config(
        config: &ClientConfig,
        storage: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&HttpClientConfig::from(&config.http))?;
        Ok(Self::new(config, Arc::new(transport), storage, navigator))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Shared authentication state, also driven by the session store
    pub fn auth_state(&self) -> Observable<AuthState> {
        self.auth_state.clone()
    }

    /// Stored bearer token. Read failures are logged and treated as "no token".
    pub fn stored_token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("Failed to read stored token: {}", e);
                None
            }
        }
    }

    /// Issue one request and decode its JSON body.
    ///
    /// Resolves to `None` for DELETE requests and 204 responses, whatever
    /// the body holds.
    ///
    /// # Errors
    /// - `ClientError::AuthenticationRequired` on 401, after the stored token
    ///   was removed, the session signed out and the login page opened
    /// - `ClientError::Http` on any other non-success status
    /// - `ClientError::Parse` if a success body isn't the expected JSON
    /// - `ClientError::Transport` / `ClientError::Timeout` on network failure
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Option<T>> {
        let is_delete = options.method == Method::DELETE;
        let response = self.dispatch(endpoint, options).await?;

        if is_delete || response.status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        serde_json::from_slice(&response.body)
            .map(Some)
            .map_err(|e| ClientError::Parse(format!("{}: {}", endpoint, e)))
    }

    /// Like [`request`](Self::request) but requires a body
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        self.request(endpoint, options)
            .await?
            .ok_or_else(|| ClientError::EmptyResponse(endpoint.to_string()))
    }

    /// Like [`request`](Self::request) but ignores any body
    pub async fn execute(&self, endpoint: &str, options: RequestOptions) -> Result<()> {
        self.dispatch(endpoint, options).await.map(|_| ())
    }

    async fn dispatch(&self, endpoint: &str, options: RequestOptions) -> Result<TransportResponse> {
        let RequestOptions {
            method,
            body,
            mut headers,
        } = options;

        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = self.stored_token() {
            headers.insert(AUTHORIZATION, bearer(&token)?);
        }

        let body = match body {
            Some(serde_json::Value::Null) | None => None,
            Some(value) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Some(serde_json::to_vec(&value).map_err(|e| {
                    ClientError::InvalidRequest(format!("Failed to encode body: {}", e))
                })?)
            }
        };

        let url = format!("{}{}", self.base_url, endpoint);
        debug!("{} {}", method, url);

        let response = self
            .transport
            .send(TransportRequest {
                method,
                url,
                headers,
                body,
            })
            .await?;

        if response.status.is_success() {
            return Ok(response);
        }

        if response.status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
            return Err(ClientError::AuthenticationRequired);
        }

        Err(http_error(response.status, &response.body))
    }

    /// Clear credentials, sign the session out and send the user to log in
    fn handle_unauthorized(&self) {
        warn!("API returned 401, clearing stored credentials");

        if let Err(e) = self.storage.remove(TOKEN_KEY) {
            error!("Failed to remove stored token: {}", e);
        }

        if self.auth_state.set_if_changed(AuthState::signed_out()) {
            info!("Session signed out after 401");
        }

        if let Err(e) = self.navigator.navigate(&self.login_url) {
            warn!("Failed to redirect to login: {}", e);
        }
    }

    // Auth

    /// Resolve the user a token belongs to.
    ///
    /// Sends `token` explicitly and skips the 401 teardown: callers decide
    /// what an invalid token means.
    pub async fn current_user(&self, token: &str) -> Result<User> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, bearer(token)?);

        let response = self
            .transport
            .send(TransportRequest {
                method: Method::GET,
                url: format!("{}/api/auth/me", self.base_url),
                headers,
                body: None,
            })
            .await?;

        if !response.status.is_success() {
            return Err(http_error(response.status, &response.body));
        }

        serde_json::from_slice(&response.body)
            .map_err(|e| ClientError::Parse(format!("/api/auth/me: {}", e)))
    }

    /// Tell the backend the user logged out
    pub async fn notify_logout(&self) -> Result<()> {
        let response = self
            .transport
            .send(TransportRequest {
                method: Method::GET,
                url: format!("{}/api/auth/logout", self.base_url),
                headers: HeaderMap::new(),
                body: None,
            })
            .await?;

        if response.status.is_success() {
            Ok(())
        } else {
            Err(http_error(response.status, &response.body))
        }
    }

    // Profiles

    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        self.fetch("/profiles", RequestOptions::get()).await
    }

    pub async fn create_profile(&self, profile: &ProfileDraft) -> Result<Profile> {
        self.fetch("/profiles", RequestOptions::post(profile)?).await
    }

    pub async fn update_profile(&self, id: &str, profile: &ProfileDraft) -> Result<Profile> {
        self.fetch(&format!("/profiles/{}", segment(id)), RequestOptions::put(profile)?)
            .await
    }

    pub async fn delete_profile(&self, id: &str) -> Result<()> {
        self.execute(&format!("/profiles/{}", segment(id)), RequestOptions::delete())
            .await
    }

    // Personas

    pub async fn list_personas(&self, profile_id: Option<&str>) -> Result<Vec<Persona>> {
        self.fetch(&scoped("/personas", profile_id)?, RequestOptions::get())
            .await
    }

    pub async fn create_persona(&self, persona: &PersonaDraft) -> Result<Persona> {
        self.fetch("/personas", RequestOptions::post(persona)?).await
    }

    pub async fn update_persona(&self, id: &str, persona: &PersonaDraft) -> Result<Persona> {
        self.fetch(&format!("/personas/{}", segment(id)), RequestOptions::put(persona)?)
            .await
    }

    pub async fn delete_persona(&self, id: &str) -> Result<()> {
        self.execute(&format!("/personas/{}", segment(id)), RequestOptions::delete())
            .await
    }

    // Templates

    pub async fn list_templates(&self, profile_id: Option<&str>) -> Result<Vec<PromptTemplate>> {
        self.fetch(&scoped("/templates", profile_id)?, RequestOptions::get())
            .await
    }

    pub async fn create_template(&self, template: &TemplateDraft) -> Result<PromptTemplate> {
        self.fetch("/templates", RequestOptions::post(template)?).await
    }

    pub async fn update_template(
        &self,
        id: &str,
        template: &TemplateDraft,
    ) -> Result<PromptTemplate> {
        self.fetch(&format!("/templates/{}", segment(id)), RequestOptions::put(template)?)
            .await
    }

    /// Publish a new version of template `id`; the backend assigns the number
    pub async fn create_template_version(
        &self,
        id: &str,
        template: &TemplateVersionDraft,
    ) -> Result<PromptTemplate> {
        self.fetch(
            &format!("/templates/{}/version", segment(id)),
            RequestOptions::post(template)?,
        )
        .await
    }

    pub async fn delete_template(&self, id: &str, version: u32) -> Result<()> {
        self.execute(
            &format!("/templates/{}?version={}", segment(id), version),
            RequestOptions::delete(),
        )
        .await
    }

    // Prompts

    pub async fn generate_prompt(&self, request: &GeneratePromptRequest) -> Result<Prompt> {
        self.fetch("/generate-prompt", RequestOptions::post(request)?)
            .await
    }

    pub async fn list_prompts(&self, profile_id: Option<&str>) -> Result<Vec<Prompt>> {
        self.fetch(&scoped("/prompts", profile_id)?, RequestOptions::get())
            .await
    }

    pub async fn update_prompt(&self, id: &str, prompt: &PromptDraft) -> Result<Prompt> {
        self.fetch(&format!("/prompts/{}", segment(id)), RequestOptions::put(prompt)?)
            .await
    }

    pub async fn delete_prompt(&self, id: &str) -> Result<()> {
        self.execute(&format!("/prompts/{}", segment(id)), RequestOptions::delete())
            .await
    }

    pub async fn evaluate_prompt(
        &self,
        request: &EvaluatePromptRequest,
    ) -> Result<PromptEvaluation> {
        self.fetch("/evaluate-prompt", RequestOptions::post(request)?)
            .await
    }

    // Misc

    pub async fn list_intents(&self) -> Result<Vec<Intent>> {
        self.fetch("/intents", RequestOptions::get()).await
    }

    pub async fn track_activity(&self, activity: &TrackActivityRequest) -> Result<()> {
        self.execute("/track-activity", RequestOptions::post(activity)?)
            .await
    }
}

fn bearer(token: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| ClientError::InvalidRequest(format!("Invalid bearer token: {}", e)))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Error for a non-success status, preferring the body's `error` field
fn http_error(status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|e| e.as_str())
                .filter(|e| !e.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));

    ClientError::Http {
        status: status.as_u16(),
        message,
    }
}

fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Append `?profile_id=` when listing within a profile
fn scoped(path: &str, profile_id: Option<&str>) -> Result<String> {
    match profile_id {
        Some(id) => {
            let query = serde_urlencoded::to_string([("profile_id", id)])
                .map_err(|e| ClientError::InvalidRequest(format!("Invalid profile id: {}", e)))?;
            Ok(format!("{}?{}", path, query))
        }
        None => Ok(path.to_string()),
    }
}

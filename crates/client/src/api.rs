//! REST client for the Verae analysis service.
//!
//! Wraps the remote HTTP contract (auth, panel submission, status,
//! result, listing) using [`reqwest`], one typed method per endpoint.
//! Authenticated calls attach the bearer token from the shared
//! [`SessionStore`]; a 401 response clears the stored token so the
//! caller is forced back through authentication.

use reqwest::StatusCode;
use serde::Serialize;

use verae_core::panel::{self, LabValues};

use crate::config::ClientConfig;
use crate::error::{extract_detail, ApiError, ApiResult};
use crate::models::{
    AnalysisList, AnalysisListItem, AnalysisSnapshot, AuthResponse, CreateAnalysisRequest,
    Credentials, RiskResult, UploadMetadata,
};
use crate::session::SessionStore;

/// HTTP client for the analysis service.
///
/// Cheap to clone: handles share the underlying connection pool and
/// session state.
#[derive(Debug, Clone)]
pub struct VeraeApi {
    client: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl VeraeApi {
    /// Create a client for the configured service.
    pub fn new(config: &ClientConfig, session: SessionStore) -> Self {
        Self::with_client(reqwest::Client::new(), config.base_url.clone(), session)
    }

    /// Create a client reusing an existing [`reqwest::Client`] (useful
    /// for connection pooling across clients).
    pub fn with_client(client: reqwest::Client, base_url: String, session: SessionStore) -> Self {
        Self {
            client,
            base_url,
            session,
        }
    }

    /// The session store this client reads tokens from.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Base HTTP URL of the service.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- auth ----

    /// Register a new account via `POST /auth/register` and store the
    /// returned bearer token in the session.
    pub async fn register(&self, credentials: &Credentials) -> ApiResult<AuthResponse> {
        self.authenticate("/auth/register", credentials, "Registration failed")
            .await
    }

    /// Log in via `POST /auth/login` and store the returned bearer token
    /// in the session.
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<AuthResponse> {
        self.authenticate("/auth/login", credentials, "Login failed")
            .await
    }

    // ---- analyses ----

    /// Submit a lab panel via `POST /analyses`.
    ///
    /// Validates completeness locally first, derives the upload metadata
    /// from the serialized lab JSON, and records the returned analysis id
    /// as the session's "last analysis".
    pub async fn submit_panel(&self, values: &LabValues) -> ApiResult<AnalysisSnapshot> {
        let lab = panel::build_submission(values)?;
        let upload = UploadMetadata::for_manual_entry(&lab)?;
        let request = CreateAnalysisRequest { upload, lab };

        let response = self.authed_post("/analyses", &request).await?;
        let snapshot: AnalysisSnapshot =
            Self::parse_response(response, "Create analysis failed").await?;

        tracing::info!(
            analysis_id = %snapshot.analysis_id,
            status = %snapshot.status,
            "Analysis submitted",
        );
        self.session
            .set_last_analysis_id(snapshot.analysis_id.clone());
        Ok(snapshot)
    }

    /// Fetch the current state of an analysis via `GET /analyses/{id}`.
    ///
    /// Returns `Ok(None)` when the service does not know the id.
    pub async fn analysis_status(&self, analysis_id: &str) -> ApiResult<Option<AnalysisSnapshot>> {
        let response = self.authed_get(&format!("/analyses/{analysis_id}")).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(
            Self::parse_response(response, "Failed to get status").await?,
        ))
    }

    /// Fetch the final risk result via `GET /analyses/{id}/result`.
    ///
    /// Returns `Ok(None)` when the analysis is unknown (404) or not yet
    /// completed (409): "not available" rather than an error.
    pub async fn analysis_result(&self, analysis_id: &str) -> ApiResult<Option<RiskResult>> {
        let response = self
            .authed_get(&format!("/analyses/{analysis_id}/result"))
            .await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::CONFLICT {
            return Ok(None);
        }
        Ok(Some(
            Self::parse_response(response, "Failed to get result").await?,
        ))
    }

    /// List the caller's analyses via `GET /analyses`.
    pub async fn list_analyses(&self) -> ApiResult<Vec<AnalysisListItem>> {
        let response = self.authed_get("/analyses").await?;
        let list: AnalysisList = Self::parse_response(response, "Failed to list analyses").await?;
        Ok(list.analyses)
    }

    // ---- private helpers ----

    /// POST credentials to an auth endpoint and store the token.
    ///
    /// Auth endpoints are the one place a 401 means "bad credentials"
    /// rather than "stale token", so the response goes straight through
    /// [`Self::parse_response`] without the token-clearing path.
    async fn authenticate(
        &self,
        path: &str,
        credentials: &Credentials,
        fallback: &str,
    ) -> ApiResult<AuthResponse> {
        credentials.validate()?;

        let response = self
            .client
            .post(self.endpoint(path))
            .json(credentials)
            .send()
            .await?;
        let auth: AuthResponse = Self::parse_response(response, fallback).await?;

        tracing::info!(endpoint = path, "Authenticated against the service");
        self.session.set_token(auth.access_token.clone());
        Ok(auth)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn authed_get(&self, path: &str) -> ApiResult<reqwest::Response> {
        self.send_authed(self.client.get(self.endpoint(path))).await
    }

    async fn authed_post<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> ApiResult<reqwest::Response> {
        self.send_authed(self.client.post(self.endpoint(path)).json(body))
            .await
    }

    /// Attach the bearer token and send. A 401 response clears the
    /// stored token and maps to [`ApiError::Unauthorized`].
    async fn send_authed(&self, request: reqwest::RequestBuilder) -> ApiResult<reqwest::Response> {
        let request = match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            self.session.clear_token();
            tracing::warn!("Bearer token rejected by the service; session token cleared");
            return Err(ApiError::Unauthorized);
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        fallback: &str,
    ) -> ApiResult<T> {
        let response = Self::ensure_success(response, fallback).await?;
        Ok(response.json::<T>().await?)
    }

    /// Ensure the response has a success status code, otherwise extract
    /// a user-facing message from the body's `detail` field.
    async fn ensure_success(
        response: reqwest::Response,
        fallback: &str,
    ) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: extract_detail(&body, fallback),
            });
        }
        Ok(response)
    }
}

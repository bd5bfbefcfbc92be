//! API client for communicating with the pension fund REST API.
//!
//! This module provides the `ApiClient` struct for the authentication
//! endpoints and the public content endpoints (news, transparency
//! documents). Endpoint paths follow the backend's routing, including
//! trailing slashes.

use std::time::Duration;

use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{Documento, LoginCredentials, Noticia, UserProfile};

use super::error::login_failure_message;
use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Response body of `POST /auth/login/`.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

/// Response body of `POST /auth/refresh/`.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Serialize)]
struct RefreshTokenBody<'a> {
    refresh_token: &'a str,
}

/// API client for the pension fund backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the given base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the bearer token used for authenticated requests.
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Drop the bearer token; subsequent requests go out unauthenticated.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::InvalidResponse(format!("Invalid token header: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning a classified error if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
    }

    /// GET a JSON resource relative to the base URL, sending the bearer
    /// token when one is set.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response, path).await
    }

    // ===== Authentication Endpoints =====

    /// Authenticate with username/password and return the issued tokens
    /// plus the signed-in user profile.
    ///
    /// A rejection (bad credentials, inactive account, non-admin user) comes
    /// back as `ApiError::LoginRejected` carrying the backend's message.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse, ApiError> {
        let url = self.url("/auth/login/");
        let response = self.client.post(&url).json(credentials).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = %status, "Login rejected");
            return Err(ApiError::LoginRejected(login_failure_message(&body)));
        }

        Self::parse_json(response, "login response").await
    }

    /// Tell the backend to blacklist the given refresh token.
    ///
    /// The response body is ignored; callers only care whether the request
    /// reached the server.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), ApiError> {
        let url = self.url("/auth/logout/");
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(&RefreshTokenBody { refresh_token })
            .send()
            .await?;
        Self::check_response(response).await?;
        Ok(())
    }

    /// Exchange the refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError> {
        let url = self.url("/auth/refresh/");
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(&RefreshTokenBody { refresh_token })
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response, "refresh response").await
    }

    /// Fetch the profile of the currently authenticated user.
    ///
    /// Used at startup to confirm that a restored access token is still
    /// accepted by the backend.
    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.get("/auth/profile/").await
    }

    // ===== Content Endpoints =====

    /// Fetch news items. `only_published` restricts the list to items the
    /// public site shows.
    pub async fn fetch_noticias(&self, only_published: bool) -> Result<Vec<Noticia>, ApiError> {
        let path = if only_published {
            "/noticias/publicadas/"
        } else {
            "/noticias/"
        };
        self.get(path).await
    }

    /// Fetch a single news item by id.
    pub async fn fetch_noticia(&self, id: i64) -> Result<Noticia, ApiError> {
        self.get(&format!("/noticias/{}/", id)).await
    }

    /// Fetch all transparency documents. Category filtering happens
    /// client-side, matching how the public site renders the list.
    pub async fn fetch_documentos(&self) -> Result<Vec<Documento>, ApiError> {
        self.get("/transparencia/").await
    }
}

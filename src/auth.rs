//! Client for the hosted auth service.
//!
//! Admin sessions are issued by the store vendor's auth endpoints under
//! `/auth/v1/`. Password sign-in returns a bearer token which the admin
//! surface presents on subsequent requests; the token is validated by
//! asking the auth service for the user it belongs to, so this process
//! never stores credentials or session state itself.

use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// A live session as returned by password sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AuthClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, name)
    }

    fn api_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", value);
        }
        headers
    }

    /// Exchange email/password for a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let response = self
            .http
            .post(self.endpoint("token"))
            .query(&[("grant_type", "password")])
            .headers(self.api_headers())
            .json(&Credentials { email, password })
            .send()
            .await?;

        let response = check_auth_status(response).await?;
        let session = response.json::<Session>().await?;
        info!("Signed in {}", session.user.email);
        Ok(session)
    }

    /// Register a new admin account.
    pub async fn sign_up(&self, email: &str, password: &str) -> AppResult<Session> {
        let response = self
            .http
            .post(self.endpoint("signup"))
            .headers(self.api_headers())
            .json(&Credentials { email, password })
            .send()
            .await?;

        let response = check_auth_status(response).await?;
        let session = response.json::<Session>().await?;
        info!("Signed up {}", session.user.email);
        Ok(session)
    }

    /// Revoke a session token.
    pub async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        let response = self
            .http
            .post(self.endpoint("logout"))
            .headers(self.api_headers())
            .bearer_auth(access_token)
            .send()
            .await?;

        check_auth_status(response).await?;
        debug!("Session revoked");
        Ok(())
    }

    /// Look up the user a token belongs to. This doubles as token
    /// validation: an expired or revoked token comes back as a 4xx.
    pub async fn current_user(&self, access_token: &str) -> AppResult<AuthUser> {
        let response = self
            .http
            .get(self.endpoint("user"))
            .headers(self.api_headers())
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = check_auth_status(response).await?;
        let user = response.json::<AuthUser>().await?;
        Ok(user)
    }
}

/// Auth rejections (bad credentials, expired tokens) are 4xx and map to
/// [`AppError::AuthFailed`]; anything else non-success means the auth
/// service itself is unhealthy.
async fn check_auth_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status.is_client_error() {
        Err(AppError::AuthFailed(format!("auth rejected ({status}): {body}")))
    } else {
        Err(AppError::StoreUnavailable(format!(
            "auth service error ({status}): {body}"
        )))
    }
}

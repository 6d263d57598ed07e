// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login against the mock auth API and in-memory session tracking.
//!
//! Tokens are JWTs issued by the mock API. Their signing key is not ours, so
//! only the `exp` claim is checked; the signature is not verified.

use crate::error::AppError;
use crate::models::{AuthResponse, LoginRequest, User};
use chrono::{DateTime, SecondsFormat, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::sync::{Arc, RwLock};

/// Signed-in session.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    /// Sign-in time as RFC3339 with a `Z` suffix.
    pub fn signed_in_rfc3339(&self) -> String {
        self.signed_in_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Claims read from a session token.
#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    #[allow(dead_code)]
    exp: usize,
}

/// Auth collaborator: login/logout and current-session queries.
#[derive(Clone)]
pub struct AuthService {
    http: reqwest::Client,
    base_url: String,
    session_minutes: u32,
    session: Arc<RwLock<Option<Session>>>,
}

impl AuthService {
    pub fn new(base_url: impl Into<String>, session_minutes: u32) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_minutes,
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// Exchange credentials for a session.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AppError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
            expires_in_mins: Some(self.session_minutes),
        };

        let response = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::AuthApi(format!("Login request failed: {}", e)))?;

        let status = response.status();
        if status.as_u16() == 400 || status.as_u16() == 401 {
            tracing::info!(username, "Login rejected");
            return Err(AppError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::AuthApi(format!("HTTP {}: {}", status, body)));
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| AppError::AuthApi(format!("JSON parse error: {}", e)))?;

        let token = auth
            .session_token()
            .ok_or_else(|| AppError::AuthApi("No token in login response".to_string()))?
            .to_string();

        let session = Session {
            user: auth.user.clone(),
            token,
            signed_in_at: Utc::now(),
        };
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = Some(session);

        tracing::info!(user_id = auth.user.id, username = %auth.user.username, "Signed in");
        Ok(auth.user)
    }

    /// Drop the current session.
    pub fn logout(&self) {
        let previous = self
            .session
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(session) = previous {
            tracing::info!(user_id = session.user.id, "Signed out");
        }
    }

    /// A session exists and its token has not expired.
    pub fn is_authenticated(&self) -> bool {
        self.current_session()
            .is_some_and(|s| token_unexpired(&s.token))
    }

    pub fn current_user(&self) -> Option<User> {
        self.current_session().map(|s| s.user)
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Check a presented token against the active session.
    pub fn verify(&self, token: &str) -> Result<User, AppError> {
        let session = self.current_session().ok_or(AppError::Unauthorized)?;
        if session.token != token || !token_unexpired(token) {
            return Err(AppError::InvalidToken);
        }
        Ok(session.user)
    }
}

/// Whether `token` is a JWT whose `exp` lies in the future.
pub fn token_unexpired(token: &str) -> bool {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.required_spec_claims.clear();

    decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation).is_ok()
}

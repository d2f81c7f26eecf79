//! Session state derived from locally stored auth data.
//!
//! The auth token and decoded user record are written by an external
//! auth collaborator; this module only reads them. Authentication state
//! is recomputed on every call - never cached - so a login or logout
//! takes effect on the next operation without any wiring.
//!
//! Only the token's `exp` claim is inspected; signature validation is
//! the backend's job, and an expired-looking token simply downgrades
//! the session to guest.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::debug;

use crate::storage::{KeyValueStore, keys, read_json};

/// Authentication state at the moment of a single call.
pub enum AuthState {
    /// No valid token: operate on the local guest cart.
    Guest,
    /// Valid non-expired token: operate on the remote cart.
    Authenticated { token: SecretString },
}

impl AuthState {
    /// Whether this state routes to the remote cart.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// The stored user record, normalized from backend field variants.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    /// Stored as either a JSON string or a number.
    #[serde(alias = "usuarioId", deserialize_with = "crate::api::types::id_string")]
    pub id: String,
    #[serde(default, alias = "name")]
    pub nombre: String,
    #[serde(default)]
    pub email: String,
    /// Backend sends `rol` or `role` depending on the endpoint.
    #[serde(default, alias = "role")]
    pub rol: String,
}

/// Reader over the externally-managed session keys.
#[derive(Clone)]
pub struct SessionState {
    store: Arc<dyn KeyValueStore>,
}

impl SessionState {
    /// Create a reader over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Compute the current authentication state.
    ///
    /// Absent, undecodable, and expired tokens all mean guest.
    #[must_use]
    pub fn auth_state(&self) -> AuthState {
        let Some(token) = self.store.get(keys::AUTH_TOKEN) else {
            return AuthState::Guest;
        };
        if token_expired(&token) {
            debug!("Stored token is expired or undecodable; treating session as guest");
            return AuthState::Guest;
        }
        AuthState::Authenticated {
            token: SecretString::from(token),
        }
    }

    /// The stored user record, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<CurrentUser> {
        read_json(self.store.as_ref(), keys::CURRENT_USER)
    }
}

#[derive(Deserialize)]
struct TokenClaims {
    exp: Option<i64>,
}

/// Whether a JWT's `exp` claim is missing, unreadable, or in the past.
fn token_expired(token: &str) -> bool {
    let Some(payload) = token.split('.').nth(1) else {
        return true;
    };
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(payload) else {
        return true;
    };
    let Ok(claims) = serde_json::from_slice::<TokenClaims>(&bytes) else {
        return true;
    };
    match claims.exp {
        Some(exp) => exp <= Utc::now().timestamp(),
        None => true,
    }
}

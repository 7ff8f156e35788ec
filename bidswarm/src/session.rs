//! Credential exchange and the per-user token cache.
use crate::transport::{HttpResponse, Transport, TransportError};
use bidswarm_core::Identity;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// JSON pointers probed, in order, for the access token of a login response.
/// The first non-empty string wins.
pub const TOKEN_POINTERS: &[&str] = &[
    "/data/access_token",
    "/data/accessToken",
    "/data/token",
    "/access_token",
    "/token",
    "/authorization/token",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("login rejected with status {status}")]
    Rejected { status: u16, body: String },

    #[error("login returned status {status} without a token")]
    MissingToken { status: u16, body: String },

    #[error("login request failed: {0}")]
    Transport(#[from] TransportError),
}

impl AuthError {
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Rejected { status, .. } | AuthError::MissingToken { status, .. } => {
                Some(*status)
            }
            AuthError::Transport(_) => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            AuthError::Rejected { body, .. } | AuthError::MissingToken { body, .. } => Some(body),
            AuthError::Transport(_) => None,
        }
    }
}

pub fn extract_token(body: &Value) -> Option<String> {
    TOKEN_POINTERS
        .iter()
        .filter_map(|pointer| body.pointer(pointer))
        .filter_map(Value::as_str)
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

/// Exchange an identity's credentials for an access token.
///
/// Succeeds only on a `200` carrying a token.
pub async fn login<T: Transport>(
    transport: &T,
    url: &str,
    identity: &Identity,
    timeout: Duration,
) -> Result<String, AuthError> {
    let body = json!({
        "email": identity.login,
        "password": identity.password,
    });
    let res = transport.post_json(url, &body, None, timeout).await?;
    classify(&res)
}

fn classify(res: &HttpResponse) -> Result<String, AuthError> {
    if res.status != 200 {
        return Err(AuthError::Rejected {
            status: res.status,
            body: res.truncated_body(),
        });
    }

    res.json()
        .as_ref()
        .and_then(extract_token)
        .ok_or_else(|| AuthError::MissingToken {
            status: res.status,
            body: res.truncated_body(),
        })
}

/// One virtual user's authentication state. Never shared between users.
#[derive(Debug)]
pub struct Session {
    identity: Identity,
    token: Option<String>,
}

impl Session {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            token: None,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Return the cached token, logging in first if there is none yet.
    pub async fn authenticate<T: Transport>(
        &mut self,
        transport: &T,
        url: &str,
        timeout: Duration,
    ) -> Result<&str, AuthError> {
        if self.token.is_none() {
            let token = login(transport, url, &self.identity, timeout).await?;
            debug!("Logged in as {}", self.identity.login);
            self.token = Some(token);
        } else {
            trace!("Reusing cached token for {}", self.identity.login);
        }

        Ok(self.token.as_deref().unwrap_or_default())
    }
}

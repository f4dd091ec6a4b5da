//! Identity source for every backend call.
//!
//! The gateway never reaches for a global session: it asks an injected
//! [`AuthProvider`] who is signed in and for a bearer token, once per call.

use async_trait::async_trait;

use crate::error::{DesignError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The signed-in identity, or `None` when nobody is signed in.
    ///
    /// Implementations must only resolve once the initial auth state is
    /// known, so "not determined yet" is never reported as "signed out".
    async fn current_identity(&self) -> Option<Identity>;

    /// Mint a bearer token for `identity`. Fails when the identity is no longer valid.
    async fn token(&self, identity: &Identity, force_refresh: bool) -> Result<String>;
}

/// Fixed identity and token, for headless runs against a backend that issued a long-lived token.
pub struct StaticTokenProvider {
    identity: Option<Identity>,
    token: String,
}

impl StaticTokenProvider {
    pub fn new(uid: impl Into<String>, token: impl Into<String>) -> Self {
        Self { identity: Some(Identity { uid: uid.into() }), token: token.into() }
    }

    pub fn signed_out() -> Self {
        Self { identity: None, token: String::new() }
    }

    /// `DESIGN_USER_ID` + `DESIGN_API_TOKEN`; signed out unless both are set.
    pub fn from_env() -> Self {
        match (std::env::var("DESIGN_USER_ID"), std::env::var("DESIGN_API_TOKEN")) {
            (Ok(uid), Ok(token)) if !uid.is_empty() && !token.is_empty() => Self::new(uid, token),
            _ => Self::signed_out(),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticTokenProvider {
    async fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }

    async fn token(&self, identity: &Identity, _force_refresh: bool) -> Result<String> {
        match &self.identity {
            Some(own) if own == identity => Ok(self.token.clone()),
            _ => Err(DesignError::TokenUnavailable(format!("no token for user {}", identity.uid))),
        }
    }
}

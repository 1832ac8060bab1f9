//! Token-verification boundary.
//!
//! The identity provider is an external collaborator: given an opaque
//! bearer token it either yields a verified (uid, email, name) triple or
//! fails with an [`AuthError`]. The core never talks to a real provider;
//! it consumes the triple through the [`TokenVerifier`] trait.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Verified identity triple returned by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Subject id at the identity provider.
    pub uid: String,
    pub email: String,
    /// Display name, when the provider has one.
    pub name: Option<String>,
}

impl AuthenticatedUser {
    pub fn new(uid: impl Into<String>, email: impl Into<String>, name: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            name,
        }
    }

    /// Display name, falling back to the local part of the email.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(self.email.as_str())
                .to_string(),
        }
    }
}

/// Oracle that turns an opaque bearer token into a verified identity.
pub trait TokenVerifier {
    /// Verify `token` and return the identity triple it proves.
    ///
    /// # Errors
    /// [`AuthError::MissingToken`] when the token is blank,
    /// [`AuthError::InvalidToken`] when it does not verify.
    fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

/// In-memory verifier mapping known tokens to identities.
///
/// Stands in for the real identity provider in tests and for the CLI's
/// local operator profile.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, AuthenticatedUser>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` as proving `identity`.
    pub fn insert(&mut self, token: impl Into<String>, identity: AuthenticatedUser) {
        self.tokens.insert(token.into(), identity);
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

//! Credential extraction and verification.
//!
//! # Responsibilities
//! - Read the admin and session credentials from cookies / Authorization
//! - Verify them and collapse every failure into a verdict the gate can use
//! - Remember where a rejected session token came from
//!
//! # Design Decisions
//! - The session cookie takes precedence over a Bearer header
//! - Verification never fails the request; errors become `Invalid`

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;

use crate::config::AdminCredentialMode;
use crate::gate::token::{SessionClaims, TokenError, TokenSigner};

/// Cookie holding the session credential.
pub const SESSION_COOKIE_NAME: &str = "token";

/// Cookie holding the admin credential.
pub const ADMIN_COOKIE_NAME: &str = "admin_token";

/// Value of the admin cookie in sentinel mode.
pub const ADMIN_SENTINEL: &str = "authenticated";

/// Where a session token was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Cookie,
    BearerHeader,
}

/// Outcome of session credential verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCredential {
    /// No token in cookie or header.
    Absent,
    Valid(SessionClaims),
    /// A token was presented but failed verification.
    Invalid {
        source: TokenSource,
        error: TokenError,
    },
}

impl UserCredential {
    pub fn is_valid(&self) -> bool {
        matches!(self, UserCredential::Valid(_))
    }

    /// True when a stale session cookie should be removed from the browser.
    pub fn has_stale_cookie(&self) -> bool {
        matches!(
            self,
            UserCredential::Invalid {
                source: TokenSource::Cookie,
                ..
            }
        )
    }
}

/// Outcome of admin credential verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCredential {
    Valid,
    Invalid,
}

/// Verifies both credential kinds for one gate configuration.
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    signer: TokenSigner,
    admin_mode: AdminCredentialMode,
}

impl CredentialVerifier {
    pub fn new(signer: TokenSigner, admin_mode: AdminCredentialMode) -> Self {
        Self { signer, admin_mode }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub fn admin_mode(&self) -> AdminCredentialMode {
        self.admin_mode
    }

    /// Check the `admin_token` cookie.
    pub fn verify_admin(&self, headers: &HeaderMap) -> AdminCredential {
        let Some(value) = cookie_value(headers, ADMIN_COOKIE_NAME) else {
            return AdminCredential::Invalid;
        };

        let valid = match self.admin_mode {
            AdminCredentialMode::Sentinel => value == ADMIN_SENTINEL,
            AdminCredentialMode::Signed => match self.signer.verify_admin(value) {
                Ok(_) => true,
                Err(e) => {
                    tracing::debug!(error = %e, "Rejected admin credential");
                    false
                }
            },
        };

        if valid {
            AdminCredential::Valid
        } else {
            AdminCredential::Invalid
        }
    }

    /// Check the session credential, cookie first, then Bearer header.
    pub fn verify_user(&self, headers: &HeaderMap) -> UserCredential {
        let (token, source) = match cookie_value(headers, SESSION_COOKIE_NAME) {
            Some(token) => (token, TokenSource::Cookie),
            None => match bearer_token(headers) {
                Some(token) => (token, TokenSource::BearerHeader),
                None => return UserCredential::Absent,
            },
        };

        match self.signer.verify_session(token) {
            Ok(claims) => UserCredential::Valid(claims),
            Err(error) => {
                tracing::debug!(error = %error, source = ?source, "Rejected session credential");
                UserCredential::Invalid { source, error }
            }
        }
    }
}

/// Find a cookie by name across all `Cookie` headers.
///
/// Empty values count as absent.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| val.trim())
        })
        .find(|val| !val.is_empty())
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

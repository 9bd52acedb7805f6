//! Signed credentials: issuing and verifying HS256 tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Role carried by signed admin credentials.
pub const ADMIN_ROLE: &str = "admin";

/// Why a token was rejected.
///
/// The gate treats every variant the same way; the distinction exists for logs
/// and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token signature does not match")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Claims of a session (or signed admin) credential.
///
/// Tokens minted by the dashboard's login route carry `userId`; other issuers
/// use `sub`. Both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    /// The authenticated subject, if the issuer included one.
    pub fn subject(&self) -> Option<&str> {
        self.user_id.as_deref().or(self.sub.as_deref())
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}

/// Signs and verifies credentials with one shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Issue a session credential valid for `ttl`.
    pub fn issue_session(
        &self,
        user_id: &str,
        email: Option<&str>,
        username: Option<&str>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = expiry(now, ttl)?;
        let claims = SessionClaims {
            user_id: Some(user_id.to_string()),
            sub: None,
            email: email.map(str::to_string),
            username: username.map(str::to_string),
            role: None,
            iat: now.timestamp(),
            exp,
        };
        self.sign(&claims)
    }

    /// Issue a signed admin credential valid for `ttl`.
    pub fn issue_admin(&self, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = expiry(now, ttl)?;
        let claims = SessionClaims {
            user_id: None,
            sub: Some(ADMIN_ROLE.to_string()),
            email: None,
            username: None,
            role: Some(ADMIN_ROLE.to_string()),
            iat: now.timestamp(),
            exp,
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        Ok(decode::<SessionClaims>(token, &self.decoding, &self.validation)?.claims)
    }

    /// Verify a user session credential. Admin tokens are not sessions.
    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let claims = self.verify(token)?;
        if claims.is_admin() {
            return Err(TokenError::Malformed("admin credential used as session".into()));
        }
        Ok(claims)
    }

    /// Verify a signed admin credential.
    pub fn verify_admin(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let claims = self.verify(token)?;
        if !claims.is_admin() {
            return Err(TokenError::Malformed("missing admin role".into()));
        }
        Ok(claims)
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<i64, TokenError> {
    now.checked_add_signed(ttl)
        .map(|at| at.timestamp())
        .ok_or_else(|| TokenError::Signing(format!("expiry {ttl} is out of range")))
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

//! Request gate subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (path, Cookie, Authorization)
//!     → classifier.rs (path → RouteCategory)
//!     → credentials.rs (verify only the credential the category needs)
//!         → token.rs (HS256 signature + expiry)
//!     → decision.rs (category × verdict → Action)
//!     → middleware.rs (forward, or redirect; clear stale cookie)
//! ```
//!
//! # Design Decisions
//! - Stateless per request; the compiled `Gate` is swapped as a whole on reload
//! - Verification failures never escape: they become redirects
//! - The signing secret is injected from configuration, never read globally

pub mod classifier;
pub mod cookies;
pub mod credentials;
pub mod decision;
pub mod middleware;
pub mod token;

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::{HeaderMap, HeaderName};
use secrecy::SecretString;

use crate::config::schema::{DEV_FALLBACK_SECRET, MAX_ADMIN_TTL_HOURS};
use crate::config::{AdminCredentialMode, GatewayConfig};

pub use classifier::{RouteCategory, RouteClassifier};
pub use cookies::CookiePolicy;
pub use credentials::{AdminCredential, CredentialVerifier, TokenSource, UserCredential};
pub use decision::{decide, Action, Decision, Evidence};
pub use middleware::gate_middleware;
pub use token::{SessionClaims, TokenError, TokenSigner};

/// Gate handle shared between the middleware and the reload loop.
pub type SharedGate = Arc<ArcSwap<Gate>>;

/// Everything the gate needs, compiled from one configuration snapshot.
#[derive(Debug)]
pub struct Gate {
    classifier: RouteClassifier,
    verifier: CredentialVerifier,
    cookies: CookiePolicy,
    identity_header: Option<HeaderName>,
    admin_ttl: chrono::Duration,
}

impl Gate {
    pub fn from_config(config: &GatewayConfig) -> Self {
        let signer = TokenSigner::new(&signing_secret(config));

        // Validation rejects bad names before a config gets here.
        let identity_header = Some(config.upstream.identity_header.as_str())
            .filter(|h| !h.is_empty())
            .and_then(|h| HeaderName::from_bytes(h.as_bytes()).ok());

        // Clamped so a config that skipped validation cannot overflow.
        let admin_hours = config.admin.session_ttl_hours.clamp(1, MAX_ADMIN_TTL_HOURS);
        let admin_ttl = chrono::TimeDelta::try_hours(admin_hours).unwrap_or(chrono::TimeDelta::hours(24));

        Self {
            classifier: RouteClassifier::from_config(&config.gate),
            verifier: CredentialVerifier::new(signer, config.admin.credential_mode),
            cookies: CookiePolicy {
                secure: config.environment.is_production(),
                admin_max_age_secs: admin_ttl.num_seconds(),
            },
            identity_header,
            admin_ttl,
        }
    }

    pub fn shared(gate: Gate) -> SharedGate {
        Arc::new(ArcSwap::from_pointee(gate))
    }

    /// Classify `path`, verify what the category needs, and decide.
    pub fn evaluate(&self, path: &str, headers: &HeaderMap) -> (Decision, Evidence) {
        let category = self.classifier.classify(path);
        let evidence = match category {
            RouteCategory::AdminAuth | RouteCategory::AdminProtected => {
                Evidence::Admin(self.verifier.verify_admin(headers))
            }
            RouteCategory::UserProtected | RouteCategory::UserAuth => {
                Evidence::User(self.verifier.verify_user(headers))
            }
            RouteCategory::Excluded | RouteCategory::Public => Evidence::NotChecked,
        };
        (decide(category, path, &evidence), evidence)
    }

    pub fn signer(&self) -> &TokenSigner {
        self.verifier.signer()
    }

    pub fn cookies(&self) -> &CookiePolicy {
        &self.cookies
    }

    pub fn identity_header(&self) -> Option<&HeaderName> {
        self.identity_header.as_ref()
    }

    pub fn admin_mode(&self) -> AdminCredentialMode {
        self.verifier.admin_mode()
    }

    /// Value to store in the admin cookie after a successful login.
    pub fn admin_cookie_value(&self) -> Result<String, TokenError> {
        match self.admin_mode() {
            AdminCredentialMode::Sentinel => Ok(credentials::ADMIN_SENTINEL.to_string()),
            AdminCredentialMode::Signed => self.signer().issue_admin(self.admin_ttl),
        }
    }
}

/// The configured secret, or the development fallback.
pub fn signing_secret(config: &GatewayConfig) -> SecretString {
    match config.auth.jwt_secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) => SecretString::from(secret.to_string()),
        None => {
            tracing::warn!("JWT_SECRET not set; using the development fallback secret");
            SecretString::from(DEV_FALLBACK_SECRET.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn evaluate_only_checks_needed_credential() {
        let gate = Gate::from_config(&GatewayConfig::default());
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("admin_token=authenticated"));

        let (decision, evidence) = gate.evaluate("/blogs", &headers);
        assert_eq!(decision.action, Action::Allow);
        assert_eq!(evidence, Evidence::NotChecked);

        let (decision, evidence) = gate.evaluate("/admin/requests", &headers);
        assert_eq!(decision.action, Action::Allow);
        assert_eq!(evidence, Evidence::Admin(AdminCredential::Valid));

        let (decision, _) = gate.evaluate("/api/admin/users", &HeaderMap::new());
        assert_eq!(decision.action, Action::Bypass);
    }

    #[test]
    fn fallback_secret_matches_dev_tokens() {
        let gate = Gate::from_config(&GatewayConfig::default());
        let dev = TokenSigner::new(&SecretString::from(DEV_FALLBACK_SECRET.to_string()));
        let token = dev
            .issue_session("u", None, None, chrono::Duration::hours(1))
            .unwrap();
        assert!(gate.signer().verify_session(&token).is_ok());
    }

    #[test]
    fn admin_cookie_value_follows_mode() {
        let mut config = GatewayConfig::default();
        assert_eq!(
            Gate::from_config(&config).admin_cookie_value().unwrap(),
            "authenticated"
        );

        config.admin.credential_mode = AdminCredentialMode::Signed;
        let gate = Gate::from_config(&config);
        let value = gate.admin_cookie_value().unwrap();
        assert!(gate.signer().verify_admin(&value).is_ok());
    }

    #[test]
    fn production_cookies_are_secure() {
        let mut config = GatewayConfig::default();
        config.environment = crate::config::Environment::Production;
        config.auth.jwt_secret = Some("x".into());
        assert!(Gate::from_config(&config).cookies().secure);
        assert!(!Gate::from_config(&GatewayConfig::default()).cookies().secure);
    }

    #[test]
    fn oversized_admin_ttl_is_clamped() {
        let mut config = GatewayConfig::default();
        config.admin.session_ttl_hours = i64::MAX / 1000;
        config.admin.credential_mode = AdminCredentialMode::Signed;

        let gate = Gate::from_config(&config);
        assert_eq!(gate.cookies().admin_max_age_secs, MAX_ADMIN_TTL_HOURS * 3600);
        assert!(gate.admin_cookie_value().is_ok());
    }

}

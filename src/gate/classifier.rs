//! Route classification.
//!
//! # Responsibilities
//! - Map a request path to the category the gate acts on
//! - Identify paths that bypass the gate entirely
//!
//! # Design Decisions
//! - Plain `starts_with` prefix matching, no regex
//! - The admin login page is an exact match and is checked before the admin prefix
//! - Unmatched paths are public

use std::fmt;

use crate::config::GateConfig;

/// What the gate does with a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteCategory {
    /// API routes and framework assets; never gated.
    Excluded,
    /// The admin login page.
    AdminAuth,
    /// Everything else under the admin prefix.
    AdminProtected,
    /// Pages that require a signed-in user.
    UserProtected,
    /// User login and registration pages.
    UserAuth,
    Public,
}

impl RouteCategory {
    /// Stable label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            RouteCategory::Excluded => "excluded",
            RouteCategory::AdminAuth => "admin_auth",
            RouteCategory::AdminProtected => "admin_protected",
            RouteCategory::UserProtected => "user_protected",
            RouteCategory::UserAuth => "user_auth",
            RouteCategory::Public => "public",
        }
    }
}

impl fmt::Display for RouteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiled prefix tables.
#[derive(Debug, Clone)]
pub struct RouteClassifier {
    excluded: Vec<String>,
    admin_prefix: String,
    admin_login: String,
    protected: Vec<String>,
    auth: Vec<String>,
}

impl RouteClassifier {
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            excluded: config.excluded_prefixes.clone(),
            admin_prefix: config.admin_prefix.clone(),
            admin_login: config.admin_login_path.clone(),
            protected: config.protected_prefixes.clone(),
            auth: config.auth_prefixes.clone(),
        }
    }

    pub fn classify(&self, path: &str) -> RouteCategory {
        if has_prefix(&self.excluded, path) {
            return RouteCategory::Excluded;
        }
        if path == self.admin_login {
            return RouteCategory::AdminAuth;
        }
        if path.starts_with(&self.admin_prefix) {
            return RouteCategory::AdminProtected;
        }
        if has_prefix(&self.protected, path) {
            return RouteCategory::UserProtected;
        }
        if has_prefix(&self.auth, path) {
            return RouteCategory::UserAuth;
        }
        RouteCategory::Public
    }
}

impl Default for RouteClassifier {
    fn default() -> Self {
        Self::from_config(&GateConfig::default())
    }
}

fn has_prefix(prefixes: &[String], path: &str) -> bool {
    prefixes.iter().any(|p| path.starts_with(p.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        let c = RouteClassifier::default();
        let cases = [
            ("/admin/login", RouteCategory::AdminAuth),
            ("/admin/dashboard", RouteCategory::AdminProtected),
            ("/admin/users/42", RouteCategory::AdminProtected),
            ("/admin", RouteCategory::AdminProtected),
            ("/profile", RouteCategory::UserProtected),
            ("/analysis/regions", RouteCategory::UserProtected),
            ("/predict", RouteCategory::UserProtected),
            ("/notifications", RouteCategory::UserProtected),
            ("/feedback", RouteCategory::UserProtected),
            ("/auth/login", RouteCategory::UserAuth),
            ("/auth/register", RouteCategory::UserAuth),
            ("/", RouteCategory::Public),
            ("/blogs", RouteCategory::Public),
            ("/dashboard", RouteCategory::Public),
        ];
        for (path, expected) in cases {
            assert_eq!(c.classify(path), expected, "path {}", path);
        }
    }

    #[test]
    fn excluded_paths_win() {
        let c = RouteClassifier::default();
        for path in [
            "/api/admin/users",
            "/api/auth/login",
            "/_next/static/chunks/main.js",
            "/_next/image",
            "/favicon.ico",
            "/assets/logo.svg",
        ] {
            assert_eq!(c.classify(path), RouteCategory::Excluded, "path {}", path);
        }
    }

    #[test]
    fn admin_login_is_exact() {
        let c = RouteClassifier::default();
        assert_eq!(c.classify("/admin/login/extra"), RouteCategory::AdminProtected);
    }

    #[test]
    fn custom_tables() {
        let mut config = GateConfig::default();
        config.protected_prefixes = vec!["/dashboard".into()];
        let c = RouteClassifier::from_config(&config);
        assert_eq!(c.classify("/dashboard/models"), RouteCategory::UserProtected);
        assert_eq!(c.classify("/profile"), RouteCategory::Public);
    }
}

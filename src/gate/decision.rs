//! Gate decision table.
//!
//! `decide` is a pure function of the route category and the credential
//! evidence gathered for it. It never fails: every verification problem has
//! already been folded into an `Invalid` verdict.

use std::fmt;

use url::form_urlencoded;

use crate::gate::classifier::RouteCategory;
use crate::gate::credentials::{AdminCredential, UserCredential};

pub const ADMIN_LOGIN_PATH: &str = "/admin/login";
pub const ADMIN_DASHBOARD_PATH: &str = "/admin/dashboard";
pub const USER_LOGIN_PATH: &str = "/auth/login";
pub const PROFILE_PATH: &str = "/profile";
pub const CALLBACK_PARAM: &str = "callbackUrl";

/// Credentials checked for a request. Only the kind the category needs is
/// ever verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    NotChecked,
    Admin(AdminCredential),
    User(UserCredential),
}

/// What to do with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Not gated at all.
    Bypass,
    Allow,
    RedirectAdminLogin,
    RedirectAdminDashboard,
    /// Send to the user login page, remembering where the user was going.
    RedirectLogin { callback: String },
    RedirectProfile,
}

impl Action {
    /// `Location` for redirects.
    pub fn location(&self) -> Option<String> {
        match self {
            Action::Bypass | Action::Allow => None,
            Action::RedirectAdminLogin => Some(ADMIN_LOGIN_PATH.to_string()),
            Action::RedirectAdminDashboard => Some(ADMIN_DASHBOARD_PATH.to_string()),
            Action::RedirectProfile => Some(PROFILE_PATH.to_string()),
            Action::RedirectLogin { callback } => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair(CALLBACK_PARAM, callback)
                    .finish();
                Some(format!("{}?{}", USER_LOGIN_PATH, query))
            }
        }
    }

    pub fn forwards(&self) -> bool {
        matches!(self, Action::Bypass | Action::Allow)
    }
}

/// Outcome of the gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub category: RouteCategory,
    pub action: Action,
    /// Expire the session cookie in the response.
    pub clear_session_cookie: bool,
}

impl Decision {
    fn new(category: RouteCategory, action: Action) -> Self {
        Self {
            category,
            action,
            clear_session_cookie: false,
        }
    }

    fn clearing_session(mut self, clear: bool) -> Self {
        self.clear_session_cookie = clear;
        self
    }

    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match (&self.action, self.clear_session_cookie) {
            (Action::Bypass, _) => "bypass",
            (Action::Allow, false) => "allow",
            (Action::Allow, true) => "allow_clear_cookie",
            (Action::RedirectAdminLogin, _) => "redirect_admin_login",
            (Action::RedirectAdminDashboard, _) => "redirect_admin_dashboard",
            (Action::RedirectLogin { .. }, false) => "redirect_login",
            (Action::RedirectLogin { .. }, true) => "strip_cookie_and_redirect",
            (Action::RedirectProfile, _) => "redirect_profile",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.category, self.label())
    }
}

/// Apply the decision table.
///
/// Evidence of the wrong kind for a category counts as missing credentials.
pub fn decide(category: RouteCategory, path: &str, evidence: &Evidence) -> Decision {
    let admin_valid = matches!(evidence, Evidence::Admin(AdminCredential::Valid));
    let user = match evidence {
        Evidence::User(user) => Some(user),
        _ => None,
    };
    let user_valid = user.is_some_and(UserCredential::is_valid);
    let stale_cookie = user.is_some_and(UserCredential::has_stale_cookie);

    match category {
        RouteCategory::Excluded => Decision::new(category, Action::Bypass),
        RouteCategory::Public => Decision::new(category, Action::Allow),

        RouteCategory::AdminProtected if admin_valid => Decision::new(category, Action::Allow),
        RouteCategory::AdminProtected => Decision::new(category, Action::RedirectAdminLogin),

        RouteCategory::AdminAuth if admin_valid => {
            Decision::new(category, Action::RedirectAdminDashboard)
        }
        RouteCategory::AdminAuth => Decision::new(category, Action::Allow),

        RouteCategory::UserProtected if user_valid => Decision::new(category, Action::Allow),
        RouteCategory::UserProtected => Decision::new(
            category,
            Action::RedirectLogin {
                callback: path.to_string(),
            },
        )
        .clearing_session(stale_cookie),

        RouteCategory::UserAuth if user_valid => Decision::new(category, Action::RedirectProfile),
        // The stale cookie is only cleared when one was actually sent.
        RouteCategory::UserAuth => {
            Decision::new(category, Action::Allow).clearing_session(stale_cookie)
        }
    }
}

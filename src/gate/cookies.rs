//! `Set-Cookie` values for the two credentials.

use axum::http::header::InvalidHeaderValue;
use axum::http::HeaderValue;

use crate::gate::credentials::ADMIN_COOKIE_NAME;

/// Cookie attributes that depend on deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    /// Add `Secure`; set in production.
    pub secure: bool,
    pub admin_max_age_secs: i64,
}

impl CookiePolicy {
    /// Admin cookie carrying `value` (the sentinel or a signed token).
    pub fn admin_cookie(&self, value: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{ADMIN_COOKIE_NAME}={value}; Path=/; HttpOnly; Max-Age={}",
            self.admin_max_age_secs
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }

    pub fn clear_admin_cookie(&self) -> HeaderValue {
        HeaderValue::from_static(if self.secure {
            CLEAR_ADMIN_SECURE
        } else {
            CLEAR_ADMIN
        })
    }

    pub fn clear_session_cookie(&self) -> HeaderValue {
        HeaderValue::from_static(if self.secure {
            CLEAR_SESSION_SECURE
        } else {
            CLEAR_SESSION
        })
    }
}

const CLEAR_ADMIN: &str =
    "admin_token=; Path=/; HttpOnly; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT";
const CLEAR_ADMIN_SECURE: &str =
    "admin_token=; Path=/; HttpOnly; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Secure";
const CLEAR_SESSION: &str =
    "token=; Path=/; HttpOnly; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; SameSite=Strict";
const CLEAR_SESSION_SECURE: &str =
    "token=; Path=/; HttpOnly; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; SameSite=Strict; Secure";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_cookie_attributes() {
        let policy = CookiePolicy { secure: false, admin_max_age_secs: 86_400 };
        let value = policy.admin_cookie("authenticated").unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "admin_token=authenticated; Path=/; HttpOnly; Max-Age=86400"
        );

        let secure = CookiePolicy { secure: true, ..policy };
        assert!(secure.admin_cookie("x").unwrap().to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn clearing_cookies_expire_immediately() {
        let policy = CookiePolicy { secure: true, admin_max_age_secs: 1 };
        let session = policy.clear_session_cookie();
        let session = session.to_str().unwrap();
        assert!(session.starts_with("token=;"));
        assert!(session.contains("Max-Age=0"));
        assert!(session.contains("SameSite=Strict"));
        assert!(session.contains("Secure"));

        let admin = policy.clear_admin_cookie();
        assert!(admin.to_str().unwrap().starts_with("admin_token=;"));
    }

    #[test]
    fn clearing_cookies_name_the_credentials() {
        use crate::gate::credentials::SESSION_COOKIE_NAME;

        for secure in [false, true] {
            let policy = CookiePolicy { secure, admin_max_age_secs: 1 };
            let admin = policy.clear_admin_cookie();
            let session = policy.clear_session_cookie();
            assert!(admin.to_str().unwrap().starts_with(&format!("{ADMIN_COOKIE_NAME}=;")));
            assert!(session.to_str().unwrap().starts_with(&format!("{SESSION_COOKIE_NAME}=;")));
            assert_eq!(admin.to_str().unwrap().ends_with("; Secure"), secure);
            assert_eq!(session.to_str().unwrap().ends_with("; Secure"), secure);
        }
    }

    #[test]
    fn rejects_header_injection() {
        let policy = CookiePolicy { secure: false, admin_max_age_secs: 1 };
        assert!(policy.admin_cookie("a\r\nb").is_err());
    }
}

//! Admin credential check.

use serde::Deserialize;

use crate::config::AdminConfig;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// True when `request` matches the configured admin credentials.
pub fn check_credentials(config: &AdminConfig, request: &LoginRequest) -> bool {
    let (Some(email), Some(password)) = (&config.email, &config.password) else {
        return false;
    };
    // Evaluate both so timing does not reveal which field was wrong.
    let email_ok = constant_time_eq(email.as_bytes(), request.email.as_bytes());
    let password_ok = constant_time_eq(password.as_bytes(), request.password.as_bytes());
    email_ok & password_ok
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AdminConfig {
        AdminConfig {
            email: Some("ops@climate.example".into()),
            password: Some("hunter22".into()),
            ..AdminConfig::default()
        }
    }

    fn request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn matches_only_exact_credentials() {
        let config = config();
        assert!(check_credentials(&config, &request("ops@climate.example", "hunter22")));
        assert!(!check_credentials(&config, &request("ops@climate.example", "hunter2")));
        assert!(!check_credentials(&config, &request("OPS@climate.example", "hunter22")));
    }

    #[test]
    fn unconfigured_admin_never_matches() {
        assert!(!check_credentials(&AdminConfig::default(), &request("", "")));
    }

    #[test]
    fn debug_hides_password() {
        let dbg = format!("{:?}", request("a@b.c", "s3cret"));
        assert!(!dbg.contains("s3cret"));
    }
}

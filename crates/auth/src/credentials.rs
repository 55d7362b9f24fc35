use sha2::{Digest, Sha256};
use std::fmt;

/// The fixed username/password pair that gates admin login.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// True only when both fields match.
    ///
    /// Both comparisons always run over fixed-length digests, so a wrong
    /// username and a wrong password take the same time to reject.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        let username_ok = constant_time_eq(&digest(&self.username), &digest(username));
        let password_ok = constant_time_eq(&digest(&self.password), &digest(password));
        username_ok & password_ok
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

/// Constant-time byte comparison to prevent timing attacks
fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_exact_pair() {
        let creds = AdminCredentials::new("admin", "cieloytierra2024");
        assert!(creds.matches("admin", "cieloytierra2024"));
    }

    #[test]
    fn test_rejects_any_mismatch() {
        let creds = AdminCredentials::new("admin", "cieloytierra2024");
        assert!(!creds.matches("admin", "wrong"));
        assert!(!creds.matches("root", "cieloytierra2024"));
        assert!(!creds.matches("Admin", "cieloytierra2024"));
        assert!(!creds.matches("", ""));
        assert!(!creds.matches("admin", "cieloytierra2024 "));
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = AdminCredentials::new("admin", "cieloytierra2024");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("cieloytierra2024"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(&digest("123456"), &digest("123456")));
        assert!(!constant_time_eq(&digest("123456"), &digest("123457")));
    }
}

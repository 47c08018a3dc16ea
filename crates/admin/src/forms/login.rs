//! Login form.

use std::fmt;

use secrecy::SecretString;
use serde::Deserialize;

use tyhub_core::Email;

use super::FormErrors;

/// Shortest password the API accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Raw login form submission.
#[derive(Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember_me: Option<String>,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

/// Validated credentials.
#[derive(Debug)]
pub struct LoginInput {
    pub email: Email,
    pub password: SecretString,
    pub remember_me: bool,
}

impl LoginForm {
    /// Validate the submission.
    ///
    /// # Errors
    ///
    /// Returns field errors for `email` and `password`.
    pub fn validate(&self) -> Result<LoginInput, FormErrors> {
        let mut errors = FormErrors::new();

        let email = self.email.trim();
        let email = if email.is_empty() {
            errors.add("email", "Email is required");
            None
        } else {
            Email::parse(email)
                .map_err(|_| errors.add("email", "Invalid email address"))
                .ok()
        };

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add("password", "Password must be at least 6 characters");
        }

        match email {
            Some(email) if errors.is_empty() => Ok(LoginInput {
                email,
                password: SecretString::from(self.password.clone()),
                remember_me: self.remember_me.as_deref().is_some_and(|v| !v.is_empty()),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.to_string(),
            password: password.to_string(),
            remember_me: None,
        }
    }

    #[test]
    fn test_valid_credentials() {
        let input = form(" admin@tyhub.com ", "secret1").validate().unwrap();
        assert_eq!(input.email.as_str(), "admin@tyhub.com");
        assert_eq!(input.password.expose_secret(), "secret1");
        assert!(!input.remember_me);
    }

    #[test]
    fn test_missing_fields() {
        let errors = form("", "").validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.get("password"), Some("Password is required"));
    }

    #[test]
    fn test_invalid_email() {
        let errors = form("admin@localhost", "secret1").validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Invalid email address"));
        assert_eq!(errors.get("password"), None);
    }

    #[test]
    fn test_short_password() {
        let errors = form("admin@tyhub.com", "12345").validate().unwrap_err();
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters")
        );
    }

    #[test]
    fn test_remember_me_checkbox() {
        let mut login = form("admin@tyhub.com", "secret1");
        login.remember_me = Some("on".to_string());
        assert!(login.validate().unwrap().remember_me);
    }

    #[test]
    fn test_debug_hides_password() {
        assert!(!format!("{:?}", form("a@b.cd", "hunter22")).contains("hunter22"));
    }
}

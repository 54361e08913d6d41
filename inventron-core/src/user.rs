//! User identities held by the credential store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ValidationError, ValidationErrors};

pub const MAX_USERNAME_LEN: usize = 150;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered user. Never mutated after registration.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// PHC-formatted password hash.
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("date_joined", &self.date_joined)
            .finish()
    }
}

/// Check a registration request's username and password.
///
/// Usernames follow the usual account rules: letters, digits and `@.+-_`.
/// Returns the trimmed username.
pub fn validate_credentials(username: &str, password: &str) -> Result<String, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let username = username.trim();

    if username.is_empty() {
        errors.push(ValidationError::invalid("username", "This field may not be blank."));
    } else if username.chars().count() > MAX_USERNAME_LEN {
        errors.push(ValidationError::invalid(
            "username",
            format!("Ensure this field has no more than {MAX_USERNAME_LEN} characters."),
        ));
    } else if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        errors.push(ValidationError::invalid(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(ValidationError::invalid(
            "password",
            format!("Ensure this field has at least {MIN_PASSWORD_LEN} characters."),
        ));
    }

    errors.into_result(username.to_string())
}

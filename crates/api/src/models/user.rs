//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use emarket_core::{Email, UserId};

/// A registered account (domain type).
///
/// Never carries the password hash or the confirmation token, so it is safe
/// to return as a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    /// Normalized email address.
    pub email: Email,
    pub mobile_no: String,
    pub is_admin: bool,
    /// Whether the confirmation link has been followed.
    pub email_confirmed: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name used to greet the user in emails.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Fields needed to insert a new user.
pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a Email,
    pub mobile_no: &'a str,
    pub password_hash: &'a str,
    pub confirmation_token: &'a str,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: UserId::new(1),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: Email::parse("ada@mail.test").unwrap(),
            mobile_no: "09171234567".to_string(),
            is_admin: false,
            email_confirmed: true,
            created_at: DateTime::from_timestamp(0, 0).unwrap(),
            updated_at: DateTime::from_timestamp(0, 0).unwrap(),
        }
    }

    #[test]
    fn test_profile_json_is_camel_case() {
        let json = serde_json::to_value(user()).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["mobileNo"], "09171234567");
        assert_eq!(json["emailConfirmed"], true);
        assert_eq!(json["isAdmin"], false);
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("confirmationToken").is_none());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(user().display_name(), "Ada Lovelace");
    }
}

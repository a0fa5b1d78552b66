//! Authentication service.
//!
//! Registration, email confirmation, password login, password reset and
//! profile administration. Mail delivery is left to the caller so that a
//! failed send never fails the request.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::instrument;

use emarket_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::{NewUser, User};
use crate::services::tokens::TokenIssuer;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Random bytes in an email confirmation token.
const CONFIRMATION_TOKEN_BYTES: usize = 20;

/// Registration form fields, as submitted.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub mobile_no: &'a str,
    pub password: &'a str,
}

/// Result of presenting a confirmation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// The account was confirmed by this request.
    Confirmed,
    /// The token already confirmed its account earlier.
    AlreadyConfirmed,
}

/// A password reset token ready to be mailed.
#[derive(Debug, Clone)]
pub struct ResetRequest {
    pub user: User,
    pub token: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenIssuer,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenIssuer) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new, unconfirmed user.
    ///
    /// Returns the user and the confirmation token to mail them.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if any field is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip_all, fields(email = %form.email))]
    pub async fn register(&self, form: &Registration<'_>) -> Result<(User, String), AuthError> {
        let fields = [
            form.first_name,
            form.last_name,
            form.email,
            form.mobile_no,
            form.password,
        ];
        if fields.iter().any(|field| field.trim().is_empty()) {
            return Err(AuthError::MissingFields);
        }

        let email = Email::parse(form.email)?;
        validate_password(form.password)?;

        if self.users.get_by_email(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(form.password)?;
        let confirmation_token = generate_confirmation_token();

        // The unique index still catches a concurrent registration
        let user = self
            .users
            .create(&NewUser {
                first_name: form.first_name.trim(),
                last_name: form.last_name.trim(),
                email: &email,
                mobile_no: form.mobile_no.trim(),
                password_hash: &password_hash,
                confirmation_token: &confirmation_token,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok((user, confirmation_token))
    }

    /// Confirm an account's email with the token from the confirmation link.
    ///
    /// A token that already confirmed its account yields
    /// `ConfirmationOutcome::AlreadyConfirmed` rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidConfirmationToken` if no account matches.
    #[instrument(skip_all)]
    pub async fn confirm_email(&self, token: &str) -> Result<ConfirmationOutcome, AuthError> {
        if !is_well_formed_confirmation_token(token) {
            return Err(AuthError::InvalidConfirmationToken);
        }

        let digest = token_digest(token);
        if self.users.confirm_email(token, &digest).await? {
            tracing::info!("Email confirmed");
            return Ok(ConfirmationOutcome::Confirmed);
        }

        if self.users.confirmed_with_digest(&digest).await? {
            return Ok(ConfirmationOutcome::AlreadyConfirmed);
        }

        Err(AuthError::InvalidConfirmationToken)
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Login with email and password, returning an access token.
    ///
    /// The confirmation check comes before the password check.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email is malformed.
    /// Returns `AuthError::AccountNotFound` for an unknown email.
    /// Returns `AuthError::EmailNotConfirmed` for an unconfirmed account.
    /// Returns `AuthError::InvalidCredentials` if the password is wrong.
    #[instrument(skip(self, password, now))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        if !user.email_confirmed {
            return Err(AuthError::EmailNotConfirmed);
        }

        verify_password(password, &password_hash)?;

        let token = self.tokens.issue_access_token(user.id, user.is_admin, now)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(token)
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Issue a reset token for the account with this email, if any.
    ///
    /// Returns `Ok(None)` for unknown emails so callers can respond
    /// identically either way.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailRequired` if the email is blank.
    /// Returns `AuthError::InvalidEmail` if the email is malformed.
    #[instrument(skip(self, now))]
    pub async fn request_password_reset(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetRequest>, AuthError> {
        if email.trim().is_empty() {
            return Err(AuthError::EmailRequired);
        }
        let email = Email::parse(email)?;

        let Some(user) = self.users.get_by_email(&email).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(None);
        };

        let token = self.tokens.issue_reset_token(user.id, now)?;
        tracing::info!(user_id = %user.id, "Password reset token issued");
        Ok(Some(ResetRequest { user, token }))
    }

    /// Set a new password using a reset token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields`, `AuthError::PasswordMismatch` or
    /// `AuthError::WeakPassword` for bad input, `AuthError::UserNotFound` for
    /// an unknown id, and `AuthError::Token` if the token is expired or invalid.
    #[instrument(skip(self, token, password, confirmation, now))]
    pub async fn reset_password(
        &self,
        user_id: UserId,
        token: &str,
        password: &str,
        confirmation: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        if password.is_empty() || confirmation.is_empty() {
            return Err(AuthError::MissingFields);
        }
        if password != confirmation {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(password)?;

        if self.users.get_by_id(user_id).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }

        self.tokens.verify_reset_token(token, user_id, now)?;

        let password_hash = hash_password(password)?;
        self.store_password(user_id, &password_hash).await?;

        tracing::info!(user_id = %user_id, "Password reset");
        Ok(())
    }

    /// Change the password of an authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if the password is blank.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserNotFound` if the user no longer exists.
    #[instrument(skip(self, new_password))]
    pub async fn update_password(
        &self,
        user_id: UserId,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        validate_password(new_password)?;

        let password_hash = hash_password(new_password)?;
        self.store_password(user_id, &password_hash).await?;

        tracing::info!(user_id = %user_id, "Password updated");
        Ok(())
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Get a user's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn details(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Grant administrator rights to a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    #[instrument(skip(self))]
    pub async fn set_as_admin(&self, user_id: UserId) -> Result<User, AuthError> {
        let user = self
            .users
            .set_admin(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        tracing::info!(user_id = %user.id, "User promoted to admin");
        Ok(user)
    }

    async fn store_password(&self, user_id: UserId, password_hash: &str) -> Result<(), AuthError> {
        self.users
            .update_password(user_id, password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate a hex-encoded random confirmation token.
fn generate_confirmation_token() -> String {
    let mut bytes = [0u8; CONFIRMATION_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Whether `token` has the shape of a generated confirmation token.
fn is_well_formed_confirmation_token(token: &str) -> bool {
    token.len() == CONFIRMATION_TOKEN_BYTES * 2 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

/// SHA-256 of a confirmation token, hex-encoded.
fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("longenough").is_ok());
        // Counted in characters, not bytes
        assert!(validate_password("ñññññññ").is_err());
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_password_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_confirmation_token_format() {
        let token = generate_confirmation_token();
        assert_eq!(token.len(), 40);
        assert!(is_well_formed_confirmation_token(&token));
        assert_ne!(token, generate_confirmation_token());
    }

    #[test]
    fn test_malformed_confirmation_tokens() {
        assert!(!is_well_formed_confirmation_token(""));
        assert!(!is_well_formed_confirmation_token("abc123"));
        assert!(!is_well_formed_confirmation_token(&"z".repeat(40)));
    }

    #[test]
    fn test_token_digest_is_stable_sha256() {
        let digest = token_digest("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(digest, token_digest("abc"));
    }
}

//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::tokens::TokenError;

/// Errors that can occur during account and authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required field is missing or blank.
    #[error("all fields are required")]
    MissingFields,

    /// Password reset requested without an email.
    #[error("email is required")]
    EmailRequired,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] emarket_core::EmailError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and its confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Email already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Login attempted for an unknown email.
    #[error("no account for this email")]
    AccountNotFound,

    /// Login attempted before following the confirmation link.
    #[error("email not confirmed")]
    EmailNotConfirmed,

    /// Wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Confirmation token matches no account.
    #[error("invalid confirmation token")]
    InvalidConfirmationToken,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Presented token failed verification.
    #[error("token rejected: {0}")]
    Token(#[from] TokenError),

    /// Token could not be signed.
    #[error("token signing error: {0}")]
    TokenSigning(#[from] jsonwebtoken::errors::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

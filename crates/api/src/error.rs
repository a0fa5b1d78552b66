//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. Every error renders as a JSON body
//! `{"message": "..."}` with a stable message. All route handlers return
//! `Result<T, AppError>`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::tokens::TokenError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Account or authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart or checkout operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Bearer or reset token rejected.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks the required privilege.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => repository_status(err),
            Self::Auth(err) => match err {
                AuthError::MissingFields
                | AuthError::EmailRequired
                | AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_)
                | AuthError::PasswordMismatch
                | AuthError::InvalidConfirmationToken => StatusCode::BAD_REQUEST,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::AccountNotFound | AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::EmailNotConfirmed => StatusCode::FORBIDDEN,
                AuthError::InvalidCredentials | AuthError::Token(_) => StatusCode::UNAUTHORIZED,
                AuthError::Repository(err) => repository_status(err),
                AuthError::TokenSigning(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Cart(err) => match err {
                CartError::InvalidQuantity | CartError::EmptyCart | CartError::Overflow => {
                    StatusCode::BAD_REQUEST
                }
                CartError::ProductNotFound | CartError::ItemNotFound | CartError::CartNotFound => {
                    StatusCode::NOT_FOUND
                }
                CartError::Repository(err) => repository_status(err),
            },
            Self::Token(_) | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message. Never exposes internal detail.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Database(err) => repository_message(err),
            Self::Auth(err) => match err {
                AuthError::MissingFields => "All fields are required",
                AuthError::EmailRequired => "Email is required",
                AuthError::InvalidEmail(_) => "Invalid email format",
                AuthError::WeakPassword(msg) => msg,
                AuthError::PasswordMismatch => "Passwords do not match",
                AuthError::UserAlreadyExists => "An account with this email already exists",
                AuthError::AccountNotFound => "No account found with this email",
                AuthError::EmailNotConfirmed => "Please confirm your email before logging in",
                AuthError::InvalidCredentials => "Incorrect email or password",
                AuthError::InvalidConfirmationToken => "Invalid confirmation token.",
                AuthError::UserNotFound => "User not found",
                AuthError::Token(err) => reset_token_message(*err),
                AuthError::Repository(err) => repository_message(err),
                AuthError::TokenSigning(_) | AuthError::PasswordHash => INTERNAL_MESSAGE,
            },
            Self::Cart(err) => match err {
                CartError::InvalidQuantity => "Quantity must be a whole number of at least 1",
                CartError::ProductNotFound => "Product not found",
                CartError::ItemNotFound => "Item not found in cart",
                CartError::CartNotFound => "No cart found for the user.",
                CartError::EmptyCart => "No items to checkout.",
                CartError::Overflow => "Cart total is too large",
                CartError::Repository(err) => repository_message(err),
            },
            Self::Token(err) => access_token_message(*err),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg,
        }
    }
}

const fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

const fn repository_message(err: &RepositoryError) -> &'static str {
    match err {
        RepositoryError::NotFound => "Not found",
        RepositoryError::Conflict(_) => "Resource already exists",
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => INTERNAL_MESSAGE,
    }
}

/// Message for a rejected bearer token on a protected route.
const fn access_token_message(err: TokenError) -> &'static str {
    match err {
        TokenError::Expired => "Token has expired, please log in again",
        TokenError::Invalid => "Invalid token",
    }
}

/// Message for a rejected password reset link.
const fn reset_token_message(err: TokenError) -> &'static str {
    match err {
        TokenError::Expired => "Token has expired, please request a new reset link",
        TokenError::Invalid => "Invalid token",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        let body = Json(ErrorBody {
            message: self.message(),
        });
        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                Self::BadRequest("Expected a JSON request body".to_string())
            }
            _ => Self::BadRequest("Invalid request body".to_string()),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        Self::BadRequest("Invalid path parameter".to_string())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_message(err: AppError) -> String {
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["message"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("No orders found.".to_string());
        assert_eq!(err.to_string(), "Not found: No orders found.");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_auth_error_statuses() {
        assert_eq!(
            get_status(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AuthError::AccountNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AuthError::EmailNotConfirmed.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::Token(TokenError::Expired).into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::PasswordHash.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_cart_error_statuses() {
        assert_eq!(
            get_status(CartError::EmptyCart.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CartError::CartNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CartError::ItemNotFound.into()),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_error_body_is_json_message() {
        assert_eq!(
            body_message(CartError::EmptyCart.into()).await,
            "No items to checkout."
        );
        assert_eq!(
            body_message(AuthError::WeakPassword("too short".to_string()).into()).await,
            "too short"
        );
    }

    #[tokio::test]
    async fn test_expired_token_message_depends_on_token_kind() {
        assert_eq!(
            body_message(TokenError::Expired.into()).await,
            "Token has expired, please log in again"
        );
        assert_eq!(
            body_message(AuthError::Token(TokenError::Expired).into()).await,
            "Token has expired, please request a new reset link"
        );
        assert_eq!(
            body_message(AuthError::Token(TokenError::Invalid).into()).await,
            "Invalid token"
        );
    }

    #[tokio::test]
    async fn test_internal_details_not_exposed() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "users.email = 'secret'".to_string(),
        ));
        assert_eq!(body_message(err).await, "Internal server error");
    }
}

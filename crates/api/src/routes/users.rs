//! Account routes: registration, confirmation, login, password reset and
//! profile administration.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use emarket_core::UserId;

use super::{ApiJson, ApiPath, MessageResponse};
use crate::error::Result;
use crate::middleware::rate_limit::RateLimiterLayer;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::User;
use crate::services::auth::{AuthService, ConfirmationOutcome, Registration, ResetRequest};
use crate::services::email::{spawn_confirmation_email, spawn_password_reset_email};
use crate::state::AppState;

/// Create the user routes router.
pub fn routes(limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    let credentials = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/request-password-reset", post(request_password_reset))
        .route("/reset-password/{id}/{token}", post(reset_password));

    let credentials = match limiter {
        Some(limiter) => credentials.layer(limiter),
        None => credentials,
    };

    Router::new()
        .merge(credentials)
        .route("/confirm-email/{token}", get(confirm_email))
        .route("/details", get(details))
        .route("/update-password", patch(update_password))
        .route("/{id}/set-as-admin", patch(set_as_admin))
}

// =============================================================================
// Registration
// =============================================================================

/// Registration form. Absent fields deserialize as blank.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile_no: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: User,
}

/// POST /users/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let auth = AuthService::new(state.pool(), state.tokens());

    let (user, confirmation_token) = auth
        .register(&Registration {
            first_name: &req.first_name,
            last_name: &req.last_name,
            email: &req.email,
            mobile_no: &req.mobile_no,
            password: &req.password,
        })
        .await?;

    let confirm_url = format!(
        "{}/users/confirm-email/{confirmation_token}",
        state.config().base_url
    );
    spawn_confirmation_email(
        state.email(),
        user.email.clone(),
        user.display_name(),
        confirm_url,
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully. Please confirm your email.",
            user,
        }),
    ))
}

/// GET /users/confirm-email/{token}
pub async fn confirm_email(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());

    let message = match auth.confirm_email(&token).await? {
        ConfirmationOutcome::Confirmed => "Email confirmed successfully.",
        ConfirmationOutcome::AlreadyConfirmed => "Email has already been confirmed.",
    };

    Ok(Json(MessageResponse::new(message)))
}

// =============================================================================
// Login
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access: String,
}

/// POST /users/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let access = auth.login(&req.email, &req.password, Utc::now()).await?;

    Ok(Json(LoginResponse { access }))
}

// =============================================================================
// Password Reset
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// POST /users/request-password-reset
///
/// Answers the same way whether or not the email belongs to an account.
pub async fn request_password_reset(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PasswordResetRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());

    if let Some(ResetRequest { user, token }) =
        auth.request_password_reset(&req.email, Utc::now()).await?
    {
        let reset_url = format!(
            "{}/users/reset-password/{}/{token}",
            state.config().base_url,
            user.id
        );
        spawn_password_reset_email(
            state.email(),
            user.email.clone(),
            user.display_name(),
            reset_url,
            state.tokens().reset_ttl().num_minutes(),
        );
    }

    Ok(Json(MessageResponse::new(
        "If an account exists for that email, a password reset link has been sent.",
    )))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub password: String,
    pub password_confirmation: String,
}

/// POST /users/reset-password/{id}/{token}
pub async fn reset_password(
    State(state): State<AppState>,
    ApiPath((user_id, token)): ApiPath<(UserId, String)>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    auth.reset_password(
        user_id,
        &token,
        &req.password,
        &req.password_confirmation,
        Utc::now(),
    )
    .await?;

    Ok(Json(MessageResponse::new("Password reset successfully")))
}

// =============================================================================
// Profile
// =============================================================================

/// GET /users/details
pub async fn details(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<User>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    Ok(Json(auth.details(current.id).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub new_password: String,
}

/// PATCH /users/update-password
pub async fn update_password(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ApiJson(req): ApiJson<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    auth.update_password(current.id, &req.new_password).await?;

    Ok(Json(MessageResponse::new("Password updated successfully")))
}

/// PATCH /users/{id}/set-as-admin
pub async fn set_as_admin(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<User>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let user = auth.set_as_admin(user_id).await?;

    tracing::info!(admin_id = %admin.id, user_id = %user.id, "Admin rights granted");
    Ok(Json(user))
}

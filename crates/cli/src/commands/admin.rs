//! Administrator bootstrap.
//!
//! The API only lets an existing admin promote other users, so the first
//! administrator is created here.
//!
//! # Environment Variables
//!
//! - `EMARKET_DATABASE_URL` - `PostgreSQL` connection string

use emarket_core::{Email, UserId};
use secrecy::ExposeSecret;
use sqlx::PgPool;

use super::{CommandError, database_url};

/// Grant admin rights to the account registered with `email`.
///
/// # Errors
///
/// Returns an error if the email is invalid, no such user exists, or the
/// database is unreachable.
pub async fn promote(email: &str) -> Result<UserId, CommandError> {
    let email = Email::parse(email)?;
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    let user_id: Option<UserId> = sqlx::query_scalar(
        r"
        UPDATE users
        SET is_admin = TRUE, updated_at = NOW()
        WHERE email = $1
        RETURNING id
        ",
    )
    .bind(&email)
    .fetch_optional(&pool)
    .await?;

    let user_id = user_id.ok_or_else(|| CommandError::UserNotFound(email.to_string()))?;
    tracing::info!(user_id = %user_id, email = %email, "User promoted to admin");
    Ok(user_id)
}

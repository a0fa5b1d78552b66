//! Signed bearer tokens.
//!
//! Two kinds of HS256 tokens are issued:
//!
//! - **Access tokens** are signed with the server secret and carry the user's
//!   id and admin flag.
//! - **Reset tokens** are signed with `"{user_id}{server_secret}"`, so a token
//!   minted for one account never verifies against another account's id.
//!
//! Both are stateless. Verification is a pure function of the token, the
//! secret and the supplied `now`; a reset token stays usable until it
//! expires and cannot be revoked early.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use emarket_core::UserId;

use crate::config::TokenConfig;

/// Why a presented token was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Signature valid but the token is past its expiry.
    #[error("token has expired")]
    Expired,
    /// Malformed, wrongly signed, or issued for a different user.
    #[error("invalid token")]
    Invalid,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    /// User id, as a string per RFC 7519.
    pub sub: String,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    /// The authenticated user's id.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if the subject is not a user id.
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Invalid)
    }
}

/// Claims carried by a password reset token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetClaims {
    pub user_id: UserId,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies access and reset tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: SecretString,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    access_ttl: Duration,
    reset_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("reset_ttl", &self.reset_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Create an issuer from a server secret and token lifetimes.
    #[must_use]
    pub fn new(secret: SecretString, access_ttl: Duration, reset_ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let access_encoding = EncodingKey::from_secret(bytes);
        let access_decoding = DecodingKey::from_secret(bytes);

        Self {
            secret,
            access_encoding,
            access_decoding,
            access_ttl,
            reset_ttl,
        }
    }

    /// Create an issuer from the token configuration.
    #[must_use]
    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(config.secret.clone(), config.access_ttl, config.reset_ttl)
    }

    /// Lifetime of reset tokens.
    #[must_use]
    pub const fn reset_ttl(&self) -> Duration {
        self.reset_ttl
    }

    /// Issue an access token for a successful login.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be signed.
    pub fn issue_access_token(
        &self,
        user_id: UserId,
        is_admin: bool,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = AccessClaims {
            sub: user_id.to_string(),
            is_admin,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.access_encoding)
    }

    /// Verify an access token's signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` if `now` is at or past the expiry, and
    /// `TokenError::Invalid` for anything else that does not verify.
    pub fn verify_access_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessClaims, TokenError> {
        let claims = decode::<AccessClaims>(token, &self.access_decoding, &validation())
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token rejected");
                TokenError::Invalid
            })?
            .claims;

        check_expiry(claims.exp, now)?;
        claims.user_id()?;
        Ok(claims)
    }

    /// Issue a password reset token bound to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be signed.
    pub fn issue_reset_token(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = ResetClaims {
            user_id,
            iat: now.timestamp(),
            exp: (now + self.reset_ttl).timestamp(),
        };
        let key = EncodingKey::from_secret(self.reset_key(user_id).as_bytes());
        encode(&Header::default(), &claims, &key)
    }

    /// Verify a reset token against the user id it was presented for.
    ///
    /// The signing key is recomputed from `user_id`, then the expiry is
    /// checked, then the `userId` claim must match.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` or `TokenError::Invalid`.
    pub fn verify_reset_token(
        &self,
        token: &str,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<ResetClaims, TokenError> {
        let key = DecodingKey::from_secret(self.reset_key(user_id).as_bytes());
        let claims = decode::<ResetClaims>(token, &key, &validation())
            .map_err(|e| {
                tracing::debug!(error = %e, user_id = %user_id, "Reset token rejected");
                TokenError::Invalid
            })?
            .claims;

        check_expiry(claims.exp, now)?;

        if claims.user_id != user_id {
            return Err(TokenError::Invalid);
        }

        Ok(claims)
    }

    fn reset_key(&self, user_id: UserId) -> String {
        format!("{user_id}{}", self.secret.expose_secret())
    }
}

/// HS256 validation with the wall-clock expiry check turned off.
///
/// Expiry is compared against the caller's `now` instead.
fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation
}

fn check_expiry(exp: i64, now: DateTime<Utc>) -> Result<(), TokenError> {
    if exp <= now.timestamp() {
        return Err(TokenError::Expired);
    }
    Ok(())
}

//! Email service for account confirmation and password reset links.
//!
//! Uses SMTP via lettre for delivery with Askama templates. Without SMTP
//! configuration the service only logs what it would have sent.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use emarket_core::Email;

use crate::config::EmailConfig;

/// HTML template for the confirmation email.
#[derive(Template)]
#[template(path = "email/confirm_email.html")]
struct ConfirmEmailHtml<'a> {
    name: &'a str,
    confirm_url: &'a str,
}

/// Plain text template for the confirmation email.
#[derive(Template)]
#[template(path = "email/confirm_email.txt")]
struct ConfirmEmailText<'a> {
    name: &'a str,
    confirm_url: &'a str,
}

/// HTML template for the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    name: &'a str,
    reset_url: &'a str,
    valid_minutes: i64,
}

/// Plain text template for the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    name: &'a str,
    reset_url: &'a str,
    valid_minutes: i64,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

#[derive(Clone)]
struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: Option<SmtpMailer>,
}

impl EmailService {
    /// Create a new email service from optional configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: Option<&EmailConfig>) -> Result<Self, SmtpError> {
        let Some(config) = config else {
            tracing::warn!("SMTP not configured, emails will be logged instead of sent");
            return Ok(Self::log_only());
        };

        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer: Some(SmtpMailer {
                transport,
                from_address: config.from_address.clone(),
            }),
        })
    }

    /// A service that never connects to SMTP.
    #[must_use]
    pub const fn log_only() -> Self {
        Self { mailer: None }
    }

    /// Send the link that confirms a new account's email.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_confirmation_email(
        &self,
        to: &Email,
        name: &str,
        confirm_url: &str,
    ) -> Result<(), EmailError> {
        let html = ConfirmEmailHtml { name, confirm_url }.render()?;
        let text = ConfirmEmailText { name, confirm_url }.render()?;

        self.send_multipart_email(to, "Confirm your E-Market account", &text, &html)
            .await
    }

    /// Send a password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset_email(
        &self,
        to: &Email,
        name: &str,
        reset_url: &str,
        valid_minutes: i64,
    ) -> Result<(), EmailError> {
        let html = PasswordResetHtml {
            name,
            reset_url,
            valid_minutes,
        }
        .render()?;
        let text = PasswordResetText {
            name,
            reset_url,
            valid_minutes,
        }
        .render()?;

        self.send_multipart_email(to, "Reset your E-Market password", &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &Email,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let Some(mailer) = &self.mailer else {
            // Bodies carry live confirmation and reset links
            tracing::info!(to = %to, subject = %subject, "Email not sent (SMTP disabled)");
            tracing::debug!(to = %to, body = %text_body, "Unsent email body");
            return Ok(());
        };

        let email = Message::builder()
            .from(
                mailer
                    .from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(mailer.from_address.clone()))?,
            )
            .to(to
                .as_str()
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        mailer.transport.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Send the confirmation email in the background.
///
/// Delivery failures are logged and never reach the client.
pub fn spawn_confirmation_email(service: &EmailService, to: Email, name: String, confirm_url: String) {
    let service = service.clone();
    tokio::spawn(async move {
        if let Err(e) = service
            .send_confirmation_email(&to, &name, &confirm_url)
            .await
        {
            tracing::error!(error = %e, to = %to, "Failed to send confirmation email");
        }
    });
}

/// Send the password reset email in the background.
///
/// Delivery failures are logged and never reach the client.
pub fn spawn_password_reset_email(
    service: &EmailService,
    to: Email,
    name: String,
    reset_url: String,
    valid_minutes: i64,
) {
    let service = service.clone();
    tokio::spawn(async move {
        if let Err(e) = service
            .send_password_reset_email(&to, &name, &reset_url, valid_minutes)
            .await
        {
            tracing::error!(error = %e, to = %to, "Failed to send password reset email");
        }
    });
}

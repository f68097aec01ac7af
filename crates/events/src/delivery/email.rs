//! Email notification delivery via SMTP.
//!
//! [`EmailDelivery`] owns one pooled `lettre` STARTTLS transport for the
//! lifetime of the process. Without `SMTP_HOST`, [`EmailConfig::from_env`]
//! returns `None` and the notifier runs in log-only mode.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// A sender or recipient is not a valid mailbox.
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Could not assemble email: {0}")]
    Build(#[from] lettre::error::Error),
}

const DEFAULT_FROM_ADDRESS: &str = "Lectern <noreply@lectern.local>";

/// Prepended to every subject line.
pub const SUBJECT_PREFIX: &str = "[Lectern]";

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    /// STARTTLS submission port (default `587`).
    pub smtp_port: u16,
    /// Sender mailbox, with or without a display name.
    pub from_address: String,
    /// Username and password, when the relay requires authentication.
    pub credentials: Option<(String, String)>,
}

impl EmailConfig {
    /// Load SMTP settings, or `None` when `SMTP_HOST` is unset.
    ///
    /// | Variable        | Required | Default                            |
    /// |-----------------|----------|------------------------------------|
    /// | `SMTP_HOST`     | yes      |                                    |
    /// | `SMTP_PORT`     | no       | `587`                              |
    /// | `SMTP_FROM`     | no       | `Lectern <noreply@lectern.local>`  |
    /// | `SMTP_USER`     | no       |                                    |
    /// | `SMTP_PASSWORD` | no       |                                    |
    ///
    /// Credentials are only used when both user and password are set.
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let smtp_host = var("SMTP_HOST")?;
        let smtp_port = match var("SMTP_PORT").map(|p| p.parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Ignoring invalid SMTP_PORT, using 587");
                587
            }
            None => 587,
        };

        Some(Self {
            smtp_host,
            smtp_port,
            from_address: var("SMTP_FROM").unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            credentials: var("SMTP_USER").zip(var("SMTP_PASSWORD")),
        })
    }
}

/// A composed plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingEmail {
    /// Assemble the MIME message sent from `from`.
    pub fn to_message(&self, from: Mailbox) -> Result<Message, EmailError> {
        let message = Message::builder()
            .from(from)
            .to(self.to.parse::<Mailbox>()?)
            .subject(format!("{SUBJECT_PREFIX} {}", self.subject))
            .header(ContentType::TEXT_PLAIN)
            .body(self.body.clone())?;
        Ok(message)
    }
}

/// Sends notification emails through one SMTP relay.
pub struct EmailDelivery {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailDelivery {
    /// Validate the sender and build the transport. No connection is opened
    /// until the first delivery.
    pub fn connect(config: &EmailConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);
        if let Some((user, password)) = &config.credentials {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            from: config.from_address.parse()?,
            transport: builder.build(),
        })
    }

    pub async fn deliver(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let message = email.to_message(self.from.clone())?;
        self.transport.send(message).await?;
        tracing::info!(to = %email.to, subject = %email.subject, "Notification email sent");
        Ok(())
    }
}

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::prospects::repository::{Notification, NotificationError, Notifier};

/// STARTTLS relay using the configured account. One attempt per notification.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotificationError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|err| NotificationError::Transport(err.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: parse_mailbox(&config.from)?,
        })
    }

    fn message(&self, notification: Notification) -> Result<Message, NotificationError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(notification.subject)
            .header(ContentType::TEXT_PLAIN);
        for recipient in &notification.recipients {
            builder = builder.to(parse_mailbox(recipient)?);
        }

        builder
            .body(notification.body)
            .map_err(|err| NotificationError::Message(err.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotificationError> {
    address
        .parse::<Mailbox>()
        .map_err(|err| NotificationError::Address {
            address: address.to_string(),
            reason: err.to_string(),
        })
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        let message = self.message(notification)?;
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|err| NotificationError::Transport(err.to_string()))
    }
}

//! Notification adapters for the submit side effect.

mod smtp;

pub use smtp::SmtpNotifier;

use async_trait::async_trait;
use tracing::info;

use crate::prospects::domain::{Attorney, Prospect};
use crate::prospects::repository::{Notification, NotificationError, Notifier};

pub const SUBMISSION_SUBJECT: &str = "New Prospect Submission";

/// Composes the message sent to a prospect and the attorney picked for it.
pub fn submission_notification(
    prospect: &Prospect,
    attorney: &Attorney,
    organization: &str,
) -> Notification {
    let body = format!(
        "Hey {first} {last},\n\
         Thanks for submitting your info to {organization}. One of our attorneys will be in touch soon.\n\
         In the meantime, your assigned attorney is {name} ({email}).",
        first = prospect.first_name,
        last = prospect.last_name,
        name = attorney.name,
        email = attorney.email,
    );

    Notification {
        subject: SUBMISSION_SUBJECT.to_string(),
        body,
        recipients: vec![prospect.email.to_string(), attorney.email.clone()],
    }
}

/// Writes notifications to the log instead of sending them. Used when SMTP is unset.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            subject = %notification.subject,
            recipients = ?notification.recipients,
            "smtp disabled, notification not sent"
        );
        Ok(())
    }
}

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use prospect_intake::auth::{AdminCredentialAuthenticator, AttorneyPasswordAuthenticator, Authenticator};
use prospect_intake::config::{AuthConfig, DatabaseConfig, SmtpConfig};
use prospect_intake::error::AppError;
use prospect_intake::notify::{LogNotifier, SmtpNotifier};
use prospect_intake::prospects::{Notification, NotificationError, Notifier};
use prospect_intake::storage::SqliteStore;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Mail adapter chosen at startup: the SMTP relay when configured, the log otherwise.
pub(crate) enum MailNotifier {
    Smtp(SmtpNotifier),
    Log(LogNotifier),
}

impl MailNotifier {
    pub(crate) fn from_config(smtp: Option<&SmtpConfig>) -> Result<Self, AppError> {
        match smtp {
            Some(config) => {
                info!(host = %config.host, port = config.port, "smtp notifications enabled");
                Ok(Self::Smtp(SmtpNotifier::new(config)?))
            }
            None => {
                info!("smtp not configured, notifications will be logged");
                Ok(Self::Log(LogNotifier))
            }
        }
    }
}

#[async_trait]
impl Notifier for MailNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        match self {
            MailNotifier::Smtp(notifier) => notifier.send(notification).await,
            MailNotifier::Log(notifier) => notifier.send(notification).await,
        }
    }
}

pub(crate) async fn open_store(config: &DatabaseConfig) -> Result<Arc<SqliteStore>, AppError> {
    let store = SqliteStore::connect(config).await?;
    store.migrate().await?;
    Ok(Arc::new(store))
}

pub(crate) fn build_authenticator(
    auth: &AuthConfig,
    store: Arc<SqliteStore>,
) -> Arc<dyn Authenticator> {
    match auth {
        AuthConfig::Attorney => Arc::new(AttorneyPasswordAuthenticator::new(store)),
        AuthConfig::Admin { username, password } => Arc::new(AdminCredentialAuthenticator::new(
            username.clone(),
            password.clone(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> Notification {
        Notification {
            subject: "New Prospect Submission".to_string(),
            body: "Hey Jane Doe".to_string(),
            recipients: vec!["jane@x.com".to_string()],
        }
    }

    #[tokio::test]
    async fn missing_smtp_config_falls_back_to_log() {
        let notifier = MailNotifier::from_config(None).expect("notifier builds");
        assert!(matches!(notifier, MailNotifier::Log(_)));
        notifier.send(notification()).await.expect("log send succeeds");
    }

    #[tokio::test]
    async fn smtp_config_selects_relay() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "mailer@example.com".to_string(),
            password: "secret".to_string(),
            from: "mailer@example.com".to_string(),
        };
        let notifier = MailNotifier::from_config(Some(&config)).expect("notifier builds");
        assert!(matches!(notifier, MailNotifier::Smtp(_)));
    }
}

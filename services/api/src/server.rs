use crate::cli::ServeArgs;
use crate::infra::{build_authenticator, open_store, AppState, MailNotifier};
use crate::routes::with_prospect_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use prospect_intake::config::AppConfig;
use prospect_intake::error::AppError;
use prospect_intake::prospects::ProspectService;
use prospect_intake::storage::seed_attorneys;
use prospect_intake::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = open_store(&config.database).await?;
    let seeded = seed_attorneys(store.as_ref(), &config.seed_attorneys).await?;
    if seeded > 0 {
        info!(seeded, "attorney seed applied");
    }

    let notifier = Arc::new(MailNotifier::from_config(config.smtp.as_ref())?);
    let authenticator = build_authenticator(&config.auth, store.clone());
    let prospect_service = Arc::new(ProspectService::new(
        store.clone(),
        store,
        notifier,
        config.notifications.organization.clone(),
    ));

    let app = with_prospect_routes(prospect_service, authenticator)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, auth = ?config.auth, "prospect intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

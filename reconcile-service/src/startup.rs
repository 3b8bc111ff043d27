use crate::config::{ReconcileConfig, StorageBackend};
use crate::handlers;
use crate::services::notifier::DEFAULT_QUEUE_SIZE;
use crate::services::{
    EmailProvider, MockEmailProvider, MongoDb, MongoStore, Notifier, SmtpMailer, StagingArea,
    Stores,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::{make_request_span, request_id_middleware};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: ReconcileConfig,
    pub stores: Stores,
    pub mailer: Arc<dyn EmailProvider>,
    pub notifier: Notifier,
    pub staging: StagingArea,
}

impl AppState {
    /// Wire the state from already-built collaborators and start the
    /// notification worker.
    pub fn new(
        config: ReconcileConfig,
        stores: Stores,
        mailer: Arc<dyn EmailProvider>,
    ) -> Result<(Self, JoinHandle<()>), AppError> {
        let staging = StagingArea::new(&config.files.staging_dir).map_err(|e| {
            tracing::error!(
                "Failed to prepare staging directory {}: {}",
                config.files.staging_dir.display(),
                e
            );
            AppError::from(e)
        })?;

        let (notifier, worker) = Notifier::spawn(mailer.clone(), DEFAULT_QUEUE_SIZE);

        Ok((
            Self {
                config,
                stores,
                mailer,
                notifier,
                staging,
            },
            worker,
        ))
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.files.max_upload_bytes + MULTIPART_OVERHEAD;

    let api = Router::new()
        .route("/invoice/upload-invoice", post(handlers::upload_invoices))
        .route("/invoice/all-invoices", get(handlers::list_invoices))
        .route("/invoice/pending-invoices", get(handlers::pending_invoices))
        .route("/invoice/download-invoices", get(handlers::download_invoices))
        .route(
            "/transaction/upload-transaction",
            post(handlers::upload_transactions),
        )
        .route(
            "/transaction/all-transactions",
            get(handlers::list_transactions),
        )
        .route(
            "/transaction/pending-transactions",
            get(handlers::pending_transactions),
        )
        .route(
            "/transaction/download-transactions",
            get(handlers::download_transactions),
        )
        .route("/reconcile/reconcile-data", post(handlers::reconcile_data))
        .route("/reconcile/reconcile-report", get(handlers::reconcile_report))
        .route("/report/report-summary", get(handlers::report_summary));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .nest("/api/v1", api)
        .route_layer(from_fn(metrics_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

async fn connect_stores(config: &ReconcileConfig) -> Result<Stores, AppError> {
    match config.storage.backend {
        StorageBackend::MongoDb => {
            let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to MongoDB: {}", e);
                    e
                })?;
            db.initialize_indexes().await.map_err(|e| {
                tracing::error!("Failed to initialize database indexes: {}", e);
                e
            })?;
            Ok(Stores::from_backend(Arc::new(MongoStore::new(db))))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Stores::memory())
        }
    }
}

fn build_mailer(config: &ReconcileConfig) -> Result<Arc<dyn EmailProvider>, AppError> {
    if config.smtp.enabled {
        let mailer = SmtpMailer::new(config.smtp.clone())
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("SMTP setup failed: {}", e)))?;
        tracing::info!(host = %config.smtp.host, "SMTP mailer initialized");
        Ok(Arc::new(mailer))
    } else {
        tracing::warn!("SMTP disabled - outgoing mail is logged, not sent");
        Ok(Arc::new(MockEmailProvider::new(true)))
    }
}

pub struct Application {
    port: u16,
    server: Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>,
    notifier_worker: JoinHandle<()>,
}

impl Application {
    pub async fn build(config: ReconcileConfig) -> Result<Self, AppError> {
        let stores = connect_stores(&config).await?;
        let mailer = build_mailer(&config)?;
        let (state, notifier_worker) = AppState::new(config.clone(), stores, mailer)?;

        let app = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::pin(server.into_future()),
            notifier_worker,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until a shutdown signal, then let queued notifications drain.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let served = self.server.await;
        if let Err(e) = self.notifier_worker.await {
            tracing::error!("Notification worker ended abnormally: {}", e);
        }
        served
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

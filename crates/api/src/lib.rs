//! # TutorSync API
//!
//! HTTP surface of the tutoring schedule service: template management, exercise
//! assignment, notification inbox and live stream, and manual job triggers.
//!
//! ## Architecture
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Translate requests into scheduler and store calls
//! - **Middleware**: Error mapping
//! - **Config**: Environment configuration

/// Configuration module for API settings
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod routes;

use std::future::Future;
use std::sync::Arc;

use axum::{
    error_handling::HandleErrorLayer,
    http::{header, HeaderValue, Method},
    Router,
};
use eyre::Result;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use tutorsync_core::store::SchedulingStore;
use tutorsync_scheduler::{
    clock::Clock, generator::OccurrenceGenerator, notifier::push::ConnectionRegistry, reminders::ReminderJob,
    runner::JobLease, templates::TemplateManager, Scheduler,
};

use crate::middleware::error_handling::handle_middleware_error;

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    pub store: Arc<dyn SchedulingStore>,
    pub templates: Arc<TemplateManager>,
    pub generator: Arc<OccurrenceGenerator>,
    pub reminders: Arc<ReminderJob>,
    pub connections: Arc<ConnectionRegistry>,
    /// Manual job triggers claim the same lease as the recurring loops.
    pub lease: JobLease,
    pub clock: Arc<dyn Clock>,
}

impl ApiState {
    /// Shares the scheduler's services with the HTTP handlers.
    pub fn new(store: Arc<dyn SchedulingStore>, scheduler: &Scheduler) -> Self {
        Self {
            store,
            templates: Arc::clone(&scheduler.templates),
            generator: Arc::clone(&scheduler.generator),
            reminders: Arc::clone(&scheduler.reminders),
            connections: Arc::clone(&scheduler.connections),
            lease: scheduler.lease(),
            clock: scheduler.clock(),
        }
    }
}

/// Installs the global fmt subscriber at `level`.
pub fn init_tracing(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Builds the router with every route, CORS, tracing and the request timeout.
pub fn app(state: Arc<ApiState>, config: &config::ApiConfig) -> Router {
    let app = Router::new()
        .merge(routes::health::routes())
        .merge(routes::templates::routes())
        .merge(routes::occurrences::routes())
        .merge(routes::notifications::routes())
        .merge(routes::jobs::routes())
        .with_state(state);

    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    };

    app.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .timeout(config.request_timeout),
    )
    .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_origin(origins)
        .allow_credentials(true)
}

/// Serves the API until `shutdown` resolves.
pub async fn start_server<F>(config: config::ApiConfig, state: Arc<ApiState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = app(state, &config);

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

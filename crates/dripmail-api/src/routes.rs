//! API routes

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use dripmail_common::config::Config;
use dripmail_engine::{CredentialVault, DispatchWorker, Dispatcher, DripScheduler, ScheduledEmailManager};
use dripmail_storage::repository::CampaignRepository;
use dripmail_storage::DatabasePool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::auth::{worker_auth, AppState};
use crate::handlers::{campaigns, health, scheduled_emails, worker};

/// Create the API router
pub fn create_router(db_pool: DatabasePool, config: &Config) -> Router {
    let pool = db_pool.pool().clone();

    let vault = CredentialVault::new(&config.vault.secret);
    let dispatcher = Dispatcher::new(
        Duration::from_secs(config.worker.dispatch_timeout_secs),
        config.server.hostname.clone(),
    );

    let state = Arc::new(AppState {
        db_pool,
        manager: ScheduledEmailManager::new(pool.clone()),
        worker: DispatchWorker::new(
            pool.clone(),
            vault.clone(),
            dispatcher.clone(),
            &config.worker,
        ),
        drip: DripScheduler::new(pool.clone(), vault, dispatcher, &config.worker),
        campaigns: CampaignRepository::new(pool),
        worker_token: config.api.worker_token.clone(),
    });

    // Health routes (no auth)
    let health_routes = Router::new()
        .route("/", get(health::health))
        .route("/ready", get(health::readiness));

    // Scheduled email routes
    let scheduled_email_routes = Router::new()
        .route("/", post(scheduled_emails::create).get(scheduled_emails::list))
        .route(
            "/:id",
            get(scheduled_emails::get).patch(scheduled_emails::edit),
        )
        .route("/:id/cancel", post(scheduled_emails::cancel));

    // Campaign routes
    let campaign_routes = Router::new()
        .route("/", get(campaigns::list))
        .route("/:id", get(campaigns::get))
        .route("/:id/run", post(campaigns::run));

    // Worker tick routes, behind the shared secret
    let worker_routes = Router::new()
        .route("/scheduled-emails/tick", post(worker::scheduled_emails_tick))
        .route("/campaigns/tick", post(worker::campaigns_tick))
        .layer(middleware::from_fn_with_state(state.clone(), worker_auth));

    Router::new()
        .nest("/health", health_routes)
        .nest(
            "/api/v1/tenants/:tenant_id/scheduled-emails",
            scheduled_email_routes,
        )
        .nest("/api/v1/tenants/:tenant_id/campaigns", campaign_routes)
        .nest("/api/v1/worker", worker_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

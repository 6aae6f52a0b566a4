//! HTTP API.
//!
//! JSON over axum. Every route except health and login requires a bearer
//! token; handlers receive the resolved [`Session`](crate::auth::Session).

mod auth;
mod directory;
mod extract;
mod reports;
mod tasks;

use crate::auth::AuthService;
use crate::config::Config;
use crate::db::Database;
use anyhow::Result;
use axum::{
    Json, Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    db: Database,
    auth: AuthService,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Result<Self> {
        let auth = AuthService::new(db.clone(), &config)?;
        Ok(Self {
            db,
            auth,
            config: Arc::new(config),
        })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors_permissive = state.config().server.cors_permissive;

    let router = Router::new()
        .route("/api/health", get(health))
        // Authentication
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Reference data
        .route(
            "/api/companies",
            get(directory::list_companies).post(directory::create_company),
        )
        .route(
            "/api/companies/{id}",
            get(directory::get_company)
                .put(directory::update_company)
                .delete(directory::delete_company),
        )
        .route(
            "/api/employees",
            get(directory::list_employees).post(directory::create_employee),
        )
        .route(
            "/api/employees/{id}",
            get(directory::get_employee)
                .put(directory::update_employee)
                .delete(directory::delete_employee),
        )
        .route(
            "/api/categories",
            get(directory::list_categories).post(directory::create_category),
        )
        .route("/api/categories/grouped", get(directory::grouped_categories))
        .route(
            "/api/categories/{id}",
            axum::routing::put(directory::update_category).delete(directory::delete_category),
        )
        // Tasks
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route("/api/tasks/mine", get(tasks::my_tasks))
        .route(
            "/api/tasks/{id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/api/tasks/{id}/status", post(tasks::change_status))
        .route("/api/tasks/{id}/history", get(tasks::task_history))
        // Dashboard and reports
        .route("/api/dashboard", get(reports::dashboard))
        .route("/api/reports", get(reports::report))
        .route("/api/reports/export/{format}", get(reports::export))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_permissive {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

/// Start the HTTP server on `addr`.
///
/// Returns a oneshot sender that can be used to signal shutdown,
/// the actual address the server is bound to, and the serve task.
pub async fn start_server(
    state: AppState,
    addr: SocketAddr,
) -> Result<(oneshot::Sender<()>, SocketAddr, tokio::task::JoinHandle<()>)> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("API server listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            })
            .await
        {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr, handle))
}

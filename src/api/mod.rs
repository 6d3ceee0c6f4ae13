// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

pub mod auth;
mod handlers;
mod routes;

use anyhow::Result;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::store::SocialStore;

pub use handlers::follows::FollowResponse;
pub use handlers::profiles::{ProfileList, ProfileView};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SocialStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }
}

/// Build the application router with tracing and CORS middleware
pub fn router(state: AppState, config: &Config) -> Router {
    let cors = if config.api.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    routes::routes()
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Serve the API until `shutdown` resolves
pub async fn start_api_server(
    state: AppState,
    config: &Config,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let app = router(state, config);

    let addr = config.bind_address().parse::<SocketAddr>()?;

    info!("Starting API server on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

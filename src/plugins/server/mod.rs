pub mod auth;
mod handlers;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use axum::{
  Router,
  routing::{get, patch, post},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  timeout::TimeoutLayer,
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(100)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let governor_limiter = governor_conf.limiter().clone();

    tokio::spawn(async move {
      loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
        governor_limiter.retain_recent();
      }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], app.config.port));

    let router = routes(app)
      .layer(GovernorLayer::new(governor_conf))
      .into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;

    info!("HTTP Server listening on {addr}");

    axum::serve(listener, router).await.context("Server error")
  }
}

/// Every route with tracing, request timeout and CORS. Rate limiting needs
/// peer addresses and is layered on by the plugin.
pub fn routes(app: Arc<AppState>) -> Router {
  let timeout = app.config.request_timeout;

  Router::new()
    .route("/health", get(handlers::health))
    .route("/api/users", post(handlers::register))
    .route("/api/users/{id}/role", patch(handlers::set_role))
    .route("/api/users/{id}/discount", patch(handlers::set_discount))
    .route("/api/network", get(handlers::network))
    .route("/api/orders", get(handlers::orders))
    .route("/api/orders/{id}/status", patch(handlers::order_status))
    .route("/api/products", get(handlers::products))
    .layer(
      ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(
          CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        ),
    )
    .with_state(app)
}

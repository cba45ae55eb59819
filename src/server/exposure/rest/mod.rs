//! REST API exposure
//!
//! Consumes a `ServiceHost` and produces an Axum `Router`.

use super::super::host::ServiceHost;
use crate::server::router::build_invoice_routes;
use anyhow::Result;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// REST API exposure implementation
pub struct RestExposure;

impl RestExposure {
    /// Build the REST router from a host
    ///
    /// Returns a router with:
    /// - Health check routes
    /// - Invoice and order routes
    /// - Custom routes
    ///
    /// wrapped in request tracing and permissive CORS for the admin client.
    pub fn build_router(host: Arc<ServiceHost>, custom_routes: Vec<Router>) -> Result<Router> {
        let mut app = Self::health_routes().merge(build_invoice_routes(host));

        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        Ok(app
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()))
    }

    /// Build health check routes
    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    /// Health check endpoint handler
    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "invoicer"
        }))
    }
}

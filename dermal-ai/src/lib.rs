//! dermal-ai library interface for testing
//!
//! Exposes the router and services for integration testing

pub mod api;
pub mod config;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use services::{AnalysisOrchestrator, PaymentGateway};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Runs analysis requests
    pub orchestrator: Arc<AnalysisOrchestrator>,
    /// `None` when no payment processor key is configured
    pub payments: Option<Arc<dyn PaymentGateway>>,
    /// ISO currency code passed to the processor
    pub currency: String,
    /// Largest accepted request body
    pub max_body_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<AnalysisOrchestrator>,
        payments: Option<Arc<dyn PaymentGateway>>,
    ) -> Self {
        Self {
            orchestrator,
            payments,
            currency: services::payment_gateway::DEFAULT_CURRENCY.to_string(),
            max_body_bytes: config::DEFAULT_MAX_BODY_BYTES,
            startup_time: Utc::now(),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;

    Router::new()
        .merge(api::analyze_routes())
        .merge(api::payment_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

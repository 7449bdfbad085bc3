//! dermal-ai - Dermal analysis service
//!
//! **Module Identity:**
//! - Name: dermal-ai (Analysis)
//! - Port: 5780
//!
//! Streams diagnostic log lines and a structured skin report over SSE, and
//! creates payment intents for the full report.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dermal_common::config::TomlConfig;
use dermal_common::FallbackPolicy;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dermal_ai::config::{ServiceConfig, ServiceOverrides};
use dermal_ai::services::{AnalysisOrchestrator, AnthropicClient, PaymentGateway, StripeGateway};
use dermal_ai::AppState;

/// Command-line arguments for dermal-ai
#[derive(Parser, Debug)]
#[command(name = "dermal-ai")]
#[command(about = "Dermal analysis service")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, env = "DERMAL_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "DERMAL_PORT")]
    port: Option<u16>,

    /// Path to config.toml (defaults to the platform config location)
    #[arg(short, long, env = "DERMAL_CONFIG")]
    config: Option<PathBuf>,

    /// Generative model API key
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Generative model name
    #[arg(long, env = "DERMAL_MODEL")]
    model: Option<String>,

    /// Payment processor secret key
    #[arg(long, env = "STRIPE_SECRET_KEY", hide_env_values = true)]
    stripe_secret_key: Option<String>,
}

impl Args {
    fn overrides(&self) -> ServiceOverrides {
        ServiceOverrides {
            host: self.host.clone(),
            port: self.port,
            model_api_key: self.api_key.clone(),
            model: self.model.clone(),
            payment_secret_key: self.stripe_secret_key.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    // Initialize tracing (RUST_LOG overrides the configured filter)
    let default_filter = toml_config
        .logging
        .level
        .clone()
        .unwrap_or_else(|| dermal_ai::config::DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting dermal-ai (Analysis) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = ServiceConfig::resolve(args.overrides(), &toml_config);

    let model = AnthropicClient::new(config.model.clone())
        .context("Failed to initialize model client")?;
    info!("Model client initialized: {}", config.model.model);
    let orchestrator = Arc::new(AnalysisOrchestrator::new(
        Arc::new(model),
        FallbackPolicy::standard(),
    ));

    let payments: Option<Arc<dyn PaymentGateway>> = match &config.payment {
        Some(payment) => {
            let gateway = StripeGateway::new(
                payment.secret_key.clone(),
                payment.base_url.clone(),
                payment.timeout,
            )
            .context("Failed to initialize payment gateway")?;
            info!("Payment gateway initialized ({})", payment.currency);
            Some(Arc::new(gateway) as Arc<dyn PaymentGateway>)
        }
        None => None,
    };

    let mut state = AppState::new(orchestrator, payments).with_max_body_bytes(config.max_body_bytes);
    if let Some(payment) = &config.payment {
        state = state.with_currency(payment.currency.clone());
    }
    let app = dermal_ai::build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

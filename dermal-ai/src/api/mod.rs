//! HTTP API handlers for dermal-ai

pub mod analyze;
pub mod health;
pub mod payment;

pub use analyze::analyze_routes;
pub use health::health_routes;
pub use payment::payment_routes;

//! Services for dermal-ai

pub mod anthropic_client;
pub mod line_buffer;
pub mod model;
pub mod orchestrator;
pub mod payment_gateway;
pub mod prompts;

pub use anthropic_client::{AnthropicClient, AnthropicConfig};
pub use model::{GenerativeModel, ModelError, ModelRequest, OutputSchema, TextStream};
pub use orchestrator::AnalysisOrchestrator;
pub use payment_gateway::{PaymentError, PaymentGateway, PaymentIntent, StripeGateway};

//! dermal-ui library interface for testing
//!
//! Client side of the analysis flow: quiz → optional photo → analysis
//! stream → report preview → payment → full report.

pub mod capture;
pub mod config;
pub mod consumer;
pub mod render;
pub mod session;
pub mod transport;

pub use consumer::{AnalysisConsumer, AnalysisOutcome, AnalysisSession, AnalysisView, ConsumerState};
pub use session::{InMemoryStore, JsonFileStore, Session, SessionStore};
pub use transport::{AnalysisTransport, ByteStream, HttpTransport, PaymentClient, TransportError};

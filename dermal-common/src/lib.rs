//! # Dermal Common Library
//!
//! Shared code for the dermal analysis service and its client including:
//! - Report schema and validation (DermalReport)
//! - Diagnostic log line parsing
//! - Event stream (SSE) encoding and chunk-tolerant decoding
//! - Stream event types (AnalysisEvent tagged union)
//! - Quiz answers, analyze request normalization and image data URLs
//! - Fallback policy for failed analyses
//! - Payment API types
//! - Configuration loading

pub mod config;
pub mod error;
pub mod events;
pub mod fallback;
pub mod image;
pub mod log_line;
pub mod payment;
pub mod quiz;
pub mod report;
pub mod sse;

pub use error::{Error, Result};
pub use events::{AnalysisEvent, LogPayload, StreamEvent};
pub use fallback::FallbackPolicy;
pub use log_line::LogLine;
pub use quiz::{AnalyzeRequest, QuizAnswers};
pub use report::DermalReport;

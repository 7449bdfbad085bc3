//! Analysis stream event types
//!
//! `StreamEvent` is the raw wire record (event name + payload text).
//! `AnalysisEvent` is the decoded form, one variant per event name, each
//! carrying its own validated payload type.

use crate::log_line::LogLine;
use crate::report::{DermalReport, ReportError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Event name for diagnostic log lines
pub const LOG_EVENT: &str = "log";

/// Event name for the terminal report
pub const REPORT_EVENT: &str = "report";

/// Raw event record as carried on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    pub event: String,
    pub data: String,
}

impl StreamEvent {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    pub fn is_report(&self) -> bool {
        self.event == REPORT_EVENT
    }

    pub fn is_log(&self) -> bool {
        self.event == LOG_EVENT
    }

    /// SSE wire encoding of this record
    pub fn encode(&self) -> String {
        crate::sse::encode_event(self)
    }
}

/// Payload of a "log" event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPayload {
    pub line: String,
}

/// Event decoding errors
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unknown event type: {0}")]
    UnknownEvent(String),

    #[error("Invalid {event} payload: {reason}")]
    InvalidPayload { event: &'static str, reason: String },

    #[error("Invalid report: {0}")]
    InvalidReport(#[from] ReportError),
}

/// Decoded analysis stream event
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEvent {
    Log(LogPayload),
    Report(DermalReport),
}

impl AnalysisEvent {
    pub fn log(line: impl Into<String>) -> Self {
        AnalysisEvent::Log(LogPayload { line: line.into() })
    }

    /// Event name on the wire
    pub fn event_type(&self) -> &'static str {
        match self {
            AnalysisEvent::Log(_) => LOG_EVENT,
            AnalysisEvent::Report(_) => REPORT_EVENT,
        }
    }

    /// Encode into a wire record
    pub fn to_stream_event(&self) -> Result<StreamEvent, serde_json::Error> {
        let data = match self {
            AnalysisEvent::Log(payload) => serde_json::to_string(payload)?,
            AnalysisEvent::Report(report) => serde_json::to_string(report)?,
        };
        Ok(StreamEvent::new(self.event_type(), data))
    }

    /// Decode a wire record, validating the payload for its event name
    pub fn decode(event: &StreamEvent) -> Result<Self, DecodeError> {
        match event.event.as_str() {
            LOG_EVENT => serde_json::from_str::<LogPayload>(event.data.trim())
                .map(AnalysisEvent::Log)
                .map_err(|e| DecodeError::InvalidPayload {
                    event: LOG_EVENT,
                    reason: e.to_string(),
                }),
            REPORT_EVENT => Ok(AnalysisEvent::Report(DermalReport::from_json_str(&event.data)?)),
            other => Err(DecodeError::UnknownEvent(other.to_string())),
        }
    }

    /// Display form of a log event
    pub fn as_log_line(&self) -> Option<LogLine> {
        match self {
            AnalysisEvent::Log(payload) => Some(LogLine::parse(&payload.line)),
            AnalysisEvent::Report(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FallbackPolicy;

    #[test]
    fn test_log_event_encoding() {
        let event = AnalysisEvent::log("08:34:51 [OK] UV_SPECTRUM_MAPPING_INITIALIZED")
            .to_stream_event()
            .unwrap();
        assert_eq!(event.event, "log");
        assert_eq!(
            event.data,
            r#"{"line":"08:34:51 [OK] UV_SPECTRUM_MAPPING_INITIALIZED"}"#
        );
    }

    #[test]
    fn test_report_event_decodes_and_validates() {
        let report = FallbackPolicy::standard().client_report();
        let wire = AnalysisEvent::Report(report.clone()).to_stream_event().unwrap();
        assert!(wire.is_report());
        match AnalysisEvent::decode(&wire).unwrap() {
            AnalysisEvent::Report(decoded) => assert_eq!(decoded, report),
            other => panic!("expected report, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_log_payload() {
        let wire = StreamEvent::new("log", "not json");
        assert!(matches!(
            AnalysisEvent::decode(&wire),
            Err(DecodeError::InvalidPayload { event: "log", .. })
        ));
    }

    #[test]
    fn test_invalid_report_payload() {
        let wire = StreamEvent::new("report", r#"{"profileId":"SK-1"}"#);
        assert!(matches!(
            AnalysisEvent::decode(&wire),
            Err(DecodeError::InvalidReport(_))
        ));
    }

    #[test]
    fn test_unknown_event() {
        let wire = StreamEvent::new("progress", "{}");
        assert!(matches!(
            AnalysisEvent::decode(&wire),
            Err(DecodeError::UnknownEvent(name)) if name == "progress"
        ));
    }

    #[test]
    fn test_as_log_line() {
        let event = AnalysisEvent::log("08:34:52 [!!] IRREGULAR_COLLAGEN_PATTERN_DETECTED");
        let line = event.as_log_line().unwrap();
        assert_eq!(line.tag, "[!!]");
        assert_eq!(line.message, "IRREGULAR_COLLAGEN_PATTERN_DETECTED");
    }
}

//! Analysis orchestrator
//!
//! Runs one analysis request as two strictly sequential phases:
//!
//! - **Phase A (logs)**: stream diagnostic log text from the model and
//!   forward each completed line as a "log" event as soon as it arrives.
//! - **Phase B (report)**: request a schema-bound report and forward it as
//!   the single "report" event.
//!
//! Every request ends with exactly one schema-valid report event. If Phase A
//! fails, the canned log lines are appended after any live ones, followed by
//! the fallback report, and Phase B is skipped. A Phase B failure or an
//! invalid report is replaced by the fallback report.

use super::line_buffer::{is_displayable, LineBuffer};
use super::model::{GenerativeModel, ModelError, ModelRequest, OutputSchema};
use super::prompts;
use dermal_common::image::ImageData;
use dermal_common::report::{report_json_schema, REPORT_SCHEMA_DESCRIPTION, REPORT_SCHEMA_NAME};
use dermal_common::{AnalysisEvent, AnalyzeRequest, DermalReport, FallbackPolicy, StreamEvent};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// Event channel depth per request
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Where Phase A stopped
#[derive(Debug)]
enum LogPhaseOutcome {
    Completed { lines: usize },
    Failed { lines: usize, error: ModelError },
}

/// Per-request event sink
struct EventEmitter {
    tx: mpsc::Sender<StreamEvent>,
    logs_sent: usize,
    client_gone: bool,
}

impl EventEmitter {
    fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self {
            tx,
            logs_sent: 0,
            client_gone: false,
        }
    }

    async fn send(&mut self, event: AnalysisEvent) -> bool {
        let wire = match event.to_stream_event() {
            Ok(wire) => wire,
            Err(e) => {
                warn!("Failed to serialize {} event: {}", event.event_type(), e);
                return false;
            }
        };
        if self.tx.send(wire).await.is_err() {
            if !self.client_gone {
                debug!("Client disconnected; remaining events are dropped");
                self.client_gone = true;
            }
        }
        true
    }

    async fn log(&mut self, line: String) {
        if self.send(AnalysisEvent::log(line)).await {
            self.logs_sent += 1;
        }
    }

    async fn report(&mut self, report: DermalReport, fallback: &FallbackPolicy) {
        if !self.send(AnalysisEvent::Report(report)).await {
            error!("Report serialization failed, sending fallback report");
            self.send(AnalysisEvent::Report(fallback.server_report())).await;
        }
    }
}

/// Analysis orchestrator service
pub struct AnalysisOrchestrator {
    model: Arc<dyn GenerativeModel>,
    fallback: FallbackPolicy,
}

impl AnalysisOrchestrator {
    pub fn new(model: Arc<dyn GenerativeModel>, fallback: FallbackPolicy) -> Self {
        Self { model, fallback }
    }

    pub fn fallback(&self) -> &FallbackPolicy {
        &self.fallback
    }

    /// Start an analysis in the background and stream its events
    ///
    /// The stream ends after the report event.
    pub fn spawn(self: &Arc<Self>, request: AnalyzeRequest) -> ReceiverStream<StreamEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            orchestrator.run(request, tx).await;
        });
        ReceiverStream::new(rx)
    }

    /// Run one analysis, sending events to `tx`
    ///
    /// Returns once the report event has been sent; dropping `tx` closes the stream.
    pub async fn run(&self, request: AnalyzeRequest, tx: mpsc::Sender<StreamEvent>) {
        let analysis_id = Uuid::new_v4();
        let span = tracing::info_span!("analysis", id = %analysis_id);
        self.run_phases(request, tx).instrument(span).await
    }

    async fn run_phases(&self, request: AnalyzeRequest, tx: mpsc::Sender<StreamEvent>) {
        let image = request.image.as_deref().and_then(ImageData::from_data_url);
        if request.image.is_some() && image.is_none() {
            warn!("Image is not a base64 data URL, analyzing without it");
        }
        info!(
            model = self.model.name(),
            with_image = image.is_some(),
            quiz_answered = !request.quiz.is_empty(),
            "Analysis started"
        );

        let mut emitter = EventEmitter::new(tx);

        match self.stream_logs(image.clone(), &mut emitter).await {
            LogPhaseOutcome::Completed { lines } => {
                info!(lines, "Log phase completed");
            }
            LogPhaseOutcome::Failed { lines, error } => {
                warn!(lines, "Log phase failed, sending fallback analysis: {}", error);
                self.send_fallback(&mut emitter).await;
                return;
            }
        }

        let report = self.generate_report(&request, image).await;
        emitter.report(report, &self.fallback).await;
        info!(logs = emitter.logs_sent, "Analysis completed");
    }

    /// Phase A
    async fn stream_logs(
        &self,
        image: Option<ImageData>,
        emitter: &mut EventEmitter,
    ) -> LogPhaseOutcome {
        let prompt = prompts::diagnostic_log_prompt(image.is_some());
        let mut text = match self.model.stream_text(ModelRequest::with_image(prompt, image)).await {
            Ok(text) => text,
            Err(error) => return LogPhaseOutcome::Failed { lines: 0, error },
        };

        let mut buffer = LineBuffer::new();
        while let Some(fragment) = text.next().await {
            match fragment {
                Ok(fragment) => {
                    for line in buffer.push(&fragment) {
                        if is_displayable(&line) {
                            emitter.log(line).await;
                        } else {
                            debug!(line = %line, "Skipping short unstructured line");
                        }
                    }
                }
                Err(error) => {
                    return LogPhaseOutcome::Failed {
                        lines: emitter.logs_sent,
                        error,
                    }
                }
            }
        }

        if let Some(rest) = buffer.finish() {
            emitter.log(rest).await;
        }
        LogPhaseOutcome::Completed {
            lines: emitter.logs_sent,
        }
    }

    /// Phase B; always returns a valid report
    async fn generate_report(&self, request: &AnalyzeRequest, image: Option<ImageData>) -> DermalReport {
        let prompt = prompts::report_prompt(&request.quiz, image.is_some());
        let schema = OutputSchema {
            name: REPORT_SCHEMA_NAME.to_string(),
            description: REPORT_SCHEMA_DESCRIPTION.to_string(),
            schema: report_json_schema(),
        };

        match self
            .model
            .generate_object(ModelRequest::with_image(prompt, image), &schema)
            .await
        {
            Ok(value) => match DermalReport::from_json_value(value) {
                Ok(report) => {
                    info!(profile_id = %report.profile_id, headline = %report.headline, "Model report validated");
                    report
                }
                Err(e) => {
                    warn!("Model report failed validation, using fallback: {}", e);
                    self.fallback.server_report()
                }
            },
            Err(e) => {
                warn!("Report generation failed, using fallback: {}", e);
                self.fallback.server_report()
            }
        }
    }

    /// Canned logs followed by the fallback report
    async fn send_fallback(&self, emitter: &mut EventEmitter) {
        for line in &self.fallback.log_lines {
            emitter.log(line.clone()).await;
        }
        emitter.report(self.fallback.server_report(), &self.fallback).await;
        info!(logs = emitter.logs_sent, "Fallback analysis sent");
    }
}

//! Analysis stream consumer
//!
//! Opens one analysis request per consumer, turns the event stream into an
//! observable view (log lines, progress, state), and persists the final
//! report for the report stage.
//!
//! State machine:
//!
//! ```text
//! Idle ──start──> Streaming ──report event──────────────> Completed
//!                     │
//!                     └──transport error / closed early──> Failed
//! ```
//!
//! `AnalysisSession` holds the pure transitions. `AnalysisConsumer` drives
//! it from one `tokio::select!` loop over the progress ticker and the body
//! stream, so updates apply in arrival order.

use crate::session::Session;
use crate::transport::{AnalysisTransport, ByteStream, TransportError};
use dermal_common::events::{LOG_EVENT, REPORT_EVENT};
use dermal_common::sse::SseDecoder;
use dermal_common::{AnalysisEvent, AnalyzeRequest, DermalReport, FallbackPolicy, LogLine, StreamEvent};
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{self, Instant, Interval};
use tracing::{debug, info, warn};

/// Interval between progress increments
pub const TICK_INTERVAL: Duration = Duration::from_millis(200);
/// Progress added per tick
pub const PROGRESS_STEP: u8 = 2;
/// Progress ceiling while waiting for the report
pub const PROGRESS_CAP: u8 = 82;
pub const PROGRESS_COMPLETE: u8 = 100;
/// Pause before moving on after a report arrives
pub const COMPLETED_NAVIGATE_DELAY: Duration = Duration::from_millis(600);
/// Pause before moving on after a failure
pub const FAILED_NAVIGATE_DELAY: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Idle,
    Streaming,
    Completed,
    Failed,
}

/// Where the flow goes next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Report,
}

/// Why a run ended without a report
#[derive(Debug, Error)]
pub enum ConsumerFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Stream closed without a report")]
    ClosedWithoutReport,
}

/// Snapshot published to observers
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisView {
    pub state: ConsumerState,
    pub progress: u8,
    pub log_lines: Vec<LogLine>,
    /// Image data URL being analyzed, for preview
    pub image: Option<String>,
    pub navigate_to: Option<Stage>,
}

impl Default for AnalysisView {
    fn default() -> Self {
        Self {
            state: ConsumerState::Idle,
            progress: 0,
            log_lines: Vec::new(),
            image: None,
            navigate_to: None,
        }
    }
}

// ============================================================================
// Pure state machine
// ============================================================================

/// Transitions for one analysis run, independent of I/O and timers
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    view: AnalysisView,
    fallback: FallbackPolicy,
}

impl AnalysisSession {
    pub fn new(fallback: FallbackPolicy) -> Self {
        Self {
            view: AnalysisView::default(),
            fallback,
        }
    }

    pub fn view(&self) -> &AnalysisView {
        &self.view
    }

    pub fn state(&self) -> ConsumerState {
        self.view.state
    }

    pub fn begin(&mut self, image: Option<String>) {
        if self.view.state == ConsumerState::Idle {
            self.view.state = ConsumerState::Streaming;
            self.view.image = image;
        }
    }

    /// Advance progress by one step, up to the cap
    pub fn tick(&mut self) {
        if self.view.state == ConsumerState::Streaming {
            self.view.progress = self
                .view
                .progress
                .saturating_add(PROGRESS_STEP)
                .min(PROGRESS_CAP);
        }
    }

    /// Apply one stream record; returns the report when it completes the run
    pub fn on_event(&mut self, event: &StreamEvent) -> Option<DermalReport> {
        if self.view.state != ConsumerState::Streaming {
            return None;
        }

        match event.event.as_str() {
            LOG_EVENT => {
                let line = match AnalysisEvent::decode(event) {
                    Ok(decoded) => decoded.as_log_line(),
                    Err(e) => {
                        debug!("Undecodable log payload shown raw: {}", e);
                        None
                    }
                }
                .unwrap_or_else(|| LogLine::message_only(event.data.clone()));
                self.view.log_lines.push(line);
                None
            }
            REPORT_EVENT => match AnalysisEvent::decode(event) {
                Ok(AnalysisEvent::Report(report)) => {
                    self.view.state = ConsumerState::Completed;
                    self.view.progress = PROGRESS_COMPLETE;
                    Some(report)
                }
                Ok(AnalysisEvent::Log(_)) => None,
                Err(e) => {
                    warn!("Ignoring invalid report payload: {}", e);
                    None
                }
            },
            other => {
                debug!("Ignoring unknown event: {}", other);
                None
            }
        }
    }

    /// Enter the failed state; returns the report to persist in place of a live one
    pub fn fail(&mut self) -> DermalReport {
        self.view.state = ConsumerState::Failed;
        self.view.log_lines.push(self.fallback.completion_line.clone());
        self.fallback.client_report()
    }

    pub fn navigate(&mut self, stage: Stage) {
        self.view.navigate_to = Some(stage);
    }
}

// ============================================================================
// Driver
// ============================================================================

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub state: ConsumerState,
    pub report: DermalReport,
    pub view: AnalysisView,
}

pub struct AnalysisConsumer {
    transport: Arc<dyn AnalysisTransport>,
    session: Session,
    fallback: FallbackPolicy,
    started: AtomicBool,
    view_tx: watch::Sender<AnalysisView>,
}

impl AnalysisConsumer {
    pub fn new(transport: Arc<dyn AnalysisTransport>, session: Session, fallback: FallbackPolicy) -> Self {
        let (view_tx, _) = watch::channel(AnalysisView::default());
        Self {
            transport,
            session,
            fallback,
            started: AtomicBool::new(false),
            view_tx,
        }
    }

    /// Observe view updates
    pub fn subscribe(&self) -> watch::Receiver<AnalysisView> {
        self.view_tx.subscribe()
    }

    /// Latest view
    pub fn view(&self) -> AnalysisView {
        self.view_tx.borrow().clone()
    }

    /// Run the analysis once
    ///
    /// Later calls return `None` without issuing a request.
    pub async fn start(&self) -> Option<AnalysisOutcome> {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Analysis already started, ignoring start");
            return None;
        }
        Some(self.run().await)
    }

    fn publish(&self, machine: &AnalysisSession) {
        self.view_tx.send_replace(machine.view().clone());
    }

    async fn run(&self) -> AnalysisOutcome {
        let quiz = self.session.quiz();
        let image = self.session.image();
        let request = AnalyzeRequest::new(quiz, image.clone());

        let mut machine = AnalysisSession::new(self.fallback.clone());
        machine.begin(image);
        self.publish(&machine);
        info!(with_image = request.has_image(), "Analysis started");

        let mut ticker = time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
        let result = self.drive(&mut machine, &mut ticker, request).await;
        drop(ticker);

        let (report, delay) = match result {
            Ok(report) => {
                info!(profile_id = %report.profile_id, lines = machine.view().log_lines.len(), "Report received");
                (report, COMPLETED_NAVIGATE_DELAY)
            }
            Err(failure) => {
                warn!("Analysis failed, using fallback report: {}", failure);
                (machine.fail(), FAILED_NAVIGATE_DELAY)
            }
        };
        self.publish(&machine);

        if let Err(e) = self.session.save_report(&report) {
            warn!("Failed to persist report: {}", e);
        }

        time::sleep(delay).await;
        machine.navigate(Stage::Report);
        self.publish(&machine);

        AnalysisOutcome {
            state: machine.state(),
            report,
            view: machine.view().clone(),
        }
    }

    /// Read until a report arrives or the exchange fails
    async fn drive(
        &self,
        machine: &mut AnalysisSession,
        ticker: &mut Interval,
        request: AnalyzeRequest,
    ) -> Result<DermalReport, ConsumerFailure> {
        let opening = self.transport.open(request);
        tokio::pin!(opening);

        let mut body: ByteStream = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    machine.tick();
                    self.publish(machine);
                }
                opened = &mut opening => break opened?,
            }
        };

        let mut decoder = SseDecoder::new();
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    machine.tick();
                    self.publish(machine);
                }
                chunk = body.next() => {
                    let chunk = match chunk {
                        Some(chunk) => chunk?,
                        None => {
                            decoder.finish();
                            return Err(ConsumerFailure::ClosedWithoutReport);
                        }
                    };
                    for event in decoder.feed(&chunk) {
                        if let Some(report) = machine.on_event(&event) {
                            return Ok(report);
                        }
                    }
                    self.publish(machine);
                }
            }
        }
    }
}

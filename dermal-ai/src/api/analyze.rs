//! Analysis event stream
//!
//! `POST /api/analyze` answers with `text/event-stream`: zero or more
//! `log` events followed by exactly one `report` event, then the stream
//! closes. Input problems never produce an error status.

use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::post,
    Router,
};
use dermal_common::{AnalyzeRequest, StreamEvent};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info};

/// Map a wire event onto an axum SSE event
fn to_sse_event(event: StreamEvent) -> Event {
    Event::default().event(event.event).data(event.data)
}

fn event_stream(state: &AppState, request: AnalyzeRequest) -> impl Stream<Item = Result<Event, Infallible>> {
    state.orchestrator.spawn(request).map(|event| {
        debug!("SSE: Sending {} event", event.event);
        Ok(to_sse_event(event))
    })
}

/// POST /api/analyze
pub async fn analyze(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let request = AnalyzeRequest::from_body(&body);
    info!(
        body_bytes = body.len(),
        with_image = request.has_image(),
        "New analysis stream"
    );

    let sse = Sse::new(event_stream(&state, request)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    );

    ([(header::CONNECTION, "keep-alive")], sse)
}

/// Build analysis routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/api/analyze", post(analyze))
}

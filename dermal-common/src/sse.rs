//! Server-Sent Events (SSE) wire codec
//!
//! Records are `event: <name>\ndata: <line>\n...\n\n`. Multi-line payloads
//! carry one `data:` field per line. The decoder accepts input in arbitrary
//! chunks: bytes are buffered until a blank-line terminator is seen, and a
//! trailing incomplete record is held back for the next chunk.

use crate::events::StreamEvent;
use tracing::debug;

/// Record terminator (blank line)
const TERMINATOR: &[u8] = b"\n\n";

/// Event name used when a record carries data but no `event:` field
pub const DEFAULT_EVENT_NAME: &str = "message";

/// Encode one event as an SSE record
pub fn encode_event(event: &StreamEvent) -> String {
    let mut out = String::with_capacity(event.event.len() + event.data.len() + 16);
    out.push_str("event: ");
    out.push_str(&event.event);
    out.push('\n');
    for line in event.data.split('\n') {
        out.push_str("data: ");
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    out
}

/// Incremental, chunk-boundary tolerant SSE decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event completed by it
    ///
    /// Records without an event name or data (comments, keep-alives) are skipped.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut consumed = 0;
        while let Some(pos) = find_terminator(&self.buffer[consumed..]) {
            let record = &self.buffer[consumed..consumed + pos];
            if let Some(event) = parse_record(record) {
                events.push(event);
            }
            consumed += pos + TERMINATOR.len();
        }
        if consumed > 0 {
            self.buffer.drain(..consumed);
        }
        events
    }

    /// Bytes held back waiting for a terminator
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Finish decoding, discarding any unterminated fragment
    pub fn finish(self) {
        if !self.buffer.is_empty() {
            debug!(
                pending_bytes = self.buffer.len(),
                "SSE: Discarding unterminated trailing record"
            );
        }
    }
}

fn find_terminator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(TERMINATOR.len())
        .position(|window| window == TERMINATOR)
}

/// Parse one complete record (without its terminator)
fn parse_record(record: &[u8]) -> Option<StreamEvent> {
    let text = String::from_utf8_lossy(record);

    let mut event_name: Option<String> = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event_name = Some(value.to_string()),
            "data" => data_lines.push(value),
            _ => {}
        }
    }

    if event_name.is_none() && data_lines.is_empty() {
        return None;
    }

    Some(StreamEvent::new(
        event_name.unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string()),
        data_lines.join("\n"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_events() -> Vec<StreamEvent> {
        vec![
            StreamEvent::new("log", r#"{"line":"08:34:51 [OK] UV_SPECTRUM_MAPPING_INITIALIZED"}"#),
            StreamEvent::new("log", "first line\nsecond line\n\nafter blank"),
            StreamEvent::new("log", "  leading spaces preserved"),
            StreamEvent::new("log", "unicode: äöü ✓ 肌"),
            StreamEvent::new("report", r#"{"profileId":"SK-77202","headline":"Bio-Age Accelerated"}"#),
        ]
    }

    fn encode_all(events: &[StreamEvent]) -> Vec<u8> {
        events.iter().map(encode_event).collect::<String>().into_bytes()
    }

    #[test]
    fn test_encode_format() {
        let event = StreamEvent::new("log", "a\nb");
        assert_eq!(encode_event(&event), "event: log\ndata: a\ndata: b\n\n");
    }

    #[test]
    fn test_single_chunk_round_trip() {
        let events = sample_events();
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed(&encode_all(&events)), events);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_round_trip_every_split_point() {
        let events = sample_events();
        let bytes = encode_all(&events);

        for split in 0..=bytes.len() {
            let mut decoder = SseDecoder::new();
            let mut decoded = decoder.feed(&bytes[..split]);
            decoded.extend(decoder.feed(&bytes[split..]));
            assert_eq!(decoded, events, "split at byte {}", split);
        }
    }

    #[test]
    fn test_round_trip_byte_at_a_time() {
        let events = sample_events();
        let bytes = encode_all(&events);

        let mut decoder = SseDecoder::new();
        let mut decoded = Vec::new();
        for byte in &bytes {
            decoded.extend(decoder.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(decoded, events);
    }

    #[test]
    fn test_round_trip_uneven_chunks() {
        let events = sample_events();
        let bytes = encode_all(&events);

        for chunk_size in [2, 3, 5, 7, 11, 64] {
            let mut decoder = SseDecoder::new();
            let mut decoded = Vec::new();
            for chunk in bytes.chunks(chunk_size) {
                decoded.extend(decoder.feed(chunk));
            }
            assert_eq!(decoded, events, "chunk size {}", chunk_size);
        }
    }

    #[test]
    fn test_fragment_held_until_terminator() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: log\ndata: {\"li").is_empty());
        assert!(decoder.feed(b"ne\":\"x\"}\n").is_empty());
        assert!(decoder.pending_len() > 0);
        let events = decoder.feed(b"\n");
        assert_eq!(events, vec![StreamEvent::new("log", r#"{"line":"x"}"#)]);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_data_prefix_strips_exactly_one_space() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event:log\ndata:tight\ndata:  two spaces\n\n");
        assert_eq!(events, vec![StreamEvent::new("log", "tight\n two spaces")]);
    }

    #[test]
    fn test_comments_and_keep_alives_skipped() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b":heartbeat\n\nevent: log\n: note\nid: 7\ndata: x\n\n: keep-alive\n\n");
        assert_eq!(events, vec![StreamEvent::new("log", "x")]);
    }

    #[test]
    fn test_data_without_event_uses_default_name() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: hello\n\n");
        assert_eq!(events, vec![StreamEvent::new(DEFAULT_EVENT_NAME, "hello")]);
    }

    #[test]
    fn test_crlf_line_endings_tolerated_within_record() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event: log\r\ndata: x\r\n\n");
        assert_eq!(events, vec![StreamEvent::new("log", "x")]);
    }
}

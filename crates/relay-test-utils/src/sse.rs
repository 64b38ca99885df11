//! Minimal SSE frame parser for asserting on a relay `/stream` response body
//! in integration tests, without pulling in a full SSE client.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Splits a raw `text/event-stream` body on blank lines and extracts the
/// `event:`/`data:` fields of each frame. Frames without an explicit `event:`
/// line (bare keep-alive comments) are skipped.
pub fn parse_sse_events(body: &str) -> Vec<SseEvent> {
    let mut events = Vec::new();
    for frame in body.split("\n\n") {
        let mut event = None;
        let mut data_lines = Vec::new();
        for line in frame.lines() {
            if let Some(rest) = line.strip_prefix("event:") {
                event = Some(rest.trim().to_owned());
            } else if let Some(rest) = line.strip_prefix("data:") {
                data_lines.push(rest.trim().to_owned());
            }
        }
        if let Some(event) = event {
            events.push(SseEvent {
                event,
                data: data_lines.join("\n"),
            });
        }
    }
    events
}

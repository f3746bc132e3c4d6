//! Minimal `text/event-stream` body parsing

/// One event from an SSE body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

impl SseEvent {
    /// Events without an explicit type default to `message`
    pub fn is_message(&self) -> bool {
        self.event.as_deref().map_or(true, |kind| kind == "message")
    }
}

/// Split a complete SSE body into events.
///
/// Multiple `data:` lines are joined with `\n`. Comments and `id:`/`retry:`
/// fields are ignored, as are events without data.
pub fn parse_sse_events(body: &str) -> Vec<SseEvent> {
    let normalized = body.replace("\r\n", "\n");
    let mut events = Vec::new();

    for block in normalized.split("\n\n") {
        let mut event = SseEvent::default();
        let mut has_data = false;

        for line in block.lines() {
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };

            match field {
                "event" => event.event = Some(value.to_string()),
                "data" => {
                    if has_data {
                        event.data.push('\n');
                    }
                    event.data.push_str(value);
                    has_data = true;
                }
                _ => {}
            }
        }

        if has_data {
            events.push(event);
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let events = parse_sse_events("event: message\ndata: {\"id\":1}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, r#"{"id":1}"#);
        assert!(events[0].is_message());
    }

    #[test]
    fn test_multiline_data_and_comments() {
        let events = parse_sse_events(": keepalive\r\ndata: line1\r\ndata: line2\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "line1\nline2");
        assert_eq!(events[0].event, None);
    }

    #[test]
    fn test_events_without_data_are_skipped() {
        let events = parse_sse_events("event: ping\n\ndata: a\n\nevent: endpoint\ndata: /rpc\n");
        assert_eq!(events.len(), 2);
        assert!(events[0].is_message());
        assert!(!events[1].is_message());
    }
}

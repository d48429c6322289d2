//! Server-Sent Events frame parser.
//!
//! Bytes are buffered until a full line is available, so multi-byte UTF-8
//! sequences split across network chunks decode correctly. Fields handled:
//! `event:`, `data:` (repeatable, joined with `\n`) and `id:`. Lines starting
//! with `:` are keepalive comments. A blank line ends the frame.

/// One complete SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event_type: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

impl SseFrame {
    /// Frames without a type are `message` frames.
    pub fn is_message(&self) -> bool {
        matches!(self.event_type.as_deref(), None | Some("message"))
    }
}

#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    event_type: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a network chunk and return every frame it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = line.trim_end_matches('\r');

            if line.is_empty() {
                if let Some(frame) = self.take_frame() {
                    frames.push(frame);
                }
            } else if line.starts_with(':') {
                continue;
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data
                    .push(value.strip_prefix(' ').unwrap_or(value).to_string());
            } else if let Some(value) = line.strip_prefix("event:") {
                self.event_type = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("id:") {
                self.id = Some(value.trim().to_string());
            }
        }

        frames
    }

    /// Drop partial input, e.g. before reading a new connection.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn take_frame(&mut self) -> Option<SseFrame> {
        if self.data.is_empty() && self.event_type.is_none() {
            return None;
        }
        let frame = SseFrame {
            event_type: self.event_type.take(),
            data: self.data.join("\n"),
            id: self.id.take(),
        };
        self.data.clear();
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_frame() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b"event: message\ndata: {\"type\":\"log-message\"}\n\n");

        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_message());
        assert_eq!(frames[0].data, r#"{"type":"log-message"}"#);
    }

    #[test]
    fn test_untyped_frame_is_message() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b"data:plain\n\n");
        assert_eq!(frames[0].event_type, None);
        assert!(frames[0].is_message());
        assert_eq!(frames[0].data, "plain");
    }

    #[test]
    fn test_other_event_type_is_not_message() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b"event: ping\ndata: 1\n\n");
        assert!(!frames[0].is_message());
    }

    #[test]
    fn test_multiline_data_and_id() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b"id: 7\ndata: one\ndata: two\n\n");
        assert_eq!(frames[0].data, "one\ntwo");
        assert_eq!(frames[0].id.as_deref(), Some("7"));
    }

    #[test]
    fn test_comments_and_crlf() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b": keepalive\r\n\r\ndata: hi\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "hi");
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"data: hel").is_empty());
        let frames = parser.feed(b"lo\n\n");
        assert_eq!(frames[0].data, "hello");
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let text = "données".as_bytes();
        let split = text.iter().position(|&b| b >= 0x80).unwrap() + 1;

        let mut parser = SseParser::new();
        let mut first = b"data: ".to_vec();
        first.extend_from_slice(&text[..split]);
        assert!(parser.feed(&first).is_empty());

        let mut second = text[split..].to_vec();
        second.extend_from_slice(b"\n\n");
        let frames = parser.feed(&second);
        assert_eq!(frames[0].data, "données");
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let mut parser = SseParser::new();
        parser.feed(b"data: stale\n");
        parser.reset();
        let frames = parser.feed(b"data: fresh\n\n");
        assert_eq!(frames[0].data, "fresh");
    }
}

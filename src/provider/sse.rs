//! Incremental server-sent-events framing.

/// One dispatched SSE payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// Joined `data:` lines of one event.
    Data(String),
    /// The `[DONE]` sentinel.
    Done,
}

/// Splits a byte stream into SSE `data:` payloads.
///
/// Chunks may cut lines (or UTF-8 sequences) anywhere; incomplete input is
/// buffered until the line ends.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    pending_data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&raw[..line_end]);
            let line = line.trim_end_matches('\r');

            if line.is_empty() {
                if let Some(frame) = self.dispatch() {
                    frames.push(frame);
                }
            } else if line.starts_with(':') {
                continue;
            } else if let Some(rest) = line.strip_prefix("data:") {
                let rest = rest.strip_prefix(' ').unwrap_or(rest);
                self.pending_data.push(rest.to_string());
            }
            // `event:`, `id:` and `retry:` fields carry nothing the payload lacks.
        }

        frames
    }

    /// Flush an event left open when the body ended without a blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            if let Some(data) = line.trim_end_matches('\r').strip_prefix("data:") {
                self.pending_data
                    .push(data.strip_prefix(' ').unwrap_or(data).to_string());
            }
        }
        self.dispatch()
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        if self.pending_data.is_empty() {
            return None;
        }
        let data = self.pending_data.join("\n");
        self.pending_data.clear();
        if data == "[DONE]" {
            Some(SseFrame::Done)
        } else {
            Some(SseFrame::Data(data))
        }
    }
}

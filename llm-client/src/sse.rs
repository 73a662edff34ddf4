//! Server-sent events decoding for streamed chat completions
//!
//! Network chunks respect neither line nor UTF-8 character boundaries, so the
//! decoder buffers raw bytes and only decodes complete lines.

use log::warn;
use serde::Deserialize;

const DATA_PREFIX: &str = "data:";
const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// One decoded event from the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A content fragment to append to the completion
    Content(String),
    /// The server signalled the end of the stream
    Done,
    /// The server reported an error in place of further content
    Error {
        message: String,
        status_code: Option<u16>,
    },
}

/// Incremental decoder for `data: {json}` event streams
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a network chunk and return the events completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = decode_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Decode whatever is left once the stream has closed
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&String::from_utf8_lossy(&rest))
    }
}

fn decode_line(line: &str) -> Option<SseEvent> {
    let line = line.trim();
    let data = line.strip_prefix(DATA_PREFIX)?.trim_start();

    if data == DONE_MARKER {
        return Some(SseEvent::Done);
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(StreamChunk {
            error: Some(error), ..
        }) => Some(SseEvent::Error {
            message: error
                .message
                .unwrap_or_else(|| "unknown stream error".to_string()),
            status_code: error
                .code
                .and_then(|c| c.as_u64())
                .and_then(|c| u16::try_from(c).ok()),
        }),
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta)
            .and_then(|d| d.content)
            .filter(|c| !c.is_empty())
            .map(SseEvent::Content),
        Err(e) => {
            warn!("Skipping malformed stream chunk: {}", e);
            None
        }
    }
}

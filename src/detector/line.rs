//! Line-oriented event source
//!
//! Each line is one inference cycle: `<label> [confidence]`. A blank line is a
//! frame with nothing detected. Bytes that are not UTF-8 are replaced rather
//! than rejected, so a garbled line becomes an unknown label.

use super::source::EventSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fpga_dispatch_shared::ClassificationEvent;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tracing::debug;

/// Parse one line into an event for frame `frame_id`.
///
/// A missing or unparsable confidence is recorded as 0.
fn parse_line(line: &str, frame_id: u64) -> ClassificationEvent {
    let mut fields = line.split_whitespace();

    match fields.next() {
        None => ClassificationEvent::empty(frame_id),
        Some(label) => {
            let confidence = fields
                .next()
                .and_then(|c| c.parse::<f32>().ok())
                .unwrap_or(0.0);
            ClassificationEvent::detected(frame_id, label, confidence)
        }
    }
}

/// Reads events from any buffered reader, one per line
pub struct LineEventSource<R> {
    reader: R,
    line: Vec<u8>,
    frames: u64,
}

impl<R: AsyncBufRead + Unpin + Send> LineEventSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            frames: 0,
        }
    }
}

impl LineEventSource<BufReader<Stdin>> {
    /// Read events from standard input
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> EventSource for LineEventSource<R> {
    async fn next_event(&mut self) -> Result<Option<ClassificationEvent>> {
        self.line.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.line)
            .await
            .context("Failed to read detector line")?;

        if n == 0 {
            debug!("[DETECTOR] End of input after {} frames", self.frames);
            return Ok(None);
        }

        self.frames += 1;
        let line = String::from_utf8_lossy(&self.line);
        Ok(Some(parse_line(&line, self.frames)))
    }

    fn name(&self) -> &'static str {
        "Line"
    }
}

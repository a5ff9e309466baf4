//! Plain-text sink for terminal use.

use std::io::{self, Write};

use async_trait::async_trait;
use knowbridge_protocol::upstream::references_block;
use knowbridge_protocol::{DeltaEvent, FinishedEvent, ReferencesEvent};

use super::{EventSink, SinkError};

/// Writes answer text verbatim and appends references as a markdown list.
#[derive(Debug)]
pub struct ConsoleSink<W> {
    writer: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, text: &str) -> Result<(), SinkError> {
        self.writer.write_all(text.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> EventSink for ConsoleSink<W> {
    async fn on_delta(&mut self, event: DeltaEvent) -> Result<(), SinkError> {
        self.emit(&event.data)
    }

    async fn on_references(&mut self, event: ReferencesEvent) -> Result<(), SinkError> {
        let mut block = references_block(&event.data);
        block.push('\n');
        self.emit(&block)
    }

    async fn on_finished(&mut self, _event: FinishedEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

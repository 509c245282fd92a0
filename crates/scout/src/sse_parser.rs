//! Server-sent event framing for the gateway stream.
//!
//! Turns a byte stream into assembled events:
//! - bytes are buffered until a full line is available, so multi-byte
//!   characters split across chunks survive
//! - lines end in `\n` or `\r\n`
//! - `data:` lines accumulate until a blank line closes the event
//! - comment lines (leading `:`) and unknown fields are ignored

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes, BytesMut};
use futures::Stream;

/// A parsed SSE event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    /// Event type; `message` when the stream did not name one.
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

/// Default event type per the SSE format.
const DEFAULT_EVENT: &str = "message";

#[derive(Default)]
struct EventBuilder {
    event: Option<String>,
    data_lines: Vec<String>,
    id: Option<String>,
}

impl EventBuilder {
    /// Feed one line. Returns an event when the line closes one.
    fn push_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.take();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data_lines.push(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    /// Finish the pending event, if it carried any data.
    fn take(&mut self) -> Option<SseEvent> {
        let builder = std::mem::take(self);
        if builder.data_lines.is_empty() {
            return None;
        }
        Some(SseEvent {
            event: builder.event.unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data: builder.data_lines.join("\n"),
            id: builder.id,
        })
    }
}

/// Stream adapter yielding [`SseEvent`]s from a byte stream.
pub struct SseEventStream<S> {
    inner: S,
    buffer: BytesMut,
    builder: EventBuilder,
    done: bool,
}

impl<S> SseEventStream<S> {
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buffer: BytesMut::new(),
            builder: EventBuilder::default(),
            done: false,
        }
    }

    /// Pop the next complete line from the buffer.
    fn next_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|b| *b == b'\n')?;
        let mut line = self.buffer.split_to(end);
        self.buffer.advance(1);
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

impl<S, E> Stream for SseEventStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<SseEvent, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            while let Some(line) = this.next_line() {
                if let Some(event) = this.builder.push_line(&line) {
                    return Poll::Ready(Some(Ok(event)));
                }
            }

            if this.done {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => {
                    this.done = true;
                    // A trailing line without newline still counts.
                    if !this.buffer.is_empty() {
                        let rest = this.buffer.split();
                        let line = String::from_utf8_lossy(&rest).into_owned();
                        this.builder.push_line(&line);
                    }
                    return Poll::Ready(this.builder.take().map(Ok));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

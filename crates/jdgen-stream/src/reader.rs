use futures::StreamExt as _;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::client::EventStream;
use crate::errors::StreamFailure;
use crate::protocol::{EndPayload, GenerateEvent, StartPayload};

const CHANNEL_CAPACITY: usize = 128;

/// Normalized events exposed by `GenerateStream`.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// The server acknowledged the request and assigned a request id.
    Started(StartPayload),
    /// Incremental text chunk. `seq` counts non-empty deltas from zero, so
    /// `seq == 0` marks the session's first token.
    Delta { seq: u64, text: String },
    /// Terminal success event with the end-of-stream metadata.
    Completed(EndPayload),
    /// Terminal failure event.
    Failed(StreamFailure),
}

impl StreamEvent {
    /// True for events that end the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }
}

/// Handle used to request cancellation of an open stream.
///
/// Cancellation is idempotent and best-effort: the read task observes it at
/// the next suspension point, emits a terminal `Failed(Cancelled)` event, and
/// drops the connection.
#[derive(Clone, Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Requests cancellation. A no-op once the session has finished.
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }
}

/// One in-flight streaming session.
///
/// Events arrive in byte-arrival order; the stream ends with exactly one
/// terminal event (`Completed` or `Failed`).
#[derive(Debug)]
pub struct GenerateStream {
    stream_id: uuid::Uuid,
    rx: mpsc::Receiver<StreamEvent>,
    abort_handle: AbortHandle,
    saw_terminal: bool,
}

impl GenerateStream {
    /// Spawns the read task over a raw typed event stream.
    pub(crate) fn spawn(events: EventStream) -> Self {
        let stream_id = uuid::Uuid::new_v4();
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (abort_tx, abort_rx) = watch::channel(false);
        tokio::spawn(read_task(stream_id, events, tx, abort_rx));
        Self {
            stream_id,
            rx,
            abort_handle: AbortHandle { tx: abort_tx },
            saw_terminal: false,
        }
    }

    /// Returns the id used to correlate this session in logs.
    pub fn stream_id(&self) -> uuid::Uuid {
        self.stream_id
    }

    /// Returns a handle that can cancel the session.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort_handle.clone()
    }

    /// Waits for and returns the next event.
    ///
    /// Returns `None` after the terminal event has been delivered.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        if self.saw_terminal {
            return None;
        }
        let event = self.rx.recv().await;
        if let Some(event) = &event
            && event.is_terminal()
        {
            self.saw_terminal = true;
        }
        event
    }

    /// Drains the stream and returns the concatenated delta text.
    pub async fn collect_text(mut self) -> Result<String, StreamFailure> {
        let mut content = String::new();
        while let Some(event) = self.next_event().await {
            match event {
                StreamEvent::Delta { text, .. } => content.push_str(&text),
                StreamEvent::Completed(_) => return Ok(content),
                StreamEvent::Failed(failure) => return Err(failure),
                StreamEvent::Started(_) => {}
            }
        }
        Err(StreamFailure::Protocol {
            message: "stream closed without a terminal event".into(),
        })
    }
}

async fn read_task(
    stream_id: uuid::Uuid,
    mut events: EventStream,
    tx: mpsc::Sender<StreamEvent>,
    mut abort_rx: watch::Receiver<bool>,
) {
    let mut seq = 0_u64;
    loop {
        tokio::select! {
            changed = abort_rx.changed() => {
                if changed.is_err() || *abort_rx.borrow() {
                    let _ = tx.send(StreamEvent::Failed(StreamFailure::Cancelled)).await;
                    return;
                }
            }
            next = events.next() => {
                match next {
                    Some(Ok(GenerateEvent::Started(payload))) => {
                        debug!(%stream_id, request_id = %payload.request_id, "stream started");
                        if tx.send(StreamEvent::Started(payload)).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(GenerateEvent::Delta { text })) => {
                        if text.is_empty() {
                            continue;
                        }
                        debug!(%stream_id, seq, "stream delta");
                        let sent = tx.send(StreamEvent::Delta { seq, text }).await;
                        seq = seq.saturating_add(1);
                        if sent.is_err() {
                            return;
                        }
                    }
                    Some(Ok(GenerateEvent::Ended(payload))) => {
                        debug!(%stream_id, "stream completed");
                        let _ = tx.send(StreamEvent::Completed(payload)).await;
                        return;
                    }
                    Some(Ok(GenerateEvent::Failed { message })) => {
                        let _ = tx.send(StreamEvent::Failed(StreamFailure::Server { message })).await;
                        return;
                    }
                    Some(Err(err)) => {
                        // A read error racing a cancellation is reported as a
                        // cancellation, not a transport fault.
                        let failure = if *abort_rx.borrow() {
                            StreamFailure::Cancelled
                        } else {
                            StreamFailure::from(&err)
                        };
                        let _ = tx.send(StreamEvent::Failed(failure)).await;
                        return;
                    }
                    None => {
                        let failure = StreamFailure::Protocol {
                            message: "stream ended without end event".into(),
                        };
                        let _ = tx.send(StreamEvent::Failed(failure)).await;
                        return;
                    }
                }
            }
        }
    }
}

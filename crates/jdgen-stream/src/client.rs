use std::collections::VecDeque;
use std::pin::Pin;

use futures::StreamExt as _;
use futures::stream;
use tracing::debug;

use crate::config::ClientConfig;
use crate::errors::StreamError;
use crate::protocol::{GenerateEvent, GenerateRequest, map_frame};
use crate::reader::GenerateStream;
use crate::sse::SseDecoder;

type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static>>;

/// Typed event stream produced by one open connection.
pub type EventStream =
    Pin<Box<dyn futures::Stream<Item = Result<GenerateEvent, StreamError>> + Send + 'static>>;

/// Seam for opening generate streams.
///
/// `StreamClient` is the HTTP implementation; the lifecycle layer only
/// depends on this trait so it can run against fakes in tests.
#[async_trait::async_trait]
pub trait StreamOpener: Send + Sync {
    /// Opens a streaming generation request and returns a cancellable handle.
    async fn open(&self, request: &GenerateRequest) -> Result<GenerateStream, StreamError>;
}

/// HTTP client for the generate-stream endpoint.
pub struct StreamClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl StreamClient {
    /// Creates a client from explicit configuration.
    pub fn new(config: ClientConfig) -> Result<Self, StreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| StreamError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Creates a client using `JDGEN_API_BASE_URL`.
    pub fn from_env() -> Result<Self, StreamError> {
        Self::new(ClientConfig::from_env())
    }

    /// Issues the streaming POST and returns the raw typed event stream.
    ///
    /// Fails fast on a non-success status; otherwise events arrive in
    /// byte-arrival order until the server closes the stream.
    pub async fn open_events(
        &self,
        request: &GenerateRequest,
    ) -> Result<EventStream, StreamError> {
        let url = self.config.stream_url();
        debug!(%url, company = %request.company_code, job = %request.job_code, "opening generate stream");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| StreamError::transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::http(status));
        }

        let bytes_stream: ByteStream = Box::pin(response.bytes_stream());
        Ok(Box::pin(event_stream(bytes_stream)))
    }
}

#[async_trait::async_trait]
impl StreamOpener for StreamClient {
    async fn open(&self, request: &GenerateRequest) -> Result<GenerateStream, StreamError> {
        let events = self.open_events(request).await?;
        Ok(GenerateStream::spawn(events))
    }
}

fn event_stream(
    bytes_stream: ByteStream,
) -> impl futures::Stream<Item = Result<GenerateEvent, StreamError>> + Send {
    struct State {
        bytes_stream: ByteStream,
        decoder: SseDecoder,
        pending: VecDeque<GenerateEvent>,
        done: bool,
    }

    stream::try_unfold(
        State {
            bytes_stream,
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
            done: false,
        },
        |mut state| async move {
            loop {
                if let Some(event) = state.pending.pop_front() {
                    return Ok(Some((event, state)));
                }
                if state.done {
                    return Ok(None);
                }

                match state.bytes_stream.next().await {
                    Some(Ok(chunk)) => {
                        for frame in state.decoder.push_chunk(&chunk) {
                            if let Some(event) = map_frame(&frame) {
                                state.pending.push_back(event);
                            }
                        }
                        continue;
                    }
                    Some(Err(e)) => {
                        return Err(StreamError::transport(format!("stream read failed: {e}")));
                    }
                    None => {
                        state.done = true;
                    }
                }
            }
        },
    )
}

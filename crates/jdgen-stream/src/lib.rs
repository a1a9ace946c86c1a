//! Streaming client for the JD (job description) generation backend.
//!
//! The backend streams generated drafts over a `text/event-stream`-style
//! POST response. This crate decodes that stream into typed events and runs
//! an explicit generation lifecycle on top of it: accumulated content,
//! at-most-one-active-session cancellation, and best-effort notifications.
//!
//! # Lifecycle usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use jdgen_stream::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), StreamError> {
//! let client = Arc::new(StreamClient::from_env()?);
//! let generation = Generation::new(client, Arc::new(LogNotifier));
//!
//! generation.start(GenerateRequest::new("c0001", "backend"));
//! generation.join().await;
//!
//! println!("{:?}: {}", generation.phase(), generation.content());
//! # Ok(())
//! # }
//! ```
//!
//! For direct stream consumption, open a [`GenerateStream`] through
//! [`StreamClient`] and poll [`GenerateStream::next_event`].

/// HTTP streaming client and the `StreamOpener` seam.
pub mod client;
/// Client configuration and endpoint resolution.
pub mod config;
/// Public error and terminal failure types.
pub mod errors;
/// Generation lifecycle state machine and driver.
pub mod generation;
/// Notification sink capability.
pub mod notify;
/// Wire payload types and frame-to-event mapping.
pub mod protocol;
/// Streaming session handle and normalized events.
pub mod reader;
/// Incremental SSE frame decoder.
pub mod sse;

/// Common imports for typical usage.
pub mod prelude;

pub use client::{EventStream, StreamClient, StreamOpener};
pub use config::{ClientConfig, GENERATE_STREAM_PATH};
pub use errors::{StreamError, StreamFailure};
pub use generation::{Effect, GenPhase, Generation, GenerationState, transition};
pub use notify::{LogNotifier, Notifier, NotifyError};
pub use protocol::{EndPayload, GenerateEvent, GenerateRequest, StartPayload};
pub use reader::{AbortHandle, GenerateStream, StreamEvent};

//! Common imports for typical client usage.
pub use crate::{
    AbortHandle, ClientConfig, GenPhase, GenerateRequest, GenerateStream, Generation, LogNotifier,
    Notifier, StreamClient, StreamError, StreamEvent, StreamFailure,
};

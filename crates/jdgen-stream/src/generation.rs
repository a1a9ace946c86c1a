//! Generation lifecycle: an explicit state machine driving one streaming
//! generate operation at a time.
//!
//! Transitions are pure (`transition` returns the side effects to run), so
//! illegal sequences such as a delta arriving before `start` are no-ops
//! instead of silent field corruption.

use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::StreamOpener;
use crate::errors::StreamFailure;
use crate::notify::Notifier;
use crate::protocol::GenerateRequest;
use crate::reader::{AbortHandle, StreamEvent};

/// Lifecycle phase for the current session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GenPhase {
    #[default]
    Idle,
    Starting,
    Streaming,
    Done,
    Error,
}

/// Observable state of the current generation session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationState {
    pub phase: GenPhase,
    /// Server-assigned request id (empty until the `start` event arrives).
    pub request_id: String,
    /// Accumulated draft text, in delta arrival order.
    pub content: String,
    /// Metadata merged from the `start` and `end` payloads.
    pub meta: Map<String, Value>,
}

/// Side effect requested by a transition, executed best-effort by the driver.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Notify { title: String, body: String },
    Toast(String),
}

/// Applies one stream event to the state and returns the effects to run.
///
/// Events that are illegal in the current phase leave the state untouched.
/// A cancellation failure produces no transition and no effects: `stop()`
/// already reset the state, and cancellation is not a user-facing error.
pub fn transition(state: &mut GenerationState, event: &StreamEvent) -> Vec<Effect> {
    match event {
        StreamEvent::Started(payload) => {
            if state.phase != GenPhase::Starting {
                return Vec::new();
            }
            state.phase = GenPhase::Streaming;
            state.request_id = payload.request_id.clone();
            state.meta = payload.extra.clone();
            if !payload.request_id.is_empty() {
                state
                    .meta
                    .insert("request_id".into(), Value::String(payload.request_id.clone()));
            }
            Vec::new()
        }
        StreamEvent::Delta { seq, text } => {
            if state.phase != GenPhase::Streaming {
                return Vec::new();
            }
            state.content.push_str(text);
            if *seq == 0 {
                vec![
                    Effect::Notify {
                        title: "Draft generation started".into(),
                        body: "Want to take a look now?".into(),
                    },
                    Effect::Toast("Your draft has started streaming.".into()),
                ]
            } else {
                Vec::new()
            }
        }
        StreamEvent::Completed(payload) => {
            if !matches!(state.phase, GenPhase::Starting | GenPhase::Streaming) {
                return Vec::new();
            }
            state.phase = GenPhase::Done;
            if let Some(title) = &payload.title {
                state
                    .meta
                    .insert("title".into(), Value::String(title.clone()));
            }
            for (key, value) in &payload.extra {
                state.meta.insert(key.clone(), value.clone());
            }
            let body = payload
                .title
                .clone()
                .unwrap_or_else(|| "JD generation complete".into());
            vec![Effect::Notify {
                title: "Generation complete".into(),
                body,
            }]
        }
        StreamEvent::Failed(failure) => {
            if failure.is_cancelled() {
                return Vec::new();
            }
            if matches!(state.phase, GenPhase::Done | GenPhase::Error) {
                return Vec::new();
            }
            state.phase = GenPhase::Error;
            vec![Effect::Toast(format!("generation error: {failure}"))]
        }
    }
}

struct Inner {
    state: GenerationState,
    /// Monotonic session counter. Driver tasks carry the value they were
    /// spawned with and refuse to touch state once it moves on.
    session: u64,
    abort: Option<AbortHandle>,
    driver: Option<JoinHandle<()>>,
}

/// Drives generate sessions against a `StreamOpener`, enforcing at most one
/// active session and surfacing milestones through a `Notifier`.
pub struct Generation {
    opener: Arc<dyn StreamOpener>,
    notifier: Arc<dyn Notifier>,
    inner: Arc<Mutex<Inner>>,
}

impl Generation {
    /// Creates a lifecycle bound to a stream opener and a notification sink.
    pub fn new(opener: Arc<dyn StreamOpener>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            opener,
            notifier,
            inner: Arc::new(Mutex::new(Inner {
                state: GenerationState::default(),
                session: 0,
                abort: None,
                driver: None,
            })),
        }
    }

    /// Starts a new generation session.
    ///
    /// Any in-flight session is cancelled first; accumulated content is reset
    /// before the new stream opens.
    pub fn start(&self, request: GenerateRequest) {
        let session = {
            let mut inner = self.inner.lock().expect("generation lock");
            if let Some(abort) = inner.abort.take() {
                abort.abort();
            }
            inner.session += 1;
            inner.state.phase = GenPhase::Starting;
            inner.state.content.clear();
            inner.session
        };

        let opener = self.opener.clone();
        let notifier = self.notifier.clone();
        let inner = self.inner.clone();
        let driver = tokio::spawn(drive_session(opener, notifier, inner.clone(), session, request));
        let mut guard = inner.lock().expect("generation lock");
        if guard.session == session {
            guard.driver = Some(driver);
        }
    }

    /// Cancels any in-flight session and resets to `Idle`.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().expect("generation lock");
        if let Some(abort) = inner.abort.take() {
            abort.abort();
        }
        inner.session += 1;
        inner.driver = None;
        inner.state = GenerationState::default();
    }

    /// Returns a copy of the current session state.
    pub fn snapshot(&self) -> GenerationState {
        self.inner.lock().expect("generation lock").state.clone()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> GenPhase {
        self.inner.lock().expect("generation lock").state.phase
    }

    /// Accumulated draft text so far.
    pub fn content(&self) -> String {
        self.inner
            .lock()
            .expect("generation lock")
            .state
            .content
            .clone()
    }

    /// Waits for the most recently started driver task to finish.
    ///
    /// Useful in tests and shutdown paths; a no-op when nothing is running.
    pub async fn join(&self) {
        let driver = self.inner.lock().expect("generation lock").driver.take();
        if let Some(driver) = driver {
            let _ = driver.await;
        }
    }
}

async fn drive_session(
    opener: Arc<dyn StreamOpener>,
    notifier: Arc<dyn Notifier>,
    inner: Arc<Mutex<Inner>>,
    session: u64,
    request: GenerateRequest,
) {
    let mut stream = match opener.open(&request).await {
        Ok(stream) => stream,
        Err(err) => {
            let failure = StreamFailure::from(&err);
            let effects = {
                let mut guard = inner.lock().expect("generation lock");
                if guard.session != session {
                    return;
                }
                transition(&mut guard.state, &StreamEvent::Failed(failure))
            };
            run_effects(&notifier, effects).await;
            return;
        }
    };

    {
        let mut guard = inner.lock().expect("generation lock");
        if guard.session != session {
            // A newer session started while the connection was opening.
            stream.abort_handle().abort();
            return;
        }
        guard.abort = Some(stream.abort_handle());
    }

    while let Some(event) = stream.next_event().await {
        let terminal = event.is_terminal();
        let effects = {
            let mut guard = inner.lock().expect("generation lock");
            if guard.session != session {
                return;
            }
            let effects = transition(&mut guard.state, &event);
            if terminal {
                guard.abort = None;
            }
            effects
        };
        run_effects(&notifier, effects).await;
        if terminal {
            break;
        }
    }
    debug!(session, "generation driver finished");
}

async fn run_effects(notifier: &Arc<dyn Notifier>, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::Notify { title, body } => {
                if let Err(err) = notifier.notify(&title, &body).await {
                    warn!(%err, "notification dropped");
                }
            }
            Effect::Toast(message) => notifier.toast(&message),
        }
    }
}

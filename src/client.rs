//! # Session Client
//!
//! One awaited call per send. Runs the `update()` reducer against a
//! backend until it stops asking for work, and reports what happened.
//!
//! The REPL drives the same reducer from an event loop instead; both share
//! [`perform`] to turn an effect into the backend call it describes.

use std::fmt;
use std::sync::Arc;

use log::warn;

use crate::backend::{
    BackendError, ChatBackend, ChatReply, MergePolicy, SessionIds, StagedFile, UploadReply,
};
use crate::core::action::{Action, Effect, update};
use crate::core::state::{App, LogEntry, Phase};

/// What a successful send did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub uploaded: Option<UploadReply>,
    /// `None` when there was no text to send.
    pub reply: Option<ChatReply>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    /// Another send is still in flight.
    Busy,
    /// The upload failed; no chat call was made.
    Upload(BackendError),
    /// The chat call failed; session ids are as they were before it.
    Chat(BackendError),
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::Busy => write!(f, "a send is already in progress"),
            TurnError::Upload(e) => write!(f, "upload failed: {e}"),
            TurnError::Chat(e) => write!(f, "chat failed: {e}"),
        }
    }
}

impl std::error::Error for TurnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TurnError::Busy => None,
            TurnError::Upload(e) | TurnError::Chat(e) => Some(e),
        }
    }
}

/// Runs the backend call an effect asks for. `None` when there is nothing to run.
pub async fn perform(backend: &dyn ChatBackend, effect: Effect) -> Option<Action> {
    match effect {
        Effect::None | Effect::Busy => None,
        Effect::Upload { file, ids } => Some(Action::UploadFinished(
            backend.upload(&file, &ids).await,
        )),
        Effect::Chat { message, ids } => {
            Some(Action::ChatFinished(backend.chat(&message, &ids).await))
        }
    }
}

pub struct SessionClient {
    backend: Arc<dyn ChatBackend>,
    app: App,
}

impl SessionClient {
    pub fn new(backend: Arc<dyn ChatBackend>, merge_policy: MergePolicy) -> Self {
        Self {
            backend,
            app: App::new(merge_policy),
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn ids(&self) -> &SessionIds {
        &self.app.ids
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.app.log
    }

    /// Forgets both session ids and the log.
    pub fn reset(&mut self) {
        self.app.reset();
    }

    /// Uploads `staged_file` if given, then sends `text` if it isn't blank.
    pub async fn send_turn(
        &mut self,
        text: &str,
        staged_file: Option<StagedFile>,
    ) -> Result<TurnOutcome, TurnError> {
        if !self.app.phase.is_idle() {
            return Err(TurnError::Busy);
        }
        self.app.input = text.to_string();
        self.app.staged_file = staged_file;

        let mut effect = update(&mut self.app, Action::Submit);
        if effect == Effect::Busy {
            return Err(TurnError::Busy);
        }

        let mut guard = InFlight { app: &mut self.app };
        let mut outcome = TurnOutcome::default();

        while let Some(action) = perform(self.backend.as_ref(), effect).await {
            let failure = match &action {
                Action::UploadFinished(Ok(reply)) => {
                    outcome.uploaded = Some(reply.clone());
                    None
                }
                Action::ChatFinished(Ok(reply)) => {
                    outcome.reply = Some(reply.clone());
                    None
                }
                Action::UploadFinished(Err(e)) => Some(TurnError::Upload(e.clone())),
                Action::ChatFinished(Err(e)) => Some(TurnError::Chat(e.clone())),
                Action::Submit => None,
            };
            effect = update(&mut *guard.app, action);
            if let Some(err) = failure {
                return Err(err);
            }
        }

        Ok(outcome)
    }
}

/// Puts the session back to `Idle` if a `send_turn` future is dropped mid-flight.
struct InFlight<'a> {
    app: &'a mut App,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.app.phase != Phase::Idle {
            warn!("Send abandoned while {}", self.app.phase.label());
            self.app.phase = Phase::Idle;
            self.app.pending_message = None;
            self.app.restore_upload();
            self.app.status_message = String::from("Send cancelled");
        }
    }
}

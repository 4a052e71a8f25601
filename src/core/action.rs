//! # Actions
//!
//! Everything that can happen to a session becomes an `Action`.
//! User presses send? That's `Action::Submit`.
//! Upload comes back? That's `Action::UploadFinished(result)`.
//!
//! `update()` applies an action to the state and returns the `Effect` the
//! caller must perform next. No I/O here: whoever owns the backend runs the
//! effect and feeds the result back in as another action.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//!
//! Submit ──file──▶ Upload ──ok──▶ Chat ──ok──▶ None
//!    │               │ err          │ err
//!    └──text──▶ Chat └──▶ None      └──▶ None
//! ```

use log::{debug, info, warn};

use crate::backend::{BackendError, ChatReply, SessionIds, StagedFile, UploadReply};
use crate::core::state::{App, LogKind, Phase};

#[derive(Debug)]
pub enum Action {
    /// Send whatever is in `app.input` and `app.staged_file`.
    Submit,
    UploadFinished(Result<UploadReply, BackendError>),
    ChatFinished(Result<ChatReply, BackendError>),
}

/// Work the caller has to do after an `update()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// A send is already in flight; this one was dropped.
    Busy,
    Upload { file: StagedFile, ids: SessionIds },
    Chat { message: String, ids: SessionIds },
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit => submit(app),
        Action::UploadFinished(Ok(reply)) => {
            app.ids.merge(reply.ids, app.merge_policy);
            if let Some(file) = app.uploading.take() {
                let notice = match reply.file_id {
                    Some(file_id) => format!("Uploaded {} (file {file_id})", file.name),
                    None => format!("Uploaded {}", file.name),
                };
                app.push_log(LogKind::Notice, notice);
            }
            info!("Upload finished, ids now {:?}", app.ids);

            match app.pending_message.take() {
                Some(message) => start_chat(app, message),
                None => finish(app, "Ready"),
            }
        }
        Action::UploadFinished(Err(e)) => {
            warn!("Upload failed: {e}");
            app.pending_message = None;
            app.restore_upload();
            app.push_log(LogKind::Error, format!("Upload failed: {e}"));
            finish(app, "Upload failed")
        }
        Action::ChatFinished(Ok(reply)) => {
            app.ids.merge(reply.ids, app.merge_policy);
            app.push_log(LogKind::Reply, reply.reply);
            if let Some(remaining) = reply.remaining_quota {
                app.push_log(LogKind::Notice, format!("{remaining} messages left this month"));
            }
            app.input.clear();
            info!("Chat finished, ids now {:?}", app.ids);
            finish(app, "Ready")
        }
        Action::ChatFinished(Err(e)) => {
            warn!("Chat failed: {e}");
            app.push_log(LogKind::Error, format!("Chat failed: {e}"));
            finish(app, "Chat failed")
        }
    }
}

fn submit(app: &mut App) -> Effect {
    if !app.phase.is_idle() {
        debug!("Submit rejected while {}", app.phase.label());
        app.push_log(
            LogKind::Error,
            format!("Still {}, message not sent", app.phase.label()),
        );
        return Effect::Busy;
    }

    let message = app.input.trim().to_string();

    if let Some(file) = app.staged_file.take() {
        app.uploading = Some(file.clone());
        app.pending_message = (!message.is_empty()).then_some(message);
        app.phase = Phase::Uploading;
        app.status_message = format!("Uploading {}...", file.name);
        return Effect::Upload {
            file,
            ids: app.ids.clone(),
        };
    }

    if message.is_empty() {
        return Effect::None;
    }
    start_chat(app, message)
}

fn start_chat(app: &mut App, message: String) -> Effect {
    app.push_log(LogKind::User, message.clone());
    app.phase = Phase::Chatting;
    app.status_message = String::from("Waiting for reply...");
    Effect::Chat {
        message,
        ids: app.ids.clone(),
    }
}

fn finish(app: &mut App, status: &str) -> Effect {
    app.phase = Phase::Idle;
    app.status_message = status.to_string();
    Effect::None
}

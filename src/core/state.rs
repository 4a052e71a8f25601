//! # Application State
//!
//! Everything one chat session owns. No I/O types live here; the backend
//! is driven from outside through the effects `update()` returns.
//!
//! ```text
//! App
//! ├── ids: SessionIds               // vector store + thread handles
//! ├── merge_policy: MergePolicy     // how response ids replace ours
//! ├── phase: Phase                  // Idle → Uploading/Chatting → Idle
//! ├── input: String                 // text box contents
//! ├── staged_file: Option<StagedFile>
//! ├── uploading: Option<StagedFile>   // file currently on the wire
//! ├── pending_message: Option<String>  // text waiting behind an upload
//! ├── log: Vec<LogEntry>            // display log
//! └── status_message: String        // status line text
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use chrono::{DateTime, Local};

use crate::backend::{MergePolicy, SessionIds, StagedFile};

/// Where the send action stands. Anything but `Idle` rejects a new send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Chatting,
}

impl Phase {
    pub fn is_idle(self) -> bool {
        self == Phase::Idle
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Uploading => "uploading",
            Phase::Chatting => "waiting for reply",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    User,
    Reply,
    Notice,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub kind: LogKind,
    pub text: String,
}

pub struct App {
    pub ids: SessionIds,
    pub merge_policy: MergePolicy,
    pub phase: Phase,
    pub input: String,
    pub staged_file: Option<StagedFile>,
    /// The file an in-flight upload carries. A file staged meanwhile waits
    /// in `staged_file` for the next send.
    pub uploading: Option<StagedFile>,
    /// Trimmed text captured at submit time, sent once the upload lands.
    pub pending_message: Option<String>,
    pub log: Vec<LogEntry>,
    pub status_message: String,
}

impl App {
    pub fn new(merge_policy: MergePolicy) -> Self {
        Self {
            ids: SessionIds::default(),
            merge_policy,
            phase: Phase::Idle,
            input: String::new(),
            staged_file: None,
            uploading: None,
            pending_message: None,
            log: Vec::new(),
            status_message: String::from("Ready"),
        }
    }

    pub fn push_log(&mut self, kind: LogKind, text: impl Into<String>) {
        self.log.push(LogEntry {
            at: Local::now(),
            kind,
            text: text.into(),
        });
    }

    /// Puts an unsent upload back in the staged slot, unless another file
    /// was attached in the meantime.
    pub fn restore_upload(&mut self) {
        if let Some(file) = self.uploading.take()
            && self.staged_file.is_none()
        {
            self.staged_file = Some(file);
        }
    }

    /// Starts a fresh session: ids, input and log are dropped, policy kept.
    pub fn reset(&mut self) {
        *self = App::new(self.merge_policy);
    }
}

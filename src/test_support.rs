//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::{
    BackendError, ChatBackend, ChatReply, MergePolicy, SessionIds, StagedFile, UploadReply,
};

/// What a `ScriptedBackend` was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Upload { name: String, ids: SessionIds },
    Chat { message: String, ids: SessionIds },
}

/// A backend that replays canned results and records every call.
#[derive(Default)]
pub struct ScriptedBackend {
    uploads: Mutex<VecDeque<Result<UploadReply, BackendError>>>,
    chats: Mutex<VecDeque<Result<ChatReply, BackendError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_upload(&self, result: Result<UploadReply, BackendError>) {
        self.uploads.lock().unwrap().push_back(result);
    }

    pub fn push_chat(&self, result: Result<ChatReply, BackendError>) {
        self.chats.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn upload(
        &self,
        file: &StagedFile,
        ids: &SessionIds,
    ) -> Result<UploadReply, BackendError> {
        self.calls.lock().unwrap().push(Call::Upload {
            name: file.name.clone(),
            ids: ids.clone(),
        });
        self.uploads
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected upload call")
    }

    async fn chat(&self, message: &str, ids: &SessionIds) -> Result<ChatReply, BackendError> {
        self.calls.lock().unwrap().push(Call::Chat {
            message: message.to_string(),
            ids: ids.clone(),
        });
        self.chats
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected chat call")
    }
}

pub fn ids(vs: Option<&str>, thread: Option<&str>) -> SessionIds {
    SessionIds {
        vector_store_id: vs.map(str::to_string),
        thread_id: thread.map(str::to_string),
    }
}

/// Creates a test App with the default merge policy.
pub fn test_app() -> crate::core::state::App {
    crate::core::state::App::new(MergePolicy::default())
}

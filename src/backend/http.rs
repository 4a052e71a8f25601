//! HTTP implementation of the chat backend.
//!
//! Both endpoints hang off one base URL (the original host serves them under
//! a fixed `/api` prefix):
//! - `POST {base}/upload`: multipart form, `file` plus whichever ids are known
//! - `POST {base}/chat`: JSON `{ message, <thread>?, <vector_store>? }`
//!
//! Non-success bodies are not assumed to be JSON; the raw text (or the
//! status reason when empty) becomes the error message.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};

use crate::backend::{
    BackendError, ChatBackend, ChatReply, IdFieldNames, SessionIds, StagedFile, UploadReply,
};
use crate::backend::types::chat_payload;

/// Per-user accounting header the original chat proxy expects.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Chat backend reached over HTTP.
pub struct HttpBackend {
    base_url: String,
    fields: IdFieldNames,
    user_id: Option<String>,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, fields: IdFieldNames) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            fields,
            user_id: None,
            client: reqwest::Client::new(),
        }
    }

    /// Sends `X-User-Id` on every request when set.
    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let request = self.client.post(format!("{}/{endpoint}", self.base_url));
        match &self.user_id {
            Some(user) => request.header(USER_ID_HEADER, user),
            None => request,
        }
    }
}

/// Returns the body of a 2xx response, or turns anything else into `Status`.
async fn success_body(endpoint: &str, response: reqwest::Response) -> Result<String, BackendError> {
    let status = response.status();
    debug!("{endpoint} response status: {status}");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = match body.trim() {
            "" => status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_string(),
            text => text.to_string(),
        };
        warn!("{endpoint} failed: {} - {}", status.as_u16(), message);
        return Err(BackendError::Status {
            status: status.as_u16(),
            message,
        });
    }

    response
        .text()
        .await
        .map_err(|e| BackendError::Transport(e.to_string()))
}

#[async_trait]
impl ChatBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn upload(
        &self,
        file: &StagedFile,
        ids: &SessionIds,
    ) -> Result<UploadReply, BackendError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| BackendError::Io(format!("{}: {e}", file.name)))?;

        let mut form = Form::new().part("file", part);
        for (field, id) in self.fields.pairs(ids) {
            form = form.text(field.to_string(), id.to_string());
        }

        info!(
            "Uploading {} ({} bytes, {}) to {}/upload",
            file.name,
            file.bytes.len(),
            file.content_type,
            self.base_url
        );

        let response = self
            .post("upload")
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let body = success_body("upload", response).await?;
        let reply = UploadReply::from_body(&body, &self.fields)?;
        debug!("Upload reply: {:?}", reply);
        Ok(reply)
    }

    async fn chat(&self, message: &str, ids: &SessionIds) -> Result<ChatReply, BackendError> {
        let payload = chat_payload(message, ids, &self.fields);

        info!(
            "Chat request to {}/chat: message_len={}, ids={:?}",
            self.base_url,
            message.len(),
            ids
        );

        let response = self
            .post("chat")
            .json(&payload)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let body = success_body("chat", response).await?;
        let reply = ChatReply::from_body(&body, &self.fields)?;
        debug!(
            "Chat reply: {} chars, ids={:?}, remaining_quota={:?}",
            reply.reply.len(),
            reply.ids,
            reply.remaining_quota
        );
        Ok(reply)
    }
}

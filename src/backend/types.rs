use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::provider::BackendError;

/// The two opaque handles the backend hands out. Never inspected, only forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionIds {
    pub vector_store_id: Option<String>,
    pub thread_id: Option<String>,
}

impl SessionIds {
    pub fn is_empty(&self) -> bool {
        self.vector_store_id.is_none() && self.thread_id.is_none()
    }

    /// Folds the ids from a successful response into this session.
    pub fn merge(&mut self, returned: SessionIds, policy: MergePolicy) {
        match policy {
            MergePolicy::PresentOnly => {
                if returned.vector_store_id.is_some() {
                    self.vector_store_id = returned.vector_store_id;
                }
                if returned.thread_id.is_some() {
                    self.thread_id = returned.thread_id;
                }
            }
            MergePolicy::Overwrite => *self = returned,
        }
    }
}

/// How ids in a response replace the ones already held.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Only overwrite an id the response actually carries.
    #[default]
    PresentOnly,
    /// Assign both ids from every response; a missing field clears the id.
    Overwrite,
}

/// Wire names for the session ids. `thread: None` means the backend has no
/// notion of threads, so thread ids are neither sent nor stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdFieldNames {
    pub vector_store: String,
    pub thread: Option<String>,
}

impl Default for IdFieldNames {
    fn default() -> Self {
        Self {
            vector_store: "vs_id".to_string(),
            thread: Some("thread_id".to_string()),
        }
    }
}

impl IdFieldNames {
    /// `(field, value)` pairs for every id that is set, thread first.
    pub fn pairs<'a>(&'a self, ids: &'a SessionIds) -> Vec<(&'a str, &'a str)> {
        let mut out = Vec::with_capacity(2);
        if let (Some(field), Some(id)) = (self.thread.as_deref(), ids.thread_id.as_deref()) {
            out.push((field, id));
        }
        if let Some(id) = ids.vector_store_id.as_deref() {
            out.push((self.vector_store.as_str(), id));
        }
        out
    }

    /// Pulls the ids out of a response object. `null` counts as absent.
    pub fn extract(&self, body: &Map<String, Value>) -> SessionIds {
        SessionIds {
            vector_store_id: opaque_id(body.get(&self.vector_store)),
            thread_id: self
                .thread
                .as_ref()
                .and_then(|field| opaque_id(body.get(field))),
        }
    }
}

/// Backends are free to hand out numeric handles; they are stringified as-is.
fn opaque_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A file the user attached, waiting to go out with the next send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            name,
            content_type,
            bytes,
        }
    }

    /// Reads a file from disk, naming it after the last path component.
    pub async fn from_path(path: &Path) -> Result<Self, BackendError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| BackendError::Io(format!("{}: {e}", path.display())))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(name, bytes))
    }
}

/// Successful `/upload` response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReply {
    pub ids: SessionIds,
    pub file_id: Option<String>,
}

impl UploadReply {
    pub fn from_body(body: &str, fields: &IdFieldNames) -> Result<Self, BackendError> {
        let object = parse_object(body)?;
        Ok(Self {
            ids: fields.extract(&object),
            file_id: object
                .get("file_id")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Successful `/chat` response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub reply: String,
    pub ids: SessionIds,
    pub remaining_quota: Option<i64>,
}

impl ChatReply {
    pub fn from_body(body: &str, fields: &IdFieldNames) -> Result<Self, BackendError> {
        let object = parse_object(body)?;
        let reply = object
            .get("reply")
            .and_then(Value::as_str)
            .ok_or_else(|| BackendError::Parse("chat response has no 'reply' string".to_string()))?
            .to_string();
        Ok(Self {
            reply,
            ids: fields.extract(&object),
            remaining_quota: object.get("remaining_quota").and_then(Value::as_i64),
        })
    }
}

/// Builds the `/chat` body: `{ message, <thread>?, <vector_store>? }`.
pub fn chat_payload(message: &str, ids: &SessionIds, fields: &IdFieldNames) -> Value {
    let mut body = Map::new();
    body.insert("message".to_string(), Value::String(message.to_string()));
    for (field, id) in fields.pairs(ids) {
        body.insert(field.to_string(), Value::String(id.to_string()));
    }
    Value::Object(body)
}

fn parse_object(body: &str) -> Result<Map<String, Value>, BackendError> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(BackendError::Parse(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(e) => Err(BackendError::Parse(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(vs: Option<&str>, thread: Option<&str>) -> SessionIds {
        SessionIds {
            vector_store_id: vs.map(str::to_string),
            thread_id: thread.map(str::to_string),
        }
    }

    #[test]
    fn test_present_only_keeps_missing_fields() {
        let mut current = ids(Some("vs1"), Some("t1"));
        current.merge(ids(None, Some("t2")), MergePolicy::PresentOnly);
        assert_eq!(current, ids(Some("vs1"), Some("t2")));
    }

    #[test]
    fn test_overwrite_clears_missing_fields() {
        let mut current = ids(Some("vs1"), Some("t1"));
        current.merge(ids(None, Some("t2")), MergePolicy::Overwrite);
        assert_eq!(current, ids(None, Some("t2")));
    }

    #[test]
    fn test_merge_policy_names() {
        let policy: MergePolicy = serde_json::from_str("\"present-only\"").unwrap();
        assert_eq!(policy, MergePolicy::PresentOnly);
        assert_eq!(
            serde_json::to_string(&MergePolicy::Overwrite).unwrap(),
            "\"overwrite\""
        );
    }

    /// Contract test: unset ids are omitted, never serialized as null.
    #[test]
    fn test_chat_payload_omits_unset_ids() {
        let fields = IdFieldNames::default();
        let body = chat_payload("hello", &ids(Some("vs1"), None), &fields);
        assert_eq!(body.to_string(), r#"{"message":"hello","vs_id":"vs1"}"#);

        let body = chat_payload("hello", &SessionIds::default(), &fields);
        assert_eq!(body.to_string(), r#"{"message":"hello"}"#);
    }

    #[test]
    fn test_chat_payload_uses_custom_field_names() {
        let fields = IdFieldNames {
            vector_store: "vectorStoreId".to_string(),
            thread: Some("threadId".to_string()),
        };
        let body = chat_payload("q", &ids(Some("vs9"), Some("t9")), &fields);
        assert_eq!(body["vectorStoreId"], "vs9");
        assert_eq!(body["threadId"], "t9");
        assert!(body.get("vs_id").is_none());
    }

    #[test]
    fn test_disabled_thread_field_is_never_sent() {
        let fields = IdFieldNames {
            thread: None,
            ..Default::default()
        };
        let held = ids(Some("vs1"), Some("t1"));
        let pairs = fields.pairs(&held);
        assert_eq!(pairs, vec![("vs_id", "vs1")]);
    }

    #[test]
    fn test_disabled_thread_field_is_never_stored() {
        let fields = IdFieldNames {
            thread: None,
            ..Default::default()
        };
        let reply = UploadReply::from_body(r#"{"vs_id":"vs1","thread_id":"t1"}"#, &fields).unwrap();
        assert_eq!(reply.ids, ids(Some("vs1"), None));
    }

    #[test]
    fn test_upload_reply_parses_optional_fields() {
        let fields = IdFieldNames::default();
        let reply =
            UploadReply::from_body(r#"{"vs_id":"vs1","file_id":"f1","thread_id":null}"#, &fields)
                .unwrap();
        assert_eq!(reply.ids, ids(Some("vs1"), None));
        assert_eq!(reply.file_id.as_deref(), Some("f1"));
    }

    #[test]
    fn test_chat_reply_requires_reply() {
        let fields = IdFieldNames::default();
        let err = ChatReply::from_body(r#"{"thread_id":"t1"}"#, &fields).unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));

        let body = r#"{"reply":"hi","thread_id":"t1","remaining_quota":599}"#;
        let reply = ChatReply::from_body(body, &fields).unwrap();
        assert_eq!(reply.reply, "hi");
        assert_eq!(reply.ids, ids(None, Some("t1")));
        assert_eq!(reply.remaining_quota, Some(599));
    }

    #[test]
    fn test_non_object_body_is_parse_error() {
        let fields = IdFieldNames::default();
        assert!(matches!(
            UploadReply::from_body("[]", &fields),
            Err(BackendError::Parse(_))
        ));
        assert!(matches!(
            UploadReply::from_body("not json", &fields),
            Err(BackendError::Parse(_))
        ));
    }

    #[test]
    fn test_numeric_ids_are_kept_opaque() {
        let fields = IdFieldNames::default();
        let reply = UploadReply::from_body(r#"{"vs_id":42}"#, &fields).unwrap();
        assert_eq!(reply.ids.vector_store_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_staged_file_guesses_content_type() {
        assert_eq!(StagedFile::new("a.pdf", vec![]).content_type, "application/pdf");
        assert_eq!(
            StagedFile::new("blob", vec![1, 2]).content_type,
            "application/octet-stream"
        );
    }
}

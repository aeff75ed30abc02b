//! Records of delivered messages and threads.
//!
//! A [`SentMessage`] is immutable: updating produces a new record carrying
//! the replaced content in `priorly`, and appending produces a new
//! [`SentThread`]. Both serialize to the persisted JSON record format:
//!
//! ```json
//! {"type": "message", "ts": "...", "channel": "...", "thread_ts": null, "content": [...], "priorly": null}
//! {"type": "thread", "messages": [{"type": "message", ...}, ...]}
//! ```

use std::fmt;

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::client::Client;
use crate::error::{Result, SlackLineError};
use crate::message::Message;
use crate::sender::{link_to_thread, update_message};
use crate::slack::MessageResponse;
use crate::thread::{post_replies, Thread};

const MESSAGE_TYPE: &str = "message";
const THREAD_TYPE: &str = "thread";

/// A message that has been delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    content: Value,
    priorly: Option<Value>,
    response: MessageResponse,
}

#[derive(Serialize)]
struct MessageRecordRef<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    ts: &'a str,
    channel: &'a str,
    thread_ts: Option<&'a str>,
    content: &'a Value,
    priorly: Option<&'a Value>,
}

#[derive(Deserialize)]
struct MessageRecord {
    ts: String,
    channel: String,
    #[serde(default)]
    thread_ts: Option<String>,
    content: Value,
    #[serde(default)]
    priorly: Option<Value>,
}

impl SentMessage {
    /// Wrap delivered content and the API response.
    pub fn new(content: Value, priorly: Option<Value>, response: MessageResponse) -> Self {
        Self {
            content,
            priorly,
            response,
        }
    }

    /// The serialized content that was delivered.
    pub fn content(&self) -> &Value {
        &self.content
    }

    /// The content this message replaced, if it was updated.
    pub fn priorly(&self) -> Option<&Value> {
        self.priorly.as_ref()
    }

    /// The API response identifying the message.
    pub fn response(&self) -> &MessageResponse {
        &self.response
    }

    /// Message timestamp.
    pub fn ts(&self) -> &str {
        &self.response.ts
    }

    /// Channel id.
    pub fn channel(&self) -> &str {
        &self.response.channel
    }

    /// Root of the thread this message belongs to: its own `ts` for a root
    /// message, the parent's for a reply.
    pub fn thread_ts(&self) -> &str {
        self.response
            .thread_ts
            .as_deref()
            .unwrap_or(&self.response.ts)
    }

    /// Whether this message is a reply inside a thread.
    pub fn is_reply(&self) -> bool {
        self.response.thread_ts.is_some()
    }

    /// Replace this message's content, returning the new record.
    ///
    /// `self` is left untouched; the returned record's `priorly` holds this
    /// record's content.
    ///
    /// # Errors
    ///
    /// Returns the delivery error if the update call fails.
    pub async fn update(&self, client: &Client, message: &Message) -> Result<SentMessage> {
        let (content, response) =
            update_message(client, self.channel(), self.ts(), message).await?;
        let response = link_to_thread(response, self.response.thread_ts.as_deref());
        Ok(Self::new(content, Some(self.content.clone()), response))
    }

    /// Post `thread`'s messages as replies in this message's root thread.
    ///
    /// Replies always go under [`SentMessage::thread_ts`], so appending from
    /// a reply still threads off the original root. The returned thread
    /// starts with this record, followed by the new replies.
    ///
    /// # Errors
    ///
    /// Returns the first delivery error encountered.
    pub async fn thread_from(&self, client: &Client, thread: &Thread) -> Result<SentThread> {
        let replies =
            post_replies(client, thread.messages(), self.channel(), self.thread_ts()).await?;
        info!(
            channel = %self.channel(),
            thread_ts = %self.thread_ts(),
            appended = replies.len(),
            "appended to thread"
        );
        let mut messages = Vec::with_capacity(replies.len().saturating_add(1));
        messages.push(self.clone());
        messages.extend(replies);
        SentThread::new(messages)
    }

    /// The persisted JSON record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Load a record produced by [`SentMessage::to_json`].
    ///
    /// # Errors
    ///
    /// Returns [`SlackLineError::InvalidArgument`] if `type` is not
    /// `"message"` or a required field is missing.
    pub fn from_json(value: &Value) -> Result<Self> {
        expect_type(value, MESSAGE_TYPE)?;
        let record = MessageRecord::deserialize(value)
            .map_err(|e| SlackLineError::invalid(format!("Invalid message record: {e}")))?;
        Ok(Self::new(
            record.content,
            record.priorly,
            MessageResponse {
                ts: record.ts,
                channel: record.channel,
                thread_ts: record.thread_ts,
            },
        ))
    }
}

impl Serialize for SentMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        MessageRecordRef {
            kind: MESSAGE_TYPE,
            ts: &self.response.ts,
            channel: &self.response.channel,
            thread_ts: self.response.thread_ts.as_deref(),
            content: &self.content,
            priorly: self.priorly.as_ref(),
        }
        .serialize(serializer)
    }
}

impl fmt::Display for SentMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SentMessage channel={:?} ts={:?}", self.channel(), self.ts())
    }
}

/// A delivered thread: a root message and its replies, in posting order.
///
/// Never empty; every member shares the first message's channel and root.
#[derive(Debug, Clone, PartialEq)]
pub struct SentThread {
    messages: Vec<SentMessage>,
}

#[derive(Serialize)]
struct ThreadRecordRef<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    messages: &'a [SentMessage],
}

impl SentThread {
    /// Assemble a thread from delivered messages.
    ///
    /// # Errors
    ///
    /// Returns [`SlackLineError::InvalidArgument`] if `messages` is empty or
    /// its members do not share one channel and one thread root.
    pub fn new(messages: Vec<SentMessage>) -> Result<Self> {
        let first = messages
            .first()
            .ok_or_else(|| SlackLineError::invalid("A sent thread needs at least one message."))?;
        if let Some(stray) = messages
            .iter()
            .find(|m| m.channel() != first.channel() || m.thread_ts() != first.thread_ts())
        {
            return Err(SlackLineError::invalid(format!(
                "Message {} (channel {}, thread {}) does not belong to thread {} in {}",
                stray.ts(),
                stray.channel(),
                stray.thread_ts(),
                first.thread_ts(),
                first.channel()
            )));
        }
        Ok(Self { messages })
    }

    /// Members, in posting order.
    pub fn messages(&self) -> &[SentMessage] {
        &self.messages
    }

    /// Iterate over members in posting order.
    pub fn iter(&self) -> std::slice::Iter<'_, SentMessage> {
        self.messages.iter()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false; a sent thread holds at least one message.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Member at `index`.
    pub fn get(&self, index: usize) -> Option<&SentMessage> {
        self.messages.get(index)
    }

    /// The first member.
    pub fn first(&self) -> &SentMessage {
        // `new` rejects empty threads.
        &self.messages[0]
    }

    /// The last member.
    pub fn last(&self) -> &SentMessage {
        let last = self.messages.len().saturating_sub(1);
        &self.messages[last]
    }

    /// Channel shared by all members.
    pub fn channel(&self) -> &str {
        self.first().channel()
    }

    /// Timestamp of the first member.
    pub fn ts(&self) -> &str {
        self.first().ts()
    }

    /// Thread root shared by all members.
    pub fn thread_ts(&self) -> &str {
        self.first().thread_ts()
    }

    /// Post `thread`'s messages into this thread.
    ///
    /// Returns a new thread holding every existing member followed by the
    /// new replies; `self` is untouched.
    ///
    /// # Errors
    ///
    /// Returns the first delivery error encountered.
    pub async fn append(&self, client: &Client, thread: &Thread) -> Result<SentThread> {
        let extended = self.first().thread_from(client, thread).await?;
        let mut messages = self.messages.clone();
        messages.extend(extended.messages.into_iter().skip(1));
        Self::new(messages)
    }

    /// A new thread with the member at `index` replaced by `updated`.
    ///
    /// # Errors
    ///
    /// Returns [`SlackLineError::MessageIndexOutOfRange`] for a bad index,
    /// or [`SlackLineError::InvalidArgument`] if `updated` is not part of
    /// this thread.
    pub fn replace(&self, index: usize, updated: SentMessage) -> Result<SentThread> {
        let size = self.messages.len();
        if index >= size {
            return Err(SlackLineError::MessageIndexOutOfRange { index, size });
        }
        let mut messages = self.messages.clone();
        messages[index] = updated;
        Self::new(messages)
    }

    /// Update the member at `index` and return the rebuilt thread.
    ///
    /// # Errors
    ///
    /// Returns [`SlackLineError::MessageIndexOutOfRange`] before any network
    /// call for a bad index, or the delivery error if the update fails.
    pub async fn update_at(
        &self,
        client: &Client,
        index: usize,
        message: &Message,
    ) -> Result<SentThread> {
        let target = self
            .messages
            .get(index)
            .ok_or(SlackLineError::MessageIndexOutOfRange {
                index,
                size: self.messages.len(),
            })?;
        let updated = target.update(client, message).await?;
        self.replace(index, updated)
    }

    /// The persisted JSON record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Load a record produced by [`SentThread::to_json`].
    ///
    /// # Errors
    ///
    /// Returns [`SlackLineError::InvalidArgument`] if `type` is not
    /// `"thread"`, `messages` is missing, or any member is invalid.
    pub fn from_json(value: &Value) -> Result<Self> {
        expect_type(value, THREAD_TYPE)?;
        let members = value
            .get("messages")
            .and_then(Value::as_array)
            .ok_or_else(|| SlackLineError::invalid("Invalid thread record: missing messages"))?;
        let messages = members
            .iter()
            .map(SentMessage::from_json)
            .collect::<Result<Vec<_>>>()?;
        Self::new(messages)
    }
}

impl Serialize for SentThread {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ThreadRecordRef {
            kind: THREAD_TYPE,
            messages: &self.messages,
        }
        .serialize(serializer)
    }
}

impl fmt::Display for SentThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SentThread channel={:?} size={} thread_ts={:?}",
            self.channel(),
            self.len(),
            self.thread_ts()
        )
    }
}

impl<'a> IntoIterator for &'a SentThread {
    type Item = &'a SentMessage;
    type IntoIter = std::slice::Iter<'a, SentMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

/// Either kind of persisted record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Sent {
    /// A single message.
    Message(SentMessage),
    /// A thread.
    Thread(SentThread),
}

impl Sent {
    /// Load a record, dispatching on its `type`.
    ///
    /// # Errors
    ///
    /// Returns [`SlackLineError::InvalidArgument`] for a missing or unknown
    /// `type`, or an invalid record.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value.get("type").and_then(Value::as_str) {
            Some(MESSAGE_TYPE) => SentMessage::from_json(value).map(Self::Message),
            Some(THREAD_TYPE) => SentThread::from_json(value).map(Self::Thread),
            _ => Err(SlackLineError::invalid(format!(
                "Unknown type: {}",
                type_of(value)
            ))),
        }
    }

    /// The persisted JSON record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Channel of the message or thread.
    pub fn channel(&self) -> &str {
        match self {
            Self::Message(message) => message.channel(),
            Self::Thread(thread) => thread.channel(),
        }
    }
}

impl From<SentMessage> for Sent {
    fn from(message: SentMessage) -> Self {
        Self::Message(message)
    }
}

impl From<SentThread> for Sent {
    fn from(thread: SentThread) -> Self {
        Self::Thread(thread)
    }
}

fn expect_type(value: &Value, expected: &str) -> Result<()> {
    if value.get("type").and_then(Value::as_str) == Some(expected) {
        return Ok(());
    }
    Err(SlackLineError::invalid(format!(
        "Expected type {expected:?}, got {}",
        type_of(value)
    )))
}

fn type_of(value: &Value) -> String {
    value
        .get("type")
        .map_or_else(|| "nil".to_owned(), Value::to_string)
}

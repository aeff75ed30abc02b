//! Slack Web API collaborator.
//!
//! Defines the [`SlackApi`] trait and the request/response types the rest of
//! the crate depends on. [`http::HttpSlackApi`] is the reqwest-backed
//! implementation; tests substitute their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

pub mod directory;
pub mod http;
pub mod mentions;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of a `chat.postMessage` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostMessage {
    /// Channel or user id.
    pub channel: String,
    /// Serialized block content.
    pub blocks: Value,
    /// Root timestamp when posting a reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    /// Display name to post as.
    #[serde(rename = "username", skip_serializing_if = "Option::is_none")]
    pub bot_name: Option<String>,
}

/// Body of a `chat.update` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateMessage {
    /// Channel id of the message.
    pub channel: String,
    /// Timestamp of the message to replace.
    pub ts: String,
    /// Replacement block content.
    pub blocks: Value,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Identity of a posted or updated message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message timestamp; unique id and sort key.
    pub ts: String,
    /// Channel id the message lives in.
    pub channel: String,
    /// Root timestamp when the message is a reply.
    #[serde(default)]
    pub thread_ts: Option<String>,
}

/// A workspace member.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    /// User id (`U...`).
    pub id: String,
    /// Whether the account is deactivated.
    #[serde(default)]
    pub deleted: bool,
    /// Whether the account is a bot.
    #[serde(default)]
    pub is_bot: bool,
    /// Profile details.
    #[serde(default)]
    pub profile: UserProfile,
}

/// Profile fields used for lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    /// Display name shown in Slack (may be empty).
    #[serde(default)]
    pub display_name: String,
}

/// One page of `users.list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsersPage {
    /// Members on this page.
    pub members: Vec<User>,
    /// Cursor for the next page; `None` or empty when done.
    pub next_cursor: Option<String>,
}

/// A user group (`@handle`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserGroup {
    /// Group id (`S...`).
    pub id: String,
    /// Mention handle without the `@`.
    pub handle: String,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// The subset of the Slack Web API this crate uses.
///
/// Implementations must report throttling as
/// [`crate::error::SlackLineError::RateLimited`] so callers can back off.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// `chat.postMessage`.
    async fn post_message(&self, request: &PostMessage) -> Result<MessageResponse>;

    /// `chat.update`.
    async fn update_message(&self, request: &UpdateMessage) -> Result<MessageResponse>;

    /// `users.list`, one page.
    async fn list_users(&self, cursor: Option<&str>) -> Result<UsersPage>;

    /// `usergroups.list`.
    async fn list_user_groups(&self) -> Result<Vec<UserGroup>>;
}

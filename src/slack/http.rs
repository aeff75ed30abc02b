//! reqwest-backed [`SlackApi`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{MessageResponse, PostMessage, SlackApi, UpdateMessage, User, UserGroup, UsersPage};
use crate::error::{Result, SlackLineError};

/// Default Slack Web API base URL.
pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Page size requested from `users.list`.
pub const USERS_PAGE_LIMIT: u32 = 200;

const CONNECT_TIMEOUT_SECS: u64 = 5;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Wait used when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

const MAX_ERROR_BODY_CHARS: usize = 256;

/// Slack Web API client over HTTPS.
pub struct HttpSlackApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for HttpSlackApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSlackApi")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    ts: String,
    channel: String,
    #[serde(default)]
    thread_ts: Option<String>,
    #[serde(default)]
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    thread_ts: Option<String>,
}

#[derive(Deserialize)]
struct UsersListResponse {
    #[serde(default)]
    members: Vec<User>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct UserGroupsResponse {
    #[serde(default)]
    usergroups: Vec<UserGroup>,
}

impl HttpSlackApi {
    /// Create a client for the public Slack API.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, SLACK_API_BASE)
    }

    /// Create a client pointing at `base_url` (no trailing slash).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build HTTP client with timeouts, using default");
                reqwest::Client::default()
            });
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    async fn post_json<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!(method, "calling Slack API");
        let response = self
            .client
            .post(self.url(method))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        parse_response(method, response).await
    }

    async fn get_json<T>(&self, method: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        debug!(method, "calling Slack API");
        let response = self
            .client
            .get(self.url(method))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;
        parse_response(method, response).await
    }
}

#[async_trait]
impl SlackApi for HttpSlackApi {
    async fn post_message(&self, request: &PostMessage) -> Result<MessageResponse> {
        let chat: ChatResponse = self.post_json("chat.postMessage", request).await?;
        Ok(chat.into())
    }

    async fn update_message(&self, request: &UpdateMessage) -> Result<MessageResponse> {
        let chat: ChatResponse = self.post_json("chat.update", request).await?;
        Ok(chat.into())
    }

    async fn list_users(&self, cursor: Option<&str>) -> Result<UsersPage> {
        let mut query = vec![("limit", USERS_PAGE_LIMIT.to_string())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_owned()));
        }
        let list: UsersListResponse = self.get_json("users.list", &query).await?;
        Ok(UsersPage {
            members: list.members,
            next_cursor: list
                .response_metadata
                .and_then(|m| m.next_cursor)
                .filter(|c| !c.trim().is_empty()),
        })
    }

    async fn list_user_groups(&self) -> Result<Vec<UserGroup>> {
        let list: UserGroupsResponse = self.get_json("usergroups.list", &[]).await?;
        Ok(list.usergroups)
    }
}

impl From<ChatResponse> for MessageResponse {
    fn from(chat: ChatResponse) -> Self {
        let thread_ts = chat
            .thread_ts
            .or_else(|| chat.message.and_then(|m| m.thread_ts));
        Self {
            ts: chat.ts,
            channel: chat.channel,
            thread_ts,
        }
    }
}

/// Map an HTTP response onto a typed payload or a [`SlackLineError`].
async fn parse_response<T: DeserializeOwned>(
    method: &str,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = retry_after(response.headers().get(RETRY_AFTER));
        warn!(method, ?retry_after, "Slack rate limited the request");
        return Err(SlackLineError::RateLimited {
            method: method.to_owned(),
            retry_after,
        });
    }

    let body = response.text().await?;
    if !status.is_success() {
        return Err(SlackLineError::HttpStatus {
            method: method.to_owned(),
            status: status.as_u16(),
            body: sanitize_error_body(&body),
        });
    }

    let value: Value = serde_json::from_str(&body)?;
    let envelope: Envelope = serde_json::from_value(value.clone())?;
    if !envelope.ok {
        let error = envelope.error.unwrap_or_else(|| "unknown".to_owned());
        if error == "ratelimited" {
            return Err(SlackLineError::RateLimited {
                method: method.to_owned(),
                retry_after: Duration::from_secs(DEFAULT_RETRY_AFTER_SECS),
            });
        }
        return Err(SlackLineError::Api {
            method: method.to_owned(),
            error,
        });
    }

    Ok(serde_json::from_value(value)?)
}

fn retry_after(header: Option<&reqwest::header::HeaderValue>) -> Duration {
    header
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(Duration::from_secs(DEFAULT_RETRY_AFTER_SECS), Duration::from_secs)
}

/// Collapse whitespace, redact Slack tokens, and truncate an error body.
pub(crate) fn sanitize_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let sanitized = match Regex::new(r"xox[abposr]-[A-Za-z0-9\-]{10,}") {
        Ok(regex) => regex.replace_all(&collapsed, "[REDACTED]").into_owned(),
        Err(_) => collapsed,
    };

    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}

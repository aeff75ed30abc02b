//! Delivery engine: destination resolution, post/update calls, and
//! rate-limit backoff.

use std::future::Future;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::config::Configuration;
use crate::error::{Result, SlackLineError};
use crate::message::Message;
use crate::slack::mentions::resolve_mentions;
use crate::slack::{MessageResponse, PostMessage, UpdateMessage};
use crate::sent::SentMessage;

/// Retries after the first rate-limited attempt (three attempts in total).
pub const MAX_RETRIES: u32 = 2;

/// Pick the explicit destination, else the configured default channel.
///
/// # Errors
///
/// Returns [`SlackLineError::Configuration`] when neither is available.
pub fn resolve_destination<'a>(
    to: Option<&'a str>,
    configuration: &'a Configuration,
) -> Result<&'a str> {
    to.or(configuration.default_channel.as_deref()).ok_or_else(|| {
        SlackLineError::Configuration(
            "No target channel specified and no default_channel configured.".to_owned(),
        )
    })
}

/// Posts one message.
pub struct MessageSender<'a> {
    client: &'a Client,
    message: &'a Message,
    to: Option<&'a str>,
    thread_ts: Option<&'a str>,
}

impl<'a> MessageSender<'a> {
    /// Prepare to post `message` through `client`.
    pub fn new(client: &'a Client, message: &'a Message) -> Self {
        Self {
            client,
            message,
            to: None,
            thread_ts: None,
        }
    }

    /// Explicit destination: a channel id/name or `@display-name`.
    #[must_use]
    pub fn to(mut self, to: Option<&'a str>) -> Self {
        self.to = to;
        self
    }

    /// Root timestamp to reply under.
    #[must_use]
    pub fn thread_ts(mut self, thread_ts: Option<&'a str>) -> Self {
        self.thread_ts = thread_ts;
        self
    }

    /// Resolve the destination, post, and wrap the response.
    ///
    /// # Errors
    ///
    /// Returns [`SlackLineError::Configuration`] when no destination is
    /// configured, [`SlackLineError::UserNotFound`] for an unknown
    /// `@display-name`, [`SlackLineError::RateLimited`] once retries are
    /// exhausted (or immediately when backoff is off), and any other API
    /// error unchanged.
    pub async fn post(self) -> Result<SentMessage> {
        let configuration = self.client.configuration();
        let supplied = resolve_destination(self.to, configuration)?;
        let channel = resolve_target(self.client, supplied).await?;
        let blocks = content_data(self.client, self.message).await?;

        let request = PostMessage {
            channel,
            blocks,
            thread_ts: self.thread_ts.map(ToOwned::to_owned),
            bot_name: configuration.bot_name.clone(),
        };
        debug!(channel = %request.channel, thread_ts = ?request.thread_ts, "posting message");

        let api = self.client.api();
        let response = with_backoff(configuration.backoff, || api.post_message(&request)).await?;
        let response = link_to_thread(response, request.thread_ts.as_deref());
        info!(channel = %response.channel, ts = %response.ts, "posted message");

        Ok(SentMessage::new(request.blocks, None, response))
    }
}

/// Replace the content of the message at `channel`/`ts`.
///
/// Returns the serialized content that was sent and the API response.
///
/// # Errors
///
/// Same as [`MessageSender::post`], minus destination resolution.
pub(crate) async fn update_message(
    client: &Client,
    channel: &str,
    ts: &str,
    message: &Message,
) -> Result<(Value, MessageResponse)> {
    let request = UpdateMessage {
        channel: channel.to_owned(),
        ts: ts.to_owned(),
        blocks: content_data(client, message).await?,
    };
    debug!(channel, ts, "updating message");

    let api = client.api();
    let response =
        with_backoff(client.configuration().backoff, || api.update_message(&request)).await?;
    info!(channel = %response.channel, ts = %response.ts, "updated message");

    Ok((request.blocks, response))
}

/// Run `call`, sleeping and retrying on rate limits when `enabled`.
///
/// At most [`MAX_RETRIES`] retries are made; the last rate-limit error is
/// returned once they are exhausted. Other errors are returned immediately.
///
/// # Errors
///
/// Returns the error of the final attempt.
pub async fn with_backoff<T, F, Fut>(enabled: bool, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries: u32 = 0;
    loop {
        match call().await {
            Err(SlackLineError::RateLimited {
                method,
                retry_after,
            }) if enabled && retries < MAX_RETRIES => {
                retries = retries.saturating_add(1);
                warn!(%method, ?retry_after, retry = retries, "rate limited, backing off");
                tokio::time::sleep(retry_after).await;
            }
            outcome => return outcome,
        }
    }
}

async fn resolve_target(client: &Client, supplied: &str) -> Result<String> {
    match supplied.strip_prefix('@') {
        Some(display_name) => {
            let user = client.users().find(display_name).await?;
            debug!(display_name, user = %user.id, "resolved destination user");
            Ok(user.id)
        }
        None => Ok(supplied.to_owned()),
    }
}

async fn content_data(client: &Client, message: &Message) -> Result<Value> {
    let blocks = message.content().to_value()?;
    if client.configuration().look_up_users {
        resolve_mentions(&blocks, client.users(), client.groups()).await
    } else {
        Ok(blocks)
    }
}

/// Record the requested root when the response omits it, and never record a
/// message as a reply to itself.
pub(crate) fn link_to_thread(mut response: MessageResponse, requested: Option<&str>) -> MessageResponse {
    if response.thread_ts.is_none() {
        response.thread_ts = requested.map(ToOwned::to_owned);
    }
    if response.thread_ts.as_deref() == Some(response.ts.as_str()) {
        response.thread_ts = None;
    }
    response
}

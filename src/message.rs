//! A single, immutable message body.

use tracing::debug;

use crate::blocks::{Block, Blocks};
use crate::builder::MessageBuilder;
use crate::client::Client;
use crate::content::Content;
use crate::error::{Result, SlackLineError};
use crate::sender::MessageSender;
use crate::sent::SentMessage;

/// A message DSL block.
pub type MessageDsl<'a> = Box<dyn FnOnce(&mut MessageBuilder) + 'a>;

/// Message content built from literal strings, a block tree, or the DSL.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    content: Blocks,
    builder_url: String,
}

impl Message {
    /// Build a message from supplied items or a DSL block, never both.
    ///
    /// Each string becomes its own markdown section. A single [`Blocks`]
    /// value is used as-is.
    ///
    /// # Errors
    ///
    /// Returns [`SlackLineError::InvalidArgument`] when both or neither
    /// inputs are given, when more than one block tree is supplied, when
    /// block trees and strings are mixed, or when a [`Message`] is supplied.
    pub fn new(items: Vec<Content>, dsl: Option<MessageDsl<'_>>) -> Result<Self> {
        match (items.is_empty(), dsl) {
            (false, Some(_)) => Err(SlackLineError::invalid(
                "Provide either text/blocks or a DSL block, not both.",
            )),
            (true, None) => Err(SlackLineError::invalid(
                "Provide either text/blocks or a DSL block.",
            )),
            (true, Some(dsl)) => Self::from_blocks(MessageBuilder::build(dsl)),
            (false, None) => Self::from_blocks(content_from_items(items)?),
        }
    }

    /// A message with one markdown section.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be serialized.
    pub fn text(text: impl Into<String>) -> Result<Self> {
        Self::texts([text])
    }

    /// A message with one markdown section per string, in order.
    ///
    /// # Errors
    ///
    /// Returns [`SlackLineError::InvalidArgument`] if `texts` is empty.
    pub fn texts<I, S>(texts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<Content> = texts.into_iter().map(|t| Content::Text(t.into())).collect();
        Self::new(items, None)
    }

    /// A message wrapping a prebuilt block tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be serialized.
    pub fn from_blocks(content: Blocks) -> Result<Self> {
        let builder_url = content.builder_url()?;
        Ok(Self {
            content,
            builder_url,
        })
    }

    /// A message built with the DSL.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be serialized.
    pub fn build(f: impl FnOnce(&mut MessageBuilder)) -> Result<Self> {
        Self::from_blocks(MessageBuilder::build(f))
    }

    /// The message content.
    pub fn content(&self) -> &Blocks {
        &self.content
    }

    /// Block Kit Builder URL previewing this message.
    pub fn builder_url(&self) -> &str {
        &self.builder_url
    }

    /// Post this message.
    ///
    /// `to` falls back to the configured default channel. After a successful
    /// post the configured message delay is slept.
    ///
    /// # Errors
    ///
    /// See [`MessageSender::post`].
    pub async fn post(
        &self,
        client: &Client,
        to: Option<&str>,
        thread_ts: Option<&str>,
    ) -> Result<SentMessage> {
        let sent = MessageSender::new(client, self)
            .to(to)
            .thread_ts(thread_ts)
            .post()
            .await?;

        let delay = client.configuration().message_delay();
        if !delay.is_zero() {
            debug!(?delay, "pausing after message post");
            tokio::time::sleep(delay).await;
        }
        Ok(sent)
    }
}

fn content_from_items(items: Vec<Content>) -> Result<Blocks> {
    let mut sections = Vec::new();
    let mut tree: Option<Blocks> = None;

    for item in items {
        match item {
            Content::Text(text) if tree.is_none() => sections.push(Block::section(text, false)),
            Content::Blocks(blocks) if tree.is_none() && sections.is_empty() => tree = Some(blocks),
            other => {
                return Err(SlackLineError::invalid(format!(
                    "Invalid content type: {}",
                    other.kind()
                )))
            }
        }
    }

    Ok(tree.unwrap_or_else(|| Blocks::new(sections)))
}

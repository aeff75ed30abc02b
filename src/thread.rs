//! An ordered sequence of messages posted as one Slack thread.

use tracing::{debug, info};

use crate::builder::ThreadBuilder;
use crate::client::Client;
use crate::content::Content;
use crate::error::{Result, SlackLineError};
use crate::message::Message;
use crate::sender::{resolve_destination, MessageSender};
use crate::sent::{SentMessage, SentThread};

/// A thread DSL block.
pub type ThreadDsl<'a> = Box<dyn FnOnce(&mut ThreadBuilder) + 'a>;

/// Messages to be posted as a root message followed by replies.
#[derive(Debug, Clone, PartialEq)]
pub struct Thread {
    messages: Vec<Message>,
}

impl Thread {
    /// Build a thread from supplied items or a thread DSL block, never both.
    ///
    /// # Errors
    ///
    /// Returns [`SlackLineError::InvalidArgument`] when both or neither
    /// inputs are given, or when the DSL records an invalid `message` call.
    pub fn new(items: Vec<Content>, dsl: Option<ThreadDsl<'_>>) -> Result<Self> {
        match (items.is_empty(), dsl) {
            (false, Some(_)) => Err(SlackLineError::invalid(
                "Provide either texts/blocks/Messages or a DSL block, not both.",
            )),
            (true, None) => Err(SlackLineError::invalid(
                "Provide either texts/blocks/Messages or a DSL block.",
            )),
            (true, Some(dsl)) => Self::build(dsl),
            (false, None) => Self::from_contents(items),
        }
    }

    /// Build a thread with the thread DSL.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded by the builder, or
    /// [`SlackLineError::InvalidArgument`] if no messages were added.
    pub fn build(f: impl FnOnce(&mut ThreadBuilder)) -> Result<Self> {
        let mut builder = ThreadBuilder::default();
        f(&mut builder);
        let contents = builder.finish()?;
        if contents.is_empty() {
            return Err(SlackLineError::invalid("A thread needs at least one message."));
        }
        Self::from_contents(contents)
    }

    /// Normalize each item into a [`Message`], preserving order.
    ///
    /// # Errors
    ///
    /// Returns an error if `contents` is empty or a message cannot be built.
    pub fn from_contents(contents: Vec<Content>) -> Result<Self> {
        if contents.is_empty() {
            return Err(SlackLineError::invalid(
                "Provide either texts/blocks/Messages or a DSL block.",
            ));
        }
        let messages = contents
            .into_iter()
            .map(|content| match content {
                Content::Message(message) => Ok(message),
                Content::Text(text) => Message::text(text),
                Content::Blocks(blocks) => Message::from_blocks(blocks),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { messages })
    }

    /// The messages, in posting order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false; a thread holds at least one message.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// One Block Kit Builder URL per message, in order.
    pub fn builder_urls(&self) -> Vec<&str> {
        self.messages.iter().map(Message::builder_url).collect()
    }

    /// Post the thread: the first message as the root, the rest as replies.
    ///
    /// Replies are sent to the root's resolved channel, one at a time, each
    /// after the previous post has completed.
    ///
    /// # Errors
    ///
    /// Returns [`SlackLineError::Configuration`] if no destination is
    /// configured, or the first delivery error encountered. Messages posted
    /// before the failure stay posted.
    pub async fn post(&self, client: &Client, to: Option<&str>) -> Result<SentThread> {
        let target = resolve_destination(to, client.configuration())?;
        let (first, rest) = self
            .messages
            .split_first()
            .ok_or_else(|| SlackLineError::invalid("A thread needs at least one message."))?;

        let root = MessageSender::new(client, first).to(Some(target)).post().await?;
        info!(channel = %root.channel(), ts = %root.ts(), "posted thread root");

        let mut sent = Vec::with_capacity(self.messages.len());
        let replies = post_replies(client, rest, root.channel(), root.ts()).await?;
        sent.push(root);
        sent.extend(replies);
        SentThread::new(sent)
    }
}

/// Post `messages` as replies under `thread_ts`, in order.
pub(crate) async fn post_replies(
    client: &Client,
    messages: &[Message],
    channel: &str,
    thread_ts: &str,
) -> Result<Vec<SentMessage>> {
    let delay = client.configuration().thread_delay();
    let mut sent = Vec::with_capacity(messages.len());
    for message in messages {
        if !delay.is_zero() {
            debug!(?delay, "pausing between thread messages");
            tokio::time::sleep(delay).await;
        }
        let reply = MessageSender::new(client, message)
            .to(Some(channel))
            .thread_ts(Some(thread_ts))
            .post()
            .await?;
        sent.push(reply);
    }
    Ok(sent)
}

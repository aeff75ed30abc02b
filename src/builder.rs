//! Builder DSL for message and thread content.
//!
//! Closures receive an explicit builder instead of an implicit receiver:
//!
//! ```
//! use slackline::builder::MessageBuilder;
//!
//! let who = "world";
//! let blocks = MessageBuilder::build(|b| {
//!     b.text(format!("Hello, *{who}*"));
//!     b.section(|s| {
//!         s.text("Docs");
//!         s.link("Open", "https://example.com");
//!     });
//!     b.divider();
//! });
//! assert_eq!(blocks.len(), 3);
//! ```
//!
//! `link` only exists on [`SectionBuilder`], so a link outside a section
//! scope cannot be expressed.

use crate::blocks::{Accessory, Block, Blocks, TextObject};
use crate::content::Content;
use crate::error::SlackLineError;

/// Accumulates top-level blocks for one message.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    blocks: Vec<Block>,
}

impl MessageBuilder {
    /// Run `f` against a fresh builder and return the finished blocks.
    pub fn build(f: impl FnOnce(&mut MessageBuilder)) -> Blocks {
        let mut builder = Self::default();
        f(&mut builder);
        builder.finish()
    }

    /// Append a markdown section.
    pub fn text(&mut self, content: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::section(content, false));
        self
    }

    /// Append a plain-text section.
    pub fn plain_text(&mut self, content: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::section(content, true));
        self
    }

    /// Append a markdown context line.
    pub fn context(&mut self, content: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::context(content, false));
        self
    }

    /// Append a plain-text context line.
    pub fn plain_context(&mut self, content: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::context(content, true));
        self
    }

    /// Append a divider.
    pub fn divider(&mut self) -> &mut Self {
        self.blocks.push(Block::Divider);
        self
    }

    /// Open a section scope, run `f` against it, and append the result.
    pub fn section(&mut self, f: impl FnOnce(&mut SectionBuilder)) -> &mut Self {
        let mut section = SectionBuilder::default();
        f(&mut section);
        self.blocks.push(section.finish());
        self
    }

    /// Append an already-built block.
    pub fn push(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self
    }

    /// Consume the builder.
    pub fn finish(self) -> Blocks {
        Blocks::new(self.blocks)
    }
}

/// Accumulates the text and accessory of one section.
#[derive(Debug, Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
    accessory: Option<Accessory>,
}

impl SectionBuilder {
    /// Set the section text (markdown). A later call replaces it.
    pub fn text(&mut self, content: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::new(content, false));
        self
    }

    /// Set the section text (plain). A later call replaces it.
    pub fn plain_text(&mut self, content: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::new(content, true));
        self
    }

    /// Attach a link button. A later call replaces it.
    pub fn link(&mut self, text: impl Into<String>, url: impl Into<String>) -> &mut Self {
        self.accessory = Some(Accessory::link(text, url));
        self
    }

    fn finish(self) -> Block {
        Block::Section {
            text: self.text,
            accessory: self.accessory,
        }
    }
}

/// Accumulates the messages of a thread.
#[derive(Debug, Default)]
pub struct ThreadBuilder {
    contents: Vec<Content>,
    error: Option<SlackLineError>,
}

impl ThreadBuilder {
    /// Append a literal string message.
    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.contents.push(Content::Text(text.into()));
        self
    }

    /// Append a string, block list, or prebuilt message.
    pub fn message(&mut self, supplied: impl Into<Content>) -> &mut Self {
        self.contents.push(supplied.into());
        self
    }

    /// Append a message built with the message DSL.
    pub fn message_with(&mut self, f: impl FnOnce(&mut MessageBuilder)) -> &mut Self {
        self.contents.push(Content::Blocks(MessageBuilder::build(f)));
        self
    }

    /// Append either a supplied message or a DSL-built one.
    ///
    /// Exactly one of `supplied` and `block` must be given; otherwise an
    /// `InvalidArgument` is recorded and returned by [`ThreadBuilder::finish`].
    pub fn push(
        &mut self,
        supplied: Option<Content>,
        block: Option<Blocks>,
    ) -> &mut Self {
        match (supplied, block) {
            (Some(content), None) => self.contents.push(content),
            (None, Some(blocks)) => self.contents.push(Content::Blocks(blocks)),
            _ => self.record(SlackLineError::invalid(
                "Provide either a supplied message or a message block, not both.",
            )),
        }
        self
    }

    fn record(&mut self, error: SlackLineError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Consume the builder, returning the accumulated contents in order.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded by [`ThreadBuilder::push`].
    pub fn finish(self) -> Result<Vec<Content>, SlackLineError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.contents),
        }
    }
}

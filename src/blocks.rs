//! Block Kit content tree.
//!
//! The serialized shape is the wire format Slack accepts; field order is
//! fixed by declaration order so preview URLs are stable.

use serde::{Deserialize, Serialize};

/// Prefix of the Block Kit Builder preview URL.
pub const BUILDER_URL_PREFIX: &str = "https://app.slack.com/block-kit-builder#";

/// Action id attached to every link button.
pub const LINK_ACTION_ID: &str = "link-button";

/// A text run with its styling discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    /// Markdown-styled text.
    Mrkdwn {
        /// The text.
        text: String,
    },
    /// Plain text.
    PlainText {
        /// The text.
        text: String,
    },
}

impl TextObject {
    /// Build a text run, plain or markdown.
    pub fn new(text: impl Into<String>, plain: bool) -> Self {
        let text = text.into();
        if plain {
            Self::PlainText { text }
        } else {
            Self::Mrkdwn { text }
        }
    }

    /// The raw text.
    pub fn text(&self) -> &str {
        match self {
            Self::Mrkdwn { text } | Self::PlainText { text } => text,
        }
    }
}

/// Section accessory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Accessory {
    /// A link button.
    Button {
        /// Button label (always plain text).
        text: TextObject,
        /// Action identifier.
        action_id: String,
        /// Target URL.
        url: String,
    },
}

impl Accessory {
    /// A link button labelled `text` pointing at `url`.
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Button {
            text: TextObject::new(text, true),
            action_id: LINK_ACTION_ID.to_owned(),
            url: url.into(),
        }
    }
}

/// A top-level content node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A section with optional text and accessory.
    Section {
        /// Section text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<TextObject>,
        /// Section accessory (link button).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        accessory: Option<Accessory>,
    },
    /// A context line.
    Context {
        /// Context elements.
        elements: Vec<TextObject>,
    },
    /// A horizontal divider.
    Divider,
}

impl Block {
    /// A section holding a single text run.
    pub fn section(text: impl Into<String>, plain: bool) -> Self {
        Self::Section {
            text: Some(TextObject::new(text, plain)),
            accessory: None,
        }
    }

    /// A context block holding a single text run.
    pub fn context(text: impl Into<String>, plain: bool) -> Self {
        Self::Context {
            elements: vec![TextObject::new(text, plain)],
        }
    }
}

/// An ordered, immutable list of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blocks(Vec<Block>);

impl Blocks {
    /// Wrap an ordered block list.
    pub fn new(blocks: Vec<Block>) -> Self {
        Self(blocks)
    }

    /// The blocks, in order.
    pub fn as_slice(&self) -> &[Block] {
        &self.0
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no blocks.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The JSON value sent to the API.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Block Kit Builder URL previewing these blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn builder_url(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Payload<'a> {
            blocks: &'a Blocks,
        }

        let json = serde_json::to_string(&Payload { blocks: self })?;
        let encoded: String = url::form_urlencoded::byte_serialize(json.as_bytes()).collect();
        Ok(format!("{BUILDER_URL_PREFIX}{encoded}"))
    }
}

impl From<Vec<Block>> for Blocks {
    fn from(blocks: Vec<Block>) -> Self {
        Self(blocks)
    }
}

impl<'a> IntoIterator for &'a Blocks {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

//! Supplied message content: a literal string, a block tree, or a message.

use serde_json::Value;

use crate::blocks::Blocks;
use crate::error::SlackLineError;
use crate::message::Message;

/// One supplied piece of content, resolved once at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// A literal string, rendered as a markdown section.
    Text(String),
    /// A prebuilt block tree.
    Blocks(Blocks),
    /// An already constructed message.
    Message(Message),
}

impl Content {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "String",
            Self::Blocks(_) => "Blocks",
            Self::Message(_) => "Message",
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Blocks> for Content {
    fn from(blocks: Blocks) -> Self {
        Self::Blocks(blocks)
    }
}

impl From<Message> for Content {
    fn from(message: Message) -> Self {
        Self::Message(message)
    }
}

impl TryFrom<Value> for Content {
    type Error = SlackLineError;

    /// Strings become text, arrays become blocks; anything else is rejected.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(text) => Ok(Self::Text(text)),
            Value::Array(_) => serde_json::from_value::<Blocks>(value)
                .map(Self::Blocks)
                .map_err(|e| SlackLineError::invalid(format!("Invalid blocks: {e}"))),
            other => Err(SlackLineError::invalid(format!(
                "Invalid content type: {}. Expected a String, Blocks, or Message.",
                json_type_name(&other)
            ))),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

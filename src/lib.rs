//! Slackline: compose Slack messages and threads with a small builder DSL,
//! post them, and keep a JSON record of what was sent so it can later be
//! updated or appended to.
//!
//! All network operations go through an explicitly constructed [`Client`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod blocks;
pub mod builder;
pub mod content;
pub mod error;
pub mod message;
pub mod thread;

pub mod client;
pub mod config;
pub mod sender;
pub mod slack;

pub mod record;
pub mod sent;

pub mod cli;
pub mod logging;
pub mod script;

pub use blocks::{Block, Blocks};
pub use builder::{MessageBuilder, SectionBuilder, ThreadBuilder};
pub use client::Client;
pub use config::{ConfigOverrides, Configuration, Environment};
pub use content::Content;
pub use error::{Result, SlackLineError};
pub use message::Message;
pub use sent::{Sent, SentMessage, SentThread};
pub use thread::Thread;

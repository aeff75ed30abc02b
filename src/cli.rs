//! Command-line surface: `slackline message` and `slackline thread`.
//!
//! Every flag combination is validated, and any record named by `--append`
//! or `--update` is loaded, before a client is connected.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::client::Client;
use crate::config::{ConfigOverrides, Configuration, Environment, ENV_ALLOW_DSL};
use crate::content::Content;
use crate::error::{Result, SlackLineError};
use crate::message::Message;
use crate::record;
use crate::script;
use crate::sent::Sent;
use crate::thread::Thread;

const MESSAGE_RULE: &str = "\n\n--------------------- Message ---------------------";

/// Compose, preview, and post Slack messages and threads.
#[derive(Debug, Parser)]
#[command(name = "slackline", version, about)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Options shared by every subcommand.
    pub fn common(&self) -> &CommonArgs {
        match &self.command {
            Command::Message(args) => &args.common,
            Command::Thread(args) => &args.common,
        }
    }
}

/// Available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Preview, post, append, or update a single message.
    Message(MessageArgs),
    /// Preview or post a thread.
    Thread(ThreadArgs),
}

/// Options shared by `message` and `thread`.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Slack API token.
    #[arg(short = 't', long, value_name = "TOKEN")]
    pub slack_token: Option<String>,
    /// Resolve `@name` mentions through the user and group directories.
    #[arg(short = 'u', long)]
    pub look_up_users: bool,
    /// Display name to post as.
    #[arg(short = 'n', long, value_name = "NAME")]
    pub bot_name: Option<String>,
    /// Channel or `@display-name` to post to.
    #[arg(short = 'p', long, value_name = "TARGET")]
    pub post_to: Option<String>,
    /// Write the resulting record to this file.
    #[arg(short = 's', long, value_name = "PATH")]
    pub save: Option<PathBuf>,
    /// Fail on the first rate limit instead of retrying.
    #[arg(long)]
    pub no_backoff: bool,
    /// Log debug output to stderr.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl CommonArgs {
    /// Configuration overrides for the flags that were given.
    pub fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::default();
        if let Some(token) = &self.slack_token {
            overrides = overrides.slack_token(token.clone());
        }
        if self.look_up_users {
            overrides = overrides.look_up_users(true);
        }
        if let Some(name) = &self.bot_name {
            overrides = overrides.bot_name(name.clone());
        }
        if self.no_backoff {
            overrides = overrides.backoff(false);
        }
        overrides
    }
}

/// Arguments for `slackline message`.
#[derive(Debug, Clone, Args)]
pub struct MessageArgs {
    /// Shared options.
    #[command(flatten)]
    pub common: CommonArgs,
    /// Append the message to the thread recorded in this file.
    #[arg(short = 'a', long, value_name = "PATH")]
    pub append: Option<PathBuf>,
    /// Replace a message recorded in this file.
    #[arg(short = 'U', long, value_name = "PATH")]
    pub update: Option<PathBuf>,
    /// Zero-based index of the thread member to update.
    #[arg(short = 'm', long, value_name = "N")]
    pub message_number: Option<usize>,
    /// Text sections; a script is read from stdin when omitted.
    pub content: Vec<String>,
}

/// Arguments for `slackline thread`.
#[derive(Debug, Clone, Args)]
pub struct ThreadArgs {
    /// Shared options.
    #[command(flatten)]
    pub common: CommonArgs,
    /// One message per argument; a script is read from stdin when omitted.
    pub content: Vec<String>,
}

/// What `slackline message` will do, after validation.
#[derive(Debug)]
pub enum MessageMode {
    /// Print the builder URL and content.
    Preview,
    /// Post to the given destination.
    Post(String),
    /// Append to a loaded record.
    Append(Sent),
    /// Update a loaded record, at `index` for threads.
    Update {
        /// The loaded record.
        target: Sent,
        /// Thread member to replace.
        index: Option<usize>,
    },
}

impl MessageArgs {
    /// Validate the flag combination and load any referenced record.
    ///
    /// # Errors
    ///
    /// Returns [`SlackLineError::InvalidArgument`] for conflicting or
    /// incomplete flags, [`SlackLineError::MessageIndexOutOfRange`] for a
    /// bad `--message-number`, or the load error of a referenced record.
    pub fn mode(&self) -> Result<MessageMode> {
        let selected = [
            self.common.post_to.is_some(),
            self.append.is_some(),
            self.update.is_some(),
        ]
        .into_iter()
        .filter(|flag| *flag)
        .count();
        if selected > 1 {
            return Err(SlackLineError::invalid(
                "Only one of --post-to, --append, or --update can be used at a time",
            ));
        }
        if self.message_number.is_some() && self.update.is_none() {
            return Err(SlackLineError::invalid("--message-number requires --update"));
        }

        if let Some(path) = &self.append {
            return Ok(MessageMode::Append(record::load(path)?));
        }
        if let Some(path) = &self.update {
            let target = record::load(path)?;
            check_update_index(&target, self.message_number)?;
            return Ok(MessageMode::Update {
                target,
                index: self.message_number,
            });
        }
        Ok(match &self.common.post_to {
            Some(to) => MessageMode::Post(to.clone()),
            None => MessageMode::Preview,
        })
    }
}

/// Check `--message-number` against the record being updated.
///
/// # Errors
///
/// Returns an error when an index is given for a single message, missing
/// for a thread, or not below the thread's size.
pub fn check_update_index(target: &Sent, index: Option<usize>) -> Result<()> {
    match (target, index) {
        (Sent::Message(_), Some(_)) => Err(SlackLineError::invalid(
            "--message-number cannot be used when updating a single message",
        )),
        (Sent::Thread(_), None) => Err(SlackLineError::invalid(
            "--message-number is required when updating a thread",
        )),
        (Sent::Thread(thread), Some(index)) if index >= thread.len() => {
            Err(SlackLineError::MessageIndexOutOfRange {
                index,
                size: thread.len(),
            })
        }
        _ => Ok(()),
    }
}

/// Run `cli` against the process's standard streams and the Slack Web API.
///
/// # Errors
///
/// Returns the first validation, script, delivery, or I/O error.
pub async fn run(cli: &Cli, environment: &Environment) -> anyhow::Result<()> {
    let mut input = std::io::stdin();
    let mut out = std::io::stdout();
    let mut err = std::io::stderr();
    run_with(cli, environment, &mut input, &mut out, &mut err, Client::new).await
}

/// Run `cli` with explicit streams and a client factory.
///
/// `connect` is only called for modes that talk to Slack.
///
/// # Errors
///
/// Returns the first validation, script, delivery, or I/O error.
pub async fn run_with<C>(
    cli: &Cli,
    environment: &Environment,
    input: &mut dyn Read,
    out: &mut dyn Write,
    err: &mut dyn Write,
    connect: C,
) -> anyhow::Result<()>
where
    C: FnOnce(Configuration) -> Result<Client>,
{
    let configuration = Configuration::resolve(&cli.common().overrides(), None, environment);
    match &cli.command {
        Command::Message(args) => {
            run_message(args, configuration, input, out, err, connect).await
        }
        Command::Thread(args) => run_thread(args, configuration, input, out, err, connect).await,
    }
}

async fn run_message<C>(
    args: &MessageArgs,
    configuration: Configuration,
    input: &mut dyn Read,
    out: &mut dyn Write,
    err: &mut dyn Write,
    connect: C,
) -> anyhow::Result<()>
where
    C: FnOnce(Configuration) -> Result<Client>,
{
    let mode = args.mode()?;
    let message = if args.content.is_empty() {
        script::parse_message(&read_script(&configuration, input, err)?)?
    } else {
        Message::texts(args.content.iter().cloned())?
    };
    debug!(?mode, blocks = message.content().len(), "message ready");

    let result: Sent = match mode {
        MessageMode::Preview => {
            writeln!(err, "Preview message at {}\n", message.builder_url())?;
            writeln!(out, "{}", serde_json::to_string_pretty(message.content())?)?;
            return Ok(());
        }
        MessageMode::Post(to) => {
            let client = connect(configuration)?;
            let sent = message.post(&client, Some(to.as_str()), None).await?;
            writeln!(err, "Posted message to {to}")?;
            sent.into()
        }
        MessageMode::Append(target) => {
            let client = connect(configuration)?;
            let thread = Thread::from_contents(vec![Content::Message(message)])?;
            let sent = match target {
                Sent::Message(root) => root.thread_from(&client, &thread).await?,
                Sent::Thread(existing) => existing.append(&client, &thread).await?,
            };
            writeln!(err, "Appended to thread in {}", sent.channel())?;
            sent.into()
        }
        MessageMode::Update { target, index } => {
            let client = connect(configuration)?;
            let updated: Sent = match (target, index) {
                (Sent::Message(sent), _) => sent.update(&client, &message).await?.into(),
                (Sent::Thread(thread), Some(index)) => {
                    thread.update_at(&client, index, &message).await?.into()
                }
                (Sent::Thread(_), None) => {
                    return Err(SlackLineError::invalid(
                        "--message-number is required when updating a thread",
                    )
                    .into())
                }
            };
            let kind = match updated {
                Sent::Message(_) => "message",
                Sent::Thread(_) => "thread",
            };
            writeln!(err, "Updated {kind} in {}", updated.channel())?;
            updated
        }
    };

    save_record(args.common.save.as_deref(), &result)
}

async fn run_thread<C>(
    args: &ThreadArgs,
    configuration: Configuration,
    input: &mut dyn Read,
    out: &mut dyn Write,
    err: &mut dyn Write,
    connect: C,
) -> anyhow::Result<()>
where
    C: FnOnce(Configuration) -> Result<Client>,
{
    let thread = if args.content.is_empty() {
        script::parse_thread(&read_script(&configuration, input, err)?)?
    } else {
        Thread::from_contents(args.content.iter().cloned().map(Content::Text).collect())?
    };
    debug!(messages = thread.len(), "thread ready");

    let Some(to) = &args.common.post_to else {
        writeln!(err, "Preview messages at:")?;
        for url in thread.builder_urls() {
            writeln!(err, "  {url}")?;
        }
        for message in thread.messages() {
            writeln!(out, "{MESSAGE_RULE}")?;
            writeln!(out, "Preview at: {}\n", message.builder_url())?;
            writeln!(out, "{}", serde_json::to_string_pretty(message.content())?)?;
        }
        return Ok(());
    };

    let client = connect(configuration)?;
    let sent = thread.post(&client, Some(to.as_str())).await?;
    writeln!(err, "Posted thread to {to}")?;
    save_record(args.common.save.as_deref(), &sent.into())
}

fn read_script(
    configuration: &Configuration,
    input: &mut dyn Read,
    err: &mut dyn Write,
) -> anyhow::Result<String> {
    if !configuration.allow_dsl {
        return Err(SlackLineError::Configuration(format!(
            "No content provided and script input is disabled ({ENV_ALLOW_DSL} is off)."
        ))
        .into());
    }
    writeln!(
        err,
        "No content provided, reading script from stdin. Control+D to finish:\n"
    )?;
    let mut source = String::new();
    input
        .read_to_string(&mut source)
        .context("failed to read script from stdin")?;
    Ok(source)
}

fn save_record(path: Option<&Path>, sent: &Sent) -> anyhow::Result<()> {
    if let Some(path) = path {
        record::save(path, sent)?;
    }
    Ok(())
}

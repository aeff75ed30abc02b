//! Configuration resolution.
//!
//! Every field is resolved independently with the precedence:
//! explicit override > base configuration > environment variable > default.
//! An override wins when it is *present*, even if its value is empty or false.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::warn;

/// Environment variable holding the Slack API token.
pub const ENV_SLACK_TOKEN: &str = "SLACK_LINE_SLACK_TOKEN";
/// Environment variable enabling `@name` directory lookups.
pub const ENV_LOOK_UP_USERS: &str = "SLACK_LINE_LOOK_UP_USERS";
/// Environment variable holding the bot display name.
pub const ENV_BOT_NAME: &str = "SLACK_LINE_BOT_NAME";
/// Environment variable holding the default destination channel.
pub const ENV_DEFAULT_CHANNEL: &str = "SLACK_LINE_DEFAULT_CHANNEL";
/// Environment variable enabling script (DSL) input.
pub const ENV_ALLOW_DSL: &str = "SLACK_LINE_ALLOW_DSL";
/// Environment variable holding the per-message delay in seconds.
pub const ENV_MESSAGE_DELAY: &str = "SLACK_LINE_MESSAGE_DELAY";
/// Environment variable holding the per-thread-reply delay in seconds.
pub const ENV_THREAD_DELAY: &str = "SLACK_LINE_THREAD_DELAY";
/// Environment variable enabling rate-limit backoff.
pub const ENV_BACKOFF: &str = "SLACK_LINE_BACKOFF";
/// Legacy negative-sense switch that disables backoff when truthy.
pub const ENV_NO_BACKOFF: &str = "SLACK_LINE_NO_BACKOFF";

/// A snapshot of environment variables used during resolution.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Build an environment from a key-value map.
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Snapshot the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Returns the raw value for a key, if set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    fn string(&self, key: &str) -> Option<String> {
        self.get(key).map(ToOwned::to_owned)
    }

    fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).map(truthy)
    }

    fn seconds(&self, key: &str) -> Option<f64> {
        let raw = self.get(key)?;
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
            _ => {
                warn!(key, value = raw, "ignoring invalid delay in environment");
                None
            }
        }
    }
}

/// Returns true iff the lowercased value is `1`, `true`, or `yes`.
pub fn truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

/// Explicit overrides. `Some` marks a key as present.
///
/// Nullable fields use `Option<Option<_>>` so that an explicit "unset"
/// override still beats the base configuration and the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Slack API token override.
    pub slack_token: Option<Option<String>>,
    /// Directory lookup override.
    pub look_up_users: Option<bool>,
    /// Bot display name override.
    pub bot_name: Option<Option<String>>,
    /// Default channel override.
    pub default_channel: Option<Option<String>>,
    /// Script input override.
    pub allow_dsl: Option<bool>,
    /// Per-message delay override, in seconds.
    pub message_delay: Option<f64>,
    /// Per-thread-reply delay override, in seconds.
    pub thread_delay: Option<f64>,
    /// Backoff override.
    pub backoff: Option<bool>,
}

impl ConfigOverrides {
    /// Override the Slack token.
    #[must_use]
    pub fn slack_token(mut self, token: impl Into<Option<String>>) -> Self {
        self.slack_token = Some(token.into());
        self
    }

    /// Override directory lookups.
    #[must_use]
    pub fn look_up_users(mut self, enabled: bool) -> Self {
        self.look_up_users = Some(enabled);
        self
    }

    /// Override the bot display name.
    #[must_use]
    pub fn bot_name(mut self, name: impl Into<Option<String>>) -> Self {
        self.bot_name = Some(name.into());
        self
    }

    /// Override the default channel.
    #[must_use]
    pub fn default_channel(mut self, channel: impl Into<Option<String>>) -> Self {
        self.default_channel = Some(channel.into());
        self
    }

    /// Override whether script input is accepted.
    #[must_use]
    pub fn allow_dsl(mut self, allowed: bool) -> Self {
        self.allow_dsl = Some(allowed);
        self
    }

    /// Override the per-message delay (seconds).
    #[must_use]
    pub fn message_delay(mut self, seconds: f64) -> Self {
        self.message_delay = Some(seconds);
        self
    }

    /// Override the per-thread-reply delay (seconds).
    #[must_use]
    pub fn thread_delay(mut self, seconds: f64) -> Self {
        self.thread_delay = Some(seconds);
        self
    }

    /// Override rate-limit backoff.
    #[must_use]
    pub fn backoff(mut self, enabled: bool) -> Self {
        self.backoff = Some(enabled);
        self
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    /// Slack API token.
    pub slack_token: Option<String>,
    /// Rewrite `@name` mentions through the user directory.
    pub look_up_users: bool,
    /// Display name used when posting.
    pub bot_name: Option<String>,
    /// Destination used when none is given explicitly.
    pub default_channel: Option<String>,
    /// Whether script input is accepted.
    pub allow_dsl: bool,
    /// Seconds slept after each standalone message post.
    pub message_delay: f64,
    /// Seconds slept between consecutive messages of a thread.
    pub thread_delay: f64,
    /// Retry rate-limited calls.
    pub backoff: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            slack_token: None,
            look_up_users: false,
            bot_name: None,
            default_channel: None,
            allow_dsl: true,
            message_delay: 0.0,
            thread_delay: 0.0,
            backoff: true,
        }
    }
}

impl Configuration {
    /// Resolve a configuration from overrides, an optional base, and an environment.
    pub fn resolve(
        overrides: &ConfigOverrides,
        base: Option<&Configuration>,
        env: &Environment,
    ) -> Self {
        let defaults = Self::default();

        let backoff = overrides
            .backoff
            .or_else(|| base.map(|b| b.backoff))
            .or_else(|| env.flag(ENV_BACKOFF))
            .or_else(|| env.flag(ENV_NO_BACKOFF).filter(|off| *off).map(|_| false))
            .unwrap_or(defaults.backoff);

        Self {
            slack_token: cascade(
                overrides.slack_token.clone(),
                base.map(|b| b.slack_token.clone()),
                env.string(ENV_SLACK_TOKEN).map(Some),
                defaults.slack_token,
            ),
            look_up_users: cascade(
                overrides.look_up_users,
                base.map(|b| b.look_up_users),
                env.flag(ENV_LOOK_UP_USERS),
                defaults.look_up_users,
            ),
            bot_name: cascade(
                overrides.bot_name.clone(),
                base.map(|b| b.bot_name.clone()),
                env.string(ENV_BOT_NAME).map(Some),
                defaults.bot_name,
            ),
            default_channel: cascade(
                overrides.default_channel.clone(),
                base.map(|b| b.default_channel.clone()),
                env.string(ENV_DEFAULT_CHANNEL).map(Some),
                defaults.default_channel,
            ),
            allow_dsl: cascade(
                overrides.allow_dsl,
                base.map(|b| b.allow_dsl),
                env.flag(ENV_ALLOW_DSL),
                defaults.allow_dsl,
            ),
            message_delay: cascade(
                overrides.message_delay,
                base.map(|b| b.message_delay),
                env.seconds(ENV_MESSAGE_DELAY),
                defaults.message_delay,
            ),
            thread_delay: cascade(
                overrides.thread_delay,
                base.map(|b| b.thread_delay),
                env.seconds(ENV_THREAD_DELAY),
                defaults.thread_delay,
            ),
            backoff,
        }
    }

    /// Resolve against the current process environment.
    pub fn from_env(overrides: &ConfigOverrides, base: Option<&Configuration>) -> Self {
        Self::resolve(overrides, base, &Environment::from_process())
    }

    /// Delay after each standalone message post.
    pub fn message_delay(&self) -> Duration {
        seconds_to_duration(self.message_delay)
    }

    /// Delay between consecutive messages of a thread.
    pub fn thread_delay(&self) -> Duration {
        seconds_to_duration(self.thread_delay)
    }
}

fn cascade<T>(overridden: Option<T>, inherited: Option<T>, from_env: Option<T>, default: T) -> T {
    overridden.or(inherited).or(from_env).unwrap_or(default)
}

fn seconds_to_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
}

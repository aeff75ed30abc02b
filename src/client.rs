//! The explicitly passed context for all network operations.

use std::sync::Arc;

use crate::config::Configuration;
use crate::error::{Result, SlackLineError};
use crate::slack::directory::{Groups, Users};
use crate::slack::http::HttpSlackApi;
use crate::slack::SlackApi;

/// Configuration, API access, and directory caches for one session.
///
/// Directory listings are fetched at most once per client.
pub struct Client {
    configuration: Configuration,
    api: Arc<dyn SlackApi>,
    users: Users,
    groups: Groups,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("bot_name", &self.configuration.bot_name)
            .field("default_channel", &self.configuration.default_channel)
            .field("slack_token", &"[REDACTED]")
            .finish()
    }
}

impl Client {
    /// Create a client talking to the Slack Web API.
    ///
    /// # Errors
    ///
    /// Returns [`SlackLineError::InvalidArgument`] if no token is configured.
    pub fn new(configuration: Configuration) -> Result<Self> {
        let token = configuration
            .slack_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| SlackLineError::invalid("slack_token is required"))?;
        Ok(Self::with_api(configuration, Arc::new(HttpSlackApi::new(token))))
    }

    /// Create a client over any [`SlackApi`] implementation.
    pub fn with_api(configuration: Configuration, api: Arc<dyn SlackApi>) -> Self {
        Self {
            users: Users::new(Arc::clone(&api)),
            groups: Groups::new(Arc::clone(&api)),
            configuration,
            api,
        }
    }

    /// The resolved configuration.
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// The underlying API.
    pub fn api(&self) -> &dyn SlackApi {
        self.api.as_ref()
    }

    /// The cached user directory.
    pub fn users(&self) -> &Users {
        &self.users
    }

    /// The cached user-group directory.
    pub fn groups(&self) -> &Groups {
        &self.groups
    }
}

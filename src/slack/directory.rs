//! Lazily fetched, cached user and user-group directories.
//!
//! Each directory is listed from the API on first use and served from memory
//! afterwards. [`tokio::sync::OnceCell`] serializes concurrent first lookups.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use super::{SlackApi, User, UserGroup};
use crate::error::{Result, SlackLineError};

/// Active human users indexed by lowercased display name.
pub struct Users {
    api: Arc<dyn SlackApi>,
    by_display_name: OnceCell<HashMap<String, User>>,
}

impl Users {
    /// Create an empty (not yet fetched) directory.
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self {
            api,
            by_display_name: OnceCell::new(),
        }
    }

    /// Find a user by display name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`SlackLineError::UserNotFound`] on a miss, or the listing error.
    pub async fn find(&self, display_name: &str) -> Result<User> {
        self.lookup(display_name)
            .await?
            .ok_or_else(|| SlackLineError::UserNotFound(display_name.to_owned()))
    }

    /// Find a user by display name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns the listing error if the directory cannot be fetched.
    pub async fn lookup(&self, display_name: &str) -> Result<Option<User>> {
        let index = self.index().await?;
        Ok(index.get(&display_name.to_lowercase()).cloned())
    }

    /// All active, non-bot users.
    ///
    /// # Errors
    ///
    /// Returns the listing error if the directory cannot be fetched.
    pub async fn all(&self) -> Result<Vec<User>> {
        Ok(self.index().await?.values().cloned().collect())
    }

    async fn index(&self) -> Result<&HashMap<String, User>> {
        self.by_display_name
            .get_or_try_init(|| async {
                let users = fetch_all_users(self.api.as_ref()).await?;
                Ok::<_, SlackLineError>(
                    users
                        .into_iter()
                        .filter(|u| !u.deleted && !u.is_bot)
                        .map(|u| (u.profile.display_name.to_lowercase(), u))
                        .collect(),
                )
            })
            .await
    }
}

async fn fetch_all_users(api: &dyn SlackApi) -> Result<Vec<User>> {
    let mut page = api.list_users(None).await?;
    let mut users = std::mem::take(&mut page.members);
    let mut pages: u32 = 1;

    while let Some(cursor) = page.next_cursor.take().filter(|c| !c.is_empty()) {
        page = api.list_users(Some(&cursor)).await?;
        users.append(&mut page.members);
        pages = pages.saturating_add(1);
    }

    debug!(pages, users = users.len(), "fetched user directory");
    Ok(users)
}

/// User groups indexed by lowercased handle.
pub struct Groups {
    api: Arc<dyn SlackApi>,
    by_handle: OnceCell<HashMap<String, UserGroup>>,
}

impl Groups {
    /// Create an empty (not yet fetched) directory.
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self {
            api,
            by_handle: OnceCell::new(),
        }
    }

    /// Find a group by handle, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns the listing error if the directory cannot be fetched.
    pub async fn lookup(&self, handle: &str) -> Result<Option<UserGroup>> {
        let index = self
            .by_handle
            .get_or_try_init(|| async {
                let groups = self.api.list_user_groups().await?;
                debug!(groups = groups.len(), "fetched user group directory");
                Ok::<_, SlackLineError>(
                    groups
                        .into_iter()
                        .map(|g| (g.handle.to_lowercase(), g))
                        .collect(),
                )
            })
            .await?;
        Ok(index.get(&handle.to_lowercase()).cloned())
    }
}

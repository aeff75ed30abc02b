//! Scripted in-memory [`SlackApi`] shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use slackline::client::Client;
use slackline::config::Configuration;
use slackline::error::{Result, SlackLineError};
use slackline::slack::{
    MessageResponse, PostMessage, SlackApi, UpdateMessage, User, UserGroup, UserProfile, UsersPage,
};

/// Records every call and answers with deterministic timestamps.
///
/// Posts to `#name` resolve to channel id `C-name`; any other destination is
/// echoed back unchanged. The n-th post gets ts `1700000000.00000n`.
#[derive(Default)]
pub struct FakeSlackApi {
    pub post_calls: AtomicU32,
    pub update_calls: AtomicU32,
    pub user_list_calls: AtomicU32,
    pub group_list_calls: AtomicU32,
    posts: Mutex<Vec<PostMessage>>,
    updates: Mutex<Vec<UpdateMessage>>,
    throttled_first: u32,
    throttled_after: Option<u32>,
    updates_report_parent: bool,
    user_pages: Vec<Vec<User>>,
    groups: Vec<UserGroup>,
}

impl FakeSlackApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `pages` from `users.list`, chained by cursors.
    pub fn with_user_pages(mut self, pages: Vec<Vec<User>>) -> Self {
        self.user_pages = pages;
        self
    }

    pub fn with_groups(mut self, groups: Vec<UserGroup>) -> Self {
        self.groups = groups;
        self
    }

    /// Fail the first `count` posts with a zero-length rate limit.
    pub fn rate_limit_posts(mut self, count: u32) -> Self {
        self.throttled_first = count;
        self
    }

    /// Let `count` posts through, then rate limit every later one.
    pub fn rate_limit_posts_after(mut self, count: u32) -> Self {
        self.throttled_after = Some(count);
        self
    }

    /// Answer updates the way Slack does for a parent with replies:
    /// `thread_ts` equal to the updated `ts`.
    pub fn report_updated_parents(mut self) -> Self {
        self.updates_report_parent = true;
        self
    }

    pub fn posts(&self) -> Vec<PostMessage> {
        self.posts.lock().expect("posts lock").clone()
    }

    pub fn updates(&self) -> Vec<UpdateMessage> {
        self.updates.lock().expect("updates lock").clone()
    }

    pub fn post_count(&self) -> u32 {
        self.post_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SlackApi for FakeSlackApi {
    async fn post_message(&self, request: &PostMessage) -> Result<MessageResponse> {
        let call = self.post_calls.fetch_add(1, Ordering::SeqCst);
        let throttled =
            call < self.throttled_first || self.throttled_after.is_some_and(|n| call >= n);
        if throttled {
            return Err(SlackLineError::RateLimited {
                method: "chat.postMessage".to_owned(),
                retry_after: Duration::ZERO,
            });
        }

        let mut posts = self.posts.lock().expect("posts lock");
        posts.push(request.clone());
        let channel = match request.channel.strip_prefix('#') {
            Some(name) => format!("C-{name}"),
            None => request.channel.clone(),
        };
        Ok(MessageResponse {
            ts: format!("1700000000.{:06}", posts.len()),
            channel,
            thread_ts: request.thread_ts.clone(),
        })
    }

    async fn update_message(&self, request: &UpdateMessage) -> Result<MessageResponse> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.updates.lock().expect("updates lock").push(request.clone());
        Ok(MessageResponse {
            ts: request.ts.clone(),
            channel: request.channel.clone(),
            thread_ts: self.updates_report_parent.then(|| request.ts.clone()),
        })
    }

    async fn list_users(&self, cursor: Option<&str>) -> Result<UsersPage> {
        self.user_list_calls.fetch_add(1, Ordering::SeqCst);
        let index = cursor
            .and_then(|c| c.strip_prefix("page-"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        let members = self.user_pages.get(index).cloned().unwrap_or_default();
        let next = index.saturating_add(1);
        let next_cursor = (next < self.user_pages.len()).then(|| format!("page-{next}"));
        Ok(UsersPage {
            members,
            next_cursor,
        })
    }

    async fn list_user_groups(&self) -> Result<Vec<UserGroup>> {
        self.group_list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.groups.clone())
    }
}

pub fn user(id: &str, display_name: &str) -> User {
    User {
        id: id.to_owned(),
        deleted: false,
        is_bot: false,
        profile: UserProfile {
            display_name: display_name.to_owned(),
        },
    }
}

pub fn group(id: &str, handle: &str) -> UserGroup {
    UserGroup {
        id: id.to_owned(),
        handle: handle.to_owned(),
    }
}

/// Configuration with no delays and a default channel.
pub fn test_configuration() -> Configuration {
    Configuration {
        default_channel: Some("#general".to_owned()),
        ..Configuration::default()
    }
}

pub fn client_with(api: &Arc<FakeSlackApi>, configuration: Configuration) -> Client {
    let api: Arc<dyn SlackApi> = Arc::clone(api) as Arc<dyn SlackApi>;
    Client::with_api(configuration, api)
}

//! Tests for `src/slack/directory.rs`.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use slackline::error::SlackLineError;
use slackline::slack::directory::{Groups, Users};
use slackline::slack::{SlackApi, User};

use crate::fake_api::{group, user, FakeSlackApi};

fn inactive(id: &str, display_name: &str, deleted: bool, is_bot: bool) -> User {
    User {
        deleted,
        is_bot,
        ..user(id, display_name)
    }
}

fn as_api(api: &Arc<FakeSlackApi>) -> Arc<dyn SlackApi> {
    Arc::clone(api) as Arc<dyn SlackApi>
}

#[tokio::test]
async fn users_are_found_across_pages_case_insensitively() {
    let api = Arc::new(FakeSlackApi::new().with_user_pages(vec![
        vec![user("U1", "Alice")],
        vec![user("U2", "bob")],
    ]));
    let users = Users::new(as_api(&api));

    assert_eq!(users.find("alice").await.expect("found").id, "U1");
    assert_eq!(users.find("BOB").await.expect("found").id, "U2");
    assert_eq!(api.user_list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn directory_is_fetched_once() {
    let api = Arc::new(FakeSlackApi::new().with_user_pages(vec![vec![user("U1", "alice")]]));
    let users = Users::new(as_api(&api));

    for _ in 0..3 {
        users.lookup("alice").await.expect("lookup");
    }
    assert!(users.lookup("nobody").await.expect("lookup").is_none());
    assert_eq!(api.user_list_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn deleted_users_and_bots_are_skipped() {
    let api = Arc::new(FakeSlackApi::new().with_user_pages(vec![vec![
        inactive("U1", "gone", true, false),
        inactive("U2", "robot", false, true),
        user("U3", "human"),
    ]]));
    let users = Users::new(as_api(&api));

    let err = users.find("gone").await.expect_err("deleted");
    assert!(matches!(err, SlackLineError::UserNotFound(ref name) if name == "gone"));
    assert!(users.lookup("robot").await.expect("lookup").is_none());
    assert_eq!(users.all().await.expect("all").len(), 1);
}

#[tokio::test]
async fn groups_are_indexed_by_handle() {
    let api = Arc::new(FakeSlackApi::new().with_groups(vec![group("S1", "OnCall")]));
    let groups = Groups::new(as_api(&api));

    assert_eq!(
        groups.lookup("oncall").await.expect("lookup").map(|g| g.id),
        Some("S1".to_owned())
    );
    assert!(groups.lookup("missing").await.expect("lookup").is_none());
    assert_eq!(api.group_list_calls.load(Ordering::SeqCst), 1);
}

//! Tests for `src/message.rs` and `src/content.rs`.

use serde_json::json;

use slackline::blocks::{Block, Blocks, BUILDER_URL_PREFIX};
use slackline::builder::MessageBuilder;
use slackline::content::Content;
use slackline::error::SlackLineError;
use slackline::message::Message;

#[test]
fn each_string_becomes_a_markdown_section() {
    let message = Message::texts(["Hello", "World"]).expect("valid message");
    assert_eq!(
        message.content().to_value().expect("serializes"),
        json!([
            {"type": "section", "text": {"type": "mrkdwn", "text": "Hello"}},
            {"type": "section", "text": {"type": "mrkdwn", "text": "World"}},
        ])
    );
}

#[test]
fn prebuilt_blocks_are_used_as_is() {
    let blocks = Blocks::new(vec![Block::Divider, Block::context("note", true)]);
    let message = Message::new(vec![Content::Blocks(blocks.clone())], None).expect("valid");
    assert_eq!(message.content(), &blocks);
}

#[test]
fn dsl_block_builds_content() {
    let name = "team";
    let message = Message::new(
        Vec::new(),
        Some(Box::new(|b: &mut MessageBuilder| {
            b.text(format!("Hi {name}"));
        })),
    )
    .expect("valid");
    assert_eq!(message.content().len(), 1);
}

#[test]
fn items_and_dsl_together_are_rejected() {
    let err = Message::new(
        vec![Content::from("text")],
        Some(Box::new(|b: &mut MessageBuilder| {
            b.divider();
        })),
    )
    .expect_err("both");
    assert_eq!(
        err.to_string(),
        "Provide either text/blocks or a DSL block, not both."
    );
}

#[test]
fn no_input_is_rejected() {
    let err = Message::new(Vec::new(), None).expect_err("neither");
    assert!(matches!(err, SlackLineError::InvalidArgument(_)));
    assert_eq!(err.to_string(), "Provide either text/blocks or a DSL block.");
}

#[test]
fn two_block_trees_are_rejected() {
    let tree = Blocks::new(vec![Block::Divider]);
    let err = Message::new(
        vec![Content::Blocks(tree.clone()), Content::Blocks(tree)],
        None,
    )
    .expect_err("two trees");
    assert_eq!(err.to_string(), "Invalid content type: Blocks");
}

#[test]
fn a_message_is_not_message_content() {
    let inner = Message::text("inner").expect("valid");
    let err = Message::new(vec![Content::Message(inner)], None).expect_err("message item");
    assert_eq!(err.to_string(), "Invalid content type: Message");
}

#[test]
fn builder_url_embeds_encoded_blocks() {
    let message = Message::text("Hi there").expect("valid");
    assert_eq!(
        message.builder_url(),
        "https://app.slack.com/block-kit-builder#%7B%22blocks%22%3A%5B%7B%22type%22%3A%22section%22%2C%22text%22%3A%7B%22type%22%3A%22mrkdwn%22%2C%22text%22%3A%22Hi+there%22%7D%7D%5D%7D"
    );
    assert!(message.builder_url().starts_with(BUILDER_URL_PREFIX));
}

#[test]
fn content_from_json_accepts_strings_and_block_arrays() {
    let text = Content::try_from(json!("hello")).expect("string");
    assert_eq!(text.kind(), "String");

    let blocks = Content::try_from(json!([{"type": "divider"}])).expect("blocks");
    assert_eq!(blocks.kind(), "Blocks");

    let err = Content::try_from(json!(42)).expect_err("number");
    assert!(err.to_string().starts_with("Invalid content type"));
}

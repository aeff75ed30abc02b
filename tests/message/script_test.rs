//! Tests for `src/script.rs`.

use serde_json::json;

use slackline::script::{parse_message, parse_thread};

#[test]
fn message_script_builds_every_block_kind() {
    let message = parse_message(
        r#"
        # header comment
        text "Deploy *finished*"
        context "build 42" plain
        divider
        section {
          text "Notes"
          link "Open" "https://example.com/notes"
        }
        "#,
    )
    .expect("valid script");

    assert_eq!(
        message.content().to_value().expect("serializes"),
        json!([
            {"type": "section", "text": {"type": "mrkdwn", "text": "Deploy *finished*"}},
            {"type": "context", "elements": [{"type": "plain_text", "text": "build 42"}]},
            {"type": "divider"},
            {
                "type": "section",
                "text": {"type": "mrkdwn", "text": "Notes"},
                "accessory": {
                    "type": "button",
                    "text": {"type": "plain_text", "text": "Open"},
                    "action_id": "link-button",
                    "url": "https://example.com/notes",
                },
            },
        ])
    );
}

#[test]
fn link_outside_section_names_the_line() {
    let err = parse_message("text \"hi\"\nlink \"Open\" \"https://example.com\"")
        .expect_err("link outside section");
    assert_eq!(
        err.to_string(),
        "script line 2: `link` is only valid inside a section"
    );
}

#[test]
fn unknown_command_is_rejected() {
    let err = parse_message("shout \"hi\"").expect_err("unknown");
    assert_eq!(err.to_string(), "script line 1: unknown command `shout`");
}

#[test]
fn unterminated_section_is_rejected() {
    let err = parse_message("section {\n text \"hi\"").expect_err("unterminated");
    assert_eq!(err.to_string(), "script line 1: unterminated `{`");
}

#[test]
fn empty_message_script_is_rejected() {
    assert!(parse_message("# nothing here\n").is_err());
}

#[test]
fn thread_script_mixes_strings_and_nested_messages() {
    let thread = parse_thread(
        r#"
        text "Root"
        message "First reply"
        message {
          text "Second reply"
          divider
        }
        "#,
    )
    .expect("valid thread");

    assert_eq!(thread.len(), 3);
    assert_eq!(thread.messages()[2].content().len(), 2);
}

#[test]
fn thread_message_with_both_inputs_is_rejected() {
    let err = parse_thread("message \"a\" { text \"b\" }").expect_err("both");
    assert_eq!(
        err.to_string(),
        "Provide either a supplied message or a message block, not both."
    );
}

#[test]
fn bare_thread_message_is_rejected() {
    assert!(parse_thread("text \"root\"\nmessage\n").is_err());
}

#[test]
fn empty_nested_thread_message_is_rejected() {
    let err = parse_thread("text \"root\"\nmessage {\n  # nothing\n}\n").expect_err("empty");
    assert_eq!(err.to_string(), "script line 2: Script produced no content.");
}

#[test]
fn string_escapes_are_decoded() {
    let message = parse_message(r#"text "line one\nsaid \"hi\"""#).expect("valid");
    assert_eq!(
        message.content().to_value().expect("serializes")[0]["text"]["text"],
        json!("line one\nsaid \"hi\"")
    );
}

//! Rewrites `@name` tokens in markdown text into Slack mention syntax.
//!
//! Only objects shaped `{"type": "mrkdwn", "text": "..."}` are touched. A
//! token naming a user becomes `<@USERID>`, one naming a user group becomes
//! `<!subteam^GROUPID>`, and anything unknown is left as written.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::debug;

use super::directory::{Groups, Users};
use crate::error::Result;

static MENTION: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"@([\w-]+)").ok());

/// Resolve every `@token` in the markdown text of `content`.
///
/// Each distinct token is looked up once.
///
/// # Errors
///
/// Returns the directory listing error if a lookup cannot be performed.
pub async fn resolve_mentions(content: &Value, users: &Users, groups: &Groups) -> Result<Value> {
    let mut tokens = BTreeSet::new();
    collect_tokens(content, &mut tokens);
    if tokens.is_empty() {
        return Ok(content.clone());
    }

    let mut replacements = HashMap::new();
    for token in tokens {
        if let Some(user) = users.lookup(&token).await? {
            replacements.insert(token, format!("<@{}>", user.id));
        } else if let Some(group) = groups.lookup(&token).await? {
            replacements.insert(token, format!("<!subteam^{}>", group.id));
        }
    }
    debug!(resolved = replacements.len(), "resolved mentions");

    Ok(rewrite(content, &replacements))
}

/// Apply already-resolved replacements to `content`.
pub fn rewrite(content: &Value, replacements: &HashMap<String, String>) -> Value {
    match content {
        Value::Array(items) => Value::Array(items.iter().map(|v| rewrite(v, replacements)).collect()),
        Value::Object(map) => match markdown_text(content) {
            Some(text) => {
                let mut rewritten = map.clone();
                rewritten.insert(
                    "text".to_owned(),
                    Value::String(substitute(text, replacements)),
                );
                Value::Object(rewritten)
            }
            None => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), rewrite(v, replacements)))
                    .collect(),
            ),
        },
        other => other.clone(),
    }
}

fn markdown_text(value: &Value) -> Option<&str> {
    if value.get("type").and_then(Value::as_str) != Some("mrkdwn") {
        return None;
    }
    value.get("text").and_then(Value::as_str)
}

fn collect_tokens(content: &Value, tokens: &mut BTreeSet<String>) {
    match content {
        Value::Array(items) => items.iter().for_each(|v| collect_tokens(v, tokens)),
        Value::Object(map) => match markdown_text(content) {
            Some(text) => {
                if let Some(mention) = MENTION.as_ref() {
                    tokens.extend(mention.captures_iter(text).map(|c| c[1].to_owned()));
                }
            }
            None => map.values().for_each(|v| collect_tokens(v, tokens)),
        },
        _ => {}
    }
}

fn substitute(text: &str, replacements: &HashMap<String, String>) -> String {
    let Some(mention) = MENTION.as_ref() else {
        return text.to_owned();
    };
    mention
        .replace_all(text, |caps: &Captures<'_>| {
            replacements
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_owned())
        })
        .into_owned()
}

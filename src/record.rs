//! Persisted-state files: UTF-8 JSON records of sent messages and threads.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SlackLineError};
use crate::sent::Sent;

/// Read and parse a record file.
///
/// # Errors
///
/// Returns [`SlackLineError::Io`] if the file cannot be read,
/// [`SlackLineError::Json`] if it is not JSON, or
/// [`SlackLineError::InvalidArgument`] if it is not a valid record.
pub fn load(path: &Path) -> Result<Sent> {
    let text = std::fs::read_to_string(path).map_err(|source| SlackLineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text)?;
    let sent = Sent::from_json(&value)?;
    debug!(path = %path.display(), channel = %sent.channel(), "loaded record");
    Ok(sent)
}

/// Write `sent` to `path` as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`SlackLineError::Io`] if the file cannot be written.
pub fn save(path: &Path, sent: &Sent) -> Result<()> {
    let mut text = serde_json::to_string_pretty(sent)?;
    text.push('\n');
    std::fs::write(path, text).map_err(|source| SlackLineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "saved record");
    Ok(())
}

//! Session-journal classification (§4.3): distinct from raw process
//! liveness, used to tell graceful completion from a crash once the
//! subprocess's PIDs are gone. Mirrors the teacher's
//! `adapters/src/agent/watcher.rs` + `log_entry.rs` idiom — read the tail
//! of the file, split into lines, parse each bottom-up as JSON, and apply
//! end-marker predicates before falling back to freshness.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

const TAIL_BYTES: u64 = 10 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionClassification {
    Completed,
    WaitingForInput,
    Running,
    Stale,
}

/// Classify the journal at `path` as of `now`, given the configured
/// staleness threshold. A missing journal is `Stale` — there is nothing
/// to call fresh, and the caller (health.rs) only reaches this path when
/// PIDs are already dead.
pub fn classify_session(path: &Path, now: DateTime<Utc>, stale_threshold_secs: u64) -> SessionClassification {
    let fresh = is_fresh(path, now, stale_threshold_secs);
    let tail = read_tail(path, TAIL_BYTES);
    let lines: Vec<&str> = tail.lines().collect();

    if has_end_marker(&lines) {
        return SessionClassification::Completed;
    }
    if fresh && has_needs_input_marker(&lines) {
        return SessionClassification::WaitingForInput;
    }
    if fresh {
        SessionClassification::Running
    } else {
        SessionClassification::Stale
    }
}

pub(crate) fn mtime(path: &Path) -> Option<DateTime<Utc>> {
    let metadata = std::fs::metadata(path).ok()?;
    let modified = metadata.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

pub(crate) fn is_fresh(path: &Path, now: DateTime<Utc>, stale_threshold_secs: u64) -> bool {
    let Some(modified) = mtime(path) else {
        return false;
    };
    let age_secs = now.signed_duration_since(modified).num_seconds();
    age_secs >= 0 && (age_secs as u64) <= stale_threshold_secs
}

fn read_tail(path: &Path, max_bytes: u64) -> String {
    let Ok(mut file) = File::open(path) else {
        return String::new();
    };
    let len = file.seek(SeekFrom::End(0)).unwrap_or(0);
    let start = len.saturating_sub(max_bytes);
    if file.seek(SeekFrom::Start(start)).is_err() {
        return String::new();
    }
    // The chosen offset can land mid-codepoint when `max_bytes` splits a
    // multi-byte UTF-8 character. `read_to_string` would bail and discard
    // the whole tail on that; read raw bytes and lossily convert instead,
    // so only the (likely partial) first line is affected.
    let mut buf = Vec::new();
    let _ = file.read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Any line in the tail parses as a definitive end-marker: a stop-hook
/// record, a `type: "result"` record, a `subtype: "turn_duration"` record,
/// a `type: "summary"` record, or the last parseable line is an assistant
/// text response.
fn has_end_marker(lines: &[&str]) -> bool {
    let parsed: Vec<Value> = lines
        .iter()
        .rev()
        .filter_map(|line| serde_json::from_str::<Value>(line.trim()).ok())
        .collect();

    if parsed
        .iter()
        .any(|json| get_str(json, "type") == Some("result"))
    {
        return true;
    }
    if parsed
        .iter()
        .any(|json| get_str(json, "subtype") == Some("turn_duration"))
    {
        return true;
    }
    if parsed
        .iter()
        .any(|json| get_str(json, "type") == Some("summary"))
    {
        return true;
    }
    if parsed
        .iter()
        .any(|json| get_str(json, "hook_event_name") == Some("Stop"))
    {
        return true;
    }

    if let Some(last) = parsed.first() {
        if is_assistant_text_response(last) {
            return true;
        }
    }

    false
}

fn is_assistant_text_response(json: &Value) -> bool {
    if get_str(json, "type") != Some("assistant") {
        return false;
    }
    let Some(message) = json.get("message") else {
        return false;
    };
    let Some(content) = message.get("content") else {
        return false;
    };
    match content {
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => items
            .iter()
            .any(|item| get_str(item, "type") == Some("text")),
        _ => false,
    }
}

fn has_needs_input_marker(lines: &[&str]) -> bool {
    lines
        .iter()
        .rev()
        .filter_map(|line| serde_json::from_str::<Value>(line.trim()).ok())
        .any(|json| get_str(&json, "status") == Some("needs_input"))
}

fn get_str<'a>(json: &'a Value, key: &str) -> Option<&'a str> {
    json.get(key).and_then(Value::as_str)
}

#[cfg(test)]
#[path = "session_journal_tests.rs"]
mod tests;

//! Rendering of one audit entry into physical log lines.

use airgate_core::EventKind;
use chrono::{DateTime, Local};

/// Marker line opening a serialized payload block.
pub const PAYLOAD_BEGIN: &str = "----- payload -----";

/// Marker line closing a serialized payload block.
pub const PAYLOAD_END: &str = "----- end payload -----";

/// Timestamp layout of the line prefix.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render an entry as the physical lines it occupies in the log file.
///
/// The first line is always `[timestamp] EVENT | details`; a payload adds a
/// marker-delimited pretty-printed JSON block. Every returned line counts
/// toward the file's line cap individually.
pub fn render(
    now: DateTime<Local>,
    kind: EventKind,
    details: &str,
    payload: Option<&serde_json::Value>,
) -> Vec<String> {
    // Details must stay a single physical line or cap accounting drifts.
    let details = details.replace(['\n', '\r'], " ");
    let mut lines = vec![format!(
        "[{}] {} | {}",
        now.format(TIMESTAMP_FORMAT),
        kind,
        details
    )];

    if let Some(value) = payload {
        let rendered =
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        lines.push(PAYLOAD_BEGIN.to_owned());
        lines.extend(rendered.lines().map(str::to_owned));
        lines.push(PAYLOAD_END.to_owned());
    }

    lines
}

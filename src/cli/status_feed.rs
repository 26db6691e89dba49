//! JSON-lines status feed.
//!
//! Each non-blank line is one complete [`StatusSnapshot`], for example:
//!
//! ```text
//! {"fan_speeds":{"0":42},"temps":{"1":{"current":45.0,"warning":80.0,"critical":90.0}},"outdoor_temp":-3.5,"usetemp":"warning","last_update_time":1700000000}
//! ```
//!
//! Missing fields take their defaults. Lines that fail to parse are logged
//! and skipped.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::status::{StatusPublisher, StatusSnapshot};

/// Parse one feed line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> serde_json::Result<Option<StatusSnapshot>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Publish every snapshot read from `reader` until end of input.
///
/// Returns the number of snapshots published.
pub async fn run_status_feed<R>(reader: R, publisher: &StatusPublisher) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0u64;
    let mut published = 0u64;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        match parse_line(&line) {
            Ok(Some(snapshot)) => {
                tracing::trace!(line = line_no, "status snapshot published");
                publisher.publish(snapshot);
                published += 1;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "skipping malformed status line");
            }
        }
    }

    tracing::debug!(published, "status feed ended");
    Ok(published)
}

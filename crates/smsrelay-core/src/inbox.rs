use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::warn;

use crate::domain::{display_timestamp, AssembledMessage};
use crate::filename::parse_filename;
use crate::segment::read_segment;

// Scan grouping is deliberately finer-grained than the live reassembly key:
// it includes the received timestamp, so unrelated messages that happen to
// share a serial never merge here.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ScanKey {
    date: String,
    time: String,
    sender: String,
    serial: String,
}

/// Scan the spool directory and return the most recent `limit` assembled
/// messages, newest first.
///
/// This path is independent of the live buffer: it regroups everything on
/// disk from scratch, so it also answers correctly after a restart. A
/// missing directory yields an empty list; unreadable files are skipped.
pub async fn recent_messages(dir: &Path, limit: usize) -> Vec<AssembledMessage> {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return Vec::new();
    };

    let mut groups: HashMap<ScanKey, BTreeMap<u32, String>> = HashMap::new();

    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let Some(meta) = name.to_str().and_then(parse_filename) else {
            continue;
        };

        let text = match read_segment(&entry.path()).await {
            Ok(text) => text,
            Err(err) => {
                warn!(file = %name.to_string_lossy(), %err, "skipping unreadable segment");
                continue;
            }
        };

        let key = ScanKey {
            date: meta.date,
            time: meta.time,
            sender: meta.sender,
            serial: meta.serial,
        };
        groups.entry(key).or_default().insert(meta.seq, text);
    }

    let mut messages: Vec<AssembledMessage> = groups
        .into_iter()
        .map(|(key, parts)| AssembledMessage {
            timestamp: display_timestamp(&key.date, &key.time),
            sender: key.sender,
            text: parts.into_values().collect(),
        })
        .collect();

    // Newest first; a nonsense date in a filename sorts last.
    messages.sort_by_cached_key(|m| {
        std::cmp::Reverse(
            NaiveDateTime::parse_from_str(&m.timestamp, "%Y-%m-%d %H:%M:%S")
                .unwrap_or(NaiveDateTime::MIN),
        )
    });
    messages.truncate(limit);
    messages
}

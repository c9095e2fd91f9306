use std::sync::OnceLock;

use regex::Regex;

use crate::domain::SegmentMeta;

// Standard Gammu inbox naming: IN20251210_001000_00_123456789_00.txt
static FILENAME_RE: OnceLock<Regex> = OnceLock::new();

fn filename_re() -> &'static Regex {
    FILENAME_RE.get_or_init(|| {
        Regex::new(r"^IN(\d{8})_(\d{6})_(\d{2})_(.*)_(\d{2})\.txt$").expect("valid regex")
    })
}

/// Parse a spool filename into segment metadata.
///
/// The sender capture is greedy and may itself contain underscores; it is
/// bounded by the fixed-width fields on either side. Anything that does not
/// match returns `None`: the spool directory is noisy by nature and
/// unrecognized files are simply not ours.
pub fn parse_filename(filename: &str) -> Option<SegmentMeta> {
    let caps = filename_re().captures(filename)?;

    Some(SegmentMeta {
        date: caps[1].to_string(),
        time: caps[2].to_string(),
        serial: caps[3].to_string(),
        sender: caps[4].to_string(),
        // Two digits, always parses.
        seq: caps[5].parse().ok()?,
    })
}

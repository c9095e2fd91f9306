use serde::Serialize;

/// Metadata carried by a spool segment filename.
///
/// `date`/`time`/`serial` are kept as the literal digit strings from the
/// filename; the modem writes them, we never re-derive them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentMeta {
    pub date: String,
    pub time: String,
    pub serial: String,
    pub sender: String,
    pub seq: u32,
}

impl SegmentMeta {
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            sender: self.sender.clone(),
            serial: self.serial.clone(),
        }
    }
}

/// Live reassembly key.
///
/// The serial is a per-session token from the modem, not a message id, so
/// same-serial segments from one sender arriving close together are treated
/// as parts of the same message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub sender: String,
    pub serial: String,
}

/// One fully reassembled SMS, ready for delivery or display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssembledMessage {
    #[serde(rename = "ts")]
    pub timestamp: String,
    pub sender: String,
    pub text: String,
}

/// `YYYYMMDD` + `HHMMSS` -> `YYYY-MM-DD HH:MM:SS`.
///
/// Inputs come from the filename codec, which guarantees the digit widths.
pub fn display_timestamp(date: &str, time: &str) -> String {
    format!(
        "{}-{}-{} {}:{}:{}",
        &date[..4],
        &date[4..6],
        &date[6..],
        &time[..2],
        &time[2..4],
        &time[4..]
    )
}

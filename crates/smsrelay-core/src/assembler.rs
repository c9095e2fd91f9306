use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::{display_timestamp, AssembledMessage, GroupKey, SegmentMeta};

struct PendingGroup {
    // (sequence, text) in arrival order; sorted at flush time.
    parts: Vec<(u32, String)>,
    date: String,
    time: String,
    cancel: CancellationToken,
}

/// Coalesces spool segments into complete messages with bounded latency.
///
/// Multi-part SMS segments arrive out of order and with arbitrary
/// inter-arrival delay: the modem writes one file per segment as each comes
/// in over the air. Each `(sender, serial)` group flushes once, a quiet
/// period after its most recent segment. A segment arriving for a key that
/// already flushed opens a fresh group under the same key; a late straggler
/// becomes its own single-part message.
pub struct SmsAssembler {
    debounce: Duration,
    out: mpsc::UnboundedSender<AssembledMessage>,
    pending: Mutex<HashMap<GroupKey, PendingGroup>>,
}

impl SmsAssembler {
    pub fn new(debounce: Duration) -> (Arc<Self>, mpsc::UnboundedReceiver<AssembledMessage>) {
        let (out, rx) = mpsc::unbounded_channel();
        let assembler = Arc::new(Self {
            debounce,
            out,
            pending: Mutex::new(HashMap::new()),
        });
        (assembler, rx)
    }

    /// Append one segment to its group and re-arm the group's debounce timer.
    pub async fn add_segment(self: &Arc<Self>, meta: SegmentMeta, text: String) {
        let key = meta.group_key();

        let mut map = self.pending.lock().await;
        if !map.contains_key(&key) {
            let cancel = CancellationToken::new();
            map.insert(
                key.clone(),
                PendingGroup {
                    parts: vec![(meta.seq, text)],
                    date: meta.date,
                    time: meta.time,
                    cancel: cancel.clone(),
                },
            );
            drop(map);
            self.arm_timer(key, cancel);
            return;
        }

        // Existing group: append and reset the quiet period. Replace-and-cancel
        // the token so two timers never race to flush the same key.
        let group = map.get_mut(&key).expect("group exists");
        group.parts.push((meta.seq, text));
        group.cancel.cancel();
        let cancel = CancellationToken::new();
        group.cancel = cancel.clone();
        drop(map);
        self.arm_timer(key, cancel);
    }

    /// Cancel every pending timer and drop the groups without flushing.
    ///
    /// Shutdown path: still-open groups are discarded silently.
    pub async fn discard_pending(&self) {
        let mut map = self.pending.lock().await;
        for group in map.values() {
            group.cancel.cancel();
        }
        map.clear();
    }

    fn arm_timer(self: &Arc<Self>, key: GroupKey, cancel: CancellationToken) {
        let assembler = Arc::clone(self);
        let debounce = self.debounce;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(debounce) => {
                    assembler.flush(&key).await;
                }
            }
        });
    }

    /// Remove the group and emit it as one assembled message.
    ///
    /// Invoked only by timers. If the key is gone (a racing timer got there
    /// first, or shutdown discarded it), this is a no-op.
    async fn flush(self: &Arc<Self>, key: &GroupKey) {
        let group = {
            let mut map = self.pending.lock().await;
            map.remove(key)
        };

        let Some(mut group) = group else {
            return;
        };

        // Final ordering is by sequence, never by arrival: filesystem events
        // across segment files are unordered.
        group.parts.sort_by_key(|&(seq, _)| seq);
        let text: String = group.parts.into_iter().map(|(_, t)| t).collect();

        info!(sender = %key.sender, "sms assembled");

        // Receiver may already be gone during shutdown; nothing to unwind.
        let _ = self.out.send(AssembledMessage {
            timestamp: display_timestamp(&group.date, &group.time),
            sender: key.sender.clone(),
            text,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::time::sleep;

    const DEBOUNCE: Duration = Duration::from_secs(5);

    fn meta(sender: &str, serial: &str, seq: u32) -> SegmentMeta {
        SegmentMeta {
            date: "20251210".to_string(),
            time: "001000".to_string(),
            serial: serial.to_string(),
            sender: sender.to_string(),
            seq,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn assembles_by_sequence_not_arrival() {
        let (asm, mut rx) = SmsAssembler::new(DEBOUNCE);

        asm.add_segment(meta("X", "00", 1), "Hello ".to_string()).await;
        asm.add_segment(meta("X", "00", 0), "World: ".to_string()).await;

        sleep(Duration::from_millis(5500)).await;
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.sender, "X");
        assert_eq!(msg.text, "World: Hello ");
        assert_eq!(msg.timestamp, "2025-12-10 00:10:00");
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_resets_on_each_segment() {
        let (asm, mut rx) = SmsAssembler::new(DEBOUNCE);

        asm.add_segment(meta("X", "00", 0), "a".to_string()).await;
        sleep(Duration::from_secs(3)).await;
        asm.add_segment(meta("X", "00", 1), "b".to_string()).await;

        // 5.5s after the first segment, 2.5s after the last: still open.
        sleep(Duration::from_millis(2500)).await;
        assert!(rx.try_recv().is_err());

        // Past the quiet period of the *last* segment: exactly one flush.
        sleep(Duration::from_secs(3)).await;
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.text, "ab");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn late_segment_opens_a_fresh_group() {
        let (asm, mut rx) = SmsAssembler::new(DEBOUNCE);

        asm.add_segment(meta("X", "00", 0), "first".to_string()).await;
        sleep(Duration::from_millis(5500)).await;
        assert_eq!(rx.recv().await.unwrap().text, "first");

        // Same (sender, serial) after the flush: no retroactive merge.
        asm.add_segment(meta("X", "00", 1), "straggler".to_string()).await;
        sleep(Duration::from_millis(5500)).await;
        assert_eq!(rx.recv().await.unwrap().text, "straggler");
    }

    #[tokio::test(start_paused = true)]
    async fn groups_with_different_keys_flush_independently() {
        let (asm, mut rx) = SmsAssembler::new(DEBOUNCE);

        asm.add_segment(meta("X", "00", 0), "from X".to_string()).await;
        asm.add_segment(meta("Y", "00", 0), "from Y".to_string()).await;
        asm.add_segment(meta("X", "01", 0), "X again".to_string()).await;

        sleep(Duration::from_millis(5500)).await;
        let mut texts = vec![
            rx.recv().await.unwrap().text,
            rx.recv().await.unwrap().text,
            rx.recv().await.unwrap().text,
        ];
        texts.sort();
        assert_eq!(texts, vec!["X again", "from X", "from Y"]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn same_serial_within_window_merges_on_live_path() {
        // The live key is (sender, serial) without a timestamp, so two
        // "messages" sharing a serial inside one quiet period coalesce.
        // The on-demand inbox scan keys on (date, time, sender, serial)
        // and keeps them separate; both behaviors are intentional.
        let (asm, mut rx) = SmsAssembler::new(DEBOUNCE);

        asm.add_segment(meta("X", "00", 0), "one".to_string()).await;
        let mut second = meta("X", "00", 1);
        second.time = "001003".to_string();
        asm.add_segment(second, "two".to_string()).await;

        sleep(Duration::from_millis(5500)).await;
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.text, "onetwo");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn discard_pending_silences_timers() {
        let (asm, mut rx) = SmsAssembler::new(DEBOUNCE);

        asm.add_segment(meta("X", "00", 0), "doomed".to_string()).await;
        asm.discard_pending().await;

        sleep(Duration::from_secs(20)).await;
        assert!(rx.try_recv().is_err());
    }
}

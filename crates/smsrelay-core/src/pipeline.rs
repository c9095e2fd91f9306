use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::assembler::SmsAssembler;
use crate::config::Config;
use crate::domain::AssembledMessage;
use crate::filename::parse_filename;
use crate::ports::{FileCreatedFn, MessageSink, SpoolWatcher};
use crate::segment::read_segment;

/// Live ingestion pipeline: filesystem events in, assembled messages out.
///
/// The watcher fires its callback on a thread we do not control. That
/// callback only performs a thread-safe channel send; parsing, reading and
/// every touch of the reassembly state happen in one worker task on the
/// runtime.
pub struct InboxMonitor {
    watcher: Option<Box<dyn SpoolWatcher>>,
    assembler: Option<Arc<SmsAssembler>>,
    worker: Option<JoinHandle<()>>,
}

impl InboxMonitor {
    /// Start watching the spool directory.
    ///
    /// Nothing here may take down a host process: if the directory cannot
    /// be created or the watcher cannot start, the error is logged and the
    /// returned monitor is inert, with its message channel already closed.
    pub fn start(
        cfg: &Config,
        mut watcher: Box<dyn SpoolWatcher>,
    ) -> (Self, mpsc::UnboundedReceiver<AssembledMessage>) {
        if let Err(err) = std::fs::create_dir_all(&cfg.spool_dir) {
            error!(
                dir = %cfg.spool_dir.display(),
                %err,
                "cannot create spool directory; sms ingestion disabled"
            );
            return Self::inert();
        }

        let (path_tx, mut path_rx) = mpsc::unbounded_channel::<PathBuf>();

        // The only thing that ever runs on the watcher's thread.
        let on_created: FileCreatedFn = Box::new(move |path| {
            let _ = path_tx.send(path);
        });

        if let Err(err) = watcher.start(&cfg.spool_dir, on_created) {
            error!(%err, "cannot start spool watcher; sms ingestion disabled");
            return Self::inert();
        }

        let (assembler, messages) = SmsAssembler::new(cfg.assemble_timeout);

        let worker_assembler = Arc::clone(&assembler);
        let worker = tokio::spawn(async move {
            while let Some(path) = path_rx.recv().await {
                ingest(&worker_assembler, path).await;
            }
        });

        info!(dir = %cfg.spool_dir.display(), "watching spool directory");

        (
            Self {
                watcher: Some(watcher),
                assembler: Some(assembler),
                worker: Some(worker),
            },
            messages,
        )
    }

    fn inert() -> (Self, mpsc::UnboundedReceiver<AssembledMessage>) {
        let (_tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                watcher: None,
                assembler: None,
                worker: None,
            },
            rx,
        )
    }

    /// Stop the watcher first so no new events enter, then tear down the
    /// worker and discard whatever was still pending. Open groups are
    /// dropped, not flushed.
    pub async fn stop(mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
        if let Some(worker) = self.worker.take() {
            worker.abort();
            let _ = worker.await;
        }
        if let Some(assembler) = self.assembler.take() {
            assembler.discard_pending().await;
        }
        info!("spool monitor stopped");
    }
}

async fn ingest(assembler: &Arc<SmsAssembler>, path: PathBuf) {
    let Some(meta) = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(parse_filename)
    else {
        // Not one of ours; the daemon writes other files too.
        return;
    };

    match read_segment(&path).await {
        Ok(text) => assembler.add_segment(meta, text).await,
        Err(err) => {
            // Dropped, not retried: a segment that vanished or cannot be
            // read is accepted data loss.
            warn!(file = %path.display(), %err, "failed to read segment");
        }
    }
}

/// Deliver assembled messages to the sink until the channel closes.
///
/// Delivery is fire-and-forget: a failed attempt is the sink's own concern
/// and never stops the loop.
pub async fn forward(
    mut messages: mpsc::UnboundedReceiver<AssembledMessage>,
    sink: Arc<dyn MessageSink>,
) {
    while let Some(msg) = messages.recv().await {
        info!(sender = %msg.sender, "received sms");
        if let Err(err) = sink.deliver(&msg.sender, &msg.text).await {
            error!(sender = %msg.sender, %err, "sms delivery failed");
        }
    }
}

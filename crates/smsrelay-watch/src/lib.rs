//! `notify`-backed implementation of the spool watcher port.

use std::path::Path;

use notify::{Config as NotifyConfig, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::warn;

use smsrelay_core::ports::{FileCreatedFn, SpoolWatcher};
use smsrelay_core::{Error, Result};

/// Watches a spool directory for created files via OS notification.
///
/// notify delivers events on its own thread; the registered callback is the
/// only thing invoked there.
#[derive(Default)]
pub struct NotifyWatcher {
    watcher: Option<RecommendedWatcher>,
}

impl NotifyWatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpoolWatcher for NotifyWatcher {
    fn start(&mut self, dir: &Path, on_created: FileCreatedFn) -> Result<()> {
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Create(_)) {
                        return;
                    }
                    for path in event.paths {
                        // The daemon may also create subdirectories; only
                        // files are segments.
                        if path.is_file() {
                            on_created(path);
                        }
                    }
                }
                Err(err) => warn!(%err, "spool watch error"),
            },
            NotifyConfig::default(),
        )
        .map_err(|e| Error::Watch(e.to_string()))?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| Error::Watch(e.to_string()))?;

        self.watcher = Some(watcher);
        Ok(())
    }

    fn stop(&mut self) {
        // Dropping the watcher unwatches the directory and releases the
        // callback together with whatever it captured.
        self.watcher = None;
    }
}

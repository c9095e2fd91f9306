use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::Result;

/// Callback invoked once per created file, on the watcher's own thread.
///
/// Implementations of [`SpoolWatcher`] make no ordering guarantee across
/// files and must assume the callback does nothing beyond a cheap,
/// thread-safe handoff.
pub type FileCreatedFn = Box<dyn Fn(PathBuf) + Send + Sync + 'static>;

/// Port for OS filesystem notification.
///
/// notify is the first implementation; the shape is designed so a polling
/// fallback (or a test double driving the callback by hand) fits behind the
/// same interface.
pub trait SpoolWatcher: Send {
    /// Start watching `dir` (non-recursive) and invoke `on_created` for
    /// every file created inside it.
    fn start(&mut self, dir: &Path, on_created: FileCreatedFn) -> Result<()>;

    /// Stop the watcher and release its OS resources. After this returns,
    /// `on_created` is never invoked again.
    fn stop(&mut self);
}

/// Port for downstream delivery of an assembled message.
///
/// Fire-and-forget: the core does not retry and does not let a failed
/// delivery unwind any reassembly state.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn deliver(&self, sender: &str, text: &str) -> Result<()>;
}

use std::sync::Arc;

use tracing::info;

use smsrelay_bark::BarkSink;
use smsrelay_core::{
    config::Config,
    inbox,
    pipeline::{forward, InboxMonitor},
};
use smsrelay_watch::NotifyWatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    smsrelay_core::logging::init("smsrelay");

    let cfg = Arc::new(Config::load()?);

    // `smsrelay recent [n]` prints the inbox scan as JSON and exits.
    let mut args = std::env::args().skip(1);
    if let Some(cmd) = args.next() {
        if cmd != "recent" {
            anyhow::bail!("unknown command: {cmd} (expected `recent [n]`)");
        }
        let limit = args
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(cfg.scan_limit);
        let messages = inbox::recent_messages(&cfg.spool_dir, limit).await;
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    let sink = Arc::new(BarkSink::new(&cfg));
    let watcher = Box::new(NotifyWatcher::new());
    let (monitor, messages) = InboxMonitor::start(&cfg, watcher);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("shutdown requested"),
        _ = forward(messages, sink) => {}
    }

    monitor.stop().await;
    Ok(())
}

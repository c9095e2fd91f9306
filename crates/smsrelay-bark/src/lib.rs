//! Bark push-notification sink.

use async_trait::async_trait;
use reqwest::Url;
use tracing::{info, warn};

use smsrelay_core::config::Config;
use smsrelay_core::ports::MessageSink;
use smsrelay_core::{Error, Result};

/// Delivers assembled messages as Bark push notifications.
///
/// Endpoint shape: `GET {base}/{title}/{body}?group=...&level=...` with the
/// title and body carried as percent-encoded path segments.
pub struct BarkSink {
    client: reqwest::Client,
    base_url: Option<String>,
    group: String,
    level: String,
}

impl BarkSink {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: cfg.bark_url.clone(),
            group: cfg.bark_group.clone(),
            level: cfg.bark_level.clone(),
        }
    }
}

fn build_url(base: &str, title: &str, body: &str, group: &str, level: &str) -> Result<Url> {
    // Trailing slash would otherwise leave an empty path segment behind.
    let mut url = Url::parse(base.trim_end_matches('/'))
        .map_err(|e| Error::Sink(format!("invalid bark url: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| Error::Sink("bark url cannot be a base".to_string()))?
        .push(title)
        .push(body);
    url.query_pairs_mut()
        .append_pair("group", group)
        .append_pair("level", level);
    Ok(url)
}

#[async_trait]
impl MessageSink for BarkSink {
    async fn deliver(&self, sender: &str, text: &str) -> Result<()> {
        let Some(base) = &self.base_url else {
            warn!("BARK_URL is not set; notification skipped");
            return Ok(());
        };

        let title = format!("SMS: {sender}");
        let url = build_url(base, &title, text, &self.group, &self.level)?;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Sink(e.to_string()))?;
        resp.error_for_status()
            .map_err(|e| Error::Sink(e.to_string()))?;

        info!(%sender, "bark notification sent");
        Ok(())
    }
}

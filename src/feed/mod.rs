pub mod http;
pub mod normalize;
pub mod provider;

pub use http::HttpFeed;
pub use provider::FeedProvider;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::store::models::{Badge, PollRecord};
use crate::store::Database;
use crate::view::classify::LiveWindow;

/// Commands the dashboard can send to the running poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerCommand {
    /// Poll immediately, out of band ("refresh now").
    Refresh,
}

/// Result of one successful poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub live_count: usize,
    pub total: usize,
}

/// Per-trigger poll work, separated from the timer loop so it can be driven
/// directly in tests with a fixed `now` and a stub provider.
pub struct FeedPoller {
    provider: Arc<dyn FeedProvider>,
    db: Database,
    window: LiveWindow,
    badge_tx: watch::Sender<Badge>,
    updated_tx: watch::Sender<Option<DateTime<Utc>>>,
}

impl FeedPoller {
    pub fn new(
        provider: Arc<dyn FeedProvider>,
        db: Database,
        window: LiveWindow,
        badge_tx: watch::Sender<Badge>,
        updated_tx: watch::Sender<Option<DateTime<Utc>>>,
    ) -> Self {
        FeedPoller {
            provider,
            db,
            window,
            badge_tx,
            updated_tx,
        }
    }

    /// Fetch, validate, and store one snapshot; recompute the badge and
    /// publish the "snapshot changed" notification.
    ///
    /// Any error leaves the previously stored snapshot untouched: the payload
    /// is parsed before the slot is written, so a malformed document never
    /// replaces a good one.
    pub async fn poll_once(&self, now: DateTime<Utc>) -> Result<PollOutcome> {
        let raw = self.provider.fetch_feed().await?;
        let snapshot =
            normalize::parse_feed(&raw, now).context("Feed payload has unexpected shape")?;

        let payload = serde_json::to_string(&raw).context("Failed to re-serialize feed payload")?;
        self.db.store_snapshot(&payload, now)?;

        let live_count = crate::view::live_count(&snapshot, now, &self.window);
        self.badge_tx
            .send_replace(Badge::from_live_count(live_count));
        // Fire-and-forget: nobody listening is fine
        self.updated_tx.send_replace(Some(now));

        Ok(PollOutcome {
            live_count,
            total: snapshot.live.len() + snapshot.upcoming.len(),
        })
    }

    /// One trigger: poll, log the outcome, swallow failures.
    async fn run_tick(&self) {
        let now = Utc::now();
        match self.poll_once(now).await {
            Ok(out) => {
                info!(
                    "Poll ok: {} matches ({} live)",
                    out.total, out.live_count
                );
                if let Err(e) = self.db.log_poll(&PollRecord {
                    id: None,
                    polled_at: now,
                    ok: true,
                    live_count: Some(out.live_count as i64),
                    error: None,
                }) {
                    warn!("Failed to record poll outcome: {}", e);
                }
            }
            Err(e) => {
                // Background failures are not user-visible; the previous
                // snapshot remains authoritative.
                warn!("Poll failed, keeping previous snapshot: {:#}", e);
                if let Err(log_err) = self.db.log_poll(&PollRecord {
                    id: None,
                    polled_at: now,
                    ok: false,
                    live_count: None,
                    error: Some(format!("{:#}", e)),
                }) {
                    warn!("Failed to record poll outcome: {}", log_err);
                }
            }
        }
    }
}

/// Spawn the poll loop: an immediate startup poll, then one poll per interval
/// tick, plus out-of-band polls for each refresh command. Returns the command
/// sender handed to the dashboard.
pub fn start_feed_poller(
    poller: FeedPoller,
    poll_interval: Duration,
) -> mpsc::Sender<PollerCommand> {
    let (cmd_tx, mut cmd_rx) = mpsc::channel(8);

    tokio::spawn(async move {
        info!(
            "Feed poller started (provider={}, interval={:?})",
            poller.provider.name(),
            poll_interval
        );

        // First tick fires immediately, covering the startup fetch
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    poller.run_tick().await;
                }
                Some(PollerCommand::Refresh) = cmd_rx.recv() => {
                    info!("Out-of-band refresh requested");
                    poller.run_tick().await;
                }
            }
        }
    });

    cmd_tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;

    struct StubFeed {
        body: serde_json::Value,
        fail: bool,
    }

    #[async_trait]
    impl FeedProvider for StubFeed {
        fn name(&self) -> &str {
            "stub"
        }

        async fn fetch_feed(&self) -> Result<serde_json::Value> {
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(self.body.clone())
        }
    }

    fn poller_with(body: serde_json::Value, fail: bool) -> (FeedPoller, watch::Receiver<Badge>) {
        let db = Database::open(":memory:").unwrap();
        let (badge_tx, badge_rx) = watch::channel(Badge::default());
        let (updated_tx, _updated_rx) = watch::channel(None);
        let poller = FeedPoller::new(
            Arc::new(StubFeed { body, fail }),
            db,
            LiveWindow::default(),
            badge_tx,
            updated_tx,
        );
        (poller, badge_rx)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_poll_once_stores_snapshot_and_badge() {
        let body = json!({
            "live_matches": [
                {"match_id": "m1", "home_team_name": "NAVI", "away_team_name": "FaZe"},
                {"match_id": "m2", "home_team_name": "G2", "away_team_name": "Vitality"}
            ],
            "upcoming_matches": []
        });
        let (poller, badge_rx) = poller_with(body, false);

        let out = poller.poll_once(now()).await.unwrap();
        assert_eq!(out.live_count, 2);
        assert_eq!(out.total, 2);
        assert_eq!(badge_rx.borrow().text, "2");

        let (payload, at) = poller.db.load_snapshot().unwrap().unwrap();
        assert_eq!(at, now());
        assert!(payload.contains("NAVI"));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_snapshot() {
        let (poller, _badge) = poller_with(json!({"live_matches": []}), false);
        poller.poll_once(now()).await.unwrap();

        let failing = FeedPoller {
            provider: Arc::new(StubFeed {
                body: json!(null),
                fail: true,
            }),
            db: poller.db.clone(),
            window: LiveWindow::default(),
            badge_tx: watch::channel(Badge::default()).0,
            updated_tx: watch::channel(None).0,
        };
        let later = now() + chrono::Duration::minutes(2);
        assert!(failing.poll_once(later).await.is_err());

        // Still the first payload, still the first fetch time
        let (_, at) = poller.db.load_snapshot().unwrap().unwrap();
        assert_eq!(at, now());
    }

    #[tokio::test]
    async fn test_malformed_payload_keeps_previous_snapshot() {
        let (poller, _badge) = poller_with(json!({"live_matches": []}), false);
        poller.poll_once(now()).await.unwrap();

        let malformed = FeedPoller {
            provider: Arc::new(StubFeed {
                body: json!({"something_else": true}),
                fail: false,
            }),
            db: poller.db.clone(),
            window: LiveWindow::default(),
            badge_tx: watch::channel(Badge::default()).0,
            updated_tx: watch::channel(None).0,
        };
        let later = now() + chrono::Duration::minutes(2);
        assert!(malformed.poll_once(later).await.is_err());

        let (_, at) = poller.db.load_snapshot().unwrap().unwrap();
        assert_eq!(at, now());
    }

    #[tokio::test]
    async fn test_badge_clears_when_no_live_matches() {
        let (poller, badge_rx) = poller_with(
            json!({"live_matches": [{"home_team_name": "NAVI"}], "upcoming_matches": []}),
            false,
        );
        poller.poll_once(now()).await.unwrap();
        assert_eq!(badge_rx.borrow().text, "1");

        // Next poll has nothing live; badge text must clear
        let empty = FeedPoller {
            provider: Arc::new(StubFeed {
                body: json!({"live_matches": [], "upcoming_matches": []}),
                fail: false,
            }),
            db: poller.db.clone(),
            window: LiveWindow::default(),
            badge_tx: poller.badge_tx.clone(),
            updated_tx: watch::channel(None).0,
        };
        empty
            .poll_once(now() + chrono::Duration::minutes(2))
            .await
            .unwrap();
        assert_eq!(badge_rx.borrow().text, "");
    }
}

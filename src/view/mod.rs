//! The presenter core: pure functions from (snapshot, now) to an ordered,
//! annotated match list. Nothing here touches the network, the database, or
//! the clock; the dashboard feeds in a stored snapshot and `Utc::now()`.

pub mod classify;
pub mod merge;
pub mod order;
pub mod popular;

pub use classify::LiveWindow;
pub use popular::PopularityRule;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::store::models::{FeedSnapshot, MatchRecord};

/// View-layer knobs, assembled from configuration once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub window: LiveWindow,
    pub display_cap: usize,
    pub popularity: PopularityRule,
}

impl Default for ViewOptions {
    fn default() -> Self {
        ViewOptions {
            window: LiveWindow::default(),
            display_cap: 20,
            popularity: PopularityRule::default(),
        }
    }
}

/// One row of the rendered list: the record plus its display annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayMatch {
    #[serde(flatten)]
    pub record: MatchRecord,
    /// Formatted event line (league + normalized season)
    pub event_label: String,
    pub live: bool,
    pub popular: bool,
    /// Per-group cluster id; rows spanned by a popular cluster share one
    pub cluster: Option<usize>,
}

impl DisplayMatch {
    pub fn new(record: MatchRecord, live: bool) -> Self {
        let event_label = record.event_label();
        DisplayMatch {
            record,
            event_label,
            live,
            popular: false,
            cluster: None,
        }
    }
}

/// Matches sharing a UTC calendar date, with one header per group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub matches: Vec<DisplayMatch>,
}

/// What the presenter renders. An absent or unusable snapshot is a
/// user-visible connection-error state; a valid-but-empty one is "no
/// matches", never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MatchListView {
    ConnectionError,
    NoMatches,
    Matches {
        lang: Option<String>,
        fetched_at: DateTime<Utc>,
        live_count: usize,
        groups: Vec<DayGroup>,
    },
}

/// Full presenter pipeline: merge, classify, order, truncate, group, annotate.
pub fn build_view(
    snapshot: Option<&FeedSnapshot>,
    now: DateTime<Utc>,
    opts: &ViewOptions,
) -> MatchListView {
    let snapshot = match snapshot {
        Some(s) => s,
        None => return MatchListView::ConnectionError,
    };

    if snapshot.is_empty() {
        return MatchListView::NoMatches;
    }

    let merged = merge::merge_partitions(snapshot, now, &opts.window);
    let live_count = merged.iter().filter(|m| m.live).count();
    let ordered = order::order_matches(merged);
    let capped = order::truncate(ordered, opts.display_cap);
    let mut groups = order::group_by_date(capped);
    popular::annotate_groups(&mut groups, &opts.popularity);

    MatchListView::Matches {
        lang: snapshot.lang.clone(),
        fetched_at: snapshot.fetched_at,
        live_count,
        groups,
    }
}

/// Count of matches the merged view classifies as live; drives the badge.
pub fn live_count(snapshot: &FeedSnapshot, now: DateTime<Utc>, window: &LiveWindow) -> usize {
    merge::merge_partitions(snapshot, now, window)
        .iter()
        .filter(|m| m.live)
        .count()
}

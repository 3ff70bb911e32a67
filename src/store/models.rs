use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder shown when a feed record has no usable team name.
pub const PLACEHOLDER_TEAM: &str = "TBD";

/// Fixed badge background color.
pub const BADGE_COLOR: &str = "#2b6ea4";

/// Which feed partition a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Live,
    Upcoming,
}

/// Match status as reported by the feed, normalized from both the legacy
/// flat-string shape and the structured `{type, description}` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    NotStarted,
    InProgress,
    Finished,
    Unknown,
}

/// One scheduled or running match, normalized from the feed.
///
/// Every field except the team names and start instant is optional on the
/// wire; missing fields degrade to placeholders rather than dropping the
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Feed-assigned match ID, when present (string or numeric on the wire)
    pub match_id: Option<String>,
    pub home_team: String,
    pub away_team: String,
    /// Logo image hashes; presentation resolves these against the image base URL
    pub home_logo: Option<String>,
    pub away_logo: Option<String>,
    pub league: Option<String>,
    pub season: Option<String>,
    pub tournament: Option<String>,
    /// Resolved start instant; epoch zero when the feed gave nothing parseable
    pub start_time: DateTime<Utc>,
    pub status: Option<MatchStatus>,
    /// Free-text status description from the structured status shape
    pub status_detail: Option<String>,
    pub home_popularity: Option<i64>,
    pub away_popularity: Option<i64>,
    /// Partition of origin; flat-array feeds map to `Upcoming`
    pub partition: Partition,
}

impl MatchRecord {
    /// Event line shown above the team rows: league plus a normalized season
    /// name ("Advance ... season 52" renders as "Advanced ... Season 52"),
    /// falling back to the league alone, then a placeholder.
    pub fn event_label(&self) -> String {
        match (&self.league, &self.season) {
            (Some(league), Some(season)) => {
                format!("{} {}", league, normalize_season(season))
            }
            (Some(league), None) => league.clone(),
            _ => "Unknown League".to_string(),
        }
    }
}

fn normalize_season(season: &str) -> String {
    season
        .split_whitespace()
        .map(|word| match word.to_lowercase().as_str() {
            "advance" | "advanced" => "Advanced",
            "season" => "Season",
            _ => word,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The last successfully fetched feed payload, in normalized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub live: Vec<MatchRecord>,
    pub upcoming: Vec<MatchRecord>,
    /// Feed-reported display locale, passed through for time formatting
    pub lang: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl FeedSnapshot {
    /// True when both partitions are present but empty ("no matches", not an
    /// error state).
    pub fn is_empty(&self) -> bool {
        self.live.is_empty() && self.upcoming.is_empty()
    }
}

/// Badge indicator derived from each successful poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    /// Decimal live-match count, or empty when zero
    pub text: String,
    pub color: String,
}

impl Badge {
    pub fn from_live_count(count: usize) -> Self {
        Badge {
            text: if count > 0 {
                count.to_string()
            } else {
                String::new()
            },
            color: BADGE_COLOR.to_string(),
        }
    }
}

impl Default for Badge {
    fn default() -> Self {
        Badge::from_live_count(0)
    }
}

/// One entry in the poll log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollRecord {
    pub id: Option<i64>,
    pub polled_at: DateTime<Utc>,
    pub ok: bool,
    /// Live-match count derived from the snapshot; absent on failed polls
    pub live_count: Option<i64>,
    pub error: Option<String>,
}

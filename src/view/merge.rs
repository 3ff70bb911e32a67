use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::store::models::{FeedSnapshot, MatchRecord};

use super::classify::{is_live, LiveWindow};
use super::DisplayMatch;

/// De-duplication key: the feed's match ID when present, else a composite of
/// team names and start instant. Components already carry safe placeholders
/// from normalization.
pub fn identity_key(m: &MatchRecord) -> String {
    match &m.match_id {
        Some(id) => id.clone(),
        None => format!(
            "{}-{}-{}",
            m.home_team,
            m.away_team,
            m.start_time.timestamp()
        ),
    }
}

/// Merge the two partitions into one de-duplicated display sequence.
///
/// Live-partition records come first and are force-classified live. Upcoming
/// records are kept only when their key is unseen, and re-evaluated by the
/// classifier: a scheduled match whose start already elapsed renders as live.
pub fn merge_partitions(
    snapshot: &FeedSnapshot,
    now: DateTime<Utc>,
    window: &LiveWindow,
) -> Vec<DisplayMatch> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::with_capacity(snapshot.live.len() + snapshot.upcoming.len());

    for m in &snapshot.live {
        seen.insert(identity_key(m));
        merged.push(DisplayMatch::new(m.clone(), true));
    }

    for m in &snapshot.upcoming {
        if seen.insert(identity_key(m)) {
            let live = is_live(m, now, window);
            merged.push(DisplayMatch::new(m.clone(), live));
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::Partition;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn record(id: Option<&str>, partition: Partition, start: DateTime<Utc>) -> MatchRecord {
        MatchRecord {
            match_id: id.map(str::to_string),
            home_team: "NAVI".into(),
            away_team: "FaZe".into(),
            home_logo: None,
            away_logo: None,
            league: None,
            season: None,
            tournament: None,
            start_time: start,
            status: None,
            status_detail: None,
            home_popularity: None,
            away_popularity: None,
            partition,
        }
    }

    fn snapshot(live: Vec<MatchRecord>, upcoming: Vec<MatchRecord>) -> FeedSnapshot {
        FeedSnapshot {
            live,
            upcoming,
            lang: None,
            fetched_at: now(),
        }
    }

    #[test]
    fn test_duplicate_key_appears_once_classified_live() {
        let start = now() + Duration::hours(2);
        let snap = snapshot(
            vec![record(Some("m1"), Partition::Live, start)],
            vec![record(Some("m1"), Partition::Upcoming, start)],
        );
        let merged = merge_partitions(&snap, now(), &LiveWindow::default());
        assert_eq!(merged.len(), 1);
        assert!(merged[0].live);
    }

    #[test]
    fn test_synthetic_key_dedupes_without_ids() {
        let start = now() + Duration::hours(2);
        let snap = snapshot(
            vec![record(None, Partition::Live, start)],
            vec![record(None, Partition::Upcoming, start)],
        );
        let merged = merge_partitions(&snap, now(), &LiveWindow::default());
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_upcoming_with_elapsed_start_renders_live() {
        let snap = snapshot(
            vec![],
            vec![
                record(Some("a"), Partition::Upcoming, now() - Duration::minutes(20)),
                record(Some("b"), Partition::Upcoming, now() + Duration::hours(1)),
            ],
        );
        let merged = merge_partitions(&snap, now(), &LiveWindow::default());
        assert_eq!(merged.len(), 2);
        assert!(merged[0].live);
        assert!(!merged[1].live);
    }

    #[test]
    fn test_live_partition_precedes_upcoming() {
        let snap = snapshot(
            vec![record(Some("live1"), Partition::Live, now() + Duration::hours(5))],
            vec![record(Some("up1"), Partition::Upcoming, now() + Duration::hours(1))],
        );
        let merged = merge_partitions(&snap, now(), &LiveWindow::default());
        assert_eq!(merged[0].record.match_id.as_deref(), Some("live1"));
        assert_eq!(merged[1].record.match_id.as_deref(), Some("up1"));
    }
}

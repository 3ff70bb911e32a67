use chrono::{DateTime, Duration, Utc};

use crate::store::models::{MatchRecord, MatchStatus, Partition};

/// Elapsed-time window for the liveness heuristic. A match with no explicit
/// status counts as live while its start instant is more than `floor` and
/// less than `ceiling` in the past, both bounds strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveWindow {
    pub floor: Duration,
    pub ceiling: Duration,
}

impl Default for LiveWindow {
    fn default() -> Self {
        LiveWindow {
            floor: Duration::minutes(5),
            ceiling: Duration::hours(3),
        }
    }
}

impl LiveWindow {
    pub fn from_minutes(floor_mins: i64, ceiling_mins: i64) -> Self {
        LiveWindow {
            floor: Duration::minutes(floor_mins),
            ceiling: Duration::minutes(ceiling_mins),
        }
    }
}

/// Decide whether a match renders as live. First matching rule wins:
///
/// 1. sourced from the feed's live partition;
/// 2. explicit in-progress or finished status (finished stays displayable as
///    live for a while rather than vanishing the moment the feed flips it);
/// 3. start instant between `floor` and `ceiling` in the past.
///
/// Records that defaulted to an epoch-zero start can never satisfy rule 3.
pub fn is_live(m: &MatchRecord, now: DateTime<Utc>, window: &LiveWindow) -> bool {
    if m.partition == Partition::Live {
        return true;
    }

    if matches!(
        m.status,
        Some(MatchStatus::InProgress) | Some(MatchStatus::Finished)
    ) {
        return true;
    }

    let elapsed = now - m.start_time;
    elapsed > window.floor && elapsed < window.ceiling
}

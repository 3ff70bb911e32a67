use serde::{Deserialize, Serialize};

use crate::store::models::MatchRecord;

use super::DayGroup;

/// Knobs for the popularity clustering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularityRule {
    /// A team counter must strictly exceed this to flag the match popular
    pub threshold: i64,
    /// Maximum positional gap between consecutive cluster members
    /// (1 = strictly adjacent; 2 allows one non-popular row between)
    pub lookahead: usize,
    /// Maximum number of popular members per cluster
    pub max_run: usize,
}

impl Default for PopularityRule {
    fn default() -> Self {
        PopularityRule {
            threshold: 1000,
            lookahead: 2,
            max_run: 5,
        }
    }
}

/// A match is popular when either team's popularity counter strictly exceeds
/// the threshold. Missing counters never qualify.
pub fn is_popular(m: &MatchRecord, threshold: i64) -> bool {
    m.home_popularity.unwrap_or(0) > threshold || m.away_popularity.unwrap_or(0) > threshold
}

/// Annotate every group with popularity flags and cluster assignments.
/// Clusters never span date groups; cluster ids restart per group.
pub fn annotate_groups(groups: &mut [DayGroup], rule: &PopularityRule) {
    for group in groups {
        annotate_group(group, rule);
    }
}

/// Linear single pass: a cluster starts at a popular row and extends to later
/// popular rows while the gap since the last member stays within the
/// lookahead and the member count stays under the cap. Rows between members
/// receive the cluster id too, so rendering can draw one contiguous block. A
/// lone popular row stays flagged but unclustered.
fn annotate_group(group: &mut DayGroup, rule: &PopularityRule) {
    for dm in &mut group.matches {
        dm.popular = is_popular(&dm.record, rule.threshold);
        dm.cluster = None;
    }

    let popular: Vec<bool> = group.matches.iter().map(|d| d.popular).collect();
    let n = popular.len();
    let mut next_cluster = 0;
    let mut i = 0;

    while i < n {
        if !popular[i] {
            i += 1;
            continue;
        }

        let mut member_count = 1;
        let mut last = i;
        let mut j = i + 1;
        while j < n && member_count < rule.max_run && j - last <= rule.lookahead {
            if popular[j] {
                member_count += 1;
                last = j;
            }
            j += 1;
        }

        if member_count >= 2 {
            for dm in &mut group.matches[i..=last] {
                dm.cluster = Some(next_cluster);
            }
            next_cluster += 1;
        }
        i = last + 1;
    }
}

use chrono::NaiveDate;
use std::cmp::Ordering;

use super::{DayGroup, DisplayMatch};

/// Stable display ordering: live before not-live; among non-live pairs,
/// resolved start instant ascending. Live pairs compare equal, so the stable
/// sort preserves feed order for them.
pub fn order_matches(mut items: Vec<DisplayMatch>) -> Vec<DisplayMatch> {
    items.sort_by(|a, b| match (a.live, b.live) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => Ordering::Equal,
        (false, false) => a.record.start_time.cmp(&b.record.start_time),
    });
    items
}

/// Cap the ordered sequence at the configured display length.
pub fn truncate(mut items: Vec<DisplayMatch>, cap: usize) -> Vec<DisplayMatch> {
    items.truncate(cap);
    items
}

/// Group the truncated sequence by UTC calendar date, one group per distinct
/// date in ascending order, preserving intra-date ordering from the sort.
pub fn group_by_date(items: Vec<DisplayMatch>) -> Vec<DayGroup> {
    let mut groups: Vec<(NaiveDate, Vec<DisplayMatch>)> = Vec::new();

    for item in items {
        let date = item.record.start_time.date_naive();
        match groups.iter_mut().find(|(d, _)| *d == date) {
            Some((_, members)) => members.push(item),
            None => groups.push((date, vec![item])),
        }
    }

    groups.sort_by_key(|(date, _)| *date);
    groups
        .into_iter()
        .map(|(date, matches)| DayGroup { date, matches })
        .collect()
}

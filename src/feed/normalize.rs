//! Shape-tolerant feed ingestion.
//!
//! The feed has shipped in two shapes: a flat JSON array of match objects
//! (legacy) and an object `{live_matches, upcoming_matches, lang}` where
//! either partition may be absent. Everything is normalized here into
//! [`MatchRecord`]s so the rest of the crate never branches on wire shape.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::store::models::{FeedSnapshot, MatchRecord, MatchStatus, Partition, PLACEHOLDER_TEAM};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("feed payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unrecognized feed shape: expected an array or an object with live_matches/upcoming_matches")]
    UnrecognizedShape,
}

/// Parse a raw feed payload into a normalized snapshot.
pub fn parse_payload(payload: &str, fetched_at: DateTime<Utc>) -> Result<FeedSnapshot, ParseError> {
    let raw: Value = serde_json::from_str(payload)?;
    parse_feed(&raw, fetched_at)
}

/// Normalize an already-decoded feed document.
pub fn parse_feed(raw: &Value, fetched_at: DateTime<Utc>) -> Result<FeedSnapshot, ParseError> {
    // Legacy shape: one flat list, no live partition.
    if let Some(items) = raw.as_array() {
        return Ok(FeedSnapshot {
            live: vec![],
            upcoming: parse_partition(items, Partition::Upcoming),
            lang: None,
            fetched_at,
        });
    }

    if let Some(obj) = raw.as_object() {
        if obj.contains_key("live_matches") || obj.contains_key("upcoming_matches") {
            let live = obj
                .get("live_matches")
                .and_then(Value::as_array)
                .map(|a| parse_partition(a, Partition::Live))
                .unwrap_or_default();
            let upcoming = obj
                .get("upcoming_matches")
                .and_then(Value::as_array)
                .map(|a| parse_partition(a, Partition::Upcoming))
                .unwrap_or_default();
            let lang = obj.get("lang").and_then(Value::as_str).map(str::to_string);
            return Ok(FeedSnapshot {
                live,
                upcoming,
                lang,
                fetched_at,
            });
        }
    }

    Err(ParseError::UnrecognizedShape)
}

fn parse_partition(items: &[Value], partition: Partition) -> Vec<MatchRecord> {
    items
        .iter()
        .filter(|v| v.is_object())
        .map(|v| parse_match(v, partition))
        .collect()
}

/// Normalize one match object. Missing or malformed fields degrade to
/// placeholders; the record itself is never dropped.
fn parse_match(v: &Value, partition: Partition) -> MatchRecord {
    let (status, status_detail) = parse_status(&v["status"]);

    MatchRecord {
        match_id: string_or_number(&v["match_id"]),
        home_team: team_name(&v["home_team_name"]),
        away_team: team_name(&v["away_team_name"]),
        home_logo: non_empty_str(&v["home_team_hash_image"]),
        away_logo: non_empty_str(&v["away_team_hash_image"]),
        league: non_empty_str(&v["league_name"]),
        season: non_empty_str(&v["season_name"]),
        tournament: non_empty_str(&v["tournament_name"]),
        start_time: resolve_start(v),
        status,
        status_detail,
        home_popularity: v["home_team_popularity"].as_i64(),
        away_popularity: v["away_team_popularity"].as_i64(),
        partition,
    }
}

/// Resolve the start instant: explicit UNIX-seconds timestamp, then ISO
/// datetime string, then the alternate ISO date field. Epoch zero when
/// nothing parses; the liveness heuristic then always says not-live.
fn resolve_start(v: &Value) -> DateTime<Utc> {
    let unix = v["start_timestamp"]
        .as_i64()
        .or_else(|| v["start_timestamp"].as_str().and_then(|s| s.parse().ok()));
    if let Some(ts) = unix {
        if let Some(dt) = DateTime::from_timestamp(ts, 0) {
            return dt;
        }
    }

    for key in ["start_time", "start_date"] {
        if let Some(s) = v[key].as_str() {
            if let Some(dt) = parse_instant(s) {
                return dt;
            }
        }
    }

    DateTime::UNIX_EPOCH
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    // Bare calendar date (the alternate field in some feed versions)
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Status arrives either as a flat string ("live", "finished") or as a
/// structured `{type, description}` object. An unspecified sentinel maps to
/// `None` so the time heuristic decides.
fn parse_status(raw: &Value) -> (Option<MatchStatus>, Option<String>) {
    if let Some(s) = raw.as_str() {
        return (status_from_str(s), None);
    }
    if raw.is_object() {
        let detail = raw["description"].as_str().map(str::to_string);
        let status = raw["type"].as_str().and_then(status_from_str);
        return (status, detail);
    }
    (None, None)
}

fn status_from_str(s: &str) -> Option<MatchStatus> {
    match s.to_lowercase().as_str() {
        "live" | "inprogress" | "in_progress" | "started" => Some(MatchStatus::InProgress),
        "finished" | "ended" | "ft" => Some(MatchStatus::Finished),
        "notstarted" | "not_started" | "upcoming" | "scheduled" => Some(MatchStatus::NotStarted),
        "" | "unspecified" => None,
        _ => Some(MatchStatus::Unknown),
    }
}

fn team_name(v: &Value) -> String {
    match v.as_str() {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => PLACEHOLDER_TEAM.to_string(),
    }
}

fn non_empty_str(v: &Value) -> Option<String> {
    v.as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_or_number(v: &Value) -> Option<String> {
    v.as_str()
        .map(str::to_string)
        .or_else(|| v.as_i64().map(|n| n.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_partitioned_shape() {
        let raw = json!({
            "lang": "en",
            "live_matches": [
                {"match_id": "m1", "home_team_name": "NAVI", "away_team_name": "FaZe"}
            ],
            "upcoming_matches": [
                {"match_id": 42, "home_team_name": "G2", "away_team_name": "Vitality",
                 "start_time": "2025-06-01T18:00:00Z"}
            ]
        });
        let snap = parse_feed(&raw, now()).unwrap();
        assert_eq!(snap.live.len(), 1);
        assert_eq!(snap.upcoming.len(), 1);
        assert_eq!(snap.lang.as_deref(), Some("en"));
        assert_eq!(snap.live[0].partition, Partition::Live);
        assert_eq!(snap.upcoming[0].match_id.as_deref(), Some("42"));
        assert_eq!(
            snap.upcoming[0].start_time,
            Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_flat_array_shape_maps_to_upcoming() {
        let raw = json!([
            {"home_team_name": "NAVI", "away_team_name": "FaZe", "status": "live"}
        ]);
        let snap = parse_feed(&raw, now()).unwrap();
        assert!(snap.live.is_empty());
        assert_eq!(snap.upcoming.len(), 1);
        assert_eq!(snap.upcoming[0].partition, Partition::Upcoming);
        assert_eq!(snap.upcoming[0].status, Some(MatchStatus::InProgress));
    }

    #[test]
    fn test_missing_partition_treated_as_empty() {
        let raw = json!({"live_matches": []});
        let snap = parse_feed(&raw, now()).unwrap();
        assert!(snap.live.is_empty());
        assert!(snap.upcoming.is_empty());
        assert!(snap.is_empty());
    }

    #[test]
    fn test_unrecognized_shape_is_error() {
        let raw = json!({"matches": "nope"});
        assert!(matches!(
            parse_feed(&raw, now()),
            Err(ParseError::UnrecognizedShape)
        ));
        assert!(matches!(
            parse_feed(&json!("just a string"), now()),
            Err(ParseError::UnrecognizedShape)
        ));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(
            parse_payload("{not json", now()),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn test_structured_status() {
        let raw = json!([{"status": {"type": "finished", "description": "Match over"}}]);
        let snap = parse_feed(&raw, now()).unwrap();
        let m = &snap.upcoming[0];
        assert_eq!(m.status, Some(MatchStatus::Finished));
        assert_eq!(m.status_detail.as_deref(), Some("Match over"));
    }

    #[test]
    fn test_unspecified_status_is_none() {
        let raw = json!([{"status": "unspecified"}, {"status": {"description": "tbd"}}]);
        let snap = parse_feed(&raw, now()).unwrap();
        assert_eq!(snap.upcoming[0].status, None);
        assert_eq!(snap.upcoming[1].status, None);
        assert_eq!(snap.upcoming[1].status_detail.as_deref(), Some("tbd"));
    }

    #[test]
    fn test_start_resolution_prefers_unix_timestamp() {
        let raw = json!([{
            "start_timestamp": 1748800800i64,
            "start_time": "2025-01-01T00:00:00Z"
        }]);
        let snap = parse_feed(&raw, now()).unwrap();
        assert_eq!(
            snap.upcoming[0].start_time,
            DateTime::from_timestamp(1748800800, 0).unwrap()
        );
    }

    #[test]
    fn test_start_resolution_alternate_date_field() {
        let raw = json!([{"start_date": "2025-06-02"}]);
        let snap = parse_feed(&raw, now()).unwrap();
        assert_eq!(
            snap.upcoming[0].start_time,
            Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_missing_fields_degrade_to_defaults() {
        let raw = json!([{}]);
        let snap = parse_feed(&raw, now()).unwrap();
        let m = &snap.upcoming[0];
        assert_eq!(m.home_team, PLACEHOLDER_TEAM);
        assert_eq!(m.away_team, PLACEHOLDER_TEAM);
        assert_eq!(m.start_time, DateTime::UNIX_EPOCH);
        assert!(m.match_id.is_none());
        assert!(m.status.is_none());
        assert!(m.home_logo.is_none());
    }

    #[test]
    fn test_non_object_entries_skipped() {
        let raw = json!([{"home_team_name": "NAVI"}, "junk", 7]);
        let snap = parse_feed(&raw, now()).unwrap();
        assert_eq!(snap.upcoming.len(), 1);
    }
}

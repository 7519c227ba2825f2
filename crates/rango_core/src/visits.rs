//! crates/rango_core/src/visits.rs
//!
//! The visit tracker: a per-session visit counter that only moves forward
//! when at least one whole day has passed since the recorded last visit.
//!
//! The tracker never touches the session itself. Callers extract a
//! `VisitRecord` from the session, hand it to `track_visit` together with the
//! current time and write the returned `VisitState` back.

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::domain::SessionData;

/// Session key holding the visit counter.
pub const VISITS_KEY: &str = "visits";
/// Session key holding the timestamp of the last counted visit.
pub const LAST_VISIT_KEY: &str = "last_visit";

/// Layout of the part of a stored timestamp that is actually parsed.
const PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Layout used when writing timestamps; always six fractional digits.
const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
/// Length of the `.ffffff` suffix dropped before parsing.
const SUFFIX_LEN: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VisitError {
    #[error("Malformed last visit timestamp: {0:?}")]
    MalformedTimestamp(String),
    #[error("Invalid visit count: {0}")]
    InvalidCount(String),
}

/// What the session remembers about earlier visits. Absent fields fall back
/// to their defaults inside `track_visit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitRecord {
    pub visits: Option<u64>,
    pub last_visit: Option<String>,
}

impl VisitRecord {
    /// Reads both keys from the session. Falsy values count as absent.
    pub fn from_session(session: &SessionData) -> Result<Self, VisitError> {
        let visits = session
            .get_truthy(VISITS_KEY)
            .map(parse_count)
            .transpose()?;
        let last_visit = session.get_truthy(LAST_VISIT_KEY).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        Ok(Self { visits, last_visit })
    }
}

/// The values to write back into the session after a visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitState {
    pub visits: u64,
    pub last_visit: String,
}

impl VisitState {
    pub fn apply_to(&self, session: &mut SessionData) {
        session.insert(VISITS_KEY, self.visits);
        session.insert(LAST_VISIT_KEY, self.last_visit.clone());
    }
}

fn parse_count(value: &Value) -> Result<u64, VisitError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| VisitError::InvalidCount(n.to_string())),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| VisitError::InvalidCount(s.clone())),
        Value::Bool(true) => Ok(1),
        other => Err(VisitError::InvalidCount(other.to_string())),
    }
}

/// Renders `at` the way `last_visit` is stored.
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(WRITE_FORMAT).to_string()
}

/// Parses a stored timestamp by dropping its fixed-width suffix.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, VisitError> {
    let cut = raw
        .char_indices()
        .rev()
        .nth(SUFFIX_LEN - 1)
        .map(|(idx, _)| idx)
        .ok_or_else(|| VisitError::MalformedTimestamp(raw.to_string()))?;
    NaiveDateTime::parse_from_str(&raw[..cut], PARSE_FORMAT)
        .map_err(|_| VisitError::MalformedTimestamp(raw.to_string()))
}

/// Computes the next visit state.
///
/// When the last visit is at least one whole day before `now` the counter is
/// incremented and `last_visit` moves to `now`. Otherwise the counter is
/// reset to 1 and `last_visit` is kept.
pub fn track_visit(previous: &VisitRecord, now: NaiveDateTime) -> Result<VisitState, VisitError> {
    let visits = previous.visits.unwrap_or(1);
    let last_visit = previous
        .last_visit
        .clone()
        .unwrap_or_else(|| format_timestamp(now));
    let last_visit_time = parse_timestamp(&last_visit)?;

    if (now - last_visit_time).num_days() > 0 {
        Ok(VisitState {
            visits: visits + 1,
            last_visit: format_timestamp(now),
        })
    } else {
        // Same-day repeat visits drop the running count.
        Ok(VisitState {
            visits: 1,
            last_visit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Timelike};
    use rstest::rstest;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_micro_opt(12, 0, 0, 250_000)
            .unwrap()
    }

    fn record(visits: Option<u64>, last_visit: Option<NaiveDateTime>) -> VisitRecord {
        VisitRecord {
            visits,
            last_visit: last_visit.map(format_timestamp),
        }
    }

    #[test]
    fn first_visit_starts_at_one() {
        let state = track_visit(&VisitRecord::default(), noon()).unwrap();
        assert_eq!(state.visits, 1);
        assert_eq!(state.last_visit, "2024-03-10 12:00:00.250000");
    }

    #[test]
    fn a_day_later_increments_and_moves_timestamp() {
        let now = noon();
        let previous = record(Some(4), Some(now - Duration::hours(30)));
        let state = track_visit(&previous, now).unwrap();
        assert_eq!(state.visits, 5);
        assert_eq!(state.last_visit, format_timestamp(now));
    }

    #[rstest]
    #[case(Duration::minutes(5))]
    #[case(Duration::hours(23))]
    #[case(Duration::hours(-2))]
    fn same_day_resets_count_and_keeps_timestamp(#[case] ago: Duration) {
        let now = noon();
        let previous = record(Some(9), Some(now - ago));
        let state = track_visit(&previous, now).unwrap();
        assert_eq!(state.visits, 1);
        assert_eq!(state.last_visit, previous.last_visit.unwrap());
    }

    #[test]
    fn many_days_still_count_once() {
        let now = noon();
        let previous = record(Some(2), Some(now - Duration::days(10)));
        assert_eq!(track_visit(&previous, now).unwrap().visits, 3);
    }

    #[test]
    fn timestamp_round_trips_through_suffix_cut() {
        let now = noon();
        let parsed = parse_timestamp(&format_timestamp(now)).unwrap();
        assert_eq!(parsed, now.with_nanosecond(0).unwrap());
    }

    #[rstest]
    #[case("")]
    #[case("yesterday")]
    #[case("2024-03-10 12:00:00")]
    #[case("10/03/2024 12:00:00.000000")]
    fn malformed_timestamps_are_rejected(#[case] raw: &str) {
        let previous = VisitRecord {
            visits: Some(1),
            last_visit: Some(raw.to_string()),
        };
        assert!(matches!(
            track_visit(&previous, noon()),
            Err(VisitError::MalformedTimestamp(_))
        ));
    }

    #[test]
    fn record_reads_numbers_and_numeric_strings() {
        let mut session = SessionData::new();
        session.insert(VISITS_KEY, "7");
        session.insert(LAST_VISIT_KEY, "2024-03-09 08:00:00.000001");
        let record = VisitRecord::from_session(&session).unwrap();
        assert_eq!(record.visits, Some(7));
        assert_eq!(record.last_visit.as_deref(), Some("2024-03-09 08:00:00.000001"));
    }

    #[test]
    fn record_treats_falsy_values_as_absent() {
        let mut session = SessionData::new();
        session.insert(VISITS_KEY, 0);
        session.insert(LAST_VISIT_KEY, "");
        assert_eq!(VisitRecord::from_session(&session).unwrap(), VisitRecord::default());
    }

    #[test]
    fn record_rejects_non_numeric_counts() {
        let mut session = SessionData::new();
        session.insert(VISITS_KEY, "many");
        assert_eq!(
            VisitRecord::from_session(&session),
            Err(VisitError::InvalidCount("many".to_string()))
        );
    }

    #[test]
    fn state_is_written_back_under_both_keys() {
        let mut session = SessionData::new();
        let state = VisitState {
            visits: 3,
            last_visit: "2024-03-10 12:00:00.000000".to_string(),
        };
        state.apply_to(&mut session);
        assert_eq!(session.get(VISITS_KEY), Some(&Value::from(3)));
        assert_eq!(
            session.get(LAST_VISIT_KEY),
            Some(&Value::from("2024-03-10 12:00:00.000000"))
        );
    }
}

//! Gate for the scheduled snapshot job.
//!
//! The job is started every 30 minutes but only publishes on the 6-hour marks
//! (00/06/12/18 UTC) or shortly after a gameweek deadline, when team sheets and
//! transfers have just been locked in. Manual runs always publish.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};

use crate::fpl_api::Event;

const DEADLINE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
// Catches both the :00 and :30 cron runs of a 6-hour mark.
const SIX_HOUR_WINDOW_MINUTES: u32 = 35;
const AFTER_DEADLINE_MIN_MINUTES: f64 = 60.0;
const AFTER_DEADLINE_MAX_MINUTES: f64 = 95.0;

pub fn should_publish(now: DateTime<Utc>, events: &[Event], manual: bool) -> Option<String> {
    if manual {
        return Some("manual trigger".to_string());
    }
    if now.hour() % 6 == 0 && now.minute() < SIX_HOUR_WINDOW_MINUTES {
        return Some("standard 6-hour update".to_string());
    }
    events.iter().find_map(|event| {
        let deadline = parse_deadline(event.deadline_time.as_deref()?)?;
        let minutes_since = (now - deadline).num_seconds() as f64 / 60.0;
        (AFTER_DEADLINE_MIN_MINUTES..=AFTER_DEADLINE_MAX_MINUTES)
            .contains(&minutes_since)
            .then(|| format!("1 hour after GW{} deadline", event.id))
    })
}

fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), DEADLINE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(id: u32, deadline: &str) -> Event {
        Event {
            id,
            is_current: false,
            is_next: false,
            deadline_time: Some(deadline.to_string()),
        }
    }

    #[test]
    fn parses_fpl_deadline_format() {
        let parsed = parse_deadline("2023-12-09T11:00:00Z").expect("valid deadline");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 12, 9, 11, 0, 0).unwrap());
        assert!(parse_deadline("09/12/2023").is_none());
    }

    #[test]
    fn half_past_a_six_hour_mark_still_publishes() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 12, 30, 0).unwrap();
        assert_eq!(
            should_publish(now, &[], false).as_deref(),
            Some("standard 6-hour update")
        );
    }

    #[test]
    fn deadline_window_bounds_are_inclusive() {
        let events = [event(27, "2024-03-02T08:00:00Z")];
        let at = |h, m| Utc.with_ymd_and_hms(2024, 3, 2, h, m, 0).unwrap();
        assert_eq!(
            should_publish(at(9, 0), &events, false).as_deref(),
            Some("1 hour after GW27 deadline")
        );
        assert_eq!(
            should_publish(at(9, 35), &events, false).as_deref(),
            Some("1 hour after GW27 deadline")
        );
        assert!(should_publish(at(8, 59), &events, false).is_none());
        assert!(should_publish(at(9, 36), &events, false).is_none());
    }

    #[test]
    fn manual_runs_always_publish() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 15, 47, 0).unwrap();
        assert!(should_publish(now, &[], false).is_none());
        assert_eq!(
            should_publish(now, &[], true).as_deref(),
            Some("manual trigger")
        );
    }

    #[test]
    fn unreadable_deadlines_are_skipped() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 9, 10, 0).unwrap();
        let events = [
            event(26, "soon"),
            Event {
                id: 27,
                is_current: false,
                is_next: true,
                deadline_time: None,
            },
            event(28, "2024-03-02T08:00:00Z"),
        ];
        assert_eq!(
            should_publish(now, &events, false).as_deref(),
            Some("1 hour after GW28 deadline")
        );
        assert!(should_publish(now, &events[..2], false).is_none());
    }
}

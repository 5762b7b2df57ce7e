//! Window calculation and artifact naming.
//!
//! A [`TimeWindow`] is the half-open interval `[start, end)` whose contained
//! images feed one artifact. Windows are always the most recently *completed*
//! interval for a cadence, computed in a single fixed reference zone so that
//! artifact names are deterministic regardless of where the job runs. They
//! are recomputed fresh on every invocation and never persisted; the
//! artifact name derived from `(cadence, end)` is the only idempotence key.

use chrono::{DateTime, Datelike, LocalResult, NaiveDateTime, SecondsFormat, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::cadence::Cadence;

/// Fixed reference zone for all window math and artifact names.
pub const REFERENCE_ZONE: Tz = chrono_tz::Asia::Hong_Kong;

/// The half-open time interval `[start, end)` feeding one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub cadence: Cadence,
}

impl TimeWindow {
    /// The most recently completed window for `cadence` as of `now`.
    ///
    /// `end` is aligned to the cadence boundary (top of hour, midnight,
    /// Monday midnight) and `start = end - span` exactly.
    pub fn current(cadence: Cadence, now: DateTime<Tz>) -> Self {
        let end = match cadence {
            Cadence::Hourly => floor_to_hour(now),
            Cadence::Daily => floor_to_midnight(now),
            Cadence::Weekly => floor_to_week_start(now),
        };
        Self {
            start: end - cadence.span(),
            end,
            cadence,
        }
    }

    /// Deterministic artifact name for this window, without extension.
    ///
    /// Hourly embeds `end` as `YYYYMMDD_HH`, daily as `YYYYMMDD`, weekly as
    /// the ISO `(year, week)` of `end` with the week zero-padded to two
    /// digits.
    pub fn artifact_stem(&self) -> String {
        match self.cadence {
            Cadence::Hourly => format!("timelapse_hour_{}", self.end.format("%Y%m%d_%H")),
            Cadence::Daily => format!("timelapse_day_{}", self.end.format("%Y%m%d")),
            Cadence::Weekly => {
                let iso = self.end.iso_week();
                format!("timelapse_week_{}{:02}", iso.year(), iso.week())
            }
        }
    }

    /// Window start as an RFC 3339 UTC instant, for `createdTime` queries.
    pub fn start_rfc3339_utc(&self) -> String {
        to_rfc3339_utc(self.start)
    }

    /// Window end as an RFC 3339 UTC instant, for `createdTime` queries.
    pub fn end_rfc3339_utc(&self) -> String {
        to_rfc3339_utc(self.end)
    }

    /// Whether `t` falls inside the half-open interval.
    pub fn contains(&self, t: DateTime<Tz>) -> bool {
        self.start <= t && t < self.end
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{} .. {})",
            self.cadence,
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Format an instant as RFC 3339 in UTC with a trailing `Z`.
pub fn to_rfc3339_utc(t: DateTime<Tz>) -> String {
    t.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Resolve a naive local time in the reference zone.
///
/// The reference zone has no DST transitions, so the ambiguous/gap arms are
/// unreachable for boundary times; they resolve conservatively rather than
/// panicking.
fn zoned(naive: NaiveDateTime) -> DateTime<Tz> {
    match REFERENCE_ZONE.from_local_datetime(&naive) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => REFERENCE_ZONE.from_utc_datetime(&naive),
    }
}

fn floor_to_hour(t: DateTime<Tz>) -> DateTime<Tz> {
    let local = t.naive_local();
    // hour() < 24, so and_hms_opt cannot fail
    let floored = local
        .date()
        .and_hms_opt(local.hour(), 0, 0)
        .unwrap_or(local);
    zoned(floored)
}

fn floor_to_midnight(t: DateTime<Tz>) -> DateTime<Tz> {
    let local = t.naive_local();
    let floored = local.date().and_hms_opt(0, 0, 0).unwrap_or(local);
    zoned(floored)
}

/// Most recent Monday midnight at or before `t`.
fn floor_to_week_start(t: DateTime<Tz>) -> DateTime<Tz> {
    let local = t.naive_local();
    let days_back = local.weekday().num_days_from_monday() as i64;
    let monday = local.date() - chrono::Duration::days(days_back);
    zoned(monday.and_hms_opt(0, 0, 0).unwrap_or(local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Tz> {
        REFERENCE_ZONE
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .single()
            .expect("valid reference-zone time")
    }

    #[test]
    fn test_hourly_window_alignment() {
        // Thursday 2024-03-14 15:47 HKT
        let now = at(2024, 3, 14, 15, 47, 0);
        let w = TimeWindow::current(Cadence::Hourly, now);

        assert_eq!(w.end, at(2024, 3, 14, 15, 0, 0));
        assert_eq!(w.start, at(2024, 3, 14, 14, 0, 0));
        assert_eq!(w.end - w.start, Duration::hours(1));
        assert_eq!(w.artifact_stem(), "timelapse_hour_20240314_15");
    }

    #[test]
    fn test_daily_window_alignment() {
        let now = at(2024, 3, 14, 15, 47, 0);
        let w = TimeWindow::current(Cadence::Daily, now);

        assert_eq!(w.end, at(2024, 3, 14, 0, 0, 0));
        assert_eq!(w.start, at(2024, 3, 13, 0, 0, 0));
        assert_eq!(w.end - w.start, Duration::days(1));
        assert_eq!(w.artifact_stem(), "timelapse_day_20240314");
    }

    #[test]
    fn test_weekly_window_alignment() {
        // 2024-03-14 is a Thursday; the current week started Monday 03-11,
        // so the last completed week is [03-04, 03-11).
        let now = at(2024, 3, 14, 15, 47, 0);
        let w = TimeWindow::current(Cadence::Weekly, now);

        assert_eq!(w.end, at(2024, 3, 11, 0, 0, 0));
        assert_eq!(w.start, at(2024, 3, 4, 0, 0, 0));
        assert_eq!(w.end - w.start, Duration::days(7));
        // ISO week of 2024-03-11 is week 11
        assert_eq!(w.artifact_stem(), "timelapse_week_202411");
    }

    #[test]
    fn test_weekly_on_monday_uses_previous_week() {
        // A Monday just after midnight still closes out the prior week.
        let now = at(2024, 3, 11, 0, 0, 1);
        let w = TimeWindow::current(Cadence::Weekly, now);
        assert_eq!(w.end, at(2024, 3, 11, 0, 0, 0));
        assert_eq!(w.start, at(2024, 3, 4, 0, 0, 0));
    }

    #[test]
    fn test_hourly_at_exact_boundary() {
        let now = at(2024, 3, 14, 15, 0, 0);
        let w = TimeWindow::current(Cadence::Hourly, now);
        assert_eq!(w.end, now);
        assert_eq!(w.start, at(2024, 3, 14, 14, 0, 0));
    }

    #[test]
    fn test_artifact_stem_is_pure_in_cadence_and_end() {
        // Different "now" values inside the same hour map to the same window
        // and therefore the same name.
        let a = TimeWindow::current(Cadence::Hourly, at(2024, 3, 14, 15, 1, 0));
        let b = TimeWindow::current(Cadence::Hourly, at(2024, 3, 14, 15, 59, 59));
        assert_eq!(a, b);
        assert_eq!(a.artifact_stem(), b.artifact_stem());

        // One hour apart yields a different name.
        let c = TimeWindow::current(Cadence::Hourly, at(2024, 3, 14, 16, 1, 0));
        assert_ne!(a.artifact_stem(), c.artifact_stem());
    }

    #[test]
    fn test_weekly_stem_zero_pads_week() {
        // 2024-01-10 is in ISO week 2 of 2024; the last completed week
        // (ending Monday 2024-01-08) is ISO week 2's start, i.e. week 02.
        let now = at(2024, 1, 10, 12, 0, 0);
        let w = TimeWindow::current(Cadence::Weekly, now);
        assert_eq!(w.artifact_stem(), "timelapse_week_202402");
    }

    #[test]
    fn test_rfc3339_bounds_are_utc() {
        let now = at(2024, 3, 14, 15, 47, 0);
        let w = TimeWindow::current(Cadence::Hourly, now);
        // 14:00 HKT == 06:00 UTC
        assert_eq!(w.start_rfc3339_utc(), "2024-03-14T06:00:00Z");
        assert_eq!(w.end_rfc3339_utc(), "2024-03-14T07:00:00Z");
    }

    #[test]
    fn test_contains_is_half_open() {
        let w = TimeWindow::current(Cadence::Hourly, at(2024, 3, 14, 15, 47, 0));
        assert!(w.contains(w.start));
        assert!(w.contains(at(2024, 3, 14, 14, 59, 59)));
        assert!(!w.contains(w.end));
    }
}

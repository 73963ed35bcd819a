//! Time-of-day overrides for worker bounds and scale thresholds. Mirrors the
//! original `schedule.go`: an insertion-ordered list of `[lt, rt)` ranges
//! (milliseconds since local midnight) is sorted lazily on first query.

use crate::error::ConfigError;
use chrono::Timelike;
use once_cell::sync::Lazy;
use regex::Regex;

const MS_SEC: u32 = 1_000;
const MS_MIN: u32 = 60 * MS_SEC;
const MS_HOUR: u32 = 60 * MS_MIN;
const END_OF_DAY: u32 = 23 * MS_HOUR + 59 * MS_MIN + 59 * MS_SEC + 999;

static RE_HMS_MS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2}):(\d{2}):(\d{2})\.(\d{3})$").unwrap());
static RE_HMS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{2}):(\d{2}):(\d{2})$").unwrap());
static RE_HM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{2}):(\d{2})$").unwrap());

/// Worker bounds and scale thresholds effective during a registered time range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleParams {
    pub workers_min: u32,
    pub workers_max: u32,
    pub wakeup_factor: f32,
    pub sleep_factor: f32,
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    lt: u32,
    rt: u32,
    params: ScheduleParams,
}

/// Time-of-day schedule. Not meant to be shared between queues: each
/// `Queue::new` takes ownership of a frozen copy ([`Schedule::freeze`]).
#[derive(Debug, Default, Clone)]
pub struct Schedule {
    rules: Vec<Rule>,
    sorted: bool,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `params` for the time range described by `raw`, formatted
    /// `<left>-<right>` where each side is `HH:MM`, `HH:MM:SS`,
    /// `HH:MM:SS.mmm`, or `*` (meaning start-of-day on the left, end-of-day
    /// on the right).
    pub fn add_range(&mut self, raw: &str, params: ScheduleParams) -> Result<(), ConfigError> {
        if params.workers_max == 0 {
            return Err(ConfigError::SchedZeroMax);
        }
        if params.workers_min > params.workers_max {
            return Err(ConfigError::SchedMinGtMax);
        }

        let pos = raw
            .find('-')
            .ok_or_else(|| ConfigError::BadScheduleRange(raw.to_string()))?;
        let (l, r) = (&raw[..pos], &raw[pos + 1..]);
        if l.is_empty() || r.is_empty() {
            return Err(ConfigError::BadScheduleRange(raw.to_string()));
        }

        let lt = Self::parse_time(l, false)?;
        let rt = Self::parse_time(r, true)?;
        if rt < lt {
            return Err(ConfigError::BadScheduleRange(raw.to_string()));
        }

        self.sorted = false;
        self.rules.push(Rule { lt, rt, params });
        Ok(())
    }

    fn parse_time(raw: &str, is_right_edge: bool) -> Result<u32, ConfigError> {
        if raw == "*" {
            return Ok(if is_right_edge { END_OF_DAY } else { 0 });
        }
        let (h, m, sc, ms) = if let Some(c) = RE_HMS_MS.captures(raw) {
            (
                c[1].parse().unwrap_or(99),
                c[2].parse().unwrap_or(99),
                c[3].parse().unwrap_or(99),
                c[4].parse().unwrap_or(9999),
            )
        } else if let Some(c) = RE_HMS.captures(raw) {
            (
                c[1].parse().unwrap_or(99),
                c[2].parse().unwrap_or(99),
                c[3].parse().unwrap_or(99),
                0,
            )
        } else if let Some(c) = RE_HM.captures(raw) {
            (c[1].parse().unwrap_or(99), c[2].parse().unwrap_or(99), 0, 0)
        } else {
            return Err(ConfigError::BadTime(raw.to_string()));
        };

        if h > 23 || m > 59 || sc > 59 || ms > 999 {
            return Err(ConfigError::BadTime(raw.to_string()));
        }
        Ok(h * MS_HOUR + m * MS_MIN + sc * MS_SEC + ms)
    }

    fn sort(&mut self) {
        if self.sorted {
            return;
        }
        self.rules.sort_by_key(|r| r.lt);
        self.sorted = true;
    }

    /// Returns the params effective for `today_ms` (milliseconds since local
    /// midnight), and the index of the matching rule, or `-1` if none applies.
    pub fn get_at(&mut self, today_ms: u32) -> (Option<ScheduleParams>, i32) {
        if self.rules.is_empty() {
            return (None, -1);
        }
        self.sort();
        for (i, r) in self.rules.iter().enumerate() {
            if r.lt <= today_ms && today_ms < r.rt {
                return (Some(r.params), i as i32);
            }
        }
        (None, -1)
    }

    /// Same as [`Schedule::get_at`] but computes `today_ms` from the local
    /// wall clock, matching the original's `time.Now()`-based `Get()`.
    pub fn get(&mut self) -> (Option<ScheduleParams>, i32) {
        let now = chrono::Local::now();
        let ms = now.hour() * MS_HOUR
            + now.minute() * MS_MIN
            + now.second() * MS_SEC
            + now.nanosecond() / 1_000_000;
        self.get_at(ms)
    }

    /// Maximum `workers_max` across all registered rules; used to size the
    /// Queue's worker slab once at init.
    pub fn workers_max_daily(&self) -> u32 {
        self.rules.iter().map(|r| r.params.workers_max).max().unwrap_or(0)
    }

    /// Returns an immutable, pre-sorted copy safe to store on a `Queue` after
    /// construction, so later mutation of the original has no effect.
    pub fn freeze(&self) -> Self {
        let mut cpy = self.clone();
        cpy.sort();
        cpy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(min: u32, max: u32) -> ScheduleParams {
        ScheduleParams {
            workers_min: min,
            workers_max: max,
            wakeup_factor: 0.9,
            sleep_factor: 0.1,
        }
    }

    #[test]
    fn parses_hm_hms_and_hms_ms() {
        let mut s = Schedule::new();
        assert!(s.add_range("09:00-10:00", params(1, 2)).is_ok());
        assert!(s.add_range("10:00:30-11:00:30", params(1, 2)).is_ok());
        assert!(s.add_range("11:00:30.500-12:00:00.000", params(1, 2)).is_ok());
    }

    #[test]
    fn rejects_malformed_range() {
        let mut s = Schedule::new();
        assert_eq!(
            s.add_range("bogus", params(1, 2)),
            Err(ConfigError::BadScheduleRange("bogus".into()))
        );
        assert!(s.add_range("25:00-26:00", params(1, 2)).is_err());
    }

    #[test]
    fn rejects_min_greater_than_max() {
        let mut s = Schedule::new();
        assert_eq!(
            s.add_range("09:00-10:00", params(5, 1)),
            Err(ConfigError::SchedMinGtMax)
        );
    }

    #[test]
    fn get_at_hits_matching_range_and_misses_otherwise() {
        let mut s = Schedule::new();
        s.add_range("09:00-10:00", params(4, 8)).unwrap();
        let nine_thirty = 9 * MS_HOUR + 30 * MS_MIN;
        let (p, id) = s.get_at(nine_thirty);
        assert_eq!(id, 0);
        assert_eq!(p.unwrap().workers_max, 8);

        let ten_oh_one = 10 * MS_HOUR + MS_MIN;
        let (p, id) = s.get_at(ten_oh_one);
        assert_eq!(id, -1);
        assert!(p.is_none());
    }

    #[test]
    fn registration_order_does_not_affect_lookup() {
        let mut a = Schedule::new();
        a.add_range("09:00-10:00", params(4, 8)).unwrap();
        a.add_range("06:00-07:00", params(2, 2)).unwrap();

        let mut b = Schedule::new();
        b.add_range("06:00-07:00", params(2, 2)).unwrap();
        b.add_range("09:00-10:00", params(4, 8)).unwrap();

        let t = 9 * MS_HOUR + 30 * MS_MIN;
        assert_eq!(a.get_at(t).0, b.get_at(t).0);
    }

    #[test]
    fn workers_max_daily_is_the_overall_max() {
        let mut s = Schedule::new();
        s.add_range("09:00-10:00", params(4, 8)).unwrap();
        s.add_range("12:00-13:00", params(1, 20)).unwrap();
        assert_eq!(s.workers_max_daily(), 20);
    }

    #[test]
    fn star_spans_start_and_end_of_day() {
        let mut s = Schedule::new();
        s.add_range("*-10:00", params(1, 2)).unwrap();
        assert_eq!(s.get_at(0).1, 0);
    }
}

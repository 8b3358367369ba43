//! Spans of time.
//!
//! Stored as floating seconds.  Text forms:
//!
//! | Input        | Seconds                          |
//! |--------------|----------------------------------|
//! | `10`, `10s`  | 10                               |
//! | `20t`        | 1 (a tick is 0.05s)              |
//! | `5m`         | 300                              |
//! | `2h` `1d` `1w` `1y` | hours, days, weeks, 365-day years |
//! | `instant`, `infinite` | 0                       |
//! | `10s-25s`    | random whole seconds in [10, 25] |
//! | `d@90.0s`    | identity form                    |

use rand::Rng;

use crate::tag::context::TagContext;
use crate::tag::object::ObjectTag;
use crate::tag::registry::{Arity, Registry};

use super::element::format_number;
use super::{ElementTag, TimeTag};

const MINUTE: f64 = 60.0;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;
const WEEK: f64 = 7.0 * DAY;
const YEAR: f64 = 365.0 * DAY;
const TICK: f64 = 0.05;
const TICKS_PER_SECOND: f64 = 20.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DurationTag {
    seconds: f64,
}

impl DurationTag {
    pub fn new(seconds: f64) -> Self {
        Self { seconds }
    }

    pub fn from_ticks(ticks: i64) -> Self {
        Self::new(ticks as f64 / TICKS_PER_SECOND)
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    /// Whole milliseconds, truncated toward zero.
    pub fn millis(&self) -> i64 {
        (self.seconds * 1000.0) as i64
    }

    pub fn ticks(&self) -> i64 {
        (self.seconds * TICKS_PER_SECOND) as i64
    }

    /// Whole seconds, half away from zero.  Anything strictly between 0 and
    /// 1 second counts as 1.
    pub fn seconds_as_int(&self) -> i64 {
        if self.seconds > 0.0 && self.seconds < 1.0 {
            return 1;
        }
        self.seconds.round() as i64
    }

    /// Parse any of the text forms above.
    pub fn value_of(text: &str) -> Option<Self> {
        let lower = text.trim().to_lowercase();
        let s = lower.strip_prefix("d@").unwrap_or(&lower);
        if s == "instant" || s == "infinite" {
            return Some(Self::new(0.0));
        }
        if s.is_empty() {
            return None;
        }
        if s.contains('-') && !s.starts_with('-') && !s.contains("e-") {
            let (low, high) = s.split_once('-')?;
            return Self::random_between(Self::value_of(low)?, Self::value_of(high)?);
        }

        let last = s.chars().last()?;
        // A bare number must end in a digit; `5.` is neither a number nor a unit.
        let (number, unit) = if last.is_ascii_digit() {
            (s, 1.0)
        } else {
            let unit = match last {
                't' => TICK,
                's' => 1.0,
                'm' => MINUTE,
                'h' => HOUR,
                'd' => DAY,
                'w' => WEEK,
                'y' => YEAR,
                _ => return None,
            };
            (&s[..s.len() - last.len_utf8()], unit)
        };
        let value: f64 = ElementTag::new(number).as_f64()?;
        let seconds = value * unit;
        seconds.is_finite().then(|| Self::new(seconds))
    }

    fn random_between(a: Self, b: Self) -> Option<Self> {
        let (mut low, mut high) = (a.seconds_as_int(), b.seconds_as_int());
        if high < low {
            std::mem::swap(&mut low, &mut high);
        }
        let picked = rand::thread_rng().gen_range(low..=high);
        tracing::trace!(low, high, picked, "random duration");
        Some(Self::new(picked as f64))
    }

    pub fn identity(&self) -> String {
        format!("d@{}s", format_number(self.seconds))
    }

    pub fn debug_form(&self) -> String {
        format!("{} ({})", self.identity(), self.formatted(false))
    }

    /// `2h 30m` style text (`2 hours 30 minutes` with `words`).
    ///
    /// Hours drop out once there are years, minutes once there are days, and
    /// seconds once there are ten minutes or any larger unit.
    pub fn formatted(&self, words: bool) -> String {
        let negative = self.seconds < 0.0;
        let abs = self.seconds.abs();
        let total = abs as i64;

        let years_raw = total / YEAR as i64;
        let days_raw = total / DAY as i64;
        let hours_raw = total / HOUR as i64;
        let minutes_raw = total / MINUTE as i64;
        let years = years_raw;
        let days = days_raw - years * 365;
        let hours = hours_raw - days_raw * 24;
        let minutes = minutes_raw - hours * 60;
        let seconds = total - minutes_raw * 60;

        let unit = |n: i64, short: &str, long: &str| -> String {
            if words {
                format!("{n} {long}{}", if n == 1 { "" } else { "s" })
            } else {
                format!("{n}{short}")
            }
        };
        let mut parts = Vec::new();
        if years > 0 {
            parts.push(unit(years, "y", "year"));
        }
        if days > 0 {
            parts.push(unit(days, "d", "day"));
        }
        if hours > 0 && years == 0 {
            parts.push(unit(hours, "h", "hour"));
        }
        if minutes > 0 && days == 0 && years == 0 {
            parts.push(unit(minutes, "m", "minute"));
        }
        if seconds > 0 && minutes < 10 && hours == 0 && days == 0 && years == 0 {
            parts.push(unit(seconds, "s", "second"));
        }

        let text = if !parts.is_empty() {
            parts.join(" ")
        } else if abs == 0.0 {
            "forever".to_owned()
        } else {
            format!("{}s", format_number((abs * 100.0).trunc() / 100.0))
        };
        if negative {
            format!("negative {text}")
        } else {
            text
        }
    }

    pub(crate) fn parse_in(text: &str, _ctx: &TagContext) -> Option<Self> {
        Self::value_of(text)
    }
}

// ── Attributes ────────────────────────────────────────────────────────────────

pub(super) fn register(reg: &mut Registry) {
    let conversions: [(&[&str], f64); 6] = [
        (&["in_years", "years"], YEAR),
        (&["in_weeks", "weeks"], WEEK),
        (&["in_days", "days"], DAY),
        (&["in_hours", "hours"], HOUR),
        (&["in_minutes", "minutes"], MINUTE),
        (&["in_seconds", "seconds"], 1.0),
    ];
    for (names, per) in conversions {
        reg.register::<DurationTag, _>(names, Arity::None, move |d, _| {
            Some(ElementTag::from(d.seconds / per).into())
        });
    }
    reg.register::<DurationTag, _>(&["in_milliseconds", "milliseconds"], Arity::None, |d, _| {
        Some(ElementTag::from(d.seconds * 1000.0).into())
    });
    reg.register::<DurationTag, _>(&["in_ticks", "ticks"], Arity::None, |d, _| {
        Some(ElementTag::from(d.ticks()).into())
    });

    reg.register::<DurationTag, _>(&["add"], Arity::Required, |d, attr| {
        let other = attr.param_as::<DurationTag>()?;
        Some(DurationTag::new(d.seconds + other.seconds).into())
    });
    reg.register::<DurationTag, _>(&["sub"], Arity::Required, |d, attr| {
        let other = attr.param_as::<DurationTag>()?;
        Some(DurationTag::new(d.seconds - other.seconds).into())
    });

    let comparisons: [(&str, fn(f64, f64) -> bool); 4] = [
        ("is_more_than", |a, b| a > b),
        ("is_less_than", |a, b| a < b),
        ("is_more_than_or_equal_to", |a, b| a >= b),
        ("is_less_than_or_equal_to", |a, b| a <= b),
    ];
    for (name, cmp) in comparisons {
        reg.register::<DurationTag, _>(&[name], Arity::Required, move |d, attr| {
            let other = attr.param_as::<DurationTag>()?;
            Some(ElementTag::from(cmp(d.seconds, other.seconds)).into())
        });
    }

    reg.register::<DurationTag, _>(&["time"], Arity::None, |d, _| {
        Some(TimeTag::from_millis(d.millis()).into())
    });
    reg.register::<DurationTag, _>(&["formatted", "value"], Arity::None, |d, _| {
        Some(ObjectTag::element(d.formatted(false)))
    });
    reg.register::<DurationTag, _>(&["formatted_words"], Arity::None, |d, _| {
        Some(ObjectTag::element(d.formatted(true)))
    });
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: &str) -> f64 {
        DurationTag::value_of(s).unwrap_or_else(|| panic!("{s} should parse")).seconds()
    }

    #[test]
    fn units() {
        assert_eq!(secs("10s"), 10.0);
        assert_eq!(secs("10"), 10.0);
        assert_eq!(secs("1d"), 86400.0);
        assert_eq!(secs("50m"), 3000.0);
        assert_eq!(secs("2h"), 7200.0);
        assert_eq!(secs("1w"), 604800.0);
        assert_eq!(secs("1y"), 31536000.0);
        assert_eq!(secs("20t"), 1.0);
        assert_eq!(secs("D@1.5S"), 1.5);
    }

    #[test]
    fn zero_words() {
        assert_eq!(secs("instant"), 0.0);
        assert_eq!(secs("infinite"), 0.0);
        assert_eq!(secs("d@instant"), 0.0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(DurationTag::value_of("").is_none());
        assert!(DurationTag::value_of("d@").is_none());
        assert!(DurationTag::value_of("abc").is_none());
        assert!(DurationTag::value_of("5q").is_none());
        assert!(DurationTag::value_of("1e999").is_none());
        assert!(DurationTag::value_of("5.").is_none());
    }

    #[test]
    fn millis_truncate() {
        assert_eq!(DurationTag::new(1.0019).millis(), 1001);
        assert_eq!(DurationTag::new(0.0009).millis(), 0);
        assert_eq!(DurationTag::new(-1.0019).millis(), -1001);
        assert_eq!(DurationTag::from_ticks(3).millis(), 150);
    }

    #[test]
    fn negatives_and_exponents_are_not_ranges() {
        assert_eq!(secs("-5s"), -5.0);
        assert_eq!(secs("1e-2"), 0.01);
    }

    #[test]
    fn ranges_stay_in_bounds_either_order() {
        for text in ["10s-25s", "25s-10s"] {
            for _ in 0..50 {
                let s = secs(text);
                assert!((10.0..=25.0).contains(&s), "{text} gave {s}");
                assert_eq!(s.fract(), 0.0);
            }
        }
        assert!(DurationTag::value_of("5s-nope").is_none());
    }

    #[test]
    fn rounding_to_whole_seconds() {
        assert_eq!(DurationTag::new(0.4).seconds_as_int(), 1);
        assert_eq!(DurationTag::new(2.5).seconds_as_int(), 3);
        assert_eq!(DurationTag::new(-2.5).seconds_as_int(), -3);
        assert_eq!(DurationTag::new(2.4).seconds_as_int(), 2);
        assert_eq!(DurationTag::new(0.0).seconds_as_int(), 0);
    }

    #[test]
    fn identity_round_trips() {
        let d = DurationTag::new(90.0);
        assert_eq!(d.identity(), "d@90.0s");
        assert_eq!(DurationTag::value_of(&d.identity()), Some(d));
        let odd = DurationTag::new(0.05);
        assert_eq!(DurationTag::value_of(&odd.identity()), Some(odd));
    }

    #[test]
    fn formatting() {
        assert_eq!(DurationTag::new(9030.0).formatted(false), "2h 30m");
        assert_eq!(DurationTag::new(45.0).formatted(false), "45s");
        assert_eq!(DurationTag::new(125.0).formatted(false), "2m 5s");
        assert_eq!(DurationTag::new(0.0).formatted(false), "forever");
        assert_eq!(DurationTag::new(0.456).formatted(false), "0.45s");
        assert_eq!(DurationTag::new(-45.0).formatted(false), "negative 45s");
        assert_eq!(DurationTag::new(90000.0).formatted(false), "1d 1h");
        assert_eq!(DurationTag::new(YEAR + DAY + HOUR).formatted(false), "1y 1d");
    }

    #[test]
    fn word_formatting() {
        assert_eq!(DurationTag::new(9030.0).formatted(true), "2 hours 30 minutes");
        assert_eq!(DurationTag::new(61.0).formatted(true), "1 minute 1 second");
    }

    #[test]
    fn ticks() {
        assert_eq!(DurationTag::from_ticks(40).seconds(), 2.0);
        assert_eq!(DurationTag::new(1.0).ticks(), 20);
    }
}

//! Points in time, UTC with millisecond precision.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, SecondsFormat, Timelike, Utc};

use crate::tag::context::TagContext;
use crate::tag::object::ObjectTag;
use crate::tag::registry::{Arity, Registry};

use super::list::strip_prefix_ci;
use super::{DurationTag, ElementTag};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeTag {
    millis: i64,
}

impl TimeTag {
    pub fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    pub fn now() -> Self {
        Self::from_millis(Utc::now().timestamp_millis())
    }

    pub fn epoch_millis(&self) -> i64 {
        self.millis
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.millis)
    }

    /// Parse `time@<RFC 3339>`, a bare RFC 3339 stamp, or epoch millis.
    pub fn value_of(text: &str) -> Option<Self> {
        let body = strip_prefix_ci(text.trim(), "time@").unwrap_or(text.trim());
        if let Ok(dt) = DateTime::parse_from_rfc3339(body) {
            return Some(Self::from_millis(dt.timestamp_millis()));
        }
        body.parse().ok().map(Self::from_millis)
    }

    pub fn identity(&self) -> String {
        match self.datetime() {
            Some(dt) => format!("time@{}", dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => format!("time@{}", self.millis),
        }
    }

    pub fn debug_form(&self) -> String {
        match self.datetime() {
            Some(dt) => format!("{} ({})", self.identity(), dt.format("%Y-%m-%d %H:%M:%S UTC")),
            None => self.identity(),
        }
    }

    /// Format with a strftime pattern; `None` if the pattern is invalid.
    pub fn format(&self, pattern: &str) -> Option<String> {
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return None;
        }
        Some(self.datetime()?.format(pattern).to_string())
    }

    pub fn plus(&self, d: &DurationTag) -> Self {
        Self::from_millis(self.millis.saturating_add(d.millis()))
    }

    pub(crate) fn parse_in(text: &str, _ctx: &TagContext) -> Option<Self> {
        Self::value_of(text)
    }
}

fn field(reg: &mut Registry, name: &'static str, get: fn(&DateTime<Utc>) -> i64) {
    reg.register::<TimeTag, _>(&[name], Arity::None, move |t, _| {
        Some(ElementTag::from(get(&t.datetime()?)).into())
    });
}

pub(super) fn register(reg: &mut Registry) {
    reg.register::<TimeTag, _>(&["epoch_millis"], Arity::None, |t, _| {
        Some(ElementTag::from(t.millis).into())
    });
    field(reg, "year", |dt| i64::from(dt.year()));
    field(reg, "month", |dt| i64::from(dt.month()));
    field(reg, "day", |dt| i64::from(dt.day()));
    field(reg, "hour", |dt| i64::from(dt.hour()));
    field(reg, "minute", |dt| i64::from(dt.minute()));
    field(reg, "second", |dt| i64::from(dt.second()));

    reg.register::<TimeTag, _>(&["add"], Arity::Required, |t, attr| {
        let d = attr.param_as::<DurationTag>()?;
        Some(t.plus(&d).into())
    });
    reg.register::<TimeTag, _>(&["sub"], Arity::Required, |t, attr| {
        let d = attr.param_as::<DurationTag>()?;
        Some(t.plus(&DurationTag::new(-d.seconds())).into())
    });
    reg.register::<TimeTag, _>(&["is_after"], Arity::Required, |t, attr| {
        let other = attr.param_as::<TimeTag>()?;
        Some(ElementTag::from(t > &other).into())
    });
    reg.register::<TimeTag, _>(&["is_before"], Arity::Required, |t, attr| {
        let other = attr.param_as::<TimeTag>()?;
        Some(ElementTag::from(t < &other).into())
    });
    reg.register::<TimeTag, _>(&["duration_since"], Arity::Required, |t, attr| {
        let other = attr.param_as::<TimeTag>()?;
        let millis = t.millis.checked_sub(other.millis)?;
        Some(DurationTag::new(millis as f64 / 1000.0).into())
    });
    reg.register::<TimeTag, _>(&["format"], Arity::Required, |t, attr| {
        let pattern = attr.param()?.identity();
        t.format(&pattern).map(ObjectTag::element)
    });
}

// ── Tests ─────────────────────────────────────────────────────────────────────

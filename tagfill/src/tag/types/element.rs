//! Plain text values.
//!
//! Every value can be treated as an element through its identity, so the
//! attributes registered here are the last stop of dispatch for all types.

use std::sync::OnceLock;

use regex::Regex;

use crate::tag::context::TagContext;
use crate::tag::object::ObjectTag;
use crate::tag::registry::{Arity, Registry};

use super::{DurationTag, ListTag};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ElementTag(String);

impl ElementTag {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn identity(&self) -> String {
        self.0.clone()
    }

    pub fn debug_form(&self) -> String {
        self.0.clone()
    }

    /// Whether the text is a plain decimal number (`1`, `-2.5`, `3e4`).
    pub fn is_decimal(&self) -> bool {
        static DECIMAL: OnceLock<Option<Regex>> = OnceLock::new();
        DECIMAL
            .get_or_init(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").ok())
            .as_ref()
            .is_some_and(|re| re.is_match(self.0.trim()))
    }

    pub fn as_f64(&self) -> Option<f64> {
        if !self.is_decimal() {
            return None;
        }
        self.0.trim().parse().ok()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.0.trim().parse().ok()
    }

    pub fn as_bool(&self) -> bool {
        self.0.trim().eq_ignore_ascii_case("true")
    }

    /// `false` only for empty text, `false`, `null` and numeric zero.
    pub fn is_truthy(&self) -> bool {
        let t = self.0.trim();
        !(t.is_empty()
            || t.eq_ignore_ascii_case("false")
            || t.eq_ignore_ascii_case("null")
            || self.as_f64() == Some(0.0))
    }

    pub(crate) fn parse_in(text: &str, _ctx: &TagContext) -> Option<Self> {
        Some(Self::new(text))
    }
}

/// Render a number the way element text shows it: integral values keep one
/// decimal place (`3.0`), everything else uses the shortest exact form.
pub fn format_number(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{x:.1}")
    } else {
        format!("{x}")
    }
}

impl From<f64> for ElementTag {
    fn from(x: f64) -> Self {
        Self(format_number(x))
    }
}

impl From<i64> for ElementTag {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl From<bool> for ElementTag {
    fn from(b: bool) -> Self {
        Self(b.to_string())
    }
}

impl From<&str> for ElementTag {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ElementTag {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ── Arithmetic ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

/// Integer operands stay integers while the result is exact.
fn arithmetic(a: &ElementTag, b: &ElementTag, op: Op) -> Option<ObjectTag> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        let exact = match op {
            Op::Add => x.checked_add(y),
            Op::Sub => x.checked_sub(y),
            Op::Mul => x.checked_mul(y),
            Op::Div => match x.checked_rem(y) {
                Some(0) => x.checked_div(y),
                _ => None,
            },
        };
        if let Some(n) = exact {
            return Some(ElementTag::from(n).into());
        }
    }
    let (x, y) = (a.as_f64()?, b.as_f64()?);
    let result = match op {
        Op::Add => x + y,
        Op::Sub => x - y,
        Op::Mul => x * y,
        Op::Div if y == 0.0 => return None,
        Op::Div => x / y,
    };
    result.is_finite().then(|| ElementTag::from(result).into())
}

// ── Attributes ────────────────────────────────────────────────────────────────

pub(super) fn register(reg: &mut Registry) {
    reg.register::<ElementTag, _>(&["length"], Arity::None, |e, _| {
        Some(ElementTag::from(e.0.chars().count() as i64).into())
    });
    reg.register::<ElementTag, _>(&["to_uppercase"], Arity::None, |e, _| {
        Some(ObjectTag::element(e.0.to_uppercase()))
    });
    reg.register::<ElementTag, _>(&["to_lowercase"], Arity::None, |e, _| {
        Some(ObjectTag::element(e.0.to_lowercase()))
    });

    for (name, op) in [("add", Op::Add), ("sub", Op::Sub), ("mul", Op::Mul), ("div", Op::Div)] {
        reg.register::<ElementTag, _>(&[name], Arity::Required, move |e, attr| {
            let other = attr.param_as::<ElementTag>()?;
            arithmetic(e, &other, op)
        });
    }

    reg.register::<ElementTag, _>(&["is_more_than"], Arity::Required, |e, attr| {
        let other = attr.param_as::<ElementTag>()?.as_f64()?;
        Some(ElementTag::from(e.as_f64()? > other).into())
    });
    reg.register::<ElementTag, _>(&["is_less_than"], Arity::Required, |e, attr| {
        let other = attr.param_as::<ElementTag>()?.as_f64()?;
        Some(ElementTag::from(e.as_f64()? < other).into())
    });
    reg.register::<ElementTag, _>(&["equals"], Arity::Required, |e, attr| {
        let other = attr.param_as::<ElementTag>()?;
        let same = match (e.as_f64(), other.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => e.0 == other.0,
        };
        Some(ElementTag::from(same).into())
    });
    reg.register::<ElementTag, _>(&["contains"], Arity::Required, |e, attr| {
        let needle = attr.param_as::<ElementTag>()?;
        let found = e.0.to_lowercase().contains(&needle.0.to_lowercase());
        Some(ElementTag::from(found).into())
    });
    reg.register::<ElementTag, _>(&["split"], Arity::Optional, |e, attr| {
        let sep = match attr.param_as::<ElementTag>() {
            Some(s) if !s.0.is_empty() => s.0,
            _ => " ".to_owned(),
        };
        let items = e.0.split(sep.as_str()).map(ObjectTag::element).collect();
        Some(ListTag::new(items).into())
    });
    reg.register::<ElementTag, _>(&["as_duration"], Arity::None, |e, _| {
        DurationTag::value_of(&e.0).map(ObjectTag::from)
    });
    reg.register::<ElementTag, _>(&["as_list"], Arity::None, |e, _| {
        Some(ListTag::from_text(&e.0).into())
    });
    reg.register::<ElementTag, _>(&["is_truthy"], Arity::None, |e, _| {
        Some(ElementTag::from(e.is_truthy()).into())
    });
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn el(s: &str) -> ElementTag {
        ElementTag::new(s)
    }

    #[test]
    fn number_display() {
        assert_eq!(format_number(3.0), "3.0");
        assert_eq!(format_number(-0.5), "-0.5");
        assert_eq!(format_number(1e20), "100000000000000000000");
    }

    #[test]
    fn decimal_detection() {
        assert!(el("12").is_decimal());
        assert!(el(" -2.5 ").is_decimal());
        assert!(el("3e4").is_decimal());
        assert!(!el("inf").is_decimal());
        assert!(!el("1.2.3").is_decimal());
        assert_eq!(el("NaN").as_f64(), None);
    }

    #[test]
    fn integer_arithmetic_stays_integral() {
        let r = |a, b, op| arithmetic(&el(a), &el(b), op).map(|o| o.identity());
        assert_eq!(r("1", "2", Op::Add), Some("3".into()));
        assert_eq!(r("7", "2", Op::Sub), Some("5".into()));
        assert_eq!(r("6", "3", Op::Div), Some("2".into()));
        assert_eq!(r("7", "2", Op::Div), Some("3.5".into()));
        assert_eq!(r("1.5", "2", Op::Mul), Some("3.0".into()));
        assert_eq!(r("1", "0", Op::Div), None);
        assert_eq!(r("x", "1", Op::Add), None);
    }

    #[test]
    fn truthiness() {
        assert!(el("yes").is_truthy());
        assert!(!el("").is_truthy());
        assert!(!el("FALSE").is_truthy());
        assert!(!el("0.0").is_truthy());
        assert!(el("true").as_bool());
    }
}

//! The predicate algebra describing temporal patterns.
//!
//! A [`Predicate`] is a value tree built by an external parser through the
//! smart constructors below and handed to the resolver per query. Patterns
//! compose by intersection: field constraints unify into a single bag when
//! possible (`hour(4) ∧ month(3)` stays one [`TimeDate`]), conflicting
//! constraints collapse to [`Predicate::Empty`], and anything else nests as
//! an explicit intersection node evaluated by the composer.

use std::fmt;
use std::sync::Arc;

use crate::series::{self, SeriesFn, SeriesPair, TimeContext};
use crate::interval::TimeObject;

// ── Field types ─────────────────────────────────────────────────────────────

/// The half of the day an hour belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmPm {
    Am,
    Pm,
}

/// A bag of calendar-field constraints, all of which must hold.
///
/// At least one field is set. `ampm` is meaningful only together with
/// `hour`, where it disambiguates a 12-hour literal; on its own it is
/// unsatisfiable (use [`Predicate::half_day`] for the standalone
/// morning/afternoon block).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeDate {
    /// Second of minute, 0–59.
    pub second: Option<u32>,
    /// Minute of hour, 0–59.
    pub minute: Option<u32>,
    /// `(is_12h, hour)`: whether the literal was in 12-hour form, and the
    /// bare hour value (0–23 for 24-hour form, 1–12 for 12-hour form).
    pub hour: Option<(bool, u32)>,
    pub ampm: Option<AmPm>,
    /// ISO weekday, 1 = Monday … 7 = Sunday.
    pub day_of_week: Option<u32>,
    /// Day of month, 1–31.
    pub day_of_month: Option<u32>,
    /// Month of year, 1–12.
    pub month: Option<u32>,
    pub year: Option<i32>,
}

// ── Predicate ───────────────────────────────────────────────────────────────

/// A symbolic temporal pattern.
#[derive(Clone)]
pub enum Predicate {
    /// Matches nothing.
    Empty,
    /// An opaque producer of bidirectional match sequences.
    Series(SeriesFn),
    /// Calendar-field constraints, unified into one bag.
    TimeDate(TimeDate),
    /// Conjunction of two patterns. The first operand is expected to be
    /// the finer-grained one; evaluation walks the coarser side and
    /// searches the finer side within each of its hits.
    Intersect(Box<Predicate>, Box<Predicate>),
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Empty => f.write_str("Empty"),
            Predicate::Series(_) => f.write_str("Series(..)"),
            Predicate::TimeDate(td) => f.debug_tuple("TimeDate").field(td).finish(),
            Predicate::Intersect(a, b) => {
                f.debug_tuple("Intersect").field(a).field(b).finish()
            }
        }
    }
}

impl Predicate {
    /// Second of minute, 0–59.
    pub fn second(n: u32) -> Predicate {
        Predicate::TimeDate(TimeDate { second: Some(n), ..TimeDate::default() })
    }

    /// Minute of hour, 0–59.
    pub fn minute(n: u32) -> Predicate {
        Predicate::TimeDate(TimeDate { minute: Some(n), ..TimeDate::default() })
    }

    /// Hour of day. `is_12h` records that the literal was written in
    /// 12-hour form (so a bare "at 4" can mean 4 am or 4 pm until an
    /// intersection with [`Predicate::ampm`] pins it down).
    pub fn hour(is_12h: bool, n: u32) -> Predicate {
        Predicate::TimeDate(TimeDate { hour: Some((is_12h, n)), ..TimeDate::default() })
    }

    /// An am/pm marker, to be intersected with an hour constraint.
    pub fn ampm(m: AmPm) -> Predicate {
        Predicate::TimeDate(TimeDate { ampm: Some(m), ..TimeDate::default() })
    }

    /// ISO weekday, 1 = Monday … 7 = Sunday.
    pub fn day_of_week(n: u32) -> Predicate {
        Predicate::TimeDate(TimeDate { day_of_week: Some(n), ..TimeDate::default() })
    }

    /// Day of month, 1–31. Months too short for the day are skipped.
    pub fn day_of_month(n: u32) -> Predicate {
        Predicate::TimeDate(TimeDate { day_of_month: Some(n), ..TimeDate::default() })
    }

    /// Month of year, 1–12.
    pub fn month(n: u32) -> Predicate {
        Predicate::TimeDate(TimeDate { month: Some(n), ..TimeDate::default() })
    }

    /// A specific year. Two-digit values map into the 100-year window
    /// ending 50 years after 2000 ("13" means 2013, "63" means 1963).
    pub fn year(n: i32) -> Predicate {
        Predicate::TimeDate(TimeDate { year: Some(n), ..TimeDate::default() })
    }

    /// The morning (`Am`, midnight to noon) or afternoon-evening (`Pm`,
    /// noon to midnight) half of each day, as explicit 12-hour intervals.
    pub fn half_day(m: AmPm) -> Predicate {
        Predicate::Series(series::half_day(m))
    }

    /// An opaque series predicate from a producer function.
    pub fn from_series<F>(f: F) -> Predicate
    where
        F: Fn(TimeObject, TimeContext) -> SeriesPair + Send + Sync + 'static,
    {
        Predicate::Series(Arc::new(f))
    }

    /// The conjunction of two patterns.
    ///
    /// Field bags unify field by field; a field set on both sides with
    /// different values makes the conjunction unsatisfiable and the whole
    /// intersection collapses to [`Predicate::Empty`]. Put the finer
    /// pattern first: the evaluator searches the first operand within each
    /// hit of the second.
    pub fn intersect(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::Empty, _) | (_, Predicate::Empty) => Predicate::Empty,
            (Predicate::TimeDate(a), Predicate::TimeDate(b)) => match unify(&a, &b) {
                Some(td) => Predicate::TimeDate(td),
                None => Predicate::Empty,
            },
            (a, b) => Predicate::Intersect(Box::new(a), Box::new(b)),
        }
    }
}

// ── Unification ─────────────────────────────────────────────────────────────

fn unify(a: &TimeDate, b: &TimeDate) -> Option<TimeDate> {
    Some(TimeDate {
        second: unify_field(a.second, b.second)?,
        minute: unify_field(a.minute, b.minute)?,
        hour: unify_field(a.hour, b.hour)?,
        ampm: unify_field(a.ampm, b.ampm)?,
        day_of_week: unify_field(a.day_of_week, b.day_of_week)?,
        day_of_month: unify_field(a.day_of_month, b.day_of_month)?,
        month: unify_field(a.month, b.month)?,
        year: unify_field(a.year, b.year)?,
    })
}

fn unify_field<T: PartialEq + Copy>(x: Option<T>, y: Option<T>) -> Option<Option<T>> {
    match (x, y) {
        (None, None) => Some(None),
        (Some(v), None) | (None, Some(v)) => Some(Some(v)),
        (Some(v), Some(w)) if v == w => Some(Some(v)),
        _ => None,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn as_time_date(p: &Predicate) -> &TimeDate {
        match p {
            Predicate::TimeDate(td) => td,
            other => panic!("expected TimeDate, got {other:?}"),
        }
    }

    #[test]
    fn test_field_constructors_set_exactly_one_field() {
        let p = Predicate::month(3);
        let td = as_time_date(&p);
        assert_eq!(td.month, Some(3));
        assert_eq!(*td, TimeDate { month: Some(3), ..TimeDate::default() });
    }

    #[test]
    fn test_intersect_unifies_disjoint_fields() {
        let p = Predicate::hour(true, 4).intersect(Predicate::ampm(AmPm::Pm));
        let td = as_time_date(&p);
        assert_eq!(td.hour, Some((true, 4)));
        assert_eq!(td.ampm, Some(AmPm::Pm));
    }

    #[test]
    fn test_intersect_keeps_equal_fields() {
        let p = Predicate::month(3).intersect(Predicate::month(3));
        assert_eq!(as_time_date(&p).month, Some(3));
    }

    #[test]
    fn test_intersect_conflicting_fields_collapses_to_empty() {
        let p = Predicate::month(3).intersect(Predicate::month(4));
        assert!(matches!(p, Predicate::Empty));
    }

    #[test]
    fn test_intersect_with_empty_is_empty() {
        let p = Predicate::Empty.intersect(Predicate::month(3));
        assert!(matches!(p, Predicate::Empty));
        let p = Predicate::month(3).intersect(Predicate::Empty);
        assert!(matches!(p, Predicate::Empty));
    }

    #[test]
    fn test_intersect_with_series_nests() {
        let p = Predicate::hour(true, 4).intersect(Predicate::half_day(AmPm::Pm));
        assert!(matches!(p, Predicate::Intersect(_, _)));
    }

    quickcheck::quickcheck! {
        fn prop_conflicting_unification_is_empty(a: u32, b: u32) -> bool {
            let a = a % 12 + 1;
            let b = b % 12 + 1;
            let p = Predicate::month(a).intersect(Predicate::month(b));
            if a == b {
                matches!(p, Predicate::TimeDate(_))
            } else {
                matches!(p, Predicate::Empty)
            }
        }
    }
}

//! Half-open calendar intervals and grain arithmetic.
//!
//! All arithmetic here operates on `chrono::NaiveDateTime` in the caller's
//! wall-clock frame. Grains of a day and coarser shift calendar fields
//! (month shifts clamp to the last valid day of the target month); hours
//! and finer are plain duration arithmetic. The zone series never enters:
//! it is re-attached when values are rendered.

use chrono::{Datelike, Days, Duration, Months, NaiveDateTime, NaiveTime, Timelike};

use crate::grain::Grain;

// ── TimeObject ──────────────────────────────────────────────────────────────

/// A half-open calendar interval: a start instant, its natural grain, and
/// an optional explicit end overriding the implicit one-grain width.
///
/// When `end` is present it is strictly after `start`, and `grain` records
/// the finest granularity that contributed to the interval (intersections
/// keep the finer operand's grain for rendering).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeObject {
    pub start: NaiveDateTime,
    pub grain: Grain,
    pub end: Option<NaiveDateTime>,
}

/// End semantics for [`TimeObject::span`]: whether the second operand's
/// start or its end closes the interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalKind {
    Open,
    Closed,
}

impl TimeObject {
    /// A one-grain-wide interval starting at `start`.
    pub fn instant(start: NaiveDateTime, grain: Grain) -> TimeObject {
        TimeObject { start, grain, end: None }
    }

    /// The exclusive end: the explicit end when present, otherwise the
    /// start shifted by one unit of the natural grain.
    pub fn end_instant(&self) -> NaiveDateTime {
        self.end.unwrap_or_else(|| grain_add(self.start, self.grain, 1))
    }

    /// Truncate toward the epoch to the given grain.
    ///
    /// Weeks round to the Monday of the ISO week containing the start;
    /// quarters to the first month of the calendar quarter. The result has
    /// no explicit end.
    pub fn round(&self, grain: Grain) -> TimeObject {
        TimeObject { start: truncate(self.start, grain), grain, end: None }
    }

    /// Shift by `n` units of `grain`, keeping the finer of the two grains
    /// and dropping any explicit end.
    pub fn plus(&self, grain: Grain, n: i64) -> TimeObject {
        TimeObject {
            start: grain_add(self.start, grain, n),
            grain: self.grain.min(grain),
            end: None,
        }
    }

    /// Same interval viewed at a different grain.
    pub fn with_grain(self, grain: Grain) -> TimeObject {
        TimeObject { grain, ..self }
    }

    /// Whether this interval starts before `other` is over.
    pub fn starts_before_end_of(&self, other: &TimeObject) -> bool {
        self.start < other.end_instant()
    }

    /// The overlap of two intervals, if any, at the finer of their grains.
    ///
    /// The end of the overlap prefers the operand that finishes first, and
    /// on identical bounds prefers an explicit end over an implicit width.
    /// Intersecting a day with an hour inside it therefore yields the hour.
    pub fn intersect(&self, other: &TimeObject) -> Option<TimeObject> {
        let (a, b) = if self.start <= other.start { (self, other) } else { (other, self) };
        let a_end = a.end_instant();
        if a_end <= b.start {
            return None;
        }
        let b_end = b.end_instant();
        let end = if a_end < b_end || (a_end == b_end && a.end.is_some()) {
            a.end
        } else {
            b.end
        };
        Some(TimeObject { start: b.start, grain: a.grain.min(b.grain), end })
    }

    /// An explicit interval from the start of `from` up to `to`: its start
    /// (`Open`) or its end (`Closed`).
    pub fn span(kind: IntervalKind, from: &TimeObject, to: &TimeObject) -> TimeObject {
        let end = match kind {
            IntervalKind::Open => to.start,
            IntervalKind::Closed => to.end_instant(),
        };
        TimeObject {
            start: from.start,
            grain: from.grain.min(to.grain),
            end: Some(end),
        }
    }
}

// ── Grain arithmetic ────────────────────────────────────────────────────────

/// Shift an instant by `n` units of `grain`.
///
/// Seconds through weeks are fixed durations on the wall clock; months,
/// quarters and years shift the calendar fields, clamping the day of month
/// to the last valid day of the target month (Jan 31 + 1 month = Feb 28,
/// or Feb 29 in a leap year).
pub fn grain_add(t: NaiveDateTime, grain: Grain, n: i64) -> NaiveDateTime {
    let shifted = match grain {
        Grain::Second => t.checked_add_signed(Duration::seconds(n)),
        Grain::Minute => t.checked_add_signed(Duration::minutes(n)),
        Grain::Hour => t.checked_add_signed(Duration::hours(n)),
        Grain::Day => t.checked_add_signed(Duration::days(n)),
        Grain::Week => t.checked_add_signed(Duration::days(7 * n)),
        Grain::Month => add_months(t, n),
        Grain::Quarter => add_months(t, 3 * n),
        Grain::Year => add_months(t, 12 * n),
    };
    shifted.unwrap_or(t)
}

fn add_months(t: NaiveDateTime, n: i64) -> Option<NaiveDateTime> {
    let date = if n >= 0 {
        t.date().checked_add_months(Months::new(n as u32))
    } else {
        t.date().checked_sub_months(Months::new(n.unsigned_abs() as u32))
    };
    date.map(|d| d.and_time(t.time()))
}

fn truncate(t: NaiveDateTime, grain: Grain) -> NaiveDateTime {
    let date = t.date();
    match grain {
        Grain::Second => t.with_nanosecond(0).unwrap_or(t),
        Grain::Minute => date
            .and_hms_opt(t.hour(), t.minute(), 0)
            .unwrap_or(t),
        Grain::Hour => date.and_hms_opt(t.hour(), 0, 0).unwrap_or(t),
        Grain::Day => date.and_time(NaiveTime::MIN),
        Grain::Week => {
            let monday = date - Days::new(u64::from(date.weekday().num_days_from_monday()));
            monday.and_time(NaiveTime::MIN)
        }
        Grain::Month => date.with_day(1).unwrap_or(date).and_time(NaiveTime::MIN),
        Grain::Quarter => {
            let first = date.with_day(1).unwrap_or(date);
            let back = i64::from(first.month0() % 3);
            add_months(first.and_time(NaiveTime::MIN), -back)
                .unwrap_or_else(|| first.and_time(NaiveTime::MIN))
        }
        Grain::Year => date
            .with_day(1)
            .and_then(|d| d.with_month(1))
            .unwrap_or(date)
            .and_time(NaiveTime::MIN),
    }
}

/// Number of days in the month containing `t`.
pub(crate) fn days_in_month(t: NaiveDateTime) -> u32 {
    let first = t.date().with_day(1).unwrap_or_else(|| t.date());
    match first.checked_add_months(Months::new(1)).and_then(|d| d.pred_opt()) {
        Some(last) => last.day(),
        None => 28,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

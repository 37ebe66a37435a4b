//! Bidirectional lazy evaluation of predicates.
//!
//! Running a predicate against a reference yields two lazy sequences of
//! matches: `past`, strictly decreasing in start, and `future`,
//! non-decreasing in start. The boundary is the reference instant: a match
//! still running at the reference (its end is after the reference start)
//! belongs to the future, so "today" is the first future hit of a
//! day-grained pattern.
//!
//! Field runners anchor themselves with modular arithmetic on the rounded
//! reference and then step a fixed period in both directions. Intersections
//! walk the coarser side and re-run the finer side inside each coarse hit
//! with the context narrowed to it; [`SAFE_MAX`] bounds how many coarse
//! hits per direction are searched, which is what keeps patterns with no
//! intersection anywhere ("February 30th") from diverging.

use std::iter;
use std::sync::Arc;

use chrono::{Datelike, Timelike};

use crate::grain::Grain;
use crate::interval::{days_in_month, IntervalKind, TimeObject};
use crate::predicate::{AmPm, Predicate, TimeDate};

// ── Evaluation context ──────────────────────────────────────────────────────

/// The window a query is evaluated in: the pinned reference plus bounds
/// that producers and the composer may not look beyond.
#[derive(Debug, Clone, Copy)]
pub struct TimeContext {
    pub reference: TimeObject,
    pub min: TimeObject,
    pub max: TimeObject,
}

impl TimeContext {
    /// A context spanning 2000 years on each side of the reference.
    pub fn around(reference: TimeObject) -> TimeContext {
        TimeContext {
            reference,
            min: reference.plus(Grain::Year, -2000),
            max: reference.plus(Grain::Year, 2000),
        }
    }
}

/// A lazy, possibly infinite sequence of matches.
pub type TimeSeq = Box<dyn Iterator<Item = TimeObject>>;

/// `(past, future)` around a reference.
pub type SeriesPair = (TimeSeq, TimeSeq);

/// A compiled predicate: evaluates to a pair of match sequences.
///
/// Producers are cheap to re-instantiate; the composer re-runs the inner
/// producer once per outer hit with a narrowed context.
pub type SeriesFn = Arc<dyn Fn(TimeObject, TimeContext) -> SeriesPair + Send + Sync>;

/// How many coarse hits per direction an intersection searches before
/// giving up.
pub(crate) const SAFE_MAX: usize = 10;

// ── Evaluator ───────────────────────────────────────────────────────────────

/// Compile a predicate into its series function.
pub fn run(predicate: &Predicate) -> SeriesFn {
    match predicate {
        Predicate::Empty => empty(),
        Predicate::Series(f) => f.clone(),
        Predicate::TimeDate(td) => run_time_date(td),
        Predicate::Intersect(fine, coarse) => compose(run(fine), run(coarse)),
    }
}

fn empty() -> SeriesFn {
    Arc::new(|_, _| {
        (
            Box::new(iter::empty()) as TimeSeq,
            Box::new(iter::empty()) as TimeSeq,
        )
    })
}

/// Field bags compose finest-first, so the tighter producer ends up on the
/// searching side of every intersection.
fn run_time_date(td: &TimeDate) -> SeriesFn {
    if td.ampm.is_some() && td.hour.is_none() {
        // a bare am/pm marker constrains nothing; only together with an
        // hour does it pick a half of the day
        return empty();
    }
    let mut runners: Vec<SeriesFn> = Vec::new();
    if let Some(n) = td.second {
        runners.push(run_second(n));
    }
    if let Some(n) = td.minute {
        runners.push(run_minute(n));
    }
    if let Some((is_12h, n)) = td.hour {
        runners.push(run_hour(td.ampm, is_12h, n));
    }
    if let Some(n) = td.day_of_week {
        runners.push(run_day_of_week(n));
    }
    if let Some(n) = td.day_of_month {
        runners.push(run_day_of_month(n));
    }
    if let Some(n) = td.month {
        runners.push(run_month(n));
    }
    if let Some(n) = td.year {
        runners.push(run_year(n));
    }
    match runners.into_iter().rev().reduce(|acc, runner| compose(runner, acc)) {
        Some(f) => f,
        None => empty(),
    }
}

// ── Composer ────────────────────────────────────────────────────────────────

/// Intersection of two series: for each hit of the coarse side, search the
/// fine side within it.
///
/// Coarse hits are cut to the context bounds and capped at [`SAFE_MAX`] per
/// direction. Each one becomes the local reference and the whole context
/// for a fresh run of the fine side, whose future hits inside the coarse
/// window are intersected with it. Per-window hits run forward in time, so
/// the past direction reverses each window's yield to keep the global
/// ordering decreasing.
fn compose(fine: SeriesFn, coarse: SeriesFn) -> SeriesFn {
    Arc::new(move |t, ctx| {
        let (past, future) = coarse(t, ctx);

        let inner = fine.clone();
        let forward = future
            .take_while(move |outer| outer.starts_before_end_of(&ctx.max))
            .take(SAFE_MAX)
            .flat_map(move |outer| {
                let narrowed = TimeContext { min: outer, max: outer, ..ctx };
                let (_, hits) = inner(outer, narrowed);
                hits.take_while(move |hit| hit.starts_before_end_of(&outer))
                    .filter_map(move |hit| hit.intersect(&outer))
            });

        let inner = fine.clone();
        let backward = past
            .take_while(move |outer| ctx.min.starts_before_end_of(outer))
            .take(SAFE_MAX)
            .flat_map(move |outer| {
                let narrowed = TimeContext { min: outer, max: outer, ..ctx };
                let (_, hits) = inner(outer, narrowed);
                let mut found: Vec<TimeObject> = hits
                    .take_while(|hit| hit.starts_before_end_of(&outer))
                    .filter_map(|hit| hit.intersect(&outer))
                    .collect();
                found.reverse();
                found.into_iter()
            });

        (Box::new(backward) as TimeSeq, Box::new(forward) as TimeSeq)
    })
}

// ── Field runners ───────────────────────────────────────────────────────────

/// Anchor plus a fixed step in each direction. The anchor itself opens the
/// future; the past starts one step behind it.
fn time_sequence(grain: Grain, step: i64, anchor: TimeObject) -> SeriesPair {
    let past = iter::successors(Some(anchor.plus(grain, -step)), move |t| {
        Some(t.plus(grain, -step))
    });
    let future = iter::successors(Some(anchor), move |t| Some(t.plus(grain, step)));
    (Box::new(past) as TimeSeq, Box::new(future) as TimeSeq)
}

fn run_second(n: u32) -> SeriesFn {
    Arc::new(move |t, _| {
        let offset = (i64::from(n) - i64::from(t.start.second())).rem_euclid(60);
        let anchor = t.round(Grain::Second).plus(Grain::Second, offset);
        time_sequence(Grain::Minute, 1, anchor)
    })
}

fn run_minute(n: u32) -> SeriesFn {
    Arc::new(move |t, _| {
        let offset = (i64::from(n) - i64::from(t.start.minute())).rem_euclid(60);
        let anchor = t.round(Grain::Minute).plus(Grain::Minute, offset);
        time_sequence(Grain::Hour, 1, anchor)
    })
}

/// Hours step by 12 when the literal was ambiguous 12-hour form ("at 4"),
/// by 24 once an am/pm marker or a 24-hour literal pins the half of day.
fn run_hour(ampm: Option<AmPm>, is_12h: bool, n: u32) -> SeriesFn {
    Arc::new(move |t, _| {
        let step = if is_12h && n <= 12 && ampm.is_none() { 12 } else { 24 };
        let hour = match ampm {
            Some(AmPm::Am) => i64::from(n % 12),
            Some(AmPm::Pm) => i64::from(n % 12) + 12,
            None => i64::from(n),
        };
        let offset = (hour - i64::from(t.start.hour())).rem_euclid(step);
        let anchor = t.round(Grain::Hour).plus(Grain::Hour, offset);
        time_sequence(Grain::Hour, step, anchor)
    })
}

fn run_day_of_week(n: u32) -> SeriesFn {
    Arc::new(move |t, _| {
        let today = i64::from(t.start.weekday().number_from_monday());
        let offset = (i64::from(n) - today).rem_euclid(7);
        let anchor = t.round(Grain::Day).plus(Grain::Day, offset);
        time_sequence(Grain::Day, 7, anchor)
    })
}

/// Months shorter than the wanted day are skipped, so "the 30th" never
/// lands in February.
fn run_day_of_month(n: u32) -> SeriesFn {
    Arc::new(move |t, _| {
        let rounded = t.round(Grain::Month);
        let anchor = if t.start.day() > n { rounded.plus(Grain::Month, 1) } else { rounded };
        let long_enough = move |month: &TimeObject| days_in_month(month.start) >= n;
        let to_day = move |month: TimeObject| month.plus(Grain::Day, i64::from(n) - 1);
        let future = iter::successors(Some(anchor), |m| Some(m.plus(Grain::Month, 1)))
            .filter(long_enough)
            .map(to_day);
        let past = iter::successors(Some(anchor.plus(Grain::Month, -1)), |m| {
            Some(m.plus(Grain::Month, -1))
        })
        .filter(long_enough)
        .map(to_day);
        (Box::new(past) as TimeSeq, Box::new(future) as TimeSeq)
    })
}

fn run_month(n: u32) -> SeriesFn {
    Arc::new(move |t, _| {
        let this_year = t.round(Grain::Year).plus(Grain::Month, i64::from(n) - 1);
        let anchor = if t.starts_before_end_of(&this_year) {
            this_year
        } else {
            this_year.plus(Grain::Year, 1)
        };
        time_sequence(Grain::Year, 1, anchor)
    })
}

/// A single year-grained match: ahead of the reference year it is the sole
/// future element, behind it the sole past element. Two-digit years map
/// into the 100-year window ending 50 years after 2000.
fn run_year(n: i32) -> SeriesFn {
    Arc::new(move |t, _| {
        let year = if (0..=99).contains(&n) { (n + 50).rem_euclid(100) + 1950 } else { n };
        let target = t
            .round(Grain::Year)
            .plus(Grain::Year, i64::from(year) - i64::from(t.start.year()));
        if year >= t.start.year() {
            (
                Box::new(iter::empty()) as TimeSeq,
                Box::new(iter::once(target)) as TimeSeq,
            )
        } else {
            (
                Box::new(iter::once(target)) as TimeSeq,
                Box::new(iter::empty()) as TimeSeq,
            )
        }
    })
}

/// The morning or afternoon-evening half of each day, as explicit 12-hour
/// intervals 24 hours apart. The first interval in each direction is
/// clipped against the day-wide window opening at the reference, so "this
/// afternoon" never starts in the past; a first interval the window misses
/// entirely (the block already over when the reference sits late in the
/// day) is dropped rather than allowed to leak across the boundary.
pub(crate) fn half_day(m: AmPm) -> SeriesFn {
    Arc::new(move |t, _| {
        let base = match m {
            AmPm::Am => 0,
            AmPm::Pm => 12,
        };
        let day = t.round(Grain::Day);
        let block = move |k: i64| {
            let from = day.plus(Grain::Hour, 24 * k + base);
            let to = day.plus(Grain::Hour, 24 * k + base + 12);
            TimeObject::span(IntervalKind::Open, &from, &to)
        };
        let window = t.with_grain(Grain::Day);
        let future = block(0)
            .intersect(&window)
            .into_iter()
            .chain((1..).map(block));
        let past = block(-1)
            .intersect(&window)
            .into_iter()
            .chain((2..).map(move |k| block(-k)));
        (Box::new(past) as TimeSeq, Box::new(future) as TimeSeq)
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────

//! Resolution: from a predicate and a pinned "now" to one answer.
//!
//! The caller provides the reference instant explicitly (no system clock
//! access), keeping resolution deterministic and testable. Evaluation runs
//! on the reference's wall clock inside a ±2000-year window; the chosen
//! match is the first future hit, stepping over a hit the reference is
//! currently inside when the query asked for "the next one, not the
//! current one". With no future at all, the most recent past hit answers.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::{KairosError, Result};
use crate::grain::Grain;
use crate::interval::TimeObject;
use crate::predicate::Predicate;
use crate::series::{run, TimeContext};
use crate::value::{Direction, SingleTimeValue, TimeValue};

// ── Query inputs ────────────────────────────────────────────────────────────

/// Surface-form metadata attached by the parser. Resolution carries it
/// through untouched; rules use it to steer composition before the
/// predicate ever reaches this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    TimeOfDay { is_12h: bool },
    DayOfWeek,
    Month(u32),
    PartOfDay,
}

/// A parsed temporal query: the predicate plus resolution flags.
#[derive(Debug, Clone)]
pub struct TimeData {
    pub predicate: Predicate,
    /// Latent patterns ("in the 30s" heard as a year) resolve to nothing
    /// unless the caller opts in upstream.
    pub latent: bool,
    /// The coarsest grain the pattern pins down, for rendering decisions
    /// upstream.
    pub grain: Grain,
    /// "Tuesday" means next Tuesday, not today: skip a first hit that the
    /// reference is currently inside.
    pub not_immediate: bool,
    pub form: Option<Form>,
    /// Half-bounded reading: "before five" / "after five".
    pub direction: Option<Direction>,
}

impl TimeData {
    pub fn new(predicate: Predicate, grain: Grain) -> TimeData {
        TimeData {
            predicate,
            latent: false,
            grain,
            not_immediate: false,
            form: None,
            direction: None,
        }
    }
}

/// The query-time environment: the zoned reference instant. The zone it
/// carries is the IANA series used for output rendering.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub reference: DateTime<Tz>,
}

impl Context {
    pub fn new(reference: DateTime<Tz>) -> Context {
        Context { reference }
    }

    /// Build a context from an RFC 3339 reference and an IANA zone name.
    ///
    /// # Errors
    ///
    /// Returns [`KairosError::InvalidDatetime`] if the reference string
    /// cannot be parsed, or [`KairosError::InvalidTimezone`] if the zone
    /// name is not a valid IANA timezone.
    pub fn try_new(reference: &str, timezone: &str) -> Result<Context> {
        let tz = parse_timezone(timezone)?;
        let dt = parse_rfc3339(reference)?;
        Ok(Context { reference: dt.with_timezone(&tz) })
    }
}

/// Parse an RFC 3339 datetime string into `DateTime<Utc>`.
fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| KairosError::InvalidDatetime(format!("'{}': {}", s, e)))
}

/// Parse an IANA timezone string into `Tz`.
fn parse_timezone(s: &str) -> Result<Tz> {
    s.parse::<Tz>()
        .map_err(|_| KairosError::InvalidTimezone(s.to_string()))
}

// ── Resolution ──────────────────────────────────────────────────────────────

/// Resolve a query to its answer and up to three upcoming alternatives.
///
/// `None` means no resolution: a latent query, an unsatisfiable pattern,
/// or no match within the evaluation window on either side.
pub fn resolve(data: &TimeData, context: &Context) -> Option<TimeValue> {
    if data.latent {
        return None;
    }

    let reference = TimeObject::instant(context.reference.naive_local(), Grain::Second);
    let ctx = TimeContext::around(reference);
    let (mut past, future) = run(&data.predicate)(reference, ctx);

    // one chosen, up to three following it, one spare for the immediate skip
    let ahead: Vec<TimeObject> = future.take(5).collect();

    let (chosen, rest) = match ahead.first() {
        None => (past.next()?, &[][..]),
        Some(&first) => {
            if data.not_immediate && ahead.len() > 1 && first.intersect(&reference).is_some() {
                (ahead[1], &ahead[2..])
            } else {
                (first, &ahead[1..])
            }
        }
    };

    let tz = context.reference.timezone();
    let render = |t: &TimeObject| SingleTimeValue::from_time_object(t, data.direction, tz);
    Some(TimeValue {
        chosen: render(&chosen),
        alternatives: rest.iter().take(3).map(render).collect(),
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────

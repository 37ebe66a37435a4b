//! Resolved output values and their JSON rendering.
//!
//! The engine computes on the reference's wall clock; this module is where
//! the zone comes back. Wall-clock instants are localized against the IANA
//! zone series (DST-aware, total: spring-forward gaps resolve to the first
//! instant after the transition, fall-back ambiguities to the earlier
//! offset) and rendered as RFC 3339 with three-digit milliseconds and a
//! colon-separated offset.
//!
//! The JSON schema is stable:
//!
//! ```json
//! {"type": "value", "value": "2013-02-12T16:00:00.000-08:00", "grain": "hour"}
//! {"type": "interval", "from": {...}, "to": {...}}
//! ```
//!
//! and a resolved [`TimeValue`] is its chosen value's object with a
//! `"values"` array of the alternatives appended.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::grain::Grain;
use crate::interval::TimeObject;

// ── Localization ────────────────────────────────────────────────────────────

/// Attach the zone to a wall-clock instant.
///
/// Total by policy: a wall time skipped by a spring-forward transition maps
/// to the first valid instant after the gap, an ambiguous fall-back wall
/// time to its earlier offset.
pub(crate) fn localize(tz: Tz, t: NaiveDateTime) -> DateTime<Tz> {
    tz.from_local_datetime(&t)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(t + Duration::hours(1))).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(&t))
}

// ── Value types ─────────────────────────────────────────────────────────────

/// Which side of the anchor an open interval extends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Before,
    After,
}

/// A grain-qualified instant in a named zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantValue {
    pub value: DateTime<Tz>,
    pub grain: Grain,
}

impl InstantValue {
    pub fn new(value: DateTime<Tz>, grain: Grain) -> InstantValue {
        InstantValue { value, grain }
    }

    /// `YYYY-MM-DDTHH:MM:SS.sss±HH:MM`, offset taken from the zone series
    /// at this instant.
    pub fn rfc3339(&self) -> String {
        self.value.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
    }
}

/// One resolved match: a point, a closed interval, or a half-bounded one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SingleTimeValue {
    Simple(InstantValue),
    Interval { from: InstantValue, to: InstantValue },
    OpenInterval { anchor: InstantValue, direction: Direction },
}

impl SingleTimeValue {
    /// Render a match in the given zone. A direction makes it half-bounded
    /// at the match's start; otherwise an explicit end becomes a closed
    /// interval and a bare start a point.
    pub(crate) fn from_time_object(
        t: &TimeObject,
        direction: Option<Direction>,
        tz: Tz,
    ) -> SingleTimeValue {
        let instant = |at: NaiveDateTime| InstantValue::new(localize(tz, at), t.grain);
        match direction {
            Some(direction) => SingleTimeValue::OpenInterval {
                anchor: instant(t.start),
                direction,
            },
            None => match t.end {
                Some(end) => SingleTimeValue::Interval {
                    from: instant(t.start),
                    to: instant(end),
                },
                None => SingleTimeValue::Simple(instant(t.start)),
            },
        }
    }

    fn entries<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        match self {
            SingleTimeValue::Simple(instant) => {
                map.serialize_entry("type", "value")?;
                map.serialize_entry("value", &instant.rfc3339())?;
                map.serialize_entry("grain", &instant.grain)?;
            }
            SingleTimeValue::Interval { from, to } => {
                map.serialize_entry("type", "interval")?;
                map.serialize_entry("from", from)?;
                map.serialize_entry("to", to)?;
            }
            SingleTimeValue::OpenInterval { anchor, direction } => {
                map.serialize_entry("type", "interval")?;
                let side = match direction {
                    Direction::Before => "to",
                    Direction::After => "from",
                };
                map.serialize_entry(side, anchor)?;
            }
        }
        Ok(())
    }
}

/// The chosen match plus a small lookahead of alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeValue {
    pub chosen: SingleTimeValue,
    pub alternatives: Vec<SingleTimeValue>,
}

// ── Serialization ───────────────────────────────────────────────────────────

impl Serialize for InstantValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("value", &self.rfc3339())?;
        map.serialize_entry("grain", &self.grain)?;
        map.end()
    }
}

impl Serialize for SingleTimeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.entries(&mut map)?;
        map.end()
    }
}

impl Serialize for TimeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.chosen.entries(&mut map)?;
        map.serialize_entry("values", &self.alternatives)?;
        map.end()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    const LA: Tz = chrono_tz::America::Los_Angeles;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    // ── localization tests ──────────────────────────────────────────────

    #[test]
    fn test_localize_standard_time() {
        let got = localize(LA, dt(2013, 2, 12, 16, 0, 0));
        assert_eq!(got.to_string(), "2013-02-12 16:00:00 PST");
    }

    #[test]
    fn test_localize_daylight_time() {
        let v = InstantValue::new(localize(LA, dt(2013, 7, 1, 12, 0, 0)), Grain::Hour);
        assert!(v.rfc3339().ends_with("-07:00"), "got: {}", v.rfc3339());
    }

    #[test]
    fn test_localize_spring_forward_gap() {
        // 2013-03-10 02:30 does not exist in Los Angeles; the clock jumps
        // from 02:00 PST to 03:00 PDT
        let got = localize(LA, dt(2013, 3, 10, 2, 30, 0));
        let v = InstantValue::new(got, Grain::Minute);
        assert!(v.rfc3339().ends_with("-07:00"), "got: {}", v.rfc3339());
    }

    #[test]
    fn test_localize_fall_back_takes_earlier_offset() {
        // 2013-11-03 01:30 happens twice; the earlier pass is still PDT
        let v = InstantValue::new(localize(LA, dt(2013, 11, 3, 1, 30, 0)), Grain::Minute);
        assert!(v.rfc3339().ends_with("-07:00"), "got: {}", v.rfc3339());
    }

    // ── rendering tests ─────────────────────────────────────────────────

    #[test]
    fn test_rfc3339_has_millisecond_precision_and_offset() {
        let v = InstantValue::new(localize(LA, dt(2013, 2, 12, 16, 0, 0)), Grain::Hour);
        assert_eq!(v.rfc3339(), "2013-02-12T16:00:00.000-08:00");
    }

    #[test]
    fn test_dst_boundary_offsets_differ_across_transition() {
        let before = InstantValue::new(localize(LA, dt(2013, 3, 10, 1, 0, 0)), Grain::Hour);
        let after = InstantValue::new(localize(LA, dt(2013, 3, 10, 4, 0, 0)), Grain::Hour);
        assert_eq!(before.rfc3339(), "2013-03-10T01:00:00.000-08:00");
        assert_eq!(after.rfc3339(), "2013-03-10T04:00:00.000-07:00");
    }

    // ── JSON schema tests ───────────────────────────────────────────────

    #[test]
    fn test_simple_value_json() {
        let v = SingleTimeValue::Simple(InstantValue::new(
            localize(LA, dt(2013, 2, 12, 16, 0, 0)),
            Grain::Hour,
        ));
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!({
                "type": "value",
                "value": "2013-02-12T16:00:00.000-08:00",
                "grain": "hour"
            })
        );
    }

    #[test]
    fn test_interval_json() {
        let v = SingleTimeValue::Interval {
            from: InstantValue::new(localize(LA, dt(2013, 2, 12, 12, 0, 0)), Grain::Hour),
            to: InstantValue::new(localize(LA, dt(2013, 2, 13, 0, 0, 0)), Grain::Hour),
        };
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!({
                "type": "interval",
                "from": {"value": "2013-02-12T12:00:00.000-08:00", "grain": "hour"},
                "to": {"value": "2013-02-13T00:00:00.000-08:00", "grain": "hour"}
            })
        );
    }

    #[test]
    fn test_open_interval_json_keeps_only_the_bounded_side() {
        let anchor = InstantValue::new(localize(LA, dt(2013, 2, 12, 16, 0, 0)), Grain::Hour);
        let before = SingleTimeValue::OpenInterval {
            anchor: anchor.clone(),
            direction: Direction::Before,
        };
        let after = SingleTimeValue::OpenInterval { anchor, direction: Direction::After };
        assert_eq!(
            serde_json::to_value(&before).unwrap(),
            json!({
                "type": "interval",
                "to": {"value": "2013-02-12T16:00:00.000-08:00", "grain": "hour"}
            })
        );
        assert_eq!(
            serde_json::to_value(&after).unwrap(),
            json!({
                "type": "interval",
                "from": {"value": "2013-02-12T16:00:00.000-08:00", "grain": "hour"}
            })
        );
    }

    #[test]
    fn test_time_value_json_flattens_chosen_and_appends_values() {
        let instant = |h: u32, d: u32| {
            InstantValue::new(localize(LA, dt(2013, 2, d, h, 0, 0)), Grain::Day)
        };
        let v = TimeValue {
            chosen: SingleTimeValue::Simple(instant(0, 19)),
            alternatives: vec![SingleTimeValue::Simple(instant(0, 26))],
        };
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!({
                "type": "value",
                "value": "2013-02-19T00:00:00.000-08:00",
                "grain": "day",
                "values": [
                    {"type": "value", "value": "2013-02-26T00:00:00.000-08:00", "grain": "day"}
                ]
            })
        );
    }
}

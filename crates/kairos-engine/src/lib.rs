//! # kairos-engine
//!
//! Deterministic time predicate engine for natural-language time
//! resolution.
//!
//! A temporal pattern ("the 3rd of a month", "Tuesdays", "4 pm", or
//! intersections of these) arrives as a [`Predicate`] built by an external
//! parser. Evaluated against a reference instant, it yields lazy,
//! chronologically ordered sequences of concrete intervals on both sides
//! of the reference; the resolver picks one as the answer and renders it
//! as a structured, timezone-aware value with a stable JSON encoding.
//!
//! # Design Principle
//!
//! The engine is pure: no system clock, no I/O, no mutable state. The
//! caller pins "now" explicitly, so identical inputs always produce
//! identical outputs, queries are replayable in tests, and independent
//! queries can run in parallel without synchronization.
//!
//! # Modules
//!
//! - [`grain`] — ordered calendar granularities (second … year)
//! - [`interval`] — half-open calendar intervals and grain arithmetic
//! - [`predicate`] — the pattern algebra and its smart constructors
//! - [`series`] — bidirectional lazy evaluation and intersection
//! - [`resolve`] — choice policy: one answer plus upcoming alternatives
//! - [`value`] — output values, RFC 3339 rendering, JSON schema
//! - [`error`] — error types for context construction

pub mod error;
pub mod grain;
pub mod interval;
pub mod predicate;
pub mod resolve;
pub mod series;
pub mod value;

pub use error::{KairosError, Result};
pub use grain::Grain;
pub use interval::{IntervalKind, TimeObject};
pub use predicate::{AmPm, Predicate, TimeDate};
pub use resolve::{resolve, Context, Form, TimeData};
pub use series::{run, SeriesFn, SeriesPair, TimeContext, TimeSeq};
pub use value::{Direction, InstantValue, SingleTimeValue, TimeValue};

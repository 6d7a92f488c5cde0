// ABOUTME: PWX workout document reader with dynamic namespace detection
// ABOUTME: Exposes the parsed start instant and a lazy iterator over sample records
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Reader for the PWX interchange format.
//!
//! PWX documents have shipped under at least two namespace URIs (and
//! sometimes none at all), so the root element's namespace is detected
//! dynamically and every child lookup is qualified against it — never a
//! hardcoded URI. The start time is ISO-8601, optionally without an offset;
//! offset-less times are treated as local time and resolved to an explicit
//! offset at parse time.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, LocalResult, NaiveDateTime, TimeZone};
use roxmltree::{Document, Node};

use crate::errors::FormatError;
use crate::models::{ActivityStart, Sample};

/// Qualified-name lookup table built from the document root. All child
/// element searches go through this so the namespace policy lives in one
/// place.
#[derive(Debug, Clone)]
struct ElementLookup {
    ns: Option<String>,
}

impl ElementLookup {
    fn from_root(root: Node<'_, '_>) -> Self {
        Self {
            ns: root.tag_name().namespace().map(str::to_string),
        }
    }

    fn is_named(&self, node: Node<'_, '_>, name: &str) -> bool {
        node.is_element()
            && node.tag_name().name() == name
            && node.tag_name().namespace() == self.ns.as_deref()
    }

    fn child<'a, 'input>(&self, parent: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
        parent.children().find(|n| self.is_named(*n, name))
    }

    fn child_text<'a, 'input>(&self, parent: Node<'a, 'input>, name: &str) -> Option<&'a str> {
        self.child(parent, name).and_then(|n| n.text()).map(str::trim)
    }
}

/// A parsed workout: start instant, optional source-declared duration, and
/// lazy access to the sample sequence. Borrows the parsed document; no
/// component materializes the full sample list.
pub struct PwxWorkout<'a, 'input> {
    start: ActivityStart,
    declared_duration_s: Option<f64>,
    lookup: ElementLookup,
    workout: Node<'a, 'input>,
}

/// Parse a PWX document tree.
///
/// # Errors
///
/// Returns `FormatError` when the document has no `workout` container, the
/// workout has no `time` element, or the start-time text is not a
/// recognizable timestamp. Well-formedness failures surface earlier, from
/// `roxmltree::Document::parse` on the raw text.
pub fn parse<'a, 'input>(doc: &'a Document<'input>) -> Result<PwxWorkout<'a, 'input>, FormatError> {
    let root = doc.root_element();
    let lookup = ElementLookup::from_root(root);

    let workout = lookup.child(root, "workout").ok_or(FormatError::MissingWorkout)?;
    let time_text = lookup
        .child_text(workout, "time")
        .ok_or(FormatError::MissingStartTime)?;
    let start = ActivityStart::new(parse_start_time(time_text)?);

    let declared_duration_s = match lookup
        .child(workout, "summarydata")
        .and_then(|sd| lookup.child_text(sd, "duration"))
    {
        Some(text) => Some(text.parse::<f64>().map_err(|_| FormatError::InvalidDuration {
            value: text.to_string(),
        })?),
        None => None,
    };

    Ok(PwxWorkout {
        start,
        declared_duration_s,
        lookup,
        workout,
    })
}

impl<'a, 'input> PwxWorkout<'a, 'input> {
    /// Start instant with its resolved offset
    #[must_use]
    pub fn start(&self) -> ActivityStart {
        self.start
    }

    /// Duration the source declared in its summary section, if any. Takes
    /// display precedence for the TCX lap total time but never replaces
    /// the per-sample aggregates.
    #[must_use]
    pub fn declared_duration_s(&self) -> Option<f64> {
        self.declared_duration_s
    }

    /// Lazy iterator over the sample sequence in document order. Each
    /// encoder traverses this exactly once.
    #[must_use]
    pub fn samples(&self) -> Samples<'_, 'a, 'input> {
        Samples {
            parsed: self,
            children: self.workout.children(),
            index: 0,
        }
    }

    fn parse_sample(&self, index: usize, node: Node<'a, 'input>) -> Result<Sample, FormatError> {
        let time_offset_s = match self.lookup.child_text(node, "timeoffset") {
            Some(text) => parse_field(index, "timeoffset", text)?,
            None => return Err(FormatError::MissingTimeOffset { index }),
        };

        Ok(Sample {
            time_offset_s,
            distance_m: self.optional_field(index, node, "dist")?,
            altitude_m: self.optional_field(index, node, "alt")?,
            heart_rate_bpm: self.optional_field(index, node, "hr")?,
            cadence_rpm: self.optional_field(index, node, "cad")?,
            power_w: self.optional_field(index, node, "pwr")?,
            speed_mps: self.optional_field(index, node, "spd")?,
        })
    }

    fn optional_field<T: FromStr>(
        &self,
        index: usize,
        node: Node<'a, 'input>,
        field: &'static str,
    ) -> Result<Option<T>, FormatError> {
        match self.lookup.child_text(node, field) {
            Some(text) => parse_field(index, field, text).map(Some),
            None => Ok(None),
        }
    }
}

/// Lazily parsing iterator over the workout's sample elements.
pub struct Samples<'w, 'a, 'input> {
    parsed: &'w PwxWorkout<'a, 'input>,
    children: roxmltree::Children<'a, 'input>,
    index: usize,
}

impl Iterator for Samples<'_, '_, '_> {
    type Item = Result<Sample, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = self.children.next()?;
            if self.parsed.lookup.is_named(node, "sample") {
                let index = self.index;
                self.index += 1;
                return Some(self.parsed.parse_sample(index, node));
            }
        }
    }
}

fn parse_field<T: FromStr>(
    index: usize,
    field: &'static str,
    text: &str,
) -> Result<T, FormatError> {
    text.parse().map_err(|_| FormatError::InvalidSampleValue {
        index,
        field,
        value: text.to_string(),
    })
}

/// Parse the workout start time. Timestamps with an explicit offset are
/// taken as-is; offset-less timestamps try the plain ISO form first, then
/// the fractional-seconds form, and resolve against the local offset.
fn parse_start_time(value: &str) -> Result<DateTime<FixedOffset>, FormatError> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant);
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|_| FormatError::InvalidStartTime {
            value: value.to_string(),
        })?;

    match Local.from_local_datetime(&naive) {
        LocalResult::Single(instant) | LocalResult::Ambiguous(instant, _) => {
            Ok(instant.fixed_offset())
        }
        LocalResult::None => Err(FormatError::InvalidStartTime {
            value: value.to_string(),
        }),
    }
}

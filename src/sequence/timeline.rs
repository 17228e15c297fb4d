// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-qubit event timeline.
//!
//! Every event after the first starts where the previous one ends plus a
//! delay, so offsets accumulate instead of being recomputed per pulse.

use crate::error::ValidationError;
use crate::parameters::QubitParameters;
use crate::waveform::EDGE_NS;

/// An event placed on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    /// Unique name within the timeline.
    pub id: String,
    pub start_ns: f64,
    pub duration_ns: f64,
}

impl TimelineEntry {
    pub fn end_ns(&self) -> f64 {
        self.start_ns + self.duration_ns
    }

    /// Midpoint, where Gaussian pulses are centered.
    pub fn center_ns(&self) -> f64 {
        self.start_ns + self.duration_ns / 2.0
    }
}

/// Ordered chain of named events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

pub const PI_PULSE: &str = "pi";
pub const Z1: &str = "z1";
pub const Z2: &str = "z2";
pub const COUPLING: &str = "coupling";
pub const BELL: &str = "bell";
pub const MEASURE: &str = "measure";

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard sequence of one qubit with the π pulse centered on `origin_ns`:
    /// π pulse, Z1, Z2, coupling wait, Bell pulse, measure pulse.
    pub fn for_qubit(params: &QubitParameters, origin_ns: f64) -> Result<Self, ValidationError> {
        let pi_len = params.pi.length_ns;
        let measure_len =
            EDGE_NS + params.measure.top_length_ns + params.measure.tail_length_ns;

        let mut timeline = Self::new();
        timeline
            .place(PI_PULSE, origin_ns - pi_len / 2.0, pi_len)?
            .chain(Z1, params.z1.delay_ns, params.z1.length_ns)?
            .chain(Z2, params.z2.delay_ns, params.z2.length_ns)?
            .chain(COUPLING, 0.0, params.coupling_time_ns)?
            .chain(BELL, 0.0, params.bell.length_ns)?
            .chain(MEASURE, params.measure.delay_ns, measure_len)?;
        Ok(timeline)
    }

    /// Place an event at an absolute time.
    pub fn place(
        &mut self,
        id: &str,
        start_ns: f64,
        duration_ns: f64,
    ) -> Result<&mut Self, ValidationError> {
        if self.get(id).is_some() {
            return Err(ValidationError::Field {
                field: "timeline".into(),
                message: format!("event '{id}' already exists"),
            });
        }
        if !start_ns.is_finite() || !duration_ns.is_finite() {
            return Err(ValidationError::Field {
                field: id.to_string(),
                message: format!("non-finite timing (start {start_ns}, duration {duration_ns})"),
            });
        }
        self.entries.push(TimelineEntry {
            id: id.to_string(),
            start_ns,
            duration_ns,
        });
        Ok(self)
    }

    /// Place an event `delay_ns` after the end of the last one.
    ///
    /// On an empty timeline the event starts at `delay_ns`.
    pub fn chain(
        &mut self,
        id: &str,
        delay_ns: f64,
        duration_ns: f64,
    ) -> Result<&mut Self, ValidationError> {
        let start = self.end_ns() + delay_ns;
        self.place(id, start, duration_ns)
    }

    pub fn get(&self, id: &str) -> Option<&TimelineEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Start of event `id`.
    pub fn start_of(&self, id: &str) -> Result<f64, ValidationError> {
        self.get(id)
            .map(|e| e.start_ns)
            .ok_or_else(|| unknown(id))
    }

    pub fn center_of(&self, id: &str) -> Result<f64, ValidationError> {
        self.get(id)
            .map(TimelineEntry::center_ns)
            .ok_or_else(|| unknown(id))
    }

    /// End of the last event, or 0 when empty.
    pub fn end_ns(&self) -> f64 {
        self.entries.last().map(TimelineEntry::end_ns).unwrap_or(0.0)
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Events that start before their predecessor ends.
    pub fn overlaps(&self) -> Vec<(String, String)> {
        self.entries
            .windows(2)
            .filter(|w| w[1].start_ns < w[0].end_ns())
            .map(|w| (w[0].id.clone(), w[1].id.clone()))
            .collect()
    }
}

fn unknown(id: &str) -> ValidationError {
    ValidationError::Field {
        field: "timeline".into(),
        message: format!("no event named '{id}'"),
    }
}

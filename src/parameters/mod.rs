// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Experiment parameters.
//!
//! Parameters are declared in [`tables`], fetched from a [`ParameterStore`]
//! in one batch, converted into the declared units and collected into an
//! immutable [`ParameterSet`]. [`QubitParameters::extract`] then turns the
//! entries of one qubit into a typed struct, failing on the first missing
//! key.

pub mod store;
pub mod tables;
pub mod units;

pub use store::{ParameterStore, RegistryQuery, RegistryTree, RegistryValue};
pub use units::{Quantity, Unit};

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::{ParameterError, Result, ValidationError};
use tables::{
    all_qubit_parameters, DefaultValue, GlobalKind, GLOBAL_PARAMETERS, RESONATOR_COUPLING,
    SEQUENCE, STATS,
};

/// A resolved per-qubit value, in the unit its descriptor declares.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Scalar(f64),
    List(Vec<f64>),
}

/// Parameters stored at the registry root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlobalParameters {
    /// Repetitions per operator setting.
    pub stats: u32,
    /// Operator setting used by single-setting runs.
    pub sequence: u32,
    pub resonator_coupling: bool,
}

/// All parameters of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    globals: GlobalParameters,
    qubits: Vec<String>,
    values: HashMap<(String, String), ParameterValue>,
}

impl ParameterSet {
    pub fn globals(&self) -> &GlobalParameters {
        &self.globals
    }

    pub fn stats(&self) -> u32 {
        self.globals.stats
    }

    pub fn sequence(&self) -> u32 {
        self.globals.sequence
    }

    pub fn resonator_coupling(&self) -> bool {
        self.globals.resonator_coupling
    }

    /// Qubits the set was resolved for, in slot order.
    pub fn qubits(&self) -> &[String] {
        &self.qubits
    }

    pub fn get(&self, qubit: &str, name: &str) -> Option<&ParameterValue> {
        self.values.get(&(qubit.to_string(), name.to_string()))
    }

    /// A scalar parameter. A one-element list reads as its element.
    pub fn scalar(&self, qubit: &str, name: &str) -> std::result::Result<f64, ParameterError> {
        match self.get(qubit, name) {
            Some(ParameterValue::Scalar(v)) => Ok(*v),
            Some(ParameterValue::List(items)) if items.len() == 1 => Ok(items[0]),
            Some(ParameterValue::List(items)) => Err(ParameterError::InvalidValue {
                name: name.to_string(),
                message: format!("expected a scalar, found a list of {}", items.len()),
            }),
            None => Err(missing(qubit, name)),
        }
    }

    /// A list parameter. A scalar reads as a one-element list.
    pub fn list(&self, qubit: &str, name: &str) -> std::result::Result<Vec<f64>, ParameterError> {
        match self.get(qubit, name) {
            Some(ParameterValue::List(items)) => Ok(items.clone()),
            Some(ParameterValue::Scalar(v)) => Ok(vec![*v]),
            None => Err(missing(qubit, name)),
        }
    }
}

fn missing(qubit: &str, name: &str) -> ParameterError {
    ParameterError::Missing {
        qubit: Some(qubit.to_string()),
        name: name.to_string(),
    }
}

/// Fetch every global and per-qubit parameter for `qubits` in one batch.
///
/// Missing per-qubit entries take their descriptor default. Of the globals
/// only `Stats` is required.
#[instrument(skip(store))]
pub async fn resolve_parameters(
    store: &dyn ParameterStore,
    qubits: &[String],
) -> Result<ParameterSet> {
    let mut queries: Vec<RegistryQuery> = GLOBAL_PARAMETERS
        .iter()
        .map(|g| RegistryQuery::new(Vec::new(), g.name))
        .collect();
    for qubit in qubits {
        for desc in all_qubit_parameters() {
            let mut path = Vec::with_capacity(desc.path.len() + 1);
            path.push(qubit.clone());
            path.extend(desc.path.iter().map(|s| s.to_string()));
            queries.push(RegistryQuery::new(path, desc.key));
        }
    }

    let answers = store.get_many(&queries).await?;
    if answers.len() != queries.len() {
        return Err(ValidationError::ShapeMismatch {
            what: "registry response".into(),
            expected: format!("{} entries", queries.len()),
            actual: format!("{} entries", answers.len()),
        }
        .into());
    }
    let mut answers = answers.into_iter();

    let mut stats = 0;
    let mut sequence = 0;
    let mut resonator_coupling = false;
    for (desc, answer) in GLOBAL_PARAMETERS.iter().zip(answers.by_ref()) {
        let raw = match (answer, desc.default) {
            (Some(value), _) => value,
            (None, Some(default)) => RegistryValue::Number(default),
            (None, None) => {
                return Err(ParameterError::Missing {
                    qubit: None,
                    name: desc.name.to_string(),
                }
                .into())
            }
        };
        match desc.kind {
            GlobalKind::Count => {
                let count = to_count(desc.name, &raw)?;
                match desc.name {
                    STATS => stats = count,
                    SEQUENCE => sequence = count,
                    _ => {}
                }
            }
            GlobalKind::Flag => {
                if desc.name == RESONATOR_COUPLING {
                    resonator_coupling = raw.to_flag(desc.name)?;
                }
            }
        }
    }

    let mut values = HashMap::new();
    for qubit in qubits {
        for desc in all_qubit_parameters() {
            let answer = answers.next().flatten();
            let value = match (answer, desc.default) {
                (Some(raw), DefaultValue::Scalar(_)) => {
                    ParameterValue::Scalar(raw.to_scalar(desc.name, desc.unit)?)
                }
                (Some(raw), DefaultValue::List(_)) => {
                    ParameterValue::List(raw.to_list(desc.name, desc.unit)?)
                }
                (None, DefaultValue::Scalar(v)) => ParameterValue::Scalar(v),
                (None, DefaultValue::List(v)) => ParameterValue::List(v.to_vec()),
            };
            values.insert((qubit.clone(), desc.name.to_string()), value);
        }
    }

    debug!(
        stats,
        sequence,
        resonator_coupling,
        entries = values.len(),
        "Resolved parameters"
    );

    Ok(ParameterSet {
        globals: GlobalParameters {
            stats,
            sequence,
            resonator_coupling,
        },
        qubits: qubits.to_vec(),
        values,
    })
}

fn to_count(name: &str, raw: &RegistryValue) -> std::result::Result<u32, ParameterError> {
    let value = raw.to_scalar(name, Unit::Dimensionless)?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(ParameterError::InvalidValue {
            name: name.to_string(),
            message: format!("expected a non-negative integer, got {}", value),
        });
    }
    Ok(value as u32)
}

// =============================================================================
// Typed per-qubit view
// =============================================================================

/// Z (bias) pulse parameters, in ns and V.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZPulseParameters {
    pub length_ns: f64,
    pub delay_ns: f64,
    pub amplitude_v: f64,
    pub overshoot_v: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PiPulseParameters {
    pub amplitude_mv: f64,
    pub phase_rad: f64,
    pub length_ns: f64,
    pub frequency_shift_ghz: f64,
}

/// Bell pulse parameters. The primed variant shares length and frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BellPulseParameters {
    pub length_ns: f64,
    pub bias_shift_mv: f64,
    pub frequency_shift_ghz: f64,
    pub amplitude_mv: f64,
    pub phase_rad: f64,
    pub primed_amplitude_mv: f64,
    pub primed_phase_rad: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasurePulseParameters {
    pub delay_ns: f64,
    pub amplitude_mv: f64,
    pub top_length_ns: f64,
    pub tail_length_ns: f64,
}

/// Everything needed to build and set up one qubit's sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QubitParameters {
    pub name: String,
    pub microwave_offset_ns: f64,
    pub measure_offset_ns: f64,
    pub resonance_frequency_ghz: f64,
    pub sideband_frequency_ghz: f64,
    pub carrier_power_dbm: f64,
    pub settling_amplitudes: Vec<f64>,
    pub settling_rates_ghz: Vec<f64>,
    pub z1: ZPulseParameters,
    pub z2: ZPulseParameters,
    pub pi: PiPulseParameters,
    pub coupling_time_ns: f64,
    pub bell: BellPulseParameters,
    pub operating_bias_shift_mv: f64,
    pub measure: MeasurePulseParameters,
}

impl QubitParameters {
    /// Pull the entries of `qubit` out of `set`.
    pub fn extract(set: &ParameterSet, qubit: &str) -> std::result::Result<Self, ParameterError> {
        let s = |name: &str| set.scalar(qubit, name);
        Ok(Self {
            name: qubit.to_string(),
            microwave_offset_ns: s("Microwave Offset")?,
            measure_offset_ns: s("Measure Offset")?,
            resonance_frequency_ghz: s("Resonance Frequency")?,
            sideband_frequency_ghz: s("Sideband Frequency")?,
            carrier_power_dbm: s("Carrier Power")?,
            settling_amplitudes: set.list(qubit, "Settling Amplitude")?,
            settling_rates_ghz: set.list(qubit, "Settling Rate")?,
            z1: ZPulseParameters {
                length_ns: s("Z Pulse Length")?,
                delay_ns: s("Z Pulse Delay")?,
                amplitude_v: s("Z Pulse Amplitude")?,
                overshoot_v: s("Z Pulse Overshoot")?,
            },
            z2: ZPulseParameters {
                length_ns: s("Second Z Pulse Length")?,
                delay_ns: s("Second Z Pulse Delay")?,
                amplitude_v: s("Second Z Pulse Amplitude")?,
                overshoot_v: s("Second Z Pulse Overshoot")?,
            },
            pi: PiPulseParameters {
                amplitude_mv: s("Pi Pulse Amplitude")?,
                phase_rad: s("Pi Pulse Phase")?,
                length_ns: s("Pi Pulse Length")?,
                frequency_shift_ghz: s("Pi Pulse Frequency Shift")?,
            },
            coupling_time_ns: s("Coupling Time")?,
            bell: BellPulseParameters {
                length_ns: s("Bell Pulse Length")?,
                bias_shift_mv: s("Bell Pulse Bias Shift")?,
                frequency_shift_ghz: s("Bell Pulse Frequency Shift")?,
                amplitude_mv: s("Bell Pulse Amplitude")?,
                phase_rad: s("Bell Pulse Phase")?,
                primed_amplitude_mv: s("Bell Pulse Amplitude'")?,
                primed_phase_rad: s("Bell Pulse Phase'")?,
            },
            operating_bias_shift_mv: s("Operating Bias Shift")?,
            measure: MeasurePulseParameters {
                delay_ns: s("Measure Pulse Delay")?,
                amplitude_mv: s("Measure Pulse Amplitude")?,
                top_length_ns: s("Measure Pulse Top Length")?,
                tail_length_ns: s("Measure Pulse Tail Length")?,
            },
        })
    }

    /// Carrier frequency of the microwave source.
    pub fn carrier_frequency_ghz(&self) -> f64 {
        self.resonance_frequency_ghz - self.sideband_frequency_ghz
    }
}

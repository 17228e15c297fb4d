// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Input validation for experiment runs.

use crate::config::ResourceLimits;
use crate::error::{Result, ValidationError};
use crate::parameters::QubitParameters;
use crate::readout::ProbabilityVector;

/// Validate the repetition count of a run.
pub fn validate_repetitions(repetitions: u32, limits: &ResourceLimits) -> Result<()> {
    if repetitions == 0 {
        return Err(ValidationError::Field {
            field: "Stats".into(),
            message: "must be greater than 0".into(),
        }
        .into());
    }

    if repetitions > limits.max_repetitions {
        return Err(ValidationError::ResourceLimit {
            resource: "Stats".into(),
            limit: limits.max_repetitions as u64,
            requested: repetitions as u64,
        }
        .into());
    }

    Ok(())
}

/// Validate the timing and settling parameters of one qubit.
///
/// Lengths must be finite, non-negative and within the duration limit.
/// Delays and offsets may be negative but must be finite.
pub fn validate_qubit_parameters(params: &QubitParameters, limits: &ResourceLimits) -> Result<()> {
    let lengths = [
        ("Pi Pulse Length", params.pi.length_ns),
        ("Z Pulse Length", params.z1.length_ns),
        ("Second Z Pulse Length", params.z2.length_ns),
        ("Coupling Time", params.coupling_time_ns),
        ("Bell Pulse Length", params.bell.length_ns),
        ("Measure Pulse Top Length", params.measure.top_length_ns),
        ("Measure Pulse Tail Length", params.measure.tail_length_ns),
    ];
    for (name, value) in lengths {
        if !value.is_finite() || value < 0.0 {
            return Err(field(params, name, format!("length must be finite and >= 0, got {}", value)));
        }
        if value > limits.max_duration_ns {
            return Err(ValidationError::ResourceLimit {
                resource: format!("{} of {}", name, params.name),
                limit: limits.max_duration_ns as u64,
                requested: value.ceil() as u64,
            }
            .into());
        }
    }

    let offsets = [
        ("Microwave Offset", params.microwave_offset_ns),
        ("Measure Offset", params.measure_offset_ns),
        ("Z Pulse Delay", params.z1.delay_ns),
        ("Second Z Pulse Delay", params.z2.delay_ns),
        ("Measure Pulse Delay", params.measure.delay_ns),
    ];
    for (name, value) in offsets {
        if !value.is_finite() {
            return Err(field(params, name, format!("must be finite, got {}", value)));
        }
    }

    if params.settling_amplitudes.len() != params.settling_rates_ghz.len() {
        return Err(field(
            params,
            "Settling Amplitude",
            format!(
                "{} amplitudes for {} rates",
                params.settling_amplitudes.len(),
                params.settling_rates_ghz.len()
            ),
        ));
    }

    Ok(())
}

fn field(params: &QubitParameters, name: &str, message: String) -> crate::error::Error {
    ValidationError::Field {
        field: format!("{}.{}", params.name, name),
        message,
    }
    .into()
}

/// Check that `p` is a normalized probability vector.
pub fn validate_probabilities(p: &ProbabilityVector) -> Result<()> {
    if let Some(bad) = p.as_slice().iter().find(|x| !(0.0..=1.0).contains(*x)) {
        return Err(ValidationError::Field {
            field: "probabilities".into(),
            message: format!("entry {} outside [0, 1]", bad),
        }
        .into());
    }
    let total = p.total();
    if (total - 1.0).abs() > 1e-9 {
        return Err(ValidationError::Field {
            field: "probabilities".into(),
            message: format!("sum to {}, expected 1", total),
        }
        .into());
    }
    Ok(())
}

// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-qubit control waveforms for one operator setting.

use serde::Serialize;
use tracing::trace;

use super::operator::{BellPulse, OperatorIndex};
use super::timeline::{Timeline, BELL, MEASURE, Z1, Z2};
use crate::error::Result;
use crate::parameters::QubitParameters;
use crate::waveform::{FrequencyGrid, PulseSpec, Waveform};

/// Both control waveforms of one qubit.
#[derive(Debug, Clone, PartialEq)]
pub struct QubitSequence {
    pub qubit: String,
    pub slot: usize,
    pub operator: OperatorIndex,
    /// Drive on the bipolar microwave grid.
    pub microwave: Waveform,
    /// Z and measure pulses on the baseband bias grid.
    pub bias: Waveform,
}

/// Pulse lists of one qubit, before evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PulsePlan {
    pub microwave: Vec<PulseSpec>,
    pub bias: Vec<PulseSpec>,
}

/// Builds [`QubitSequence`]s on fixed grids.
#[derive(Debug, Clone, Copy)]
pub struct SequenceBuilder {
    microwave_grid: FrequencyGrid,
    bias_grid: FrequencyGrid,
}

impl Default for SequenceBuilder {
    fn default() -> Self {
        Self::new(FrequencyGrid::microwave(), FrequencyGrid::bias())
    }
}

impl SequenceBuilder {
    pub fn new(microwave_grid: FrequencyGrid, bias_grid: FrequencyGrid) -> Self {
        Self {
            microwave_grid,
            bias_grid,
        }
    }

    /// Pulses of qubit `slot` for setting `operator`.
    pub fn plan(
        &self,
        params: &QubitParameters,
        slot: usize,
        operator: OperatorIndex,
    ) -> Result<PulsePlan> {
        Ok(PulsePlan {
            microwave: microwave_pulses(params, slot, operator)?,
            bias: bias_pulses(params)?,
        })
    }

    /// Evaluate the waveforms of qubit `slot` for setting `operator`.
    pub fn build(
        &self,
        params: &QubitParameters,
        slot: usize,
        operator: OperatorIndex,
    ) -> Result<QubitSequence> {
        let plan = self.plan(params, slot, operator)?;
        trace!(
            qubit = %params.name,
            slot,
            operator = %operator,
            microwave_pulses = plan.microwave.len(),
            bias_pulses = plan.bias.len(),
            "Building sequence"
        );
        Ok(QubitSequence {
            qubit: params.name.clone(),
            slot,
            operator,
            microwave: evaluate_all(&plan.microwave, &self.microwave_grid)?,
            bias: evaluate_all(&plan.bias, &self.bias_grid)?,
        })
    }
}

fn evaluate_all(pulses: &[PulseSpec], grid: &FrequencyGrid) -> Result<Waveform> {
    let mut total = Waveform::zeros(*grid);
    for pulse in pulses {
        total.accumulate(&pulse.evaluate(grid))?;
    }
    Ok(total)
}

/// π pulse plus the Bell pulse the operator table picks for `slot`.
pub fn microwave_pulses(
    params: &QubitParameters,
    slot: usize,
    operator: OperatorIndex,
) -> Result<Vec<PulseSpec>> {
    let origin = params.microwave_offset_ns;
    let timeline = Timeline::for_qubit(params, origin)?;

    let mut pulses = vec![PulseSpec::gaussian(
        origin,
        params.pi.length_ns / 2.0,
        params.pi.amplitude_mv / 1000.0,
        params.sideband_frequency_ghz + params.pi.frequency_shift_ghz,
        params.pi.phase_rad,
    )];

    if let Some(variant) = operator.bell_pulse(slot) {
        let bell = &params.bell;
        let (amplitude_mv, phase) = match variant {
            BellPulse::Unprimed => (bell.amplitude_mv, bell.phase_rad),
            BellPulse::Primed => (bell.primed_amplitude_mv, bell.primed_phase_rad),
        };
        pulses.push(PulseSpec::gaussian(
            timeline.center_of(BELL)?,
            bell.length_ns / 2.0,
            amplitude_mv / 1000.0,
            params.sideband_frequency_ghz + bell.frequency_shift_ghz,
            phase,
        ));
    }
    Ok(pulses)
}

/// Z1, Z2 and the measure ramp.
pub fn bias_pulses(params: &QubitParameters) -> Result<Vec<PulseSpec>> {
    let timeline = Timeline::for_qubit(params, params.measure_offset_ns)?;
    let measure = &params.measure;
    Ok(vec![
        PulseSpec::z_pulse(
            timeline.start_of(Z1)?,
            params.z1.length_ns,
            params.z1.amplitude_v,
            params.z1.overshoot_v,
        ),
        PulseSpec::z_pulse(
            timeline.start_of(Z2)?,
            params.z2.length_ns,
            params.z2.amplitude_v,
            params.z2.overshoot_v,
        ),
        PulseSpec::ramp(
            timeline.start_of(MEASURE)?,
            measure.top_length_ns,
            measure.tail_length_ns,
            measure.amplitude_mv / 1000.0,
        ),
    ])
}

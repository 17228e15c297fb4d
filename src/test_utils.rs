// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared test utilities.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::HardwareError;
use crate::hardware::{
    AcquisitionSession, ContextHandle, ExperimentRig, HealthStatus, RigType, SequenceUpload,
};
use crate::parameters::{
    BellPulseParameters, MeasurePulseParameters, PiPulseParameters, QubitParameters,
    RegistryTree, RegistryValue, ZPulseParameters,
};
use crate::readout::{Cutoff, READOUT_SCALE};

/// Parameters of `name` with every entry at its registry default.
pub fn qubit_parameters(name: &str) -> QubitParameters {
    QubitParameters {
        name: name.to_string(),
        microwave_offset_ns: 50.0,
        measure_offset_ns: 50.0,
        resonance_frequency_ghz: 6.5,
        sideband_frequency_ghz: -0.15,
        carrier_power_dbm: 2.7,
        settling_amplitudes: vec![-0.02],
        settling_rates_ghz: vec![0.02],
        z1: ZPulseParameters {
            length_ns: 16.0,
            delay_ns: 10.0,
            amplitude_v: 0.1,
            overshoot_v: 0.0,
        },
        z2: ZPulseParameters {
            length_ns: 16.0,
            delay_ns: 10.0,
            amplitude_v: 0.1,
            overshoot_v: 0.0,
        },
        pi: PiPulseParameters {
            amplitude_mv: 500.0,
            phase_rad: 0.0,
            length_ns: 16.0,
            frequency_shift_ghz: 0.0,
        },
        coupling_time_ns: 20.0,
        bell: BellPulseParameters {
            length_ns: 10.0,
            bias_shift_mv: 0.0,
            frequency_shift_ghz: 0.0,
            amplitude_mv: 100.0,
            phase_rad: 0.0,
            primed_amplitude_mv: 200.0,
            primed_phase_rad: 0.0,
        },
        operating_bias_shift_mv: 0.0,
        measure: MeasurePulseParameters {
            delay_ns: 5.0,
            amplitude_mv: 500.0,
            top_length_ns: 5.0,
            tail_length_ns: 15.0,
        },
    }
}

/// Registry holding only the required `Stats` entry.
pub fn minimal_registry(stats: u32) -> RegistryTree {
    let mut tree = RegistryTree::new();
    tree.set::<&str>(&[], "Stats", RegistryValue::Number(stats as f64));
    tree
}

/// Session call, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RigCall {
    Open(ContextHandle),
    Initialize,
    Upload(usize),
    Readout,
    Run(u32),
}

/// Deterministic rig: every repetition of setting `s` lands in `states[s]`
/// (default `|00>`).
pub struct MockRig {
    pub name: String,
    pub qubits: Vec<String>,
    pub cutoffs: Vec<Cutoff>,
    pub states: HashMap<usize, usize>,
    pub calls: Arc<Mutex<Vec<RigCall>>>,
    pub uploads: Arc<Mutex<Vec<SequenceUpload>>>,
}

impl MockRig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            qubits: vec!["q0".into(), "q1".into()],
            cutoffs: vec![Cutoff::new(1.0, 0.5), Cutoff::new(1.0, -0.5)],
            states: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn arc(name: &str) -> Arc<dyn ExperimentRig> {
        Arc::new(Self::new(name))
    }

    pub fn with_qubits(mut self, qubits: &[&str]) -> Self {
        self.qubits = qubits.iter().map(|q| q.to_string()).collect();
        self
    }

    pub fn with_state(mut self, setting: usize, state: usize) -> Self {
        self.states.insert(setting, state);
        self
    }
}

#[async_trait]
impl ExperimentRig for MockRig {
    fn name(&self) -> &str {
        &self.name
    }

    fn rig_type(&self) -> RigType {
        RigType::Simulator
    }

    async fn involved_qubits(&self, _ctx: ContextHandle) -> Result<Vec<String>, HardwareError> {
        Ok(self.qubits.clone())
    }

    async fn open_session(
        &self,
        ctx: ContextHandle,
    ) -> Result<Box<dyn AcquisitionSession>, HardwareError> {
        self.calls.lock().push(RigCall::Open(ctx));
        Ok(Box::new(MockSession {
            cutoffs: self.cutoffs.clone(),
            states: self.states.clone(),
            calls: Arc::clone(&self.calls),
            uploads: Arc::clone(&self.uploads),
            queued: Vec::new(),
        }))
    }

    async fn health_check(&self) -> Result<HealthStatus, HardwareError> {
        Ok(HealthStatus::Healthy)
    }
}

struct MockSession {
    cutoffs: Vec<Cutoff>,
    states: HashMap<usize, usize>,
    calls: Arc<Mutex<Vec<RigCall>>>,
    uploads: Arc<Mutex<Vec<SequenceUpload>>>,
    queued: Vec<usize>,
}

#[async_trait]
impl AcquisitionSession for MockSession {
    async fn initialize_qubits(&mut self) -> Result<(), HardwareError> {
        self.calls.lock().push(RigCall::Initialize);
        Ok(())
    }

    async fn upload_sequence(&mut self, upload: SequenceUpload) -> Result<(), HardwareError> {
        let setting = upload.operator.get();
        self.calls.lock().push(RigCall::Upload(setting));
        self.uploads.lock().push(upload);
        self.queued.push(setting);
        Ok(())
    }

    async fn readout_qubits(&mut self) -> Result<Vec<Cutoff>, HardwareError> {
        self.calls.lock().push(RigCall::Readout);
        Ok(self.cutoffs.clone())
    }

    async fn run(&mut self, repetitions: u32) -> Result<Vec<f64>, HardwareError> {
        self.calls.lock().push(RigCall::Run(repetitions));
        let reps = repetitions as usize;
        let ops = self.queued.len();
        let qubits = self.cutoffs.len();
        let mut raw = vec![0.0; qubits * reps * ops];
        for (o, setting) in self.queued.iter().enumerate() {
            let state = self.states.get(setting).copied().unwrap_or(0);
            for (q, cutoff) in self.cutoffs.iter().enumerate() {
                let bit = (state >> q) & 1 == 1;
                let high = bit ^ (cutoff.threshold < 0.0);
                let value = if high {
                    (cutoff.threshold.abs() + 0.5) * READOUT_SCALE
                } else {
                    0.0
                };
                for r in 0..reps {
                    raw[q * reps * ops + r * ops + o] = value;
                }
            }
        }
        Ok(raw)
    }
}

/// Rig whose sessions cannot be opened.
pub struct FailingRig {
    pub name: String,
}

impl FailingRig {
    pub fn arc(name: &str) -> Arc<dyn ExperimentRig> {
        Arc::new(Self {
            name: name.to_string(),
        })
    }
}

#[async_trait]
impl ExperimentRig for FailingRig {
    fn name(&self) -> &str {
        &self.name
    }

    fn rig_type(&self) -> RigType {
        RigType::Hardware
    }

    async fn involved_qubits(&self, _ctx: ContextHandle) -> Result<Vec<String>, HardwareError> {
        Ok(vec!["q0".into(), "q1".into()])
    }

    async fn open_session(
        &self,
        _ctx: ContextHandle,
    ) -> Result<Box<dyn AcquisitionSession>, HardwareError> {
        Err(HardwareError::Unavailable(format!("{} is offline", self.name)))
    }

    async fn health_check(&self) -> Result<HealthStatus, HardwareError> {
        Ok(HealthStatus::Unavailable)
    }
}

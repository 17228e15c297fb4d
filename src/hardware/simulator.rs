// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Simulated two-qubit rig.
//!
//! Each physical setting has a fixed joint-state distribution. Runs sample
//! states from it and encode every qubit bit as a raw switching value that
//! reads back as that bit under the reported cutoff.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::{
    AcquisitionSession, ContextHandle, ExperimentRig, HealthStatus, RigType, SequenceUpload,
};
use crate::config::SimulatorConfig;
use crate::error::HardwareError;
use crate::readout::{Cutoff, READOUT_SCALE};
use crate::sequence::OperatorIndex;
use crate::waveform::{BIAS_BINS, MICROWAVE_BINS};

/// Rig that samples configured outcome distributions.
pub struct SimulatedRig {
    name: String,
    qubits: Vec<String>,
    outcomes: Vec<[f64; 4]>,
    cutoffs: Vec<Cutoff>,
    seed: Option<u64>,
    sessions: AtomicU64,
}

impl SimulatedRig {
    pub fn new(name: impl Into<String>, config: &SimulatorConfig) -> Self {
        Self {
            name: name.into(),
            qubits: config.qubits.clone(),
            outcomes: config.outcomes.clone(),
            cutoffs: config.cutoffs.clone(),
            seed: config.seed,
            sessions: AtomicU64::new(0),
        }
    }

    fn rng(&self) -> StdRng {
        let session = self.sessions.fetch_add(1, Ordering::Relaxed);
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(session)),
            None => StdRng::from_entropy(),
        }
    }
}

#[async_trait]
impl ExperimentRig for SimulatedRig {
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
        info!(rig = %self.name, context = %ctx, "Opening simulated session");
        Ok(Box::new(SimulatedSession {
            qubits: self.qubits.len(),
            outcomes: self.outcomes.clone(),
            cutoffs: self.cutoffs.clone(),
            rng: self.rng(),
            pending: None,
            queued: Vec::new(),
        }))
    }

    async fn health_check(&self) -> Result<HealthStatus, HardwareError> {
        Ok(HealthStatus::Healthy)
    }
}

struct SimulatedSession {
    qubits: usize,
    outcomes: Vec<[f64; 4]>,
    cutoffs: Vec<Cutoff>,
    rng: StdRng,
    /// Uploaded but not yet read out.
    pending: Option<OperatorIndex>,
    queued: Vec<OperatorIndex>,
}

impl SimulatedSession {
    /// A raw value that `cutoff` reads as `bit`.
    fn encode(&mut self, cutoff: &Cutoff, bit: bool) -> f64 {
        let level = cutoff.threshold.abs();
        let high = bit ^ (cutoff.threshold < 0.0);
        let u: f64 = self.rng.gen();
        let scaled = if high {
            level + 0.2 + 0.6 * u
        } else {
            level * 0.9 * u
        };
        scaled * READOUT_SCALE
    }
}

#[async_trait]
impl AcquisitionSession for SimulatedSession {
    async fn initialize_qubits(&mut self) -> Result<(), HardwareError> {
        Ok(())
    }

    async fn upload_sequence(&mut self, upload: SequenceUpload) -> Result<(), HardwareError> {
        if upload.channels.len() != self.qubits {
            return Err(HardwareError::InvalidRequest(format!(
                "upload has {} channels for {} qubits",
                upload.channels.len(),
                self.qubits
            )));
        }
        for channel in &upload.channels {
            if channel.microwave.len() != MICROWAVE_BINS || channel.bias.len() != BIAS_BINS {
                return Err(HardwareError::InvalidRequest(format!(
                    "qubit '{}': expected {}/{} microwave/bias bins, got {}/{}",
                    channel.qubit,
                    MICROWAVE_BINS,
                    BIAS_BINS,
                    channel.microwave.len(),
                    channel.bias.len()
                )));
            }
        }
        if upload.operator.get() >= self.outcomes.len() {
            return Err(HardwareError::InvalidRequest(format!(
                "no outcome distribution for setting {}",
                upload.operator
            )));
        }
        debug!(operator = %upload.operator, "Simulated upload");
        self.pending = Some(upload.operator);
        Ok(())
    }

    async fn readout_qubits(&mut self) -> Result<Vec<Cutoff>, HardwareError> {
        let operator = self.pending.take().ok_or_else(|| {
            HardwareError::InvalidRequest("readout requested before upload".into())
        })?;
        self.queued.push(operator);
        Ok(self.cutoffs.clone())
    }

    async fn run(&mut self, repetitions: u32) -> Result<Vec<f64>, HardwareError> {
        if self.queued.is_empty() {
            return Err(HardwareError::InvalidRequest("no settings queued".into()));
        }
        if repetitions == 0 {
            return Err(HardwareError::InvalidRequest(
                "repetitions must be positive".into(),
            ));
        }
        if self.qubits != 2 || self.cutoffs.len() != 2 {
            return Err(HardwareError::ExecutionFailed(format!(
                "simulator models two qubits, configured with {} qubits and {} cutoffs",
                self.qubits,
                self.cutoffs.len()
            )));
        }

        let reps = repetitions as usize;
        let ops = self.queued.len();
        let mut raw = vec![0.0; 2 * reps * ops];
        let queued = std::mem::take(&mut self.queued);
        let cutoffs = self.cutoffs.clone();

        for (o, operator) in queued.iter().enumerate() {
            let weights = WeightedIndex::new(self.outcomes[operator.get()]).map_err(|e| {
                HardwareError::ExecutionFailed(format!("setting {}: {}", operator, e))
            })?;
            for r in 0..reps {
                let state = weights.sample(&mut self.rng);
                for (q, cutoff) in cutoffs.iter().enumerate() {
                    let bit = (state >> q) & 1 == 1;
                    raw[q * reps * ops + r * ops + o] = self.encode(cutoff, bit);
                }
            }
        }

        debug!(repetitions, settings = ops, "Simulated run complete");
        Ok(raw)
    }
}

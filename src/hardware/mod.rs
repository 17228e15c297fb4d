// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Experiment rig abstraction.
//!
//! An [`ExperimentRig`] knows which qubits a context involves and opens
//! [`AcquisitionSession`]s. A session accepts one upload per operator
//! setting and then runs all of them together, returning the raw
//! switching block `[qubit][repetition][setting]` flattened row-major.

pub mod registry;
pub mod simulator;

pub use registry::RigRegistry;
pub use simulator::SimulatedRig;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::calibration::{DacCorrection, IqCorrection};
use crate::error::HardwareError;
use crate::readout::Cutoff;
use crate::sequence::OperatorIndex;
use crate::waveform::Waveform;

/// Type of rig (simulator or hardware).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RigType {
    Simulator,
    Hardware,
}

impl fmt::Display for RigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RigType::Simulator => write!(f, "simulator"),
            RigType::Hardware => write!(f, "hardware"),
        }
    }
}

/// Health status of a rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unavailable,
}

/// Opaque two-word handle of a client context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextHandle(pub u32, pub u32);

impl fmt::Display for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// DAC boards driving one qubit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBoards {
    pub microwave: String,
    pub bias: String,
}

/// Everything one qubit needs for one operator setting.
#[derive(Debug, Clone)]
pub struct QubitChannelUpload {
    pub qubit: String,
    pub slot: usize,
    pub trigger_ns: f64,
    pub carrier_frequency_ghz: f64,
    pub carrier_power_dbm: f64,
    pub settling_rates_ghz: Vec<f64>,
    pub settling_amplitudes: Vec<f64>,
    /// Applied to both channels.
    pub deconvolution_delay_ns: f64,
    pub microwave: Waveform,
    pub bias: Waveform,
    pub microwave_correction: IqCorrection,
    pub bias_correction: DacCorrection,
}

/// One operator setting, all qubits.
#[derive(Debug, Clone)]
pub struct SequenceUpload {
    pub operator: OperatorIndex,
    pub channels: Vec<QubitChannelUpload>,
}

/// The trait every rig must implement.
#[async_trait]
pub trait ExperimentRig: Send + Sync {
    /// Get the rig name.
    fn name(&self) -> &str;

    /// Get the rig type.
    fn rig_type(&self) -> RigType;

    /// Qubits selected for the experiment in `ctx`, in slot order.
    async fn involved_qubits(&self, ctx: ContextHandle) -> Result<Vec<String>, HardwareError>;

    /// Boards that carry the microwave and bias channels of `qubit`.
    fn channel_boards(&self, qubit: &str) -> ChannelBoards {
        ChannelBoards {
            microwave: format!("{}-uw", qubit),
            bias: format!("{}-bias", qubit),
        }
    }

    /// Start a new acquisition.
    async fn open_session(
        &self,
        ctx: ContextHandle,
    ) -> Result<Box<dyn AcquisitionSession>, HardwareError>;

    /// Check rig health.
    async fn health_check(&self) -> Result<HealthStatus, HardwareError>;
}

/// A single acquisition on a rig.
#[async_trait]
pub trait AcquisitionSession: Send {
    /// Reset qubit state before adding a setting.
    async fn initialize_qubits(&mut self) -> Result<(), HardwareError>;

    /// Queue the waveforms of one setting.
    async fn upload_sequence(&mut self, upload: SequenceUpload) -> Result<(), HardwareError>;

    /// Add readout for the current setting and report the cutoffs, one per qubit.
    async fn readout_qubits(&mut self) -> Result<Vec<Cutoff>, HardwareError>;

    /// Run every queued setting `repetitions` times.
    async fn run(&mut self, repetitions: u32) -> Result<Vec<f64>, HardwareError>;
}

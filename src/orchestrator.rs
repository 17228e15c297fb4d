// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end Bell experiment runs.
//!
//! A run resolves the parameters of the two involved qubits, uploads one
//! sequence per operator setting, acquires every setting in a single rig
//! run and reduces the raw block to probabilities and a correlator.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use ndarray::{Array3, Axis};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::calibration::{
    dac_correction, iq_correction, CalibrationPolicy, CalibrationStore, CalibrationTable,
    DacChannel, DacCorrection, IqCorrection,
};
use crate::config::{Config, ResourceLimits};
use crate::correlator::{correlate, CorrelatorResult};
use crate::error::{Error, Result, ValidationError};
use crate::hardware::{
    AcquisitionSession, ContextHandle, ExperimentRig, QubitChannelUpload, SequenceUpload,
};
use crate::parameters::{resolve_parameters, ParameterStore, QubitParameters, RegistryTree};
use crate::readout::{classify, Cutoff, ProbabilityVector};
use crate::sequence::{OperatorCount, OperatorIndex, SequenceBuilder};
use crate::validation;

/// Stage of a run, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    SelectQubits,
    ResolveParameters,
    ResolveCalibration,
    Upload,
    Acquire,
    Classify,
    Correlate,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStage::SelectQubits => "select_qubits",
            RunStage::ResolveParameters => "resolve_parameters",
            RunStage::ResolveCalibration => "resolve_calibration",
            RunStage::Upload => "upload",
            RunStage::Acquire => "acquire",
            RunStage::Classify => "classify",
            RunStage::Correlate => "correlate",
        };
        f.write_str(s)
    }
}

/// Fixed hardware setup shared by every run.
#[derive(Debug, Clone)]
pub struct ExperimentSettings {
    pub trigger_length_ns: f64,
    pub deconvolution_delay_ns: f64,
    pub calibration_policy: CalibrationPolicy,
    pub limits: ResourceLimits,
}

impl Default for ExperimentSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ExperimentSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            trigger_length_ns: config.experiment.trigger_length_ns,
            deconvolution_delay_ns: config.experiment.deconvolution_delay_ns,
            calibration_policy: config.calibration.policy,
            limits: config.validation.limits.clone(),
        }
    }
}

/// Runs Bell experiments against any rig.
pub struct Experiment {
    parameters: Arc<dyn ParameterStore>,
    calibration: Arc<dyn CalibrationStore>,
    settings: ExperimentSettings,
    builder: SequenceBuilder,
}

impl Experiment {
    pub fn new(
        parameters: Arc<dyn ParameterStore>,
        calibration: Arc<dyn CalibrationStore>,
        settings: ExperimentSettings,
    ) -> Self {
        Self {
            parameters,
            calibration,
            settings,
            builder: SequenceBuilder::default(),
        }
    }

    /// Build from configuration: the registry file (empty if unset) and the
    /// configured calibration boards.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = match &config.experiment.registry {
            Some(path) => RegistryTree::load(Path::new(path))?,
            None => {
                warn!("No parameter registry configured, every run will miss 'Stats'");
                RegistryTree::new()
            }
        };
        let calibration = CalibrationTable::new(config.calibration.boards.clone());
        Ok(Self::new(
            Arc::new(registry),
            Arc::new(calibration),
            ExperimentSettings::from_config(config),
        ))
    }

    pub fn settings(&self) -> &ExperimentSettings {
        &self.settings
    }

    /// Measure the probability vectors of every setting in `count`.
    ///
    /// Single runs measure the one setting picked by the `Sequence`
    /// parameter. The vectors are returned in setting order.
    pub async fn run(
        &self,
        rig: &dyn ExperimentRig,
        ctx: ContextHandle,
        count: OperatorCount,
    ) -> Result<Vec<ProbabilityVector>> {
        let span = info_span!("bell_run", rig = %rig.name(), context = %ctx, protocol = %count);
        self.run_inner(rig, ctx, count).instrument(span).await
    }

    async fn run_inner(
        &self,
        rig: &dyn ExperimentRig,
        ctx: ContextHandle,
        count: OperatorCount,
    ) -> Result<Vec<ProbabilityVector>> {
        debug!(stage = %RunStage::SelectQubits);
        let qubits = rig.involved_qubits(ctx).await?;
        if qubits.len() != 2 {
            return Err(Error::NeedTwoQubits {
                found: qubits.len(),
            });
        }

        debug!(stage = %RunStage::ResolveParameters, qubits = ?qubits);
        let set = resolve_parameters(self.parameters.as_ref(), &qubits).await?;
        let repetitions = set.stats();
        validation::validate_repetitions(repetitions, &self.settings.limits)?;
        let params = qubits
            .iter()
            .map(|q| -> Result<QubitParameters> {
                let p = QubitParameters::extract(&set, q)?;
                validation::validate_qubit_parameters(&p, &self.settings.limits)?;
                Ok(p)
            })
            .collect::<Result<Vec<_>>>()?;

        let operators = match count {
            OperatorCount::Single => vec![OperatorIndex::from_sequence_selector(set.sequence())?],
            _ => (0..count.settings())
                .map(|i| OperatorIndex::new(i, count))
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };

        debug!(stage = %RunStage::ResolveCalibration);
        let corrections = self.resolve_corrections(rig, &params).await?;

        let mut session = rig.open_session(ctx).await?;
        debug!(stage = %RunStage::Upload, settings = operators.len());
        let cutoffs = self
            .upload_all(session.as_mut(), &params, &corrections, &operators)
            .await?;

        debug!(stage = %RunStage::Acquire, repetitions);
        let raw = session.run(repetitions).await?;

        debug!(stage = %RunStage::Classify);
        let probabilities = deinterlace_and_classify(&cutoffs, raw, repetitions, operators.len())?;
        for (operator, p) in operators.iter().zip(&probabilities) {
            info!(operator = %operator, probabilities = %p, "Setting measured");
        }
        Ok(probabilities)
    }

    /// Calibration of the microwave and bias boards of each qubit.
    async fn resolve_corrections(
        &self,
        rig: &dyn ExperimentRig,
        params: &[QubitParameters],
    ) -> Result<Vec<(IqCorrection, DacCorrection)>> {
        let policy = self.settings.calibration_policy;
        let store = self.calibration.as_ref();
        let mut corrections = Vec::with_capacity(params.len());
        for p in params {
            let boards = rig.channel_boards(&p.name);
            corrections.push((
                iq_correction(store, &boards.microwave, policy).await?,
                dac_correction(store, &boards.bias, DacChannel::A, policy).await?,
            ));
        }
        Ok(corrections)
    }

    fn channel_upload(
        &self,
        params: &QubitParameters,
        slot: usize,
        operator: OperatorIndex,
        corrections: &(IqCorrection, DacCorrection),
    ) -> Result<QubitChannelUpload> {
        let sequence = self.builder.build(params, slot, operator)?;
        Ok(QubitChannelUpload {
            qubit: params.name.clone(),
            slot,
            trigger_ns: self.settings.trigger_length_ns,
            carrier_frequency_ghz: params.carrier_frequency_ghz(),
            carrier_power_dbm: params.carrier_power_dbm,
            settling_rates_ghz: params.settling_rates_ghz.clone(),
            settling_amplitudes: params.settling_amplitudes.clone(),
            deconvolution_delay_ns: self.settings.deconvolution_delay_ns,
            microwave: sequence.microwave,
            bias: sequence.bias,
            microwave_correction: corrections.0.clone(),
            bias_correction: corrections.1.clone(),
        })
    }

    /// Upload and read out every setting. Returns the cutoffs of the last one.
    async fn upload_all(
        &self,
        session: &mut dyn AcquisitionSession,
        params: &[QubitParameters],
        corrections: &[(IqCorrection, DacCorrection)],
        operators: &[OperatorIndex],
    ) -> Result<Vec<Cutoff>> {
        let mut cutoffs = Vec::new();
        for &operator in operators {
            session.initialize_qubits().await?;
            let channels = params
                .iter()
                .zip(corrections)
                .enumerate()
                .map(|(slot, (p, c))| self.channel_upload(p, slot, operator, c))
                .collect::<Result<Vec<_>>>()?;
            session
                .upload_sequence(SequenceUpload { operator, channels })
                .await?;
            cutoffs = session.readout_qubits().await?;
            debug!(operator = %operator, cutoffs = ?cutoffs, "Setting uploaded");
        }
        Ok(cutoffs)
    }

    /// Run and reduce to the correlator of `count`.
    pub async fn measure(
        &self,
        rig: &dyn ExperimentRig,
        ctx: ContextHandle,
        count: OperatorCount,
    ) -> Result<CorrelatorResult> {
        let probabilities = self.run(rig, ctx, count).await?;
        debug!(stage = %RunStage::Correlate);
        let result = correlate(count, &probabilities)?;
        info!(protocol = %count, summary = ?result.summary(), "Run complete");
        Ok(result)
    }

    pub async fn run_single(
        &self,
        rig: &dyn ExperimentRig,
        ctx: ContextHandle,
    ) -> Result<CorrelatorResult> {
        self.measure(rig, ctx, OperatorCount::Single).await
    }

    pub async fn run_chsh(
        &self,
        rig: &dyn ExperimentRig,
        ctx: ContextHandle,
    ) -> Result<CorrelatorResult> {
        self.measure(rig, ctx, OperatorCount::Chsh).await
    }

    pub async fn run_korotkov(
        &self,
        rig: &dyn ExperimentRig,
        ctx: ContextHandle,
    ) -> Result<CorrelatorResult> {
        self.measure(rig, ctx, OperatorCount::Korotkov).await
    }
}

/// Split the flat `[qubit][repetition][setting]` block by setting and
/// classify each `[repetition][qubit]` slice.
pub fn deinterlace_and_classify(
    cutoffs: &[Cutoff],
    raw: Vec<f64>,
    repetitions: u32,
    settings: usize,
) -> Result<Vec<ProbabilityVector>> {
    let shape = (cutoffs.len(), repetitions as usize, settings);
    let actual = raw.len();
    let block = Array3::from_shape_vec(shape, raw).map_err(|_| ValidationError::ShapeMismatch {
        what: "raw acquisition".into(),
        expected: format!("[{}, {}, {}]", shape.0, shape.1, shape.2),
        actual: format!("{} samples", actual),
    })?;

    block
        .axis_iter(Axis(2))
        .map(|setting| -> Result<ProbabilityVector> {
            let p = classify(cutoffs, setting.reversed_axes())?;
            validation::validate_probabilities(&p)?;
            Ok(p)
        })
        .collect()
}

// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Readout classification.
//!
//! Raw switching values are binarized per qubit against a signed cutoff and
//! the resulting bit patterns counted into joint-state probabilities.

use std::fmt;
use std::ops::Index;

use ndarray::{ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Divisor applied to raw readout values before thresholding.
pub const READOUT_SCALE: f64 = 25.0;

/// Per-qubit readout cutoff.
///
/// A negative `threshold` inverts the polarity: values *below* `|threshold|`
/// then read as `|1>`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cutoff {
    /// Calibration scale reported with the cutoff. Not used for classification.
    pub scale: f64,
    pub threshold: f64,
}

impl Cutoff {
    pub fn new(scale: f64, threshold: f64) -> Self {
        Self { scale, threshold }
    }

    /// Whether raw value `raw` reads as `|1>`.
    pub fn is_one(&self, raw: f64) -> bool {
        (raw / READOUT_SCALE > self.threshold.abs()) ^ (self.threshold < 0.0)
    }
}

/// Joint-state occupation probabilities.
///
/// Entry `s` is the fraction of repetitions in state `s`, where bit `q` of
/// `s` is the state of qubit `q`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProbabilityVector(Vec<f64>);

impl ProbabilityVector {
    /// Wrap raw probabilities. The length must be a power of two.
    pub fn new(probabilities: Vec<f64>) -> Result<Self> {
        if !probabilities.len().is_power_of_two() {
            return Err(ValidationError::ShapeMismatch {
                what: "probability vector".into(),
                expected: "a power-of-two length".into(),
                actual: probabilities.len().to_string(),
            }
            .into());
        }
        Ok(Self(probabilities))
    }

    /// Number of qubits the vector describes.
    pub fn qubits(&self) -> usize {
        self.0.len().trailing_zeros() as usize
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Everything but the all-zero state.
    pub fn excited(&self) -> &[f64] {
        &self.0[1..]
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }
}

impl Index<usize> for ProbabilityVector {
    type Output = f64;

    fn index(&self, state: usize) -> &f64 {
        &self.0[state]
    }
}

impl fmt::Display for ProbabilityVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.qubits();
        let parts: Vec<String> = self
            .0
            .iter()
            .enumerate()
            .map(|(s, p)| format!("|{:0width$b}>={:.4}", s, p, width = width))
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Classify `data` (`[repetition][qubit]`) into joint-state probabilities.
pub fn classify(cutoffs: &[Cutoff], data: ArrayView2<'_, f64>) -> Result<ProbabilityVector> {
    let (repetitions, columns) = data.dim();
    if columns != cutoffs.len() {
        return Err(ValidationError::ShapeMismatch {
            what: "readout data".into(),
            expected: format!("{} qubit columns", cutoffs.len()),
            actual: format!("{} columns", columns),
        }
        .into());
    }
    if repetitions == 0 {
        return Err(ValidationError::Field {
            field: "repetitions".into(),
            message: "cannot classify an empty acquisition".into(),
        }
        .into());
    }

    let mut counts = vec![0usize; 1 << cutoffs.len()];
    for row in data.axis_iter(Axis(0)) {
        let state = row
            .iter()
            .zip(cutoffs)
            .enumerate()
            .filter(|(_, (raw, cutoff))| cutoff.is_one(**raw))
            .fold(0usize, |acc, (qubit, _)| acc | (1 << qubit));
        counts[state] += 1;
    }

    let total = repetitions as f64;
    ProbabilityVector::new(counts.into_iter().map(|c| c as f64 / total).collect())
}

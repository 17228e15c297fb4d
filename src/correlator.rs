// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bell correlators from per-setting probability vectors.
//!
//! Two-qubit state indices follow the readout convention: bit 0 is qubit 0,
//! so `p[1]` has only qubit 0 excited and `p[2]` only qubit 1.

use serde::Serialize;

use crate::error::{Result, ValidationError};
use crate::readout::ProbabilityVector;
use crate::sequence::OperatorCount;

/// Output of a correlator computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "protocol", rename_all = "snake_case")]
pub enum CorrelatorResult {
    Single {
        /// `P(01), P(10), P(11)` of the single setting
        probabilities: Vec<f64>,
    },
    Chsh {
        /// Excited-state probabilities of each setting, concatenated
        probabilities: Vec<f64>,
        /// `E(AB), E(A'B), E(AB'), E(A'B')`
        correlations: [f64; 4],
        s: f64,
    },
    Korotkov {
        probabilities: Vec<f64>,
        /// `R(AB), R(A'B), R(AB'), R(A'B'), R(A'), R(B)`
        r: [f64; 6],
        t: f64,
    },
}

impl CorrelatorResult {
    /// Flat vector: probabilities, then the intermediate terms, then the
    /// correlator.
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            CorrelatorResult::Single { probabilities } => probabilities.clone(),
            CorrelatorResult::Chsh {
                probabilities,
                correlations,
                s,
            } => probabilities
                .iter()
                .chain(correlations.iter())
                .chain(std::iter::once(s))
                .copied()
                .collect(),
            CorrelatorResult::Korotkov { probabilities, r, t } => probabilities
                .iter()
                .chain(r.iter())
                .chain(std::iter::once(t))
                .copied()
                .collect(),
        }
    }

    /// The headline value alone (`S` or `T`); the probabilities for a
    /// single run.
    pub fn summary(&self) -> Vec<f64> {
        match self {
            CorrelatorResult::Single { probabilities } => probabilities.clone(),
            CorrelatorResult::Chsh { s, .. } => vec![*s],
            CorrelatorResult::Korotkov { t, .. } => vec![*t],
        }
    }
}

fn check(probs: &[ProbabilityVector], count: OperatorCount) -> Result<()> {
    if probs.len() != count.settings() {
        return Err(ValidationError::ShapeMismatch {
            what: format!("{} correlator input", count),
            expected: format!("{} probability vectors", count.settings()),
            actual: probs.len().to_string(),
        }
        .into());
    }
    for (i, p) in probs.iter().enumerate() {
        if p.len() != 4 {
            return Err(ValidationError::ShapeMismatch {
                what: format!("probability vector {}", i),
                expected: "4 two-qubit states".into(),
                actual: p.len().to_string(),
            }
            .into());
        }
    }
    Ok(())
}

fn excited(probs: &[ProbabilityVector]) -> Vec<f64> {
    probs.iter().flat_map(|p| p.excited().iter().copied()).collect()
}

/// Correlation `E = P(00) - P(01) - P(10) + P(11)`.
pub fn correlation(p: &ProbabilityVector) -> f64 {
    p[0] - p[1] - p[2] + p[3]
}

pub fn single(probs: &[ProbabilityVector]) -> Result<CorrelatorResult> {
    check(probs, OperatorCount::Single)?;
    Ok(CorrelatorResult::Single {
        probabilities: probs[0].excited().to_vec(),
    })
}

/// CHSH `S = E(AB) + E(A'B) - E(AB') + E(A'B')`.
pub fn chsh(probs: &[ProbabilityVector]) -> Result<CorrelatorResult> {
    check(probs, OperatorCount::Chsh)?;
    let correlations = [
        correlation(&probs[0]),
        correlation(&probs[1]),
        correlation(&probs[2]),
        correlation(&probs[3]),
    ];
    let s = correlations[0] + correlations[1] - correlations[2] + correlations[3];
    Ok(CorrelatorResult::Chsh {
        probabilities: excited(probs),
        correlations,
        s,
    })
}

/// Korotkov `T = R(AB) + R(A'B) - R(AB') + R(A'B') - R(A') - R(B)`.
///
/// `R` is the ground-state probability of each setting. The single-qubit
/// settings also count the state where only the unpulsed qubit is excited.
pub fn korotkov(probs: &[ProbabilityVector]) -> Result<CorrelatorResult> {
    check(probs, OperatorCount::Korotkov)?;
    let mut r = [0.0; 6];
    for (ri, p) in r.iter_mut().zip(probs) {
        *ri = p[0];
    }
    r[4] += probs[4][2];
    r[5] += probs[5][1];
    let t = r[0] + r[1] - r[2] + r[3] - r[4] - r[5];
    Ok(CorrelatorResult::Korotkov {
        probabilities: excited(probs),
        r,
        t,
    })
}

/// Dispatch on the operator count of a run.
pub fn correlate(count: OperatorCount, probs: &[ProbabilityVector]) -> Result<CorrelatorResult> {
    match count {
        OperatorCount::Single => single(probs),
        OperatorCount::Chsh => chsh(probs),
        OperatorCount::Korotkov => korotkov(probs),
    }
}

// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Frequency-domain waveform synthesis.
//!
//! Control waveforms are never built in the time domain. Each pulse has a
//! closed-form Fourier transform which is evaluated directly on the grid
//! the DAC board expects:
//!
//! - [`FrequencyGrid`]: the bin layout (bipolar microwave, baseband bias)
//! - [`PulseSpec`]: a single pulse: Gaussian, Z step or measure ramp
//! - [`Waveform`]: complex samples on a grid, additive
//!
//! Times are in ns and frequencies in GHz throughout.

pub mod grid;
pub mod shapes;

pub use grid::{FrequencyGrid, GridKind, BIAS_BINS, MICROWAVE_BINS};
pub use shapes::{gaussian_envelope, ramp_pulse, z_pulse, PulseShape, PulseSpec, EDGE_NS};

use std::ops::Add;

use ndarray::Array1;
use num_complex::Complex64;

use crate::error::{Result, ValidationError};

/// Complex spectrum samples tied to the grid they were evaluated on.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    grid: FrequencyGrid,
    samples: Array1<Complex64>,
}

impl Waveform {
    /// An all-zero waveform.
    pub fn zeros(grid: FrequencyGrid) -> Self {
        Self {
            grid,
            samples: Array1::zeros(grid.len()),
        }
    }

    /// Wrap existing samples. The sample count must match the grid.
    pub fn from_samples(grid: FrequencyGrid, samples: Array1<Complex64>) -> Result<Self> {
        if samples.len() != grid.len() {
            return Err(ValidationError::ShapeMismatch {
                what: format!("waveform on {}", grid),
                expected: format!("{} samples", grid.len()),
                actual: format!("{} samples", samples.len()),
            }
            .into());
        }
        Ok(Self { grid, samples })
    }

    pub fn grid(&self) -> FrequencyGrid {
        self.grid
    }

    pub fn samples(&self) -> &Array1<Complex64> {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples as `(re, im)` pairs.
    pub fn iq_pairs(&self) -> Vec<(f64, f64)> {
        self.samples.iter().map(|c| (c.re, c.im)).collect()
    }

    /// Pointwise sum, failing if the grids differ.
    pub fn try_add(&self, other: &Waveform) -> Result<Waveform> {
        self.check_grid(other)?;
        Ok(Waveform {
            grid: self.grid,
            samples: &self.samples + &other.samples,
        })
    }

    /// Add `other` into `self` in place, failing if the grids differ.
    pub fn accumulate(&mut self, other: &Waveform) -> Result<()> {
        self.check_grid(other)?;
        self.samples += &other.samples;
        Ok(())
    }

    fn check_grid(&self, other: &Waveform) -> Result<()> {
        if self.grid != other.grid {
            return Err(ValidationError::GridMismatch {
                left: self.grid.to_string(),
                right: other.grid.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Pointwise sum.
///
/// # Panics
///
/// Panics if the operands live on different grids. Use
/// [`Waveform::try_add`] where the grids are not known to agree.
impl Add for Waveform {
    type Output = Waveform;

    fn add(mut self, rhs: Waveform) -> Waveform {
        assert_eq!(
            self.grid, rhs.grid,
            "cannot add waveforms on different frequency grids"
        );
        self.samples += &rhs.samples;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gaussian(offset: f64, phase: f64) -> Waveform {
        gaussian_envelope(&FrequencyGrid::microwave(), offset, 8.0, 0.5, -0.15, phase)
    }

    fn assert_close(a: &Waveform, b: &Waveform) {
        assert_eq!(a.grid(), b.grid());
        for (x, y) in a.samples().iter().zip(b.samples().iter()) {
            assert!((x - y).norm() < 1e-9, "{} != {}", x, y);
        }
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn test_zeros() {
        let w = Waveform::zeros(FrequencyGrid::bias());
        assert_eq!(w.len(), 512);
        assert!(w.samples().iter().all(|c| c.norm() == 0.0));
    }

    #[test]
    fn test_from_samples_length_mismatch() {
        let result = Waveform::from_samples(FrequencyGrid::bias(), Array1::zeros(100));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("512 samples"));
    }

    #[test]
    fn test_iq_pairs() {
        let samples = Array1::from_vec(vec![Complex64::new(1.0, -2.0); 4]);
        let w = Waveform::from_samples(FrequencyGrid::bipolar(4), samples).unwrap();
        assert_eq!(w.iq_pairs(), vec![(1.0, -2.0); 4]);
    }

    // =========================================================================
    // Addition
    // =========================================================================

    #[test]
    fn test_try_add_grid_mismatch() {
        let a = Waveform::zeros(FrequencyGrid::microwave());
        let b = Waveform::zeros(FrequencyGrid::bias());
        let err = a.try_add(&b).unwrap_err();
        assert!(err.to_string().contains("grid mismatch"));
    }

    #[test]
    fn test_accumulate_grid_mismatch_leaves_target() {
        let mut a = gaussian(50.0, 0.0);
        let before = a.clone();
        assert!(a.accumulate(&Waveform::zeros(FrequencyGrid::bias())).is_err());
        assert_eq!(a, before);
    }

    #[test]
    #[should_panic(expected = "different frequency grids")]
    fn test_add_operator_panics_on_mismatch() {
        let _ = Waveform::zeros(FrequencyGrid::microwave()) + Waveform::zeros(FrequencyGrid::bias());
    }

    #[test]
    fn test_add_zero_is_identity() {
        let a = gaussian(40.0, 0.3);
        let sum = a.clone() + Waveform::zeros(FrequencyGrid::microwave());
        assert_close(&sum, &a);
    }

    proptest! {
        #[test]
        fn prop_addition_associative_and_commutative(
            t1 in 0.0f64..500.0,
            t2 in 0.0f64..500.0,
            t3 in 0.0f64..500.0,
            phase in -3.2f64..3.2,
        ) {
            let a = gaussian(t1, phase);
            let b = gaussian(t2, 0.0);
            let c = gaussian(t3, -phase);

            let left = (a.clone() + b.clone()) + c.clone();
            let right = a.clone() + (b.clone() + c.clone());
            let swapped = a + (c + b);

            for ((x, y), z) in left.samples().iter().zip(right.samples()).zip(swapped.samples()) {
                prop_assert!((x - y).norm() < 1e-9);
                prop_assert!((x - z).norm() < 1e-9);
            }
        }
    }
}

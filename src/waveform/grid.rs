// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Frequency grids used for waveform upload.
//!
//! The DAC boards run at 1 GS/s, so frequencies are expressed in GHz and a
//! grid of `n` bins has a spacing of `1/n` GHz on the microwave channel.

use std::fmt;

use ndarray::Array1;

/// Number of bins on the microwave (IQ) grid.
pub const MICROWAVE_BINS: usize = 1024;

/// Number of bins on the bias/measure grid.
pub const BIAS_BINS: usize = MICROWAVE_BINS / 2;

/// Layout of a frequency grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridKind {
    /// `[-0.5, 0.5)` GHz in FFT order: `0, 1/n, …, 0.5-1/n, -0.5, …, -1/n`.
    Bipolar,
    /// `[0, 0.5)` GHz, ascending.
    Baseband,
}

/// A discrete set of frequencies a waveform is evaluated on.
///
/// Two grids are equal only if both their layout and their bin count match;
/// waveforms on unequal grids cannot be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrequencyGrid {
    kind: GridKind,
    bins: usize,
}

impl FrequencyGrid {
    /// Bipolar grid with `bins` points.
    pub fn bipolar(bins: usize) -> Self {
        Self {
            kind: GridKind::Bipolar,
            bins,
        }
    }

    /// Baseband grid with `bins` points spanning `[0, 0.5)`.
    pub fn baseband(bins: usize) -> Self {
        Self {
            kind: GridKind::Baseband,
            bins,
        }
    }

    /// The microwave drive grid.
    pub fn microwave() -> Self {
        Self::bipolar(MICROWAVE_BINS)
    }

    /// The bias/measure grid.
    pub fn bias() -> Self {
        Self::baseband(BIAS_BINS)
    }

    pub fn kind(&self) -> GridKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.bins
    }

    pub fn is_empty(&self) -> bool {
        self.bins == 0
    }

    /// Frequency of `bin` in GHz.
    pub fn frequency(&self, bin: usize) -> f64 {
        let n = self.bins as f64;
        match self.kind {
            GridKind::Bipolar => {
                let f = bin as f64 / n;
                if f >= 0.5 {
                    f - 1.0
                } else {
                    f
                }
            }
            GridKind::Baseband => 0.5 * bin as f64 / n,
        }
    }

    /// All grid frequencies in GHz.
    pub fn frequencies(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.bins, |k| self.frequency(k))
    }
}

impl fmt::Display for FrequencyGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            GridKind::Bipolar => write!(f, "bipolar({})", self.bins),
            GridKind::Baseband => write!(f, "baseband({})", self.bins),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_microwave_grid_fft_order() {
        let grid = FrequencyGrid::microwave();
        assert_eq!(grid.len(), 1024);
        assert_eq!(grid.frequency(0), 0.0);
        assert_eq!(grid.frequency(1), 1.0 / 1024.0);
        assert_eq!(grid.frequency(511), 511.0 / 1024.0);
        assert_eq!(grid.frequency(512), -0.5);
        assert_eq!(grid.frequency(1023), -1.0 / 1024.0);
    }

    #[test]
    fn test_bias_grid_baseband() {
        let grid = FrequencyGrid::bias();
        let freqs = grid.frequencies();
        assert_eq!(freqs.len(), 512);
        assert_eq!(freqs[0], 0.0);
        assert_eq!(freqs[1], 1.0 / 1024.0);
        assert!(freqs.iter().all(|&f| (0.0..0.5).contains(&f)));
    }

    #[test]
    fn test_grid_equality() {
        assert_eq!(FrequencyGrid::microwave(), FrequencyGrid::bipolar(1024));
        assert_ne!(FrequencyGrid::bipolar(512), FrequencyGrid::baseband(512));
        assert_ne!(FrequencyGrid::bipolar(512), FrequencyGrid::bipolar(256));
    }

    #[test]
    fn test_grid_display() {
        assert_eq!(FrequencyGrid::microwave().to_string(), "bipolar(1024)");
        assert_eq!(FrequencyGrid::bias().to_string(), "baseband(512)");
    }
}

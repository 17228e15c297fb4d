// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Closed-form pulse spectra.
//!
//! All transforms use `X(f) = ∫ x(t) exp(-2πi f t) dt` with `t` in ns and
//! `f` in GHz. A pulse centered at `t0` therefore carries the phase ramp
//! `exp(-2πi f t0)`.

use std::f64::consts::{LN_2, PI};

use ndarray::Array1;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::grid::FrequencyGrid;
use super::Waveform;

/// Width of the linear edges of bias pulses, in ns (one DAC sample).
pub const EDGE_NS: f64 = 1.0;

/// Shape-specific pulse parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PulseShape {
    /// Gaussian envelope modulated at `frequency_ghz` with initial phase.
    ///
    /// `half_width_ns` is the half width at half maximum.
    Gaussian {
        half_width_ns: f64,
        frequency_ghz: f64,
        phase_rad: f64,
    },
    /// Bias plateau of `length_ns` with an `overshoot` bump on the leading edge.
    ZPulse { length_ns: f64, overshoot: f64 },
    /// Measure pulse: 1 ns rise, flat top, linear tail.
    Ramp { top_ns: f64, tail_ns: f64 },
}

/// A single pulse placed on the run's common timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseSpec {
    /// Reference time in ns: the center of a Gaussian, the start of a Z or
    /// ramp pulse.
    pub offset_ns: f64,
    /// Normalized amplitude (DAC units).
    pub amplitude: f64,
    pub shape: PulseShape,
}

impl PulseSpec {
    pub fn gaussian(
        offset_ns: f64,
        half_width_ns: f64,
        amplitude: f64,
        frequency_ghz: f64,
        phase_rad: f64,
    ) -> Self {
        Self {
            offset_ns,
            amplitude,
            shape: PulseShape::Gaussian {
                half_width_ns,
                frequency_ghz,
                phase_rad,
            },
        }
    }

    pub fn z_pulse(offset_ns: f64, length_ns: f64, amplitude: f64, overshoot: f64) -> Self {
        Self {
            offset_ns,
            amplitude,
            shape: PulseShape::ZPulse {
                length_ns,
                overshoot,
            },
        }
    }

    pub fn ramp(offset_ns: f64, top_ns: f64, tail_ns: f64, amplitude: f64) -> Self {
        Self {
            offset_ns,
            amplitude,
            shape: PulseShape::Ramp { top_ns, tail_ns },
        }
    }

    /// Nominal duration in ns.
    pub fn duration_ns(&self) -> f64 {
        match self.shape {
            PulseShape::Gaussian { half_width_ns, .. } => 2.0 * half_width_ns,
            PulseShape::ZPulse { length_ns, .. } => length_ns,
            PulseShape::Ramp { top_ns, tail_ns } => EDGE_NS + top_ns + tail_ns,
        }
    }

    /// Fourier transform at frequency `f` (GHz).
    pub fn spectrum_at(&self, f: f64) -> Complex64 {
        let t0 = self.offset_ns;
        let a = self.amplitude;
        match self.shape {
            PulseShape::Gaussian {
                half_width_ns,
                frequency_ghz,
                phase_rad,
            } => gaussian_spectrum(t0, half_width_ns, a, frequency_ghz, phase_rad, f),
            PulseShape::ZPulse {
                length_ns,
                overshoot,
            } => z_spectrum(t0, length_ns, a, overshoot, f),
            PulseShape::Ramp { top_ns, tail_ns } => {
                let rise_end = t0 + EDGE_NS;
                let top_end = rise_end + top_ns.max(0.0);
                let tail_end = top_end + tail_ns.max(0.0);
                piecewise_linear_spectrum(
                    &[(t0, 0.0), (rise_end, a), (top_end, a), (tail_end, 0.0)],
                    f,
                )
            }
        }
    }

    /// Evaluate on every point of `grid`.
    pub fn evaluate(&self, grid: &FrequencyGrid) -> Waveform {
        Waveform {
            grid: *grid,
            samples: Array1::from_shape_fn(grid.len(), |k| self.spectrum_at(grid.frequency(k))),
        }
    }
}

/// Gaussian-windowed sinusoid centered at `offset`.
pub fn gaussian_envelope(
    grid: &FrequencyGrid,
    offset: f64,
    half_width: f64,
    amplitude: f64,
    frequency: f64,
    phase: f64,
) -> Waveform {
    PulseSpec::gaussian(offset, half_width, amplitude, frequency, phase).evaluate(grid)
}

/// Bias step of `length` starting at `offset`.
pub fn z_pulse(
    grid: &FrequencyGrid,
    offset: f64,
    length: f64,
    amplitude: f64,
    overshoot: f64,
) -> Waveform {
    PulseSpec::z_pulse(offset, length, amplitude, overshoot).evaluate(grid)
}

/// Measure pulse starting at `offset`.
pub fn ramp_pulse(
    grid: &FrequencyGrid,
    offset: f64,
    top_length: f64,
    tail_length: f64,
    amplitude: f64,
) -> Waveform {
    PulseSpec::ramp(offset, top_length, tail_length, amplitude).evaluate(grid)
}

// =============================================================================
// Spectra
// =============================================================================

fn gaussian_spectrum(
    t0: f64,
    half_width: f64,
    amplitude: f64,
    f0: f64,
    phase: f64,
    f: f64,
) -> Complex64 {
    if half_width <= 0.0 {
        return Complex64::new(0.0, 0.0);
    }
    let sigma = half_width / (2.0 * LN_2).sqrt();
    let df = f - f0;
    let magnitude =
        amplitude * sigma * (2.0 * PI).sqrt() * (-2.0 * PI * PI * sigma * sigma * df * df).exp();
    Complex64::from_polar(magnitude, phase - 2.0 * PI * f * t0)
}

/// Plateau `[t0, t0+length]` smoothed by a unit-area box of width
/// [`EDGE_NS`], plus the overshoot bump (an `EDGE_NS` rectangle at `t0`
/// smoothed the same way, i.e. a triangle peaking at `t0 + EDGE_NS/2`).
fn z_spectrum(t0: f64, length: f64, amplitude: f64, overshoot: f64, f: f64) -> Complex64 {
    let length = length.max(0.0);
    let edge = sinc(f * EDGE_NS);
    let plateau = Complex64::from_polar(
        amplitude * length * sinc(f * length) * edge,
        -2.0 * PI * f * (t0 + 0.5 * length),
    );
    let bump = Complex64::from_polar(
        overshoot * EDGE_NS * edge * edge,
        -2.0 * PI * f * (t0 + 0.5 * EDGE_NS),
    );
    plateau + bump
}

/// Exact transform of a continuous piecewise-linear function through
/// `points` (time, value), zero outside. Zero-length segments contribute
/// nothing, so vertical steps are allowed.
fn piecewise_linear_spectrum(points: &[(f64, f64)], f: f64) -> Complex64 {
    let omega = 2.0 * PI * f;
    points
        .windows(2)
        .filter(|w| w[1].0 > w[0].0)
        .map(|w| {
            let ((a, ya), (b, yb)) = (w[0], w[1]);
            let h = 0.5 * (b - a);
            let center = 0.5 * (a + b);
            let mean = 0.5 * (ya + yb);
            let slope_half = 0.5 * (yb - ya);
            let x = omega * h;
            let body = Complex64::new(
                2.0 * h * mean * sin_over_x(x),
                -2.0 * h * slope_half * spherical_j1(x),
            );
            body * Complex64::from_polar(1.0, -omega * center)
        })
        .sum()
}

/// Normalized sinc, `sin(πx)/(πx)`.
fn sinc(x: f64) -> f64 {
    sin_over_x(PI * x)
}

fn sin_over_x(x: f64) -> f64 {
    if x.abs() < 1e-4 {
        1.0 - x * x / 6.0
    } else {
        x.sin() / x
    }
}

/// `(sin x − x cos x) / x²`
fn spherical_j1(x: f64) -> f64 {
    if x.abs() < 1e-3 {
        x / 3.0 - x * x * x / 30.0
    } else {
        (x.sin() - x * x.cos()) / (x * x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rustfft::FftPlanner;

    /// Trapezoidal-rule transform of a time-domain function on `[t_lo, t_hi]`.
    fn numeric_transform(x: impl Fn(f64) -> f64, t_lo: f64, t_hi: f64, f: f64) -> Complex64 {
        let steps = 200_000;
        let dt = (t_hi - t_lo) / steps as f64;
        let mut acc = Complex64::new(0.0, 0.0);
        for i in 0..=steps {
            let t = t_lo + i as f64 * dt;
            let w = if i == 0 || i == steps { 0.5 } else { 1.0 };
            acc += Complex64::from_polar(w * x(t) * dt, -2.0 * PI * f * t);
        }
        acc
    }

    fn ramp_time_domain(t0: f64, top: f64, tail: f64, amp: f64) -> impl Fn(f64) -> f64 {
        move |t| {
            let u = t - t0;
            if u <= 0.0 {
                0.0
            } else if u < EDGE_NS {
                amp * u / EDGE_NS
            } else if u <= EDGE_NS + top {
                amp
            } else if u < EDGE_NS + top + tail {
                amp * (1.0 - (u - EDGE_NS - top) / tail)
            } else {
                0.0
            }
        }
    }

    // =========================================================================
    // Gaussian
    // =========================================================================

    #[test]
    fn test_gaussian_dc_area() {
        // HWHM 8 ns -> sigma = 8 / sqrt(2 ln 2)
        let pulse = PulseSpec::gaussian(100.0, 8.0, 0.5, 0.0, 0.0);
        let sigma = 8.0 / (2.0 * LN_2).sqrt();
        let expected = 0.5 * sigma * (2.0 * PI).sqrt();
        let value = pulse.spectrum_at(0.0);
        assert_relative_eq!(value.re, expected, epsilon = 1e-12);
        assert_relative_eq!(value.im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gaussian_peak_at_modulation_frequency() {
        let pulse = PulseSpec::gaussian(0.0, 10.0, 1.0, -0.15, 0.0);
        let at_carrier = pulse.spectrum_at(-0.15).norm();
        assert!(at_carrier > pulse.spectrum_at(-0.1).norm());
        assert!(at_carrier > pulse.spectrum_at(-0.2).norm());
        assert!(at_carrier > 1e3 * pulse.spectrum_at(0.15).norm());
    }

    #[test]
    fn test_gaussian_phase_and_delay() {
        let pulse = PulseSpec::gaussian(25.0, 4.0, 1.0, 0.0, 0.7);
        let f = 0.01;
        let value = pulse.spectrum_at(f);
        assert_relative_eq!(value.arg(), 0.7 - 2.0 * PI * f * 25.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gaussian_zero_width_is_silent() {
        let w = gaussian_envelope(&FrequencyGrid::microwave(), 10.0, 0.0, 1.0, 0.0, 0.0);
        assert!(w.samples().iter().all(|c| c.norm() == 0.0));
    }

    #[test]
    fn test_gaussian_matches_fft_of_sampled_pulse() {
        let grid = FrequencyGrid::microwave();
        let (t0, hwhm, amp, f0, phase) = (300.0, 8.0, 0.5, -0.15, 0.4);
        let sigma = hwhm / (2.0 * LN_2).sqrt();

        // 1 GS/s sampling, one sample per ns over the whole window.
        let mut buffer: Vec<Complex64> = (0..grid.len())
            .map(|n| {
                let u = n as f64 - t0;
                let envelope = amp * (-u * u / (2.0 * sigma * sigma)).exp();
                Complex64::from_polar(envelope, 2.0 * PI * f0 * u + phase)
            })
            .collect();
        FftPlanner::new()
            .plan_fft_forward(grid.len())
            .process(&mut buffer);

        let analytic = gaussian_envelope(&grid, t0, hwhm, amp, f0, phase);
        let peak = analytic.samples().iter().map(|c| c.norm()).fold(0.0, f64::max);
        for (fft, exact) in buffer.iter().zip(analytic.samples().iter()) {
            assert!((fft - exact).norm() < 1e-9 * peak);
        }
    }

    // =========================================================================
    // Z pulse
    // =========================================================================

    #[test]
    fn test_z_pulse_dc_area() {
        let pulse = PulseSpec::z_pulse(40.0, 16.0, 0.1, 0.0);
        assert_relative_eq!(pulse.spectrum_at(0.0).re, 1.6, epsilon = 1e-12);
    }

    #[test]
    fn test_z_pulse_overshoot_adds_area() {
        let plain = PulseSpec::z_pulse(40.0, 16.0, 0.1, 0.0).spectrum_at(0.0);
        let kicked = PulseSpec::z_pulse(40.0, 16.0, 0.1, 0.05).spectrum_at(0.0);
        assert_relative_eq!((kicked - plain).re, 0.05 * EDGE_NS, epsilon = 1e-12);
    }

    #[test]
    fn test_z_pulse_matches_trapezoid() {
        // A plateau smoothed by a 1 ns box is a trapezoid with edges centered
        // on the plateau ends.
        let (t0, len, amp) = (12.0, 16.0, 0.1);
        let half = 0.5 * EDGE_NS;
        let points = [
            (t0 - half, 0.0),
            (t0 + half, amp),
            (t0 + len - half, amp),
            (t0 + len + half, 0.0),
        ];
        let pulse = PulseSpec::z_pulse(t0, len, amp, 0.0);
        for f in [0.0, 1e-7, 0.013, 0.1, 0.37, 0.4990234375] {
            let a = pulse.spectrum_at(f);
            let b = piecewise_linear_spectrum(&points, f);
            assert!((a - b).norm() < 1e-12, "f={}: {} vs {}", f, a, b);
        }
    }

    #[test]
    fn test_z_pulse_negative_length_is_clamped() {
        let pulse = PulseSpec::z_pulse(0.0, -5.0, 1.0, 0.0);
        assert_eq!(pulse.spectrum_at(0.1).norm(), 0.0);
    }

    // =========================================================================
    // Ramp
    // =========================================================================

    #[test]
    fn test_ramp_dc_area() {
        let pulse = PulseSpec::ramp(80.0, 5.0, 15.0, 0.5);
        let expected = 0.5 * (0.5 * EDGE_NS + 5.0 + 0.5 * 15.0);
        assert_relative_eq!(pulse.spectrum_at(0.0).re, expected, epsilon = 1e-12);
        assert_relative_eq!(pulse.spectrum_at(0.0).im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ramp_matches_numeric_integration() {
        let (t0, top, tail, amp) = (80.0, 5.0, 15.0, 0.5);
        let pulse = PulseSpec::ramp(t0, top, tail, amp);
        let x = ramp_time_domain(t0, top, tail, amp);
        for f in [1e-6, 0.01, 0.123, 0.49] {
            let exact = pulse.spectrum_at(f);
            let numeric = numeric_transform(&x, t0 - 1.0, t0 + 25.0, f);
            assert!((exact - numeric).norm() < 1e-6, "f={}: {} vs {}", f, exact, numeric);
        }
    }

    #[test]
    fn test_ramp_zero_tail_is_step() {
        let pulse = PulseSpec::ramp(0.0, 10.0, 0.0, 1.0);
        assert_relative_eq!(pulse.spectrum_at(0.0).re, 0.5 * EDGE_NS + 10.0, epsilon = 1e-12);
        assert!(pulse.spectrum_at(0.2).norm().is_finite());
    }

    #[test]
    fn test_duration() {
        assert_eq!(PulseSpec::gaussian(0.0, 8.0, 1.0, 0.0, 0.0).duration_ns(), 16.0);
        assert_eq!(PulseSpec::z_pulse(0.0, 16.0, 1.0, 0.0).duration_ns(), 16.0);
        assert_eq!(PulseSpec::ramp(0.0, 5.0, 15.0, 1.0).duration_ns(), 21.0);
    }

    #[test]
    fn test_small_frequency_is_stable() {
        let pulse = PulseSpec::ramp(1000.0, 5.0, 15.0, 0.5);
        let dc = pulse.spectrum_at(0.0);
        let near = pulse.spectrum_at(1e-12);
        assert!((dc - near).norm() < 1e-6);
    }
}

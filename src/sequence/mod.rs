// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Control sequences for the Bell experiment.
//!
//! - [`operator`]: which Bell pulse each qubit gets in each setting
//! - [`timeline`]: chained per-qubit event timing
//! - [`builder`]: evaluation into microwave and bias waveforms

pub mod builder;
pub mod operator;
pub mod timeline;

pub use builder::{bias_pulses, microwave_pulses, PulsePlan, QubitSequence, SequenceBuilder};
pub use operator::{bell_pulse, BellPulse, OperatorCount, OperatorIndex, SETTING_COUNT};
pub use timeline::{Timeline, TimelineEntry};

// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! QubitOS Bell-violation experiment server
//!
//! Runs CHSH and Korotkov Bell tests on a pair of coupled qubits: builds the
//! microwave and bias waveforms of every operator setting in the frequency
//! domain, uploads them to a rig, classifies the switching data and reduces
//! it to a correlator.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          REST server (axum)              │
//! ├─────────────────────────────────────────┤
//! │        Dispatcher (operation table)      │
//! ├─────────────────────────────────────────┤
//! │              Experiment                  │
//! ├──────────┬──────────┬───────────────────┤
//! │ sequence │ readout  │ correlator        │
//! │ waveform │          │                   │
//! ├──────────┴──────────┴───────────────────┤
//! │ parameters │ calibration │ hardware rigs │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`waveform`]: Frequency-domain pulse synthesis
//! - [`parameters`]: Registry lookup and unit conversion
//! - [`sequence`]: Operator table, timing and per-qubit waveforms
//! - [`readout`]: Switching-data classification
//! - [`correlator`]: CHSH and Korotkov correlators
//! - [`calibration`]: DAC correction lookup
//! - [`hardware`]: Rig trait, registry and simulator
//! - [`orchestrator`]: End-to-end runs
//! - [`protocol`]: Client operation table
//! - [`server`]: REST server
//! - [`config`]: Configuration management
//! - [`validation`]: Input validation utilities
//! - [`error`]: Error types

pub mod calibration;
pub mod config;
pub mod correlator;
pub mod error;
pub mod hardware;
pub mod orchestrator;
pub mod parameters;
pub mod protocol;
pub mod readout;
pub mod sequence;
pub mod server;
pub mod validation;
pub mod waveform;

pub use config::Config;
pub use error::{Error, Result};

#[cfg(test)]
pub mod test_utils;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

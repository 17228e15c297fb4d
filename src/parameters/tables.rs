// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Declarative parameter tables.
//!
//! Each descriptor names a parameter, where it lives in the registry
//! (relative to the qubit's directory), the unit it is read in, and the
//! default used when the registry has no entry. Defaults are expressed in
//! the descriptor's unit.

use super::units::Unit;

/// Registry directory holding the Bell-experiment parameters of a qubit.
pub const BELL_DIRECTORY: &str = "Bell Violation";

const BELL_PATH: &[&str] = &[BELL_DIRECTORY];

/// Default applied when a registry entry is missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Scalar(f64),
    List(&'static [f64]),
}

/// A per-qubit parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParameterDescriptor {
    /// Name used to look the resolved value up.
    pub name: &'static str,
    /// Directory path below the qubit's directory.
    pub path: &'static [&'static str],
    /// Registry key inside `path`.
    pub key: &'static str,
    pub unit: Unit,
    pub default: DefaultValue,
}

/// Kind of a global parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalKind {
    /// Non-negative integer
    Count,
    /// Boolean switch
    Flag,
}

/// A parameter stored at the registry root.
#[derive(Debug, Clone, Copy)]
pub struct GlobalDescriptor {
    pub name: &'static str,
    pub kind: GlobalKind,
    /// `None` makes the parameter required.
    pub default: Option<f64>,
}

pub const STATS: &str = "Stats";
pub const SEQUENCE: &str = "Sequence";
pub const RESONATOR_COUPLING: &str = "Resonator Coupling";

pub const GLOBAL_PARAMETERS: &[GlobalDescriptor] = &[
    GlobalDescriptor {
        name: STATS,
        kind: GlobalKind::Count,
        default: None,
    },
    GlobalDescriptor {
        name: SEQUENCE,
        kind: GlobalKind::Count,
        default: Some(0.0),
    },
    GlobalDescriptor {
        name: RESONATOR_COUPLING,
        kind: GlobalKind::Flag,
        default: Some(0.0),
    },
];

const fn qubit(
    name: &'static str,
    path: &'static [&'static str],
    key: &'static str,
    unit: Unit,
    default: f64,
) -> ParameterDescriptor {
    ParameterDescriptor {
        name,
        path,
        key,
        unit,
        default: DefaultValue::Scalar(default),
    }
}

const fn bell(name: &'static str, unit: Unit, default: f64) -> ParameterDescriptor {
    ParameterDescriptor {
        name,
        path: BELL_PATH,
        key: name,
        unit,
        default: DefaultValue::Scalar(default),
    }
}

pub const QUBIT_PARAMETERS: &[ParameterDescriptor] = &[
    qubit("Microwave Offset", &["Timing"], "Microwave Offset", Unit::Nanosecond, 50.0),
    qubit("Resonance Frequency", &["Pulse 1"], "Frequency", Unit::Gigahertz, 6.5),
    qubit("Sideband Frequency", &["Microwaves"], "Sideband Frequency", Unit::Gigahertz, -0.15),
    qubit("Carrier Power", &["Microwaves"], "Carrier Power", Unit::Dbm, 2.7),
    qubit("Measure Offset", &["Timing"], "Measure Offset", Unit::Nanosecond, 50.0),
    qubit("Measure Pulse Delay", &["Measure Pulse"], "Delay", Unit::Nanosecond, 5.0),
    qubit("Measure Pulse Amplitude", &["Measure Pulse"], "Amplitude", Unit::Millivolt, 500.0),
    qubit("Measure Pulse Top Length", &["Measure Pulse"], "Top Length", Unit::Nanosecond, 5.0),
    qubit("Measure Pulse Tail Length", &["Measure Pulse"], "Tail Length", Unit::Nanosecond, 15.0),
];

pub const RESONATOR_COUPLING_PARAMETERS: &[ParameterDescriptor] = &[
    ParameterDescriptor {
        name: "Settling Amplitude",
        path: &["Settling"],
        key: "Amplitude",
        unit: Unit::Dimensionless,
        default: DefaultValue::List(&[-0.02]),
    },
    ParameterDescriptor {
        name: "Settling Rate",
        path: &["Settling"],
        key: "Rate",
        unit: Unit::Gigahertz,
        default: DefaultValue::List(&[0.02]),
    },
    qubit("Z Pulse Length", &["Z Pulse 1"], "Length", Unit::Nanosecond, 16.0),
    qubit("Z Pulse Delay", &["Z Pulse 1"], "Delay", Unit::Nanosecond, 10.0),
    qubit("Z Pulse Amplitude", &["Z Pulse 1"], "Amplitude", Unit::Volt, 0.1),
    qubit("Z Pulse Overshoot", &["Z Pulse 1"], "Overshoot", Unit::Volt, 0.0),
    qubit("Second Z Pulse Length", &["Z Pulse 2"], "Length", Unit::Nanosecond, 16.0),
    qubit("Second Z Pulse Delay", &["Z Pulse 2"], "Delay", Unit::Nanosecond, 10.0),
    qubit("Second Z Pulse Amplitude", &["Z Pulse 2"], "Amplitude", Unit::Volt, 0.1),
    qubit("Second Z Pulse Overshoot", &["Z Pulse 2"], "Overshoot", Unit::Volt, 0.0),
];

pub const BELL_PARAMETERS: &[ParameterDescriptor] = &[
    bell("Pi Pulse Amplitude", Unit::Millivolt, 500.0),
    bell("Pi Pulse Phase", Unit::Radian, 0.0),
    bell("Pi Pulse Length", Unit::Nanosecond, 16.0),
    bell("Pi Pulse Frequency Shift", Unit::Gigahertz, 0.0),
    bell("Coupling Time", Unit::Nanosecond, 20.0),
    bell("Bell Pulse Length", Unit::Nanosecond, 10.0),
    bell("Bell Pulse Bias Shift", Unit::Millivolt, 0.0),
    bell("Bell Pulse Frequency Shift", Unit::Gigahertz, 0.0),
    bell("Bell Pulse Amplitude", Unit::Millivolt, 100.0),
    bell("Bell Pulse Phase", Unit::Radian, 0.0),
    bell("Bell Pulse Amplitude'", Unit::Millivolt, 200.0),
    bell("Bell Pulse Phase'", Unit::Radian, 0.0),
    bell("Operating Bias Shift", Unit::Millivolt, 0.0),
];

/// Every per-qubit descriptor, in lookup order.
pub fn all_qubit_parameters() -> impl Iterator<Item = &'static ParameterDescriptor> {
    QUBIT_PARAMETERS
        .iter()
        .chain(RESONATOR_COUPLING_PARAMETERS)
        .chain(BELL_PARAMETERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_parameter_names_unique() {
        let mut seen = HashSet::new();
        for desc in all_qubit_parameters() {
            assert!(seen.insert(desc.name), "duplicate parameter {}", desc.name);
        }
        assert_eq!(seen.len(), 32);
    }

    #[test]
    fn test_bell_parameters_live_in_bell_directory() {
        for desc in BELL_PARAMETERS {
            assert_eq!(desc.path, &[BELL_DIRECTORY]);
            assert_eq!(desc.key, desc.name);
        }
    }

    #[test]
    fn test_only_stats_is_required() {
        let required: Vec<_> = GLOBAL_PARAMETERS
            .iter()
            .filter(|g| g.default.is_none())
            .map(|g| g.name)
            .collect();
        assert_eq!(required, vec![STATS]);
    }

    #[test]
    fn test_settling_defaults_are_lists() {
        for desc in RESONATOR_COUPLING_PARAMETERS.iter().take(2) {
            assert!(matches!(desc.default, DefaultValue::List(_)));
        }
    }
}

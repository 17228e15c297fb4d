// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Operator settings and the Bell pulse applied in each.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of operator settings a protocol measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorCount {
    /// One setting, chosen by the `Sequence` selector
    Single,
    /// `AB, A'B, AB', A'B'`
    Chsh,
    /// CHSH settings plus `A'` and `B` alone
    Korotkov,
}

impl OperatorCount {
    pub fn settings(&self) -> usize {
        match self {
            OperatorCount::Single => 1,
            OperatorCount::Chsh => 4,
            OperatorCount::Korotkov => 6,
        }
    }

    pub fn from_settings(n: usize) -> Option<Self> {
        match n {
            1 => Some(OperatorCount::Single),
            4 => Some(OperatorCount::Chsh),
            6 => Some(OperatorCount::Korotkov),
            _ => None,
        }
    }
}

impl fmt::Display for OperatorCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorCount::Single => write!(f, "single"),
            OperatorCount::Chsh => write!(f, "chsh"),
            OperatorCount::Korotkov => write!(f, "korotkov"),
        }
    }
}

/// Highest physical setting plus one.
pub const SETTING_COUNT: usize = 6;

/// A physical operator setting, `0..6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OperatorIndex(usize);

impl OperatorIndex {
    /// Index `index` of a run measuring `count` settings.
    pub fn new(index: usize, count: OperatorCount) -> Result<Self, ValidationError> {
        if index >= count.settings() {
            return Err(ValidationError::Field {
                field: "operator_index".into(),
                message: format!(
                    "index {} out of range for {} run ({} settings)",
                    index,
                    count,
                    count.settings()
                ),
            });
        }
        Ok(Self(index))
    }

    /// Physical setting picked by the `Sequence` selector of a single run.
    pub fn from_sequence_selector(selector: u32) -> Result<Self, ValidationError> {
        let index = selector as usize;
        if index >= SETTING_COUNT {
            return Err(ValidationError::Field {
                field: "Sequence".into(),
                message: format!("setting {} out of range 0..{}", selector, SETTING_COUNT),
            });
        }
        Ok(Self(index))
    }

    pub fn get(&self) -> usize {
        self.0
    }

    /// Bell pulse applied to `slot` (0 or 1) in this setting.
    pub fn bell_pulse(&self, slot: usize) -> Option<BellPulse> {
        bell_pulse(self.0, slot)
    }

    /// Conventional label, e.g. `A'B`.
    pub fn label(&self) -> &'static str {
        match self.0 {
            0 => "AB",
            1 => "A'B",
            2 => "AB'",
            3 => "A'B'",
            4 => "A'",
            _ => "B",
        }
    }
}

impl fmt::Display for OperatorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.label())
    }
}

/// Bell pulse variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BellPulse {
    Unprimed,
    Primed,
}

/// Bell pulse applied to qubit `slot` in physical setting `index`.
///
/// Settings 1 and 2 share one parity rule: the slot whose parity matches the
/// index gets the unprimed pulse. Setting 1 is thus `A'B` and setting 2 `AB'`.
pub fn bell_pulse(index: usize, slot: usize) -> Option<BellPulse> {
    match (index, slot) {
        (_, s) if s > 1 => None,
        (0, _) => Some(BellPulse::Unprimed),
        (1 | 2, s) if (index + s) % 2 == 0 => Some(BellPulse::Unprimed),
        (1 | 2, _) => Some(BellPulse::Primed),
        (3, _) => Some(BellPulse::Primed),
        (4, 0) => Some(BellPulse::Primed),
        (5, 1) => Some(BellPulse::Unprimed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Table
    // =========================================================================

    #[test]
    fn test_setting_zero_both_unprimed() {
        assert_eq!(bell_pulse(0, 0), Some(BellPulse::Unprimed));
        assert_eq!(bell_pulse(0, 1), Some(BellPulse::Unprimed));
    }

    #[test]
    fn test_settings_one_and_two_parity() {
        // A'B
        assert_eq!(bell_pulse(1, 0), Some(BellPulse::Primed));
        assert_eq!(bell_pulse(1, 1), Some(BellPulse::Unprimed));
        // AB'
        assert_eq!(bell_pulse(2, 0), Some(BellPulse::Unprimed));
        assert_eq!(bell_pulse(2, 1), Some(BellPulse::Primed));
    }

    #[test]
    fn test_setting_three_both_primed() {
        assert_eq!(bell_pulse(3, 0), Some(BellPulse::Primed));
        assert_eq!(bell_pulse(3, 1), Some(BellPulse::Primed));
    }

    #[test]
    fn test_single_qubit_settings() {
        assert_eq!(bell_pulse(4, 0), Some(BellPulse::Primed));
        assert_eq!(bell_pulse(4, 1), None);
        assert_eq!(bell_pulse(5, 0), None);
        assert_eq!(bell_pulse(5, 1), Some(BellPulse::Unprimed));
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(bell_pulse(6, 0), None);
        assert_eq!(bell_pulse(0, 2), None);
    }

    // =========================================================================
    // Index validation
    // =========================================================================

    #[test]
    fn test_index_validity_per_count() {
        assert!(OperatorIndex::new(0, OperatorCount::Single).is_ok());
        assert!(OperatorIndex::new(1, OperatorCount::Single).is_err());
        for i in 0..4 {
            assert!(OperatorIndex::new(i, OperatorCount::Chsh).is_ok());
        }
        assert!(OperatorIndex::new(4, OperatorCount::Chsh).is_err());
        for i in 0..6 {
            assert!(OperatorIndex::new(i, OperatorCount::Korotkov).is_ok());
        }
        assert!(OperatorIndex::new(6, OperatorCount::Korotkov).is_err());
    }

    #[test]
    fn test_sequence_selector() {
        let op = OperatorIndex::from_sequence_selector(4).unwrap();
        assert_eq!(op.get(), 4);
        assert_eq!(op.label(), "A'");
        assert!(OperatorIndex::from_sequence_selector(6).is_err());
    }

    #[test]
    fn test_operator_count_settings() {
        assert_eq!(OperatorCount::from_settings(4), Some(OperatorCount::Chsh));
        assert_eq!(OperatorCount::from_settings(5), None);
        assert_eq!(OperatorCount::Korotkov.settings(), 6);
    }

    #[test]
    fn test_display() {
        let op = OperatorIndex::new(2, OperatorCount::Chsh).unwrap();
        assert_eq!(op.to_string(), "2 (AB')");
    }
}

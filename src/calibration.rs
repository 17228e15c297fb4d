// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! DAC calibration lookup.
//!
//! Each DAC board can carry calibration datasets of several kinds. An IQ
//! (microwave) board is corrected in up to three stages: zero offsets, pulse
//! response and sideband. A bias board uses the dataset of one DAC channel.
//! A missing dataset skips its stage; how loudly depends on the
//! [`CalibrationPolicy`].

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CalibrationError, HardwareError, Result};

/// Kind of calibration dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalibrationKind {
    Zero,
    Pulse,
    Iq,
    DacA,
    DacB,
}

impl CalibrationKind {
    /// Registry name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationKind::Zero => "zero",
            CalibrationKind::Pulse => "pulse",
            CalibrationKind::Iq => "IQ",
            CalibrationKind::DacA => "DAC A",
            CalibrationKind::DacB => "DAC B",
        }
    }
}

impl fmt::Display for CalibrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when a board has no dataset of a requested kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationPolicy {
    /// Warn and skip the correction stage
    #[default]
    Lenient,
    /// Fail with [`CalibrationError::MissingCalibration`]
    Strict,
    /// Skip the stage silently
    Quiet,
}

/// Source of calibration datasets.
#[async_trait]
pub trait CalibrationStore: Send + Sync {
    /// Dataset names of `kind` for `board`, oldest first. Empty if none.
    async fn datasets(
        &self,
        board: &str,
        kind: CalibrationKind,
    ) -> std::result::Result<Vec<String>, HardwareError>;
}

/// Datasets of one board, as written in the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardCalibration {
    #[serde(default)]
    pub zero: Vec<String>,
    #[serde(default)]
    pub pulse: Vec<String>,
    #[serde(default)]
    pub iq: Vec<String>,
    #[serde(default)]
    pub dac_a: Vec<String>,
    #[serde(default)]
    pub dac_b: Vec<String>,
}

impl BoardCalibration {
    fn get(&self, kind: CalibrationKind) -> &[String] {
        match kind {
            CalibrationKind::Zero => &self.zero,
            CalibrationKind::Pulse => &self.pulse,
            CalibrationKind::Iq => &self.iq,
            CalibrationKind::DacA => &self.dac_a,
            CalibrationKind::DacB => &self.dac_b,
        }
    }
}

/// In-memory calibration store keyed by board name.
#[derive(Debug, Clone, Default)]
pub struct CalibrationTable {
    boards: HashMap<String, BoardCalibration>,
}

impl CalibrationTable {
    pub fn new(boards: HashMap<String, BoardCalibration>) -> Self {
        Self { boards }
    }

    pub fn insert(&mut self, board: impl Into<String>, calibration: BoardCalibration) {
        self.boards.insert(board.into(), calibration);
    }
}

#[async_trait]
impl CalibrationStore for CalibrationTable {
    async fn datasets(
        &self,
        board: &str,
        kind: CalibrationKind,
    ) -> std::result::Result<Vec<String>, HardwareError> {
        Ok(self
            .boards
            .get(board)
            .map(|b| b.get(kind).to_vec())
            .unwrap_or_default())
    }
}

/// Look up the datasets of `kind` for `board`, applying `policy` when none exist.
pub async fn load_calibration_sets(
    store: &dyn CalibrationStore,
    board: &str,
    kind: CalibrationKind,
    policy: CalibrationPolicy,
) -> Result<Vec<String>> {
    let sets = store.datasets(board, kind).await?;
    if sets.is_empty() {
        match policy {
            CalibrationPolicy::Strict => {
                return Err(CalibrationError::MissingCalibration {
                    board: board.to_string(),
                    kind: kind.to_string(),
                }
                .into())
            }
            CalibrationPolicy::Lenient => {
                warn!(
                    board = %board,
                    kind = %kind,
                    "No {} calibration loaded, no {} correction will be performed",
                    kind,
                    kind
                );
            }
            CalibrationPolicy::Quiet => {}
        }
    }
    Ok(sets)
}

/// Correction stages resolved for an IQ board.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IqCorrection {
    pub board: String,
    /// Zero-offset datasets, all applied.
    pub zero: Vec<String>,
    /// Pulse-response dataset; only the first one is used.
    pub pulse: Option<String>,
    /// Sideband datasets, all applied.
    pub sideband: Vec<String>,
}

impl IqCorrection {
    /// Whether no stage will be applied.
    pub fn is_uncorrected(&self) -> bool {
        self.zero.is_empty() && self.pulse.is_none() && self.sideband.is_empty()
    }
}

/// Correction resolved for one DAC channel of a bias board.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DacCorrection {
    pub board: String,
    pub channel: DacChannel,
    /// Only the first dataset is used.
    pub dataset: Option<String>,
}

/// DAC channel of a board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DacChannel {
    #[default]
    A,
    B,
}

impl DacChannel {
    pub fn kind(&self) -> CalibrationKind {
        match self {
            DacChannel::A => CalibrationKind::DacA,
            DacChannel::B => CalibrationKind::DacB,
        }
    }
}

/// Resolve the zero, pulse and sideband stages of an IQ board.
pub async fn iq_correction(
    store: &dyn CalibrationStore,
    board: &str,
    policy: CalibrationPolicy,
) -> Result<IqCorrection> {
    let zero = load_calibration_sets(store, board, CalibrationKind::Zero, policy).await?;
    let pulse = load_calibration_sets(store, board, CalibrationKind::Pulse, policy)
        .await?
        .into_iter()
        .next();
    let sideband = load_calibration_sets(store, board, CalibrationKind::Iq, policy).await?;
    Ok(IqCorrection {
        board: board.to_string(),
        zero,
        pulse,
        sideband,
    })
}

/// Resolve the correction of one DAC channel.
pub async fn dac_correction(
    store: &dyn CalibrationStore,
    board: &str,
    channel: DacChannel,
    policy: CalibrationPolicy,
) -> Result<DacCorrection> {
    let dataset = load_calibration_sets(store, board, channel.kind(), policy)
        .await?
        .into_iter()
        .next();
    Ok(DacCorrection {
        board: board.to_string(),
        channel,
        dataset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn table() -> CalibrationTable {
        let mut table = CalibrationTable::default();
        table.insert(
            "board-uw",
            BoardCalibration {
                zero: vec!["00001 - zero".into(), "00004 - zero".into()],
                pulse: vec!["00002 - pulse".into(), "00005 - pulse".into()],
                ..Default::default()
            },
        );
        table.insert(
            "board-bias",
            BoardCalibration {
                dac_a: vec!["00003 - DAC A".into()],
                ..Default::default()
            },
        );
        table
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(CalibrationKind::Iq.to_string(), "IQ");
        assert_eq!(CalibrationKind::DacB.to_string(), "DAC B");
    }

    #[tokio::test]
    async fn test_load_present() {
        let sets = load_calibration_sets(
            &table(),
            "board-uw",
            CalibrationKind::Zero,
            CalibrationPolicy::Strict,
        )
        .await
        .unwrap();
        assert_eq!(sets.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_lenient_skips() {
        let sets = load_calibration_sets(
            &table(),
            "board-uw",
            CalibrationKind::Iq,
            CalibrationPolicy::Lenient,
        )
        .await
        .unwrap();
        assert!(sets.is_empty());
    }

    #[tokio::test]
    async fn test_missing_strict_errors() {
        let err = load_calibration_sets(
            &table(),
            "unknown",
            CalibrationKind::Pulse,
            CalibrationPolicy::Strict,
        )
        .await
        .unwrap_err();
        match err {
            Error::Calibration(CalibrationError::MissingCalibration { board, kind }) => {
                assert_eq!(board, "unknown");
                assert_eq!(kind, "pulse");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_iq_correction_partial() {
        let plan = iq_correction(&table(), "board-uw", CalibrationPolicy::Quiet)
            .await
            .unwrap();
        assert_eq!(plan.zero.len(), 2);
        assert_eq!(plan.pulse.as_deref(), Some("00002 - pulse"));
        assert!(plan.sideband.is_empty());
        assert!(!plan.is_uncorrected());
    }

    #[tokio::test]
    async fn test_iq_correction_strict_fails_on_missing_stage() {
        let result = iq_correction(&table(), "board-uw", CalibrationPolicy::Strict).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dac_correction() {
        let a = dac_correction(&table(), "board-bias", DacChannel::A, CalibrationPolicy::Strict)
            .await
            .unwrap();
        assert_eq!(a.dataset.as_deref(), Some("00003 - DAC A"));

        let b = dac_correction(&table(), "board-bias", DacChannel::B, CalibrationPolicy::Lenient)
            .await
            .unwrap();
        assert!(b.dataset.is_none());
    }

    #[test]
    fn test_policy_deserialize() {
        let p: CalibrationPolicy = serde_yaml::from_str("strict").unwrap();
        assert_eq!(p, CalibrationPolicy::Strict);
    }
}

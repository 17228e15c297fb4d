// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Operations exposed to clients.
//!
//! | ID     | Name                   | Output                    |
//! |--------|------------------------|---------------------------|
//! | 100    | Run Single             | 3 probabilities           |
//! | 200    | Run CHSH               | 12 probs, 4 E, S          |
//! | 201    | Run CHSH (S only)      | S                         |
//! | 300    | Run Korotkov           | 18 probs, 6 R, T          |
//! | 301    | Run Korotkov (T only)  | T                         |
//! | 100000 | Kill                   | shutdown after a delay    |

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use crate::error::{Error, HardwareError, Result};
use crate::hardware::{ContextHandle, RigRegistry};
use crate::orchestrator::Experiment;
use crate::sequence::OperatorCount;

/// An operation clients can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    RunSingle,
    RunChsh,
    RunChshSOnly,
    RunKorotkov,
    RunKorotkovTOnly,
    Kill,
}

/// Description of one operation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OperationInfo {
    pub id: u32,
    pub name: &'static str,
    /// Accepted input type tag.
    pub input: &'static str,
    /// Returned type tag.
    pub output: &'static str,
    pub description: &'static str,
}

pub const OPERATIONS: &[(Operation, OperationInfo)] = &[
    (
        Operation::RunSingle,
        OperationInfo {
            id: 100,
            name: "Run Single",
            input: "(ww)",
            output: "*v",
            description: "Measure the setting chosen by 'Sequence'; returns P(01), P(10), P(11)",
        },
    ),
    (
        Operation::RunChsh,
        OperationInfo {
            id: 200,
            name: "Run CHSH",
            input: "(ww)",
            output: "*v",
            description: "Measure four settings; returns 12 probabilities, 4 correlations and S",
        },
    ),
    (
        Operation::RunChshSOnly,
        OperationInfo {
            id: 201,
            name: "Run CHSH (S only)",
            input: "(ww)",
            output: "v",
            description: "Measure four settings; returns S",
        },
    ),
    (
        Operation::RunKorotkov,
        OperationInfo {
            id: 300,
            name: "Run Korotkov",
            input: "(ww)",
            output: "*v",
            description: "Measure six settings; returns 18 probabilities, 6 R terms and T",
        },
    ),
    (
        Operation::RunKorotkovTOnly,
        OperationInfo {
            id: 301,
            name: "Run Korotkov (T only)",
            input: "(ww)",
            output: "v",
            description: "Measure six settings; returns T",
        },
    ),
    (
        Operation::Kill,
        OperationInfo {
            id: 100000,
            name: "Kill",
            input: "",
            output: "",
            description: "Stop the server",
        },
    ),
];

impl Operation {
    /// Row of the operation in [`OPERATIONS`].
    fn row(&self) -> usize {
        match self {
            Operation::RunSingle => 0,
            Operation::RunChsh => 1,
            Operation::RunChshSOnly => 2,
            Operation::RunKorotkov => 3,
            Operation::RunKorotkovTOnly => 4,
            Operation::Kill => 5,
        }
    }

    pub fn info(&self) -> &'static OperationInfo {
        &OPERATIONS[self.row()].1
    }

    pub fn from_id(id: u32) -> Option<Self> {
        OPERATIONS
            .iter()
            .find(|(_, info)| info.id == id)
            .map(|(op, _)| *op)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        OPERATIONS
            .iter()
            .find(|(_, info)| info.name.eq_ignore_ascii_case(name))
            .map(|(op, _)| *op)
    }

    /// Resolve either a numeric ID or a name.
    pub fn lookup(key: &str) -> Option<Self> {
        match key.parse::<u32>() {
            Ok(id) => Self::from_id(id),
            Err(_) => Self::from_name(key),
        }
    }

    /// Operator settings measured, `None` for [`Operation::Kill`].
    pub fn operator_count(&self) -> Option<OperatorCount> {
        match self {
            Operation::RunSingle => Some(OperatorCount::Single),
            Operation::RunChsh | Operation::RunChshSOnly => Some(OperatorCount::Chsh),
            Operation::RunKorotkov | Operation::RunKorotkovTOnly => Some(OperatorCount::Korotkov),
            Operation::Kill => None,
        }
    }

    /// Whether only the headline correlator is returned.
    pub fn summary_only(&self) -> bool {
        matches!(self, Operation::RunChshSOnly | Operation::RunKorotkovTOnly)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

/// Result of invoking an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Values(Vec<f64>),
    /// The caller should shut the server down.
    Shutdown,
}

/// Routes operations to the experiment on a registered rig.
pub struct Dispatcher {
    experiment: Arc<Experiment>,
    rigs: Arc<RigRegistry>,
}

impl Dispatcher {
    pub fn new(experiment: Arc<Experiment>, rigs: Arc<RigRegistry>) -> Self {
        Self { experiment, rigs }
    }

    pub fn rigs(&self) -> &Arc<RigRegistry> {
        &self.rigs
    }

    pub fn experiment(&self) -> &Arc<Experiment> {
        &self.experiment
    }

    /// Invoke `operation` for `ctx` on `rig` (the default rig if `None`).
    #[instrument(skip(self, operation), fields(operation = %operation))]
    pub async fn invoke(
        &self,
        operation: Operation,
        ctx: ContextHandle,
        rig: Option<&str>,
    ) -> Result<Outcome> {
        let Some(count) = operation.operator_count() else {
            info!("Kill requested");
            return Ok(Outcome::Shutdown);
        };
        let rig = self.rigs.get_or_default(rig)?;
        let result = self.experiment.measure(rig.as_ref(), ctx, count).await?;
        let values = if operation.summary_only() {
            result.summary()
        } else {
            result.to_vec()
        };
        Ok(Outcome::Values(values))
    }

    /// Invoke by ID or name.
    pub async fn invoke_by_key(
        &self,
        key: &str,
        ctx: ContextHandle,
        rig: Option<&str>,
    ) -> Result<Outcome> {
        let operation = Operation::lookup(key).ok_or_else(|| {
            Error::Hardware(HardwareError::NotFound(format!("operation '{}'", key)))
        })?;
        self.invoke(operation, ctx, rig).await
    }
}

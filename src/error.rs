// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the Bell-violation server.

use std::fmt;

/// Result type alias for experiment operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug)]
pub enum Error {
    /// Configuration error
    Config(String),
    /// Hardware collaborator error
    Hardware(HardwareError),
    /// Validation error
    Validation(ValidationError),
    /// Parameter resolution error
    Parameter(ParameterError),
    /// DAC calibration error
    Calibration(CalibrationError),
    /// The experiment does not involve exactly two qubits
    NeedTwoQubits { found: usize },
    /// Server error
    Server(String),
    /// IO error
    Io(std::io::Error),
    /// Serialization error
    Serialization(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Hardware(e) => write!(f, "Hardware error: {}", e),
            Error::Validation(e) => write!(f, "Validation error: {}", e),
            Error::Parameter(e) => write!(f, "Parameter error: {}", e),
            Error::Calibration(e) => write!(f, "Calibration error: {}", e),
            Error::NeedTwoQubits { found } => write!(
                f,
                "Must select a two qubit experiment ({} qubits involved)",
                found
            ),
            Error::Server(msg) => write!(f, "Server error: {}", msg),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Hardware(e) => Some(e),
            Error::Validation(e) => Some(e),
            Error::Parameter(e) => Some(e),
            Error::Calibration(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Error::Hardware(e)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<ParameterError> for Error {
    fn from(e: ParameterError) -> Self {
        Error::Parameter(e)
    }
}

impl From<CalibrationError> for Error {
    fn from(e: CalibrationError) -> Self {
        Error::Calibration(e)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Errors raised by the hardware and configuration collaborators.
#[derive(Debug)]
pub enum HardwareError {
    /// Rig not found
    NotFound(String),
    /// Rig or store unavailable
    Unavailable(String),
    /// Execution failed
    ExecutionFailed(String),
    /// Timeout
    Timeout(String),
    /// Invalid request
    InvalidRequest(String),
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareError::NotFound(name) => write!(f, "Rig not found: {}", name),
            HardwareError::Unavailable(msg) => write!(f, "Rig unavailable: {}", msg),
            HardwareError::ExecutionFailed(msg) => write!(f, "Execution failed: {}", msg),
            HardwareError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            HardwareError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
        }
    }
}

impl std::error::Error for HardwareError {}

/// Validation errors.
#[derive(Debug)]
pub enum ValidationError {
    /// Field validation failed
    Field { field: String, message: String },
    /// Waveforms evaluated on different frequency grids were combined
    GridMismatch { left: String, right: String },
    /// Array shape disagrees with the expected layout
    ShapeMismatch {
        what: String,
        expected: String,
        actual: String,
    },
    /// Resource limit exceeded
    ResourceLimit {
        resource: String,
        limit: u64,
        requested: u64,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Field { field, message } => {
                write!(f, "Field '{}': {}", field, message)
            }
            ValidationError::GridMismatch { left, right } => {
                write!(f, "Frequency grid mismatch: {} vs {}", left, right)
            }
            ValidationError::ShapeMismatch {
                what,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Shape mismatch for {}: expected {}, got {}",
                    what, expected, actual
                )
            }
            ValidationError::ResourceLimit {
                resource,
                limit,
                requested,
            } => {
                write!(
                    f,
                    "Resource limit exceeded for {}: limit={}, requested={}",
                    resource, limit, requested
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while resolving experiment parameters.
#[derive(Debug)]
pub enum ParameterError {
    /// A required parameter has neither a stored value nor a default
    Missing { qubit: Option<String>, name: String },
    /// Stored unit cannot be converted into the requested one
    UnitMismatch {
        name: String,
        expected: String,
        actual: String,
    },
    /// Stored value has the wrong form
    InvalidValue { name: String, message: String },
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterError::Missing {
                qubit: Some(qubit),
                name,
            } => write!(f, "Missing parameter '{}' for qubit '{}'", name, qubit),
            ParameterError::Missing { qubit: None, name } => {
                write!(f, "Missing global parameter '{}'", name)
            }
            ParameterError::UnitMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "Parameter '{}' has unit '{}', cannot convert to '{}'",
                name, actual, expected
            ),
            ParameterError::InvalidValue { name, message } => {
                write!(f, "Parameter '{}': {}", name, message)
            }
        }
    }
}

impl std::error::Error for ParameterError {}

/// DAC calibration errors.
#[derive(Debug)]
pub enum CalibrationError {
    /// No calibration data sets are registered for a board
    MissingCalibration { board: String, kind: String },
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::MissingCalibration { board, kind } => {
                write!(f, "No {} calibration available for board '{}'", kind, board)
            }
        }
    }
}

impl std::error::Error for CalibrationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    // =========================================================================
    // Error Display tests
    // =========================================================================

    #[test]
    fn test_error_display_config() {
        let e = Error::Config("bad port".into());
        assert_eq!(e.to_string(), "Configuration error: bad port");
    }

    #[test]
    fn test_error_display_need_two_qubits() {
        let e = Error::NeedTwoQubits { found: 3 };
        assert_eq!(
            e.to_string(),
            "Must select a two qubit experiment (3 qubits involved)"
        );
    }

    #[test]
    fn test_error_display_hardware() {
        let e = Error::Hardware(HardwareError::NotFound("dr1".into()));
        assert_eq!(e.to_string(), "Hardware error: Rig not found: dr1");
    }

    #[test]
    fn test_error_display_grid_mismatch() {
        let e = Error::Validation(ValidationError::GridMismatch {
            left: "bipolar(1024)".into(),
            right: "baseband(512)".into(),
        });
        assert_eq!(
            e.to_string(),
            "Validation error: Frequency grid mismatch: bipolar(1024) vs baseband(512)"
        );
    }

    #[test]
    fn test_error_display_shape_mismatch() {
        let e = ValidationError::ShapeMismatch {
            what: "raw acquisition".into(),
            expected: "[2, 10, 4]".into(),
            actual: "79 samples".into(),
        };
        assert_eq!(
            e.to_string(),
            "Shape mismatch for raw acquisition: expected [2, 10, 4], got 79 samples"
        );
    }

    #[test]
    fn test_parameter_error_display() {
        let e = ParameterError::Missing {
            qubit: Some("q1".into()),
            name: "Pi Pulse Length".into(),
        };
        assert_eq!(
            e.to_string(),
            "Missing parameter 'Pi Pulse Length' for qubit 'q1'"
        );

        let e = ParameterError::Missing {
            qubit: None,
            name: "Stats".into(),
        };
        assert_eq!(e.to_string(), "Missing global parameter 'Stats'");

        let e = ParameterError::UnitMismatch {
            name: "Z Pulse Length".into(),
            expected: "ns".into(),
            actual: "GHz".into(),
        };
        assert_eq!(
            e.to_string(),
            "Parameter 'Z Pulse Length' has unit 'GHz', cannot convert to 'ns'"
        );
    }

    #[test]
    fn test_calibration_error_display() {
        let e = Error::Calibration(CalibrationError::MissingCalibration {
            board: "DR Lab FPGA 1".into(),
            kind: "pulse".into(),
        });
        assert_eq!(
            e.to_string(),
            "Calibration error: No pulse calibration available for board 'DR Lab FPGA 1'"
        );
    }

    #[test]
    fn test_validation_error_display_resource_limit() {
        let e = ValidationError::ResourceLimit {
            resource: "stats".into(),
            limit: 1000,
            requested: 2000,
        };
        assert_eq!(
            e.to_string(),
            "Resource limit exceeded for stats: limit=1000, requested=2000"
        );
    }

    // =========================================================================
    // Error::source() tests
    // =========================================================================

    #[test]
    fn test_error_source_nested() {
        assert!(Error::Io(std::io::Error::other("disk")).source().is_some());
        assert!(Error::Hardware(HardwareError::Timeout("slow".into()))
            .source()
            .is_some());
        assert!(Error::Parameter(ParameterError::InvalidValue {
            name: "x".into(),
            message: "y".into()
        })
        .source()
        .is_some());
    }

    #[test]
    fn test_error_source_none() {
        assert!(Error::Config("x".into()).source().is_none());
        assert!(Error::NeedTwoQubits { found: 1 }.source().is_none());
        assert!(Error::Serialization("x".into()).source().is_none());
    }

    // =========================================================================
    // From impls
    // =========================================================================

    #[test]
    fn test_from_hardware_error() {
        let e: Error = HardwareError::Unavailable("x".into()).into();
        assert!(matches!(e, Error::Hardware(HardwareError::Unavailable(_))));
    }

    #[test]
    fn test_from_serde_yaml_error() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("{{{{").unwrap_err();
        let e: Error = yaml_err.into();
        assert!(matches!(e, Error::Serialization(_)));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad}").unwrap_err();
        let e: Error = json_err.into();
        assert!(matches!(e, Error::Serialization(_)));
    }
}

// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Server, experiment and simulator configuration.
//!
//! Values are layered, each layer overriding the one before: built-in
//! defaults, the YAML file (`--config`, else `config.yaml`, `config.yml` or
//! `/etc/qubitos/bell.yaml`), `QUBITOS_BELL_*` environment variables, and
//! finally command-line flags.

use std::collections::HashMap;
use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calibration::{BoardCalibration, CalibrationPolicy};
use crate::error::{Error, Result};
use crate::readout::Cutoff;
use crate::sequence::SETTING_COUNT;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Experiment wiring and hardware setup
    #[serde(default)]
    pub experiment: ExperimentConfig,

    /// Simulated rig
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// DAC calibration lookup
    #[serde(default)]
    pub calibration: CalibrationConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                config = serde_yaml::from_str(&content)?;
            }
        } else {
            for path in &["config.yaml", "config.yml", "/etc/qubitos/bell.yaml"] {
                let path = Path::new(path);
                if path.exists() {
                    let content = std::fs::read_to_string(path)?;
                    config = serde_yaml::from_str(&content)?;
                    break;
                }
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("QUBITOS_BELL_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = env::var("QUBITOS_BELL_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = env::var("QUBITOS_BELL_REGISTRY") {
            self.experiment.registry = Some(val);
        }
        if let Ok(val) = env::var("QUBITOS_BELL_RIG") {
            self.experiment.rig = val;
        }
        if let Ok(val) = env::var("QUBITOS_BELL_SEED") {
            if let Ok(seed) = val.parse() {
                self.simulator.seed = Some(seed);
            }
        }
        if let Ok(val) = env::var("QUBITOS_BELL_STRICT_CALIBRATION") {
            if val.to_lowercase() == "true" || val == "1" {
                self.calibration.policy = CalibrationPolicy::Strict;
            }
        }
        if let Ok(val) = env::var("QUBITOS_BELL_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("QUBITOS_BELL_CORS_ALLOWED_ORIGINS") {
            self.server.cors.allowed_origins =
                val.split(',').map(|s| s.trim().to_string()).collect();
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("Server port cannot be 0".into()));
        }
        if self.server.timeout_sec == 0 {
            return Err(Error::Config("Run timeout cannot be 0".into()));
        }
        if !(self.experiment.trigger_length_ns > 0.0) {
            return Err(Error::Config("Trigger length must be positive".into()));
        }
        if !self.experiment.deconvolution_delay_ns.is_finite() {
            return Err(Error::Config("Deconvolution delay must be finite".into()));
        }
        if !matches!(self.logging.format.as_str(), "full" | "compact") {
            return Err(Error::Config(format!(
                "Unknown log format '{}', expected full or compact",
                self.logging.format
            )));
        }
        if self.validation.limits.max_repetitions == 0 {
            return Err(Error::Config("max_repetitions cannot be 0".into()));
        }
        if self.simulator.enabled {
            self.simulator.validate()?;
        }
        if self.server.cors.allow_all {
            tracing::warn!(
                "CORS is set to allow all origins. This is insecure for production use. \
                 Configure specific origins instead."
            );
        }
        Ok(())
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// REST port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Timeout of a single operation in seconds
    #[serde(default = "default_timeout")]
    pub timeout_sec: u64,

    /// Delay between a Kill request and shutdown, in milliseconds
    #[serde(default = "default_kill_delay")]
    pub kill_delay_ms: u64,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Graceful shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_sec: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_sec: default_timeout(),
            kill_delay_ms: default_kill_delay(),
            cors: CorsConfig::default(),
            shutdown_timeout_sec: default_shutdown_timeout(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allow all origins (INSECURE - for development only)
    #[serde(default)]
    pub allow_all: bool,

    /// Allowed origins when allow_all is false
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_all: false,
            allowed_origins: vec![
                "http://localhost:3000".into(),
                "http://127.0.0.1:3000".into(),
            ],
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8090
}

fn default_timeout() -> u64 {
    300
}

fn default_kill_delay() -> u64 {
    1000
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Experiment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Parameter registry file (YAML). Empty registry when unset.
    #[serde(default)]
    pub registry: Option<String>,

    /// Rig used when a request names none
    #[serde(default = "default_rig")]
    pub rig: String,

    /// Trigger pulse length in ns
    #[serde(default = "default_trigger_length")]
    pub trigger_length_ns: f64,

    /// Fourier deconvolution delay in ns, both channels
    #[serde(default = "default_deconvolution_delay")]
    pub deconvolution_delay_ns: f64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            registry: None,
            rig: default_rig(),
            trigger_length_ns: default_trigger_length(),
            deconvolution_delay_ns: default_deconvolution_delay(),
        }
    }
}

fn default_rig() -> String {
    "simulator".into()
}

fn default_trigger_length() -> f64 {
    20.0
}

fn default_deconvolution_delay() -> f64 {
    -50.0
}

/// Simulated rig configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Whether the simulated rig is registered
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Qubits reported as involved in every context
    #[serde(default = "default_sim_qubits")]
    pub qubits: Vec<String>,

    /// RNG seed; fresh entropy when unset
    #[serde(default)]
    pub seed: Option<u64>,

    /// Joint-state distribution `[P00, P01, P10, P11]` per physical setting
    #[serde(default = "default_outcomes")]
    pub outcomes: Vec<[f64; 4]>,

    /// Readout cutoffs reported per qubit
    #[serde(default = "default_sim_cutoffs")]
    pub cutoffs: Vec<Cutoff>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            qubits: default_sim_qubits(),
            seed: None,
            outcomes: default_outcomes(),
            cutoffs: default_sim_cutoffs(),
        }
    }
}

impl SimulatorConfig {
    fn validate(&self) -> Result<()> {
        if self.outcomes.len() != SETTING_COUNT {
            return Err(Error::Config(format!(
                "simulator needs {} outcome distributions, got {}",
                SETTING_COUNT,
                self.outcomes.len()
            )));
        }
        for (i, dist) in self.outcomes.iter().enumerate() {
            let total: f64 = dist.iter().sum();
            if dist.iter().any(|p| !(*p >= 0.0)) || (total - 1.0).abs() > 1e-6 {
                return Err(Error::Config(format!(
                    "simulator outcome distribution {} is not a probability vector",
                    i
                )));
            }
        }
        if self.cutoffs.len() != self.qubits.len() {
            return Err(Error::Config(format!(
                "simulator has {} qubits but {} cutoffs",
                self.qubits.len(),
                self.cutoffs.len()
            )));
        }
        Ok(())
    }
}

fn default_sim_qubits() -> Vec<String> {
    vec!["q0".into(), "q1".into()]
}

/// Distributions of the maximally violating singlet-like state: `E = 1/√2`
/// for every setting except `AB'`, where `E = -1/√2`.
fn default_outcomes() -> Vec<[f64; 4]> {
    let agree = (1.0 + std::f64::consts::FRAC_1_SQRT_2) / 4.0;
    let differ = (1.0 - std::f64::consts::FRAC_1_SQRT_2) / 4.0;
    vec![
        [agree, differ, differ, agree],
        [agree, differ, differ, agree],
        [differ, agree, agree, differ],
        [agree, differ, differ, agree],
        [0.25, 0.25, 0.25, 0.25],
        [0.25, 0.25, 0.25, 0.25],
    ]
}

fn default_sim_cutoffs() -> Vec<Cutoff> {
    vec![Cutoff::new(1.0, 0.5), Cutoff::new(1.0, -0.5)]
}

/// Calibration configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Behavior when a board lacks a dataset
    #[serde(default)]
    pub policy: CalibrationPolicy,

    /// Datasets per board name
    #[serde(default)]
    pub boards: HashMap<String, BoardCalibration>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (full, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "full".into()
}

/// Validation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Resource limits
    #[serde(default)]
    pub limits: ResourceLimits,
}

/// Resource limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum repetitions per operator setting
    #[serde(default = "default_max_repetitions")]
    pub max_repetitions: u32,

    /// Maximum length of a single pulse or delay in ns
    #[serde(default = "default_max_duration")]
    pub max_duration_ns: f64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_repetitions: default_max_repetitions(),
            max_duration_ns: default_max_duration(),
        }
    }
}

fn default_max_repetitions() -> u32 {
    100_000
}

fn default_max_duration() -> f64 {
    // one bias grid period: 512 bins at 0.5/512 GHz spacing
    1024.0
}

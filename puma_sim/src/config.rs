use std::path::Path;

use puma_kinematics::{ArmController, ChainSettings, InterpolationStrategy, SolverConfig};
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Simulator configuration, loaded from a JSON file.
///
/// ```rust,ignore
/// let config = SimConfig::load("sim.json")?;
/// println!("listening on {}", config.connection_url());
/// ```
///
/// Every field is optional in the file:
///
/// ```json
/// {
///   "addr": "0.0.0.0",
///   "port": 16001,
///   "settings": { "base_height": 3.0, "link3_length": 1.0, "link4_length": 1.0 },
///   "solver": { "reach_tolerance": 0.001 },
///   "strategy": "CartesianSpace"
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub addr: String,
    pub port: u16,
    pub settings: ChainSettings<f64>,
    pub solver: SolverConfig<f64>,
    pub strategy: InterpolationStrategy,
}

impl SimConfig {
    pub fn new(addr: String, port: u16) -> Self {
        Self {
            addr,
            port,
            ..Self::default()
        }
    }

    /// Read and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.addr.is_empty() {
            return Err(SimError::Config("Address cannot be empty.".to_string()));
        }
        if self.port == 0 {
            return Err(SimError::Config("Port number must be greater than 0.".to_string()));
        }
        self.settings.validate()?;
        self.solver.validate()?;
        Ok(())
    }

    /// Generates a bind address from the address and port.
    pub fn connection_url(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    /// A controller for the configured chain, in the default pose.
    pub fn controller(&self) -> ArmController<f64> {
        let mut arm = ArmController::new(self.settings, self.solver);
        arm.set_interpolation_strategy(self.strategy);
        arm
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1".to_string(),
            port: 16001,
            settings: ChainSettings::default(),
            solver: SolverConfig::default(),
            strategy: InterpolationStrategy::default(),
        }
    }
}

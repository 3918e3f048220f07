// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Simulation parameters.
//!
//! A [`Config`] is built in layers, each overriding the last:
//!
//!  1. the built-in defaults,
//!  2. an optional TOML file,
//!  3. `DSIM_`-prefixed environment variables (e.g. `DSIM_NUMBER_OF_NODES=16`).
//!
//! Command-line front ends then overlay their own options on the result.

use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::types::{SimError, SimResult};

/// Prefix of the environment variables that override configuration values.
pub const ENV_PREFIX: &str = "DSIM_";

/// Parameters of one simulated system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of nodes in the system.
    pub number_of_nodes: usize,

    /// Fixed cost of every send, in microseconds.
    pub connection_delay_us: u64,

    /// Additional cost of every send per transmitted value, in nanoseconds.
    pub transmission_delay_per_unit_ns: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            number_of_nodes: 4,
            connection_delay_us: 0,
            transmission_delay_per_unit_ns: 0,
        }
    }
}

impl Config {
    /// Configuration with `number_of_nodes` nodes and no delays.
    #[must_use]
    pub fn with_nodes(number_of_nodes: usize) -> Self {
        Self {
            number_of_nodes,
            ..Default::default()
        }
    }

    /// The layered configuration sources without extracting them.
    #[must_use]
    pub fn figment(conf_file: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(conf_file) = conf_file {
            figment = figment.merge(Toml::file(conf_file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load and validate the configuration.
    ///
    /// A configuration file that is named but does not exist is an error.
    pub fn load(conf_file: Option<&Path>) -> SimResult<Config> {
        if let Some(conf_file) = conf_file {
            if conf_file.is_dir() {
                return Err(SimError::Config(format!(
                    "{} is not a file path",
                    conf_file.display()
                )));
            }
            if !conf_file.exists() {
                return Err(SimError::Config(format!(
                    "{} not found",
                    conf_file.display()
                )));
            }
        }

        let config: Config = Config::figment(conf_file)
            .extract()
            .map_err(|e| SimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot describe a system.
    pub fn validate(&self) -> SimResult {
        if self.number_of_nodes == 0 {
            return Err(SimError::Config(
                "number_of_nodes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn connection_delay(&self) -> Duration {
        Duration::from_micros(self.connection_delay_us)
    }

    #[must_use]
    pub fn transmission_delay_per_unit(&self) -> Duration {
        Duration::from_nanos(self.transmission_delay_per_unit_ns)
    }
}

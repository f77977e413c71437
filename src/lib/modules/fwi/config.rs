use serde_derive::{Deserialize, Serialize};

use crate::error::FWIError;

use super::constants::{DC_INIT, DMC_INIT, FFMC_INIT, FFMC_MAX};

/// Code values as of the day before the series starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialCodes {
    pub ffmc: f64,
    pub dmc: f64,
    pub dc: f64,
}

impl Default for InitialCodes {
    fn default() -> Self {
        Self {
            ffmc: FFMC_INIT,
            dmc: DMC_INIT,
            dc: DC_INIT,
        }
    }
}

/// configuration structure for the FWI model.
/// Unset fields fall back to the start-of-season codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FWIModelConfig {
    pub initial_ffmc: f64,
    pub initial_dmc: f64,
    pub initial_dc: f64,
}

impl Default for FWIModelConfig {
    fn default() -> Self {
        Self {
            initial_ffmc: FFMC_INIT,
            initial_dmc: DMC_INIT,
            initial_dc: DC_INIT,
        }
    }
}

impl FWIModelConfig {
    pub fn new(initial_ffmc: f64, initial_dmc: f64, initial_dc: f64) -> Self {
        Self {
            initial_ffmc,
            initial_dmc,
            initial_dc,
        }
    }

    /// Validate the configuration and return the seed codes
    pub fn build(&self) -> Result<InitialCodes, FWIError> {
        let checks = [
            ("initial_ffmc", self.initial_ffmc, 0.0, FFMC_MAX),
            ("initial_dmc", self.initial_dmc, 0.0, f64::INFINITY),
            ("initial_dc", self.initial_dc, 0.0, f64::INFINITY),
        ];
        for (name, value, min, max) in checks {
            if !value.is_finite() || value < min || value > max {
                return Err(FWIError::InvalidConfiguration(format!(
                    "{} = {} is outside [{}, {}]",
                    name, value, min, max
                )));
            }
        }
        Ok(InitialCodes {
            ffmc: self.initial_ffmc,
            dmc: self.initial_dmc,
            dc: self.initial_dc,
        })
    }
}

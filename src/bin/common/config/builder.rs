use fwi_grid::models::output::OutputVariableName;
use fwi_grid::modules::fwi::config::FWIModelConfig;
use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::str::FromStr;
use strum::IntoEnumIterator;

use crate::common::helpers::AppError;

pub type ConfigMap = HashMap<String, Vec<String>>;

const INITIAL_FFMC_KEY: &str = "INITIAL_FFMC";
const INITIAL_DMC_KEY: &str = "INITIAL_DMC";
const INITIAL_DC_KEY: &str = "INITIAL_DC";
const VARIABLES_KEY: &str = "VARIABLE";

trait ConfigMapExt {
    /// Get the first value of a key in the config map
    fn first(&self, key: &str) -> Option<String>;
    fn all(&self, key: &str) -> Option<Vec<String>>;
}

impl ConfigMapExt for ConfigMap {
    fn first(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|values| values.first().cloned())
    }

    fn all(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).cloned()
    }
}

fn read_to_string(file_name: &str) -> Result<String, AppError> {
    let mut file = File::open(file_name)
        .map_err(|err| format!("Cannot open config file {}: {}", file_name, err))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|err| format!("Cannot read config file {}: {}", file_name, err))?;
    Ok(contents)
}

pub fn read_config(file_name: impl Into<String>) -> Result<ConfigMap, AppError> {
    let file_name = file_name.into();
    let contents = read_to_string(&file_name)?;
    parse_config(&contents).map_err(|err| format!("{file_name}: {err}").into())
}

/// Parse KEY=VALUE lines; repeated keys accumulate their values
pub fn parse_config(contents: &str) -> Result<ConfigMap, AppError> {
    let mut config_map: ConfigMap = ConfigMap::new();

    for (i, line) in contents.lines().enumerate() {
        let line = line.trim();

        if line.starts_with('%') || line.starts_with('#') || line.is_empty() {
            // skip comments and empty lines
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or(format!("error parsing config at line {i}: {line}"))?;

        config_map
            .entry(key.trim().into())
            .or_default()
            .push(value.trim().into());
    }
    Ok(config_map)
}

fn default_variables() -> Vec<OutputVariableName> {
    OutputVariableName::iter().collect()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigContainer {
    #[serde(default)]
    pub model: FWIModelConfig,
    /// variables written to the output, all of them when not set
    #[serde(default = "default_variables")]
    pub variables: Vec<OutputVariableName>,
}

impl ConfigContainer {
    pub fn from_file(config_file: &str) -> Result<ConfigContainer, AppError> {
        // Check the file extension to determine which method to use
        if config_file.ends_with(".yaml") || config_file.ends_with(".yml") {
            Self::from_yaml(config_file)
        } else if config_file.ends_with(".txt") {
            Self::from_txt_file(config_file)
        } else {
            Err(AppError::from(format!(
                "Unsupported config file format: {}",
                config_file
            )))
        }
    }

    pub fn from_yaml(config_file: &str) -> Result<Self, AppError> {
        let contents = read_to_string(config_file)?;
        Self::from_yaml_str(&contents)
            .map_err(|err| format!("Cannot parse config file {}: {}", config_file, err).into())
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, AppError> {
        let conf: ConfigContainer =
            serde_yaml::from_str(contents).map_err(|err| format!("{}", err))?;
        Ok(conf)
    }

    fn from_txt_file(config_file: &str) -> Result<ConfigContainer, AppError> {
        let config_map = read_config(config_file)?;
        Self::from_config_map(&config_map)
    }

    pub fn from_config_map(config_map: &ConfigMap) -> Result<ConfigContainer, AppError> {
        let defaults = FWIModelConfig::default();

        let parse_code = |key: &str, default: f64| -> Result<f64, AppError> {
            match config_map.first(key) {
                Some(value) => value
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid value for {key}: {value}").into()),
                None => Ok(default),
            }
        };

        let model = FWIModelConfig::new(
            parse_code(INITIAL_FFMC_KEY, defaults.initial_ffmc)?,
            parse_code(INITIAL_DMC_KEY, defaults.initial_dmc)?,
            parse_code(INITIAL_DC_KEY, defaults.initial_dc)?,
        );

        let variables = match config_map.all(VARIABLES_KEY) {
            Some(names) => names
                .iter()
                .map(|name| {
                    OutputVariableName::from_str(name)
                        .map_err(|_| AppError::from(format!("Invalid Variable Name {name}")))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => default_variables(),
        };

        Ok(ConfigContainer { model, variables })
    }
}

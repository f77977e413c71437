use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};

use chrono::{DateTime, Utc};
use fwi_grid::constants::NODATAVAL;
use fwi_grid::models::input::InputVariableName;
use itertools::Itertools;
use log::{debug, warn};
use ndarray::Array3;
use serde_derive::Deserialize;

use crate::common::helpers::AppError;

use super::prelude::InputHandler;

/// nested [time][y][x] values, null where missing
type NestedValues = Vec<Vec<Vec<Option<f64>>>>;

#[derive(Debug, Deserialize)]
struct JsonInputFile {
    timeline: Vec<DateTime<Utc>>,
    x: Vec<f64>,
    y: Vec<f64>,
    temperature: Option<NestedValues>,
    humidity: Option<NestedValues>,
    wind_speed: Option<NestedValues>,
    rain: Option<NestedValues>,
}

pub struct JsonInputHandler {
    source: String,
    timeline: Vec<DateTime<Utc>>,
    xs: Vec<f64>,
    ys: Vec<f64>,
    values: HashMap<InputVariableName, Array3<f64>>,
}

fn to_array(
    var: InputVariableName,
    nested: NestedValues,
    shape: (usize, usize, usize),
) -> Result<Array3<f64>, AppError> {
    let (n_times, n_rows, n_cols) = shape;
    let well_formed = nested.len() == n_times
        && nested
            .iter()
            .all(|day| day.len() == n_rows && day.iter().all(|row| row.len() == n_cols));
    if !well_formed {
        return Err(format!("{var} does not match the (time, y, x) shape {shape:?}").into());
    }

    let flat = nested
        .into_iter()
        .flatten()
        .flatten()
        .map(|value| value.unwrap_or(NODATAVAL))
        .collect_vec();
    Array3::from_shape_vec(shape, flat).map_err(|err| format!("{var}: {err}").into())
}

impl JsonInputHandler {
    pub fn new(path: &str) -> Result<Self, AppError> {
        let file =
            File::open(path).map_err(|err| format!("error opening input file {path}: {err}"))?;
        Self::from_reader(BufReader::new(file), path)
    }

    pub fn from_reader<R: Read>(reader: R, source: &str) -> Result<Self, AppError> {
        let data: JsonInputFile = serde_json::from_reader(reader)
            .map_err(|err| format!("error parsing input {source}: {err}"))?;

        if !data.timeline.iter().tuple_windows().all(|(a, b)| a < b) {
            return Err(format!("timeline of {source} is not strictly increasing").into());
        }

        let shape = (data.timeline.len(), data.y.len(), data.x.len());
        let mut values = HashMap::new();
        for (var, nested) in [
            (InputVariableName::temperature, data.temperature),
            (InputVariableName::humidity, data.humidity),
            (InputVariableName::wind_speed, data.wind_speed),
            (InputVariableName::rain, data.rain),
        ] {
            match nested {
                Some(nested) => {
                    values.insert(var, to_array(var, nested, shape)?);
                }
                None => warn!("Variable {var} not found in {source}"),
            }
        }
        debug!("Loaded {} variables from {source}", values.len());

        Ok(JsonInputHandler {
            source: source.into(),
            timeline: data.timeline,
            xs: data.x,
            ys: data.y,
            values,
        })
    }
}

impl InputHandler for JsonInputHandler {
    fn get_values(&self, var: InputVariableName) -> Option<Array3<f64>> {
        self.values.get(&var).cloned()
    }

    fn get_timeline(&self) -> Vec<DateTime<Utc>> {
        self.timeline.clone()
    }

    fn get_coordinates(&self) -> (Vec<f64>, Vec<f64>) {
        (self.xs.clone(), self.ys.clone())
    }

    fn info_input(&self) -> String {
        let (first, last) = match (self.timeline.first(), self.timeline.last()) {
            (Some(first), Some(last)) => (first.to_rfc3339(), last.to_rfc3339()),
            _ => ("-".into(), "-".into()),
        };
        format!(
            "{}: {} days from {} to {}, grid {}x{}, variables [{}]",
            self.source,
            self.timeline.len(),
            first,
            last,
            self.ys.len(),
            self.xs.len(),
            self.values.keys().sorted_by_key(|v| v.to_string()).join(", ")
        )
    }
}

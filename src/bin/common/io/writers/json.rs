use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use fwi_grid::constants::NODATAVAL;
use fwi_grid::models::output::{Output, OutputVariableName};
use log::debug;
use ndarray::Array3;
use rayon::prelude::*;
use serde_derive::Serialize;
use strum::EnumProperty;

use crate::common::helpers::AppError;

use super::prelude::OutputSink;

#[derive(Debug, Serialize)]
struct JsonVariable {
    name: String,
    long_name: &'static str,
    units: &'static str,
    values: Vec<Vec<Vec<Option<f64>>>>,
}

#[derive(Debug, Serialize)]
struct JsonFailure {
    row: usize,
    col: usize,
    x: Option<f64>,
    y: Option<f64>,
    reason: String,
}

#[derive(Debug, Serialize)]
struct JsonOutputFile<'a> {
    timeline: &'a [DateTime<Utc>],
    x: &'a [f64],
    y: &'a [f64],
    variables: Vec<JsonVariable>,
    missing_cells: usize,
    failures: Vec<JsonFailure>,
}

fn to_nested(values: &Array3<f64>) -> Vec<Vec<Vec<Option<f64>>>> {
    values
        .outer_iter()
        .map(|day| {
            day.outer_iter()
                .map(|row| {
                    row.iter()
                        .map(|v| if *v <= NODATAVAL + 1.0 { None } else { Some(*v) })
                        .collect()
                })
                .collect()
        })
        .collect()
}

fn build_document<'a>(output: &'a Output, variables: &[OutputVariableName]) -> JsonOutputFile<'a> {
    let variables = variables
        .par_iter()
        .map(|variable| {
            debug!("[JSON] Collecting variable {}", variable);
            JsonVariable {
                name: variable.to_string(),
                long_name: variable.get_str("long_name").unwrap_or("-"),
                units: variable.get_str("units").unwrap_or("-"),
                values: to_nested(&output.get(variable)),
            }
        })
        .collect();

    let failures = output
        .failures()
        .into_iter()
        .map(|(cell, err)| JsonFailure {
            row: cell.row,
            col: cell.col,
            x: output.xs.get(cell.col).copied(),
            y: output.ys.get(cell.row).copied(),
            reason: err.to_string(),
        })
        .collect();

    JsonOutputFile {
        timeline: &output.timeline,
        x: &output.xs,
        y: &output.ys,
        variables,
        missing_cells: output.missing_cells().len(),
        failures,
    }
}

pub struct JsonWriter {
    path: PathBuf,
}

impl JsonWriter {
    pub fn new(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
        }
    }
}

impl OutputSink for JsonWriter {
    fn write(
        &mut self,
        output: &Output,
        variables: &[OutputVariableName],
    ) -> Result<(), AppError> {
        let path = self.path.display();
        let document = build_document(output, variables);

        debug!("[JSON] Writing {} variables to {}", variables.len(), path);
        let file =
            File::create(&self.path).map_err(|err| format!("Cannot create file {path}: {err}"))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &document)
            .map_err(|err| format!("Cannot write file {path}: error {err}"))?;
        writer
            .flush()
            .map_err(|err| format!("Cannot write file {path}: error {err}"))?;
        debug!("[JSON] Done writing {}", path);
        Ok(())
    }
}

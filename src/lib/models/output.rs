use chrono::{DateTime, Utc};
use ndarray::{Array2, Array3, Axis, Zip};
use serde_derive::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumProperty, EnumString};

use crate::{constants::NODATAVAL, error::FWIError, models::input::CellId};

/// Daily values of one code for one cell, aligned with the weather series
pub type CodeSeries = Vec<f64>;

/// Fire behaviour indices of one cell-day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexTriple {
    /// Initial Spread Index
    pub isi: f64,
    /// Build Up Index
    pub bui: f64,
    /// Fire Weather Index
    pub fwi: f64,
}

#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(
    Debug,
    PartialEq,
    Eq,
    Hash,
    Copy,
    Clone,
    EnumString,
    EnumIter,
    EnumProperty,
    Display,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum OutputVariableName {
    /// Fine Fuel Moisture Code
    #[strum(props(long_name = "Fine Fuel Moisture Code", units = "-"))]
    ffmc,
    /// Duff Moisture Code
    #[strum(props(long_name = "Duff Moisture Code", units = "-"))]
    dmc,
    /// Drought Code
    #[strum(props(long_name = "Drought Code", units = "-"))]
    dc,
    /// Initial Spread Index
    #[strum(props(long_name = "Initial Spread Index", units = "-"))]
    isi,
    /// Build Up Index
    #[strum(props(long_name = "Build Up Index", units = "-"))]
    bui,
    /// Fire Weather Index
    #[strum(props(long_name = "Fire Weather Index", units = "-"))]
    fwi,
}

/// Codes and indices computed for one cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellOutput {
    pub ffmc: CodeSeries,
    pub dmc: CodeSeries,
    pub dc: CodeSeries,
    pub indices: Vec<IndexTriple>,
}

impl CellOutput {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn series(&self, variable: &OutputVariableName) -> Vec<f64> {
        use OutputVariableName::*;
        match variable {
            ffmc => self.ffmc.clone(),
            dmc => self.dmc.clone(),
            dc => self.dc.clone(),
            isi => self.indices.iter().map(|i| i.isi).collect(),
            bui => self.indices.iter().map(|i| i.bui).collect(),
            fwi => self.indices.iter().map(|i| i.fwi).collect(),
        }
    }
}

/// Result of the computation on a single cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellOutcome {
    Computed(CellOutput),
    /// no valid weather over the whole period
    Missing,
    Failed(FWIError),
}

impl CellOutcome {
    pub fn output(&self) -> Option<&CellOutput> {
        match self {
            CellOutcome::Computed(output) => Some(output),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellOutcome::Missing)
    }

    pub fn failure(&self) -> Option<&FWIError> {
        match self {
            CellOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Per-cell outcomes, keyed like the input grid
#[derive(Debug)]
pub struct Output {
    pub timeline: Vec<DateTime<Utc>>,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub cells: Array2<CellOutcome>,
}

impl Output {
    pub fn new(
        timeline: Vec<DateTime<Utc>>,
        xs: Vec<f64>,
        ys: Vec<f64>,
        cells: Array2<CellOutcome>,
    ) -> Self {
        Self {
            timeline,
            xs,
            ys,
            cells,
        }
    }

    pub fn cell(&self, cell: CellId) -> Option<&CellOutcome> {
        self.cells.get((cell.row, cell.col))
    }

    /// (time, y, x) array of a variable, NODATAVAL where the cell is missing or failed
    pub fn get(&self, variable: &OutputVariableName) -> Array3<f64> {
        let (rows, cols) = self.cells.dim();
        let mut values = Array3::from_elem((self.timeline.len(), rows, cols), NODATAVAL);
        Zip::from(values.lanes_mut(Axis(0)))
            .and(&self.cells)
            .par_for_each(|mut lane, outcome| {
                if let CellOutcome::Computed(output) = outcome {
                    lane.iter_mut()
                        .zip(output.series(variable))
                        .for_each(|(slot, value)| *slot = value);
                }
            });
        values
    }

    pub fn missing_cells(&self) -> Vec<CellId> {
        self.cells
            .indexed_iter()
            .filter(|(_, outcome)| outcome.is_missing())
            .map(|((row, col), _)| CellId { row, col })
            .collect()
    }

    pub fn failures(&self) -> Vec<(CellId, &FWIError)> {
        self.cells
            .indexed_iter()
            .filter_map(|((row, col), outcome)| {
                outcome.failure().map(|err| (CellId { row, col }, err))
            })
            .collect()
    }

    pub fn n_computed(&self) -> usize {
        self.cells.iter().filter(|o| o.output().is_some()).count()
    }
}

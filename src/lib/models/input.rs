use chrono::{DateTime, Datelike, Utc};
use ndarray::{Array2, ArrayView3};

use serde_derive::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::{constants::NODATAVAL, error::FWIError};

/// WeatherDay represents the daily weather of a single cell.
/// Missing values are stored as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherDay {
    /// air temperature [°C]
    pub temperature: f64,
    /// relative humidity [%]
    pub humidity: f64,
    /// wind speed [km/h]
    pub wind_speed: f64,
    /// rain cumulated over 24 hours [mm]
    pub rain: f64,
    /// calendar month [1-12]
    pub month: u32,
}

impl WeatherDay {
    pub fn new(temperature: f64, humidity: f64, wind_speed: f64, rain: f64, month: u32) -> Self {
        Self {
            temperature,
            humidity,
            wind_speed,
            rain,
            month,
        }
    }

    /// true if none of the weather variables carries a value
    pub fn is_missing(&self) -> bool {
        self.temperature.is_nan()
            && self.humidity.is_nan()
            && self.wind_speed.is_nan()
            && self.rain.is_nan()
    }
}

impl Default for WeatherDay {
    fn default() -> Self {
        Self {
            temperature: f64::NAN,
            humidity: f64::NAN,
            wind_speed: f64::NAN,
            rain: f64::NAN,
            month: 0,
        }
    }
}

/// Daily weather of one cell, ordered by date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSeries {
    pub days: Vec<WeatherDay>,
}

impl WeatherSeries {
    pub fn new(days: Vec<WeatherDay>) -> Self {
        Self { days }
    }

    /// A series for a cell without observations (ocean, out of domain)
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// A series is missing if it has no days, or if no day carries a value
    pub fn is_missing(&self) -> bool {
        self.days.iter().all(WeatherDay::is_missing)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WeatherDay> {
        self.days.iter()
    }
}

impl FromIterator<WeatherDay> for WeatherSeries {
    fn from_iter<I: IntoIterator<Item = WeatherDay>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Identity of a cell in the grid: row along y, column along x
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId {
    pub row: usize,
    pub col: usize,
}

#[allow(non_camel_case_types)]
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, EnumString, EnumIter, Display, Serialize, Deserialize)]
pub enum InputVariableName {
    /// Mean air temperature [°C]
    temperature,
    /// Relative humidity [%]
    humidity,
    /// Wind speed [km/h]
    wind_speed,
    /// Daily precipitation [mm]
    rain,
}

/// Converts values flagged with the sentinel to NaN
fn as_value(value: f64) -> f64 {
    if value.is_nan() || value <= (NODATAVAL + 1.0) {
        f64::NAN
    } else {
        value
    }
}

/// Daily weather over a regular grid, aligned on a common timeline
#[derive(Debug)]
pub struct WeatherGrid {
    pub timeline: Vec<DateTime<Utc>>,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    /// one series per cell, indexed by (row, col)
    pub cells: Array2<WeatherSeries>,
}

impl WeatherGrid {
    pub fn new(
        timeline: Vec<DateTime<Utc>>,
        xs: Vec<f64>,
        ys: Vec<f64>,
        cells: Array2<WeatherSeries>,
    ) -> Result<Self, FWIError> {
        if cells.dim() != (ys.len(), xs.len()) {
            return Err(FWIError::ShapeMismatch(format!(
                "cells have shape {:?}, coordinates give ({}, {})",
                cells.dim(),
                ys.len(),
                xs.len()
            )));
        }
        for ((row, col), series) in cells.indexed_iter() {
            if !series.is_empty() && series.len() != timeline.len() {
                return Err(FWIError::ShapeMismatch(format!(
                    "cell ({}, {}) has {} days, timeline has {}",
                    row,
                    col,
                    series.len(),
                    timeline.len()
                )));
            }
        }
        Ok(Self {
            timeline,
            xs,
            ys,
            cells,
        })
    }

    /// Build the grid from (time, y, x) arrays.
    /// The month of each day is taken from the timeline.
    /// Cells without any value over the whole period become missing series.
    #[allow(clippy::too_many_arguments)]
    pub fn from_arrays<'a>(
        timeline: Vec<DateTime<Utc>>,
        xs: Vec<f64>,
        ys: Vec<f64>,
        temperature: ArrayView3<'a, f64>,
        humidity: ArrayView3<'a, f64>,
        wind_speed: ArrayView3<'a, f64>,
        rain: ArrayView3<'a, f64>,
    ) -> Result<Self, FWIError> {
        let expected = (timeline.len(), ys.len(), xs.len());
        for (name, dim) in [
            (InputVariableName::temperature, temperature.dim()),
            (InputVariableName::humidity, humidity.dim()),
            (InputVariableName::wind_speed, wind_speed.dim()),
            (InputVariableName::rain, rain.dim()),
        ] {
            if dim != expected {
                return Err(FWIError::ShapeMismatch(format!(
                    "{} has shape {:?}, expected {:?}",
                    name, dim, expected
                )));
            }
        }

        let months: Vec<u32> = timeline.iter().map(|t| t.month()).collect();
        let cells = Array2::from_shape_fn((ys.len(), xs.len()), |(row, col)| {
            let series: WeatherSeries = months
                .iter()
                .enumerate()
                .map(|(t, &month)| WeatherDay {
                    temperature: as_value(temperature[[t, row, col]]),
                    humidity: as_value(humidity[[t, row, col]]),
                    wind_speed: as_value(wind_speed[[t, row, col]]),
                    rain: as_value(rain[[t, row, col]]),
                    month,
                })
                .collect();
            if series.is_missing() {
                WeatherSeries::missing()
            } else {
                series
            }
        });

        Self::new(timeline, xs, ys, cells)
    }

    /// (rows, cols) of the grid
    pub fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    /// number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn n_days(&self) -> usize {
        self.timeline.len()
    }

    pub fn get(&self, cell: CellId) -> Option<&WeatherSeries> {
        self.cells.get((cell.row, cell.col))
    }

    /// (x, y) coordinates of a cell
    pub fn coords(&self, cell: CellId) -> Option<(f64, f64)> {
        let x = self.xs.get(cell.col)?;
        let y = self.ys.get(cell.row)?;
        Some((*x, *y))
    }
}

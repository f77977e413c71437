use std::str::FromStr;

use chrono::Utc;
use itertools::izip;
use log::{debug, info, trace, warn};
use ndarray::{Array3, Axis, Zip};
use serde_derive::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    constants::NODATAVAL,
    error::FWIError,
    models::{
        input::{CellId, WeatherDay, WeatherGrid, WeatherSeries},
        output::{CellOutcome, CellOutput, CodeSeries, IndexTriple, Output},
    },
};

use super::{
    config::{FWIModelConfig, InitialCodes},
    functions::{compute_bui, compute_fwi, compute_isi, update_dc, update_dmc, update_ffmc},
};

/// The three moisture codes of the FWI System
#[allow(clippy::upper_case_acronyms)]
#[derive(
    Debug, PartialEq, Eq, Hash, Copy, Clone, EnumString, EnumIter, Display, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Code {
    /// Fine Fuel Moisture Code
    FFMC,
    /// Duff Moisture Code
    DMC,
    /// Drought Code
    DC,
}

impl Code {
    pub fn parse(name: &str) -> Result<Code, FWIError> {
        Code::from_str(name).map_err(|_| FWIError::InvalidCodeIdentifier(name.to_owned()))
    }

    pub fn initial(&self, codes: &InitialCodes) -> f64 {
        match self {
            Code::FFMC => codes.ffmc,
            Code::DMC => codes.dmc,
            Code::DC => codes.dc,
        }
    }

    /// Today's code from today's weather and yesterday's code
    pub fn transition(&self, day: &WeatherDay, previous: f64) -> f64 {
        match self {
            Code::FFMC => update_ffmc(
                day.temperature,
                day.humidity,
                day.wind_speed,
                day.rain,
                previous,
            ),
            Code::DMC => update_dmc(day.temperature, day.humidity, day.rain, day.month, previous),
            Code::DC => update_dc(day.temperature, day.rain, day.month, previous),
        }
    }
}

/// Steps a code over the series, one day after the other.
/// A missing series gives an empty code series.
pub fn code_series(
    code: Code,
    weather: &WeatherSeries,
    initial: f64,
) -> Result<CodeSeries, FWIError> {
    if weather.is_missing() {
        return Ok(CodeSeries::new());
    }
    let mut values = CodeSeries::with_capacity(weather.len());
    let mut state = initial;
    for (day, data) in weather.iter().enumerate() {
        state = code.transition(data, state);
        if !state.is_finite() {
            return Err(FWIError::ComputationFailure {
                variable: code.to_string(),
                day,
            });
        }
        values.push(state);
    }
    Ok(values)
}

/// ISI, BUI and FWI for each day, from the codes and the wind of the same day
pub fn index_series(
    weather: &WeatherSeries,
    ffmc: &[f64],
    dmc: &[f64],
    dc: &[f64],
) -> Result<Vec<IndexTriple>, FWIError> {
    if weather.is_missing() && ffmc.is_empty() && dmc.is_empty() && dc.is_empty() {
        return Ok(vec![]);
    }
    let len = weather.len();
    if ffmc.len() != len || dmc.len() != len || dc.len() != len {
        return Err(FWIError::ShapeMismatch(format!(
            "codes have lengths ({}, {}, {}), weather has {} days",
            ffmc.len(),
            dmc.len(),
            dc.len(),
            len
        )));
    }

    izip!(weather.iter(), ffmc, dmc, dc)
        .enumerate()
        .map(|(day, (data, &ffmc, &dmc, &dc))| {
            let isi = compute_isi(ffmc, data.wind_speed);
            let bui = compute_bui(dmc, dc);
            let fwi = compute_fwi(isi, bui);
            for (variable, value) in [("ISI", isi), ("BUI", bui), ("FWI", fwi)] {
                if !value.is_finite() {
                    return Err(FWIError::ComputationFailure {
                        variable: variable.to_owned(),
                        day,
                    });
                }
            }
            Ok(IndexTriple { isi, bui, fwi })
        })
        .collect()
}

fn run_cell(weather: &WeatherSeries, initial: &InitialCodes) -> Result<CellOutput, FWIError> {
    let ffmc = code_series(Code::FFMC, weather, initial.ffmc)?;
    let dmc = code_series(Code::DMC, weather, initial.dmc)?;
    let dc = code_series(Code::DC, weather, initial.dc)?;
    let indices = index_series(weather, &ffmc, &dmc, &dc)?;
    Ok(CellOutput {
        ffmc,
        dmc,
        dc,
        indices,
    })
}

/// Full pipeline on the series of a single cell
pub fn compute_cell(weather: &WeatherSeries, initial: &InitialCodes) -> CellOutcome {
    if weather.is_missing() {
        return CellOutcome::Missing;
    }
    match run_cell(weather, initial) {
        Ok(output) => CellOutcome::Computed(output),
        Err(err) => CellOutcome::Failed(err),
    }
}

/// Runs the FWI System over all the cells of a grid
#[derive(Debug)]
pub struct FWIGrid {
    initial: InitialCodes,
}

impl FWIGrid {
    /// Fails if the configured initial codes are outside their domain
    pub fn new(config: &FWIModelConfig) -> Result<Self, FWIError> {
        let initial = config.build()?;
        Ok(Self { initial })
    }

    pub fn initial_codes(&self) -> &InitialCodes {
        &self.initial
    }

    pub fn run(&self, grid: &WeatherGrid) -> Output {
        info!(
            "Computing FWI on {} cells over {} days",
            grid.len(),
            grid.n_days()
        );
        let start_time = Utc::now();
        let initial = &self.initial;
        let cells = Zip::from(&grid.cells).par_map_collect(|series| compute_cell(series, initial));
        trace!("Cells update took {} seconds", Utc::now() - start_time);

        let output = Output::new(
            grid.timeline.clone(),
            grid.xs.clone(),
            grid.ys.clone(),
            cells,
        );

        let failures = output.failures();
        for (cell, err) in &failures {
            debug!("Cell ({}, {}) failed: {}", cell.row, cell.col, err);
        }
        if !failures.is_empty() {
            warn!("{} cells could not be computed", failures.len());
        }
        info!(
            "{} cells computed, {} missing, {} failed",
            output.n_computed(),
            output.missing_cells().len(),
            failures.len()
        );
        output
    }

    /// Steps a single code over the whole grid.
    /// Returns a (time, y, x) array, NODATAVAL where the cell is missing or the code
    /// failed, and the cells where the code failed.
    /// Only the requested code is stepped: a cell failing on another code still
    /// gets values here, while `run` leaves the whole cell empty.
    pub fn compute_code(
        &self,
        grid: &WeatherGrid,
        code: Code,
    ) -> (Array3<f64>, Vec<(CellId, FWIError)>) {
        info!("Started processing {}", code);
        let start_time = Utc::now();

        let initial = code.initial(&self.initial);
        let series = Zip::from(&grid.cells).par_map_collect(|weather| code_series(code, weather, initial));

        let (rows, cols) = grid.shape();
        let mut values = Array3::from_elem((grid.n_days(), rows, cols), NODATAVAL);
        Zip::from(values.lanes_mut(Axis(0)))
            .and(&series)
            .par_for_each(|mut lane, result| {
                if let Ok(series) = result {
                    lane.iter_mut()
                        .zip(series)
                        .for_each(|(slot, value)| *slot = *value);
                }
            });

        let failures: Vec<(CellId, FWIError)> = series
            .indexed_iter()
            .filter_map(|((row, col), result)| {
                result.as_ref().err().map(|err| (CellId { row, col }, err.clone()))
            })
            .collect();
        for (cell, err) in &failures {
            debug!("Cell ({}, {}) failed: {}", cell.row, cell.col, err);
        }
        if !failures.is_empty() {
            warn!("{}: {} cells could not be computed", code, failures.len());
        }

        let elapsed = Utc::now() - start_time;
        info!(
            "{} ready. {:.2} min elapsed",
            code,
            elapsed.num_milliseconds() as f64 / 60_000.0
        );
        (values, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::output::OutputVariableName;
    use approx::assert_abs_diff_eq;
    use chrono::{DateTime, TimeZone};
    use ndarray::{s, Array2};
    use strum::IntoEnumIterator;

    const TOL: f64 = 1e-6;

    fn july() -> WeatherSeries {
        WeatherSeries::new(vec![
            WeatherDay::new(25.0, 30.0, 15.0, 0.0, 7),
            WeatherDay::new(28.0, 25.0, 20.0, 0.0, 7),
            WeatherDay::new(18.0, 70.0, 5.0, 12.0, 7),
            WeatherDay::new(26.0, 35.0, 12.0, 0.0, 7),
        ])
    }

    fn timeline(n: usize) -> Vec<DateTime<Utc>> {
        (1..=n as u32)
            .map(|d| Utc.with_ymd_and_hms(2021, 7, d, 12, 0, 0).unwrap())
            .collect()
    }

    fn grid(cells: Vec<WeatherSeries>, rows: usize, cols: usize) -> WeatherGrid {
        let xs = (0..cols).map(|c| c as f64).collect();
        let ys = (0..rows).map(|r| r as f64).collect();
        let cells = Array2::from_shape_vec((rows, cols), cells).unwrap();
        WeatherGrid::new(timeline(4), xs, ys, cells).unwrap()
    }

    #[test]
    fn parse_code_names() {
        assert_eq!(Code::parse("ffmc"), Ok(Code::FFMC));
        assert_eq!(Code::parse("DMC"), Ok(Code::DMC));
        assert_eq!(Code::parse("Dc"), Ok(Code::DC));
        assert_eq!(
            Code::parse("isi"),
            Err(FWIError::InvalidCodeIdentifier("isi".into()))
        );
    }

    #[test]
    fn empty_series_gives_empty_outputs() {
        let weather = WeatherSeries::missing();
        for code in [Code::FFMC, Code::DMC, Code::DC] {
            assert_eq!(code_series(code, &weather, 10.0), Ok(vec![]));
        }
        assert_eq!(index_series(&weather, &[], &[], &[]), Ok(vec![]));
        assert_eq!(compute_cell(&weather, &InitialCodes::default()), CellOutcome::Missing);
    }

    #[test]
    fn all_nan_series_is_skipped() {
        let weather = WeatherSeries::new(vec![WeatherDay::default(); 4]);
        assert_eq!(code_series(Code::FFMC, &weather, 85.0), Ok(vec![]));
        assert!(compute_cell(&weather, &InitialCodes::default()).is_missing());
    }

    #[test]
    fn pipeline_with_start_of_season_codes() {
        let outcome = compute_cell(&july(), &InitialCodes::default());
        let output = outcome.output().expect("cell should be computed");
        assert_eq!(output.len(), 4);

        let expected = [
            [91.11943142579442, 10.29081912, 23.204, 10.71237814831335, 10.242031134396123, 10.84473981511335],
            [93.36880469550657, 15.41655132, 31.948, 18.927534305475522, 15.325629663316258, 20.054388607633626],
            [46.99431938457104, 8.546878857383152, 20.77974071935011, 0.14215994446622984, 8.533789541425598, 0.07885692983632973],
            [83.51959168979506, 12.683867297383152, 29.16374071935011, 3.1616030679261846, 12.643827838521217, 3.840495729671816],
        ];
        for (day, row) in expected.iter().enumerate() {
            assert_abs_diff_eq!(output.ffmc[day], row[0], epsilon = TOL);
            assert_abs_diff_eq!(output.dmc[day], row[1], epsilon = TOL);
            assert_abs_diff_eq!(output.dc[day], row[2], epsilon = TOL);
            assert_abs_diff_eq!(output.indices[day].isi, row[3], epsilon = TOL);
            assert_abs_diff_eq!(output.indices[day].bui, row[4], epsilon = TOL);
            assert_abs_diff_eq!(output.indices[day].fwi, row[5], epsilon = TOL);
        }
    }

    #[test]
    fn fwi_blending_follows_bui_threshold() {
        let initial = FWIModelConfig::new(90.0, 120.0, 500.0).build().unwrap();
        let outcome = compute_cell(&july(), &initial);
        let output = outcome.output().expect("cell should be computed");

        // heavy rain on the third day brings BUI back under 80
        let expected_fwi = [38.410699742113415, 53.07583021879999, 0.2805136973811077, 10.825986468518147];
        for (day, index) in output.indices.iter().enumerate() {
            assert_abs_diff_eq!(index.fwi, expected_fwi[day], epsilon = TOL);
        }

        let high = output.indices[1];
        assert!(high.bui > 80.0);
        let bb = 0.1 * high.isi * (1000.0 / (25.0 + 108.64 / f64::exp(0.023 * high.bui)));
        assert_abs_diff_eq!(high.fwi, f64::exp(2.72 * (0.434 * bb.ln()).powf(0.647)), epsilon = 1e-12);

        let low = output.indices[3];
        assert!(low.bui <= 80.0);
        let bb = 0.1 * low.isi * (0.626 * low.bui.powf(0.809) + 2.0);
        assert_abs_diff_eq!(low.fwi, f64::exp(2.72 * (0.434 * bb.ln()).powf(0.647)), epsilon = 1e-12);
    }

    #[test]
    fn recurrence_is_deterministic() {
        let initial = InitialCodes::default();
        let first = compute_cell(&july(), &initial);
        let second = compute_cell(&july(), &initial);
        let (first, second) = (first.output().unwrap(), second.output().unwrap());
        for variable in OutputVariableName::iter() {
            let a = first.series(&variable);
            let b = second.series(&variable);
            assert_eq!(a.len(), 4);
            for (a, b) in a.iter().zip(&b) {
                assert_eq!(a.to_bits(), b.to_bits(), "{} differs between runs", variable);
            }
        }
    }

    #[test]
    fn recurrence_depends_on_day_order() {
        let weather = july();
        let mut reversed = weather.days.clone();
        reversed.reverse();
        let reversed = WeatherSeries::new(reversed);
        for code in [Code::FFMC, Code::DMC, Code::DC] {
            let forward = code_series(code, &weather, code.initial(&InitialCodes::default())).unwrap();
            let backward = code_series(code, &reversed, code.initial(&InitialCodes::default())).unwrap();
            assert_ne!(forward, backward, "{} should depend on the order of the days", code);
        }
    }

    #[test]
    fn codes_stay_in_range_over_a_season() {
        let weather: WeatherSeries = (0..240)
            .map(|d| {
                let d = d as f64;
                WeatherDay::new(
                    12.0 + 18.0 * (d * 0.05).sin(),
                    55.0 + 40.0 * (d * 0.9).sin(),
                    15.0 + 14.0 * (d * 0.3).cos(),
                    f64::max(0.0, 20.0 * (d * 0.7).sin() - 8.0),
                    (d as u32 / 30) % 12 + 1,
                )
            })
            .collect();
        let outcome = compute_cell(&weather, &InitialCodes::default());
        let output = outcome.output().expect("cell should be computed");
        assert_eq!(output.len(), 240);
        assert!(output.ffmc.iter().all(|v| (0.0..=101.0).contains(v)));
        assert!(output.dmc.iter().all(|v| *v >= 1.0));
        assert!(output.dc.iter().all(|v| *v >= 0.0));
        assert!(output.indices.iter().all(|i| i.bui >= 0.0 && i.fwi >= 0.0));
    }

    #[test]
    fn invalid_month_fails_the_cell() {
        let mut days = july().days;
        days[2].month = 13;
        let outcome = compute_cell(&WeatherSeries::new(days), &InitialCodes::default());
        assert_eq!(
            outcome,
            CellOutcome::Failed(FWIError::ComputationFailure {
                variable: "DMC".into(),
                day: 2
            })
        );
    }

    #[test]
    fn mismatched_codes_are_rejected() {
        let result = index_series(&july(), &[85.0; 4], &[6.0; 3], &[15.0; 4]);
        assert!(matches!(result, Err(FWIError::ShapeMismatch(_))));
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let result = FWIGrid::new(&FWIModelConfig::new(85.0, 6.0, -1.0));
        assert!(matches!(result, Err(FWIError::InvalidConfiguration(_))));
    }

    #[test]
    fn failed_cells_do_not_affect_siblings() {
        let mut broken = july().days;
        broken[1].wind_speed = -5.0;
        let cells = vec![
            july(),
            WeatherSeries::missing(),
            WeatherSeries::new(broken),
            july(),
        ];
        let model = FWIGrid::new(&FWIModelConfig::default()).unwrap();
        let output = model.run(&grid(cells, 2, 2));

        let reference = compute_cell(&july(), model.initial_codes());
        assert_eq!(output.cell(CellId { row: 0, col: 0 }), Some(&reference));
        assert_eq!(output.cell(CellId { row: 1, col: 1 }), Some(&reference));
        assert!(output.cell(CellId { row: 0, col: 1 }).unwrap().is_missing());
        assert_eq!(
            output.failures(),
            vec![(
                CellId { row: 1, col: 0 },
                &FWIError::ComputationFailure {
                    variable: "FFMC".into(),
                    day: 1
                }
            )]
        );

        let fwi = output.get(&OutputVariableName::fwi);
        assert_eq!(fwi[[0, 0, 1]], NODATAVAL);
        assert_eq!(fwi[[3, 1, 0]], NODATAVAL);
        assert_eq!(fwi[[3, 1, 1]], reference.output().unwrap().indices[3].fwi);
    }

    #[test]
    fn single_code_over_the_grid_matches_full_run() {
        let cells = vec![july(), WeatherSeries::missing()];
        let weather = grid(cells, 1, 2);
        let model = FWIGrid::new(&FWIModelConfig::default()).unwrap();

        let (dc, failures) = model.compute_code(&weather, Code::DC);
        let output = model.run(&weather);
        assert!(failures.is_empty());
        assert_eq!(dc, output.get(&OutputVariableName::dc));
        assert_eq!(dc[[3, 0, 1]], NODATAVAL);
    }

    #[test]
    fn single_code_over_the_grid_reports_failed_cells() {
        let mut broken = july().days;
        broken[2].month = 13;
        let cells = vec![july(), WeatherSeries::new(broken)];
        let weather = grid(cells, 1, 2);
        let model = FWIGrid::new(&FWIModelConfig::default()).unwrap();

        let (dmc, failures) = model.compute_code(&weather, Code::DMC);
        assert_eq!(
            failures,
            vec![(
                CellId { row: 0, col: 1 },
                FWIError::ComputationFailure {
                    variable: "DMC".into(),
                    day: 2
                }
            )]
        );
        assert!(dmc.slice(s![.., 0, 1]).iter().all(|v| *v == NODATAVAL));
        assert!(dmc.slice(s![.., 0, 0]).iter().all(|v| *v >= 1.0));

        // FFMC does not use the month, so it is still stepped for that cell
        let (ffmc, failures) = model.compute_code(&weather, Code::FFMC);
        assert!(failures.is_empty());
        assert_abs_diff_eq!(ffmc[[0, 0, 1]], 91.11943142579442, epsilon = TOL);
        assert_eq!(ffmc.slice(s![.., 0, 1]), ffmc.slice(s![.., 0, 0]));

        // the full run drops the whole cell
        let output = model.run(&weather);
        let full = output.get(&OutputVariableName::ffmc);
        assert!(full.slice(s![.., 0, 1]).iter().all(|v| *v == NODATAVAL));
    }
}

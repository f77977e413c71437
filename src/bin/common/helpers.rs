use std::fmt::Display;

use fwi_grid::{
    error::FWIError,
    models::input::{InputVariableName, WeatherGrid},
};

use crate::common::io::readers::prelude::InputHandler;

/// Get the input data from the input handler and build the weather grid.
/// Temperatures given in Kelvin are converted to Celsius.
pub fn get_input(handler: &dyn InputHandler) -> Result<WeatherGrid, AppError> {
    let timeline = handler.get_timeline();
    let (xs, ys) = handler.get_coordinates();

    let mut temperature = handler
        .get_values(InputVariableName::temperature)
        .ok_or("temperature not found in input")?;
    temperature.mapv_inplace(|_t| if _t > 200.0 { _t - 273.15 } else { _t }); // conversion to Celsius

    let humidity = handler
        .get_values(InputVariableName::humidity) // supposed in %
        .ok_or("humidity not found in input")?;
    let wind_speed = handler
        .get_values(InputVariableName::wind_speed) // supposed in km/h
        .ok_or("wind_speed not found in input")?;
    let rain = handler
        .get_values(InputVariableName::rain) // supposed in mm
        .ok_or("rain not found in input")?;

    let grid = WeatherGrid::from_arrays(
        timeline,
        xs,
        ys,
        temperature.view(),
        humidity.view(),
        wind_speed.view(),
        rain.view(),
    )?;
    Ok(grid)
}

#[derive(Debug)]
pub struct AppError {
    msg: String,
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError { msg }
    }
}

impl From<AppError> for String {
    fn from(value: AppError) -> String {
        value.msg
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError { msg: msg.into() }
    }
}

impl From<FWIError> for AppError {
    fn from(err: FWIError) -> Self {
        AppError {
            msg: err.to_string(),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.msg)
    }
}

impl std::error::Error for AppError {}

use chrono::{DateTime, Utc};
use fwi_grid::models::input::InputVariableName;
use ndarray::Array3;

/// Trait defining the behavior of an InputHandler for the model
pub trait InputHandler {
    /// get the desired variable over the whole period, as a (time, y, x) array
    fn get_values(&self, var: InputVariableName) -> Option<Array3<f64>>;

    /// Returns the timeline of the input data
    fn get_timeline(&self) -> Vec<DateTime<Utc>>;

    /// x and y coordinates of the grid
    fn get_coordinates(&self) -> (Vec<f64>, Vec<f64>);

    /// Short description of the loaded input, for logging
    fn info_input(&self) -> String;
}

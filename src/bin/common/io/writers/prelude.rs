use fwi_grid::models::output::{Output, OutputVariableName};

use crate::common::helpers::AppError;

/// Trait implemented by concrete output sinks that persist model variables.
pub trait OutputSink: Send {
    fn write(
        &mut self,
        output: &Output,
        variables: &[OutputVariableName],
    ) -> Result<(), AppError>;
}

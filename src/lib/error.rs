use std::fmt::Display;

/// Errors raised by the FWI engine
#[derive(Debug, Clone, PartialEq)]
pub enum FWIError {
    /// An initial code value outside its valid domain
    InvalidConfiguration(String),
    /// An unrecognized code name (expected one of FFMC, DMC, DC)
    InvalidCodeIdentifier(String),
    /// A non-finite value produced while stepping a cell
    ComputationFailure {
        /// name of the variable that failed
        variable: String,
        /// index of the day in the series
        day: usize,
    },
    /// Arrays or series whose lengths do not agree
    ShapeMismatch(String),
}

impl Display for FWIError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FWIError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {}", msg),
            FWIError::InvalidCodeIdentifier(name) => {
                write!(f, "unrecognized code '{}', expected one of FFMC, DMC, DC", name)
            }
            FWIError::ComputationFailure { variable, day } => {
                write!(f, "non-finite {} computed at day {}", variable, day)
            }
            FWIError::ShapeMismatch(msg) => write!(f, "shape mismatch: {}", msg),
        }
    }
}

impl std::error::Error for FWIError {}

//! Error types for drone_gnc

use thiserror::Error;

/// Main error type for the guidance, navigation and control core
#[derive(Debug, Error)]
pub enum RoboticsError {
    /// Start or goal cell is outside the grid or sits on an obstacle
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Search space exhausted without reaching the goal
    #[error("No path found: {0}")]
    NoPathFound(String),
    /// Zero-length leg or otherwise degenerate geometry/regression
    #[error("Degenerate configuration: {0}")]
    DegenerateConfiguration(String),
    /// Covariance lost positive-definiteness or state became non-finite
    #[error("Numeric instability: {0}")]
    NumericInstability(String),
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Plot rendering failed
    #[error("Plot error: {0}")]
    PlotError(String),
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// CSV record output failed
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    /// Parameter file could not be parsed
    #[error("Config error: {0}")]
    ConfigError(#[from] toml::de::Error),
}

/// Result type alias for robotics operations
pub type RoboticsResult<T> = Result<T, RoboticsError>;

//! Custom error types for the analysis pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Missing column: table '{table}' has no '{column}' column")]
    MissingColumn {
        table: String,
        column: String,
    },

    #[error("Insufficient data for {context}: need {required}, found {found}")]
    InsufficientData {
        context: String,
        required: usize,
        found: usize,
    },

    #[error("Degenerate division in {context}")]
    DegenerateDivision {
        context: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Timestamp parse error: '{value}' - {reason}")]
    TimestampParse {
        value: String,
        reason: String,
    },

    #[error("CSV error in {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    pub fn missing_column(table: &str, column: &str) -> Self {
        AnalysisError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub fn insufficient(context: &str, required: usize, found: usize) -> Self {
        AnalysisError::InsufficientData {
            context: context.to_string(),
            required,
            found,
        }
    }

    pub fn degenerate(context: &str) -> Self {
        AnalysisError::DegenerateDivision {
            context: context.to_string(),
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

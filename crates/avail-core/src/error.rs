//! Error types for availability evaluation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AvailError {
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("failed to construct evaluator for rule type `{rule_type}`: {message}")]
    Construction { rule_type: String, message: String },

    #[error("inventory resolver failed for subject type `{subject_type}`: {message}")]
    Resolver {
        subject_type: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, AvailError>;

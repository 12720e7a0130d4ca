//! Engine error taxonomy.
//!
//! Only invalid input is fatal to an evaluation. Missing FX rates degrade
//! the conversion instead (see [`crate::engine::converter::Converted`]), a
//! missing gold price falls back to its default, and zero balances or empty
//! simulations resolve to zero-valued figures.

use thiserror::Error;

/// Errors that reject a single evaluation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An input field is outside its valid range.
    #[error("Invalid parameter `{field}`: {reason}")]
    InvalidParameter {
        /// Name of the offending field
        field: &'static str,
        /// Human-readable explanation shown to the user
        reason: String,
    },
}

impl EngineError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    /// Field that caused the rejection.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidParameter { field, .. } => field,
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

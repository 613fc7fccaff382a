//! # Errors
//!
//! $$
//! \text{stage}_k : X_k \to X_{k+1} \ \cup \ \{\text{Validation}, \text{DataQuality}, \text{ExternalIo}\}
//! $$
//!
//! A failed stage aborts the run; nothing downstream consumes partial results.

use thiserror::Error;

/// Terminal failure of an HRP pipeline stage.
#[derive(Error, Debug)]
pub enum HrpError {
  /// Malformed or mismatched inputs (asset sets, capital, matrix shapes).
  #[error("validation error: {0}")]
  Validation(String),

  /// Unusable data (empty tables, non-finite returns, non-positive variance).
  #[error("data quality error: {0}")]
  DataQuality(String),

  /// Market data collaborator failure, passed through without retry.
  #[error("external I/O error: {0}")]
  ExternalIo(#[from] anyhow::Error),
}

impl HrpError {
  pub(crate) fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }

  pub(crate) fn data_quality(msg: impl Into<String>) -> Self {
    Self::DataQuality(msg.into())
  }
}

pub type Result<T> = std::result::Result<T, HrpError>;

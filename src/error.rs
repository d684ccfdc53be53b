//! Error types for basis generation, fitting, and the file surface.
//!
//! The first four variants are raised by the polynomial core; the rest only
//! come from reading and writing sample tables and model files.

use std::path::PathBuf;

/// Errors that can occur while building, fitting, or persisting a model.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The variable count must be at least one.
    #[error("invalid dimension: variable count must be >= 1, got {nvars}")]
    InvalidDimension {
        /// Requested number of variables
        nvars: usize,
    },

    /// The complete basis would hold more monomials than allowed.
    ///
    /// Raised before any exponent tuple is materialized.
    #[error("basis of {cardinality} terms exceeds the configured maximum of {bound}")]
    BasisTooLarge {
        /// Number of monomials the request would produce (saturated at `usize::MAX`)
        cardinality: usize,
        /// Configured upper bound
        bound: usize,
    },

    /// Sample matrix, label vector, or coefficient vector has the wrong shape.
    #[error("dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which quantity was checked
        what: &'static str,
        /// Expected size
        expected: usize,
        /// Actual size
        actual: usize,
    },

    /// The minimum-norm solve could not produce a finite result.
    #[error("fit failed: {0}")]
    SingularFit(String),

    /// A persisted model lists exponent tuples that differ from the regenerated basis.
    #[error("stored basis does not match the basis for {nvars} variables up to degree {max_degree}")]
    BasisMismatch {
        /// Variable count read from the model file
        nvars: usize,
        /// Degree read from the model file
        max_degree: u32,
    },

    /// A sample table cell could not be read as a number.
    #[error("{path:?}, line {line}: {message}")]
    Parse {
        /// Table being read
        path: PathBuf,
        /// 1-based line number
        line: u64,
        /// What went wrong
        message: String,
    },

    /// Reading or writing a file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A sample table is not well-formed CSV, or rows differ in width.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// A model file could not be encoded or decoded as JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type for polynomial surrogate operations
pub type Result<T> = std::result::Result<T, Error>;

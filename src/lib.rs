//! Polynomial surrogates for expensive scalar measurements.
//!
//! A [`PolynomialModel`] holds every monomial up to a total degree over `Nq`
//! input variables, fits their coefficients to labeled samples by
//! minimum-norm least squares, and predicts labels for new points.
//!
//! ```
//! use nalgebra::{DMatrix, DVector};
//! use polysurrogate::PolynomialModel;
//!
//! // y = 1 + 2x on four samples
//! let samples = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
//! let labels = DVector::from_vec(vec![1.0, 3.0, 5.0, 7.0]);
//!
//! let mut model = PolynomialModel::new(1, 2).unwrap();
//! model.fit(&samples, &labels).unwrap();
//! assert!((model.evaluate_point(&[4.0]).unwrap() - 9.0).abs() < 1e-9);
//! ```

pub mod basis;
pub mod error;
pub mod io;
pub mod metrics;
pub mod polyfit;

pub use basis::{Basis, DEFAULT_MAX_TERMS, ExponentTuple};
pub use error::{Error, Result};
pub use polyfit::{FitReport, PolynomialModel};

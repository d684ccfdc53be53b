use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector, SVD};
use rayon::prelude::*;

use crate::basis::{Basis, DEFAULT_MAX_TERMS};
use crate::error::{Error, Result};
use crate::metrics;

/// Summary of a successful fit, measured on the training samples
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub samples: usize,
    pub terms: usize,
    /// Numerical rank of the design matrix
    pub rank: usize,
    pub rms_error: f64,
    pub max_abs_error: f64,
    pub r_squared: f64,
}

/// Multivariate polynomial of bounded total degree
///
/// The basis is fixed at construction; only the coefficients change, and only
/// when [`PolynomialModel::fit`] succeeds. An unfitted model has all-zero
/// coefficients and evaluates to zero everywhere.
#[derive(Debug, Clone)]
pub struct PolynomialModel {
    basis: Basis,
    coeffs: DVector<f64>,
    fitted: bool,
}

impl PolynomialModel {
    pub fn new(nvars: usize, max_degree: u32) -> Result<Self> {
        Self::with_max_terms(nvars, max_degree, DEFAULT_MAX_TERMS)
    }

    pub fn with_max_terms(nvars: usize, max_degree: u32, max_terms: usize) -> Result<Self> {
        let basis = Basis::new(nvars, max_degree, max_terms)?;
        let coeffs = DVector::zeros(basis.len());
        Ok(PolynomialModel {
            basis,
            coeffs,
            fitted: false,
        })
    }

    /// Rebuilds a fitted model from previously computed coefficients
    pub fn with_coefficients(
        nvars: usize,
        max_degree: u32,
        coeffs: Vec<f64>,
        max_terms: usize,
    ) -> Result<Self> {
        let mut model = Self::with_max_terms(nvars, max_degree, max_terms)?;
        if coeffs.len() != model.basis.len() {
            return Err(Error::DimensionMismatch {
                what: "coefficient count",
                expected: model.basis.len(),
                actual: coeffs.len(),
            });
        }
        model.coeffs = DVector::from_vec(coeffs);
        model.fitted = true;
        Ok(model)
    }

    pub fn nvars(&self) -> usize {
        self.basis.nvars()
    }

    pub fn max_degree(&self) -> u32 {
        self.basis.max_degree()
    }

    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    pub fn num_terms(&self) -> usize {
        self.basis.len()
    }

    pub fn coefficients(&self) -> &DVector<f64> {
        &self.coeffs
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Values of every basis monomial at `point`
    pub fn term_vector(&self, point: &[f64]) -> Result<DVector<f64>> {
        self.check_point(point)?;
        let mut terms = DVector::zeros(self.basis.len());
        self.fill_terms(point, terms.as_mut_slice());
        Ok(terms)
    }

    /// Fits the minimum-norm least-squares coefficients for `labels`
    ///
    /// Each row of `samples` is one point. A rank-deficient design matrix is
    /// expected and handled; the stored coefficients are only replaced when the
    /// solve succeeds.
    pub fn fit(&mut self, samples: &DMatrix<f64>, labels: &DVector<f64>) -> Result<FitReport> {
        self.check_columns(samples)?;
        if labels.len() != samples.nrows() {
            return Err(Error::DimensionMismatch {
                what: "label count",
                expected: samples.nrows(),
                actual: labels.len(),
            });
        }
        if samples.iter().chain(labels.iter()).any(|v| !v.is_finite()) {
            return Err(Error::SingularFit(
                "samples or labels contain non-finite values".to_string(),
            ));
        }

        let (nsamples, nterms) = (samples.nrows(), self.basis.len());
        if nsamples < nterms {
            warn!(
                "fitting {} terms from only {} samples; solution is underdetermined",
                nterms, nsamples
            );
        }

        let design = self.design_matrix(samples);
        // finite samples can still overflow once raised to a power, and the SVD
        // squares column norms, so the whole matrix norm has to stay finite
        if !design.norm().is_finite() {
            return Err(Error::SingularFit(
                "design matrix contains non-finite terms".to_string(),
            ));
        }
        let (coeffs, rank) = if nsamples == 0 {
            (DVector::zeros(nterms), 0)
        } else {
            min_norm_solve(design.clone(), labels)?
        };

        let predicted = &design * &coeffs;
        let report = FitReport {
            samples: nsamples,
            terms: nterms,
            rank,
            rms_error: metrics::rms_error(predicted.as_slice(), labels.as_slice()),
            max_abs_error: metrics::max_abs_error(predicted.as_slice(), labels.as_slice()),
            r_squared: metrics::r_squared(predicted.as_slice(), labels.as_slice()),
        };
        info!(
            "fitted {} terms on {} samples (rank {}): rms {:.3e}, max {:.3e}, r2 {:.6}",
            report.terms,
            report.samples,
            report.rank,
            report.rms_error,
            report.max_abs_error,
            report.r_squared
        );

        self.coeffs = coeffs;
        self.fitted = true;
        Ok(report)
    }

    /// Predicts one value per row of `samples`
    pub fn evaluate(&self, samples: &DMatrix<f64>) -> Result<DVector<f64>> {
        self.check_columns(samples)?;
        let values: Vec<f64> = (0..samples.nrows())
            .into_par_iter()
            .map(|i| {
                let point: Vec<f64> = samples.row(i).iter().copied().collect();
                self.predict(&point)
            })
            .collect();
        Ok(DVector::from_vec(values))
    }

    pub fn evaluate_point(&self, point: &[f64]) -> Result<f64> {
        self.check_point(point)?;
        Ok(self.predict(point))
    }

    fn predict(&self, point: &[f64]) -> f64 {
        let mut terms = vec![0.0; self.basis.len()];
        self.fill_terms(point, &mut terms);
        terms.iter().zip(self.coeffs.iter()).map(|(t, c)| t * c).sum()
    }

    /// Writes the monomial values at `point` into `out`, one per basis entry
    fn fill_terms(&self, point: &[f64], out: &mut [f64]) {
        // powers[j * stride + e] = point[j]^e, with x^0 = 1 for every x
        let stride = self.basis.max_degree() as usize + 1;
        let mut powers = vec![1.0; point.len() * stride];
        for (j, &x) in point.iter().enumerate() {
            for e in 1..stride {
                powers[j * stride + e] = powers[j * stride + e - 1] * x;
            }
        }

        for (value, exponents) in out.iter_mut().zip(self.basis.iter()) {
            *value = exponents
                .iter()
                .enumerate()
                .filter(|&(_, &e)| e != 0)
                .fold(1.0, |acc, (j, &e)| acc * powers[j * stride + e as usize]);
        }
    }

    /// Stacks the term vectors of every sample row
    fn design_matrix(&self, samples: &DMatrix<f64>) -> DMatrix<f64> {
        let (nrows, nterms) = (samples.nrows(), self.basis.len());
        let mut data = vec![0.0; nrows * nterms];
        data.par_chunks_mut(nterms).enumerate().for_each(|(i, row)| {
            let point: Vec<f64> = samples.row(i).iter().copied().collect();
            self.fill_terms(&point, row);
        });
        DMatrix::from_row_slice(nrows, nterms, &data)
    }

    fn check_columns(&self, samples: &DMatrix<f64>) -> Result<()> {
        if samples.ncols() != self.nvars() {
            return Err(Error::DimensionMismatch {
                what: "sample column count",
                expected: self.nvars(),
                actual: samples.ncols(),
            });
        }
        Ok(())
    }

    fn check_point(&self, point: &[f64]) -> Result<()> {
        if point.len() != self.nvars() {
            return Err(Error::DimensionMismatch {
                what: "point length",
                expected: self.nvars(),
                actual: point.len(),
            });
        }
        Ok(())
    }
}

/// Minimum-norm least-squares solution of `design * x = labels`, with the numerical rank
///
/// Equivalent to `pinv(design) * labels`. Singular values below
/// `max(s) * max(rows, cols) * eps` are treated as zero.
/// https://en.wikipedia.org/wiki/Moore%E2%80%93Penrose_inverse#Linear_least-squares
fn min_norm_solve(design: DMatrix<f64>, labels: &DVector<f64>) -> Result<(DVector<f64>, usize)> {
    let (nrows, ncols) = design.shape();
    let svd = SVD::try_new(design, true, true, f64::EPSILON, 0).ok_or_else(|| {
        Error::SingularFit("singular value decomposition did not converge".to_string())
    })?;

    let cutoff = svd.singular_values.max() * nrows.max(ncols) as f64 * f64::EPSILON;
    let rank = svd.rank(cutoff);
    debug!(
        "design matrix {}x{}: rank {}, singular value cutoff {:.3e}",
        nrows, ncols, rank, cutoff
    );

    let coeffs = svd
        .solve(labels, cutoff)
        .map_err(|e| Error::SingularFit(e.to_string()))?;
    if coeffs.iter().any(|c| !c.is_finite()) {
        return Err(Error::SingularFit(
            "solution contains non-finite coefficients".to_string(),
        ));
    }

    Ok((coeffs, rank))
}

//! Exponent basis for multivariate monomials of bounded total degree.
//!
//! Every `N`-tuple of nonnegative integers summing to `P` corresponds to a choice
//! of `N - 1` bar positions among `P + N - 1` slots (stars and bars). Enumerating
//! those combinations lexicographically gives a deterministic order for each
//! degree slice; the complete basis concatenates the slices for `0..=P`.
//!
//! https://en.wikipedia.org/wiki/Stars_and_bars_(combinatorics)

use std::ops::Range;

use log::debug;

use crate::error::{Error, Result};

/// Default upper bound on the number of monomials in a basis
pub const DEFAULT_MAX_TERMS: usize = 10_000;

/// Per-variable exponents of one monomial
pub type ExponentTuple = Box<[u32]>;

/// Lexicographic `k`-combinations of `1..=n`
///
/// `Combinations::new(4, 2)` yields `[1, 2], [1, 3], [1, 4], [2, 3], [2, 4], [3, 4]`.
/// A `k` of zero yields the empty combination once; `k > n` yields nothing.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    current: Option<Vec<usize>>,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        let current = if k <= n {
            Some((1..=k).collect())
        } else {
            None
        };
        Combinations { n, current }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        let k = current.len();

        // rightmost position that can still move right
        let pivot = (0..k).rev().find(|&i| current[i] < self.n - k + i + 1);
        if let Some(i) = pivot {
            let mut next = current.clone();
            next[i] += 1;
            for j in i + 1..k {
                next[j] = next[j - 1] + 1;
            }
            self.current = Some(next);
        }

        Some(current)
    }
}

/// `C(n, k)`, saturating at `usize::MAX` instead of overflowing
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k) as u128;
    let n = n as u128;

    // each partial product is itself a binomial coefficient, so the division is exact
    let mut acc: u128 = 1;
    for i in 1..=k {
        acc = match acc.checked_mul(n - k + i) {
            Some(v) => v / i,
            None => return usize::MAX,
        };
    }
    usize::try_from(acc).unwrap_or(usize::MAX)
}

fn validate_nvars(nvars: usize) -> Result<()> {
    if nvars == 0 {
        return Err(Error::InvalidDimension { nvars });
    }
    Ok(())
}

/// Number of `nvars`-tuples summing to exactly `degree`, without materializing them
pub fn degree_slice_cardinality(nvars: usize, degree: u32) -> Result<usize> {
    validate_nvars(nvars)?;
    let slots = (degree as usize).saturating_add(nvars - 1);
    Ok(binomial(slots, nvars - 1))
}

/// Number of monomials of total degree `0..=max_degree` in `nvars` variables
pub fn complete_basis_cardinality(nvars: usize, max_degree: u32) -> Result<usize> {
    validate_nvars(nvars)?;
    let mut total: usize = 0;
    for degree in 0..=max_degree {
        total = total.saturating_add(degree_slice_cardinality(nvars, degree)?);
        if total == usize::MAX {
            break;
        }
    }
    Ok(total)
}

/// Admission check for a complete basis; returns the cardinality when it fits under `max_terms`
pub fn check_cardinality(nvars: usize, max_degree: u32, max_terms: usize) -> Result<usize> {
    let cardinality = complete_basis_cardinality(nvars, max_degree)?;
    if cardinality > max_terms {
        return Err(Error::BasisTooLarge {
            cardinality,
            bound: max_terms,
        });
    }
    Ok(cardinality)
}

/// Decodes increasing bar positions in `1..=slots` into per-variable exponents
fn decode_bars(bars: &[usize], slots: usize) -> ExponentTuple {
    let mut exponents = Vec::with_capacity(bars.len() + 1);
    let mut previous = 0;
    for &bar in bars {
        exponents.push((bar - previous - 1) as u32);
        previous = bar;
    }
    exponents.push((slots - previous) as u32);
    exponents.into_boxed_slice()
}

/// Every `nvars`-tuple of nonnegative integers summing to exactly `degree`
///
/// Tuples come out in lexicographic order of their bar positions, so the
/// sequence is identical across calls. For two variables and degree 2 this is
/// `(0, 2), (1, 1), (2, 0)`.
///
/// Fails with [`Error::BasisTooLarge`] before allocating when the slice would
/// hold more than `max_terms` tuples.
pub fn generate_degree_slice(
    nvars: usize,
    degree: u32,
    max_terms: usize,
) -> Result<Vec<ExponentTuple>> {
    let cardinality = degree_slice_cardinality(nvars, degree)?;
    if cardinality > max_terms {
        return Err(Error::BasisTooLarge {
            cardinality,
            bound: max_terms,
        });
    }
    Ok(degree_slice(nvars, degree, cardinality))
}

// callers have already validated `nvars` and bounded `cardinality`
fn degree_slice(nvars: usize, degree: u32, cardinality: usize) -> Vec<ExponentTuple> {
    if nvars == 1 {
        return vec![vec![degree].into_boxed_slice()];
    }

    let slots = degree as usize + nvars - 1;
    let mut slice = Vec::with_capacity(cardinality);
    slice.extend(Combinations::new(slots, nvars - 1).map(|bars| decode_bars(&bars, slots)));
    slice
}

/// All monomials of total degree `0..=max_degree`, grouped by ascending degree
///
/// Fails with [`Error::BasisTooLarge`] before allocating when the basis would
/// hold more than `max_terms` tuples.
pub fn generate_complete_basis(
    nvars: usize,
    max_degree: u32,
    max_terms: usize,
) -> Result<Vec<ExponentTuple>> {
    Ok(Basis::new(nvars, max_degree, max_terms)?.terms)
}

/// Ordered set of monomials used by a polynomial model
///
/// Index `i` of the basis is the index of coefficient `i` everywhere it is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basis {
    nvars: usize,
    max_degree: u32,
    terms: Vec<ExponentTuple>,
    // start index of each degree slice, plus the total length
    offsets: Vec<usize>,
}

impl Basis {
    pub fn new(nvars: usize, max_degree: u32, max_terms: usize) -> Result<Self> {
        let cardinality = check_cardinality(nvars, max_degree, max_terms)?;

        let mut terms = Vec::with_capacity(cardinality);
        let mut offsets = Vec::with_capacity(max_degree as usize + 2);
        for degree in 0..=max_degree {
            offsets.push(terms.len());
            let slice_len = degree_slice_cardinality(nvars, degree)?;
            terms.extend(degree_slice(nvars, degree, slice_len));
        }
        offsets.push(terms.len());

        debug!(
            "generated basis of {} terms for {} variables up to degree {}",
            terms.len(),
            nvars,
            max_degree
        );

        Ok(Basis {
            nvars,
            max_degree,
            terms,
            offsets,
        })
    }

    pub fn nvars(&self) -> usize {
        self.nvars
    }

    pub fn max_degree(&self) -> u32 {
        self.max_degree
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Always false for a constructed basis, which contains at least the constant term
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[u32]> {
        self.terms.get(index).map(|t| &t[..])
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[u32]> {
        self.terms.iter().map(|t| &t[..])
    }

    pub fn terms(&self) -> &[ExponentTuple] {
        &self.terms
    }

    /// Index range of the monomials with total degree exactly `degree`
    pub fn degree_range(&self, degree: u32) -> Option<Range<usize>> {
        let d = degree as usize;
        if degree > self.max_degree {
            return None;
        }
        Some(self.offsets[d]..self.offsets[d + 1])
    }

    /// Index of the all-zero exponent tuple
    pub fn constant_index(&self) -> usize {
        0
    }

    /// Index of the monomial with exactly these exponents
    pub fn position(&self, exponents: &[u32]) -> Option<usize> {
        let degree = exponents.iter().sum::<u32>();
        let range = self.degree_range(degree)?;
        self.terms[range.clone()]
            .iter()
            .position(|t| &t[..] == exponents)
            .map(|i| range.start + i)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    fn tuples(slice: &[ExponentTuple]) -> Vec<Vec<u32>> {
        slice.iter().map(|t| t.to_vec()).collect()
    }

    #[test]
    fn combinations_are_lexicographic() {
        let combos: Vec<Vec<usize>> = Combinations::new(4, 2).collect();
        assert_eq!(
            combos,
            vec![
                vec![1, 2],
                vec![1, 3],
                vec![1, 4],
                vec![2, 3],
                vec![2, 4],
                vec![3, 4]
            ]
        );
    }

    #[test]
    fn combinations_edge_cases() {
        assert_eq!(Combinations::new(3, 0).collect::<Vec<_>>(), vec![Vec::<usize>::new()]);
        assert_eq!(Combinations::new(2, 3).count(), 0);
        assert_eq!(Combinations::new(3, 3).collect::<Vec<_>>(), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn binomial_values() {
        assert_eq!(binomial(0, 0), 1);
        assert_eq!(binomial(5, 2), 10);
        assert_eq!(binomial(5, 3), 10);
        assert_eq!(binomial(3, 4), 0);
        assert_eq!(binomial(60, 30), 118_264_581_564_861_424);
        assert_eq!(binomial(10_000, 5_000), usize::MAX);
    }

    #[test]
    fn single_variable_slice() {
        assert_eq!(tuples(&generate_degree_slice(1, 3, DEFAULT_MAX_TERMS).unwrap()), vec![vec![3]]);
    }

    #[test]
    fn two_variable_quadratic_slice() {
        let slice = tuples(&generate_degree_slice(2, 2, DEFAULT_MAX_TERMS).unwrap());
        assert_eq!(slice, vec![vec![0, 2], vec![1, 1], vec![2, 0]]);
        assert_eq!(degree_slice_cardinality(2, 2).unwrap(), 3);
    }

    #[test]
    fn degree_zero_is_constant_term() {
        for nvars in 1..6 {
            let slice = tuples(&generate_degree_slice(nvars, 0, DEFAULT_MAX_TERMS).unwrap());
            assert_eq!(slice, vec![vec![0; nvars]]);
        }
    }

    #[test]
    fn complete_linear_basis() {
        let basis = tuples(&generate_complete_basis(2, 1, DEFAULT_MAX_TERMS).unwrap());
        assert_eq!(basis, vec![vec![0, 0], vec![0, 1], vec![1, 0]]);
        assert_eq!(complete_basis_cardinality(2, 1).unwrap(), 3);
    }

    #[test]
    fn zero_variables_rejected() {
        assert!(matches!(
            generate_degree_slice(0, 2, DEFAULT_MAX_TERMS),
            Err(Error::InvalidDimension { nvars: 0 })
        ));
        assert!(matches!(
            complete_basis_cardinality(0, 2),
            Err(Error::InvalidDimension { .. })
        ));
        assert!(matches!(
            Basis::new(0, 1, DEFAULT_MAX_TERMS),
            Err(Error::InvalidDimension { .. })
        ));
    }

    #[test]
    fn bound_rejects_before_generation() {
        // C(15, 5) = 3003 terms for 5 variables up to degree 10
        assert_eq!(complete_basis_cardinality(5, 10).unwrap(), 3003);
        assert_eq!(check_cardinality(5, 10, 3003).unwrap(), 3003);
        match Basis::new(5, 10, 3002) {
            Err(Error::BasisTooLarge { cardinality, bound }) => {
                assert_eq!(cardinality, 3003);
                assert_eq!(bound, 3002);
            }
            other => panic!("expected BasisTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn astronomical_request_saturates() {
        // would never finish if the tuples were generated
        match generate_complete_basis(1_000, 1_000, DEFAULT_MAX_TERMS) {
            Err(Error::BasisTooLarge { cardinality, .. }) => assert_eq!(cardinality, usize::MAX),
            other => panic!("expected BasisTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn oversized_slice_is_rejected_before_generation() {
        // C(59, 29) tuples would not fit in memory
        match generate_degree_slice(30, 30, DEFAULT_MAX_TERMS) {
            Err(Error::BasisTooLarge { cardinality, bound }) => {
                assert_eq!(cardinality, binomial(59, 29));
                assert_eq!(bound, DEFAULT_MAX_TERMS);
            }
            other => panic!("expected BasisTooLarge, got {other:?}"),
        }
        match generate_degree_slice(1_000, 1_000, DEFAULT_MAX_TERMS) {
            Err(Error::BasisTooLarge { cardinality, .. }) => assert_eq!(cardinality, usize::MAX),
            other => panic!("expected BasisTooLarge, got {other:?}"),
        }
        // C(4, 2) = 6 fits exactly
        assert_eq!(generate_degree_slice(3, 2, 6).unwrap().len(), 6);
        assert!(matches!(
            generate_degree_slice(3, 2, 5),
            Err(Error::BasisTooLarge { cardinality: 6, bound: 5 })
        ));
    }

    #[test]
    fn complete_basis_matches_basis_terms() {
        let generated = generate_complete_basis(3, 3, DEFAULT_MAX_TERMS).unwrap();
        let basis = Basis::new(3, 3, DEFAULT_MAX_TERMS).unwrap();
        assert_eq!(generated.as_slice(), basis.terms());
    }

    #[test]
    fn degree_ranges_partition_basis() {
        let basis = Basis::new(3, 4, DEFAULT_MAX_TERMS).unwrap();
        assert_eq!(basis.len(), 35);
        assert_eq!(basis.degree_range(0), Some(0..1));
        assert_eq!(basis.degree_range(1), Some(1..4));
        assert_eq!(basis.degree_range(4), Some(20..35));
        assert_eq!(basis.degree_range(5), None);
        for degree in 0..=4 {
            for i in basis.degree_range(degree).unwrap() {
                assert_eq!(basis.get(i).unwrap().iter().sum::<u32>(), degree);
            }
        }
        assert!(basis.get(basis.constant_index()).unwrap().iter().all(|&e| e == 0));
    }

    #[test]
    fn position_finds_terms() {
        let basis = Basis::new(2, 2, DEFAULT_MAX_TERMS).unwrap();
        assert_eq!(basis.position(&[0, 0]), Some(0));
        assert_eq!(basis.position(&[1, 1]), Some(4));
        assert_eq!(basis.position(&[2, 0]), Some(5));
        assert_eq!(basis.position(&[3, 0]), None);
        assert_eq!(basis.position(&[1, 0, 0]), None);
    }

    #[test]
    fn generation_is_reproducible() {
        let a = Basis::new(4, 5, DEFAULT_MAX_TERMS).unwrap();
        let b = Basis::new(4, 5, DEFAULT_MAX_TERMS).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn slice_is_complete_and_distinct(nvars in 1usize..6, degree in 0u32..8) {
            let slice = generate_degree_slice(nvars, degree, usize::MAX).unwrap();
            let expected = binomial(degree as usize + nvars - 1, nvars - 1);
            prop_assert_eq!(slice.len(), expected);
            prop_assert_eq!(degree_slice_cardinality(nvars, degree).unwrap(), expected);

            let mut seen = HashSet::new();
            for tuple in &slice {
                prop_assert_eq!(tuple.len(), nvars);
                prop_assert_eq!(tuple.iter().sum::<u32>(), degree);
                prop_assert!(seen.insert(tuple.clone()));
            }
        }

        #[test]
        fn complete_basis_cardinality_matches(nvars in 1usize..6, max_degree in 0u32..7) {
            let basis = generate_complete_basis(nvars, max_degree, usize::MAX).unwrap();
            let summed: usize = (0..=max_degree)
                .map(|p| binomial(p as usize + nvars - 1, nvars - 1))
                .sum();
            prop_assert_eq!(basis.len(), summed);
            prop_assert_eq!(complete_basis_cardinality(nvars, max_degree).unwrap(), summed);
            // hockey-stick identity
            prop_assert_eq!(summed, binomial(max_degree as usize + nvars, nvars));

            let degrees: Vec<u32> = basis.iter().map(|t| t.iter().sum()).collect();
            prop_assert!(degrees.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}

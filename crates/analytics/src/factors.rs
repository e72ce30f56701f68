use crate::error::AnalyticsError;
use nalgebra::{DMatrix, SymmetricEigen};

/// Raw output of an eigen-solver: one eigenvector per eigenvalue, in any order.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenPairs {
    pub eigenvalues: Vec<f64>,
    pub eigenvectors: Vec<Vec<f64>>,
}

/// A dense symmetric eigen-solver.
///
/// This is the only seam between the factor analyzer and a linear-algebra
/// backend. Any error returned here is absorbed by the analyzer's fallback.
pub trait EigenSolver: Send + Sync {
    fn decompose(&self, matrix: &DMatrix<f64>) -> Result<EigenPairs, AnalyticsError>;
}

/// `EigenSolver` backed by nalgebra's symmetric QR iteration.
#[derive(Debug, Clone, Copy)]
pub struct NalgebraEigenSolver {
    pub epsilon: f64,
    pub max_iterations: usize,
}

impl Default for NalgebraEigenSolver {
    fn default() -> Self {
        Self {
            epsilon: f64::EPSILON,
            max_iterations: 10_000,
        }
    }
}

impl EigenSolver for NalgebraEigenSolver {
    fn decompose(&self, matrix: &DMatrix<f64>) -> Result<EigenPairs, AnalyticsError> {
        if !matrix.is_square() {
            return Err(AnalyticsError::NotSquare {
                rows: matrix.nrows(),
                cols: matrix.ncols(),
            });
        }
        let eigen = SymmetricEigen::try_new(matrix.clone(), self.epsilon, self.max_iterations)
            .ok_or_else(|| {
                AnalyticsError::Decomposition(format!(
                    "no convergence within {} iterations",
                    self.max_iterations
                ))
            })?;

        Ok(EigenPairs {
            eigenvalues: eigen.eigenvalues.iter().copied().collect(),
            eigenvectors: eigen
                .eigenvectors
                .column_iter()
                .map(|column| column.iter().copied().collect())
                .collect(),
        })
    }
}

/// The factor structure of a correlation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorAnalysis {
    /// Sorted descending.
    pub eigenvalues: Vec<f64>,
    /// `eigenvectors[k]` holds the per-strategy loadings on factor `k`.
    pub eigenvectors: Vec<Vec<f64>>,
    /// Cumulative share of total variance explained by the first k+1 factors.
    pub explained_variance: Vec<f64>,
    pub effective_factors: usize,
}

impl FactorAnalysis {
    /// N independent unit factors. Used for degenerate inputs and solver failures.
    pub fn identity(n: usize) -> Self {
        Self {
            eigenvalues: vec![1.0; n],
            eigenvectors: (0..n)
                .map(|k| (0..n).map(|i| if i == k { 1.0 } else { 0.0 }).collect())
                .collect(),
            explained_variance: (1..=n).map(|k| k as f64 / n as f64).collect(),
            effective_factors: n,
        }
    }

    /// Loadings on the dominant factor, if there is one.
    pub fn dominant_loadings(&self) -> Option<&[f64]> {
        self.eigenvectors.first().map(Vec::as_slice)
    }
}

/// Eigen-decomposes `correlation` and counts the factors needed to explain
/// `variance_threshold` of its total variance.
///
/// Never fails: a solver error or degenerate decomposition is logged and
/// replaced by [`FactorAnalysis::identity`].
pub fn analyze_factors<S>(correlation: &[Vec<f64>], variance_threshold: f64, solver: &S) -> FactorAnalysis
where
    S: EigenSolver + ?Sized,
{
    let n = correlation.len();
    if n == 0 {
        return FactorAnalysis::identity(0);
    }

    let decomposition = to_matrix(correlation).and_then(|matrix| {
        let trace = matrix.trace();
        solver
            .decompose(&matrix)
            .and_then(|pairs| check_decomposition(pairs, n, trace))
    });

    match decomposition {
        Ok(pairs) => build_analysis(pairs, variance_threshold),
        Err(error) => {
            tracing::warn!(
                %error,
                strategies = n,
                "Eigen-decomposition unusable; falling back to identity factor structure."
            );
            FactorAnalysis::identity(n)
        }
    }
}

fn to_matrix(rows: &[Vec<f64>]) -> Result<DMatrix<f64>, AnalyticsError> {
    let n = rows.len();
    if let Some(row) = rows.iter().find(|row| row.len() != n) {
        return Err(AnalyticsError::NotSquare { rows: n, cols: row.len() });
    }
    Ok(DMatrix::from_fn(n, n, |r, c| rows[r][c]))
}

fn check_decomposition(pairs: EigenPairs, n: usize, trace: f64) -> Result<EigenPairs, AnalyticsError> {
    if pairs.eigenvalues.len() != n
        || pairs.eigenvectors.len() != n
        || pairs.eigenvectors.iter().any(|v| v.len() != n)
    {
        return Err(AnalyticsError::Degenerate(format!(
            "expected {n} eigenpairs of length {n}"
        )));
    }
    if pairs
        .eigenvalues
        .iter()
        .chain(pairs.eigenvectors.iter().flatten())
        .any(|v| !v.is_finite())
    {
        return Err(AnalyticsError::Degenerate("non-finite values".to_string()));
    }
    let sum: f64 = pairs.eigenvalues.iter().sum();
    if (sum - trace).abs() > 1e-6 * n as f64 {
        return Err(AnalyticsError::Degenerate(format!(
            "eigenvalues sum to {sum}, trace is {trace}"
        )));
    }
    Ok(pairs)
}

fn build_analysis(pairs: EigenPairs, variance_threshold: f64) -> FactorAnalysis {
    let n = pairs.eigenvalues.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| pairs.eigenvalues[b].total_cmp(&pairs.eigenvalues[a]));

    let eigenvalues: Vec<f64> = order.iter().map(|&k| pairs.eigenvalues[k]).collect();
    let eigenvectors: Vec<Vec<f64>> = order
        .iter()
        .map(|&k| orient(pairs.eigenvectors[k].clone()))
        .collect();

    // Rounding can leave tiny negative eigenvalues; floor them so the curve never dips.
    let total: f64 = eigenvalues.iter().map(|v| v.max(0.0)).sum();
    let explained_variance: Vec<f64> = if total > 0.0 {
        eigenvalues
            .iter()
            .scan(0.0, |running, v| {
                *running += v.max(0.0);
                Some(*running / total)
            })
            .collect()
    } else {
        (1..=n).map(|k| k as f64 / n as f64).collect()
    };

    let effective_factors = explained_variance
        .iter()
        .position(|&cumulative| cumulative >= variance_threshold - 1e-12)
        .map_or(n, |k| k + 1);

    FactorAnalysis {
        eigenvalues,
        eigenvectors,
        explained_variance,
        effective_factors,
    }
}

/// Fixes the arbitrary sign of an eigenvector so repeated runs agree.
fn orient(mut vector: Vec<f64>) -> Vec<f64> {
    const TOLERANCE: f64 = 1e-12;
    let sum: f64 = vector.iter().sum();
    let negative = if sum.abs() > TOLERANCE {
        sum < 0.0
    } else {
        vector
            .iter()
            .find(|v| v.abs() > TOLERANCE)
            .is_some_and(|v| *v < 0.0)
    };
    if negative {
        vector.iter_mut().for_each(|v| *v = -*v);
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    struct FailingSolver;

    impl EigenSolver for FailingSolver {
        fn decompose(&self, _matrix: &DMatrix<f64>) -> Result<EigenPairs, AnalyticsError> {
            Err(AnalyticsError::Decomposition("backend unavailable".to_string()))
        }
    }

    struct NanSolver;

    impl EigenSolver for NanSolver {
        fn decompose(&self, matrix: &DMatrix<f64>) -> Result<EigenPairs, AnalyticsError> {
            let n = matrix.nrows();
            Ok(EigenPairs {
                eigenvalues: vec![f64::NAN; n],
                eigenvectors: vec![vec![0.0; n]; n],
            })
        }
    }

    fn three_strategy_matrix() -> Vec<Vec<f64>> {
        vec![
            vec![1.0, 0.8, 0.1],
            vec![0.8, 1.0, 0.2],
            vec![0.1, 0.2, 1.0],
        ]
    }

    #[test]
    fn two_by_two_has_closed_form_spectrum() {
        let correlation = vec![vec![1.0, 0.7], vec![0.7, 1.0]];
        let analysis = analyze_factors(&correlation, 0.8, &NalgebraEigenSolver::default());

        assert_relative_eq!(analysis.eigenvalues[0], 1.7, epsilon = 1e-10);
        assert_relative_eq!(analysis.eigenvalues[1], 0.3, epsilon = 1e-10);
        let half_sqrt2 = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(analysis.eigenvectors[0][0], half_sqrt2, epsilon = 1e-10);
        assert_relative_eq!(analysis.eigenvectors[0][1], half_sqrt2, epsilon = 1e-10);
        assert_relative_eq!(analysis.explained_variance[0], 0.85, epsilon = 1e-10);
        assert_eq!(analysis.effective_factors, 1);
    }

    #[test]
    fn eigenpairs_are_sorted_and_satisfy_the_trace_law() {
        let correlation = three_strategy_matrix();
        let analysis = analyze_factors(&correlation, 0.8, &NalgebraEigenSolver::default());

        assert!(analysis.eigenvalues.windows(2).all(|w| w[0] >= w[1]));
        assert_abs_diff_eq!(analysis.eigenvalues.iter().sum::<f64>(), 3.0, epsilon = 1e-9);

        let matrix = to_matrix(&correlation).unwrap();
        for (value, vector) in analysis.eigenvalues.iter().zip(&analysis.eigenvectors) {
            let v = nalgebra::DVector::from_column_slice(vector);
            let residual = &matrix * &v - &v * *value;
            assert!(residual.norm() < 1e-9);
        }
    }

    #[test]
    fn explained_variance_is_monotone_and_ends_at_one() {
        let analysis =
            analyze_factors(&three_strategy_matrix(), 0.8, &NalgebraEigenSolver::default());
        assert!(analysis.explained_variance.windows(2).all(|w| w[0] <= w[1]));
        assert_abs_diff_eq!(*analysis.explained_variance.last().unwrap(), 1.0, epsilon = 1e-9);
        assert_eq!(analysis.effective_factors, 2);
    }

    #[test]
    fn identity_correlation_needs_every_factor() {
        let identity = FactorAnalysis::identity(4);
        let analysis = analyze_factors(
            &identity.eigenvectors,
            0.99,
            &NalgebraEigenSolver::default(),
        );
        assert_eq!(analysis.effective_factors, 4);
    }

    #[test]
    fn dominant_vector_is_oriented_positively() {
        let correlation = vec![
            vec![1.0, 0.6, 0.5],
            vec![0.6, 1.0, 0.4],
            vec![0.5, 0.4, 1.0],
        ];
        let analysis = analyze_factors(&correlation, 0.8, &NalgebraEigenSolver::default());
        assert!(analysis.dominant_loadings().unwrap().iter().all(|&v| v > 0.0));
    }

    #[test]
    fn solver_failure_falls_back_to_identity() {
        let analysis = analyze_factors(&three_strategy_matrix(), 0.8, &FailingSolver);
        assert_eq!(analysis, FactorAnalysis::identity(3));
        assert_eq!(analysis.effective_factors, 3);
        assert_eq!(analysis.explained_variance, vec![1.0 / 3.0, 2.0 / 3.0, 1.0]);
    }

    #[test]
    fn degenerate_output_falls_back_to_identity() {
        let analysis = analyze_factors(&three_strategy_matrix(), 0.8, &NanSolver);
        assert_eq!(analysis, FactorAnalysis::identity(3));
    }

    #[test]
    fn ragged_input_falls_back_to_identity() {
        let ragged = vec![vec![1.0, 0.5], vec![0.5]];
        let analysis = analyze_factors(&ragged, 0.8, &NalgebraEigenSolver::default());
        assert_eq!(analysis, FactorAnalysis::identity(2));
    }

    #[test]
    fn empty_matrix_has_no_factors() {
        let analysis = analyze_factors(&[], 0.8, &NalgebraEigenSolver::default());
        assert_eq!(analysis.effective_factors, 0);
        assert!(analysis.eigenvalues.is_empty());
        assert_eq!(analysis.dominant_loadings(), None);
    }
}

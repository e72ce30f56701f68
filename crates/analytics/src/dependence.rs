use std::f64::consts::FRAC_PI_2;

/// Kendall's tau-b between two equally long samples.
///
/// Pairs tied in both coordinates are ignored; pairs tied in only one
/// coordinate enter the tie correction for that coordinate. Returns 0 when
/// the lengths differ, there are fewer than two observations, any value is
/// non-finite, or the tie-corrected denominator vanishes.
pub fn kendall_tau_b(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n != y.len() || n < 2 || x.iter().chain(y).any(|v| !v.is_finite()) {
        return 0.0;
    }

    let (mut concordant, mut discordant) = (0u64, 0u64);
    let (mut tied_x, mut tied_y) = (0u64, 0u64);
    for i in 0..n - 1 {
        for j in i + 1..n {
            let dx = x[i] - x[j];
            let dy = y[i] - y[j];
            match (dx == 0.0, dy == 0.0) {
                (true, true) => {}
                (true, false) => tied_x += 1,
                (false, true) => tied_y += 1,
                (false, false) if (dx > 0.0) == (dy > 0.0) => concordant += 1,
                (false, false) => discordant += 1,
            }
        }
    }

    let untied = (concordant + discordant) as f64;
    let denominator = ((untied + tied_x as f64) * (untied + tied_y as f64)).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    (concordant as f64 - discordant as f64) / denominator
}

/// Maps Kendall's tau to the equivalent Pearson correlation of an elliptical copula.
///
/// The `sin(pi * tau / 2)` relation is used instead of an empirical Pearson
/// correlation on the scores because it keeps the matrix positive semi-definite.
pub fn tau_to_correlation(tau: f64) -> f64 {
    (FRAC_PI_2 * tau).sin().clamp(-1.0, 1.0)
}

/// Builds the symmetric, unit-diagonal copula correlation matrix of `series`.
pub fn copula_correlation_matrix(series: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = series.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in i + 1..n {
            let rho = tau_to_correlation(kendall_tau_b(&series[i], &series[j]));
            matrix[i][j] = rho;
            matrix[j][i] = rho;
        }
    }
    matrix
}

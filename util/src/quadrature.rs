//! Gauss-Legendre quadrature rules for 1D reference cells.
use std::f64::consts::PI;

/// Evaluate the Legendre polynomial `P_n` and its derivative at `x` using the standard
/// three-term recurrence. The derivative formula is undefined at |x| == 1, so this is only
/// suitable for evaluation in the open interval (-1, 1).
fn legendre_value_and_derivative(n: usize, x: f64) -> (f64, f64) {
    // m P_m(x) = (2m - 1) x P_{m-1}(x) - (m - 1) P_{m-2}(x)
    let mut p1 = 1.0;
    let mut p2 = 0.0;
    for m in 1..=n {
        let m = m as f64;
        let p3 = p2;
        p2 = p1;
        p1 = ((2.0 * m - 1.0) * x * p2 - (m - 1.0) * p3) / m;
    }
    let n = n as f64;
    let dp = n * (x * p1 - p2) / (x * x - 1.0);
    (p1, dp)
}

/// Gauss quadrature for the reference interval [-1, 1].
///
/// Given `n` points, the rule integrates polynomials of order up to `2n - 1` exactly. Roots of
/// `P_n` are located by Newton iteration from a cosine initial guess; the second half of the
/// rule follows from symmetry.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss(num_points: usize) -> (Vec<f64>, Vec<f64>) {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    let m = (n + 1) / 2;
    let mut weights = Vec::with_capacity(n);
    let mut points = Vec::with_capacity(n);

    for i in 0..m {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let (mut p, mut dp) = legendre_value_and_derivative(n, x);
        loop {
            let dx = -p / dp;
            x += dx;
            let (p_new, dp_new) = legendre_value_and_derivative(n, x);
            p = p_new;
            dp = dp_new;
            if dx.abs() <= 1e-15 {
                break;
            }
        }
        weights.push(2.0 / ((1.0 - x * x) * dp * dp));
        points.push(x);
    }

    for i in m..n {
        let mirror = n - i - 1;
        weights.push(weights[mirror]);
        points.push(-points[mirror]);
    }

    (weights, points)
}

/// Gauss quadrature transformed to the reference cell [0, 1].
pub fn gauss_01(num_points: usize) -> (Vec<f64>, Vec<f64>) {
    let (weights, points) = gauss(num_points);
    let weights = weights.into_iter().map(|w| 0.5 * w).collect();
    let points = points.into_iter().map(|x| 0.5 * (x + 1.0)).collect();
    (weights, points)
}

//! Interpolation over uniformly sampled tables on `[0, 1]` and over
//! arbitrary knots.

/// Position of `x` in a uniform table of `len` entries: segment index and
/// the fraction inside it. `x` must be within `[0, 1]`.
fn locate(len: usize, x: f64) -> (usize, f64) {
    let scaled = x.clamp(0.0, 1.0) * (len - 1) as f64;
    let index = (scaled.floor() as usize).min(len - 2);
    (index, scaled - index as f64)
}

pub fn uniform_linear(table: &[f64], x: f64) -> f64 {
    let (i, t) = locate(table.len(), x);
    table[i] + (table[i + 1] - table[i]) * t
}

/// Fritsch-Carlson slopes of a uniformly sampled table, in output units per
/// unit of input. The resulting Hermite curve is monotone wherever the table
/// is.
pub fn pchip_slopes(table: &[f64]) -> Vec<f64> {
    let n = table.len();
    let h = 1.0 / (n - 1) as f64;
    let secants: Vec<f64> = table.windows(2).map(|w| (w[1] - w[0]) / h).collect();

    if n == 2 {
        return vec![secants[0]; 2];
    }

    let mut slopes = vec![0.0; n];
    for k in 1..n - 1 {
        let (a, b) = (secants[k - 1], secants[k]);
        if a * b > 0.0 {
            slopes[k] = 2.0 / (1.0 / a + 1.0 / b);
        }
    }
    slopes[0] = end_slope(secants[0], secants[1]);
    slopes[n - 1] = end_slope(secants[n - 2], secants[n - 3]);
    slopes
}

fn end_slope(edge: f64, next: f64) -> f64 {
    let slope = (3.0 * edge - next) / 2.0;
    if slope.signum() != edge.signum() || edge == 0.0 {
        0.0
    } else if edge.signum() != next.signum() && slope.abs() > 3.0 * edge.abs() {
        3.0 * edge
    } else {
        slope
    }
}

pub fn uniform_pchip(table: &[f64], slopes: &[f64], x: f64) -> f64 {
    let n = table.len();
    let h = 1.0 / (n - 1) as f64;
    let (i, t) = locate(n, x);
    let t2 = t * t;
    let t3 = t2 * t;
    (2.0 * t3 - 3.0 * t2 + 1.0) * table[i]
        + (t3 - 2.0 * t2 + t) * h * slopes[i]
        + (-2.0 * t3 + 3.0 * t2) * table[i + 1]
        + (t3 - t2) * h * slopes[i + 1]
}

/// Piecewise-linear interpolation through strictly increasing `xs`, holding
/// the end values outside them.
pub fn knot_linear(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let last = xs.len() - 1;
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }
    let upper = xs.partition_point(|&k| k <= x).min(last);
    let lower = upper - 1;
    let t = (x - xs[lower]) / (xs[upper] - xs[lower]);
    ys[lower] + (ys[upper] - ys[lower]) * t
}

/// Least-squares slope of the points, 0 when the xs do not vary.
pub fn least_squares_slope(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        sxy += (x - mean_x) * (y - mean_y);
        sxx += (x - mean_x).powi(2);
    }
    if sxx > 0.0 { sxy / sxx } else { 0.0 }
}

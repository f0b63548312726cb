//! Curve smoothing and interpolation
//!
//! Locally-weighted regression (tricube-weighted linear fit) and natural
//! cubic spline interpolation. Both operate on frequency-domain curves in
//! f64, never on sample buffers.

/// Locally-weighted regression over uniformly spaced values
///
/// For each point, fits a weighted line through the `frac * len` nearest
/// neighbors (tricube distance weights) and outputs the fitted value.
/// Preserves broad trends while flattening bin-to-bin noise.
pub fn lowess(values: &[f64], frac: f64) -> Vec<f64> {
    let n = values.len();
    if n < 3 {
        return values.to_vec();
    }
    let k = ((frac * n as f64) as usize).max(2).min(n);

    let mut out = Vec::with_capacity(n);
    let mut lo = 0usize;
    for i in 0..n {
        // Slide the window right while the next point is closer than the leftmost
        while lo + k < n && 2 * i > 2 * lo + k {
            lo += 1;
        }
        let hi = lo + k;
        let dmax = (i - lo).max(hi - 1 - i) as f64;

        let mut sw = 0.0;
        let mut swx = 0.0;
        let mut swy = 0.0;
        let mut swxx = 0.0;
        let mut swxy = 0.0;
        for j in lo..hi {
            let xj = j as f64;
            let d = (xj - i as f64).abs() / dmax;
            let tri = 1.0 - (d * d * d).min(1.0);
            let w = tri * tri * tri;
            sw += w;
            swx += w * xj;
            swy += w * values[j];
            swxx += w * xj * xj;
            swxy += w * xj * values[j];
        }

        let xb = swx / sw;
        let yb = swy / sw;
        let var = swxx - sw * xb * xb;
        let cov = swxy - sw * xb * yb;
        let slope = if var > 1e-10 * sw * dmax * dmax {
            cov / var
        } else {
            0.0
        };
        out.push(yb + slope * (i as f64 - xb));
    }
    out
}

/// Natural cubic spline through `(xs, ys)`, evaluated at `queries`
///
/// `xs` must be strictly increasing. Queries outside the knot range
/// evaluate the boundary segment's polynomial.
pub fn cubic_interp(xs: &[f64], ys: &[f64], queries: &[f64]) -> Vec<f64> {
    let n = xs.len();
    if n < 2 {
        let fill = ys.first().copied().unwrap_or(0.0);
        return vec![fill; queries.len()];
    }

    // Second derivatives with natural boundary conditions, by tridiagonal
    // forward elimination and back substitution.
    let mut d2 = vec![0.0f64; n];
    let mut tmp = vec![0.0f64; n];
    for i in 1..n - 1 {
        let sig = (xs[i] - xs[i - 1]) / (xs[i + 1] - xs[i - 1]);
        let p = sig * d2[i - 1] + 2.0;
        d2[i] = (sig - 1.0) / p;
        let slope_hi = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i]);
        let slope_lo = (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
        tmp[i] = (6.0 * (slope_hi - slope_lo) / (xs[i + 1] - xs[i - 1]) - sig * tmp[i - 1]) / p;
    }
    for i in (0..n - 1).rev() {
        d2[i] = d2[i] * d2[i + 1] + tmp[i];
    }

    queries
        .iter()
        .map(|&q| {
            let seg = xs.partition_point(|&x| x <= q).saturating_sub(1).min(n - 2);
            let h = xs[seg + 1] - xs[seg];
            let a = (xs[seg + 1] - q) / h;
            let b = (q - xs[seg]) / h;
            a * ys[seg]
                + b * ys[seg + 1]
                + ((a * a * a - a) * d2[seg] + (b * b * b - b) * d2[seg + 1]) * h * h / 6.0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_lowess_preserves_straight_line() {
        let values: Vec<f64> = (0..200).map(|i| 3.0 + 0.5 * i as f64).collect();
        let smoothed = lowess(&values, 0.05);
        for (s, v) in smoothed.iter().zip(values.iter()) {
            assert_abs_diff_eq!(s, v, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_lowess_flattens_alternating_noise() {
        let values: Vec<f64> = (0..400)
            .map(|i| 1.0 + if i % 2 == 0 { 0.1 } else { -0.1 })
            .collect();
        let smoothed = lowess(&values, 0.05);
        for s in &smoothed {
            assert_abs_diff_eq!(*s, 1.0, epsilon = 0.02);
        }
    }

    #[test]
    fn test_lowess_short_input_passthrough() {
        let values = vec![1.0, 2.0];
        assert_eq!(lowess(&values, 0.5), values);
    }

    #[test]
    fn test_cubic_interp_exact_on_knots() {
        let xs = vec![0.0, 1.0, 2.5, 4.0, 7.0];
        let ys = vec![1.0, -2.0, 0.5, 3.0, -1.0];
        let out = cubic_interp(&xs, &ys, &xs);
        for (o, y) in out.iter().zip(ys.iter()) {
            assert_abs_diff_eq!(o, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_cubic_interp_reproduces_linear_data() {
        let xs: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x - 1.0).collect();
        let queries = vec![0.5, 3.7, 8.2];
        let out = cubic_interp(&xs, &ys, &queries);
        for (o, q) in out.iter().zip(queries.iter()) {
            assert_abs_diff_eq!(*o, 2.0 * q - 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_cubic_interp_close_on_smooth_curve() {
        let xs: Vec<f64> = (0..100).map(|i| i as f64 * 0.1).collect();
        let ys: Vec<f64> = xs.iter().map(|x| x.sin()).collect();
        let queries: Vec<f64> = (0..99).map(|i| i as f64 * 0.1 + 0.05).collect();
        let out = cubic_interp(&xs, &ys, &queries);
        for (o, q) in out.iter().zip(queries.iter()) {
            assert_abs_diff_eq!(*o, q.sin(), epsilon = 1e-4);
        }
    }
}

//! Axis builders, 1-D linear interpolation and polynomial smoothing.

/// How `interp1d` fills points outside the sample range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    /// Constant value on both sides.
    Value(f64),
    /// First sample value below the range, last above it.
    Edge,
}

/// `n` evenly spaced values from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = stop;
            out
        }
    }
}

/// `n` log-spaced values from `start` to `stop` inclusive (both > 0).
pub fn logspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    linspace(start.log10(), stop.log10(), n)
        .into_iter()
        .map(|e| 10f64.powf(e))
        .collect()
}

/// Linearly interpolate `(xs, ys)` at every point of `at`.
///
/// `xs` must be increasing. With a single sample every in-range query
/// returns that sample.
pub fn interp1d(xs: &[f64], ys: &[f64], at: &[f64], fill: Fill) -> Vec<f64> {
    debug_assert_eq!(xs.len(), ys.len());
    let n = xs.len().min(ys.len());
    if n == 0 {
        let v = match fill {
            Fill::Value(v) => v,
            Fill::Edge => 0.0,
        };
        return vec![v; at.len()];
    }
    let (below, above) = match fill {
        Fill::Value(v) => (v, v),
        Fill::Edge => (ys[0], ys[n - 1]),
    };
    at.iter()
        .map(|&x| {
            if x < xs[0] {
                return below;
            }
            if x > xs[n - 1] {
                return above;
            }
            // first index with xs[i] >= x
            let hi = xs[..n].partition_point(|&v| v < x);
            if hi == 0 {
                return ys[0];
            }
            if hi >= n {
                return ys[n - 1];
            }
            let lo = hi - 1;
            let span = xs[hi] - xs[lo];
            if span <= 0.0 {
                return ys[hi];
            }
            let t = (x - xs[lo]) / span;
            ys[lo] + t * (ys[hi] - ys[lo])
        })
        .collect()
}

/// Savitzky–Golay window used by the wavelet estimators: at most 21, at most
/// roughly 2/5 of the output length, always odd.
pub fn smoothing_window(len: usize) -> usize {
    21.min(len / 5 * 2 + 1)
}

/// Savitzky–Golay smoothing with polynomial `degree` over an odd `window`.
///
/// Edge points are evaluated on the polynomial fitted to the first/last full
/// window. Returns the input unchanged when the window is not usable.
pub fn savgol(y: &[f64], window: usize, degree: usize) -> Vec<f64> {
    let n = y.len();
    if window % 2 == 0 || window <= degree + 1 || window > n {
        return y.to_vec();
    }
    let half = window / 2;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let start = i.saturating_sub(half).min(n - window);
        let centre = start + half;
        let coeffs = polyfit_centred(&y[start..start + window], degree);
        let x = i as f64 - centre as f64;
        out.push(poly_eval(&coeffs, x));
    }
    out
}

/// Least-squares polynomial through `ys` sampled at `-h..=h`.
fn polyfit_centred(ys: &[f64], degree: usize) -> Vec<f64> {
    let half = (ys.len() / 2) as f64;
    let m = degree + 1;
    // Normal equations: (XᵀX) c = Xᵀy
    let mut ata = vec![vec![0.0; m]; m];
    let mut aty = vec![0.0; m];
    for (j, &yj) in ys.iter().enumerate() {
        let x = j as f64 - half;
        let mut powers = vec![1.0; 2 * m - 1];
        for p in 1..powers.len() {
            powers[p] = powers[p - 1] * x;
        }
        for r in 0..m {
            aty[r] += powers[r] * yj;
            for c in 0..m {
                ata[r][c] += powers[r + c];
            }
        }
    }
    solve(ata, aty)
}

/// Gaussian elimination with partial pivoting; singular systems yield zeros.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Vec<f64> {
    let m = b.len();
    for col in 0..m {
        let pivot = (col..m)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-300 {
            return vec![0.0; m];
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in (col + 1)..m {
            let factor = a[row][col] / a[col][col];
            for k in col..m {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0; m];
    for row in (0..m).rev() {
        let mut acc = b[row];
        for k in (row + 1)..m {
            acc -= a[row][k] * x[k];
        }
        x[row] = acc / a[row][row];
    }
    x
}

fn poly_eval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        let l = logspace(10.0, 1000.0, 3);
        assert!((l[1] - 100.0).abs() < 1e-9);
        assert!((l[2] - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn interpolation_and_fill_modes() {
        let xs = [0.0, 10.0, 20.0];
        let ys = [0.0, 10.0, 40.0];
        let at = [-5.0, 5.0, 15.0, 25.0];
        assert_eq!(
            interp1d(&xs, &ys, &at, Fill::Value(0.0)),
            vec![0.0, 5.0, 25.0, 0.0]
        );
        assert_eq!(
            interp1d(&xs, &ys, &at, Fill::Edge),
            vec![0.0, 5.0, 25.0, 40.0]
        );
        assert_eq!(interp1d(&xs, &ys, &[10.0], Fill::Edge), vec![10.0]);
    }

    #[test]
    fn savgol_preserves_quadratics() {
        let y: Vec<f64> = (0..40).map(|i| {
            let x = i as f64;
            0.5 * x * x - 3.0 * x + 2.0
        }).collect();
        let smoothed = savgol(&y, 7, 2);
        for (a, b) in y.iter().zip(&smoothed) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn savgol_reduces_alternating_noise() {
        let y: Vec<f64> = (0..50).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let smoothed = savgol(&y, 11, 2);
        let energy: f64 = smoothed[10..40].iter().map(|v| v * v).sum();
        assert!(energy < 30.0 * 0.1);
    }

    #[test]
    fn window_rules() {
        assert_eq!(smoothing_window(512), 21);
        assert_eq!(smoothing_window(20), 9);
        assert_eq!(savgol(&[1.0, 2.0], 5, 2), vec![1.0, 2.0]);
    }
}

// Smoothing - centered moving average for display
use super::series::ChartPoint;

/// Window size for a series of `len` points: denser series get wider windows
/// so the curve looks equally smooth at any sampling rate.
pub fn adaptive_window(len: usize) -> usize {
    match len {
        n if n > 3000 => 11,
        n if n > 1200 => 7,
        n if n > 300 => 5,
        _ => 3,
    }
}

/// Centered moving average over up to `window_size` neighbours.
///
/// An even window is widened by one. The window shrinks at both ends of the
/// series instead of wrapping. Runs in O(n) through prefix sums.
pub fn smooth(series: &[ChartPoint], window_size: usize) -> Vec<ChartPoint> {
    if window_size <= 1 || series.len() < 3 {
        return series.to_vec();
    }

    let window = if window_size % 2 == 0 { window_size + 1 } else { window_size };
    let half = window / 2;
    let n = series.len();

    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    let mut acc = 0.0;
    for p in series {
        acc += p.value;
        prefix.push(acc);
    }

    series
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n - 1);
            let mean = (prefix[hi + 1] - prefix[lo]) / (hi + 1 - lo) as f64;
            ChartPoint::new(p.ts, mean)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<ChartPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| ChartPoint::new(i as i64, *v))
            .collect()
    }

    #[test]
    fn test_adaptive_window_thresholds() {
        assert_eq!(adaptive_window(2), 3);
        assert_eq!(adaptive_window(301), 5);
        assert_eq!(adaptive_window(1201), 7);
        assert_eq!(adaptive_window(3001), 11);
    }

    #[test]
    fn test_noop_cases() {
        let s = series(&[1.0, 5.0, 2.0, 8.0]);
        assert_eq!(smooth(&s, 1), s);
        assert_eq!(smooth(&s, 0), s);

        let short = series(&[1.0, 9.0]);
        assert_eq!(smooth(&short, 5), short);
    }

    #[test]
    fn test_centered_mean_with_shrinking_edges() {
        let s = series(&[0.0, 3.0, 6.0, 9.0, 12.0]);
        let out = smooth(&s, 3);

        let values: Vec<f64> = out.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.5, 3.0, 6.0, 9.0, 10.5]);
        assert_eq!(out.len(), s.len());
        assert!(out.iter().zip(&s).all(|(a, b)| a.ts == b.ts));
    }

    #[test]
    fn test_even_window_is_widened() {
        let s = series(&[0.0, 0.0, 10.0, 0.0, 0.0]);
        assert_eq!(smooth(&s, 2), smooth(&s, 3));
    }
}

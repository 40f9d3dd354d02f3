//! Summary statistics over a vector of per-scenario portfolio NPVs.

/// Percentiles reported alongside mean/std-dev/CTE.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by `M`, not `M-1`); `0` when
/// fewer than two values are present.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Linear-interpolated percentile at `p` (0..100) over `sorted` values.
/// `sorted` must already be sorted ascending.
fn interpolated_percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = (p / 100.0) * (n - 1) as f64;
            let lower = pos.floor() as usize;
            let upper = pos.ceil() as usize;
            let frac = pos - lower as f64;
            sorted[lower] * (1.0 - frac) + sorted[upper] * frac
        }
    }
}

pub fn percentiles(sorted: &[f64]) -> Percentiles {
    Percentiles {
        p50: interpolated_percentile(sorted, 50.0),
        p75: interpolated_percentile(sorted, 75.0),
        p90: interpolated_percentile(sorted, 90.0),
        p95: interpolated_percentile(sorted, 95.0),
        p99: interpolated_percentile(sorted, 99.0),
    }
}

/// Conditional Tail Expectation at the 95% level: the mean of the lowest
/// 5% of sorted values, with a tail of at least one element.
pub fn cte_95(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let tail_size = ((sorted.len() as f64) * 0.05).ceil().max(1.0) as usize;
    mean(&sorted[..tail_size])
}

/// Computes mean, population std-dev, percentiles, and CTE95 over `values`.
/// `values` need not be pre-sorted.
pub fn summarize(values: &[f64]) -> (f64, f64, Percentiles, f64) {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    (
        mean(values),
        population_std_dev(values),
        percentiles(&sorted),
        cte_95(&sorted),
    )
}

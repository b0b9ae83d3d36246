//! Empirical CDF of deadline margins.

use super::stat;

/// Empirical distribution of a sample. Non-finite values are discarded.
#[derive(Debug, Clone, Default)]
pub struct EmpiricalCdf {
    sorted: Vec<f64>,
}

impl EmpiricalCdf {
    /// Builds the CDF from an arbitrary-order sample.
    pub fn new<I: IntoIterator<Item = f64>>(values: I) -> EmpiricalCdf {
        EmpiricalCdf {
            sorted: stat::canonical(values),
        }
    }

    /// Sample size.
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    /// Whether the sample is empty.
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// `(value, (rank + 1) / n)` for every sample point, ascending. The last
    /// point is exactly 1.0.
    pub fn points(&self) -> Vec<(f64, f64)> {
        let n = self.sorted.len() as f64;
        self.sorted
            .iter()
            .enumerate()
            .map(|(rank, &v)| (v, (rank + 1) as f64 / n))
            .collect()
    }

    /// Fraction of the sample that is `<= x`. `None` for an empty sample.
    pub fn eval(&self, x: f64) -> Option<f64> {
        if self.sorted.is_empty() {
            return None;
        }
        let at_or_below = self.sorted.partition_point(|&v| v <= x);
        Some(at_or_below as f64 / self.sorted.len() as f64)
    }

    /// Smallest sample value whose CDF reaches `q`.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        if self.sorted.is_empty() {
            return None;
        }
        let n = self.sorted.len();
        let rank = (q * n as f64).ceil() as usize;
        Some(self.sorted[rank.max(1).min(n) - 1])
    }

    /// Fraction of margins at or below zero, i.e. missed deadlines.
    pub fn violation_rate(&self) -> Option<f64> {
        self.eval(0.0)
    }

    /// Smallest value.
    pub fn min(&self) -> Option<f64> {
        self.sorted.first().cloned()
    }

    /// Largest value.
    pub fn max(&self) -> Option<f64> {
        self.sorted.last().cloned()
    }
}

/// Tail summary of one policy's pooled margins.
#[derive(Debug, Clone, PartialEq)]
pub struct TailSummary {
    /// Policy label.
    pub policy: String,
    /// Pooled number of margins.
    pub samples: usize,
    /// CDF at 0.
    pub violation_rate: f64,
    /// Worst margin.
    pub min: f64,
    /// 5th percentile margin.
    pub p05: f64,
    /// Median margin.
    pub p50: f64,
    /// 95th percentile margin.
    pub p95: f64,
}

impl TailSummary {
    /// Summarizes a CDF; `None` when it has no sample.
    pub fn of(policy: &str, cdf: &EmpiricalCdf) -> Option<TailSummary> {
        Some(TailSummary {
            policy: policy.to_string(),
            samples: cdf.len(),
            violation_rate: cdf.violation_rate()?,
            min: cdf.min()?,
            p05: cdf.quantile(0.05)?,
            p50: cdf.quantile(0.50)?,
            p95: cdf.quantile(0.95)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_are_monotone_and_end_at_one() {
        let cdf = EmpiricalCdf::new(vec![0.3, -0.1, 0.2, 0.2, 0.05, -0.4]);
        let points = cdf.points();
        assert_eq!(points.len(), 6);
        for w in points.windows(2) {
            assert!(w[0].0 <= w[1].0);
            assert!(w[0].1 <= w[1].1);
        }
        assert_eq!(points.last().unwrap(), &(0.3, 1.0));
    }

    #[test]
    fn test_eval_boundaries() {
        let cdf = EmpiricalCdf::new(vec![0.3, -0.1, 0.2, 0.2]);
        assert_eq!(cdf.eval(-0.11), Some(0.0));
        assert_eq!(cdf.eval(-0.1), Some(0.25));
        assert_eq!(cdf.eval(0.2), Some(0.75));
        assert_eq!(cdf.eval(0.3), Some(1.0));
        assert_eq!(cdf.eval(10.0), Some(1.0));

        let mut last = 0.0;
        for i in -10..10 {
            let v = cdf.eval(i as f64 * 0.05).unwrap();
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn test_violation_rate() {
        let cdf = EmpiricalCdf::new(vec![-0.2, 0.0, 0.1, 0.4]);
        assert_eq!(cdf.violation_rate(), Some(0.5));
        assert_eq!(EmpiricalCdf::new(Vec::new()).violation_rate(), None);
    }

    #[test]
    fn test_quantile_and_tail_summary() {
        let cdf = EmpiricalCdf::new((1..=20).map(|i| i as f64));
        assert_eq!(cdf.quantile(0.05), Some(1.0));
        assert_eq!(cdf.quantile(0.5), Some(10.0));
        assert_eq!(cdf.quantile(0.95), Some(19.0));
        assert_eq!(cdf.quantile(1.0), Some(20.0));

        let tail = TailSummary::of("Local", &cdf).unwrap();
        assert_eq!(tail.samples, 20);
        assert_eq!(tail.violation_rate, 0.0);
        assert_eq!(tail.min, 1.0);
        assert!(TailSummary::of("Local", &EmpiricalCdf::default()).is_none());
    }

    #[test]
    fn test_non_finite_values_are_discarded() {
        let cdf = EmpiricalCdf::new(vec![::std::f64::NAN, 1.0, ::std::f64::INFINITY]);
        assert_eq!(cdf.len(), 1);
        assert_eq!(cdf.eval(1.0), Some(1.0));
    }
}

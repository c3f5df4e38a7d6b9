//! Histogram of recorded samples with PDF / CDF and percentile queries

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by histogram queries
#[derive(Debug, Error, PartialEq)]
pub enum HistogramError {
    /// A bucket-based accessor was called before `sort`
    #[error("histogram '{0}' is not initialized: call sort() first")]
    NotInitialized(String),
    /// Sorting requires at least one sample
    #[error("histogram '{0}' has no sample")]
    NoSample(String),
    /// Bucket count must be > 0 and bounds must be finite with min < max
    #[error("invalid bucket layout: {0}")]
    InvalidLayout(String),
    /// Probability argument outside [0, 1]
    #[error("probability {0} is outside [0, 1]")]
    InvalidProbability(f64),
}

/// Equal-width partition computed by `sort`
#[derive(Debug, Clone, PartialEq)]
struct Buckets {
    x_min: f64,
    x_max: f64,
    width: f64,
    counts: Vec<usize>,
    cumulated_counts: Vec<usize>,
    /// Number of samples falling in the buckets
    total: usize,
    pdf: Vec<f64>,
    cdf: Vec<f64>,
}

/// Recorded samples of a scalar quantity
///
/// Samples are appended unsorted. `sort` partitions them into equal-width
/// buckets; every accessor depending on that partition fails with
/// [`HistogramError::NotInitialized`] until then, and recording a new sample
/// invalidates it again.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Histogram {
    name: String,
    samples: Vec<f64>,
    #[serde(skip)]
    buckets: Option<Buckets>,
}

impl Histogram {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            samples: Vec::new(),
            buckets: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append one sample
    pub fn record(&mut self, x: f64) {
        self.samples.push(x);
        self.buckets = None;
    }

    /// Append several samples
    pub fn record_all(&mut self, xs: impl IntoIterator<Item = f64>) {
        self.samples.extend(xs);
        self.buckets = None;
    }

    /// Drop every sample and the bucket partition
    pub fn reset(&mut self) {
        self.samples.clear();
        self.buckets = None;
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn min(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::max)
    }

    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
        }
    }

    /// Partition the observed `[min, max]` range into `bucket_count` buckets
    pub fn sort(&mut self, bucket_count: usize) -> Result<(), HistogramError> {
        let (Some(mut x_min), Some(mut x_max)) = (self.min(), self.max()) else {
            return Err(HistogramError::NoSample(self.name.clone()));
        };
        // Degenerate sample set: give the single value a unit-wide range
        if x_max - x_min <= f64::EPSILON * x_min.abs().max(1.0) {
            x_min -= 0.5;
            x_max += 0.5;
        }
        self.sort_within(bucket_count, x_min, x_max, true)
    }

    /// Partition `[x_min, x_max]` into `bucket_count` buckets
    ///
    /// With `open_ends`, samples below `x_min` (above `x_max`) are counted in
    /// the first (last) bucket; otherwise they are left out of the counts.
    pub fn sort_within(
        &mut self,
        bucket_count: usize,
        x_min: f64,
        x_max: f64,
        open_ends: bool,
    ) -> Result<(), HistogramError> {
        if bucket_count == 0 {
            return Err(HistogramError::InvalidLayout("bucket count is 0".into()));
        }
        if !x_min.is_finite() || !x_max.is_finite() || x_min >= x_max {
            return Err(HistogramError::InvalidLayout(format!(
                "bounds [{}, {}]",
                x_min, x_max
            )));
        }
        if self.samples.is_empty() {
            return Err(HistogramError::NoSample(self.name.clone()));
        }

        let width = (x_max - x_min) / bucket_count as f64;
        let mut counts = vec![0usize; bucket_count];
        for &x in &self.samples {
            if !open_ends && (x < x_min || x > x_max) {
                continue;
            }
            let idx = ((x - x_min) / width).floor();
            let idx = if idx < 0.0 {
                0
            } else {
                (idx as usize).min(bucket_count - 1)
            };
            counts[idx] += 1;
        }

        let total: usize = counts.iter().sum();
        if total == 0 {
            return Err(HistogramError::NoSample(self.name.clone()));
        }

        let mut cumulated_counts = Vec::with_capacity(bucket_count);
        let mut running = 0usize;
        for &c in &counts {
            running += c;
            cumulated_counts.push(running);
        }
        let pdf = counts
            .iter()
            .map(|&c| c as f64 / (total as f64 * width))
            .collect();
        let cdf = cumulated_counts
            .iter()
            .map(|&c| c as f64 / total as f64)
            .collect();

        self.buckets = Some(Buckets {
            x_min,
            x_max,
            width,
            counts,
            cumulated_counts,
            total,
            pdf,
            cdf,
        });
        Ok(())
    }

    fn buckets(&self) -> Result<&Buckets, HistogramError> {
        self.buckets
            .as_ref()
            .ok_or_else(|| HistogramError::NotInitialized(self.name.clone()))
    }

    pub fn bucket_width(&self) -> Result<f64, HistogramError> {
        Ok(self.buckets()?.width)
    }

    pub fn range(&self) -> Result<(f64, f64), HistogramError> {
        let b = self.buckets()?;
        Ok((b.x_min, b.x_max))
    }

    /// Center of each bucket
    pub fn x_values(&self) -> Result<Vec<f64>, HistogramError> {
        let b = self.buckets()?;
        Ok((0..b.counts.len())
            .map(|i| b.x_min + (i as f64 + 0.5) * b.width)
            .collect())
    }

    pub fn counts(&self) -> Result<&[usize], HistogramError> {
        Ok(&self.buckets()?.counts)
    }

    pub fn cumulated_counts(&self) -> Result<&[usize], HistogramError> {
        Ok(&self.buckets()?.cumulated_counts)
    }

    /// Probability density per bucket (Σ pdf·width = 1)
    pub fn pdf(&self) -> Result<&[f64], HistogramError> {
        Ok(&self.buckets()?.pdf)
    }

    /// Cumulative distribution at each bucket's upper edge
    pub fn cdf(&self) -> Result<&[f64], HistogramError> {
        Ok(&self.buckets()?.cdf)
    }

    /// Fraction of samples greater than or equal to `x`
    ///
    /// Linear interpolation inside the bucket containing `x`.
    pub fn probability(&self, x: f64) -> Result<f64, HistogramError> {
        let b = self.buckets()?;
        if x <= b.x_min {
            return Ok(1.0);
        }
        if x >= b.x_max {
            return Ok(0.0);
        }
        let idx = (((x - b.x_min) / b.width).floor() as usize).min(b.counts.len() - 1);
        let lower_edge = b.x_min + idx as f64 * b.width;
        let cdf_before = if idx == 0 { 0.0 } else { b.cdf[idx - 1] };
        let inside = b.counts[idx] as f64 / b.total as f64 * (x - lower_edge) / b.width;
        Ok((1.0 - (cdf_before + inside)).clamp(0.0, 1.0))
    }

    /// Value `x` such that a fraction `p` of the samples is ≥ `x`
    pub fn percentile(&self, p: f64) -> Result<f64, HistogramError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(HistogramError::InvalidProbability(p));
        }
        let b = self.buckets()?;
        let target = 1.0 - p;
        if target <= 0.0 {
            return Ok(b.x_min);
        }
        let idx = b
            .cdf
            .iter()
            .position(|&c| c >= target - 1e-12)
            .unwrap_or(b.cdf.len() - 1);
        let cdf_before = if idx == 0 { 0.0 } else { b.cdf[idx - 1] };
        let in_bucket = b.cdf[idx] - cdf_before;
        let fraction = if in_bucket > 0.0 {
            ((target - cdf_before) / in_bucket).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Ok(b.x_min + (idx as f64 + fraction) * b.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn uniform_samples(n: usize, lo: f64, hi: f64) -> Vec<f64> {
        (0..n)
            .map(|i| lo + (hi - lo) * (i as f64 + 0.5) / n as f64)
            .collect()
    }

    #[test]
    fn test_accessors_fail_before_sort() {
        let mut h = Histogram::new("h");
        h.record_all([1.0, 2.0, 3.0]);
        assert_eq!(h.pdf().unwrap_err(), HistogramError::NotInitialized("h".into()));
        assert!(h.cdf().is_err());
        assert!(h.probability(2.0).is_err());
        assert!(h.percentile(0.5).is_err());

        h.sort(10).unwrap();
        assert!(h.pdf().is_ok());

        // New sample invalidates the partition
        h.record(4.0);
        assert!(h.cdf().is_err());
    }

    #[test]
    fn test_pdf_and_cdf_are_normalized() {
        let mut h = Histogram::new("normalized");
        h.record_all([0.3, 7.2, 1.1, 1.5, 9.9, 4.4, 4.5, 4.6, 2.0, 8.0, 5.5]);
        h.sort(7).unwrap();

        let width = h.bucket_width().unwrap();
        let area: f64 = h.pdf().unwrap().iter().map(|p| p * width).sum();
        assert_abs_diff_eq!(area, 1.0, epsilon = 1e-9);

        let cdf = h.cdf().unwrap();
        assert!(cdf.windows(2).all(|w| w[0] <= w[1]));
        assert_abs_diff_eq!(*cdf.last().unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(*h.cumulated_counts().unwrap().last().unwrap(), 11);
    }

    #[test]
    fn test_probability_of_bounds() {
        let mut h = Histogram::new("bounds");
        h.record_all(uniform_samples(100, 0.0, 10.0));
        h.sort(10).unwrap();
        assert_abs_diff_eq!(h.probability(-1.0).unwrap(), 1.0);
        assert_abs_diff_eq!(h.probability(100.0).unwrap(), 0.0);
        assert_abs_diff_eq!(h.probability(5.0).unwrap(), 0.5, epsilon = 0.02);
    }

    #[test]
    fn test_percentile_inverts_probability() {
        let mut h = Histogram::new("round-trip");
        h.record_all(uniform_samples(1_000, -20.0, 80.0));
        h.sort(25).unwrap();
        let width = h.bucket_width().unwrap();

        for x in [-15.0, -3.3, 0.0, 12.5, 41.0, 77.0] {
            let p = h.probability(x).unwrap();
            let back = h.percentile(p).unwrap();
            assert!((back - x).abs() <= width, "x={} p={} back={}", x, p, back);
        }
    }

    #[test]
    fn test_percentile_rejects_bad_probability() {
        let mut h = Histogram::new("p");
        h.record_all([1.0, 2.0]);
        h.sort(2).unwrap();
        assert_eq!(
            h.percentile(1.5).unwrap_err(),
            HistogramError::InvalidProbability(1.5)
        );
    }

    #[test]
    fn test_closed_ends_exclude_outliers() {
        let mut h = Histogram::new("closed");
        h.record_all([-100.0, 1.0, 2.0, 3.0, 100.0]);
        h.sort_within(3, 0.0, 4.0, false).unwrap();
        assert_eq!(h.cumulated_counts().unwrap().last(), Some(&3));

        h.sort_within(3, 0.0, 4.0, true).unwrap();
        assert_eq!(h.counts().unwrap(), &[2, 1, 2]);
    }

    #[test]
    fn test_single_value_histogram() {
        let mut h = Histogram::new("single");
        h.record_all([5.0, 5.0, 5.0]);
        h.sort(4).unwrap();
        let cdf = h.cdf().unwrap();
        assert_abs_diff_eq!(*cdf.last().unwrap(), 1.0);
        assert_eq!(h.average(), Some(5.0));
    }

    #[test]
    fn test_sort_without_sample_fails() {
        let mut h = Histogram::new("empty");
        assert_eq!(h.sort(10).unwrap_err(), HistogramError::NoSample("empty".into()));
    }
}

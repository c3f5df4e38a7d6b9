//! Named random variable with a sampling law, a default value and a history

use super::{Histogram, SimulationMode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of steps of the numerically integrated Beta quantile table
const BETA_TABLE_STEPS: usize = 1_000;

/// Tolerance on the sum of a discrete PDF
const PDF_SUM_TOLERANCE: f64 = 1e-6;

/// Errors raised when a sampling law is invalid
#[derive(Debug, Error, PartialEq)]
pub enum RandomError {
    #[error("uniform law of '{name}' has invalid bounds [{min}, {max}]")]
    InvalidUniform { name: String, min: f64, max: f64 },
    #[error("discrete law of '{name}' is invalid: {reason}")]
    InvalidPdf { name: String, reason: String },
    #[error("beta law of '{name}' is invalid: {reason}")]
    InvalidBeta { name: String, reason: String },
}

/// One support point of a discrete law
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscretePoint {
    /// Value taken
    pub x: f64,
    /// Probability of that value
    pub p: f64,
}

/// Sampling law of a random variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "law", rename_all = "camelCase")]
pub enum Law {
    /// Uniform over [min, max]
    Uniform { min: f64, max: f64 },
    /// Finite support with explicit probabilities
    Discrete { pdf: Vec<DiscretePoint> },
    /// Beta(alpha, beta) rescaled from [0, 1] to [min, max]
    Beta {
        alpha: f64,
        beta: f64,
        min: f64,
        max: f64,
    },
}

impl Law {
    /// Check the law's invariants
    pub fn validate(&self, name: &str) -> Result<(), RandomError> {
        match self {
            Law::Uniform { min, max } => {
                if !min.is_finite() || !max.is_finite() || min > max {
                    return Err(RandomError::InvalidUniform {
                        name: name.to_string(),
                        min: *min,
                        max: *max,
                    });
                }
            }
            Law::Discrete { pdf } => {
                let invalid = |reason: &str| RandomError::InvalidPdf {
                    name: name.to_string(),
                    reason: reason.to_string(),
                };
                if pdf.is_empty() {
                    return Err(invalid("empty support"));
                }
                if pdf.iter().any(|pt| !pt.x.is_finite()) {
                    return Err(invalid("non finite support point"));
                }
                if pdf.iter().any(|pt| !(0.0..=1.0).contains(&pt.p)) {
                    return Err(invalid("probability outside [0, 1]"));
                }
                let sum: f64 = pdf.iter().map(|pt| pt.p).sum();
                if (sum - 1.0).abs() > PDF_SUM_TOLERANCE {
                    return Err(invalid(&format!("probabilities sum to {}", sum)));
                }
            }
            Law::Beta {
                alpha,
                beta,
                min,
                max,
            } => {
                let invalid = |reason: String| RandomError::InvalidBeta {
                    name: name.to_string(),
                    reason,
                };
                if !(alpha.is_finite() && *alpha > 0.0 && beta.is_finite() && *beta > 0.0) {
                    return Err(invalid(format!("shape ({}, {}) must be > 0", alpha, beta)));
                }
                if !min.is_finite() || !max.is_finite() || min >= max {
                    return Err(invalid(format!("bounds [{}, {}]", min, max)));
                }
            }
        }
        Ok(())
    }
}

/// Precomputed sampling tables derived from a validated [`Law`]
#[derive(Debug, Clone)]
enum Sampler {
    Uniform { min: f64, max: f64 },
    /// Sorted support and its cumulative probabilities
    Discrete { support: Vec<f64>, cdf: Vec<f64> },
    /// CDF of Beta(alpha, beta) at `k / BETA_TABLE_STEPS`, k = 0..=steps
    Beta { cdf: Vec<f64>, min: f64, max: f64 },
}

impl Sampler {
    fn from_law(law: &Law) -> Self {
        match law {
            Law::Uniform { min, max } => Sampler::Uniform {
                min: *min,
                max: *max,
            },
            Law::Discrete { pdf } => {
                let mut points = pdf.clone();
                points.sort_by(|a, b| a.x.total_cmp(&b.x));
                let mut running = 0.0;
                let mut cdf: Vec<f64> = points
                    .iter()
                    .map(|pt| {
                        running += pt.p;
                        running
                    })
                    .collect();
                if let Some(last) = cdf.last_mut() {
                    *last = 1.0;
                }
                Sampler::Discrete {
                    support: points.iter().map(|pt| pt.x).collect(),
                    cdf,
                }
            }
            Law::Beta {
                alpha,
                beta,
                min,
                max,
            } => Sampler::Beta {
                cdf: beta_cdf_table(*alpha, *beta),
                min: *min,
                max: *max,
            },
        }
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.gen();
        match self {
            Sampler::Uniform { min, max } => min + u * (max - min),
            Sampler::Discrete { support, cdf } => {
                let idx = cdf.partition_point(|&c| c <= u).min(support.len() - 1);
                support[idx]
            }
            Sampler::Beta { cdf, min, max } => min + beta_quantile(cdf, u) * (max - min),
        }
    }
}

/// Midpoint integration of the Beta density, normalized to end at 1
fn beta_cdf_table(alpha: f64, beta: f64) -> Vec<f64> {
    let step = 1.0 / BETA_TABLE_STEPS as f64;
    let mut cdf = Vec::with_capacity(BETA_TABLE_STEPS + 1);
    cdf.push(0.0);
    let mut running = 0.0;
    for k in 0..BETA_TABLE_STEPS {
        let x = (k as f64 + 0.5) * step;
        running += x.powf(alpha - 1.0) * (1.0 - x).powf(beta - 1.0) * step;
        cdf.push(running);
    }
    let total = running;
    if total > 0.0 {
        cdf.iter_mut().for_each(|c| *c /= total);
    }
    cdf
}

/// Inverse of the tabulated CDF with linear interpolation, in [0, 1]
fn beta_quantile(cdf: &[f64], u: f64) -> f64 {
    let steps = cdf.len() - 1;
    let k = cdf.partition_point(|&c| c <= u).clamp(1, steps);
    let (lo, hi) = (cdf[k - 1], cdf[k]);
    let fraction = if hi > lo { (u - lo) / (hi - lo) } else { 0.0 };
    ((k - 1) as f64 + fraction.clamp(0.0, 1.0)) / steps as f64
}

/// Serialized form of a [`RandomVariable`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomVariableConfig {
    pub name: String,
    #[serde(flatten)]
    pub law: Law,
    pub default_value: f64,
}

/// A named stochastic quantity
///
/// In deterministic mode the variable always yields its default value. In
/// random mode it yields the value drawn for the current run; every draw is
/// appended to the variable's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RandomVariableConfig", into = "RandomVariableConfig")]
pub struct RandomVariable {
    name: String,
    law: Law,
    default_value: f64,
    sampler: Sampler,
    /// Value drawn for the current run
    current: Option<f64>,
    history: Histogram,
}

impl TryFrom<RandomVariableConfig> for RandomVariable {
    type Error = RandomError;

    fn try_from(config: RandomVariableConfig) -> Result<Self, Self::Error> {
        RandomVariable::new(config.name, config.law, config.default_value)
    }
}

impl From<RandomVariable> for RandomVariableConfig {
    fn from(variable: RandomVariable) -> Self {
        Self {
            name: variable.name,
            law: variable.law,
            default_value: variable.default_value,
        }
    }
}

impl RandomVariable {
    /// Create a random variable after validating its law
    pub fn new(name: impl Into<String>, law: Law, default_value: f64) -> Result<Self, RandomError> {
        let name = name.into();
        law.validate(&name)?;
        Ok(Self::build(name, law, default_value))
    }

    /// Build from a law known to be valid (built-in defaults)
    pub(crate) fn build(name: impl Into<String>, law: Law, default_value: f64) -> Self {
        let name = name.into();
        let sampler = Sampler::from_law(&law);
        Self {
            history: Histogram::new(name.clone()),
            name,
            law,
            default_value,
            sampler,
            current: None,
        }
    }

    /// Discrete law from `(value, probability)` pairs
    pub fn discrete(
        name: impl Into<String>,
        points: &[(f64, f64)],
        default_value: f64,
    ) -> Result<Self, RandomError> {
        let pdf = points.iter().map(|&(x, p)| DiscretePoint { x, p }).collect();
        Self::new(name, Law::Discrete { pdf }, default_value)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn law(&self) -> &Law {
        &self.law
    }

    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    pub fn set_default_value(&mut self, value: f64) {
        self.default_value = value;
    }

    /// Draw one value without touching the history
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.sampler.sample(rng)
    }

    /// Draw the value of a new run and record it
    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        let x = self.sampler.sample(rng);
        self.history.record(x);
        self.current = Some(x);
        x
    }

    /// Value according to the simulation mode, drawing lazily if needed
    pub fn value<R: Rng + ?Sized>(&mut self, mode: SimulationMode, rng: &mut R) -> f64 {
        match mode {
            SimulationMode::Deterministic => self.default_value,
            SimulationMode::Random => match self.current {
                Some(x) => x,
                None => self.next(rng),
            },
        }
    }

    /// Value drawn for the current run, if any
    pub fn current(&self) -> Option<f64> {
        self.current
    }

    /// Force the current run's value (replay of a recorded draw)
    pub fn set_value(&mut self, value: f64) {
        self.current = Some(value);
    }

    /// Forget the current draw and every recorded sample
    pub fn reset_history(&mut self) {
        self.current = None;
        self.history.reset();
    }

    pub fn history(&self) -> &Histogram {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut Histogram {
        &mut self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_discrete_samples_stay_on_support() {
        let mut rv =
            RandomVariable::discrete("dependency", &[(0.0, 0.2), (3.0, 0.5), (6.0, 0.3)], 3.0)
                .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let n = 10_000;
        let mut counts = [0usize; 3];
        for _ in 0..n {
            let x = rv.next(&mut rng);
            match x as i64 {
                0 => counts[0] += 1,
                3 => counts[1] += 1,
                6 => counts[2] += 1,
                other => panic!("sample {} outside support", other),
            }
        }
        for (count, expected) in counts.iter().zip([0.2, 0.5, 0.3]) {
            assert!((*count as f64 / n as f64 - expected).abs() < 0.05);
        }
        assert_eq!(rv.history().len(), n);
    }

    #[test]
    fn test_discrete_pdf_must_sum_to_one() {
        let err = RandomVariable::discrete("bad", &[(1.0, 0.5), (2.0, 0.4)], 1.0).unwrap_err();
        assert!(matches!(err, RandomError::InvalidPdf { .. }));
    }

    #[test]
    fn test_beta_rejects_bad_parameters() {
        let law = Law::Beta {
            alpha: 0.0,
            beta: 2.0,
            min: 0.0,
            max: 1.0,
        };
        assert!(RandomVariable::new("b", law, 0.5).is_err());

        let law = Law::Beta {
            alpha: 2.0,
            beta: 2.0,
            min: 1.0,
            max: f64::INFINITY,
        };
        assert!(RandomVariable::new("b", law, 0.5).is_err());
    }

    #[test]
    fn test_symmetric_beta_is_centered_and_bounded() {
        let law = Law::Beta {
            alpha: 4.0,
            beta: 4.0,
            min: 1.0,
            max: 3.0,
        };
        let rv = RandomVariable::new("beta", law, 2.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let samples: Vec<f64> = (0..20_000).map(|_| rv.sample(&mut rng)).collect();
        assert!(samples.iter().all(|x| (1.0..=3.0).contains(x)));
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert_abs_diff_eq!(mean, 2.0, epsilon = 0.02);
    }

    #[test]
    fn test_uniform_samples_in_range() {
        let rv = RandomVariable::new("u", Law::Uniform { min: -1.0, max: 1.0 }, 0.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!((0..1_000).all(|_| (-1.0..=1.0).contains(&rv.sample(&mut rng))));
    }

    #[test]
    fn test_value_by_mode() {
        let mut rv = RandomVariable::new("u", Law::Uniform { min: 10.0, max: 20.0 }, 5.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(rv.value(SimulationMode::Deterministic, &mut rng), 5.0);
        assert!(rv.history().is_empty());

        // Lazily drawn once, then stable for the run
        let first = rv.value(SimulationMode::Random, &mut rng);
        assert_eq!(rv.value(SimulationMode::Random, &mut rng), first);
        assert_eq!(rv.history().len(), 1);

        rv.set_value(12.5);
        assert_eq!(rv.value(SimulationMode::Random, &mut rng), 12.5);

        rv.reset_history();
        assert!(rv.current().is_none());
        assert!(rv.history().is_empty());
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let json = r#"{"name":"inflation","law":"uniform","min":0.0,"max":0.04,"defaultValue":0.02}"#;
        let rv: RandomVariable = serde_json::from_str(json).unwrap();
        assert_eq!(rv.default_value(), 0.02);

        let bad = r#"{"name":"x","law":"discrete","pdf":[{"x":1.0,"p":0.3}],"defaultValue":1.0}"#;
        assert!(serde_json::from_str::<RandomVariable>(bad).is_err());
    }
}

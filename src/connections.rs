//! Incoming weighted connections of one computed unit.

use rand::Rng;

use crate::{Error, Result};

/// Weights and momentum terms for the incoming edges of a single unit.
///
/// Entry `i` is the edge from unit `i` of the preceding layer. Both buffers
/// always have the same length, fixed when the bundle is created.
#[derive(Debug, Clone, PartialEq)]
pub struct Connections {
    weights: Vec<f64>,
    /// Previous weight deltas, reused as momentum.
    momentum_terms: Vec<f64>,
}

impl Connections {
    /// Allocate `count` weights drawn uniformly from `[low, high)` and `count`
    /// zeroed momentum terms. A zero `count` gives an empty bundle.
    pub fn new_with_rng<R: Rng + ?Sized>(
        count: usize,
        low: f64,
        high: f64,
        rng: &mut R,
    ) -> Result<Self> {
        validate_weight_range(low, high)?;

        let weights = (0..count).map(|_| rng.gen_range(low..high)).collect();
        Ok(Self {
            weights,
            momentum_terms: vec![0.0; count],
        })
    }

    /// Build a bundle from explicit weights (momentum terms start at zero).
    pub fn from_weights(weights: Vec<f64>) -> Result<Self> {
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::InvalidConfig(
                "weights must contain only finite values".to_owned(),
            ));
        }
        let count = weights.len();
        Ok(Self {
            weights,
            momentum_terms: vec![0.0; count],
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[inline]
    pub fn momentum_terms(&self) -> &[f64] {
        &self.momentum_terms
    }

    pub fn weight(&self, index: usize) -> Result<f64> {
        self.weights
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index,
                len: self.weights.len(),
            })
    }

    pub fn momentum_term(&self, index: usize) -> Result<f64> {
        self.momentum_terms
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index,
                len: self.momentum_terms.len(),
            })
    }

    /// Overwrite one weight and its momentum term.
    pub fn update(&mut self, index: usize, weight: f64, momentum_term: f64) -> Result<()> {
        let len = self.weights.len();
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        self.weights[index] = weight;
        self.momentum_terms[index] = momentum_term;
        Ok(())
    }

    pub fn reset_momentum(&mut self) {
        self.momentum_terms.fill(0.0);
    }
}

pub(crate) fn validate_weight_range(low: f64, high: f64) -> Result<()> {
    if !(low.is_finite() && high.is_finite()) {
        return Err(Error::InvalidConfig(format!(
            "weight range must be finite, got [{low}, {high})"
        )));
    }
    if low >= high {
        return Err(Error::InvalidConfig(format!(
            "weight range lower bound {low} must be below upper bound {high}"
        )));
    }
    Ok(())
}

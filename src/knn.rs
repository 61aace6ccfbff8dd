//! Unweighted k-nearest-neighbour classification.
//!
//! A lazy baseline for comparing against the trained network: nothing is
//! learned up front, every query is scored against the whole training set.

use tracing::info;

use crate::{Error, Example, Result, TestReport, metrics};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearestNeighbour {
    k: usize,
}

impl NearestNeighbour {
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidConfig("k must be > 0".to_owned()));
        }
        Ok(Self { k })
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Majority class among the `min(k, n)` training examples closest to `query`.
    ///
    /// Distance is squared Euclidean. Equidistant neighbours keep their
    /// training-set order, and a tied vote goes to the smallest class id.
    pub fn classify(&self, query: &[f64], training: &[Example]) -> Result<usize> {
        if training.is_empty() {
            return Err(Error::InvalidData(
                "training set must not be empty".to_owned(),
            ));
        }

        let mut neighbours = Vec::with_capacity(training.len());
        for (i, example) in training.iter().enumerate() {
            if example.attributes.len() != query.len() {
                return Err(Error::InvalidShape(format!(
                    "training example {i} has {} attributes, query has {}",
                    example.attributes.len(),
                    query.len()
                )));
            }
            if example.class == 0 {
                return Err(Error::InvalidData(format!(
                    "training example {i} has class 0; classes are 1-based"
                )));
            }
            neighbours.push((squared_distance(query, &example.attributes), example.class));
        }
        // Stable, so ties in distance keep training-set order.
        neighbours.sort_by(|a, b| a.0.total_cmp(&b.0));

        let nearest = &neighbours[..self.k.min(neighbours.len())];
        let num_classes = nearest.iter().map(|&(_, c)| c).max().unwrap_or(1);
        let mut votes = vec![0usize; num_classes];
        for &(_, class) in nearest {
            votes[class - 1] += 1;
        }

        // Strict comparison keeps the smallest class on a tied vote.
        let mut winner = 0;
        for (i, &count) in votes.iter().enumerate() {
            if count > votes[winner] {
                winner = i;
            }
        }
        Ok(winner + 1)
    }

    /// Classify every example of `testing` against `training`.
    ///
    /// An empty `testing` set yields a report with `total == 0`.
    pub fn evaluate(&self, training: &[Example], testing: &[Example]) -> Result<TestReport> {
        let mut hits = 0;
        for example in testing {
            if self.classify(&example.attributes, training)? == example.class {
                hits += 1;
            }
        }

        let report = TestReport {
            hits,
            total: testing.len(),
            hit_percentage: metrics::hit_percentage(hits, testing.len()),
        };
        info!(
            k = self.k,
            hits = report.hits,
            total = report.total,
            hit_percentage = report.hit_percentage,
            "knn evaluation complete"
        );
        Ok(report)
    }
}

#[inline]
fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

//! Epoch-based training and testing.
//!
//! Training is online: every example is propagated forward, its error is
//! back-propagated, and the weights move immediately. After each epoch the
//! cumulative squared network error is compared against
//! [`TrainConfig::max_error`] for early stopping.

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::{Activation, BackpropOrder, Error, Example, Network, Result, metrics};

/// Hyperparameters for one training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    pub num_epochs: usize,
    pub hidden_activation: Activation,
    pub output_activation: Activation,
    pub learning_rate: f64,
    pub momentum: f64,
    /// Stop once an epoch's cumulative squared error is at or below this value.
    pub max_error: f64,
    pub backprop_order: BackpropOrder,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            num_epochs: 800,
            hidden_activation: Activation::Logistic,
            output_activation: Activation::Logistic,
            learning_rate: 0.1,
            momentum: 0.05,
            max_error: 0.1,
            backprop_order: BackpropOrder::AdjustThenAttribute,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_epochs == 0 {
            return Err(Error::InvalidConfig("num_epochs must be > 0".to_owned()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and >= 0, got {}",
                self.learning_rate
            )));
        }
        if !(self.momentum.is_finite() && self.momentum >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "momentum must be finite and >= 0, got {}",
                self.momentum
            )));
        }
        if self.max_error.is_nan() {
            return Err(Error::InvalidConfig("max_error must not be NaN".to_owned()));
        }
        Ok(())
    }
}

/// Metrics for one completed training epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Sum over examples of the squared output errors.
    pub network_error: f64,
    pub hit_percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub epochs: Vec<EpochReport>,
    /// True when training ended because the error threshold was reached.
    pub stopped_early: bool,
}

impl TrainReport {
    pub fn last(&self) -> Option<&EpochReport> {
        self.epochs.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestReport {
    pub hits: usize,
    pub total: usize,
    pub hit_percentage: f64,
}

/// Receives each epoch's metrics as training progresses.
pub trait EpochSink {
    fn record_epoch(&mut self, report: &EpochReport);
}

impl<F> EpochSink for F
where
    F: FnMut(&EpochReport),
{
    #[inline]
    fn record_epoch(&mut self, report: &EpochReport) {
        self(report)
    }
}

impl Network {
    /// Train on `examples` for up to `cfg.num_epochs` epochs.
    ///
    /// `examples` is reshuffled in place at the start of every epoch using `rng`.
    /// The per-epoch histories are reset first and grow by one entry per
    /// completed epoch.
    pub fn train<R: Rng + ?Sized>(
        &mut self,
        examples: &mut [Example],
        cfg: &TrainConfig,
        rng: &mut R,
    ) -> Result<TrainReport> {
        self.train_with_sink(examples, cfg, rng, &mut |_: &EpochReport| {})
    }

    /// Like [`Network::train`], forwarding every epoch's metrics to `sink`.
    pub fn train_with_sink<R, S>(
        &mut self,
        examples: &mut [Example],
        cfg: &TrainConfig,
        rng: &mut R,
        sink: &mut S,
    ) -> Result<TrainReport>
    where
        R: Rng + ?Sized,
        S: EpochSink + ?Sized,
    {
        cfg.validate()?;
        self.ensure_initialized()?;
        if examples.is_empty() {
            return Err(Error::InvalidData(
                "training set must not be empty".to_owned(),
            ));
        }
        self.check_examples(examples, "training")?;

        self.clear_history(cfg.num_epochs);
        let mut epochs = Vec::with_capacity(cfg.num_epochs);
        let mut stopped_early = false;

        for epoch in 0..cfg.num_epochs {
            examples.shuffle(rng);

            let mut network_error = 0.0;
            let mut hits = 0;
            for example in examples.iter() {
                self.set_inputs(&example.attributes)?;
                self.forward(cfg.hidden_activation, cfg.output_activation)?;
                self.backward_with_order(
                    cfg.hidden_activation,
                    example.class,
                    cfg.learning_rate,
                    cfg.momentum,
                    cfg.backprop_order,
                )?;
                network_error += self.network_error();
                if self.predicted_class() == example.class {
                    hits += 1;
                }
            }

            let report = EpochReport {
                epoch: epoch + 1,
                network_error,
                hit_percentage: metrics::hit_percentage(hits, examples.len()),
            };
            debug!(
                epoch = report.epoch,
                error = report.network_error,
                hit_percentage = report.hit_percentage,
                "epoch complete"
            );
            self.record_epoch(report.network_error, report.hit_percentage);
            sink.record_epoch(&report);
            epochs.push(report);

            if network_error <= cfg.max_error {
                info!(
                    epoch = report.epoch,
                    error = network_error,
                    max_error = cfg.max_error,
                    "error threshold reached, stopping early"
                );
                stopped_early = true;
                break;
            }

            self.reset_momentum();
        }

        Ok(TrainReport {
            epochs,
            stopped_early,
        })
    }

    /// Classify every example without touching the weights.
    ///
    /// An empty set yields a report with `total == 0` and a hit percentage of `0`.
    pub fn test(
        &mut self,
        examples: &[Example],
        hidden: Activation,
        output: Activation,
    ) -> Result<TestReport> {
        self.ensure_initialized()?;
        self.check_examples(examples, "testing")?;

        let mut hits = 0;
        for example in examples {
            self.set_inputs(&example.attributes)?;
            self.forward(hidden, output)?;
            if self.predicted_class() == example.class {
                hits += 1;
            }
        }

        let report = TestReport {
            hits,
            total: examples.len(),
            hit_percentage: metrics::hit_percentage(hits, examples.len()),
        };
        info!(
            hits = report.hits,
            total = report.total,
            hit_percentage = report.hit_percentage,
            "test complete"
        );
        Ok(report)
    }

    /// Validate every example up front so that no unit state changes before a
    /// shape or label fault is reported.
    fn check_examples(&self, examples: &[Example], what: &str) -> Result<()> {
        for (i, example) in examples.iter().enumerate() {
            if example.attributes.len() != self.input_size() {
                return Err(Error::InvalidShape(format!(
                    "{what} example {i} has {} attributes, input layer has {} units",
                    example.attributes.len(),
                    self.input_size()
                )));
            }
            self.check_class(example.class)
                .map_err(|e| Error::InvalidData(format!("{what} example {i}: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn toy_examples() -> Vec<Example> {
        vec![
            Example::new(vec![0.1, 0.2], 1),
            Example::new(vec![0.2, 0.1], 1),
            Example::new(vec![0.9, 0.8], 2),
            Example::new(vec![0.8, 0.9], 2),
        ]
    }

    fn seeded_net() -> Network {
        let mut net = Network::new(2, 3, 2).unwrap();
        net.init_weights_with_seed(-1.0, 1.0, 11).unwrap();
        net
    }

    #[test]
    fn config_validation() {
        assert!(TrainConfig::default().validate().is_ok());
        let bad = [
            TrainConfig {
                num_epochs: 0,
                ..TrainConfig::default()
            },
            TrainConfig {
                learning_rate: f64::NAN,
                ..TrainConfig::default()
            },
            TrainConfig {
                momentum: -0.5,
                ..TrainConfig::default()
            },
            TrainConfig {
                max_error: f64::NAN,
                ..TrainConfig::default()
            },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?}");
        }
    }

    #[test]
    fn threshold_above_first_epoch_error_stops_after_one_epoch() {
        let mut net = seeded_net();
        let mut examples = toy_examples();
        let mut rng = StdRng::seed_from_u64(0);
        let cfg = TrainConfig {
            num_epochs: 25,
            max_error: 1e9,
            ..TrainConfig::default()
        };
        let report = net.train(&mut examples, &cfg, &mut rng).unwrap();
        assert_eq!(report.epochs.len(), 1);
        assert!(report.stopped_early);
    }

    #[test]
    fn threshold_below_any_error_runs_every_epoch() {
        let mut net = seeded_net();
        let mut examples = toy_examples();
        let mut rng = StdRng::seed_from_u64(0);
        let cfg = TrainConfig {
            num_epochs: 25,
            max_error: -1.0,
            ..TrainConfig::default()
        };
        let report = net.train(&mut examples, &cfg, &mut rng).unwrap();
        assert_eq!(report.epochs.len(), 25);
        assert!(!report.stopped_early);
        assert_eq!(net.epochs_run(), 25);
        assert_eq!(net.error_history().len(), 25);
        assert_eq!(net.hit_history().len(), 25);
        assert_eq!(report.last().unwrap().epoch, 25);
    }

    #[test]
    fn histories_match_reports_and_reset_per_call() {
        let mut net = seeded_net();
        let mut examples = toy_examples();
        let mut rng = StdRng::seed_from_u64(5);
        let cfg = TrainConfig {
            num_epochs: 4,
            max_error: -1.0,
            ..TrainConfig::default()
        };

        let report = net.train(&mut examples, &cfg, &mut rng).unwrap();
        let errors: Vec<f64> = report.epochs.iter().map(|e| e.network_error).collect();
        let hits: Vec<f64> = report.epochs.iter().map(|e| e.hit_percentage).collect();
        assert_eq!(net.error_history(), errors.as_slice());
        assert_eq!(net.hit_history(), hits.as_slice());

        let cfg = TrainConfig {
            num_epochs: 2,
            ..cfg
        };
        net.train(&mut examples, &cfg, &mut rng).unwrap();
        assert_eq!(net.epochs_run(), 2);
    }

    #[test]
    fn sink_sees_every_epoch() {
        let mut net = seeded_net();
        let mut examples = toy_examples();
        let mut rng = StdRng::seed_from_u64(1);
        let cfg = TrainConfig {
            num_epochs: 6,
            max_error: -1.0,
            ..TrainConfig::default()
        };

        let mut seen = Vec::new();
        let mut sink = |r: &EpochReport| seen.push(r.epoch);
        net.train_with_sink(&mut examples, &cfg, &mut rng, &mut sink)
            .unwrap();
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn training_is_reproducible_with_a_seeded_rng() {
        let cfg = TrainConfig {
            num_epochs: 10,
            max_error: -1.0,
            ..TrainConfig::default()
        };
        let run = || {
            let mut net = seeded_net();
            let mut examples = toy_examples();
            let mut rng = StdRng::seed_from_u64(42);
            net.train(&mut examples, &cfg, &mut rng).unwrap();
            net.error_history().to_vec()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn bad_examples_fail_before_any_update() {
        let mut net = seeded_net();
        let before = net.clone();
        let mut rng = StdRng::seed_from_u64(0);
        let cfg = TrainConfig::default();

        let mut short = toy_examples();
        short.push(Example::new(vec![0.5], 1));
        assert!(matches!(
            net.train(&mut short, &cfg, &mut rng),
            Err(Error::InvalidShape(_))
        ));

        let mut bad_class = toy_examples();
        bad_class.push(Example::new(vec![0.5, 0.5], 3));
        assert!(matches!(
            net.train(&mut bad_class, &cfg, &mut rng),
            Err(Error::InvalidData(_))
        ));

        assert!(net.train(&mut [], &cfg, &mut rng).is_err());
        assert_eq!(
            net.hidden_layer().units(),
            before.hidden_layer().units()
        );
        assert_eq!(
            net.output_layer().units(),
            before.output_layer().units()
        );
    }

    #[test]
    fn empty_test_set_reports_zero_cases() {
        let mut net = seeded_net();
        let report = net
            .test(&[], Activation::Logistic, Activation::Logistic)
            .unwrap();
        assert_eq!(
            report,
            TestReport {
                hits: 0,
                total: 0,
                hit_percentage: 0.0,
            }
        );
    }

    #[test]
    fn test_does_not_change_weights_or_history() {
        let mut net = seeded_net();
        let examples = toy_examples();
        let before = net.clone();

        let report = net
            .test(&examples, Activation::Logistic, Activation::Logistic)
            .unwrap();
        assert_eq!(report.total, 4);
        assert!(report.hits <= 4);
        assert_eq!(report.hit_percentage, metrics::hit_percentage(report.hits, 4));
        assert_eq!(net.epochs_run(), 0);
        assert_eq!(
            net.output_layer().units().iter().map(|u| u.connections()).collect::<Vec<_>>(),
            before.output_layer().units().iter().map(|u| u.connections()).collect::<Vec<_>>()
        );
    }
}

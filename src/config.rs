//! Run configuration.
//!
//! A [`Config`] holds everything needed to build and train a network. It can be
//! read from two formats:
//!
//! - a parameter file: one value per line in a fixed order, with `#` comment
//!   lines and blank lines ignored (see [`PARAMETER_ORDER`]);
//! - JSON, selected by a `.json` extension. Missing fields take their defaults.

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Activation, BackpropOrder, Error, LabelEncoding, Network, Result, TrainConfig};

/// Line order of the parameter-file format.
pub const PARAMETER_ORDER: [&str; 13] = [
    "number of inputs",
    "number of hiddens",
    "number of outputs",
    "learning rule",
    "lower weight range",
    "upper weight range",
    "learning rate",
    "momentum",
    "bias",
    "hidden activation",
    "output activation",
    "number of epochs",
    "max error",
];

/// The only supported learning rule.
pub const BACKPROP: &str = "backprop";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Input units, one per attribute.
    pub num_inputs: usize,
    pub num_hidden: usize,
    /// Output units, one per class.
    pub num_outputs: usize,
    pub learning_rule: String,
    pub lower_weight_range: f64,
    pub upper_weight_range: f64,
    pub learning_rate: f64,
    pub momentum: f64,
    /// Accepted for compatibility; bias units are not modelled.
    pub bias: bool,
    pub hidden_activation: Activation,
    pub output_activation: Activation,
    pub num_epochs: usize,
    pub max_error: f64,
    /// Percentage of examples used for training.
    pub training_ratio: u32,
    pub seed: Option<u64>,
    pub label_encoding: LabelEncoding,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_inputs: 27,
            num_hidden: 50,
            num_outputs: 7,
            learning_rule: BACKPROP.to_owned(),
            lower_weight_range: -1.0,
            upper_weight_range: 1.0,
            learning_rate: 0.1,
            momentum: 0.05,
            bias: false,
            hidden_activation: Activation::Logistic,
            output_activation: Activation::Logistic,
            num_epochs: 800,
            max_error: 0.1,
            training_ratio: 80,
            seed: None,
            label_encoding: LabelEncoding::Integer,
        }
    }
}

impl Config {
    /// Load from `path`, choosing the format by extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let text = std::fs::read_to_string(p)
            .map_err(|e| Error::Io(format!("failed to read {}: {e}", p.display())))?;

        let is_json = p
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_params_str(&text)
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Config = serde_json::from_str(s)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse the line-oriented parameter format, starting from the defaults.
    ///
    /// Fewer than [`PARAMETER_ORDER`] values leaves the remaining fields at
    /// their defaults; more is an error.
    pub fn from_params_str(s: &str) -> Result<Self> {
        let mut cfg = Config::default();
        let values = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));

        for (i, value) in values.enumerate() {
            let Some(&name) = PARAMETER_ORDER.get(i) else {
                return Err(Error::InvalidConfig(format!(
                    "too many parameters: expected at most {}, found {value:?} after them",
                    PARAMETER_ORDER.len()
                )));
            };
            let bad = |e: &dyn std::fmt::Display| {
                Error::InvalidConfig(format!("{name}: cannot parse {value:?}: {e}"))
            };

            match i {
                0 => cfg.num_inputs = value.parse::<usize>().map_err(|e| bad(&e))?,
                1 => cfg.num_hidden = value.parse::<usize>().map_err(|e| bad(&e))?,
                2 => cfg.num_outputs = value.parse::<usize>().map_err(|e| bad(&e))?,
                3 => cfg.learning_rule = value.to_owned(),
                4 => cfg.lower_weight_range = value.parse::<f64>().map_err(|e| bad(&e))?,
                5 => cfg.upper_weight_range = value.parse::<f64>().map_err(|e| bad(&e))?,
                6 => cfg.learning_rate = value.parse::<f64>().map_err(|e| bad(&e))?,
                7 => cfg.momentum = value.parse::<f64>().map_err(|e| bad(&e))?,
                8 => cfg.bias = parse_flag(value).map_err(|e| bad(&e))?,
                9 => cfg.hidden_activation = value.parse()?,
                10 => cfg.output_activation = value.parse()?,
                11 => cfg.num_epochs = value.parse::<usize>().map_err(|e| bad(&e))?,
                _ => cfg.max_error = value.parse::<f64>().map_err(|e| bad(&e))?,
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_inputs == 0 || self.num_hidden == 0 || self.num_outputs == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer sizes must be > 0, got {}-{}-{}",
                self.num_inputs, self.num_hidden, self.num_outputs
            )));
        }
        if self.learning_rule != BACKPROP {
            return Err(Error::InvalidConfig(format!(
                "unsupported learning rule {:?} (only {BACKPROP:?} is available)",
                self.learning_rule
            )));
        }
        crate::connections::validate_weight_range(
            self.lower_weight_range,
            self.upper_weight_range,
        )?;
        if self.training_ratio > 100 {
            return Err(Error::InvalidConfig(format!(
                "training ratio must be in 0..=100, got {}",
                self.training_ratio
            )));
        }
        self.train_config().validate()?;
        if self.bias {
            warn!("bias units are not supported; the bias setting is ignored");
        }
        Ok(())
    }

    /// The training hyperparameters of this configuration.
    pub fn train_config(&self) -> TrainConfig {
        TrainConfig {
            num_epochs: self.num_epochs,
            hidden_activation: self.hidden_activation,
            output_activation: self.output_activation,
            learning_rate: self.learning_rate,
            momentum: self.momentum,
            max_error: self.max_error,
            backprop_order: BackpropOrder::default(),
        }
    }

    /// Construct the network and initialize its weights from `rng`.
    pub fn build_network<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Network> {
        let mut net = Network::new(self.num_inputs, self.num_hidden, self.num_outputs)?;
        net.init_weights(
            self.num_inputs,
            self.num_hidden,
            self.lower_weight_range,
            self.upper_weight_range,
            rng,
        )?;
        Ok(net)
    }
}

fn parse_flag(value: &str) -> std::result::Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err("expected 0 or 1".to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const PARAMS: &str = "\
# inputs
27
# hiddens
12
# outputs
7
backprop
-0.5
0.5
0.2
0.1
0
tanh
logistic
300
2.5
";

    #[test]
    fn parses_parameter_file() {
        let cfg = Config::from_params_str(PARAMS).unwrap();
        assert_eq!(cfg.num_inputs, 27);
        assert_eq!(cfg.num_hidden, 12);
        assert_eq!(cfg.num_outputs, 7);
        assert_eq!(cfg.lower_weight_range, -0.5);
        assert_eq!(cfg.upper_weight_range, 0.5);
        assert_eq!(cfg.learning_rate, 0.2);
        assert_eq!(cfg.momentum, 0.1);
        assert!(!cfg.bias);
        assert_eq!(cfg.hidden_activation, Activation::Tanh);
        assert_eq!(cfg.output_activation, Activation::Logistic);
        assert_eq!(cfg.num_epochs, 300);
        assert_eq!(cfg.max_error, 2.5);
        assert_eq!(cfg.training_ratio, 80);
    }

    #[test]
    fn partial_parameter_file_keeps_defaults() {
        let cfg = Config::from_params_str("4\n3\n2\n").unwrap();
        assert_eq!((cfg.num_inputs, cfg.num_hidden, cfg.num_outputs), (4, 3, 2));
        assert_eq!(cfg.num_epochs, Config::default().num_epochs);
    }

    #[test]
    fn rejects_bad_parameter_files() {
        let too_many = format!("{PARAMS}99\n");
        assert!(Config::from_params_str(&too_many).is_err());

        let relu = PARAMS.replace("tanh", "relu");
        assert!(matches!(
            Config::from_params_str(&relu),
            Err(Error::UnsupportedActivation(_))
        ));

        let rule = PARAMS.replace("backprop", "quickprop");
        assert!(Config::from_params_str(&rule).is_err());

        assert!(Config::from_params_str("0\n3\n2\n").is_err());
        assert!(Config::from_params_str("four\n").is_err());
    }

    #[test]
    fn parses_json_with_defaults() {
        let cfg = Config::from_json_str(
            r#"{"num_inputs": 2, "num_hidden": 3, "num_outputs": 2,
                "hidden_activation": "tanh", "seed": 17, "label_encoding": "one-hot"}"#,
        )
        .unwrap();
        assert_eq!(cfg.num_inputs, 2);
        assert_eq!(cfg.hidden_activation, Activation::Tanh);
        assert_eq!(cfg.output_activation, Activation::Logistic);
        assert_eq!(cfg.seed, Some(17));
        assert_eq!(cfg.label_encoding, LabelEncoding::OneHot);

        assert!(Config::from_json_str(r#"{"hidden_activation": "relu"}"#).is_err());
        assert!(Config::from_json_str(r#"{"hidden_units": 3}"#).is_err());
    }

    #[test]
    fn builds_initialized_network() {
        let cfg = Config::from_params_str(PARAMS).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let net = cfg.build_network(&mut rng).unwrap();
        assert!(net.is_initialized());
        assert_eq!(net.input_size(), 27);
        assert_eq!(net.hidden_size(), 12);
        assert_eq!(net.output_size(), 7);

        let tc = cfg.train_config();
        assert_eq!(tc.num_epochs, 300);
        assert_eq!(tc.hidden_activation, Activation::Tanh);
    }
}

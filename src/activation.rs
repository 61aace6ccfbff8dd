//! Activation functions.
//!
//! A computed unit sums its weighted inputs `s = Σ w_i x_i` and then applies an
//! activation function: `output = activation(s)`.
//!
//! Only the logistic and hyperbolic-tangent functions exist. Names are parsed
//! with [`str::parse`], and anything else is rejected with
//! [`Error::UnsupportedActivation`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Sums below this saturate the logistic function to exactly `0`.
pub const LOGISTIC_LOWER_SATURATION: f64 = -45.0;
/// Sums above this saturate the logistic function to exactly `1`.
pub const LOGISTIC_UPPER_SATURATION: f64 = 45.0;

/// Activation function applied by hidden or output units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Activation {
    Logistic,
    Tanh,
}

impl Activation {
    #[inline]
    pub fn forward(self, sum: f64) -> f64 {
        match self {
            Activation::Logistic => logistic(sum),
            Activation::Tanh => sum.tanh(),
        }
    }

    /// Multiplier applied to the back-propagated sum when computing a hidden
    /// unit's error, expressed in terms of the unit's cached `output`.
    ///
    /// - logistic: `y (1 - y)`
    /// - tanh: `((2 cosh y) / (cosh 2y + 1))^2`, which evaluates `sech^2` at the
    ///   output rather than at the weighted sum.
    #[inline]
    pub fn hidden_error_factor(self, output: f64) -> f64 {
        match self {
            Activation::Logistic => output * (1.0 - output),
            Activation::Tanh => {
                let ratio = (2.0 * output.cosh()) / ((2.0 * output).cosh() + 1.0);
                ratio * ratio
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Activation::Logistic => "logistic",
            Activation::Tanh => "tanh",
        }
    }
}

/// The logistic function `1 / (1 + e^-x)`, clamped outside `[-45, 45]` so that
/// `e^-x` never overflows.
#[inline]
pub fn logistic(x: f64) -> f64 {
    if x < LOGISTIC_LOWER_SATURATION {
        0.0
    } else if x > LOGISTIC_UPPER_SATURATION {
        1.0
    } else {
        1.0 / (1.0 + (-x).exp())
    }
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("logistic") {
            Ok(Activation::Logistic)
        } else if name.eq_ignore_ascii_case("tanh") {
            Ok(Activation::Tanh)
        } else {
            Err(Error::UnsupportedActivation(name.to_owned()))
        }
    }
}

impl TryFrom<String> for Activation {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

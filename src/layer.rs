use std::fmt;

use rand::Rng;

use crate::{Activation, Error, Result, Unit};

/// Position of a layer in the three-layer network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Input,
    Hidden,
    Output,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerKind::Input => "input",
            LayerKind::Hidden => "hidden",
            LayerKind::Output => "output",
        };
        f.write_str(name)
    }
}

/// A fixed-size, index-ordered group of units.
///
/// Every batch operation visits the units in index order and forwards to the
/// matching [`Unit`] operation.
#[derive(Debug, Clone)]
pub struct Layer {
    kind: LayerKind,
    units: Vec<Unit>,
}

impl Layer {
    /// Create a layer of `size` units. Hidden and output units get their
    /// connections later, via [`Layer::init_weights`].
    pub fn new(kind: LayerKind, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidConfig(format!(
                "{kind} layer size must be > 0"
            )));
        }
        Ok(Self {
            kind,
            units: vec![Unit::input(); size],
        })
    }

    /// Build a layer from existing units.
    ///
    /// Input layers must hold input-mode units; hidden and output layers must
    /// hold computed units with equal fan-in.
    pub fn from_units(kind: LayerKind, units: Vec<Unit>) -> Result<Self> {
        if units.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "{kind} layer size must be > 0"
            )));
        }
        match kind {
            LayerKind::Input => {
                if units.iter().any(Unit::has_connections) {
                    return Err(Error::InvalidConfig(
                        "input layer units must not have connections".to_owned(),
                    ));
                }
            }
            LayerKind::Hidden | LayerKind::Output => {
                let fan_in = units[0].connections().map(|c| c.len());
                if fan_in.is_none() {
                    return Err(Error::InvalidConfig(format!(
                        "{kind} layer units must have connections"
                    )));
                }
                for (i, unit) in units.iter().enumerate() {
                    let n = unit.connections().map(|c| c.len());
                    if n != fan_in {
                        return Err(Error::InvalidConfig(format!(
                            "{kind} unit {i} has {n:?} connections, expected {fan_in:?}"
                        )));
                    }
                }
            }
        }
        Ok(Self { kind, units })
    }

    #[inline]
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    #[inline]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, index: usize) -> Result<&Unit> {
        self.units.get(index).ok_or_else(|| {
            Error::InvalidShape(format!(
                "{} layer has {} units, index {index} requested",
                self.kind,
                self.units.len()
            ))
        })
    }

    /// Fan-in of the layer's units, or `None` before weights are initialized.
    pub fn connection_count(&self) -> Option<usize> {
        self.units[0].connections().map(|c| c.len())
    }

    /// Give every unit `num_connections` incoming weights drawn from `[low, high)`.
    pub fn init_weights<R: Rng + ?Sized>(
        &mut self,
        num_connections: usize,
        low: f64,
        high: f64,
        rng: &mut R,
    ) -> Result<()> {
        if self.kind == LayerKind::Input {
            return Err(Error::InvalidConfig(
                "input layer units do not have incoming connections".to_owned(),
            ));
        }
        for unit in &mut self.units {
            unit.init_connections(num_connections, low, high, rng)?;
        }
        Ok(())
    }

    /// Load an attribute vector into an input layer.
    ///
    /// The length is checked before any unit is touched.
    pub fn set_inputs(&mut self, values: &[f64]) -> Result<()> {
        if self.kind != LayerKind::Input {
            return Err(Error::InvalidConfig(format!(
                "cannot set inputs on the {} layer",
                self.kind
            )));
        }
        if values.len() != self.units.len() {
            return Err(Error::InvalidShape(format!(
                "example has {} attributes, input layer has {} units",
                values.len(),
                self.units.len()
            )));
        }
        for (unit, &value) in self.units.iter_mut().zip(values) {
            unit.set_input(value)?;
        }
        Ok(())
    }

    pub fn activate(&mut self, previous: &Layer, activation: Activation) -> Result<()> {
        for unit in &mut self.units {
            unit.activate(&previous.units, activation)?;
        }
        Ok(())
    }

    /// Output-layer errors for an example of class `target_class` (1-based):
    /// unit `i` is the target iff `target_class == i + 1`.
    pub fn compute_output_errors(&mut self, target_class: usize) -> Result<()> {
        self.expect_kind(LayerKind::Output, "compute_output_errors")?;
        for (i, unit) in self.units.iter_mut().enumerate() {
            unit.compute_output_error(target_class == i + 1);
        }
        Ok(())
    }

    pub fn compute_hidden_errors(
        &mut self,
        output_layer: &Layer,
        activation: Activation,
    ) -> Result<()> {
        self.expect_kind(LayerKind::Hidden, "compute_hidden_errors")?;
        for (i, unit) in self.units.iter_mut().enumerate() {
            unit.compute_hidden_error(&output_layer.units, i, activation)?;
        }
        Ok(())
    }

    pub fn adjust_weights(
        &mut self,
        learning_rate: f64,
        momentum: f64,
        previous: &Layer,
    ) -> Result<()> {
        for unit in &mut self.units {
            unit.adjust_weights(learning_rate, momentum, &previous.units)?;
        }
        Ok(())
    }

    pub fn reset_momentum(&mut self) {
        for unit in &mut self.units {
            unit.reset_momentum();
        }
    }

    /// Sum of squared unit errors.
    pub fn squared_error(&self) -> f64 {
        self.units.iter().map(|u| u.error() * u.error()).sum()
    }

    fn expect_kind(&self, kind: LayerKind, op: &str) -> Result<()> {
        if self.kind != kind {
            return Err(Error::InvalidConfig(format!(
                "{op} is only valid on the {kind} layer, called on the {} layer",
                self.kind
            )));
        }
        Ok(())
    }
}

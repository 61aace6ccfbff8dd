//! A single unit of the network.
//!
//! Units come in two modes, fixed by whether they own a [`Connections`] bundle:
//!
//! - input mode: no incoming connections; `output` is assigned directly via
//!   [`Unit::set_input`].
//! - computed mode: `output` and `error` are derived from neighbouring layers.
//!
//! Computed-mode operations on an input-mode unit return
//! [`Error::InvalidConfig`] instead of silently doing nothing.

use rand::Rng;

use crate::{Activation, Connections, Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    output: f64,
    error: f64,
    links: Option<Connections>,
}

impl Unit {
    /// An input-mode unit.
    #[inline]
    pub fn input() -> Self {
        Self {
            output: 0.0,
            error: 0.0,
            links: None,
        }
    }

    /// A computed-mode unit owning `links`.
    #[inline]
    pub fn computed(links: Connections) -> Self {
        Self {
            output: 0.0,
            error: 0.0,
            links: Some(links),
        }
    }

    /// Attach freshly initialized incoming connections, replacing any previous ones.
    pub fn init_connections<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        low: f64,
        high: f64,
        rng: &mut R,
    ) -> Result<()> {
        self.links = Some(Connections::new_with_rng(count, low, high, rng)?);
        Ok(())
    }

    #[inline]
    pub fn has_connections(&self) -> bool {
        self.links.is_some()
    }

    #[inline]
    pub fn output(&self) -> f64 {
        self.output
    }

    /// Error signal from the most recent backward pass (always `0` for input units).
    #[inline]
    pub fn error(&self) -> f64 {
        self.error
    }

    #[inline]
    pub fn connections(&self) -> Option<&Connections> {
        self.links.as_ref()
    }

    /// Weight of the edge from unit `index` of the preceding layer.
    pub fn weight(&self, index: usize) -> Result<f64> {
        self.links()?.weight(index)
    }

    pub fn set_input(&mut self, value: f64) -> Result<()> {
        if self.links.is_some() {
            return Err(Error::InvalidConfig(
                "set_input is only valid on input units".to_owned(),
            ));
        }
        self.output = value;
        Ok(())
    }

    /// Forward step: `output = activation(Σ_i previous[i].output * weight[i])`.
    pub fn activate(&mut self, previous: &[Unit], activation: Activation) -> Result<()> {
        let links = self.links()?;
        check_fan_in(links, previous)?;

        let sum = previous
            .iter()
            .zip(links.weights())
            .fold(0.0, |acc, (unit, &w)| acc + unit.output * w);
        self.output = activation.forward(sum);
        Ok(())
    }

    /// Output-unit error: `output (1 - output) (target - output)`.
    ///
    /// The logistic derivative is used regardless of the output activation.
    #[inline]
    pub fn compute_output_error(&mut self, is_target: bool) {
        let target = if is_target { 1.0 } else { 0.0 };
        self.error = self.output * (1.0 - self.output) * (target - self.output);
    }

    /// Hidden-unit error from the errors of `output_layer` and the weights linking
    /// this unit (at position `self_index` in its layer) to each output unit.
    pub fn compute_hidden_error(
        &mut self,
        output_layer: &[Unit],
        self_index: usize,
        activation: Activation,
    ) -> Result<()> {
        let mut sum = 0.0;
        for unit in output_layer {
            sum += unit.weight(self_index)? * unit.error;
        }
        self.error = activation.hidden_error_factor(self.output) * sum;
        Ok(())
    }

    /// Apply the delta rule with momentum to every incoming connection:
    ///
    /// - `delta = learning_rate * previous[i].output * error`
    /// - `weight[i] += delta + momentum * momentum_term[i]`
    /// - `momentum_term[i] = delta`
    pub fn adjust_weights(
        &mut self,
        learning_rate: f64,
        momentum: f64,
        previous: &[Unit],
    ) -> Result<()> {
        let error = self.error;
        let links = self.links_mut()?;
        check_fan_in(links, previous)?;

        for (i, unit) in previous.iter().enumerate() {
            let delta = learning_rate * unit.output * error;
            let weight = links.weight(i)? + delta + momentum * links.momentum_term(i)?;
            links.update(i, weight, delta)?;
        }
        Ok(())
    }

    /// Zero every momentum term. Input units have none, so this is a no-op for them.
    pub fn reset_momentum(&mut self) {
        if let Some(links) = self.links.as_mut() {
            links.reset_momentum();
        }
    }

    fn links(&self) -> Result<&Connections> {
        self.links.as_ref().ok_or_else(missing_links)
    }

    fn links_mut(&mut self) -> Result<&mut Connections> {
        self.links.as_mut().ok_or_else(missing_links)
    }
}

fn missing_links() -> Error {
    Error::InvalidConfig("unit has no incoming connections (weights not initialized)".to_owned())
}

fn check_fan_in(links: &Connections, previous: &[Unit]) -> Result<()> {
    if previous.len() != links.len() {
        return Err(Error::InvalidShape(format!(
            "previous layer has {} units, unit has {} connections",
            previous.len(),
            links.len()
        )));
    }
    Ok(())
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Activation, Error, Layer, LayerKind, Result, metrics};

/// Order of the two middle steps of the backward pass.
///
/// Both orders start by computing the output errors and end by adjusting the
/// hidden-layer weights. They differ in which output weights the hidden errors
/// are attributed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackpropOrder {
    /// Adjust the output weights, then compute hidden errors from the adjusted
    /// weights.
    #[default]
    AdjustThenAttribute,
    /// Compute hidden errors from the pre-update output weights, then adjust
    /// the output weights (textbook backpropagation).
    AttributeThenAdjust,
}

/// A fully-connected input → hidden → output network.
///
/// Besides its three layers, the network records one network-error value and
/// one hit percentage per completed training epoch.
#[derive(Debug, Clone)]
pub struct Network {
    input: Layer,
    hidden: Layer,
    output: Layer,
    error_history: Vec<f64>,
    hit_history: Vec<f64>,
}

impl Network {
    /// Create a network with the given layer sizes.
    ///
    /// Weights do not exist yet: call [`Network::init_weights`] before any
    /// propagation.
    pub fn new(input_size: usize, hidden_size: usize, output_size: usize) -> Result<Self> {
        Ok(Self {
            input: Layer::new(LayerKind::Input, input_size)?,
            hidden: Layer::new(LayerKind::Hidden, hidden_size)?,
            output: Layer::new(LayerKind::Output, output_size)?,
            error_history: Vec::new(),
            hit_history: Vec::new(),
        })
    }

    /// Assemble a network from prebuilt layers (e.g. with hand-picked weights).
    pub fn from_layers(input: Layer, hidden: Layer, output: Layer) -> Result<Self> {
        let kinds = [input.kind(), hidden.kind(), output.kind()];
        if kinds != [LayerKind::Input, LayerKind::Hidden, LayerKind::Output] {
            return Err(Error::InvalidConfig(format!(
                "layers must be input, hidden, output; got {kinds:?}"
            )));
        }
        let net = Self {
            input,
            hidden,
            output,
            error_history: Vec::new(),
            hit_history: Vec::new(),
        };
        net.ensure_initialized()?;
        Ok(net)
    }

    /// Initialize the hidden-layer and output-layer connections with weights
    /// drawn uniformly from `[low, high)`.
    ///
    /// `num_input_connections` must equal the input layer size and
    /// `num_hidden_connections` the hidden layer size.
    pub fn init_weights<R: Rng + ?Sized>(
        &mut self,
        num_input_connections: usize,
        num_hidden_connections: usize,
        low: f64,
        high: f64,
        rng: &mut R,
    ) -> Result<()> {
        if num_input_connections != self.input.len() {
            return Err(Error::InvalidConfig(format!(
                "input->hidden connection count {num_input_connections} does not match input layer size {}",
                self.input.len()
            )));
        }
        if num_hidden_connections != self.hidden.len() {
            return Err(Error::InvalidConfig(format!(
                "hidden->output connection count {num_hidden_connections} does not match hidden layer size {}",
                self.hidden.len()
            )));
        }
        crate::connections::validate_weight_range(low, high)?;

        self.hidden
            .init_weights(num_input_connections, low, high, rng)?;
        self.output
            .init_weights(num_hidden_connections, low, high, rng)?;
        Ok(())
    }

    /// [`Network::init_weights`] with a deterministic seed.
    pub fn init_weights_with_seed(&mut self, low: f64, high: f64, seed: u64) -> Result<()> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.init_weights(self.input.len(), self.hidden.len(), low, high, &mut rng)
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.input.len()
    }

    #[inline]
    pub fn hidden_size(&self) -> usize {
        self.hidden.len()
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.output.len()
    }

    #[inline]
    pub fn input_layer(&self) -> &Layer {
        &self.input
    }

    #[inline]
    pub fn hidden_layer(&self) -> &Layer {
        &self.hidden
    }

    #[inline]
    pub fn output_layer(&self) -> &Layer {
        &self.output
    }

    /// True once both computed layers have connections matching their predecessors.
    pub fn is_initialized(&self) -> bool {
        self.hidden.connection_count() == Some(self.input.len())
            && self.output.connection_count() == Some(self.hidden.len())
    }

    /// Present an attribute vector to the input layer.
    pub fn set_inputs(&mut self, attributes: &[f64]) -> Result<()> {
        self.input.set_inputs(attributes)
    }

    /// Activate the hidden layer from the input layer, then the output layer
    /// from the freshly computed hidden layer.
    pub fn forward(&mut self, hidden: Activation, output: Activation) -> Result<()> {
        self.ensure_initialized()?;
        self.hidden.activate(&self.input, hidden)?;
        self.output.activate(&self.hidden, output)?;
        Ok(())
    }

    /// Backward pass for the example currently loaded, in the default
    /// [`BackpropOrder::AdjustThenAttribute`] order:
    ///
    /// 1. output errors from `target_class`
    /// 2. output weights adjusted from the hidden outputs
    /// 3. hidden errors from the (already adjusted) output layer
    /// 4. hidden weights adjusted from the input outputs
    pub fn backward(
        &mut self,
        hidden: Activation,
        target_class: usize,
        learning_rate: f64,
        momentum: f64,
    ) -> Result<()> {
        self.backward_with_order(
            hidden,
            target_class,
            learning_rate,
            momentum,
            BackpropOrder::default(),
        )
    }

    pub fn backward_with_order(
        &mut self,
        hidden: Activation,
        target_class: usize,
        learning_rate: f64,
        momentum: f64,
        order: BackpropOrder,
    ) -> Result<()> {
        self.ensure_initialized()?;
        self.check_class(target_class)?;

        self.output.compute_output_errors(target_class)?;
        match order {
            BackpropOrder::AdjustThenAttribute => {
                self.output
                    .adjust_weights(learning_rate, momentum, &self.hidden)?;
                self.hidden.compute_hidden_errors(&self.output, hidden)?;
            }
            BackpropOrder::AttributeThenAdjust => {
                self.hidden.compute_hidden_errors(&self.output, hidden)?;
                self.output
                    .adjust_weights(learning_rate, momentum, &self.hidden)?;
            }
        }
        self.hidden
            .adjust_weights(learning_rate, momentum, &self.input)?;
        Ok(())
    }

    /// Zero every momentum term in the hidden and output layers.
    pub fn reset_momentum(&mut self) {
        self.hidden.reset_momentum();
        self.output.reset_momentum();
    }

    /// 1-based index of the output unit with the largest output.
    pub fn predicted_class(&self) -> usize {
        // Layers are never empty, so there is always a winner.
        metrics::predicted_class(self.output.units().iter().map(|u| u.output())).unwrap_or(1)
    }

    pub fn output(&self, index: usize) -> Result<f64> {
        Ok(self.output.unit(index)?.output())
    }

    pub fn output_error(&self, index: usize) -> Result<f64> {
        Ok(self.output.unit(index)?.error())
    }

    /// Sum of squared output-unit errors for the most recent backward pass.
    #[inline]
    pub fn network_error(&self) -> f64 {
        self.output.squared_error()
    }

    /// Cumulative squared network error of each completed training epoch.
    #[inline]
    pub fn error_history(&self) -> &[f64] {
        &self.error_history
    }

    /// Training hit percentage of each completed training epoch.
    #[inline]
    pub fn hit_history(&self) -> &[f64] {
        &self.hit_history
    }

    #[inline]
    pub fn epochs_run(&self) -> usize {
        self.error_history.len()
    }

    pub(crate) fn clear_history(&mut self, capacity: usize) {
        self.error_history = Vec::with_capacity(capacity);
        self.hit_history = Vec::with_capacity(capacity);
    }

    pub(crate) fn record_epoch(&mut self, network_error: f64, hit_percentage: f64) {
        self.error_history.push(network_error);
        self.hit_history.push(hit_percentage);
    }

    pub(crate) fn check_class(&self, class: usize) -> Result<()> {
        if class == 0 || class > self.output.len() {
            return Err(Error::InvalidData(format!(
                "class {class} is outside 1..={}",
                self.output.len()
            )));
        }
        Ok(())
    }

    pub(crate) fn ensure_initialized(&self) -> Result<()> {
        if !self.is_initialized() {
            return Err(Error::InvalidConfig(
                "network weights are not initialized; call init_weights first".to_owned(),
            ));
        }
        Ok(())
    }
}

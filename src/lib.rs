//! A three-layer feed-forward classifier trained with online backpropagation.
//!
//! `backprop-ann` models a fully-connected input → hidden → output network of
//! individual [`Unit`]s. Each computed unit owns a [`Connections`] bundle: one
//! weight and one momentum term per unit of the previous layer. Training is
//! online (weights move after every example) with momentum, and stops early
//! once an epoch's cumulative squared error drops to a threshold.
//!
//! # Contracts
//!
//! - Scalars are `f64`.
//! - Classes are 1-based: class `c` is represented by output unit `c - 1`.
//! - Propagation needs initialized weights ([`Network::init_weights`]); every
//!   public operation validates shapes and returns [`Result`] instead of
//!   panicking.
//! - Given the same seed, weight initialization, shuffling and therefore
//!   training are bit-for-bit reproducible.
//!
//! # Quick start
//!
//! ```rust
//! use backprop_ann::{Activation, Example, Network, TrainConfig};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! # fn main() -> backprop_ann::Result<()> {
//! let mut examples = vec![
//!     Example::new(vec![0.1, 0.2], 1),
//!     Example::new(vec![0.2, 0.1], 1),
//!     Example::new(vec![0.9, 0.8], 2),
//!     Example::new(vec![0.8, 0.9], 2),
//! ];
//!
//! let mut net = Network::new(2, 3, 2)?;
//! net.init_weights_with_seed(-1.0, 1.0, 0)?;
//!
//! let cfg = TrainConfig {
//!     num_epochs: 200,
//!     ..TrainConfig::default()
//! };
//! let mut rng = StdRng::seed_from_u64(0);
//! let report = net.train(&mut examples, &cfg, &mut rng)?;
//! assert!(!report.epochs.is_empty());
//!
//! let test = net.test(&examples, Activation::Logistic, Activation::Logistic)?;
//! assert_eq!(test.total, 4);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod config;
pub mod connections;
pub mod data;
pub mod error;
pub mod knn;
pub mod layer;
pub mod metrics;
pub mod network;
pub mod report;
pub mod train;
pub mod unit;

pub use activation::Activation;
pub use config::Config;
pub use connections::Connections;
pub use data::{Dataset, Example, LabelEncoding};
pub use error::{Error, Result};
pub use knn::NearestNeighbour;
pub use layer::{Layer, LayerKind};
pub use network::{BackpropOrder, Network};
pub use report::TracingSink;
pub use train::{EpochReport, EpochSink, TestReport, TrainConfig, TrainReport};
pub use unit::Unit;

//! A Rust implementation of robust random cut forests for scoring anomalies
//! in data streams.
//!
//! A random cut tree partitions a set of points by recursively cutting their
//! bounding box at random. Points that are easy to separate from the rest end
//! up close to the root, and the collusive displacement of a point measures
//! how much of the tree would move if the point were removed. A forest keeps
//! many trees over the same sliding window of a stream and averages the
//! displacement over all of them.
//!
//! ```
//! use rrcflib::{score_stream, Forest, ForestBuilder, NoisySine};
//!
//! // build a forest. the point dimension is fixed by the first point seen
//! let mut forest: Forest<f64> = ForestBuilder::new(20, 128)
//!     .random_seed(42)    // seed of the per-tree random generators
//!     .build()            // build forest from configuration
//!     .unwrap();
//!
//! // score a scalar stream, shingled into 4-dimensional points
//! let signal = NoisySine::new(0);
//! let scores: Vec<f64> = score_stream(signal.data.iter().copied(), &mut forest, 4)
//!     .unwrap()
//!     .map(|record| record.unwrap().score)
//!     .collect();
//! assert_eq!(scores.len(), signal.data.len() - 3);
//! ```
//!
//! ### References
//!
//! Sudipto Guha, Nina Mishra, Gourav Roy, and Okke Schrijvers. *"Robust random
//! cut forest based anomaly detection on streams."* International Conference
//! on Machine Learning, pp. 2712-2721. PMLR, 2016.

mod errors;
pub use errors::RcfError;

mod types;
pub use types::{NodeKey, PointIndex, RcfFloat, Result};

mod util;

mod store;
pub use store::NodeStore;

pub mod tree;
pub use tree::{BoundingBox, Cut, Internal, Leaf, Node, NodeTraverser, Tree};

mod shingle;
pub use shingle::{Shingle, ShingleExt, TryShingle};

mod forest;
pub use forest::{Forest, ForestBuilder};

mod shingled_forest;
pub use shingled_forest::ShingledForest;

mod stream;
pub use stream::{score_point_stream, score_stream, PointScoreStream, ScoreRecord, ScoreStream};

mod datasets;
pub use datasets::{NoisySine, NoisySineConfig};

use std::fmt::Debug;
use std::iter::Sum;

use num::Float;

use crate::errors::RcfError;

pub type Result<T> = std::result::Result<T, RcfError>;

/// Caller supplied label of a point. Forests use consecutive stream positions.
pub type PointIndex = usize;

/// Key of a node inside a tree's node store.
pub type NodeKey = usize;

/// The floating point types a tree can hold.
pub trait RcfFloat: Float + Sum + Send + Sync + Debug + 'static {}

impl RcfFloat for f32 {}
impl RcfFloat for f64 {}

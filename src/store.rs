use slab::Slab;

use crate::tree::Node;

/// A type for storing nodes by key.
pub type NodeStore<T> = Slab<Node<T>>;

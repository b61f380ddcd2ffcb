use thiserror::Error;

/// Errors that can be returned by tree, forest and shingle operations.
#[derive(Debug, Error, PartialEq)]
pub enum RcfError {
    #[error("invalid argument: {msg}")]
    InvalidArgument { msg: &'static str },

    #[error("point has {found} dimensions but the tree holds {expected}-dimensional points")]
    InvalidDimension { expected: usize, found: usize },

    #[error("index {0} is already present in the tree")]
    DuplicateIndex(usize),

    #[error("index {0} is not present in the tree")]
    KeyNotFound(usize),

    #[error("cannot score against an empty tree")]
    EmptyEnsemble,

    #[error("tree {tree} failed: {source}")]
    Tree {
        tree: usize,
        #[source]
        source: Box<RcfError>,
    },
}

impl RcfError {
    /// Wraps an error raised by the tree at position `tree` inside a forest.
    pub(crate) fn in_tree(self, tree: usize) -> Self {
        RcfError::Tree {
            tree,
            source: Box::new(self),
        }
    }
}

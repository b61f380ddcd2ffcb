use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_core::RngCore;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::errors::RcfError;
use crate::tree::Tree;
use crate::types::{PointIndex, Result};
use crate::util::{check_argument, mean};
use crate::RcfFloat;

/// Configuration for a [`Forest`].
///
/// # Examples
///
/// ```
/// use rrcflib::{Forest, ForestBuilder};
///
/// let forest: Forest<f64> = ForestBuilder::new(40, 256)
///     .random_seed(17)       // reproducible cuts in every tree
///     .parallel_enabled(true) // process trees on the rayon thread pool
///     .build()
///     .unwrap();
/// assert_eq!(forest.num_trees(), 40);
/// assert_eq!(forest.tree_size(), 256);
/// ```
#[derive(Debug, Clone)]
pub struct ForestBuilder {
    num_trees: usize,
    tree_size: usize,
    random_seed: Option<u64>,
    parallel_enabled: bool,
}

impl ForestBuilder {
    /// Start a configuration with `num_trees` trees, each holding a sliding
    /// window of `tree_size` points.
    pub fn new(num_trees: usize, tree_size: usize) -> Self {
        ForestBuilder {
            num_trees,
            tree_size,
            random_seed: None,
            parallel_enabled: false,
        }
    }

    /// Seed from which the seeds of the individual trees are derived. Without
    /// a seed the forest is seeded from system entropy.
    pub fn random_seed(mut self, random_seed: u64) -> Self {
        self.random_seed = Some(random_seed);
        self
    }

    pub fn parallel_enabled(mut self, parallel_enabled: bool) -> Self {
        self.parallel_enabled = parallel_enabled;
        self
    }

    pub fn build<T: RcfFloat>(&self) -> Result<Forest<T>> {
        check_argument(self.num_trees >= 1, "num_trees must be at least one")?;
        check_argument(self.tree_size >= 1, "tree_size must be at least one")?;

        let mut rng = match self.random_seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        let trees = (0..self.num_trees).map(|_| Tree::from_seed(rng.next_u64())).collect();
        debug!(
            num_trees = self.num_trees,
            tree_size = self.tree_size,
            parallel = self.parallel_enabled,
            "built forest"
        );

        Ok(Forest {
            trees,
            tree_size: self.tree_size,
            parallel_enabled: self.parallel_enabled,
            entries_seen: 0,
        })
    }
}

/// An ensemble of random cut trees over a shared sliding window.
///
/// Every tree receives every point. Once a tree holds `tree_size` points,
/// the point with index `index - tree_size` is forgotten before a new one is
/// inserted, so all trees agree on which indices are in the window while
/// their cuts differ. The anomaly score of a point is the mean collusive
/// displacement over all trees.
///
/// # Examples
///
/// ```
/// use rrcflib::{Forest, ForestBuilder};
///
/// let mut forest: Forest<f64> = ForestBuilder::new(10, 32).random_seed(0).build().unwrap();
/// for i in 0..100 {
///     let x = (i as f64 / 10.0).sin();
///     let score = forest.process(&[x], i).unwrap();
///     assert!((0.0..1.0).contains(&score));
/// }
/// assert!(forest.trees().iter().all(|tree| tree.size() == 32));
/// ```
pub struct Forest<T> {
    trees: Vec<Tree<T>>,
    tree_size: usize,
    parallel_enabled: bool,
    entries_seen: usize,
}

impl<T: RcfFloat> Forest<T> {
    /// Insert `point` under `index` into every tree, evicting the point that
    /// leaves the window, and return the mean collusive displacement.
    ///
    /// All trees are processed even if some of them fail. The error of the
    /// first failing tree is returned wrapped in [`RcfError::Tree`]. Once the
    /// trees have been processed the index counts as seen, whether or not a
    /// tree failed.
    pub fn process(&mut self, point: &[T], index: PointIndex) -> Result<f64> {
        self.check_point(point, index)?;

        let tree_size = self.tree_size;
        let results: Vec<Result<f64>> = if self.parallel_enabled {
            self.trees
                .par_iter_mut()
                .map(|tree| Self::process_tree(tree, point, index, tree_size))
                .collect()
        } else {
            self.trees
                .iter_mut()
                .map(|tree| Self::process_tree(tree, point, index, tree_size))
                .collect()
        };
        self.entries_seen = self.entries_seen.max(index + 1);

        let scores = Self::collect_scores(results)?;
        Ok(mean(&scores))
    }

    /// Process `point` under the next index of the stream.
    ///
    /// A point rejected before any tree is touched does not use up an index.
    /// After a tree failure the next call moves on to a fresh index, since the
    /// healthy trees already hold this one.
    pub fn update(&mut self, point: &[T]) -> Result<f64> {
        self.process(point, self.entries_seen)
    }

    fn process_tree(
        tree: &mut Tree<T>,
        point: &[T],
        index: PointIndex,
        tree_size: usize,
    ) -> Result<f64> {
        if tree.contains(index) {
            return Err(RcfError::DuplicateIndex(index));
        }
        if tree.size() >= tree_size {
            let oldest = index
                .checked_sub(tree_size)
                .ok_or(RcfError::InvalidArgument {
                    msg: "window is full but the index precedes the end of the first window",
                })?;
            tree.forget_point(oldest)?;
        }
        tree.insert_point(point.to_vec(), index)?;
        tree.codisp(index)
    }

    /// Mean collusive displacement of a point still inside the window,
    /// without changing any tree.
    pub fn codisp(&self, index: PointIndex) -> Result<f64> {
        let results: Vec<Result<f64>> =
            self.trees.iter().map(|tree| tree.codisp(index)).collect();
        let scores = Self::collect_scores(results)?;
        Ok(mean(&scores))
    }

    fn collect_scores(results: Vec<Result<f64>>) -> Result<Vec<f64>> {
        let mut scores = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (position, result) in results.into_iter().enumerate() {
            match result {
                Ok(score) => scores.push(score),
                Err(err) => {
                    warn!(tree = position, error = %err, "tree failed");
                    first_error.get_or_insert(err.in_tree(position));
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(scores),
        }
    }

    /// Validate a point against the forest as a whole so that a bad point
    /// never evicts anything from a window.
    fn check_point(&self, point: &[T], index: PointIndex) -> Result<()> {
        check_argument(index.checked_add(1).is_some(), "index must be less than usize::MAX")?;
        check_argument(!point.is_empty(), "points must have at least one dimension")?;
        check_argument(point.iter().all(|x| x.is_finite()), "point values must be finite")?;
        match self.dimensions() {
            Some(expected) if expected != point.len() => Err(RcfError::InvalidDimension {
                expected,
                found: point.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Dimensionality of the points held by the forest, if any are held.
    pub fn dimensions(&self) -> Option<usize> {
        self.trees.iter().find_map(Tree::dimensions)
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn tree_size(&self) -> usize {
        self.tree_size
    }

    pub fn is_parallel_enabled(&self) -> bool {
        self.parallel_enabled
    }

    /// One more than the largest index processed so far.
    pub fn entries_seen(&self) -> usize {
        self.entries_seen
    }

    pub fn trees(&self) -> &[Tree<T>] {
        &self.trees
    }
}

/// Renders every tree of the forest, one after the other.
impl<T: RcfFloat> fmt::Display for Forest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, tree) in self.trees.iter().enumerate() {
            writeln!(f, "Tree {}", position)?;
            write!(f, "{}", tree)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest(num_trees: usize, tree_size: usize) -> Forest<f64> {
        ForestBuilder::new(num_trees, tree_size).random_seed(3).build().unwrap()
    }

    #[test]
    fn builder_rejects_empty_configuration() {
        assert!(matches!(
            ForestBuilder::new(0, 8).build::<f64>(),
            Err(RcfError::InvalidArgument { .. })
        ));
        assert!(matches!(
            ForestBuilder::new(8, 0).build::<f64>(),
            Err(RcfError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn sliding_window_bounds() {
        let capacity = 7;
        let mut forest = forest(5, capacity);
        for i in 0..40 {
            forest.process(&[(i % 5) as f64, (i % 3) as f64], i).unwrap();
            let expected_size = (i + 1).min(capacity);
            let oldest = (i + 1).saturating_sub(capacity);
            for tree in forest.trees() {
                assert_eq!(tree.size(), expected_size);
                assert!(tree.contains(oldest));
                assert!(oldest == 0 || !tree.contains(oldest - 1));
                assert!(tree.contains(i));
            }
        }
        assert_eq!(forest.entries_seen(), 40);
    }

    #[test]
    fn bad_point_leaves_windows_untouched() {
        let mut forest = forest(3, 2);
        forest.process(&[0.0, 1.0], 0).unwrap();
        forest.process(&[1.0, 1.0], 1).unwrap();

        assert_eq!(
            forest.process(&[1.0], 2),
            Err(RcfError::InvalidDimension { expected: 2, found: 1 })
        );
        assert!(forest.trees().iter().all(|tree| tree.contains(0) && tree.size() == 2));
    }

    #[test]
    fn failing_tree_does_not_block_others() {
        let mut forest = forest(3, 4);
        for i in 0..4 {
            forest.process(&[i as f64], i).unwrap();
        }
        // knock one tree out of step with the shared window
        forest.trees[1].forget_point(0).unwrap();
        forest.trees[1].insert_point(vec![-1.0], 100).unwrap();

        let err = forest.process(&[9.0], 4).unwrap_err();
        assert_eq!(
            err,
            RcfError::Tree {
                tree: 1,
                source: Box::new(RcfError::KeyNotFound(0)),
            }
        );
        // the healthy trees still advanced their windows
        for position in [0, 2] {
            let tree = &forest.trees()[position];
            assert!(!tree.contains(0));
            assert!(tree.contains(4));
        }
    }

    #[test]
    fn update_assigns_consecutive_indices() {
        let mut forest = forest(2, 3);
        for i in 0..5 {
            forest.update(&[i as f64]).unwrap();
        }
        assert_eq!(forest.entries_seen(), 5);
        assert!(forest.trees().iter().all(|tree| tree.contains(4) && !tree.contains(1)));

        assert!(forest.codisp(4).is_ok());
        assert!(matches!(forest.codisp(0), Err(RcfError::Tree { tree: 0, .. })));
    }

    #[test]
    fn largest_index_is_rejected_untouched() {
        let mut forest = forest(2, 4);
        forest.process(&[1.0], 0).unwrap();
        assert!(matches!(
            forest.process(&[2.0], usize::MAX),
            Err(RcfError::InvalidArgument { .. })
        ));
        assert_eq!(forest.entries_seen(), 1);
        assert!(forest.trees().iter().all(|tree| tree.size() == 1));
        assert_eq!(forest.update(&[2.0]).map(|score| score >= 0.5), Ok(true));
    }

    #[test]
    fn failed_tree_still_consumes_index() {
        let mut forest = forest(2, 2);
        forest.process(&[0.0], 0).unwrap();
        forest.process(&[1.0], 1).unwrap();
        forest.trees[0].forget_point(0).unwrap();
        forest.trees[0].insert_point(vec![9.0], 50).unwrap();

        assert!(matches!(forest.update(&[2.0]), Err(RcfError::Tree { tree: 0, .. })));
        assert_eq!(forest.entries_seen(), 3);
        assert!(forest.trees()[1].contains(2));
    }

    #[test]
    fn display_lists_every_tree() {
        let mut forest = forest(2, 4);
        forest.process(&[0.0], 0).unwrap();
        forest.process(&[1.0], 1).unwrap();

        let rendered = format!("{}", forest);
        assert!(rendered.starts_with("Tree 0\n─+\n"));
        assert!(rendered.contains("Tree 1\n─+\n"));
        assert_eq!(rendered.matches("([0])").count(), 2);
        assert_eq!(rendered.matches("([1])").count(), 2);
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut sequential: Forest<f64> = ForestBuilder::new(8, 16).random_seed(9).build().unwrap();
        let mut parallel: Forest<f64> = ForestBuilder::new(8, 16)
            .random_seed(9)
            .parallel_enabled(true)
            .build()
            .unwrap();
        assert!(!sequential.is_parallel_enabled());
        assert!(parallel.is_parallel_enabled());
        for i in 0..200 {
            let point = [(i as f64 * 0.3).sin(), (i as f64 * 0.7).cos()];
            let a = sequential.process(&point, i).unwrap();
            let b = parallel.process(&point, i).unwrap();
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }
}

use std::collections::HashMap;
use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::errors::RcfError;
use crate::store::NodeStore;
use crate::tree::{BoundingBox, Cut, Internal, Leaf, Node};
use crate::types::{NodeKey, PointIndex, Result};
use crate::util::check_argument;
use crate::RcfFloat;

/// Robust random cut tree over a dynamic set of indexed points.
///
/// A random cut tree contains leaf nodes and internal nodes.
/// [`Leaf`](crate::Leaf) nodes live at the leaves of the tree and hold a data
/// point together with the indices it was inserted under.
/// [`Internal`](crate::Internal) nodes hold a [`BoundingBox`] on all of the
/// points in their subtree as well as the random [`Cut`] separating their
/// children.
///
/// Nodes live in a [`NodeStore`] arena and refer to each other by key, so
/// parent links never form reference cycles. An index table maps every
/// point index to its leaf, which makes deletion and scoring a walk from the
/// leaf up to the root.
///
/// # Examples
///
/// ```
/// use rrcflib::Tree;
///
/// let mut tree: Tree<f64> = Tree::from_seed(42);
///
/// tree.insert_point(vec![0.0, 0.0], 0).unwrap();
/// tree.insert_point(vec![0.1, 0.1], 1).unwrap();
/// tree.insert_point(vec![0.0, 0.1], 2).unwrap();
/// tree.insert_point(vec![900.0, 900.0], 3).unwrap();
/// assert_eq!(tree.size(), 4);
///
/// // the far away point sits high up in the tree
/// assert!(tree.codisp(3).unwrap() >= 0.75);
///
/// tree.forget_point(3).unwrap();
/// assert_eq!(tree.size(), 3);
/// ```
pub struct Tree<T> {
    node_store: NodeStore<T>,
    root_node: Option<NodeKey>,
    leaves: HashMap<PointIndex, NodeKey>,
    dimensions: Option<usize>,
    rng: ChaCha8Rng,
}

impl<T: RcfFloat> Default for Tree<T> {
    fn default() -> Self {
        Tree::new()
    }
}

impl<T: RcfFloat> Tree<T> {
    /// Create a new empty `Tree` whose random number generator is seeded from
    /// system entropy.
    pub fn new() -> Self {
        Tree::with_rng(ChaCha8Rng::from_entropy())
    }

    /// Create a new empty `Tree` with a seeded random number generator.
    ///
    /// Two trees built from the same seed and fed the same operations make
    /// exactly the same cuts.
    pub fn from_seed(seed: u64) -> Self {
        Tree::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(rng: ChaCha8Rng) -> Self {
        Tree {
            node_store: NodeStore::new(),
            root_node: None,
            leaves: HashMap::new(),
            dimensions: None,
            rng,
        }
    }

    /// Re-initializes the tree's random number generator with a seed.
    ///
    /// Random cut trees use the [`ChaCha8Rng`][cha] random number generator.
    /// It has fast initialization, high throughput and relatively small memory
    /// footprint.
    ///
    /// [cha]: https://rust-random.github.io/rand/rand_chacha/struct.ChaCha8Rng.html
    pub fn seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    #[inline(always)]
    pub fn root_node(&self) -> Option<NodeKey> {
        self.root_node
    }

    #[inline(always)]
    pub fn node_store(&self) -> &NodeStore<T> {
        &self.node_store
    }

    /// Returns the node stored under `key`, if any.
    pub fn node(&self, key: NodeKey) -> Option<&Node<T>> {
        self.node_store.get(key)
    }

    /// The dimensionality fixed by the first point inserted into the tree.
    /// `None` while the tree is empty.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Number of point indices currently held by the tree, duplicates
    /// included.
    pub fn size(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root_node.is_none()
    }

    /// Returns true if the tree holds a point under `index`.
    pub fn contains(&self, index: PointIndex) -> bool {
        self.leaves.contains_key(&index)
    }

    /// Returns the mass of the tree.
    ///
    /// The mass of the root node is always equal to the number of indices
    /// held by the tree.
    ///
    /// ```
    /// use rrcflib::Tree;
    ///
    /// let mut tree: Tree<f32> = Tree::from_seed(0);
    /// assert_eq!(tree.mass(), 0);
    ///
    /// tree.insert_point(vec![0.0, 0.0], 0).unwrap();
    /// tree.insert_point(vec![1.0, 1.0], 1).unwrap();
    /// tree.insert_point(vec![0.0, 0.0], 2).unwrap();
    /// assert_eq!(tree.mass(), 3);
    /// ```
    pub fn mass(&self) -> u32 {
        self.root_node.map_or(0, |key| self.get_node(key).mass())
    }

    /// The bounding box of every point in the tree.
    pub fn bounding_box(&self) -> Option<BoundingBox<T>> {
        self.root_node.map(|key| self.get_node(key).bounding_box())
    }

    /// Returns the point stored under `index`.
    pub fn point(&self, index: PointIndex) -> Option<&[T]> {
        self.leaves
            .get(&index)
            .and_then(|&key| self.get_node(key).as_leaf())
            .map(Leaf::point)
    }

    /// Iterates over the leaves of the tree in no particular order.
    pub fn leaves(&self) -> impl Iterator<Item = &Leaf<T>> + '_ {
        self.node_store.iter().filter_map(|(_, node)| node.as_leaf())
    }

    /// Returns an iterator on the nodes from the root to the leaf reached by
    /// following the cuts with a query point.
    ///
    /// Fails with [`RcfError::InvalidDimension`] if the point does not match
    /// the dimensionality of the tree. See [`NodeTraverser`] for more
    /// information.
    pub fn traverse<'a, 'p>(&'a self, point: &'p [T]) -> Result<NodeTraverser<'a, 'p, T>> {
        self.check_dimensions(point)?;
        Ok(NodeTraverser::new(self, point))
    }

    /// Finds the leaf point nearest to `point` relative to the cuts of the
    /// tree. Returns `None` for an empty tree.
    ///
    /// ```
    /// use rrcflib::Tree;
    ///
    /// let mut tree: Tree<f64> = Tree::from_seed(1);
    /// tree.insert_point(vec![0.0, 0.0], 0).unwrap();
    /// tree.insert_point(vec![10.0, 10.0], 1).unwrap();
    /// assert_eq!(tree.query(&[10.0, 12.0]).unwrap(), Some(&[10.0, 10.0][..]));
    /// ```
    pub fn query(&self, point: &[T]) -> Result<Option<&[T]>> {
        Ok(self
            .traverse(point)?
            .last()
            .and_then(Node::as_leaf)
            .map(Leaf::point))
    }

    // ########################################################################
    // Point Insertion
    // ########################################################################

    /// Insert `point` into the tree under `index`.
    ///
    /// Starting at the root, the point is merged with the bounding box at
    /// each node and a random cut is drawn on the merged box. If the cut
    /// separates the point from the node, a new internal node is spliced in
    /// above the node with the new leaf as its other child. Otherwise the
    /// insertion descends along the node's own cut. A point equal to an
    /// existing leaf only increases the mass of that leaf.
    ///
    /// Fails with [`RcfError::InvalidDimension`] if the point does not match
    /// the dimensionality of the tree and with [`RcfError::DuplicateIndex`] if
    /// `index` is already present.
    pub fn insert_point(&mut self, point: Vec<T>, index: PointIndex) -> Result<()> {
        check_argument(!point.is_empty(), "points must have at least one dimension")?;
        check_argument(point.iter().all(|x| x.is_finite()), "point values must be finite")?;
        self.check_dimensions(&point)?;
        if self.leaves.contains_key(&index) {
            return Err(RcfError::DuplicateIndex(index));
        }

        let root_key = match self.root_node {
            Some(key) => key,
            None => {
                self.dimensions = Some(point.len());
                let leaf_key = self.node_store.insert(Node::Leaf(Leaf::new(point, index)));
                self.root_node = Some(leaf_key);
                self.leaves.insert(index, leaf_key);
                debug!(index, "created root leaf");
                return Ok(());
            }
        };

        let mut node_key = root_key;
        loop {
            if let Node::Leaf(leaf) = self.get_node_mut(node_key) {
                if leaf.point() == point.as_slice() {
                    leaf.add_index(index);
                    self.leaves.insert(index, node_key);
                    self.increment_masses_upwards(node_key);
                    trace!(index, "increased mass of duplicate point");
                    return Ok(());
                }
            }

            // a point inside the node's box cannot be separated at this level
            let node = self.get_node(node_key);
            if !node.contains_point(&point) {
                let merged_box = BoundingBox::merged_box_with_point(&node.bounding_box(), &point);
                let cut = Cut::new_random_cut(&merged_box, &mut self.rng)
                    .expect("a point outside a bounding box always admits a cut");
                let (min, max) = self.get_node(node_key).range(cut.dimension());
                if cut.value() < min || max <= cut.value() {
                    self.insert_new_leaf(point, index, node_key, merged_box, cut, min);
                    trace!(index, "inserted point");
                    return Ok(());
                }
            }

            node_key = match self.get_node(node_key) {
                Node::Internal(internal) => {
                    if internal.cut().is_left_of(&point) {
                        internal.left()
                    } else {
                        internal.right()
                    }
                }
                Node::Leaf(_) => {
                    panic!("Inconsistent node: a leaf was not separated from a new point")
                }
            };
        }
    }

    /// Splice a new internal node `B` above the current node `N`, with the
    /// new leaf `P` as its other child.
    ///
    /// ```text
    ///       A                   A
    ///      / \                 / \
    ///     S   N      ==>      S   B
    ///        / \                 / \
    ///                           N   P
    /// ```
    ///
    /// The leaf goes on the left of `B` when the cut lies below the node's
    /// range and on the right otherwise. Masses and boxes of `A` and all of
    /// its ancestors grow to include the new point.
    fn insert_new_leaf(
        &mut self,
        point: Vec<T>,
        index: PointIndex,
        node_key: NodeKey,
        merged_box: BoundingBox<T>,
        cut: Cut<T>,
        min: T,
    ) {
        let parent_key = self.get_node(node_key).parent();
        let node_mass = self.get_node(node_key).mass();

        let leaf_key = self.node_store.insert(Node::Leaf(Leaf::new(point, index)));
        let (left, right) = if cut.value() < min {
            (leaf_key, node_key)
        } else {
            (node_key, leaf_key)
        };
        let merged = Internal::new(left, right, node_mass + 1, merged_box, cut);
        let mut merged_node = Node::Internal(merged);
        merged_node.set_parent(parent_key);
        let merged_key = self.node_store.insert(merged_node);

        self.get_node_mut(node_key).set_parent(Some(merged_key));
        self.get_node_mut(leaf_key).set_parent(Some(merged_key));
        match parent_key {
            Some(parent_key) => {
                self.get_internal_mut(parent_key).replace_child(node_key, merged_key)
            }
            None => self.root_node = Some(merged_key),
        }
        self.leaves.insert(index, leaf_key);

        let mut ancestor = parent_key;
        while let Some(key) = ancestor {
            let leaf_point = match self.get_node(leaf_key) {
                Node::Leaf(leaf) => leaf.point(),
                Node::Internal(_) => panic!("Inconsistent node: expected leaf"),
            };
            let internal = match self.get_node(key) {
                Node::Internal(internal) => internal,
                Node::Leaf(_) => panic!("Inconsistent node: parents cannot be leaves"),
            };
            let expanded = BoundingBox::merged_box_with_point(internal.bounding_box(), leaf_point);
            let mass = internal.mass() + 1;
            let internal = self.get_internal_mut(key);
            internal.set_bounding_box(expanded);
            internal.set_mass(mass);
            ancestor = internal.parent();
        }
    }

    fn increment_masses_upwards(&mut self, node_key: NodeKey) {
        let mut ancestor = self.get_node(node_key).parent();
        while let Some(key) = ancestor {
            let internal = self.get_internal_mut(key);
            internal.set_mass(internal.mass() + 1);
            ancestor = internal.parent();
        }
    }

    // ########################################################################
    // Point Deletion
    // ########################################################################

    /// Remove the point stored under `index` from the tree and return it.
    ///
    /// If the leaf also holds other copies of the point only its mass
    /// decreases. Otherwise the leaf and its parent are removed and the
    /// leaf's sibling takes the parent's place:
    ///
    /// ```text
    ///     A                 A
    ///    / \               / \
    ///   N   B     ==>     S   B
    ///  / \
    /// P   S
    /// ```
    ///
    /// Boxes and masses of every ancestor of `S` are then recomputed from
    /// their children. Fails with [`RcfError::KeyNotFound`] if `index` is not
    /// present.
    pub fn forget_point(&mut self, index: PointIndex) -> Result<Vec<T>> {
        let leaf_key = self.leaves.remove(&index).ok_or(RcfError::KeyNotFound(index))?;

        let (point, remaining_mass, parent_key) = match self.get_node_mut(leaf_key) {
            Node::Leaf(leaf) => {
                if !leaf.remove_index(index) {
                    panic!("Inconsistent leaf: index table points to a leaf without the index");
                }
                (leaf.point().to_vec(), leaf.mass(), leaf.parent())
            }
            Node::Internal(_) => {
                panic!("Inconsistent node: index table points to an internal node")
            }
        };

        if remaining_mass > 0 {
            self.decrement_masses_upwards(leaf_key);
            trace!(index, "decreased mass of duplicate point");
            return Ok(point);
        }

        let parent_key = match parent_key {
            Some(key) => key,
            None => {
                self.node_store.remove(leaf_key);
                self.root_node = None;
                self.dimensions = None;
                debug!(index, "removed last point, tree is empty");
                return Ok(point);
            }
        };

        let sibling_key = self.get_internal(parent_key).sibling_of(leaf_key);
        let grandparent_key = self.get_node(parent_key).parent();
        self.get_node_mut(sibling_key).set_parent(grandparent_key);
        match grandparent_key {
            Some(key) => self.get_internal_mut(key).replace_child(parent_key, sibling_key),
            None => self.root_node = Some(sibling_key),
        }
        self.node_store.remove(parent_key);
        self.node_store.remove(leaf_key);

        self.rebuild_upwards(grandparent_key);
        trace!(index, "forgot point");
        Ok(point)
    }

    fn decrement_masses_upwards(&mut self, node_key: NodeKey) {
        let mut ancestor = self.get_node(node_key).parent();
        while let Some(key) = ancestor {
            let internal = self.get_internal_mut(key);
            internal.set_mass(internal.mass() - 1);
            ancestor = internal.parent();
        }
    }

    /// Recompute the bounding box and mass of `start` and each of its
    /// ancestors from their children.
    fn rebuild_upwards(&mut self, start: Option<NodeKey>) {
        let mut ancestor = start;
        while let Some(key) = ancestor {
            let (left, right) = {
                let internal = self.get_internal(key);
                (self.get_node(internal.left()), self.get_node(internal.right()))
            };
            let merged_box =
                BoundingBox::merged_box_with_box(&left.bounding_box(), &right.bounding_box());
            let mass = left.mass() + right.mass();
            let internal = self.get_internal_mut(key);
            internal.set_bounding_box(merged_box);
            internal.set_mass(mass);
            ancestor = internal.parent();
        }
    }

    // ########################################################################
    // Scoring
    // ########################################################################

    /// Collusive displacement of the point stored under `index`.
    ///
    /// Walking from the leaf to the root, each ancestor contributes the ratio
    /// of the mass of the child off the path to its own mass. The score is the
    /// largest such ratio and lies in `[0, 1)`. A tree holding a single leaf
    /// scores `0.0`.
    ///
    /// Fails with [`RcfError::EmptyEnsemble`] on an empty tree and with
    /// [`RcfError::KeyNotFound`] if `index` is not present.
    pub fn codisp(&self, index: PointIndex) -> Result<f64> {
        let leaf_key = self.leaf_key(index)?;

        let mut score: f64 = 0.0;
        let mut node_key = leaf_key;
        while let Some(parent_key) = self.get_node(node_key).parent() {
            let parent = self.get_internal(parent_key);
            let sibling_mass = self.get_node(parent.sibling_of(node_key)).mass();
            score = score.max(sibling_mass as f64 / parent.mass() as f64);
            node_key = parent_key;
        }
        Ok(score)
    }

    /// Number of points that move up one level if the leaf holding `index`
    /// is removed: the mass of its sibling. Zero for a root leaf.
    pub fn displacement(&self, index: PointIndex) -> Result<u32> {
        let leaf_key = self.leaf_key(index)?;
        Ok(match self.get_node(leaf_key).parent() {
            Some(parent_key) => {
                let sibling_key = self.get_internal(parent_key).sibling_of(leaf_key);
                self.get_node(sibling_key).mass()
            }
            None => 0,
        })
    }

    // ########################################################################
    // Helper Functions
    // ########################################################################

    fn leaf_key(&self, index: PointIndex) -> Result<NodeKey> {
        if self.root_node.is_none() {
            return Err(RcfError::EmptyEnsemble);
        }
        self.leaves.get(&index).copied().ok_or(RcfError::KeyNotFound(index))
    }

    fn check_dimensions(&self, point: &[T]) -> Result<()> {
        match self.dimensions {
            Some(expected) if expected != point.len() => Err(RcfError::InvalidDimension {
                expected,
                found: point.len(),
            }),
            _ => Ok(()),
        }
    }

    #[inline(always)]
    fn get_node(&self, node_key: NodeKey) -> &Node<T> {
        &self.node_store[node_key]
    }

    #[inline(always)]
    fn get_node_mut(&mut self, node_key: NodeKey) -> &mut Node<T> {
        &mut self.node_store[node_key]
    }

    fn get_internal(&self, node_key: NodeKey) -> &Internal<T> {
        match self.get_node(node_key) {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("Inconsistent node: expected non-leaf node"),
        }
    }

    fn get_internal_mut(&mut self, node_key: NodeKey) -> &mut Internal<T> {
        match self.get_node_mut(node_key) {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("Inconsistent node: expected non-leaf node"),
        }
    }

    fn fmt_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        node_key: NodeKey,
        prefix: &mut String,
    ) -> fmt::Result {
        match self.get_node(node_key) {
            Node::Leaf(leaf) => writeln!(f, "({:?})", leaf.indices()),
            Node::Internal(internal) => {
                writeln!(f, "─+")?;
                let len = prefix.len();

                write!(f, "{} ├──", prefix)?;
                prefix.push_str(" │  ");
                self.fmt_node(f, internal.left(), prefix)?;
                prefix.truncate(len);

                write!(f, "{} └──", prefix)?;
                prefix.push_str("    ");
                self.fmt_node(f, internal.right(), prefix)?;
                prefix.truncate(len);
                Ok(())
            }
        }
    }
}

/// Renders the tree sideways, one leaf per line with its indices.
///
/// ```text
/// ─+
///  ├──([0])
///  └───+
///      ├──([1, 2])
///      └──([3])
/// ```
impl<T: RcfFloat> fmt::Display for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root_node {
            Some(root_key) => self.fmt_node(f, root_key, &mut String::new()),
            None => Ok(()),
        }
    }
}

/// A type for traversing nodes from root to the nearest leaf.
///
/// Given an input data point/vector, this type traces the path from the root
/// node of a tree to the leaf node which is approximately closest to the
/// query in the L1-norm, relative to the random cuts chosen in the tree.
/// Returned by [`Tree::traverse`].
pub struct NodeTraverser<'a, 'p, T> {
    tree: &'a Tree<T>,
    point: &'p [T],
    current_node_key: Option<NodeKey>,
}

impl<'a, 'p, T: RcfFloat> NodeTraverser<'a, 'p, T> {
    fn new(tree: &'a Tree<T>, point: &'p [T]) -> Self {
        NodeTraverser {
            tree,
            point,
            current_node_key: tree.root_node(),
        }
    }

    fn next_node_key(&self, node: &Node<T>) -> Option<NodeKey> {
        match node {
            Node::Leaf(_) => None,
            Node::Internal(node) => {
                if node.cut().is_left_of(self.point) {
                    Some(node.left())
                } else {
                    Some(node.right())
                }
            }
        }
    }
}

impl<'a, 'p, T: RcfFloat> Iterator for NodeTraverser<'a, 'p, T> {
    type Item = &'a Node<T>;

    fn next(&mut self) -> Option<&'a Node<T>> {
        let node = self.tree.node(self.current_node_key?)?;
        self.current_node_key = self.next_node_key(node);
        Some(node)
    }
}

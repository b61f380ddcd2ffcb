use super::BoundingBox;
use super::Cut;
use crate::types::{NodeKey, PointIndex};
use crate::RcfFloat;

/// A leaf node in a random cut tree.
///
/// A leaf owns one distinct point together with every index that was
/// inserted with exactly that point. The mass of a leaf is the number of
/// such indices.
///
/// # Examples
///
/// ```
/// use rrcflib::Leaf;
///
/// let leaf = Leaf::new(vec![1.0, 2.0, 3.0], 17);
/// assert_eq!(leaf.point(), &[1.0, 2.0, 3.0]);
/// assert_eq!(leaf.indices(), &[17]);
/// assert!(leaf.parent().is_none());
/// assert_eq!(leaf.mass(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf<T> {
    parent: Option<NodeKey>,
    point: Vec<T>,
    indices: Vec<PointIndex>,
}

impl<T> Leaf<T> {
    /// Create a new leaf node with mass one and no parent.
    pub fn new(point: Vec<T>, index: PointIndex) -> Self {
        Leaf {
            parent: None,
            point,
            indices: vec![index],
        }
    }

    /// Returns the key of the parent [`Internal`] node.
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Returns the point represented by this leaf node.
    pub fn point(&self) -> &[T] {
        &self.point
    }

    /// Returns the indices of every copy of the point held by this leaf, in
    /// insertion order.
    pub fn indices(&self) -> &[PointIndex] {
        &self.indices
    }

    /// Returns the mass of this leaf node.
    pub fn mass(&self) -> u32 {
        self.indices.len() as u32
    }

    pub(crate) fn add_index(&mut self, index: PointIndex) {
        self.indices.push(index);
    }

    /// Removes `index` from the leaf. Returns false if the leaf did not hold it.
    pub(crate) fn remove_index(&mut self, index: PointIndex) -> bool {
        match self.indices.iter().position(|&i| i == index) {
            Some(position) => {
                self.indices.remove(position);
                true
            }
            None => false,
        }
    }
}

/// An internal node in a random cut tree.
///
/// Internal nodes contain node keys to their left and right children, which
/// must exist. They also own a bounding box on the points contained below
/// this node as well as the cut separating the left and right children.
#[derive(Debug, Clone, PartialEq)]
pub struct Internal<T> {
    parent: Option<NodeKey>,
    left: NodeKey,
    right: NodeKey,
    mass: u32,
    bounding_box: BoundingBox<T>,
    cut: Cut<T>,
}

impl<T> Internal<T> {
    /// Create a new internal node.
    ///
    /// The mass must equal the sum of the masses of both children.
    pub fn new(
        left: NodeKey,
        right: NodeKey,
        mass: u32,
        bounding_box: BoundingBox<T>,
        cut: Cut<T>,
    ) -> Self {
        Internal {
            parent: None,
            left,
            right,
            mass,
            bounding_box,
            cut,
        }
    }

    /// Returns the key of the parent [`Internal`] node.
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Returns the node key of the left child.
    pub fn left(&self) -> NodeKey {
        self.left
    }

    /// Returns the node key of the right child.
    pub fn right(&self) -> NodeKey {
        self.right
    }

    /// Returns a reference to this node's bounding box.
    pub fn bounding_box(&self) -> &BoundingBox<T> {
        &self.bounding_box
    }

    /// Returns a reference to this node's random cut.
    pub fn cut(&self) -> &Cut<T> {
        &self.cut
    }

    /// Returns the mass of this internal node.
    pub fn mass(&self) -> u32 {
        self.mass
    }

    /// Returns the child that is not `child`.
    ///
    /// # Panics
    ///
    /// If `child` is not a child of this node.
    pub fn sibling_of(&self, child: NodeKey) -> NodeKey {
        if self.left == child {
            self.right
        } else if self.right == child {
            self.left
        } else {
            panic!("Inconsistent node: parent does not have node as a child")
        }
    }

    pub(crate) fn replace_child(&mut self, old: NodeKey, new: NodeKey) {
        if self.left == old {
            self.left = new;
        } else if self.right == old {
            self.right = new;
        } else {
            panic!("Inconsistent node: broken parent-child relationship")
        }
    }

    pub(crate) fn set_bounding_box(&mut self, bounding_box: BoundingBox<T>) {
        self.bounding_box = bounding_box;
    }

    pub(crate) fn set_mass(&mut self, mass: u32) {
        self.mass = mass;
    }
}

/// An enum type representing either an [`Internal`] node or a [`Leaf`] node.
///
/// The methods defined for this enum type are mainly for convenience in working
/// agnostically with either leaves or internal nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Node<T> {
    Leaf(Leaf<T>),
    Internal(Internal<T>),
}

impl<T: RcfFloat> Node<T> {
    /// Returns the key of the parent [`Internal`] node.
    pub fn parent(&self) -> Option<NodeKey> {
        match self {
            Node::Leaf(n) => n.parent,
            Node::Internal(n) => n.parent,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeKey>) {
        match self {
            Node::Leaf(n) => n.parent = parent,
            Node::Internal(n) => n.parent = parent,
        }
    }

    /// Returns the mass of this node: the number of points below it.
    pub fn mass(&self) -> u32 {
        match self {
            Node::Leaf(n) => n.mass(),
            Node::Internal(n) => n.mass,
        }
    }

    /// Returns the bounding box of the points below this node. A leaf has the
    /// zero-volume box around its point.
    pub fn bounding_box(&self) -> BoundingBox<T> {
        match self {
            Node::Leaf(n) => BoundingBox::new_from_point(&n.point),
            Node::Internal(n) => n.bounding_box.clone(),
        }
    }

    /// Returns true if `point` lies inside the bounding box of this node.
    pub fn contains_point(&self, point: &[T]) -> bool {
        match self {
            Node::Leaf(n) => n.point.as_slice() == point,
            Node::Internal(n) => n.bounding_box.contains_point(point),
        }
    }

    /// The `(min, max)` extent of this node along one dimension.
    pub fn range(&self, dimension: usize) -> (T, T) {
        match self {
            Node::Leaf(n) => (n.point[dimension], n.point[dimension]),
            Node::Internal(n) => n.bounding_box.range(dimension),
        }
    }

    /// Get a reference to the leaf represented by this node.
    pub fn as_leaf(&self) -> Option<&Leaf<T>> {
        match self {
            Node::Leaf(n) => Some(n),
            Node::Internal(_) => None,
        }
    }

    /// Get a reference to the internal node represented by this node.
    pub fn as_internal(&self) -> Option<&Internal<T>> {
        match self {
            Node::Leaf(_) => None,
            Node::Internal(n) => Some(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_mass_tracks_indices() {
        let mut leaf = Leaf::new(vec![0.0f64], 3);
        leaf.add_index(8);
        assert_eq!(leaf.mass(), 2);
        assert!(leaf.remove_index(3));
        assert!(!leaf.remove_index(3));
        assert_eq!(leaf.indices(), &[8]);
        assert_eq!(leaf.mass(), 1);
    }

    #[test]
    fn internal_sibling_and_child_replacement() {
        let bbox = BoundingBox::new(&[0.0f64], &[1.0]);
        let mut node = Internal::new(4, 9, 2, bbox, Cut::new(0, 0.5));
        assert_eq!(node.sibling_of(4), 9);
        assert_eq!(node.sibling_of(9), 4);

        node.replace_child(9, 11);
        assert_eq!(node.right(), 11);
        assert_eq!(node.sibling_of(4), 11);
    }

    #[test]
    fn leaf_box_has_no_volume() {
        let node: Node<f64> = Node::Leaf(Leaf::new(vec![2.0, -1.0], 0));
        let bbox = node.bounding_box();
        assert_eq!(bbox.range_sum(), 0.0);
        assert_eq!(node.range(1), (-1.0, -1.0));
        assert!(node.contains_point(&[2.0, -1.0]));
        assert!(!node.contains_point(&[2.0, -1.5]));
    }
}

use rand::Rng;

use crate::tree::BoundingBox;
use crate::RcfFloat;

/// Hyperplane cut inside a bounding box.
///
/// A cut consists of a `dimension` and a `value`. The dimension is the axis
/// the normal vector of the cut points along, using zero-based indexing. The
/// value of the cut is the location along that axis.
///
/// A point lies to the left of a cut when its component in the cut dimension
/// is less than or equal to the cut value, and to the right otherwise.
///
/// # Examples
///
/// ```
/// use rrcflib::{BoundingBox, Cut};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let cut = Cut::new(1, 0.0);
/// assert!(cut.is_left_of(&[1.0, -1.0]));
/// assert!(!cut.is_left_of(&[1.0, 2.0, 3.0, 4.0]));
///
/// // generate a random cut inside a bounding box
/// let bbox = BoundingBox::new(&[0.0, 0.0, 0.0], &[2.0, 3.0, 4.0]);
/// let mut rng = ChaCha8Rng::seed_from_u64(42);
/// let random_cut = Cut::new_random_cut(&bbox, &mut rng).unwrap();
///
/// let (min, max) = bbox.range(random_cut.dimension());
/// assert!(min <= random_cut.value() && random_cut.value() < max);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cut<T> {
    dimension: usize,
    value: T,
}

impl<T: RcfFloat> Cut<T> {
    /// Create a new cut from a given dimension and value.
    pub fn new(dimension: usize, value: T) -> Self {
        Cut { dimension, value }
    }

    /// Returns a random cut inside a bounding box, or `None` if the box has
    /// no extent in any dimension.
    ///
    /// The dimension is chosen with probability proportional to its extent
    /// and the value is uniform along that extent. The value always lies in
    /// the half-open range `[min, max)` of the chosen dimension: a draw that
    /// rounds onto the upper face is moved to the lower face.
    pub fn new_random_cut<R: Rng>(bounding_box: &BoundingBox<T>, rng: &mut R) -> Option<Self> {
        let range_sum = bounding_box.range_sum();
        if !(range_sum > T::zero()) {
            return None;
        }

        let random = T::from(rng.gen::<f64>()).unwrap_or_else(T::zero);
        let mut break_point = random * range_sum;
        let mut last_positive = None;

        for dimension in 0..bounding_box.dimensions() {
            let (min, max) = bounding_box.range(dimension);
            let range = max - min;
            if range <= T::zero() {
                continue;
            }
            last_positive = Some(dimension);
            if break_point < range {
                return Some(Cut::new(dimension, Self::clamp_below(min, min + break_point, max)));
            }
            break_point = break_point - range;
        }

        // accumulated rounding pushed the break point past the final extent
        last_positive.map(|dimension| {
            let (min, _) = bounding_box.range(dimension);
            Cut::new(dimension, min)
        })
    }

    fn clamp_below(min: T, value: T, max: T) -> T {
        if value < max {
            value
        } else {
            min
        }
    }

    /// Returns true if `point` is to the left of this cut.
    #[inline(always)]
    pub fn is_left_of(&self, point: &[T]) -> bool {
        point[self.dimension] <= self.value
    }

    /// Get the dimension of the cut.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get the value of the cut.
    pub fn value(&self) -> T {
        self.value
    }
}

use std::fmt;

use num::Zero;

use crate::RcfFloat;

/// Bounding box on collections on points.
///
/// Given a set of *d*-dimensional points, a bounding box is the smallest *d*-
/// dimensional rectangular prism containing all of these points. A bounding box
/// is represented by two vectors: the per-dimension minimum and maximum. The
/// sum of the per-dimension extents is cached since every random cut needs it.
///
/// # Examples
///
/// ```
/// use rrcflib::BoundingBox;
///
/// // create a new bounding box from a single point
/// let point: Vec<f64> = vec![1.0, 2.0];
/// let bbox = BoundingBox::new_from_point(&point);
/// assert_eq!(bbox.min_values(), &point[..]);
/// assert_eq!(bbox.max_values(), &point[..]);
///
/// // merge the first box with another point
/// let new_point = vec![3.0, -2.0];
/// let merged_bbox = BoundingBox::merged_box_with_point(&bbox, &new_point);
/// assert_eq!(format!("{}", merged_bbox), "BoundingBox ([1.0, -2.0], [3.0, 2.0])");
///
/// assert!(merged_bbox.contains_point(&point));
/// assert!(merged_bbox.contains_point(&new_point));
/// assert!(merged_bbox.contains_box(&bbox));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox<T> {
    min_values: Vec<T>,
    max_values: Vec<T>,
    range_sum: T,
}

impl<T: RcfFloat> BoundingBox<T> {
    /// Create a new bounding box from a min values vector and a max values
    /// vector.
    ///
    /// ```
    /// use rrcflib::BoundingBox;
    ///
    /// let bbox = BoundingBox::new(&[-1.0, 0.0], &[1.0, 3.0]);
    /// assert_eq!(bbox.dimensions(), 2);
    /// assert_eq!(bbox.range_sum(), 5.0);
    /// ```
    pub fn new(min_values: &[T], max_values: &[T]) -> Self {
        assert_eq!(min_values.len(), max_values.len());

        BoundingBox {
            min_values: min_values.to_vec(),
            max_values: max_values.to_vec(),
            range_sum: Self::compute_range_sum(min_values, max_values),
        }
    }

    /// Create a new bounding box from a single point.
    ///
    /// The resulting bounding box has no interior: its min values are equal to
    /// its max values. Therefore, its range sum is zero.
    pub fn new_from_point(point: &[T]) -> Self {
        BoundingBox {
            min_values: point.to_vec(),
            max_values: point.to_vec(),
            range_sum: Zero::zero(),
        }
    }

    /// Returns a new bounding box given by the merging of a bounding box with
    /// a point.
    ///
    /// If the point lies inside the bounding box then this returns a copy of
    /// the same bounding box.
    pub fn merged_box_with_point(bounding_box: &BoundingBox<T>, point: &[T]) -> Self {
        let min_values: Vec<T> = bounding_box
            .min_values
            .iter()
            .zip(point)
            .map(|(&x, &y)| x.min(y))
            .collect();
        let max_values: Vec<T> = bounding_box
            .max_values
            .iter()
            .zip(point)
            .map(|(&x, &y)| x.max(y))
            .collect();

        let range_sum = Self::compute_range_sum(&min_values, &max_values);
        BoundingBox {
            min_values,
            max_values,
            range_sum,
        }
    }

    /// Returns a new bounding box given by the merging of two bounding boxes.
    ///
    /// ```
    /// use rrcflib::BoundingBox;
    ///
    /// let bbox1 = BoundingBox::new(&[0.0, 0.0], &[2.0, 2.0]);
    /// let bbox2 = BoundingBox::new(&[1.0, 1.0], &[3.0, 4.0]);
    ///
    /// let merged = BoundingBox::merged_box_with_box(&bbox1, &bbox2);
    /// assert_eq!(merged.min_values(), &[0.0, 0.0]);
    /// assert_eq!(merged.max_values(), &[3.0, 4.0]);
    /// assert_eq!(merged.range_sum(), 7.0);
    /// ```
    pub fn merged_box_with_box(
        bounding_box1: &BoundingBox<T>,
        bounding_box2: &BoundingBox<T>,
    ) -> Self {
        let min_values: Vec<T> = bounding_box1
            .min_values
            .iter()
            .zip(&bounding_box2.min_values)
            .map(|(&x, &y)| x.min(y))
            .collect();
        let max_values: Vec<T> = bounding_box1
            .max_values
            .iter()
            .zip(&bounding_box2.max_values)
            .map(|(&x, &y)| x.max(y))
            .collect();

        let range_sum = Self::compute_range_sum(&min_values, &max_values);
        BoundingBox {
            min_values,
            max_values,
            range_sum,
        }
    }

    /// Get the dimensionality of the bounding box.
    pub fn dimensions(&self) -> usize {
        self.min_values.len()
    }

    /// Get the vector of min values of the bounding box.
    pub fn min_values(&self) -> &[T] {
        &self.min_values
    }

    /// Get the vector of max values of the bounding box.
    pub fn max_values(&self) -> &[T] {
        &self.max_values
    }

    /// Get the sum across all dimensions of lengths of the bounding box.
    pub fn range_sum(&self) -> T {
        self.range_sum
    }

    /// The `(min, max)` extent of the box along one dimension.
    pub fn range(&self, dimension: usize) -> (T, T) {
        (self.min_values[dimension], self.max_values[dimension])
    }

    /// Returns true if the given point is contained inside the bounding box.
    pub fn contains_point(&self, point: &[T]) -> bool {
        self.min_values
            .iter()
            .zip(&self.max_values)
            .zip(point)
            .all(|((&min, &max), &x)| min <= x && x <= max)
    }

    /// Returns true if the given bounding box is contained inside this
    /// bounding box.
    pub fn contains_box(&self, bounding_box: &BoundingBox<T>) -> bool {
        (0..self.dimensions()).all(|i| {
            self.min_values[i] <= bounding_box.min_values[i]
                && bounding_box.max_values[i] <= self.max_values[i]
        })
    }

    /// Compute the range sum from a pair of min/max value vectors.
    ///
    /// The range sum is the sum of the differences between the min values and
    /// max values of the bounding box across each component. For example, if
    /// the min values are `[a, b]` and the max values are `[c, d]` then the
    /// range sum is equal to `(c - a) + (d - b)`.
    pub fn compute_range_sum(min_values: &[T], max_values: &[T]) -> T {
        assert_eq!(min_values.len(), max_values.len());
        min_values
            .iter()
            .zip(max_values)
            .map(|(&min, &max)| max - min)
            .sum()
    }
}

impl<T> fmt::Display for BoundingBox<T>
where
    T: RcfFloat,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundingBox ({:?}, {:?})", self.min_values, self.max_values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_sum_is_cached_on_merge() {
        let bbox = BoundingBox::new_from_point(&[1.0f64, 2.0]);
        assert_eq!(bbox.range_sum(), 0.0);

        let merged = BoundingBox::merged_box_with_point(&bbox, &[3.0, -2.0]);
        assert_eq!(merged.range_sum(), 6.0);
        assert_eq!(merged.range(1), (-2.0, 2.0));
    }

    #[test]
    fn merging_contained_point_is_identity() {
        let bbox = BoundingBox::new(&[0.0f32, 0.0], &[1.0, 1.0]);
        let merged = BoundingBox::merged_box_with_point(&bbox, &[0.5, 0.5]);
        assert_eq!(merged, bbox);
    }

    #[test]
    fn contains_box_is_inclusive() {
        let outer = BoundingBox::new(&[0.0f64, 0.0], &[8.0, 8.0]);
        let edge = BoundingBox::new(&[0.0, 1.0], &[8.0, 3.0]);
        let outside = BoundingBox::new(&[4.0, 6.0], &[9.0, 7.0]);
        assert!(outer.contains_box(&edge));
        assert!(!outer.contains_box(&outside));
    }
}

use crate::forest::Forest;
use crate::shingle::PointShingler;
use crate::types::Result;
use crate::RcfFloat;

/// A [`Forest`] fed one scalar or one input vector at a time.
///
/// The last `shingle_size` inputs, flattened oldest first, form the point
/// handed to the forest. Every input must have the dimension of the first
/// one. The forest index of a shingle is the number of shingles before it,
/// so the first complete shingle has index zero.
///
/// # Examples
///
/// ```
/// use rrcflib::{ForestBuilder, ShingledForest};
///
/// let forest = ForestBuilder::new(4, 16).random_seed(1).build().unwrap();
/// let mut shingled = ShingledForest::new(forest, 3).unwrap();
///
/// assert_eq!(shingled.add_value(1.0).unwrap(), None);
/// assert_eq!(shingled.add_value(2.0).unwrap(), None);
/// assert!(shingled.add_value(3.0).unwrap().is_some());
/// assert_eq!(shingled.forest().entries_seen(), 1);
/// ```
pub struct ShingledForest<T> {
    forest: Forest<T>,
    shingler: PointShingler<T>,
}

impl<T: RcfFloat> ShingledForest<T> {
    /// Fails with `InvalidArgument` if `shingle_size` is zero.
    pub fn new(forest: Forest<T>, shingle_size: usize) -> Result<Self> {
        Ok(ShingledForest {
            forest,
            shingler: PointShingler::new(shingle_size)?,
        })
    }

    /// Push a value and score the shingle it completes. Returns `None` while
    /// the first shingle is still filling.
    pub fn add_value(&mut self, value: T) -> Result<Option<f64>> {
        self.add_point(&[value])
    }

    /// Push an input vector and score the shingle it completes.
    ///
    /// Fails with [`RcfError::InvalidDimension`](crate::RcfError) if the
    /// input does not match the dimension of earlier inputs. A rejected input
    /// does not enter the shingle.
    pub fn add_point(&mut self, input: &[T]) -> Result<Option<f64>> {
        match self.shingler.push(input)? {
            Some(point) => self.forest.update(&point).map(Some),
            None => Ok(None),
        }
    }

    pub fn shingle_size(&self) -> usize {
        self.shingler.size()
    }

    /// Dimension of the input vectors, fixed by the first input.
    pub fn input_dimensions(&self) -> Option<usize> {
        self.shingler.input_dimensions()
    }

    pub fn forest(&self) -> &Forest<T> {
        &self.forest
    }

    pub fn into_forest(self) -> Forest<T> {
        self.forest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RcfError;
    use crate::forest::ForestBuilder;

    #[test]
    fn scores_start_after_first_shingle() {
        let forest: Forest<f64> = ForestBuilder::new(3, 8).random_seed(5).build().unwrap();
        let mut shingled = ShingledForest::new(forest, 4).unwrap();
        let scores: Vec<Option<f64>> =
            (0..10).map(|i| shingled.add_value(i as f64).unwrap()).collect();

        assert!(scores[..3].iter().all(Option::is_none));
        assert!(scores[3..].iter().all(Option::is_some));
        assert_eq!(shingled.forest().entries_seen(), 7);
        assert_eq!(shingled.forest().dimensions(), Some(4));
        assert_eq!(shingled.shingle_size(), 4);
    }

    #[test]
    fn vector_inputs_are_flattened() {
        let forest: Forest<f64> = ForestBuilder::new(3, 8).random_seed(5).build().unwrap();
        let mut shingled = ShingledForest::new(forest, 3).unwrap();
        for i in 0..6 {
            let score = shingled.add_point(&[i as f64, -(i as f64)]).unwrap();
            assert_eq!(score.is_some(), i >= 2);
        }
        assert_eq!(shingled.input_dimensions(), Some(2));
        assert_eq!(
            shingled.add_point(&[1.0]),
            Err(RcfError::InvalidDimension { expected: 2, found: 1 })
        );

        let forest = shingled.into_forest();
        assert_eq!(forest.dimensions(), Some(6));
        assert_eq!(forest.entries_seen(), 4);
        let newest = forest.trees()[0].point(3).unwrap();
        assert_eq!(newest, &[3.0, -3.0, 4.0, -4.0, 5.0, -5.0]);
    }

    #[test]
    fn zero_shingle_size_is_rejected() {
        let forest: Forest<f32> = ForestBuilder::new(1, 8).build().unwrap();
        assert!(matches!(
            ShingledForest::new(forest, 0),
            Err(RcfError::InvalidArgument { .. })
        ));
    }
}

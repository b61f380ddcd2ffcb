use crate::forest::Forest;
use crate::shingle::{PointShingler, Shingle};
use crate::types::{PointIndex, Result};
use crate::RcfFloat;

/// Score of one shingle of a stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRecord<T> {
    /// Forest index the shingle was processed under.
    pub index: PointIndex,
    /// The newest input in the shingle.
    pub value: T,
    pub score: f64,
}

/// Lazily score a scalar stream with `forest`.
///
/// Values are shingled with windows of `shingle_size` and every shingle is
/// processed under the next index of the forest. Nothing is consumed until
/// the returned iterator is advanced, and dropping it early leaves the forest
/// holding everything processed so far.
///
/// # Examples
///
/// ```
/// use rrcflib::{score_stream, Forest, ForestBuilder};
///
/// let mut forest: Forest<f64> = ForestBuilder::new(5, 32).random_seed(2).build().unwrap();
/// let values = (0..50).map(|i| (i as f64 / 4.0).sin());
///
/// let records: Vec<_> = score_stream(values, &mut forest, 2)
///     .unwrap()
///     .take(10)
///     .collect::<Result<_, _>>()
///     .unwrap();
///
/// assert_eq!(records.len(), 10);
/// assert_eq!(records[0].index, 0);
/// assert_eq!(forest.entries_seen(), 10);
/// ```
pub fn score_stream<I, T>(
    values: I,
    forest: &mut Forest<T>,
    shingle_size: usize,
) -> Result<ScoreStream<'_, I::IntoIter, T>>
where
    I: IntoIterator<Item = T>,
    T: RcfFloat,
{
    Ok(ScoreStream {
        shingles: Shingle::new(values.into_iter(), shingle_size)?,
        forest,
    })
}

/// Iterator returned by [`score_stream`].
pub struct ScoreStream<'a, I, T> {
    shingles: Shingle<I, T>,
    forest: &'a mut Forest<T>,
}

impl<'a, I, T> Iterator for ScoreStream<'a, I, T>
where
    I: Iterator<Item = T>,
    T: RcfFloat,
{
    type Item = Result<ScoreRecord<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let point = self.shingles.next()?;
        let index = self.forest.entries_seen();
        let value = *point.last()?;
        let record = self
            .forest
            .process(&point, index)
            .map(|score| ScoreRecord { index, value, score });
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.shingles.size_hint()
    }
}

/// Lazily score a stream of input vectors with `forest`.
///
/// The last `shingle_size` inputs are flattened oldest first into one point,
/// so a stream of `d`-dimensional inputs produces `shingle_size * d`
/// dimensional points. Every input must have the dimension of the first one.
/// An input that is rejected yields an error record and does not enter the
/// shingle, and the stream carries on with the next input.
///
/// # Examples
///
/// ```
/// use rrcflib::{score_point_stream, Forest, ForestBuilder};
///
/// let mut forest: Forest<f64> = ForestBuilder::new(5, 32).random_seed(2).build().unwrap();
/// let inputs = (0..20).map(|i| [i as f64, (i % 3) as f64]);
///
/// let records: Vec<_> = score_point_stream(inputs, &mut forest, 2)
///     .unwrap()
///     .collect::<Result<_, _>>()
///     .unwrap();
///
/// assert_eq!(records.len(), 19);
/// assert_eq!(records[0].value, vec![1.0, 1.0]);
/// assert_eq!(forest.dimensions(), Some(4));
/// ```
pub fn score_point_stream<I, P, T>(
    inputs: I,
    forest: &mut Forest<T>,
    shingle_size: usize,
) -> Result<PointScoreStream<'_, I::IntoIter, T>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<[T]>,
    T: RcfFloat,
{
    Ok(PointScoreStream {
        inputs: inputs.into_iter(),
        shingler: PointShingler::new(shingle_size)?,
        forest,
    })
}

/// Iterator returned by [`score_point_stream`].
pub struct PointScoreStream<'a, I, T> {
    inputs: I,
    shingler: PointShingler<T>,
    forest: &'a mut Forest<T>,
}

impl<'a, I, P, T> Iterator for PointScoreStream<'a, I, T>
where
    I: Iterator<Item = P>,
    P: AsRef<[T]>,
    T: RcfFloat,
{
    type Item = Result<ScoreRecord<Vec<T>>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let input = self.inputs.next()?;
            let input = input.as_ref();
            let point = match self.shingler.push(input) {
                Ok(Some(point)) => point,
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            };
            let index = self.forest.entries_seen();
            let record = self.forest.process(&point, index).map(|score| ScoreRecord {
                index,
                value: input.to_vec(),
                score,
            });
            return Some(record);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inputs.size_hint().1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RcfError;
    use crate::forest::ForestBuilder;

    #[test]
    fn records_carry_newest_value() {
        let mut forest: Forest<f64> = ForestBuilder::new(2, 16).random_seed(8).build().unwrap();
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let records: Vec<ScoreRecord<f64>> = score_stream(values, &mut forest, 3)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        let indices: Vec<usize> = records.iter().map(|r| r.index).collect();
        let values: Vec<f64> = records.iter().map(|r| r.value).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(values, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn stopping_early_keeps_forest_usable() {
        let mut forest: Forest<f64> = ForestBuilder::new(2, 4).random_seed(8).build().unwrap();
        let taken = score_stream((0..).map(|i| i as f64), &mut forest, 1).unwrap().take(6).count();
        assert_eq!(taken, 6);
        assert_eq!(forest.entries_seen(), 6);
        assert!(forest.trees().iter().all(|tree| tree.size() == 4));

        // a second stream continues the index sequence
        let next = score_stream(vec![1.0], &mut forest, 1).unwrap().next().unwrap().unwrap();
        assert_eq!(next.index, 6);
    }

    #[test]
    fn vector_stream_flattens_shingles() {
        let mut forest: Forest<f64> = ForestBuilder::new(2, 16).random_seed(8).build().unwrap();
        let inputs = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0], vec![5.0, 6.0]];
        let results: Vec<Result<ScoreRecord<Vec<f64>>>> =
            score_point_stream(inputs, &mut forest, 2).unwrap().collect();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().map(|r| r.index), Ok(0));
        assert_eq!(
            results[1],
            Err(RcfError::InvalidDimension { expected: 2, found: 1 })
        );
        let last = results[2].as_ref().unwrap();
        assert_eq!((last.index, last.value.as_slice()), (1, &[5.0, 6.0][..]));
        assert_eq!(forest.trees()[1].point(1), Some(&[3.0, 4.0, 5.0, 6.0][..]));
    }

    #[test]
    fn errors_are_reported_per_record() {
        let mut forest: Forest<f64> = ForestBuilder::new(2, 4).random_seed(8).build().unwrap();
        let values = vec![0.0, f64::NAN, 1.0];
        let results: Vec<Result<ScoreRecord<f64>>> =
            score_stream(values, &mut forest, 1).unwrap().collect();
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(RcfError::InvalidArgument { .. })));
        assert_eq!(results[2].as_ref().map(|r| r.index), Ok(1));
    }
}

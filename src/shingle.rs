//! Sliding window transform from a scalar stream to overlapping vectors.
//!
//! A shingle of size `k` over the stream `x0, x1, x2, ...` is the sequence of
//! vectors `[x0 .. x(k-1)], [x1 .. xk], ...`. The first `k - 1` values only
//! fill the window; afterwards every value produces one vector.
//!
//! ```
//! use rrcflib::ShingleExt;
//!
//! let values = vec![1.0, 2.0, 3.0, 4.0];
//! let shingles: Vec<Vec<f64>> = values.into_iter().shingle(3).unwrap().collect();
//! assert_eq!(shingles, vec![vec![1.0, 2.0, 3.0], vec![2.0, 3.0, 4.0]]);
//! ```

use std::collections::VecDeque;

use crate::errors::RcfError;
use crate::types::Result;
use crate::util::check_argument;
use crate::RcfFloat;

/// The last `size` values seen, oldest first.
#[derive(Debug, Clone)]
pub(crate) struct ShingleBuffer<T> {
    size: usize,
    values: VecDeque<T>,
}

impl<T: Clone> ShingleBuffer<T> {
    pub(crate) fn new(size: usize) -> Result<Self> {
        check_argument(size >= 1, "shingle size must be at least one")?;
        Ok(ShingleBuffer {
            size,
            values: VecDeque::with_capacity(size),
        })
    }

    /// Push a value and return the full window if enough values have arrived.
    pub(crate) fn push(&mut self, value: T) -> Option<Vec<T>> {
        if self.values.len() == self.size {
            self.values.pop_front();
        }
        self.values.push_back(value);
        if self.values.len() == self.size {
            Some(self.values.iter().cloned().collect())
        } else {
            None
        }
    }

    /// Number of values still needed before the first window is complete.
    pub(crate) fn missing(&self) -> usize {
        self.size - self.values.len()
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }
}

/// Shingles of a stream of equally sized input vectors, flattened oldest
/// first into points of `size * d` values.
///
/// An input is validated before it enters the window, so a rejected input
/// never shows up in a later shingle.
#[derive(Debug, Clone)]
pub(crate) struct PointShingler<T> {
    buffer: ShingleBuffer<Vec<T>>,
    input_dimensions: Option<usize>,
}

impl<T: RcfFloat> PointShingler<T> {
    pub(crate) fn new(size: usize) -> Result<Self> {
        Ok(PointShingler {
            buffer: ShingleBuffer::new(size)?,
            input_dimensions: None,
        })
    }

    pub(crate) fn push(&mut self, input: &[T]) -> Result<Option<Vec<T>>> {
        check_argument(!input.is_empty(), "points must have at least one dimension")?;
        check_argument(input.iter().all(|x| x.is_finite()), "point values must be finite")?;
        match self.input_dimensions {
            Some(expected) if expected != input.len() => {
                return Err(RcfError::InvalidDimension {
                    expected,
                    found: input.len(),
                })
            }
            Some(_) => {}
            None => self.input_dimensions = Some(input.len()),
        }
        Ok(self.buffer.push(input.to_vec()).map(|window| window.concat()))
    }

    pub(crate) fn size(&self) -> usize {
        self.buffer.size()
    }

    pub(crate) fn input_dimensions(&self) -> Option<usize> {
        self.input_dimensions
    }
}

/// Iterator adaptor producing the shingles of an underlying iterator.
///
/// Created by [`ShingleExt::shingle`] or [`Shingle::new`]. The underlying
/// iterator is consumed exactly once.
#[derive(Debug, Clone)]
pub struct Shingle<I, T> {
    iter: I,
    buffer: ShingleBuffer<T>,
}

impl<I, T> Shingle<I, T>
where
    I: Iterator<Item = T>,
    T: Clone,
{
    /// Fails with `InvalidArgument` if `size` is zero.
    pub fn new(iter: I, size: usize) -> Result<Self> {
        Ok(Shingle {
            iter,
            buffer: ShingleBuffer::new(size)?,
        })
    }

    pub fn shingle_size(&self) -> usize {
        self.buffer.size()
    }
}

impl<I, T> Iterator for Shingle<I, T>
where
    I: Iterator<Item = T>,
    T: Clone,
{
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        loop {
            let value = self.iter.next()?;
            if let Some(shingle) = self.buffer.push(value) {
                return Some(shingle);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // the value completing the window already yields a shingle
        let missing = self.buffer.missing().saturating_sub(1);
        let (lower, upper) = self.iter.size_hint();
        (
            lower.saturating_sub(missing),
            upper.map(|upper| upper.saturating_sub(missing)),
        )
    }
}

/// Shingles of a fallible iterator.
///
/// Errors from the underlying iterator are passed through unchanged and do
/// not enter the window.
#[derive(Debug, Clone)]
pub struct TryShingle<I, T> {
    iter: I,
    buffer: ShingleBuffer<T>,
}

impl<I, T, E> Iterator for TryShingle<I, T>
where
    I: Iterator<Item = std::result::Result<T, E>>,
    T: Clone,
{
    type Item = std::result::Result<Vec<T>, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.iter.next()? {
                Ok(value) => {
                    if let Some(shingle) = self.buffer.push(value) {
                        return Some(Ok(shingle));
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Extension trait adding shingling to every iterator.
pub trait ShingleExt: Iterator + Sized {
    /// Shingle this iterator with windows of length `size`.
    fn shingle(self, size: usize) -> Result<Shingle<Self, Self::Item>>
    where
        Self::Item: Clone,
    {
        Shingle::new(self, size)
    }

    /// Shingle an iterator of `Result`s, passing errors through.
    fn try_shingle<T, E>(self, size: usize) -> Result<TryShingle<Self, T>>
    where
        Self: Iterator<Item = std::result::Result<T, E>>,
        T: Clone,
    {
        Ok(TryShingle {
            iter: self,
            buffer: ShingleBuffer::new(size)?,
        })
    }
}

impl<I: Iterator> ShingleExt for I {}

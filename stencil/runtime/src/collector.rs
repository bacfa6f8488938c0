//! Accumulators used by converters to gather multi-valued fields.

use crate::error::CapacityExceededError;

/// Gathers the elements of one collection field during import.
pub trait Collector<T> {
    /// Adds one element, failing when the collector is full.
    fn accept(&mut self, item: T) -> Result<(), CapacityExceededError>;

    /// Number of elements accepted so far.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of elements, or `None` when unbounded.
    fn capacity(&self) -> Option<usize>;

    /// Consumes the collector, yielding the elements in arrival order.
    fn finish(self) -> Vec<T>;
}

/// Accepts any number of elements.
#[derive(Debug, Clone)]
pub struct UnboundedCollector<T> {
    items: Vec<T>,
}

impl<T> UnboundedCollector<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Default for UnboundedCollector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Collector<T> for UnboundedCollector<T> {
    fn accept(&mut self, item: T) -> Result<(), CapacityExceededError> {
        self.items.push(item);
        Ok(())
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn capacity(&self) -> Option<usize> {
        None
    }

    fn finish(self) -> Vec<T> {
        self.items
    }
}

/// Accepts at most `capacity` elements.
///
/// ## Examples
///
/// ```
/// use stencil_runtime::{BoundedCollector, Collector};
///
/// let mut collector = BoundedCollector::new(2);
/// collector.accept(1).unwrap();
/// collector.accept(2).unwrap();
/// let err = collector.accept(3).unwrap_err();
/// assert_eq!((err.capacity, err.attempted), (2, 3));
/// assert_eq!(collector.finish(), vec![1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct BoundedCollector<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> BoundedCollector<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }
}

impl<T> Collector<T> for BoundedCollector<T> {
    fn accept(&mut self, item: T) -> Result<(), CapacityExceededError> {
        if self.items.len() >= self.capacity {
            return Err(CapacityExceededError {
                capacity: self.capacity,
                attempted: self.items.len() + 1,
            });
        }
        self.items.push(item);
        Ok(())
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.capacity)
    }

    fn finish(self) -> Vec<T> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill<C: Collector<u8>>(mut collector: C, count: u8) -> Result<Vec<u8>, CapacityExceededError> {
        for item in 0..count {
            collector.accept(item)?;
        }
        Ok(collector.finish())
    }

    #[test]
    fn bounded_collector_accepts_up_to_capacity() {
        assert_eq!(fill(BoundedCollector::new(3), 3).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn bounded_collector_rejects_element_past_capacity() {
        let err = fill(BoundedCollector::new(2), 3).unwrap_err();
        assert_eq!(err.capacity, 2);
        assert_eq!(err.attempted, 3);
    }

    #[test]
    fn zero_capacity_rejects_the_first_element() {
        let err = fill(BoundedCollector::new(0), 1).unwrap_err();
        assert_eq!(err.attempted, 1);
        assert!(fill(BoundedCollector::new(0), 0).unwrap().is_empty());
    }

    #[test]
    fn unbounded_collector_never_fails() {
        let collector = UnboundedCollector::new();
        assert_eq!(collector.capacity(), None);
        assert_eq!(fill(collector, 200).unwrap().len(), 200);
    }
}

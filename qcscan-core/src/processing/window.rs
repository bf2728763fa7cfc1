//! Bounded FIFO of recent frames with a middle element.

use crate::config::validate_buffer_size;
use crate::error::CoreResult;
use std::collections::VecDeque;

/// Fixed-capacity window; pushing into a full window evicts the oldest element.
#[derive(Debug, Clone)]
pub struct SlidingWindow<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> SlidingWindow<T> {
    /// Capacity must be odd and non-zero.
    pub fn new(capacity: usize) -> CoreResult<Self> {
        validate_buffer_size(capacity)?;
        Ok(Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Appends `item`, returning the evicted element when the window was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    /// Element at `round(len / 2)`, halves rounded to even.
    ///
    /// With 11 frames this is index 6, with 3 frames index 2.
    pub fn middle(&self) -> Option<&T> {
        self.items.get(middle_index(self.items.len())?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

fn middle_index(len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let index = (len as f64 / 2.0).round_ties_even() as usize;
    Some(index.min(len - 1))
}

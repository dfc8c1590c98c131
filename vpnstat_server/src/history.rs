//! Bounded history buffers for the collector's rolling charts.

use std::collections::VecDeque;

/// Capacity of every history ring.
pub const MAX_HISTORY: usize = 20;

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    dq.push_back(v);
    while dq.len() > cap {
        dq.pop_front();
    }
}

/// Fixed-capacity FIFO of values with parallel epoch-millisecond timestamps.
/// Pushing past capacity evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct HistoryRing<T> {
    values: VecDeque<T>,
    timestamps: VecDeque<i64>,
    cap: usize,
}

impl<T> Default for HistoryRing<T> {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

impl<T> HistoryRing<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(cap),
            timestamps: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn push(&mut self, value: T, at_ms: i64) {
        push_capped(&mut self.values, value, self.cap);
        push_capped(&mut self.timestamps, at_ms, self.cap);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (&T, i64)> {
        self.values.iter().zip(self.timestamps.iter().copied())
    }

    pub fn timestamps(&self) -> Vec<i64> {
        self.timestamps.iter().copied().collect()
    }
}

impl<T: Clone> HistoryRing<T> {
    pub fn values(&self) -> Vec<T> {
        self.values.iter().cloned().collect()
    }
}

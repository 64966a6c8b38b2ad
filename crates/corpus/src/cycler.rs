//! Infinite batch stream over a finite dataset.
//!
//! A [`BatchCycler`] hands out batches from a cursor over the dataset. When
//! the cursor runs dry it is rebuilt in place (reshuffled when the cycler was
//! built with [`BatchCycler::shuffled`]) and iteration continues, so callers
//! never observe end-of-data.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::CorpusError;

/// Wrap-around batch iterator.
///
/// Within one pass every element is yielded exactly once; the final batch of
/// a pass may be shorter than `batch_size`. Batches never span two passes.
pub struct BatchCycler<T> {
    items: Vec<T>,
    batch_size: usize,
    order: Vec<usize>,
    cursor: usize,
    rng: Option<StdRng>,
    rebuilds: usize,
}

impl<T: Clone> BatchCycler<T> {
    /// Cycler that visits items in their stored order on every pass.
    pub fn sequential(items: Vec<T>, batch_size: usize) -> Result<Self, CorpusError> {
        Self::build(items, batch_size, None)
    }

    /// Cycler that draws a fresh random permutation for every pass.
    pub fn shuffled(items: Vec<T>, batch_size: usize, seed: u64) -> Result<Self, CorpusError> {
        Self::build(items, batch_size, Some(StdRng::seed_from_u64(seed)))
    }

    fn build(items: Vec<T>, batch_size: usize, rng: Option<StdRng>) -> Result<Self, CorpusError> {
        if items.is_empty() {
            return Err(CorpusError::EmptyDataset(
                "cannot cycle over zero items".to_string(),
            ));
        }
        if batch_size == 0 {
            return Err(CorpusError::Config("batch_size must be > 0".to_string()));
        }
        let mut cycler = Self {
            order: (0..items.len()).collect(),
            items,
            batch_size,
            cursor: 0,
            rng,
            rebuilds: 0,
        };
        cycler.reorder();
        Ok(cycler)
    }

    fn reorder(&mut self) {
        if let Some(rng) = self.rng.as_mut() {
            self.order.shuffle(rng);
        }
    }

    /// Next batch, rebuilding the cursor first if the current pass is spent.
    pub fn next_batch(&mut self) -> Vec<T> {
        if self.cursor >= self.order.len() {
            self.reorder();
            self.cursor = 0;
            self.rebuilds += 1;
            tracing::debug!(
                pass = self.rebuilds + 1,
                shuffled = self.rng.is_some(),
                "Batch cursor exhausted, starting new pass"
            );
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let batch = self.order[self.cursor..end]
            .iter()
            .map(|&i| self.items[i].clone())
            .collect();
        self.cursor = end;
        batch
    }

    /// Number of times the cursor has been rebuilt.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// Batches per full pass, counting a trailing partial batch.
    pub fn batches_per_pass(&self) -> usize {
        self.items.len().div_ceil(self.batch_size)
    }

    /// Number of items in the underlying dataset.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; empty datasets are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Configured batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

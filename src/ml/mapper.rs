//! Parallel batch feature extraction (map/reduce over one machine)
//!
//! The series is split into contiguous chunks of `len / workers` bars (a
//! remainder becomes one extra, shorter chunk). Chunks are extracted on a
//! fixed-size worker pool and merged in chunk order once all have finished.
//!
//! With `preserve_lookback` each chunk after the first also reads the
//! `LOOKBACK` bars before it, so the merged output equals a single pass.
//! Without it every chunk is extracted in isolation and loses up to
//! `LOOKBACK` samples at its leading edge.

use super::features::{extract_batch, FeatureSet, LOOKBACK};
use crate::types::Bar;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::ops::Range;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct BatchMapper {
    workers: usize,
    preserve_lookback: bool,
    /// `None` when the pool could not be built; extraction then runs inline
    pool: Option<Arc<ThreadPool>>,
}

impl Default for BatchMapper {
    fn default() -> Self {
        Self::new(4, true)
    }
}

impl BatchMapper {
    pub fn new(workers: usize, preserve_lookback: bool) -> Self {
        let workers = workers.max(1);
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("feature-worker-{}", i))
            .build()
        {
            Ok(pool) => Some(Arc::new(pool)),
            Err(e) => {
                tracing::warn!("Worker pool unavailable ({}), extracting synchronously", e);
                None
            }
        };
        Self {
            workers,
            preserve_lookback,
            pool,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    /// Chunk boundaries over `len` bars
    pub fn chunk_ranges(&self, len: usize) -> Vec<Range<usize>> {
        if len == 0 {
            return Vec::new();
        }
        let chunk_size = (len / self.workers).max(1);
        (0..len)
            .step_by(chunk_size)
            .map(|start| start..(start + chunk_size).min(len))
            .collect()
    }

    /// Slice each chunk actually reads
    fn read_range(&self, chunk: &Range<usize>) -> Range<usize> {
        if self.preserve_lookback {
            chunk.start.saturating_sub(LOOKBACK)..chunk.end
        } else {
            chunk.clone()
        }
    }

    /// Upper bound on samples lost relative to a single pass
    pub fn max_edge_loss(&self, len: usize) -> usize {
        if self.preserve_lookback {
            0
        } else {
            self.chunk_ranges(len).len().saturating_sub(1) * LOOKBACK
        }
    }

    /// Extract all chunks concurrently and merge them in chunk order
    pub fn map_reduce(&self, bars: &[Bar]) -> FeatureSet {
        let slices: Vec<Range<usize>> = self
            .chunk_ranges(bars.len())
            .iter()
            .map(|c| self.read_range(c))
            .collect();

        tracing::debug!(
            "Extracting features from {} bars in {} chunks on {} workers",
            bars.len(),
            slices.len(),
            self.workers
        );

        let mapped = match &self.pool {
            Some(pool) => pool.install(|| {
                slices
                    .par_iter()
                    .map(|r| extract_batch(&bars[r.clone()]))
                    .collect::<Vec<_>>()
            }),
            None => self.map_sequential(bars, &slices),
        };

        reduce(mapped)
    }

    /// Same chunking and merge order without a pool
    pub fn map_reduce_sequential(&self, bars: &[Bar]) -> FeatureSet {
        let slices: Vec<Range<usize>> = self
            .chunk_ranges(bars.len())
            .iter()
            .map(|c| self.read_range(c))
            .collect();
        reduce(self.map_sequential(bars, &slices))
    }

    fn map_sequential(&self, bars: &[Bar], slices: &[Range<usize>]) -> Vec<FeatureSet> {
        slices
            .iter()
            .map(|r| extract_batch(&bars[r.clone()]))
            .collect()
    }
}

fn reduce(mapped: Vec<FeatureSet>) -> FeatureSet {
    mapped.into_iter().fold(FeatureSet::default(), |mut acc, set| {
        acc.extend(set);
        acc
    })
}

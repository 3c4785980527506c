//! Bounded wave scheduling.
//!
//! Work is split into consecutive waves of at most `width` items. Each wave
//! runs in parallel on a dedicated pool and must finish completely before
//! the next one starts. A failure anywhere in a wave stops the schedule
//! after that wave; later waves never launch.

use super::error::BuildError;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Number of waves needed for `len` items at `width` per wave.
pub fn wave_count(len: usize, width: usize) -> usize {
    len.div_ceil(width.max(1))
}

pub struct WaveScheduler {
    pool: ThreadPool,
    width: usize,
}

impl WaveScheduler {
    /// A scheduler running at most `width` jobs at once. Zero is treated
    /// as one.
    pub fn new(width: usize) -> Result<Self, BuildError> {
        let width = width.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(width)
            .thread_name(|i| format!("catalyze-worker-{i}"))
            .build()?;
        Ok(Self { pool, width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Runs `work` over `items` wave by wave.
    ///
    /// `on_wave(index, size)` is called before each wave launches. Results
    /// come back in item order. If any item of a wave fails, the error of
    /// the earliest failing item is returned once the wave has drained.
    pub fn run<T, R, E>(
        &self,
        items: &[T],
        mut on_wave: impl FnMut(usize, usize),
        work: impl Fn(&T) -> Result<R, E> + Sync,
    ) -> Result<Vec<R>, E>
    where
        T: Sync,
        R: Send,
        E: Send,
    {
        let mut results = Vec::with_capacity(items.len());

        for (index, wave) in items.chunks(self.width).enumerate() {
            on_wave(index, wave.len());

            let finished: Vec<Result<R, E>> =
                self.pool.install(|| wave.par_iter().map(&work).collect());

            for result in finished {
                results.push(result?);
            }
        }

        Ok(results)
    }
}

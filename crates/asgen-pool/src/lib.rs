//! Job pool (C8): a bounded work-stealing pool sized by the engine's
//! concurrency formula (spec §5 "Scheduling model").
//!
//! Wraps a single `rayon::ThreadPool` instance; every parallel stage of
//! the Engine (content seeding, extraction, export, icon-tarball
//! listing, cleanup) runs through the same pool rather than composing
//! ad-hoc pools, so the concurrency cap is never exceeded (spec §5).

use anyhow::Context;

/// `max(min(cores, 6), round(0.6 * cores))` (spec §5).
#[must_use]
pub fn concurrency_for(cores: usize) -> usize {
    let cores = cores.max(1);
    let scaled = (0.6 * cores as f64).round() as usize;
    cores.min(6).max(scaled).max(1)
}

/// Content-seeding batch size: `clamp(cores * 2, 4, 30)` (spec §5).
#[must_use]
pub fn content_seeding_batch_size(cores: usize) -> usize {
    (cores.max(1) * 2).clamp(4, 30)
}

/// Extraction batch size: `clamp(pkgs / cores / 10, 10, 100)` (spec §5).
#[must_use]
pub fn extraction_batch_size(package_count: usize, cores: usize) -> usize {
    let cores = cores.max(1);
    (package_count / cores / 10).clamp(10, 100)
}

/// Thin wrapper over a sized `rayon::ThreadPool`.
pub struct JobPool {
    inner: rayon::ThreadPool,
    concurrency: usize,
}

impl JobPool {
    /// Build a pool with `concurrency_for(cores)` worker threads.
    pub fn new(cores: usize) -> anyhow::Result<Self> {
        let concurrency = concurrency_for(cores);
        let inner = rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .thread_name(|i| format!("asgen-worker-{i}"))
            .build()
            .context("building job pool")?;
        Ok(Self { inner, concurrency })
    }

    /// Build a pool sized off the machine's detected parallelism.
    pub fn sized_for_available_parallelism() -> anyhow::Result<Self> {
        let cores = std::thread::available_parallelism().map(std::num::NonZeroUsize::get).unwrap_or(1);
        Self::new(cores)
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `f` inside the pool, blocking until it returns (spec §5
    /// "Where work runs in parallel": every parallel stage runs through
    /// this one pool).
    pub fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        self.inner.install(f)
    }

    /// `items` processed with `f` via the pool's work-stealing
    /// scheduler; used for extraction, metadata export and icon-tarball
    /// file listing (spec §5 "parallel-for-each over packages").
    pub fn par_for_each<T: Send>(&self, items: Vec<T>, f: impl Fn(T) + Send + Sync) {
        use rayon::prelude::*;
        self.inner.install(|| items.into_par_iter().for_each(f));
    }

    /// `items` mapped with `f` via the pool, preserving input order in
    /// the result — used wherever a result mutex merges worker output
    /// under a stable insertion order (spec §5 "Determinism").
    pub fn par_map<T: Send, R: Send>(&self, items: Vec<T>, f: impl Fn(T) -> R + Send + Sync) -> Vec<R> {
        use rayon::prelude::*;
        self.inner.install(|| items.into_par_iter().map(f).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrency_formula_matches_spec_examples() {
        assert_eq!(concurrency_for(1), 1);
        assert_eq!(concurrency_for(4), 4);
        assert_eq!(concurrency_for(8), 6);
        assert_eq!(concurrency_for(16), 10);
    }

    #[test]
    fn concurrency_never_exceeds_cores_nor_drops_below_minimum() {
        for cores in 1..=64 {
            let c = concurrency_for(cores);
            assert!(c >= 1);
        }
    }

    #[test]
    fn content_seeding_batch_size_is_clamped() {
        assert_eq!(content_seeding_batch_size(1), 4);
        assert_eq!(content_seeding_batch_size(4), 8);
        assert_eq!(content_seeding_batch_size(100), 30);
    }

    #[test]
    fn extraction_batch_size_is_clamped() {
        assert_eq!(extraction_batch_size(10, 8), 10);
        assert_eq!(extraction_batch_size(100_000, 4), 100);
    }

    #[test]
    fn par_map_preserves_input_order() {
        let pool = JobPool::new(2).unwrap();
        let doubled = pool.par_map(vec![1, 2, 3, 4], |x| x * 2);
        assert_eq!(doubled, vec![2, 4, 6, 8]);
    }
}

//! Rayon thread pool configuration for optimizer sweeps.
//!
//! Use [WorkerPool::install] to evaluate a slot sweep with a fixed number of
//! threads, or rely on Rayon's default (all CPU cores).

use rayon::ThreadPoolBuilder;

/// Configures how many worker threads are used for parallel evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use the global Rayon pool.
    pub workers: usize,
}

impl WorkerPool {
    /// Use exactly `n` worker threads.
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Run a closure on a thread pool with this worker count. If the pool
    /// cannot be built the closure runs on the global pool instead.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return f();
        }
        match ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(f),
            Err(error) => {
                tracing::warn!(workers = self.workers, %error, "falling back to the global thread pool");
                f()
            }
        }
    }
}

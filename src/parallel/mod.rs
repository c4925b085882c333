pub mod batch;
pub mod pool;

pub use batch::{batch_ranges, evaluate_ordered};
pub use pool::WorkerPool;

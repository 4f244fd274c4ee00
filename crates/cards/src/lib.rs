//! Card-generation queue: batch enqueueing, worker claim/report flow,
//! derived batch status, and TTL-based retention of finished batches.
//!
//! Rendering itself happens in external workers; this crate only owns
//! the queue discipline and the batch accounting around it.

pub mod queue;
pub mod retention;

pub use queue::{BatchReport, CardQueue, CardQueueError, EnqueueReceipt, EnqueueRequest, JobResult};

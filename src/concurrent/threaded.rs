//! Order-preserving mapping over blocking worker tasks.

use std::collections::VecDeque;
use std::sync::Arc;

use async_stream::stream;
use futures_util::pin_mut;
use futures_util::stream::StreamExt;
use tokio::task::JoinHandle;

use crate::error::{StreamError, StreamResult};
use crate::executor::ExecutorHandle;
use crate::flux::FluxStream;
use crate::outcome::{reclassify, Outcome};

/// One bounded unit of in-flight work owned by the engine.
enum TaskSlot<U> {
    /// Submitted to the blocking pool, not yet joined
    Running(JoinHandle<Outcome<U>>),
    /// Pass-through upstream failure holding its input position
    Resolved(Outcome<U>),
}

impl<U> TaskSlot<U> {
    async fn resolve(self) -> Outcome<U> {
        match self {
            TaskSlot::Running(handle) => match handle.await {
                Ok(outcome) => outcome,
                // A panicked or cancelled worker resolves to a captured
                // failure, never a resumed panic on the consumer.
                Err(join_err) => Outcome::Failure(StreamError::Transformation(format!(
                    "worker task failed: {}",
                    join_err
                ))),
            },
            TaskSlot::Resolved(outcome) => outcome,
        }
    }
}

/// Apply `f` on up to `concurrency` blocking worker tasks, yielding outcomes
/// in strict input order.
///
/// The loop keeps the FIFO topped up to `concurrency` slots before awaiting
/// the oldest one, so the consumer blocks only on head-of-line resolution
/// while younger slots keep running. Dropping the stream detaches running
/// workers; they finish with their results discarded.
pub(crate) fn map_threaded<T, U, F>(
    s: FluxStream<StreamResult<T>>,
    executor: ExecutorHandle,
    f: F,
    concurrency: usize,
) -> FluxStream<Outcome<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> StreamResult<U> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    stream! {
        pin_mut!(s);
        let mut slots: VecDeque<TaskSlot<U>> = VecDeque::new();
        let mut upstream_done = false;
        loop {
            while slots.len() < concurrency && !upstream_done {
                match s.next().await {
                    Some(Ok(value)) => {
                        let f = Arc::clone(&f);
                        let handle = executor.spawn_blocking(move || {
                            Outcome::from_result(f(value).map_err(reclassify))
                        });
                        slots.push_back(TaskSlot::Running(handle));
                    }
                    Some(Err(err)) => {
                        slots.push_back(TaskSlot::Resolved(Outcome::Failure(err)));
                    }
                    None => {
                        upstream_done = true;
                        log::debug!(
                            "threaded map: upstream exhausted, {} slots draining",
                            slots.len()
                        );
                    }
                }
            }
            match slots.pop_front() {
                Some(slot) => yield slot.resolve().await,
                None => break,
            }
        }
    }
    .boxed()
}

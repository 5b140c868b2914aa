//! Order-preserving mapping over cooperatively scheduled futures.

use std::future::Future;

use async_stream::stream;
use futures_util::future::{self, BoxFuture, FutureExt};
use futures_util::pin_mut;
use futures_util::stream::{FuturesOrdered, StreamExt};

use crate::error::StreamResult;
use crate::flux::FluxStream;
use crate::outcome::{reclassify, Outcome};

/// Apply an async `f` with up to `concurrency` transformation futures
/// pending at once, yielding outcomes in strict input order.
///
/// The engine owns its scheduling: all in-flight futures are polled while
/// the consumer awaits the oldest, on the consumer's own task. No worker
/// threads are involved; suspension happens at each await inside `f` and at
/// the engine's own pop.
pub(crate) fn amap_tasks<T, U, F, Fut>(
    s: FluxStream<StreamResult<T>>,
    f: F,
    concurrency: usize,
) -> FluxStream<Outcome<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnMut(T) -> Fut + Send + 'static,
    Fut: Future<Output = StreamResult<U>> + Send + 'static,
{
    stream! {
        pin_mut!(s);
        let mut f = f;
        let mut in_flight: FuturesOrdered<BoxFuture<'static, Outcome<U>>> =
            FuturesOrdered::new();
        let mut upstream_done = false;
        loop {
            while in_flight.len() < concurrency && !upstream_done {
                match s.next().await {
                    Some(Ok(value)) => {
                        let fut = f(value);
                        in_flight.push_back(
                            async move { Outcome::from_result(fut.await.map_err(reclassify)) }
                                .boxed(),
                        );
                    }
                    Some(Err(err)) => {
                        in_flight.push_back(future::ready(Outcome::Failure(err)).boxed());
                    }
                    None => upstream_done = true,
                }
            }
            match in_flight.next().await {
                Some(outcome) => yield outcome,
                None => break,
            }
        }
    }
    .boxed()
}

//! Bounded fan-out interleaving of nested streams.

use async_stream::stream;
use futures_core::Stream;
use futures_util::pin_mut;
use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::error::StreamResult;
use crate::flux::FluxStream;
use crate::outcome::Outcome;

/// Open up to `concurrency` inner streams at once and interleave their
/// elements by completion order.
///
/// The unit of concurrency is an open sub-stream, so intra-source order is
/// preserved while cross-source order is not. Each open inner sits in the
/// set as a pending next-element future; a completed slot yields its
/// element and is re-armed, an exhausted inner frees its slot, and new
/// inners open as slots free while outer elements remain. Terminates once
/// outer is exhausted and every open inner is drained.
pub(crate) fn flatten_concurrent<T, St>(
    s: FluxStream<StreamResult<St>>,
    concurrency: usize,
) -> FluxStream<Outcome<T>>
where
    T: Send + 'static,
    St: Stream<Item = StreamResult<T>> + Send + Unpin + 'static,
{
    stream! {
        pin_mut!(s);
        let mut open = FuturesUnordered::new();
        let mut outer_done = false;
        loop {
            while open.len() < concurrency && !outer_done {
                match s.next().await {
                    Some(Ok(inner)) => open.push(inner.into_future()),
                    Some(Err(err)) => yield Outcome::Failure(err),
                    None => outer_done = true,
                }
            }
            match open.next().await {
                Some((Some(element), rest)) => {
                    yield Outcome::from_result(element);
                    open.push(rest.into_future());
                }
                // An exhausted inner frees its slot
                Some((None, _)) => {}
                None => {
                    if outer_done {
                        break;
                    }
                }
            }
        }
    }
    .boxed()
}

//! Flux - a lazy, pull-based stream-transformation pipeline
//!
//! This module provides the core operator surface: validated stage
//! constructors that select a sequential or concurrent strategy, the
//! sequential stage generators, and the raising adapter that turns a
//! concurrent engine's tagged outcomes back into ordinary elements.
//!
//! A pipeline stage is a `FluxStream<StreamResult<T>>`: failures travel as
//! `Err` elements at their input position until a `catch` stage consumes
//! them or the consumer observes them.

use async_stream::stream;
use futures_core::Stream;
use futures_util::pin_mut;
use futures_util::stream::{self, BoxStream, StreamExt};
use futures_util::future;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_stream::wrappers::ReceiverStream;

use crate::concurrent::{amap_tasks, flatten_concurrent, map_threaded};
use crate::error::{StreamError, StreamResult};
use crate::executor::ExecutorHandle;
use crate::outcome::{guarded, Outcome};

/// A boxed, heap-allocated lazy stream
pub type FluxStream<O> = BoxStream<'static, O>;

// ================================
// Source Constructors
// ================================

/// Emit a single element as a pipeline-ready stream
pub fn emit<T>(item: T) -> FluxStream<StreamResult<T>>
where
    T: Send + 'static,
{
    stream::once(future::ready(Ok(item))).boxed()
}

/// Create an empty stream that completes immediately
pub fn empty<T>() -> FluxStream<StreamResult<T>>
where
    T: Send + 'static,
{
    stream::empty().boxed()
}

/// Create a stream from an iterator of plain values, wrapping each in `Ok`
pub fn from_iter<I, T>(iter: I) -> FluxStream<StreamResult<T>>
where
    I: IntoIterator<Item = T> + Send + 'static,
    <I as IntoIterator>::IntoIter: Send,
    T: Send + 'static,
{
    stream::iter(iter.into_iter().map(Ok)).boxed()
}

/// Create a stream from an iterator that already carries failures
pub fn from_try_iter<I, T>(iter: I) -> FluxStream<StreamResult<T>>
where
    I: IntoIterator<Item = StreamResult<T>> + Send + 'static,
    <I as IntoIterator>::IntoIter: Send,
    T: Send + 'static,
{
    stream::iter(iter).boxed()
}

/// Create a stream draining a tokio mpsc receiver
pub fn from_channel<T>(receiver: tokio::sync::mpsc::Receiver<T>) -> FluxStream<StreamResult<T>>
where
    T: Send + 'static,
{
    ReceiverStream::new(receiver).map(Ok).boxed()
}

/// Wrap every element of an existing stream in `Ok`
pub fn lift<S>(s: S) -> FluxStream<StreamResult<S::Item>>
where
    S: Stream + Send + 'static,
    S::Item: Send + 'static,
{
    s.map(Ok).boxed()
}

// ================================
// Mapping
// ================================

/// Apply a transformation to every element, preserving input order.
///
/// `concurrency == 1` applies the transformation inline on the consumer's
/// task; `concurrency > 1` routes through the threaded mapping engine with a
/// buffer of exactly `concurrency` task slots. Upstream failures pass
/// through at their input position without being submitted to workers.
///
/// # Examples
/// ```
/// use flux_stream::flux::*;
/// use futures_util::stream::StreamExt;
///
/// # async fn example() {
/// let s = from_iter(vec![1, 2, 3]);
/// let doubled = map(s, |x| Ok(x * 2), 1).unwrap();
/// let result: Vec<_> = doubled.collect().await;
/// assert_eq!(result, vec![Ok(2), Ok(4), Ok(6)]);
/// # }
/// ```
pub fn map<T, U, F>(
    s: FluxStream<StreamResult<T>>,
    f: F,
    concurrency: usize,
) -> StreamResult<FluxStream<StreamResult<U>>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> StreamResult<U> + Send + Sync + 'static,
{
    map_on(s, ExecutorHandle::default(), f, concurrency)
}

/// Like [`map`], with the blocking executor injected explicitly
pub fn map_on<T, U, F>(
    s: FluxStream<StreamResult<T>>,
    executor: ExecutorHandle,
    f: F,
    concurrency: usize,
) -> StreamResult<FluxStream<StreamResult<U>>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> StreamResult<U> + Send + Sync + 'static,
{
    match concurrency {
        0 => Err(StreamError::InvalidConcurrency(0)),
        1 => Ok(map_sequential(s, f)),
        n => Ok(raise_outcomes(map_threaded(s, executor, f, n))),
    }
}

/// Threaded map sized to the number of available CPU cores
pub fn map_parallel<T, U, F>(
    s: FluxStream<StreamResult<T>>,
    f: F,
) -> FluxStream<StreamResult<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> StreamResult<U> + Send + Sync + 'static,
{
    raise_outcomes(map_threaded(s, ExecutorHandle::default(), f, num_cpus::get()))
}

fn map_sequential<T, U, F>(s: FluxStream<StreamResult<T>>, f: F) -> FluxStream<StreamResult<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> StreamResult<U> + Send + Sync + 'static,
{
    stream! {
        pin_mut!(s);
        let mut f = f;
        while let Some(item) = s.next().await {
            match item {
                Ok(value) => yield guarded(&mut f, value),
                Err(err) => yield Err(err),
            }
        }
    }
    .boxed()
}

/// Apply an async transformation to every element, preserving input order.
///
/// Always routed to the cooperative mapping engine, even at concurrency 1,
/// since the transformation is inherently suspending. At most `concurrency`
/// transformation futures are pending at once; they all make progress while
/// the consumer awaits the oldest.
///
/// # Examples
/// ```
/// use flux_stream::flux::*;
/// use futures_util::stream::StreamExt;
///
/// # async fn example() {
/// let s = from_iter(vec![1, 2, 3]);
/// let squared = amap(s, |x| async move { Ok(x * x) }, 4).unwrap();
/// let result: Vec<_> = squared.collect().await;
/// assert_eq!(result, vec![Ok(1), Ok(4), Ok(9)]);
/// # }
/// ```
pub fn amap<T, U, F, Fut>(
    s: FluxStream<StreamResult<T>>,
    f: F,
    concurrency: usize,
) -> StreamResult<FluxStream<StreamResult<U>>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnMut(T) -> Fut + Send + 'static,
    Fut: Future<Output = StreamResult<U>> + Send + 'static,
{
    if concurrency == 0 {
        return Err(StreamError::InvalidConcurrency(0));
    }
    Ok(raise_outcomes(amap_tasks(s, f, concurrency)))
}

// ================================
// Flattening
// ================================

/// Flatten a stream of streams.
///
/// `concurrency == 1` drains each inner stream fully before opening the
/// next, so ordering is preserved by construction. `concurrency > 1` keeps
/// up to `concurrency` inner streams open at once and interleaves their
/// elements by completion order: intra-source order is preserved,
/// cross-source order is not.
pub fn flatten<T, St>(
    s: FluxStream<StreamResult<St>>,
    concurrency: usize,
) -> StreamResult<FluxStream<StreamResult<T>>>
where
    T: Send + 'static,
    St: Stream<Item = StreamResult<T>> + Send + Unpin + 'static,
{
    match concurrency {
        0 => Err(StreamError::InvalidConcurrency(0)),
        1 => Ok(flatten_sequential(s)),
        n => Ok(raise_outcomes(flatten_concurrent(s, n))),
    }
}

fn flatten_sequential<T, St>(s: FluxStream<StreamResult<St>>) -> FluxStream<StreamResult<T>>
where
    T: Send + 'static,
    St: Stream<Item = StreamResult<T>> + Send + Unpin + 'static,
{
    stream! {
        pin_mut!(s);
        while let Some(item) = s.next().await {
            match item {
                Ok(mut inner) => {
                    while let Some(element) = inner.next().await {
                        yield element;
                    }
                }
                Err(err) => yield Err(err),
            }
        }
    }
    .boxed()
}

// ================================
// Grouping
// ================================

fn validate_group(size: Option<usize>, seconds: Option<Duration>) -> StreamResult<()> {
    if size == Some(0) {
        return Err(StreamError::InvalidGroupSize(0));
    }
    if seconds.map_or(false, |window| window.is_zero()) {
        return Err(StreamError::InvalidGroupInterval);
    }
    Ok(())
}

/// Accumulate elements into groups of up to `size` within a `seconds` window.
///
/// A group is emitted when it reaches `size` elements, or when the window
/// deadline has elapsed by the time a pull completes. The deadline is never
/// enforced by a background timer: if upstream stalls, the overdue group is
/// emitted late, after the stalled pull returns. On exhaustion the final
/// non-empty partial group is emitted. An upstream failure flushes the
/// pending group first, then passes through at its position.
///
/// # Examples
/// ```
/// use flux_stream::flux::*;
/// use futures_util::stream::StreamExt;
///
/// # async fn example() {
/// let s = from_iter(vec![1, 2, 3, 4, 5]);
/// let groups = group(s, Some(2), None).unwrap();
/// let result: Vec<_> = groups.collect().await;
/// assert_eq!(result, vec![Ok(vec![1, 2]), Ok(vec![3, 4]), Ok(vec![5])]);
/// # }
/// ```
pub fn group<T>(
    s: FluxStream<StreamResult<T>>,
    size: Option<usize>,
    seconds: Option<Duration>,
) -> StreamResult<FluxStream<StreamResult<Vec<T>>>>
where
    T: Send + 'static,
{
    validate_group(size, seconds)?;
    Ok(stream! {
        pin_mut!(s);
        let mut pending: Vec<T> = Vec::new();
        let mut deadline: Option<Instant> = None;
        while let Some(item) = s.next().await {
            match item {
                Ok(value) => {
                    if pending.is_empty() {
                        deadline = seconds.map(|window| Instant::now() + window);
                    }
                    pending.push(value);
                    let full = size.map_or(false, |n| pending.len() >= n);
                    let overdue = deadline.map_or(false, |d| Instant::now() >= d);
                    if full || overdue {
                        deadline = None;
                        yield Ok(std::mem::take(&mut pending));
                    }
                }
                Err(err) => {
                    if !pending.is_empty() {
                        deadline = None;
                        yield Ok(std::mem::take(&mut pending));
                    }
                    yield Err(err);
                }
            }
        }
        if !pending.is_empty() {
            yield Ok(std::mem::take(&mut pending));
        }
    }
    .boxed())
}

/// Like [`group`], with a key callable: an element whose key differs from
/// the current group's key closes that group and starts the next one.
///
/// A failing key callable drops the element it was judging and surfaces its
/// reclassified error at that position, flushing the pending group first.
///
/// # Examples
/// ```
/// use flux_stream::flux::*;
/// use futures_util::stream::StreamExt;
///
/// # async fn example() {
/// let s = from_iter(vec!["a", "a", "b", "a"]);
/// let groups = group_by(s, |x: &&str| Ok(*x), None, None).unwrap();
/// let result: Vec<_> = groups.collect().await;
/// assert_eq!(
///     result,
///     vec![Ok(vec!["a", "a"]), Ok(vec!["b"]), Ok(vec!["a"])],
/// );
/// # }
/// ```
pub fn group_by<T, K, F>(
    s: FluxStream<StreamResult<T>>,
    by: F,
    size: Option<usize>,
    seconds: Option<Duration>,
) -> StreamResult<FluxStream<StreamResult<Vec<T>>>>
where
    T: Send + 'static,
    K: Eq + Send + 'static,
    F: FnMut(&T) -> StreamResult<K> + Send + 'static,
{
    validate_group(size, seconds)?;
    Ok(stream! {
        pin_mut!(s);
        let mut by = by;
        let mut pending: Vec<T> = Vec::new();
        let mut current_key: Option<K> = None;
        let mut deadline: Option<Instant> = None;
        while let Some(item) = s.next().await {
            match item {
                Ok(value) => {
                    let key = match guarded(&mut by, &value) {
                        Ok(key) => key,
                        Err(err) => {
                            if !pending.is_empty() {
                                current_key = None;
                                deadline = None;
                                yield Ok(std::mem::take(&mut pending));
                            }
                            yield Err(err);
                            continue;
                        }
                    };
                    let key_changed = current_key.as_ref().map_or(false, |k| *k != key);
                    if key_changed && !pending.is_empty() {
                        deadline = None;
                        yield Ok(std::mem::take(&mut pending));
                    }
                    if pending.is_empty() {
                        deadline = seconds.map(|window| Instant::now() + window);
                    }
                    current_key = Some(key);
                    pending.push(value);
                    let full = size.map_or(false, |n| pending.len() >= n);
                    let overdue = deadline.map_or(false, |d| Instant::now() >= d);
                    if full || overdue {
                        deadline = None;
                        yield Ok(std::mem::take(&mut pending));
                    }
                }
                Err(err) => {
                    if !pending.is_empty() {
                        current_key = None;
                        deadline = None;
                        yield Ok(std::mem::take(&mut pending));
                    }
                    yield Err(err);
                }
            }
        }
        if !pending.is_empty() {
            yield Ok(std::mem::take(&mut pending));
        }
    }
    .boxed())
}

// ================================
// Failure Handling
// ================================

/// Drop failures matching a predicate, letting everything else through.
///
/// `when` judges each `Err` element; `Ok(true)` drops it and the stream
/// continues. With `raise_after_exhaustion`, the first dropped failure is
/// re-emitted once upstream is exhausted normally; otherwise dropped
/// failures are swallowed for good. A `when` that itself fails surfaces its
/// reclassified error in place of the failure it was judging.
///
/// # Examples
/// ```
/// use flux_stream::error::StreamError;
/// use flux_stream::flux::*;
/// use futures_util::stream::StreamExt;
///
/// # async fn example() {
/// let s = from_try_iter(vec![
///     Ok(1),
///     Err(StreamError::Custom("skipped".into())),
///     Ok(2),
/// ]);
/// let quiet = catch(s, |_| Ok(true), false);
/// let result: Vec<_> = quiet.collect().await;
/// assert_eq!(result, vec![Ok(1), Ok(2)]);
/// # }
/// ```
pub fn catch<T, F>(
    s: FluxStream<StreamResult<T>>,
    when: F,
    raise_after_exhaustion: bool,
) -> FluxStream<StreamResult<T>>
where
    T: Send + 'static,
    F: FnMut(&StreamError) -> StreamResult<bool> + Send + 'static,
{
    stream! {
        pin_mut!(s);
        let mut when = when;
        let mut captured: Option<StreamError> = None;
        while let Some(item) = s.next().await {
            match item {
                Ok(value) => yield Ok(value),
                Err(err) => match guarded(&mut when, &err) {
                    Ok(true) => {
                        if raise_after_exhaustion && captured.is_none() {
                            captured = Some(err);
                        }
                    }
                    Ok(false) => yield Err(err),
                    Err(when_err) => yield Err(when_err),
                },
            }
        }
        if let Some(err) = captured {
            yield Err(err);
        }
    }
    .boxed()
}

// ================================
// Truncation
// ================================

/// Yield at most `count` elements, stopping early when `when` is satisfied.
///
/// At least one of `count` and `when` must be given. The count only covers
/// values; failures pass through uncounted. The predicate stops the stream
/// strictly before the first element it accepts. Truncation stops by
/// ceasing to pull; upstream is never cancelled eagerly.
pub fn truncate<T, F>(
    s: FluxStream<StreamResult<T>>,
    count: Option<usize>,
    when: Option<F>,
) -> StreamResult<FluxStream<StreamResult<T>>>
where
    T: Send + 'static,
    F: FnMut(&T) -> StreamResult<bool> + Send + 'static,
{
    if count.is_none() && when.is_none() {
        return Err(StreamError::InvalidTruncateArgs);
    }
    if count == Some(0) {
        return Ok(empty());
    }
    Ok(stream! {
        pin_mut!(s);
        let mut when = when;
        let mut yielded: usize = 0;
        while let Some(item) = s.next().await {
            match item {
                Ok(value) => {
                    if let Some(pred) = when.as_mut() {
                        match guarded(pred, &value) {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(err) => {
                                yield Err(err);
                                continue;
                            }
                        }
                    }
                    yield Ok(value);
                    yielded += 1;
                    if count.map_or(false, |limit| yielded >= limit) {
                        break;
                    }
                }
                Err(err) => yield Err(err),
            }
        }
    }
    .boxed())
}

// ================================
// Observation and Rate Control
// ================================

/// Side-effecting pass-through that logs progress under a label.
///
/// Elements are unchanged. Failures are logged as they pass; totals are
/// logged at exponentially spaced milestones and once at exhaustion.
pub fn observe<T>(s: FluxStream<StreamResult<T>>, label: &str) -> FluxStream<StreamResult<T>>
where
    T: Send + 'static,
{
    let label = label.to_string();
    stream! {
        pin_mut!(s);
        let mut yielded: u64 = 0;
        let mut failed: u64 = 0;
        let mut milestone: u64 = 1;
        while let Some(item) = s.next().await {
            match &item {
                Ok(_) => yielded += 1,
                Err(err) => {
                    failed += 1;
                    log::warn!("[{}] failure: {}", label, err);
                }
            }
            if yielded + failed >= milestone {
                log::info!(
                    "[{}] {} elements yielded, {} failures",
                    label, yielded, failed
                );
                milestone = milestone.saturating_mul(2);
            }
            yield item;
        }
        log::info!(
            "[{}] exhausted: {} elements yielded, {} failures",
            label, yielded, failed
        );
    }
    .boxed()
}

/// Enforce a minimum interval of `1/frequency` between pulls.
///
/// Sleeps only the shortfall; a source slower than `frequency` is never
/// sped up.
pub fn slow<T>(
    s: FluxStream<StreamResult<T>>,
    frequency: f64,
) -> StreamResult<FluxStream<StreamResult<T>>>
where
    T: Send + 'static,
{
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(StreamError::InvalidFrequency(frequency));
    }
    let interval = Duration::from_secs_f64(1.0 / frequency);
    Ok(stream! {
        pin_mut!(s);
        let mut last: Option<Instant> = None;
        while let Some(item) = s.next().await {
            if let Some(prev) = last {
                let elapsed = prev.elapsed();
                if elapsed < interval {
                    sleep(interval - elapsed).await;
                }
            }
            last = Some(Instant::now());
            yield item;
        }
    }
    .boxed())
}

// ================================
// Raising
// ================================

/// Unwrap tagged outcomes into ordinary elements on the consumer's task.
///
/// Each `Success` becomes `Ok`, each `Failure` becomes `Err`, at the
/// position the engine assigned it. This is the sole point where a
/// concurrent engine's internal failure becomes an ordinary element-level
/// error for the pipeline's caller.
pub fn raise_outcomes<T>(s: FluxStream<Outcome<T>>) -> FluxStream<StreamResult<T>>
where
    T: Send + 'static,
{
    s.map(Outcome::into_result).boxed()
}

// Re-export the extension traits from their module
pub use crate::flux_stream_ext::{FluxStreamExt, IntoFlux};

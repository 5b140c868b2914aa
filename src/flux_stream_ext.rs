//! Method-chaining surface over the free operator functions.

use futures_core::Stream;
use futures_util::stream::StreamExt;
use std::future::Future;
use std::time::Duration;

use crate::error::{StreamError, StreamResult};
use crate::executor::ExecutorHandle;
use crate::flux::{self, FluxStream};

/// Extension trait lifting plain streams into the pipeline element shape
pub trait IntoFlux: Stream + Sized + Send + 'static {
    /// Wrap every element in `Ok`, producing a pipeline-ready stream
    fn lift_flux(self) -> FluxStream<StreamResult<Self::Item>>
    where
        Self::Item: Send + 'static,
    {
        flux::lift(self)
    }
}

impl<S> IntoFlux for S where S: Stream + Send + 'static {}

/// Extension trait providing flux combinators on streams of results
///
/// Each method delegates to the free function of the same base name;
/// validated constructors keep their synchronous `StreamResult` return.
pub trait FluxStreamExt<T: Send + 'static>:
    Stream<Item = StreamResult<T>> + Sized + Send + 'static
{
    /// Apply a transformation with bounded concurrency, preserving order
    fn map_flux<U, F>(
        self,
        f: F,
        concurrency: usize,
    ) -> StreamResult<FluxStream<StreamResult<U>>>
    where
        U: Send + 'static,
        F: Fn(T) -> StreamResult<U> + Send + Sync + 'static,
    {
        flux::map(self.boxed(), f, concurrency)
    }

    /// Like [`map_flux`](Self::map_flux), with the blocking executor
    /// injected explicitly
    fn map_flux_on<U, F>(
        self,
        executor: ExecutorHandle,
        f: F,
        concurrency: usize,
    ) -> StreamResult<FluxStream<StreamResult<U>>>
    where
        U: Send + 'static,
        F: Fn(T) -> StreamResult<U> + Send + Sync + 'static,
    {
        flux::map_on(self.boxed(), executor, f, concurrency)
    }

    /// Threaded map sized to the number of available CPU cores
    fn map_parallel_flux<U, F>(self, f: F) -> FluxStream<StreamResult<U>>
    where
        U: Send + 'static,
        F: Fn(T) -> StreamResult<U> + Send + Sync + 'static,
    {
        flux::map_parallel(self.boxed(), f)
    }

    /// Apply an async transformation with bounded concurrency, preserving
    /// order
    fn amap_flux<U, F, Fut>(
        self,
        f: F,
        concurrency: usize,
    ) -> StreamResult<FluxStream<StreamResult<U>>>
    where
        U: Send + 'static,
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = StreamResult<U>> + Send + 'static,
    {
        flux::amap(self.boxed(), f, concurrency)
    }

    /// Flatten a stream of streams with bounded fan-out
    fn flatten_flux<I>(self, concurrency: usize) -> StreamResult<FluxStream<StreamResult<I>>>
    where
        I: Send + 'static,
        T: Stream<Item = StreamResult<I>> + Send + Unpin + 'static,
    {
        flux::flatten(self.boxed(), concurrency)
    }

    /// Accumulate elements into bounded, optionally time-windowed groups
    fn group_flux(
        self,
        size: Option<usize>,
        seconds: Option<Duration>,
    ) -> StreamResult<FluxStream<StreamResult<Vec<T>>>> {
        flux::group(self.boxed(), size, seconds)
    }

    /// Group consecutive elements sharing a key
    fn group_by_flux<K, F>(
        self,
        by: F,
        size: Option<usize>,
        seconds: Option<Duration>,
    ) -> StreamResult<FluxStream<StreamResult<Vec<T>>>>
    where
        K: Eq + Send + 'static,
        F: FnMut(&T) -> StreamResult<K> + Send + 'static,
    {
        flux::group_by(self.boxed(), by, size, seconds)
    }

    /// Drop failures matching a predicate
    fn catch_flux<F>(self, when: F, raise_after_exhaustion: bool) -> FluxStream<StreamResult<T>>
    where
        F: FnMut(&StreamError) -> StreamResult<bool> + Send + 'static,
    {
        flux::catch(self.boxed(), when, raise_after_exhaustion)
    }

    /// Stop after `count` elements or when `when` is satisfied
    fn truncate_flux<F>(
        self,
        count: Option<usize>,
        when: Option<F>,
    ) -> StreamResult<FluxStream<StreamResult<T>>>
    where
        F: FnMut(&T) -> StreamResult<bool> + Send + 'static,
    {
        flux::truncate(self.boxed(), count, when)
    }

    /// Log progress under a label, passing elements through unchanged
    fn observe_flux(self, label: &str) -> FluxStream<StreamResult<T>> {
        flux::observe(self.boxed(), label)
    }

    /// Enforce a minimum interval of `1/frequency` between pulls
    fn slow_flux(self, frequency: f64) -> StreamResult<FluxStream<StreamResult<T>>> {
        flux::slow(self.boxed(), frequency)
    }
}

impl<T, S> FluxStreamExt<T> for S
where
    T: Send + 'static,
    S: Stream<Item = StreamResult<T>> + Send + 'static,
{
}

//! Concurrent engines: bounded sets of pending computations.
//!
//! All three engines share one shape — a buffer of at most `concurrency`
//! task slots between submission and consumption — and differ only in what
//! drives a slot: a blocking worker task, a cooperatively scheduled future,
//! or an open sub-stream. The mapping engines yield outcomes in strict
//! input order; the flattening engine interleaves by completion order.

mod flatten;
mod tasks;
mod threaded;

pub(crate) use flatten::flatten_concurrent;
pub(crate) use tasks::amap_tasks;
pub(crate) use threaded::map_threaded;

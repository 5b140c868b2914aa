use std::time::Duration;

use flux_stream::error::{StreamError, StreamResult};
use flux_stream::flux::*;

type NoPred<T> = fn(&T) -> StreamResult<bool>;

#[tokio::test]
async fn map_rejects_zero_concurrency() {
    let err = map(from_iter(vec![1]), |x: i32| Ok(x), 0).err();
    assert_eq!(err, Some(StreamError::InvalidConcurrency(0)));
}

#[tokio::test]
async fn amap_rejects_zero_concurrency() {
    let err = amap(from_iter(vec![1]), |x: i32| async move { Ok(x) }, 0).err();
    assert_eq!(err, Some(StreamError::InvalidConcurrency(0)));
}

#[tokio::test]
async fn flatten_rejects_zero_concurrency() {
    let inner = from_iter(vec![1]);
    let err = flatten(from_iter(vec![inner]), 0).err();
    assert_eq!(err, Some(StreamError::InvalidConcurrency(0)));
}

#[tokio::test]
async fn group_rejects_zero_size() {
    let err = group(from_iter(vec![1]), Some(0), None).err();
    assert_eq!(err, Some(StreamError::InvalidGroupSize(0)));
}

#[tokio::test]
async fn group_rejects_zero_interval() {
    let err = group(from_iter(vec![1]), Some(2), Some(Duration::ZERO)).err();
    assert_eq!(err, Some(StreamError::InvalidGroupInterval));
}

#[tokio::test]
async fn group_by_shares_group_validation() {
    let err = group_by(from_iter(vec![1]), |x: &i32| Ok(*x), Some(0), None).err();
    assert_eq!(err, Some(StreamError::InvalidGroupSize(0)));
}

#[tokio::test]
async fn truncate_requires_count_or_predicate() {
    let err = truncate(from_iter(vec![1]), None, None::<NoPred<i32>>).err();
    assert_eq!(err, Some(StreamError::InvalidTruncateArgs));
}

#[tokio::test]
async fn slow_rejects_non_positive_frequency() {
    let err = slow(from_iter(vec![1]), 0.0).err();
    assert_eq!(err, Some(StreamError::InvalidFrequency(0.0)));

    let err = slow(from_iter(vec![1]), -2.5).err();
    assert_eq!(err, Some(StreamError::InvalidFrequency(-2.5)));
}

#[tokio::test]
async fn slow_rejects_non_finite_frequency() {
    let err = slow(from_iter(vec![1]), f64::INFINITY).err();
    assert_eq!(err, Some(StreamError::InvalidFrequency(f64::INFINITY)));

    assert!(slow(from_iter(vec![1]), f64::NAN).is_err());
}

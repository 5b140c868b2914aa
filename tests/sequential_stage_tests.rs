use std::time::{Duration, Instant};

use futures_util::stream::StreamExt;

use flux_stream::error::{StreamError, StreamResult};
use flux_stream::flux::*;

type NoPred<T> = fn(&T) -> StreamResult<bool>;

#[tokio::test]
async fn sequential_flatten_drains_inners_in_order() {
    let outer = from_iter(vec![
        from_iter(vec![1, 2]),
        from_iter(Vec::<i32>::new()),
        from_iter(vec![3]),
    ]);
    let flat = flatten(outer, 1).unwrap();
    let result: Vec<_> = flat.collect().await;
    assert_eq!(result, vec![Ok(1), Ok(2), Ok(3)]);
}

#[tokio::test]
async fn sequential_flatten_passes_outer_failures_through() {
    let outer = from_try_iter(vec![
        Ok(from_iter(vec![1])),
        Err(StreamError::Custom("bad source".into())),
        Ok(from_iter(vec![2])),
    ]);
    let flat = flatten(outer, 1).unwrap();
    let result: Vec<_> = flat.collect().await;
    assert_eq!(
        result,
        vec![
            Ok(1),
            Err(StreamError::Custom("bad source".into())),
            Ok(2),
        ]
    );
}

#[tokio::test]
async fn truncate_count_zero_yields_nothing() {
    let truncated = truncate(from_iter(vec![1, 2, 3]), Some(0), None::<NoPred<i32>>).unwrap();
    let result: Vec<_> = truncated.collect().await;
    assert!(result.is_empty());
}

#[tokio::test]
async fn truncate_count_equal_to_length_yields_everything() {
    let truncated = truncate(from_iter(vec![1, 2, 3]), Some(3), None::<NoPred<i32>>).unwrap();
    let result: Vec<_> = truncated.collect().await;
    assert_eq!(result, vec![Ok(1), Ok(2), Ok(3)]);
}

#[tokio::test]
async fn truncate_count_beyond_length_yields_everything() {
    let truncated = truncate(from_iter(vec![1, 2, 3]), Some(10), None::<NoPred<i32>>).unwrap();
    let result: Vec<_> = truncated.collect().await;
    assert_eq!(result, vec![Ok(1), Ok(2), Ok(3)]);
}

#[tokio::test]
async fn truncate_predicate_stops_before_matching_element() {
    let truncated = truncate(
        from_iter(vec![1, 2, 3, 4]),
        None,
        Some(|x: &i32| Ok(*x >= 3)),
    )
    .unwrap();
    let result: Vec<_> = truncated.collect().await;
    assert_eq!(result, vec![Ok(1), Ok(2)]);
}

#[tokio::test]
async fn truncate_count_ignores_failures() {
    let source = from_try_iter(vec![
        Ok(1),
        Err(StreamError::Custom("glitch".into())),
        Ok(2),
        Ok(3),
    ]);
    let truncated = truncate(source, Some(2), None::<NoPred<i32>>).unwrap();
    let result: Vec<_> = truncated.collect().await;
    assert_eq!(
        result,
        vec![Ok(1), Err(StreamError::Custom("glitch".into())), Ok(2)]
    );
}

#[tokio::test]
async fn truncate_applies_whichever_bound_hits_first() {
    let truncated = truncate(
        from_iter(vec![1, 2, 3, 4, 5]),
        Some(4),
        Some(|x: &i32| Ok(*x == 3)),
    )
    .unwrap();
    let result: Vec<_> = truncated.collect().await;
    assert_eq!(result, vec![Ok(1), Ok(2)]);
}

#[tokio::test]
async fn truncate_surfaces_reclassified_predicate_failure() {
    let truncated = truncate(
        from_iter(vec![1, 2]),
        Some(5),
        Some(|x: &i32| {
            if *x == 1 {
                Err(StreamError::Exhausted)
            } else {
                Ok(false)
            }
        }),
    )
    .unwrap();
    let result: Vec<_> = truncated.collect().await;
    assert_eq!(
        result,
        vec![Err(StreamError::ReclassifiedExhaustion), Ok(2)]
    );
}

#[tokio::test]
async fn observe_passes_elements_through_unchanged() {
    let source = from_try_iter(vec![
        Ok(1),
        Err(StreamError::Custom("observed".into())),
        Ok(2),
    ]);
    let observed = observe(source, "test-stage");
    let result: Vec<_> = observed.collect().await;
    assert_eq!(
        result,
        vec![Ok(1), Err(StreamError::Custom("observed".into())), Ok(2)]
    );
}

#[tokio::test]
async fn slow_enforces_minimum_interval() {
    let paced = slow(from_iter(vec![1, 2, 3, 4]), 50.0).unwrap();
    let start = Instant::now();
    let result: Vec<_> = paced.collect().await;
    let elapsed = start.elapsed();

    assert_eq!(result, vec![Ok(1), Ok(2), Ok(3), Ok(4)]);
    // Three inter-element gaps of 20ms each, minus a little timer slop
    assert!(
        elapsed >= Duration::from_millis(55),
        "stream finished too fast: {:?}",
        elapsed
    );
}

#[tokio::test]
async fn slow_never_speeds_up_a_slower_source() {
    let source = async_stream::stream! {
        yield Ok(1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        yield Ok(2);
    }
    .boxed();
    let paced = slow(source, 1000.0).unwrap();
    let start = Instant::now();
    let result: Vec<_> = paced.collect().await;
    assert_eq!(result, vec![Ok(1), Ok(2)]);
    assert!(start.elapsed() >= Duration::from_millis(45));
}

#[test]
fn lift_and_constructors_wrap_values() {
    tokio_test::block_on(async {
        let lifted = lift(futures_util::stream::iter(vec![1, 2]));
        let result: Vec<_> = lifted.collect().await;
        assert_eq!(result, vec![Ok(1), Ok(2)]);

        let single: Vec<_> = emit("x").collect().await;
        assert_eq!(single, vec![Ok("x")]);

        let nothing: Vec<StreamResult<i32>> = empty().collect().await;
        assert!(nothing.is_empty());
    });
}

#[tokio::test]
async fn from_channel_drains_sender() {
    let (tx, rx) = tokio::sync::mpsc::channel(4);
    tokio::spawn(async move {
        for i in 0..5 {
            tx.send(i).await.unwrap();
        }
    });
    let result: Vec<_> = from_channel(rx).collect().await;
    assert_eq!(result, vec![Ok(0), Ok(1), Ok(2), Ok(3), Ok(4)]);
}

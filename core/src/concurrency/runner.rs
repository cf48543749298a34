use futures::stream::{self, StreamExt};
use std::future::Future;

/// Runs `worker` over `items` with at most `limit` invocations pending at
/// once and returns the outputs in input order.
///
/// The futures are polled on the calling task, so "concurrent" means
/// interleaved awaits rather than threads. Outcomes are not inspected: a
/// worker that can fail should resolve to a sentinel such as `None` instead
/// of panicking, so one bad item never stops the rest of the batch.
/// A `limit` of zero is treated as one.
pub async fn run_bounded<T, R, F, Fut>(items: Vec<T>, limit: usize, worker: F) -> Vec<R>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    let limit = limit.max(1);
    stream::iter(items)
        .map(worker)
        .buffered(limit)
        .collect()
        .await
}

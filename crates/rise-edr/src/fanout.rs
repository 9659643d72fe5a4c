//! Bounded fan-out with an all-or-nothing join barrier.

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use rise_client::{FetchError, FetchResult, ResourceId};

/// Run a fetch under a deadline. Expiry is a transient failure of `resource`.
pub(crate) async fn with_timeout<T, Fut>(
    resource: ResourceId,
    limit: Duration,
    fetch: Fut,
) -> FetchResult<T>
where
    Fut: Future<Output = FetchResult<T>>,
{
    match tokio::time::timeout(limit, fetch).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::transient(
            resource,
            format!("timed out after {}s", limit.as_secs_f64()),
        )),
    }
}

/// Drive `fetches` with at most `concurrency` in flight.
///
/// Results come back in input order whatever the completion order. The
/// first failure is returned as soon as it is observed; dropping the stream
/// cancels everything still in flight.
pub(crate) async fn fetch_ordered<I, Fut, T>(fetches: I, concurrency: usize) -> FetchResult<Vec<T>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = FetchResult<T>>,
{
    let mut pending = stream::iter(
        fetches
            .into_iter()
            .enumerate()
            .map(|(slot, fetch)| async move { (slot, fetch.await) }),
    )
    .buffer_unordered(concurrency.max(1));

    let mut done = Vec::new();
    while let Some((slot, result)) = pending.next().await {
        done.push((slot, result?));
    }

    done.sort_by_key(|(slot, _)| *slot);
    Ok(done.into_iter().map(|(_, value)| value).collect())
}

//! Rate-limit aware pagination.
//!
//! Wraps a "fetch one page" call into a lazy, finite stream of pages. A
//! `RateLimited` answer parks the stream for `cooldown` and asks for the same
//! page again; a `Failed` answer is yielded once and ends the stream. The
//! stream is not restartable: build a new one per query.

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use tracing::warn;

use crate::traits::{FetchError, FetchResult, Page, PageCursor};

pub fn paginate<'a, T, F, Fut>(fetch: F, cooldown: Duration) -> BoxStream<'a, FetchResult<Vec<T>>>
where
    T: Send + 'a,
    F: FnMut(Option<PageCursor>) -> Fut + Send + 'a,
    Fut: Future<Output = FetchResult<Page<T>>> + Send + 'a,
{
    // `None` state means the previous page was the last one (or failed).
    let start = Some((fetch, None::<PageCursor>));

    stream::unfold(start, move |state| async move {
        let Some((mut fetch, cursor)) = state else {
            return None;
        };
        loop {
            match fetch(cursor.clone()).await {
                Ok(page) => {
                    let next = page.next.map(|c| (fetch, Some(c)));
                    return Some((Ok(page.items), next));
                }
                Err(FetchError::RateLimited { reset_at }) => {
                    warn!(
                        cooldown_secs = cooldown.as_secs(),
                        ?reset_at,
                        "Pagination rate limit exceeded, waiting before retrying the same page"
                    );
                    tokio::time::sleep(cooldown).await;
                }
                Err(e) => return Some((Err(e), None)),
            }
        }
    })
    .boxed()
}

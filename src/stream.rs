//! Streaming support types and utilities.

use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::client::ClientError;

// SSE parsing utilities live in the `sse` module.
// Re-export them here for convenience.
pub use crate::sse::{is_done_marker, parse_sse_line, SseResponseExt};

/// A lazy, finite, non-restartable sequence of decoded events.
pub type EventStream<T> = Pin<Box<dyn Stream<Item = Result<T, ClientError>> + Send>>;

/// Box `events`, ending it with [`ClientError::Cancelled`] as soon as `token`
/// fires.
///
/// Without a token the stream is only boxed.
pub fn cancellable<S, T>(events: S, token: Option<CancellationToken>) -> EventStream<T>
where
    S: Stream<Item = Result<T, ClientError>> + Send + 'static,
    T: Send + 'static,
{
    let Some(token) = token else {
        return Box::pin(events);
    };

    Box::pin(stream::unfold(
        Some((Box::pin(events), token)),
        |state| async move {
            let Some((mut events, token)) = state else {
                return None;
            };
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                item = events.next() => Some(item),
            };
            match next {
                None => Some((Err(ClientError::Cancelled), None)),
                Some(item) => item.map(|item| (item, Some((events, token)))),
            }
        },
    ))
}

//! Server-Sent Events (SSE) stream processing for streamed completions.
//!
//! SSE format:
//! ```text
//! data: {"key": "value"}
//!
//! data: {"another": "event"}
//!
//! data: [DONE]
//! ```
//!
//! Only `data: ` lines carry events; every other line is skipped. A stream
//! must end with `[DONE]`: a body that ends without it is an error.

use bytes::BytesMut;
use futures::stream::{self, Stream, StreamExt};
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::client::ClientError;
use crate::http::{HttpResponse, ResponseBody};

/// Prefix of every event-carrying line.
pub const DATA_PREFIX: &str = "data: ";

/// Payload of the final frame.
pub const DONE_MARKER: &str = "[DONE]";

/// Extension trait for [`HttpResponse`] to enable SSE streaming.
///
/// # Example
/// ```ignore
/// use gpt3::sse::SseResponseExt;
///
/// // Get raw SSE data lines
/// let mut stream = response.sse();
/// while let Some(result) = stream.next().await {
///     let line = result?;
///     println!("SSE data: {}", line);
/// }
///
/// // Or automatically deserialize as JSON
/// let mut stream = response.sse_events::<CompletionResponse>();
/// while let Some(result) = stream.next().await {
///     let event = result?;
///     println!("Event: {:?}", event);
/// }
/// ```
pub trait SseResponseExt {
    /// Convert the response into a stream of raw SSE data payloads.
    ///
    /// Yields the content after the `data: ` prefix of each event line. Ends
    /// quietly at `[DONE]`; ends with an error if the body fails or runs out
    /// first.
    fn sse(self) -> impl Stream<Item = Result<String, ClientError>> + Send;

    /// Like [`sse`](Self::sse), decoding every payload as JSON.
    ///
    /// The stream ends right after the first error it yields.
    fn sse_events<T>(self) -> impl Stream<Item = Result<T, ClientError>> + Send
    where
        T: DeserializeOwned + Send + 'static;
}

/// What a single line of the body means to the decoder.
#[derive(Debug, PartialEq, Eq)]
enum Frame<'a> {
    Skip,
    Data(&'a str),
    Done,
}

fn classify_line(line: &str) -> Frame<'_> {
    match parse_sse_line(line) {
        None => Frame::Skip,
        Some(data) if is_done_marker(data) => Frame::Done,
        Some(data) => Frame::Data(data),
    }
}

/// Undecoded bytes of the body and how far they were searched for a newline.
struct LineReader {
    body: ResponseBody,
    buffer: BytesMut,
    scanned: usize,
}

/// Drive `body` through the frame state machine, decoding each data payload
/// with `decode`.
///
/// The reader is dropped, releasing the body, on every exit: `[DONE]`, a read
/// failure, the end of the body, or a payload `decode` rejects.
fn decode_frames<T>(
    body: ResponseBody,
    decode: fn(&str) -> Result<T, ClientError>,
) -> impl Stream<Item = Result<T, ClientError>> + Send
where
    T: Send + 'static,
{
    let reader = LineReader {
        body,
        buffer: BytesMut::new(),
        scanned: 0,
    };

    stream::unfold(Some(reader), move |state| async move {
        let Some(mut reader) = state else {
            return None;
        };
        loop {
            // Process complete lines from buffer
            while let Some(offset) = reader.buffer[reader.scanned..]
                .iter()
                .position(|b| *b == b'\n')
            {
                let raw = reader.buffer.split_to(reader.scanned + offset + 1);
                reader.scanned = 0;
                let line = String::from_utf8_lossy(&raw);
                match classify_line(&line) {
                    Frame::Skip => continue,
                    Frame::Done => {
                        trace!("stream completed");
                        return None;
                    }
                    Frame::Data(data) => {
                        return match decode(data) {
                            Ok(item) => Some((Ok(item), Some(reader))),
                            Err(e) => Some((Err(e), None)),
                        };
                    }
                }
            }
            reader.scanned = reader.buffer.len();

            match reader.body.next().await {
                Some(Ok(chunk)) => reader.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => return Some((Err(ClientError::StreamRead(e)), None)),
                None => return Some((Err(ClientError::UnexpectedEof), None)),
            }
        }
    })
}

impl SseResponseExt for HttpResponse {
    fn sse(self) -> impl Stream<Item = Result<String, ClientError>> + Send {
        decode_frames(self.body, |data| Ok(data.to_string()))
    }

    fn sse_events<T>(self) -> impl Stream<Item = Result<T, ClientError>> + Send
    where
        T: DeserializeOwned + Send + 'static,
    {
        decode_frames(self.body, |data| {
            serde_json::from_str::<T>(data).map_err(ClientError::StreamDecode)
        })
    }
}

/// Parse an SSE line to extract the data portion.
///
/// The line is trimmed first; lines are in the format `data: <content>`.
///
/// # Example
/// ```
/// use gpt3::sse::parse_sse_line;
///
/// let line = "data: {\"key\": \"value\"}\n";
/// assert_eq!(parse_sse_line(line), Some("{\"key\": \"value\"}"));
///
/// let line = "event: ping";
/// assert_eq!(parse_sse_line(line), None);
/// ```
pub fn parse_sse_line(line: &str) -> Option<&str> {
    line.trim().strip_prefix(DATA_PREFIX)
}

/// Check if an SSE data payload marks the end of the stream.
///
/// # Example
/// ```
/// use gpt3::sse::is_done_marker;
///
/// assert!(is_done_marker("[DONE]"));
/// assert!(!is_done_marker(""));
/// assert!(!is_done_marker("{\"data\": \"value\"}"));
/// ```
pub fn is_done_marker(data: &str) -> bool {
    data.starts_with(DONE_MARKER)
}

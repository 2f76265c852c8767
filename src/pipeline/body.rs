//! Response body handle.
//!
//! A body is either already in memory (local responses, test doubles) or a
//! stream still attached to the connection. Headers are available before the
//! body is read, so large payloads can be consumed incrementally.

use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use tokio_stream::{Stream, StreamExt};

use super::HttpError;

/// A boxed stream of body chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// Lazily readable response body.
///
/// Reading consumes the handle: call exactly one of [`bytes`](Self::bytes),
/// [`text`](Self::text) or [`into_stream`](Self::into_stream).
pub struct ResponseBody {
    inner: Inner,
}

enum Inner {
    Buffered(Bytes),
    Streaming(BodyStream),
}

impl ResponseBody {
    /// Creates an empty, buffered body.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            inner: Inner::Buffered(Bytes::new()),
        }
    }

    /// Creates a body backed by a chunk stream.
    pub fn streaming<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, HttpError>> + Send + 'static,
    {
        Self {
            inner: Inner::Streaming(Box::pin(stream)),
        }
    }

    /// Returns the content if it is already in memory.
    #[must_use]
    pub const fn as_buffered(&self) -> Option<&Bytes> {
        match &self.inner {
            Inner::Buffered(bytes) => Some(bytes),
            Inner::Streaming(_) => None,
        }
    }

    /// Returns true if the body still has to be read from the connection.
    #[must_use]
    pub const fn is_streaming(&self) -> bool {
        matches!(self.inner, Inner::Streaming(_))
    }

    /// Reads the whole body into memory.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Body`] (or whatever the stream yielded) if a
    /// chunk cannot be read.
    pub async fn bytes(self) -> Result<Bytes, HttpError> {
        match self.inner {
            Inner::Buffered(bytes) => Ok(bytes),
            Inner::Streaming(mut stream) => {
                let mut collected = Vec::new();
                while let Some(chunk) = stream.next().await {
                    collected.extend_from_slice(&chunk?);
                }
                Ok(Bytes::from(collected))
            }
        }
    }

    /// Reads the whole body and decodes it as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Body`] if reading fails or the content is not
    /// valid UTF-8.
    pub async fn text(self) -> Result<String, HttpError> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(HttpError::body)
    }

    /// Converts the body into a chunk stream.
    ///
    /// Buffered bodies yield a single chunk (or none when empty).
    #[must_use]
    pub fn into_stream(self) -> BodyStream {
        match self.inner {
            Inner::Streaming(stream) => stream,
            Inner::Buffered(bytes) if bytes.is_empty() => Box::pin(tokio_stream::empty()),
            Inner::Buffered(bytes) => Box::pin(tokio_stream::once(Ok(bytes))),
        }
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Inner::Buffered(bytes) => f
                .debug_struct("ResponseBody")
                .field("buffered", &bytes.len())
                .finish(),
            Inner::Streaming(_) => f.debug_struct("ResponseBody").field("streaming", &true).finish(),
        }
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        Self {
            inner: Inner::Buffered(bytes),
        }
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes).into()
    }
}

impl From<&'static str> for ResponseBody {
    fn from(text: &'static str) -> Self {
        Bytes::from_static(text.as_bytes()).into()
    }
}

impl From<String> for ResponseBody {
    fn from(text: String) -> Self {
        Bytes::from(text).into()
    }
}

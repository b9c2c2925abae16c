//! GPX track returned by a routing engine, streamed through unmodified.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, Stream, StreamExt, TryStreamExt};
use reqwest::Response;
use reqwest::header::CONTENT_TYPE;

use crate::error::{Result, RoutingError, Service};

pub const GPX_CONTENT_TYPE: &str = "application/gpx+xml";

/// Body of an upstream GPX response.
///
/// Holds the open connection until it is read to the end or dropped.
pub struct GpxStream {
    content_type: Option<String>,
    inner: BoxStream<'static, Result<Bytes>>,
}

impl GpxStream {
    pub(crate) fn from_response(service: Service, response: Response) -> Self {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let inner = response
            .bytes_stream()
            .map_err(move |source| RoutingError::Transport { service, source })
            .boxed();

        Self {
            content_type,
            inner,
        }
    }

    /// Content type the engine reported, usually [`GPX_CONTENT_TYPE`].
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Reads the whole track into memory.
    pub async fn into_bytes(self) -> Result<Bytes> {
        self.inner
            .try_fold(BytesMut::new(), |mut buf, chunk| async move {
                buf.extend_from_slice(&chunk);
                Ok(buf)
            })
            .await
            .map(BytesMut::freeze)
    }
}

impl Stream for GpxStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl fmt::Debug for GpxStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpxStream")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

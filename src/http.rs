//! Outbound HTTP plumbing shared by every backend.
//!
//! Each call races the caller's [`CancellationToken`], so a cancelled
//! pipeline surfaces [`RoutingError::Cancelled`] instead of whatever the
//! transport would have reported.

use std::future::Future;
use std::pin::pin;

use futures::StreamExt;
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::error::{Result, RoutingError, Service};

/// Bytes of an error response body kept for diagnostics.
const MAX_ERROR_BODY: usize = 1024;

pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(RoutingError::Cancelled),
        res = fut => res,
    }
}

/// POSTs `body` as JSON and returns the response if the status is 2xx.
pub(crate) async fn post_json<B: Serialize + ?Sized>(
    cancel: &CancellationToken,
    client: &Client,
    service: Service,
    url: &str,
    body: &B,
) -> Result<Response> {
    cancellable(cancel, async {
        let response = client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|source| RoutingError::Transport { service, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            error!(%service, %status, url, body = %body, "response not successful");
            return Err(RoutingError::Status {
                service,
                status,
                body,
            });
        }

        Ok(response)
    })
    .await
}

/// Reads at most [`MAX_ERROR_BODY`] bytes of a failed response.
async fn error_body(response: Response) -> String {
    let mut body = Vec::new();
    let mut chunks = pin!(response.bytes_stream());

    while let Some(Ok(chunk)) = chunks.next().await {
        let room = MAX_ERROR_BODY - body.len();
        body.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if body.len() >= MAX_ERROR_BODY {
            break;
        }
    }

    String::from_utf8_lossy(&body).trim().to_string()
}

/// Reads and deserializes a JSON response body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    cancel: &CancellationToken,
    service: Service,
    response: Response,
) -> Result<T> {
    cancellable(cancel, async {
        response
            .json::<T>()
            .await
            .map_err(|source| RoutingError::Decode { service, source })
    })
    .await
}

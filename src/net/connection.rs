//! Request framing for a single connection.
//!
//! # Responsibilities
//! - Read the header block up to the first blank line
//! - Read exactly `Content-Length` body bytes
//! - Hand the raw request to the pipeline and write the response
//!
//! # Design Decisions
//! - One transaction per connection; the connection is closed afterwards
//! - Size limits are checked before any body byte is buffered
//! - The pipeline runs on the blocking pool, since resources and upload
//!   staging may block

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

use crate::config::TransportConfig;
use crate::error::WireError;
use crate::server::Pipeline;

/// Framing failures, detected before the pipeline sees the request.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection closed before a full request was received")]
    Closed,

    #[error("header block exceeds {0} bytes")]
    HeaderTooLarge(usize),

    #[error("body of {length} bytes exceeds the {limit} byte limit")]
    BodyTooLarge { length: usize, limit: usize },

    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    #[error("timed out reading request")]
    Timeout,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Limits applied while reading a request.
#[derive(Debug, Clone, Copy)]
pub struct FramingLimits {
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
    pub read_timeout: Duration,
}

impl From<&TransportConfig> for FramingLimits {
    fn from(config: &TransportConfig) -> Self {
        Self {
            max_header_bytes: config.max_header_bytes,
            max_body_bytes: config.max_body_bytes,
            read_timeout: Duration::from_secs(config.read_timeout_secs),
        }
    }
}

/// A framed but undecoded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    pub header: Vec<u8>,
    pub body: Vec<u8>,
}

/// End of the header block and the length of the blank-line separator.
fn header_end(buf: &[u8]) -> Option<(usize, usize)> {
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// `Content-Length` of a header block; zero when absent.
pub fn content_length(header: &[u8]) -> Result<usize, ConnectionError> {
    let text = String::from_utf8_lossy(header);
    for line in text.lines().skip(1) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            let value = value.trim();
            return value
                .parse()
                .map_err(|_| ConnectionError::InvalidContentLength(value.to_string()));
        }
    }
    Ok(0)
}

/// Read one request from `reader`.
pub async fn read_request<R>(reader: &mut R, limits: FramingLimits) -> Result<RawRequest, ConnectionError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];

    let (end, separator) = loop {
        if let Some(found) = header_end(&buf) {
            break found;
        }
        if buf.len() > limits.max_header_bytes {
            return Err(ConnectionError::HeaderTooLarge(limits.max_header_bytes));
        }
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(ConnectionError::Closed);
        }
        buf.extend_from_slice(&chunk[..n]);
    };
    if end > limits.max_header_bytes {
        return Err(ConnectionError::HeaderTooLarge(limits.max_header_bytes));
    }

    let header = buf[..end].to_vec();
    let length = content_length(&header)?;
    if length > limits.max_body_bytes {
        return Err(ConnectionError::BodyTooLarge {
            length,
            limit: limits.max_body_bytes,
        });
    }

    let mut body = buf.split_off(end + separator);
    if body.len() < length {
        let received = body.len();
        body.resize(length, 0);
        reader.read_exact(&mut body[received..]).await?;
    }
    body.truncate(length);

    Ok(RawRequest { header, body })
}

/// Serve one transaction on `stream`.
pub async fn serve_connection<S>(mut stream: S, pipeline: Arc<Pipeline>, limits: FramingLimits) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let read = tokio::time::timeout(limits.read_timeout, read_request(&mut stream, limits)).await;
    let request = match read.unwrap_or(Err(ConnectionError::Timeout)) {
        Ok(request) => request,
        Err(ConnectionError::Closed) => {
            tracing::debug!("Connection closed without a request");
            return Ok(());
        }
        Err(ConnectionError::Io(e)) => return Err(ConnectionError::Io(e)),
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting request");
            let response = pipeline.reject(&WireError::Decode(e.to_string()));
            stream.write_all(&response).await?;
            stream.shutdown().await?;
            return Err(e);
        }
    };

    let transaction_id = Uuid::new_v4().to_string();
    let response = tokio::task::spawn_blocking(move || {
        pipeline.handle(&transaction_id, &request.header, &request.body)
    })
    .await
    .map_err(std::io::Error::other)?;

    stream.write_all(&response).await?;
    stream.shutdown().await?;
    Ok(())
}

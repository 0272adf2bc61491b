use std::time::Duration;

use futures_util::{Stream, StreamExt};
use reqwest::Response;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::progress::{done_line, ProgressSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReport {
    /// `Content-Length` of the response, when the server sent one.
    pub expected: Option<u64>,
    pub copied: u64,
    pub elapsed: Duration,
}

/// Stream the body of `response` into `writer`, ticking a progress bar on stderr.
///
/// The response is consumed, so its connection is released on every return path.
pub async fn transfer<W>(response: Response, writer: &mut W) -> Result<TransferReport>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let start = Instant::now();
    let expected = response.content_length();
    let progress = ProgressSink::new(expected);

    let copied = match copy_body(response.bytes_stream(), writer, &progress).await {
        Ok(copied) => copied,
        Err(err) => {
            progress.abandon();
            return Err(err);
        }
    };
    progress.finish();

    let report = TransferReport {
        expected,
        copied,
        elapsed: start.elapsed(),
    };
    tracing::debug!(?report, "transfer complete");
    eprintln!("{}", done_line(report.copied, report.elapsed));
    Ok(report)
}

/// Copy every chunk of `stream` into `writer` and count it on `progress`.
pub async fn copy_body<S, B, E, W>(
    stream: S,
    writer: &mut W,
    progress: &ProgressSink,
) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    Error: From<E>,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut stream = std::pin::pin!(stream);
    let mut copied: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let chunk = chunk.as_ref();
        writer.write_all(chunk).await?;
        copied += chunk.len() as u64;
        progress.inc(chunk.len() as u64);
    }
    writer.flush().await?;
    Ok(copied)
}

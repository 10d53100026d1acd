//! Draining the worker's output and error streams.
//!
//! Output is read as raw byte chunks via `BytesCodec` and kept as bytes until
//! the stream closes, so multi-byte characters split across chunk boundaries
//! decode correctly. Stderr is framed by line for the same reason.

use std::io;

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{AnyDelimiterCodec, BytesCodec, FramedRead};

/// Read `reader` to end, appending every chunk in arrival order.
pub(crate) async fn collect_output<R>(reader: R) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut frames = FramedRead::new(reader, BytesCodec::new());
    let mut accumulated = Vec::new();
    while let Some(chunk) = frames.next().await {
        let chunk = chunk?;
        tracing::trace!(bytes = chunk.len(), "worker stdout chunk");
        accumulated.extend_from_slice(&chunk);
    }
    Ok(accumulated)
}

/// Longest stderr line logged as one event.
const MAX_DIAGNOSTIC_LINE: usize = 16 * 1024;

/// Forward the worker's stderr to the log until it closes.
///
/// Never fails. Returns the number of non-empty lines logged. Lines are
/// logged inside the caller's span, which carries the request id.
pub(crate) async fn forward_diagnostics<R>(reader: R) -> usize
where
    R: AsyncRead + Unpin,
{
    drain_lines(reader, MAX_DIAGNOSTIC_LINE, |line| {
        tracing::warn!(target: "promptrelay::worker", "{}", line);
    })
    .await
}

/// Split `reader` on newlines, handing each trimmed non-empty line to
/// `on_line`. Lines are decoded only once complete.
///
/// A line longer than `max_line` ends line splitting, but the rest of the
/// stream is still read to end so the writer never blocks on a full pipe.
async fn drain_lines<R, F>(reader: R, max_line: usize, mut on_line: F) -> usize
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let codec = AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), max_line);
    let mut frames = FramedRead::new(reader, codec);
    let mut lines = 0;
    while let Some(frame) = frames.next().await {
        match frame {
            Ok(frame) => {
                let text = String::from_utf8_lossy(&frame);
                let line = text.trim();
                if !line.is_empty() {
                    lines += 1;
                    on_line(line);
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "worker stderr not line framed, discarding rest");
                let mut rest = frames.into_inner();
                if let Err(e) = tokio::io::copy(&mut rest, &mut tokio::io::sink()).await {
                    tracing::debug!(error = %e, "worker stderr read failed");
                }
                break;
            }
        }
    }
    lines
}

/// Final response text: lossy UTF-8, surrounding whitespace removed.
pub(crate) fn response_text(accumulated: &[u8]) -> String {
    String::from_utf8_lossy(accumulated).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn collects_chunks_in_order() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let writer = tokio::spawn(async move {
            tx.write_all(b"hello").await.unwrap();
            tx.flush().await.unwrap();
            tokio::task::yield_now().await;
            tx.write_all(b" world").await.unwrap();
        });

        let bytes = collect_output(rx).await.unwrap();
        writer.await.unwrap();
        assert_eq!(bytes, b"hello world");
    }

    #[tokio::test]
    async fn empty_stream_collects_nothing() {
        let bytes = collect_output(tokio::io::empty()).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn diagnostics_counts_non_empty_lines() {
        let logged = forward_diagnostics(&b"warning: slow\n\nretrying\n"[..]).await;
        assert_eq!(logged, 2);
    }

    #[tokio::test]
    async fn diagnostic_line_split_across_writes_stays_whole() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let writer = tokio::spawn(async move {
            // "é" is 0xC3 0xA9, split between the two writes.
            tx.write_all(b"loading caf\xC3").await.unwrap();
            tx.flush().await.unwrap();
            tokio::task::yield_now().await;
            tx.write_all(b"\xA9 model\ndone").await.unwrap();
        });

        let mut seen = Vec::new();
        let logged = drain_lines(rx, MAX_DIAGNOSTIC_LINE, |line| seen.push(line.to_string())).await;
        writer.await.unwrap();

        assert_eq!(logged, 2);
        assert_eq!(seen, vec!["loading café model", "done"]);
    }

    #[tokio::test]
    async fn overlong_diagnostic_line_is_still_drained() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let writer = tokio::spawn(async move {
            tx.write_all(b"short\n").await.unwrap();
            tx.write_all(&[b'x'; 8192]).await.unwrap();
            tx.write_all(b"\ntail\n").await.unwrap();
        });

        let mut seen = Vec::new();
        drain_lines(rx, 1024, |line| seen.push(line.to_string())).await;
        writer.await.unwrap();

        assert_eq!(seen, vec!["short"]);
    }

    #[test]
    fn response_text_trims_outer_whitespace_only() {
        assert_eq!(response_text(b"\n  answer  \n"), "answer");
        assert_eq!(response_text(b" two  words "), "two  words");
    }

    #[test]
    fn response_text_joins_split_utf8() {
        // "é" is 0xC3 0xA9; accumulation happens before decoding.
        let mut bytes = b"caf".to_vec();
        bytes.push(0xC3);
        bytes.push(0xA9);
        assert_eq!(response_text(&bytes), "café");
    }
}

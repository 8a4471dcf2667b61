// src/exec/pipe.rs

//! Bounded byte channel connecting two units of a pipeline.
//!
//! ```text
//!   PipeWriter ──▶ [VecDeque<u8>, fixed capacity] ──▶ PipeReader
//!                  ├── writer waits while full (backpressure)
//!                  ├── reader waits while empty and open
//!                  ├── writer shutdown / drop → EOF once drained
//!                  └── reader drop → writes fail with BrokenPipe
//! ```
//!
//! The lock is a `std::sync::Mutex`: it only guards deque operations and
//! waker slots, never an `.await`. Closed flags are atomics so `Drop` stays
//! synchronous.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, Waker};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Default pipe capacity in bytes.
pub const PIPE_BUFFER_SIZE: usize = 2048;

struct Buffer {
    bytes: VecDeque<u8>,
    capacity: usize,
    reader_waker: Option<Waker>,
    writer_waker: Option<Waker>,
}

struct Shared {
    buf: Mutex<Buffer>,
    writer_closed: AtomicBool,
    reader_closed: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Buffer> {
        self.buf.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn close_writer(&self) {
        self.writer_closed.store(true, Ordering::Release);
        if let Some(waker) = self.lock().reader_waker.take() {
            waker.wake();
        }
    }

    fn close_reader(&self) {
        self.reader_closed.store(true, Ordering::Release);
        if let Some(waker) = self.lock().writer_waker.take() {
            waker.wake();
        }
    }
}

/// Write side of a pipe.
pub struct PipeWriter {
    shared: Arc<Shared>,
}

/// Read side of a pipe.
pub struct PipeReader {
    shared: Arc<Shared>,
}

/// Create a pipe holding at most `capacity` bytes (minimum 1).
pub fn channel(capacity: usize) -> (PipeWriter, PipeReader) {
    let capacity = capacity.max(1);
    let shared = Arc::new(Shared {
        buf: Mutex::new(Buffer {
            bytes: VecDeque::with_capacity(capacity.min(8192)),
            capacity,
            reader_waker: None,
            writer_waker: None,
        }),
        writer_closed: AtomicBool::new(false),
        reader_closed: AtomicBool::new(false),
    });

    (
        PipeWriter {
            shared: Arc::clone(&shared),
        },
        PipeReader { shared },
    )
}

fn broken_pipe() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader closed")
}

impl PipeWriter {
    /// True once the reading side has gone away.
    pub fn is_reader_closed(&self) -> bool {
        self.shared.reader_closed.load(Ordering::Acquire)
    }
}

impl AsyncWrite for PipeWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        if data.is_empty() {
            return Poll::Ready(Ok(0));
        }
        if self.is_reader_closed() {
            return Poll::Ready(Err(broken_pipe()));
        }

        let mut buf = self.shared.lock();

        // The reader may have gone between the check above and the lock.
        if self.is_reader_closed() {
            return Poll::Ready(Err(broken_pipe()));
        }

        let room = buf.capacity.saturating_sub(buf.bytes.len());
        if room == 0 {
            buf.writer_waker = Some(cx.waker().clone());
            return Poll::Pending;
        }

        let n = data.len().min(room);
        buf.bytes.extend(&data[..n]);
        if let Some(waker) = buf.reader_waker.take() {
            waker.wake();
        }
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.shared.close_writer();
        Poll::Ready(Ok(()))
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        self.shared.close_writer();
    }
}

impl AsyncRead for PipeReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        out: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let mut buf = self.shared.lock();

        if buf.bytes.is_empty() {
            if self.shared.writer_closed.load(Ordering::Acquire) {
                // EOF: nothing buffered and nobody left to write.
                return Poll::Ready(Ok(()));
            }
            buf.reader_waker = Some(cx.waker().clone());
            return Poll::Pending;
        }

        let n = out.remaining().min(buf.bytes.len());
        let (front, back) = buf.bytes.as_slices();
        if n <= front.len() {
            out.put_slice(&front[..n]);
        } else {
            out.put_slice(front);
            out.put_slice(&back[..n - front.len()]);
        }
        buf.bytes.drain(..n);

        if let Some(waker) = buf.writer_waker.take() {
            waker.wake();
        }
        Poll::Ready(Ok(()))
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        self.shared.close_reader();
    }
}

impl fmt::Debug for PipeWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeWriter").finish_non_exhaustive()
    }
}

impl fmt::Debug for PipeReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeReader").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn write_then_read_to_eof() {
        let (mut writer, mut reader) = channel(1024);

        writer.write_all(b"hello").await.unwrap();
        drop(writer);

        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"hello");
    }

    #[tokio::test]
    async fn shutdown_signals_eof() {
        let (mut writer, mut reader) = channel(1024);

        writer.write_all(b"done").await.unwrap();
        writer.shutdown().await.unwrap();

        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"done");
        drop(writer);
    }

    #[tokio::test]
    async fn small_buffer_does_not_lose_data() {
        let (mut writer, mut reader) = channel(16);
        let data: Vec<u8> = (0..10_000).map(|i| (i % 251) as u8).collect();
        let expected = data.clone();

        let producer = tokio::spawn(async move {
            writer.write_all(&data).await.unwrap();
        });

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        producer.await.unwrap();
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn writer_waits_while_full() {
        let (mut writer, mut reader) = channel(4);
        writer.write_all(b"abcd").await.unwrap();

        // Buffer is full: a further write must not complete on its own.
        let blocked = tokio::time::timeout(Duration::from_millis(50), writer.write_all(b"e")).await;
        assert!(blocked.is_err());

        let mut buf = [0u8; 4];
        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"abcd");

        writer.write_all(b"e").await.unwrap();
        drop(writer);
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest, b"e");
    }

    #[tokio::test]
    async fn reader_waits_for_slow_writer() {
        let (mut writer, mut reader) = channel(64);

        let producer = tokio::spawn(async move {
            writer.write_all(b"first\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            writer.write_all(b"second\n").await.unwrap();
        });

        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        producer.await.unwrap();
        assert_eq!(out, "first\nsecond\n");
    }

    #[tokio::test]
    async fn dropped_reader_breaks_the_pipe() {
        let (mut writer, reader) = channel(1024);
        drop(reader);

        let err = writer.write_all(b"data").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(writer.is_reader_closed());
    }

    #[tokio::test]
    async fn dropped_reader_wakes_blocked_writer() {
        let (mut writer, reader) = channel(8);

        let producer = tokio::spawn(async move { writer.write_all(&[0u8; 1024]).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(reader);

        let result = tokio::time::timeout(Duration::from_secs(2), producer)
            .await
            .expect("writer hung after reader dropped")
            .unwrap();
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::BrokenPipe);
    }
}

//! Async framed connection.
//!
//! [`Connection`] owns one byte stream split into read and write halves.
//! Each half sits behind its own lock together with its own copy of the
//! [`Full`] framing counters, so a send never interleaves with another send
//! and a receive never with another receive, while the two directions run
//! concurrently.

use gramkit_mtproto::transport::{self, Full, Transport};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::errors::ConnectionError;

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

struct ReadSide {
    stream: BoxedReader,
    transport: Full,
    buffer: Vec<u8>,
}

struct WriteSide {
    stream: BoxedWriter,
    transport: Full,
    out: Vec<u8>,
}

/// A full-framed MTProto connection.
pub struct Connection {
    reader: Mutex<ReadSide>,
    writer: Mutex<WriteSide>,
}

impl Connection {
    /// Open a TCP connection to `addr` (`ip:port`).
    pub async fn connect(addr: &str) -> Result<Self, ConnectionError> {
        log::info!("[gramkit] connecting to {addr}");
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::from_stream(stream))
    }

    /// Wrap any bidirectional byte stream. Tests use `tokio::io::duplex`.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read, write) = tokio::io::split(stream);
        Self {
            reader: Mutex::new(ReadSide {
                stream: Box::new(read),
                transport: Full::new(),
                buffer: Vec::with_capacity(4096),
            }),
            writer: Mutex::new(WriteSide {
                stream: Box::new(write),
                transport: Full::new(),
                out: Vec::with_capacity(4096),
            }),
        }
    }

    /// Frame and write one payload.
    pub async fn send(&self, payload: &[u8]) -> Result<(), ConnectionError> {
        let mut guard = self.writer.lock().await;
        let side = &mut *guard;
        side.out.clear();
        side.transport.pack(payload, &mut side.out);
        side.stream.write_all(&side.out).await?;
        side.stream.flush().await?;
        log::debug!("[gramkit] sent frame of {} bytes", payload.len());
        Ok(())
    }

    /// Read until one complete frame is buffered and return its payload.
    pub async fn recv(&self) -> Result<Vec<u8>, ConnectionError> {
        let mut guard = self.reader.lock().await;
        let side = &mut *guard;
        loop {
            match side.transport.unpack(&side.buffer) {
                Ok(offset) => {
                    let payload = side.buffer[offset.data_start..offset.data_end].to_vec();
                    side.buffer.drain(..offset.next_offset);
                    log::debug!("[gramkit] received frame of {} bytes", payload.len());
                    return Ok(payload);
                }
                Err(transport::Error::MissingBytes { .. }) => {
                    let n = side.stream.read_buf(&mut side.buffer).await?;
                    if n == 0 {
                        return Err(ConnectionError::Closed);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Push every received frame into `frames` until the peer hangs up, a
    /// frame is corrupt, the receiver goes away or `cancel` fires.
    ///
    /// A terminal error is delivered through the channel as well as returned,
    /// so the consumer can fail whatever was waiting on this connection.
    pub async fn recv_loop(
        &self,
        frames: mpsc::Sender<Result<Vec<u8>, ConnectionError>>,
        cancel: CancellationToken,
    ) -> Result<(), ConnectionError> {
        loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                frame = self.recv() => frame,
            };
            match frame {
                Ok(frame) => {
                    if frames.send(Ok(frame)).await.is_err() {
                        return Ok(());
                    }
                }
                Err(e) => {
                    let _ = frames.send(Err(e.clone())).await;
                    return Err(e);
                }
            }
        }
    }

    /// Shut down the write half. The peer will see EOF.
    pub async fn disconnect(&self) {
        let mut side = self.writer.lock().await;
        if let Err(e) = side.stream.shutdown().await {
            log::debug!("[gramkit] shutdown: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_cross_a_duplex() {
        let (a, b) = tokio::io::duplex(64);
        let (a, b) = (Connection::from_stream(a), Connection::from_stream(b));
        a.send(&[1, 2, 3, 4]).await.unwrap();
        a.send(&[5; 400]).await.unwrap();
        assert_eq!(b.recv().await.unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(b.recv().await.unwrap(), vec![5; 400]);
    }

    #[tokio::test]
    async fn oversized_length_word_fails_without_waiting_for_the_body() {
        let (mut raw, b) = tokio::io::duplex(64);
        let b = Connection::from_stream(b);
        raw.write_all(&0x7fff_fff0i32.to_le_bytes()).await.unwrap();
        let result = tokio::time::timeout(std::time::Duration::from_secs(3), b.recv()).await.unwrap();
        assert!(matches!(
            result,
            Err(ConnectionError::Framing(transport::Error::BadLength { got: 0x7fff_fff0 }))
        ));
    }

    #[tokio::test]
    async fn hang_up_is_closed() {
        let (a, b) = tokio::io::duplex(64);
        let b = Connection::from_stream(b);
        drop(a);
        assert!(matches!(b.recv().await, Err(ConnectionError::Closed)));
    }
}

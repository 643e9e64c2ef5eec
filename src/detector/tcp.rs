//! TCP event source for the detector sidecar
//!
//! The sidecar serves length-prefixed `ClassificationEvent` frames. A lost or
//! corrupted link is not the end of the stream: the source reconnects with
//! exponential backoff and carries on.

use super::source::{DetectorConfig, EventSource};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use fpga_dispatch_shared::codec::FrameDecoder;
use fpga_dispatch_shared::ClassificationEvent;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Pulls framed events from a detector over TCP
pub struct TcpEventSource {
    address: String,
    config: DetectorConfig,
    stream: Option<TcpStream>,
    decoder: FrameDecoder,
    read_buf: Vec<u8>,
    reconnect_delay: Duration,
}

impl TcpEventSource {
    pub fn new(address: impl Into<String>, config: DetectorConfig) -> Self {
        let reconnect_delay = config.reconnect_delay;
        Self {
            address: address.into(),
            config,
            stream: None,
            decoder: FrameDecoder::new(),
            read_buf: vec![0u8; 4096],
            reconnect_delay,
        }
    }

    /// Connect, retrying until the detector accepts
    async fn connect(&mut self) -> TcpStream {
        loop {
            match timeout(self.config.connect_timeout, TcpStream::connect(&self.address)).await {
                Ok(Ok(stream)) => {
                    info!("[DETECTOR] Connected to {}", self.address);
                    return stream;
                }
                Ok(Err(e)) => {
                    warn!(
                        "[DETECTOR] Connection to {} failed: {} (retry in {:?})",
                        self.address, e, self.reconnect_delay
                    );
                }
                Err(_) => {
                    warn!(
                        "[DETECTOR] Connection to {} timed out (retry in {:?})",
                        self.address, self.reconnect_delay
                    );
                }
            }

            self.backoff().await;
        }
    }

    /// Wait out the current reconnect delay, then double it
    async fn backoff(&mut self) {
        tokio::time::sleep(self.reconnect_delay).await;
        self.reconnect_delay =
            std::cmp::min(self.reconnect_delay * 2, self.config.max_reconnect_delay);
    }

    /// Read once from the current connection into the decoder
    async fn fill(&mut self) -> Result<()> {
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return Err(anyhow!("Not connected")),
        };

        match timeout(self.config.read_timeout, stream.read(&mut self.read_buf)).await {
            Ok(Ok(0)) => Err(anyhow!("Detector closed connection")),
            Ok(Ok(n)) => {
                self.decoder.extend(&self.read_buf[..n]);
                Ok(())
            }
            Ok(Err(e)) => Err(anyhow!("Read error: {}", e)),
            Err(_) => Err(anyhow!("No data for {:?}", self.config.read_timeout)),
        }
    }

    /// Drop the link and back off before the next connect
    async fn disconnect(&mut self, reason: &str) {
        warn!(
            "[DETECTOR] Disconnected: {} (reconnect in {:?})",
            reason, self.reconnect_delay
        );
        self.stream = None;
        self.decoder.reset();
        self.backoff().await;
    }
}

#[async_trait]
impl EventSource for TcpEventSource {
    async fn next_event(&mut self) -> Result<Option<ClassificationEvent>> {
        loop {
            match self.decoder.decode_next() {
                Ok(Some(event)) => {
                    // Only a delivered frame proves the link healthy
                    self.reconnect_delay = self.config.reconnect_delay;
                    debug!(
                        "[DETECTOR] Frame {} ({} bytes buffered)",
                        event.frame_id,
                        self.decoder.buffer_len()
                    );
                    return Ok(Some(event));
                }
                Ok(None) => {}
                Err(e) => {
                    // Framing is lost; resync on a fresh connection
                    self.disconnect(&format!("Corrupt frame: {}", e)).await;
                }
            }

            if self.stream.is_none() {
                let stream = self.connect().await;
                self.stream = Some(stream);
            }

            if let Err(e) = self.fill().await {
                self.disconnect(&e.to_string()).await;
            }
        }
    }

    fn name(&self) -> &'static str {
        "TCP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpga_dispatch_shared::codec;
    use tokio::io::AsyncWriteExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    fn fast_config() -> DetectorConfig {
        DetectorConfig {
            reconnect_delay: Duration::from_millis(10),
            max_reconnect_delay: Duration::from_millis(40),
            connect_timeout: Duration::from_millis(500),
            read_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_reads_framed_events() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let first = codec::encode(&ClassificationEvent::detected(1, "dev1", 0.9)).expect("encode");
            let second = codec::encode(&ClassificationEvent::empty(2)).expect("encode");

            // Split the first frame across two writes
            socket.write_all(&first[..3]).await.expect("write");
            socket.flush().await.expect("flush");
            socket.write_all(&first[3..]).await.expect("write");
            socket.write_all(&second).await.expect("write");

            // Keep the connection open until the reader is done
            let mut buf = [0u8; 1];
            let _ = socket.read(&mut buf).await;
        });

        let mut source = TcpEventSource::new(addr.to_string(), fast_config());

        let first = source.next_event().await.expect("event").expect("some");
        assert_eq!(first.class_label(), Some("dev1"));
        assert!(source.stream.is_some());

        let second = source.next_event().await.expect("event").expect("some");
        assert_eq!(second.frame_id, 2);
        assert_eq!(second.detection, None);
    }

    #[tokio::test]
    async fn test_reconnects_after_peer_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        tokio::spawn(async move {
            for (frame, label) in [(1, "dev2"), (2, "dev4")] {
                let (mut socket, _) = listener.accept().await.expect("accept");
                let encoded =
                    codec::encode(&ClassificationEvent::detected(frame, label, 0.8)).expect("encode");
                socket.write_all(&encoded).await.expect("write");
                // Dropping the socket closes the connection
            }
        });

        let mut source = TcpEventSource::new(addr.to_string(), fast_config());

        let first = source.next_event().await.expect("event").expect("some");
        assert_eq!(first.class_label(), Some("dev2"));

        let second = source.next_event().await.expect("event").expect("some");
        assert_eq!(second.class_label(), Some("dev4"));
    }

    #[tokio::test]
    async fn test_resyncs_after_corrupt_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let garbage = (codec::MAX_FRAME_SIZE + 1).to_be_bytes();
            socket.write_all(&garbage).await.expect("write");

            let (mut socket, _) = listener.accept().await.expect("accept");
            let encoded = codec::encode(&ClassificationEvent::detected(9, "off", 0.7)).expect("encode");
            socket.write_all(&encoded).await.expect("write");
            let mut buf = [0u8; 1];
            let _ = socket.read(&mut buf).await;
        });

        let mut source = TcpEventSource::new(addr.to_string(), fast_config());

        let event = source.next_event().await.expect("event").expect("some");
        assert_eq!(event.frame_id, 9);
        assert_eq!(event.class_label(), Some("off"));
    }

    #[tokio::test]
    async fn test_backs_off_when_peer_closes_immediately() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let accepts = Arc::new(AtomicUsize::new(0));

        let counter = accepts.clone();
        tokio::spawn(async move {
            loop {
                let (socket, _) = listener.accept().await.expect("accept");
                counter.fetch_add(1, Ordering::SeqCst);
                drop(socket);
            }
        });

        let config = DetectorConfig {
            reconnect_delay: Duration::from_millis(50),
            max_reconnect_delay: Duration::from_millis(200),
            ..fast_config()
        };
        let mut source = TcpEventSource::new(addr.to_string(), config);

        // Never yields an event; delays of 50, 100, 200, 200ms bound the retries
        let result = timeout(Duration::from_millis(300), source.next_event()).await;
        assert!(result.is_err(), "no event should arrive");

        let count = accepts.load(Ordering::SeqCst);
        assert!(count >= 1, "source never connected");
        assert!(count <= 5, "reconnected {} times in 300ms", count);
    }

    #[tokio::test]
    async fn test_reconnects_after_read_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        tokio::spawn(async move {
            // Half-open: accept and never write
            let (_silent, _) = listener.accept().await.expect("accept");

            let (mut socket, _) = listener.accept().await.expect("accept");
            let encoded = codec::encode(&ClassificationEvent::detected(4, "dev2", 0.6)).expect("encode");
            socket.write_all(&encoded).await.expect("write");
            let mut buf = [0u8; 1];
            let _ = socket.read(&mut buf).await;
        });

        let config = DetectorConfig {
            read_timeout: Duration::from_millis(50),
            ..fast_config()
        };
        let mut source = TcpEventSource::new(addr.to_string(), config);

        let event = timeout(Duration::from_secs(5), source.next_event())
            .await
            .expect("source stuck on silent connection")
            .expect("event")
            .expect("some");
        assert_eq!(event.frame_id, 4);
        assert_eq!(event.class_label(), Some("dev2"));
    }
}

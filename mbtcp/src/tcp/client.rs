use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::common::frame::FramedReader;
use crate::common::phys::PhysLayer;
use crate::decode::DecodeLevel;
use crate::error::{ConnectionError, RequestError};
use crate::tcp::frame::{MbapDisplay, MbapParser};

/// One TCP connection to a Modbus server
///
/// Exchanges are strictly one request frame followed by one response frame. The socket is
/// moved into each exchange and only put back when the exchange completes cleanly, so a
/// timeout, a connection error, a framing error or a dropped future all release it. After
/// that every exchange fails with [`ConnectionError::NotConnected`].
pub struct Transport {
    phys: Option<PhysLayer>,
    reader: FramedReader<MbapParser>,
    decode: DecodeLevel,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("phys", &self.phys)
            .field("decode", &self.decode)
            .finish()
    }
}

impl Transport {
    /// Open a TCP connection to `host:port`
    ///
    /// Every address the host resolves to is tried in turn, the whole attempt bounded by
    /// `timeout`. Fails with [`ConnectionError::ResolutionFailed`] if the name does not resolve,
    /// [`ConnectionError::Refused`] if no address accepts, and [`ConnectionError::Timeout`]
    /// if the timeout elapses first.
    pub async fn connect(
        host: &str,
        port: u16,
        timeout: Duration,
        decode: DecodeLevel,
    ) -> Result<Self, RequestError> {
        let socket = match tokio::time::timeout(timeout, Self::open(host, port)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!("timeout connecting to {host}:{port}");
                return Err(ConnectionError::Timeout.into());
            }
        };

        if let Err(err) = socket.set_nodelay(true) {
            tracing::warn!("unable to enable TCP_NODELAY: {err}");
        }

        tracing::info!("connected to: {host}:{port}");
        Ok(Self::new(PhysLayer::new_tcp(socket), decode))
    }

    async fn open(host: &str, port: u16) -> Result<TcpStream, RequestError> {
        let addrs = match tokio::net::lookup_host((host, port)).await {
            Ok(addrs) => addrs,
            Err(err) => {
                tracing::warn!("unable to resolve {host}: {err}");
                return Err(ConnectionError::ResolutionFailed.into());
            }
        };

        let mut last = ConnectionError::ResolutionFailed;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(socket) => return Ok(socket),
                Err(err) => {
                    tracing::warn!("error connecting to {addr}: {err}");
                    last = err.kind().into();
                }
            }
        }
        Err(last.into())
    }

    pub(crate) fn new(phys: PhysLayer, decode: DecodeLevel) -> Self {
        Self {
            phys: Some(phys),
            reader: FramedReader::new(MbapParser),
            decode,
        }
    }

    /// True until the connection is closed or a fatal error occurs
    pub fn is_connected(&self) -> bool {
        self.phys.is_some()
    }

    /// Decode level used for logging
    pub fn decode_level(&self) -> DecodeLevel {
        self.decode
    }

    /// Write one complete frame, then read exactly one complete frame back
    ///
    /// `timeout` bounds the write and the read together. Bytes beyond the frame that the
    /// header announces are never read.
    pub async fn send_and_receive(
        &mut self,
        frame: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, RequestError> {
        let mut phys = self.phys.take().ok_or(ConnectionError::NotConnected)?;

        let deadline = Instant::now() + timeout;
        let result = tokio::select! {
            _ = tokio::time::sleep_until(deadline) => Err(RequestError::ResponseTimeout),
            result = Self::exchange(&mut phys, &mut self.reader, self.decode, frame) => result,
        };

        match result {
            Ok(response) => {
                self.phys = Some(phys);
                Ok(response)
            }
            Err(err) => {
                tracing::warn!("closing connection: {err}");
                Err(err)
            }
        }
    }

    async fn exchange(
        phys: &mut PhysLayer,
        reader: &mut FramedReader<MbapParser>,
        decode: DecodeLevel,
        frame: &[u8],
    ) -> Result<Vec<u8>, RequestError> {
        if decode.adu.enabled() {
            tracing::info!("MBAP TX - {}", MbapDisplay::new(decode.adu, frame));
        }

        phys.write(frame, decode.physical).await?;
        let response = reader.next_frame(phys, decode.physical).await?;

        if decode.adu.enabled() {
            tracing::info!("MBAP RX - {}", MbapDisplay::new(decode.adu, response));
        }

        Ok(response.to_vec())
    }

    /// Drop the socket without a graceful shutdown
    pub(crate) fn abort(&mut self) {
        if self.phys.take().is_some() {
            tracing::info!("connection aborted");
        }
    }

    /// Shut the socket down and release it
    pub async fn close(mut self) {
        if let Some(mut phys) = self.phys.take() {
            if let Err(err) = phys.shutdown().await {
                tracing::debug!("error during shutdown: {err}");
            }
            tracing::info!("connection closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;
    use crate::error::FrameParseError;

    const REQUEST: &[u8] = &[
        0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x03, 0x00, 0x01,
    ];
    const RESPONSE: &[u8] = &[0x00, 0x01, 0x00, 0x00, 0x00, 0x05, 0x01, 0x03, 0x02, 0x01, 0xF4];

    fn transport(io: &mut Builder) -> Transport {
        Transport::new(PhysLayer::new_mock(io.build()), DecodeLevel::nothing())
    }

    #[tokio::test]
    async fn receives_one_frame_in_several_segments() {
        let mut transport = transport(
            Builder::new()
                .write(REQUEST)
                .read(&RESPONSE[..3])
                .read(&RESPONSE[3..9])
                .read(&RESPONSE[9..]),
        );

        let response = transport
            .send_and_receive(REQUEST, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(response, RESPONSE);
        assert!(transport.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_server_times_out_and_closes() {
        let mut transport = transport(
            Builder::new()
                .write(REQUEST)
                .wait(Duration::from_secs(60)),
        );

        let start = Instant::now();
        let result = transport
            .send_and_receive(REQUEST, Duration::from_secs(2))
            .await;

        assert_eq!(result, Err(RequestError::ResponseTimeout));
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(60));
        assert!(!transport.is_connected());

        assert_eq!(
            transport
                .send_and_receive(REQUEST, Duration::from_secs(2))
                .await,
            Err(RequestError::Connection(ConnectionError::NotConnected))
        );
    }

    #[tokio::test]
    async fn peer_close_mid_frame_is_a_connection_error() {
        let mut transport = transport(Builder::new().write(REQUEST).read(&RESPONSE[..8]));

        assert_eq!(
            transport
                .send_and_receive(REQUEST, Duration::from_secs(1))
                .await,
            Err(RequestError::Connection(ConnectionError::Closed))
        );
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn bad_header_closes_the_connection() {
        let mut transport = transport(
            Builder::new()
                .write(REQUEST)
                .read(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x01]),
        );

        assert_eq!(
            transport
                .send_and_receive(REQUEST, Duration::from_secs(1))
                .await,
            Err(RequestError::Framing(FrameParseError::MbapLengthZero))
        );
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn close_releases_the_socket() {
        let transport = transport(&mut Builder::new());
        assert!(transport.is_connected());
        transport.close().await;
    }
}

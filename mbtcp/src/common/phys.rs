use std::fmt::Write;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::decode::PhysDecodeLevel;

trait Stream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> Stream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// The byte stream under a [`Transport`](crate::Transport)
///
/// Every read and write is logged at the configured [`PhysDecodeLevel`].
pub(crate) struct PhysLayer {
    kind: &'static str,
    stream: Box<dyn Stream>,
}

impl std::fmt::Debug for PhysLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.kind)
    }
}

impl PhysLayer {
    pub(crate) fn new_tcp(socket: TcpStream) -> Self {
        Self {
            kind: "tcp",
            stream: Box::new(socket),
        }
    }

    #[cfg(test)]
    pub(crate) fn new_mock(mock: tokio_test::io::Mock) -> Self {
        Self {
            kind: "mock",
            stream: Box::new(mock),
        }
    }

    /// Read whatever is available, up to the size of `buffer`
    pub(crate) async fn read(
        &mut self,
        buffer: &mut [u8],
        level: PhysDecodeLevel,
    ) -> Result<usize, std::io::Error> {
        let count = self.stream.read(buffer).await?;
        if let Some(data) = buffer.get(..count) {
            log("RX", level, data);
        }
        Ok(count)
    }

    pub(crate) async fn write(
        &mut self,
        data: &[u8],
        level: PhysDecodeLevel,
    ) -> Result<(), std::io::Error> {
        log("TX", level, data);
        self.stream.write_all(data).await
    }

    pub(crate) async fn shutdown(&mut self) -> Result<(), std::io::Error> {
        self.stream.shutdown().await
    }
}

fn log(direction: &str, level: PhysDecodeLevel, data: &[u8]) {
    if level.enabled() {
        tracing::info!("PHYS {direction} - {}", PhysDisplay { level, data });
    }
}

struct PhysDisplay<'a> {
    level: PhysDecodeLevel,
    data: &'a [u8],
}

impl std::fmt::Display for PhysDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} bytes", self.data.len())?;
        if self.level.data_enabled() {
            format_bytes(f, self.data)?;
        }
        Ok(())
    }
}

const BYTES_PER_LINE: usize = 18;

/// Hex dump starting on a new line, `BYTES_PER_LINE` bytes per line
pub(crate) fn format_bytes(f: &mut std::fmt::Formatter, bytes: &[u8]) -> std::fmt::Result {
    for line in bytes.chunks(BYTES_PER_LINE) {
        f.write_char('\n')?;
        for (i, byte) in line.iter().enumerate() {
            if i > 0 {
                f.write_char(' ')?;
            }
            write!(f, "{byte:02X}")?;
        }
    }
    Ok(())
}

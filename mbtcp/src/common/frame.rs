use crate::common::phys::PhysLayer;
use crate::decode::PhysDecodeLevel;
use crate::error::{ConnectionError, InternalError, RequestError};

/// Modbus TCP transaction identifier
///
/// Each session owns its own counter. Ids start at zero and wrap after `0xFFFF`.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default, Hash)]
pub struct TxId {
    value: u16,
}

impl TxId {
    /// Create a transaction id with a specific value
    pub fn new(value: u16) -> Self {
        TxId { value }
    }

    /// Raw value of the id
    pub fn to_u16(self) -> u16 {
        self.value
    }

    /// Return the current value and advance the counter, wrapping to zero
    pub fn next(&mut self) -> TxId {
        let ret = *self;
        self.value = self.value.wrapping_add(1);
        ret
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06X}", self.value)
    }
}

/// Describes how to find the end of a frame from its fixed size header
pub(crate) trait FrameParser {
    fn header_length(&self) -> usize;

    fn max_frame_size(&self) -> usize;

    /// Validate a complete header and return the number of bytes that follow it
    fn parse_header(&self, header: &[u8]) -> Result<usize, RequestError>;
}

/// Reads exactly one frame at a time off the physical layer
///
/// Reads are bounded by the frame currently being assembled, so bytes belonging
/// to a later frame are never pulled off the socket.
pub(crate) struct FramedReader<T>
where
    T: FrameParser,
{
    parser: T,
    buffer: Vec<u8>,
}

impl<T: FrameParser> FramedReader<T> {
    pub(crate) fn new(parser: T) -> Self {
        let size = parser.max_frame_size();
        Self {
            parser,
            buffer: vec![0; size],
        }
    }

    pub(crate) async fn next_frame(
        &mut self,
        io: &mut PhysLayer,
        level: PhysDecodeLevel,
    ) -> Result<&[u8], RequestError> {
        let header_length = self.parser.header_length();
        self.fill(io, 0, header_length, level).await?;

        let header = self
            .buffer
            .get(..header_length)
            .ok_or(InternalError::BadSeekOperation)?;
        let body_length = self.parser.parse_header(header)?;

        let total = header_length + body_length;
        self.fill(io, header_length, total, level).await?;

        self.buffer
            .get(..total)
            .ok_or_else(|| InternalError::BadSeekOperation.into())
    }

    async fn fill(
        &mut self,
        io: &mut PhysLayer,
        mut filled: usize,
        target: usize,
        level: PhysDecodeLevel,
    ) -> Result<(), RequestError> {
        while filled < target {
            let dest = self
                .buffer
                .get_mut(filled..target)
                .ok_or(InternalError::BadSeekOperation)?;
            let count = io.read(dest, level).await?;
            if count == 0 {
                return Err(ConnectionError::Closed.into());
            }
            filled += count;
        }
        Ok(())
    }
}

use crate::exception::ExceptionCode;

/// Top level error type returned by every client operation
///
/// Each variant is one failure class. Callers match on the variant to decide
/// whether the session can be reused ([`RequestError::is_fatal`]) and whether a
/// retry makes sense. The library itself never retries.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RequestError {
    /// Request parameters violate protocol limits, nothing was sent
    Encoding(InvalidRequest),
    /// An argument is outside what the operation accepts, nothing was sent
    InvalidArgument(InvalidArgument),
    /// Received bytes are not a well-formed Modbus TCP frame
    Framing(FrameParseError),
    /// Frame is well-formed but does not answer the outstanding request
    Protocol(ProtocolError),
    /// The server answered with a Modbus exception
    Exception(ExceptionCode),
    /// No complete response was received before the timeout elapsed
    ResponseTimeout,
    /// Socket level failure
    Connection(ConnectionError),
    /// Library bug while reading or writing an internal buffer
    Internal(InternalError),
}

impl RequestError {
    /// Returns true if the error closed the underlying connection
    ///
    /// A fatal error leaves the session unusable: the caller must open a new one.
    /// Exceptions, protocol errors and argument errors leave the session usable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RequestError::Framing(_) | RequestError::ResponseTimeout | RequestError::Connection(_)
        )
    }
}

impl std::error::Error for RequestError {}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RequestError::Encoding(err) => write!(f, "invalid request: {err}"),
            RequestError::InvalidArgument(err) => write!(f, "invalid argument: {err}"),
            RequestError::Framing(err) => write!(f, "bad frame: {err}"),
            RequestError::Protocol(err) => write!(f, "protocol error: {err}"),
            RequestError::Exception(ex) => write!(f, "modbus exception: {ex}"),
            RequestError::ResponseTimeout => {
                f.write_str("timeout occurred before receiving a response from the server")
            }
            RequestError::Connection(err) => write!(f, "connection error: {err}"),
            RequestError::Internal(err) => write!(f, "internal error: {err}"),
        }
    }
}

impl From<InvalidRequest> for RequestError {
    fn from(err: InvalidRequest) -> Self {
        RequestError::Encoding(err)
    }
}

impl From<InvalidArgument> for RequestError {
    fn from(err: InvalidArgument) -> Self {
        RequestError::InvalidArgument(err)
    }
}

impl From<FrameParseError> for RequestError {
    fn from(err: FrameParseError) -> Self {
        RequestError::Framing(err)
    }
}

impl From<ProtocolError> for RequestError {
    fn from(err: ProtocolError) -> Self {
        RequestError::Protocol(err)
    }
}

impl From<ExceptionCode> for RequestError {
    fn from(ex: ExceptionCode) -> Self {
        RequestError::Exception(ex)
    }
}

impl From<ConnectionError> for RequestError {
    fn from(err: ConnectionError) -> Self {
        RequestError::Connection(err)
    }
}

impl From<InternalError> for RequestError {
    fn from(err: InternalError) -> Self {
        RequestError::Internal(err)
    }
}

impl From<std::io::Error> for RequestError {
    fn from(err: std::io::Error) -> Self {
        RequestError::Connection(err.kind().into())
    }
}

/// Errors that result from request parameters outside the protocol limits
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InvalidRequest {
    /// Request contains a count of zero
    CountOfZero,
    /// Start and count would overflow the 16-bit address space
    AddressOverflow(u16, u16),
    /// Count exceeds the maximum for the function (count, max)
    CountTooLargeForType(u16, u16),
}

impl std::error::Error for InvalidRequest {}

impl std::fmt::Display for InvalidRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InvalidRequest::CountOfZero => f.write_str("request contains a count of zero"),
            InvalidRequest::AddressOverflow(start, count) => write!(
                f,
                "start == {start} and count == {count} would overflow the representation of u16"
            ),
            InvalidRequest::CountTooLargeForType(count, max) => write!(
                f,
                "the request count of {count} exceeds maximum allowed count of {max} for this type"
            ),
        }
    }
}

/// Errors that result from arguments an operation does not accept
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InvalidArgument {
    /// Count is outside `1..=max` (count, max)
    CountOutOfRange(u16, u16),
    /// Function code is not valid for the operation
    UnsupportedFunction(u8),
    /// Float conversion needs an even number of registers
    OddRegisterCount(usize),
    /// Register conversion needs an even number of bytes
    OddByteCount(usize),
    /// Float conversion needs a multiple of 4 bytes
    BadByteCountForFloat(usize),
    /// Too few bytes to unpack the requested number of bits (needed, present)
    InsufficientBits(usize, usize),
    /// Unit identifier must be in `1..=255`
    InvalidUnitId(u8),
    /// Port must be in `1..=65535`
    InvalidPort,
    /// Timeout must be greater than zero
    ZeroTimeout,
}

impl std::error::Error for InvalidArgument {}

impl std::fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InvalidArgument::CountOutOfRange(count, max) => {
                write!(f, "count of {count} is outside the allowed range 1..={max}")
            }
            InvalidArgument::UnsupportedFunction(fc) => {
                write!(f, "function code {fc:#04X} is not supported by this operation")
            }
            InvalidArgument::OddRegisterCount(count) => {
                write!(f, "float conversion requires an even register count, got {count}")
            }
            InvalidArgument::OddByteCount(count) => {
                write!(f, "register conversion requires an even byte count, got {count}")
            }
            InvalidArgument::BadByteCountForFloat(count) => write!(
                f,
                "float conversion requires a multiple of 4 bytes, got {count}"
            ),
            InvalidArgument::InsufficientBits(needed, present) => write!(
                f,
                "unpacking bits requires {needed} bytes but only {present} are present"
            ),
            InvalidArgument::InvalidUnitId(id) => {
                write!(f, "unit id {id} is outside the allowed range 1..=255")
            }
            InvalidArgument::InvalidPort => f.write_str("port must be between 1 and 65535"),
            InvalidArgument::ZeroTimeout => f.write_str("timeout must be greater than zero"),
        }
    }
}

/// Errors that occur while parsing a frame off the stream
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameParseError {
    /// Fewer than 7 bytes available for the MBAP header
    IncompleteHeader(usize),
    /// Received frame with the length field set to zero
    MbapLengthZero,
    /// Received frame with length that exceeds max allowed size (actual, max)
    MbapLengthTooBig(usize, usize),
    /// Received frame with a non-Modbus protocol id
    UnknownProtocolId(u16),
    /// Length field doesn't match the number of bytes that follow it (declared, actual)
    LengthMismatch(usize, usize),
    /// PDU is too short to be valid
    InsufficientBytes,
    /// Byte count doesn't match the number of bytes remaining (count, remaining)
    ByteCountMismatch(usize, usize),
    /// Register block with an odd byte count
    OddRegisterByteCount(usize),
    /// PDU contains extra trailing bytes
    TrailingBytes(usize),
    /// Coil state in a write single coil reply is neither ON nor OFF
    UnknownCoilState(u16),
}

impl std::error::Error for FrameParseError {}

impl std::fmt::Display for FrameParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FrameParseError::IncompleteHeader(count) => {
                write!(f, "MBAP header requires 7 bytes, got {count}")
            }
            FrameParseError::MbapLengthZero => {
                f.write_str("received frame with the length field set to zero")
            }
            FrameParseError::MbapLengthTooBig(size, max) => write!(
                f,
                "received frame with length ({size}) that exceeds max allowed size ({max})"
            ),
            FrameParseError::UnknownProtocolId(id) => {
                write!(f, "received frame with non-Modbus protocol id: {id}")
            }
            FrameParseError::LengthMismatch(declared, actual) => write!(
                f,
                "length field ({declared}) doesn't match the number of bytes received ({actual})"
            ),
            FrameParseError::InsufficientBytes => f.write_str("response is too short to be valid"),
            FrameParseError::ByteCountMismatch(count, remaining) => write!(
                f,
                "byte count ({count}) doesn't match the actual number of bytes remaining ({remaining})"
            ),
            FrameParseError::OddRegisterByteCount(count) => {
                write!(f, "register block has an odd byte count ({count})")
            }
            FrameParseError::TrailingBytes(remaining) => {
                write!(f, "response contains {remaining} extra trailing bytes")
            }
            FrameParseError::UnknownCoilState(value) => write!(
                f,
                "received coil state with unspecified value: {value:#06X}"
            ),
        }
    }
}

/// Errors for frames that are valid but don't answer the outstanding request
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// Response carries a different transaction id (expected, received)
    TxIdMismatch(u16, u16),
    /// Response carries a different unit id (expected, received)
    UnitIdMismatch(u8, u8),
    /// Response function code differs from the request (expected, received)
    UnexpectedFunction(u8, u8),
    /// Response function code is not one this client understands
    UnknownFunction(u8),
    /// Byte count doesn't match the requested quantity (expected, received)
    ByteCountMismatch(usize, usize),
    /// Address echoed in a single write reply doesn't match the request
    ReplyEchoMismatch,
}

impl std::error::Error for ProtocolError {}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ProtocolError::TxIdMismatch(expected, received) => write!(
                f,
                "received transaction id {received:#06X} while expecting {expected:#06X}"
            ),
            ProtocolError::UnitIdMismatch(expected, received) => write!(
                f,
                "received unit id {received} while expecting {expected}"
            ),
            ProtocolError::UnexpectedFunction(expected, received) => write!(
                f,
                "received function code {received:#04X} while expecting {expected:#04X}"
            ),
            ProtocolError::UnknownFunction(fc) => {
                write!(f, "received unknown function code: {fc:#04X}")
            }
            ProtocolError::ByteCountMismatch(expected, received) => write!(
                f,
                "byte count ({received}) doesn't match what is expected based on request ({expected})"
            ),
            ProtocolError::ReplyEchoMismatch => {
                f.write_str("a parameter expected to be echoed in the reply did not match")
            }
        }
    }
}

/// Socket level failures
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConnectionError {
    /// Host name could not be resolved to an address
    ResolutionFailed,
    /// Connection was actively refused
    Refused,
    /// Connection attempt did not complete before the timeout
    Timeout,
    /// Connection was reset or aborted by the peer
    Reset,
    /// Peer closed the socket before a complete frame was received
    Closed,
    /// Session has no open connection
    NotConnected,
    /// Other I/O failure
    Io(std::io::ErrorKind),
}

impl From<std::io::ErrorKind> for ConnectionError {
    fn from(kind: std::io::ErrorKind) -> Self {
        match kind {
            std::io::ErrorKind::ConnectionRefused => ConnectionError::Refused,
            std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe => ConnectionError::Reset,
            std::io::ErrorKind::UnexpectedEof => ConnectionError::Closed,
            std::io::ErrorKind::NotConnected => ConnectionError::NotConnected,
            _ => ConnectionError::Io(kind),
        }
    }
}

impl std::error::Error for ConnectionError {}

impl std::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ConnectionError::ResolutionFailed => f.write_str("unable to resolve host name"),
            ConnectionError::Refused => f.write_str("connection refused"),
            ConnectionError::Timeout => f.write_str("timeout while connecting"),
            ConnectionError::Reset => f.write_str("connection reset by peer"),
            ConnectionError::Closed => f.write_str("connection closed by peer"),
            ConnectionError::NotConnected => f.write_str("no connection exists to the Modbus server"),
            ConnectionError::Io(kind) => write!(f, "I/O error: {kind}"),
        }
    }
}

/// Errors that indicate a bug in the library itself
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InternalError {
    /// Attempted to write more bytes than allowed (write size, remaining)
    InsufficientWriteSpace(usize, usize),
    /// Cursor seek operation exceeded the bounds of the underlying buffer
    BadSeekOperation,
    /// Byte count would exceed maximum size of u8
    BadByteCount(usize),
    /// Decoded payload doesn't belong to the function that was checked
    PayloadMismatch,
    /// A single value was requested but none was decoded
    MissingValue,
}

impl std::error::Error for InternalError {}

impl std::fmt::Display for InternalError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InternalError::InsufficientWriteSpace(written, remaining) => write!(
                f,
                "attempted to write {written} bytes with {remaining} bytes remaining"
            ),
            InternalError::BadSeekOperation => {
                f.write_str("cursor seek operation exceeded the bounds of the underlying buffer")
            }
            InternalError::BadByteCount(size) => {
                write!(f, "byte count would exceed maximum size of u8: {size}")
            }
            InternalError::PayloadMismatch => {
                f.write_str("decoded payload doesn't match the response function")
            }
            InternalError::MissingValue => f.write_str("response did not contain a value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_level_errors_are_fatal() {
        assert!(RequestError::ResponseTimeout.is_fatal());
        assert!(RequestError::Connection(ConnectionError::Reset).is_fatal());
        assert!(RequestError::Framing(FrameParseError::MbapLengthZero).is_fatal());

        assert!(!RequestError::Exception(ExceptionCode::IllegalDataAddress).is_fatal());
        assert!(!RequestError::Protocol(ProtocolError::TxIdMismatch(1, 2)).is_fatal());
        assert!(!RequestError::Encoding(InvalidRequest::CountOfZero).is_fatal());
    }

    #[test]
    fn classifies_io_errors() {
        let err: RequestError =
            std::io::Error::from(std::io::ErrorKind::ConnectionRefused).into();
        assert_eq!(err, RequestError::Connection(ConnectionError::Refused));

        let err: RequestError = std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into();
        assert_eq!(err, RequestError::Connection(ConnectionError::Closed));
    }
}

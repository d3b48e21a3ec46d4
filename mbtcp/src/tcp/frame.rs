use crate::common::cursor::{ReadCursor, WriteCursor};
use crate::common::frame::{FrameParser, TxId};
use crate::common::function::FunctionCode;
use crate::common::pdu::{Request, Response, ResponsePayload};
use crate::common::phys::format_bytes;
use crate::decode::AduDecodeLevel;
use crate::error::{FrameParseError, InternalError, ProtocolError, RequestError};
use crate::exception::ExceptionCode;
use crate::types::UnitId;

pub(crate) mod constants {
    pub(crate) const HEADER_LENGTH: usize = 7;
    pub(crate) const MAX_PDU_LENGTH: usize = 253;
    // includes the 1 byte unit id
    pub(crate) const MAX_LENGTH_FIELD: usize = MAX_PDU_LENGTH + 1;
    pub(crate) const MAX_FRAME_LENGTH: usize = HEADER_LENGTH + MAX_PDU_LENGTH;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MbapHeader {
    pub(crate) tx_id: TxId,
    /// raw value of the length field, unit id included
    pub(crate) length: usize,
    pub(crate) unit_id: UnitId,
}

impl MbapHeader {
    fn parse(cursor: &mut ReadCursor) -> Result<Self, FrameParseError> {
        if cursor.remaining() < constants::HEADER_LENGTH {
            return Err(FrameParseError::IncompleteHeader(cursor.remaining()));
        }

        let tx_id = TxId::new(cursor.read_u16_be()?);
        let protocol_id = cursor.read_u16_be()?;
        let length = usize::from(cursor.read_u16_be()?);
        let unit_id = UnitId::new(cursor.read_u8()?);

        if protocol_id != 0 {
            return Err(FrameParseError::UnknownProtocolId(protocol_id));
        }

        // must be > 0 b/c the 1-byte unit identifier counts towards length
        if length == 0 {
            return Err(FrameParseError::MbapLengthZero);
        }

        if length > constants::MAX_LENGTH_FIELD {
            return Err(FrameParseError::MbapLengthTooBig(
                length,
                constants::MAX_LENGTH_FIELD,
            ));
        }

        Ok(Self {
            tx_id,
            length,
            unit_id,
        })
    }

    /// number of PDU bytes that follow the 7 byte header
    fn pdu_length(&self) -> usize {
        self.length - 1
    }
}

/// Finds frame boundaries on the stream using the MBAP length field
pub(crate) struct MbapParser;

impl FrameParser for MbapParser {
    fn header_length(&self) -> usize {
        constants::HEADER_LENGTH
    }

    fn max_frame_size(&self) -> usize {
        constants::MAX_FRAME_LENGTH
    }

    fn parse_header(&self, header: &[u8]) -> Result<usize, RequestError> {
        let header = MbapHeader::parse(&mut ReadCursor::new(header))?;
        Ok(header.pdu_length())
    }
}

/// Encode a request as a complete MBAP frame
///
/// Fails with [`RequestError::Encoding`] if the address range overflows the 16-bit address
/// space, the count is zero, or the count exceeds the maximum for the function.
pub fn encode_request(request: &Request) -> Result<Vec<u8>, RequestError> {
    format(request.tx_id, request.unit_id, |cursor| {
        request.pdu.serialize(cursor)
    })
}

/// Encode a response as a complete MBAP frame
///
/// This is the inverse of [`decode_response`] and is what a server would put on the wire.
pub fn encode_response(response: &Response) -> Result<Vec<u8>, RequestError> {
    format(response.tx_id, response.unit_id, |cursor| {
        response.payload.serialize(response.function, cursor)
    })
}

fn format<F>(tx_id: TxId, unit_id: UnitId, write_pdu: F) -> Result<Vec<u8>, RequestError>
where
    F: FnOnce(&mut WriteCursor) -> Result<(), RequestError>,
{
    let mut buffer = [0u8; constants::MAX_FRAME_LENGTH];
    let mut cursor = WriteCursor::new(&mut buffer);
    cursor.write_u16_be(tx_id.to_u16())?;
    cursor.write_u16_be(0)?;
    cursor.seek_from_current(2)?; // write the length later
    cursor.write_u8(unit_id.value)?;

    let pdu_length = {
        let start = cursor.position();
        write_pdu(&mut cursor)?;
        cursor.position() - start
    };

    // write the resulting length
    let length_field = u16::try_from(pdu_length + 1)
        .map_err(|_| InternalError::InsufficientWriteSpace(pdu_length, 0))?;
    let end = cursor.position();
    cursor.seek_from_start(4)?;
    cursor.write_u16_be(length_field)?;
    cursor.seek_from_start(end)?;

    Ok(cursor.written().to_vec())
}

/// Decode one complete MBAP frame into a response
///
/// The length field must exactly match the number of bytes after it. A function code with the
/// high bit set decodes to [`ResponsePayload::Exception`]. Function codes this client does not
/// implement are reported as [`RequestError::Protocol`], malformed payloads as
/// [`RequestError::Framing`].
pub fn decode_response(frame: &[u8]) -> Result<Response, RequestError> {
    let mut cursor = ReadCursor::new(frame);
    let header = MbapHeader::parse(&mut cursor)?;

    // the unit id is already consumed but counts towards the length
    let actual = cursor.remaining() + 1;
    if header.length != actual {
        return Err(FrameParseError::LengthMismatch(header.length, actual).into());
    }

    let raw = cursor.read_u8()?;
    let (function, payload) = if raw & 0x80 != 0 {
        let function =
            FunctionCode::get(raw & 0x7F).ok_or(ProtocolError::UnknownFunction(raw))?;
        let code = ExceptionCode::from(cursor.read_u8()?);
        cursor.expect_empty()?;
        (function, ResponsePayload::Exception(code))
    } else {
        let function = FunctionCode::get(raw).ok_or(ProtocolError::UnknownFunction(raw))?;
        (function, ResponsePayload::parse(function, &mut cursor)?)
    };

    Ok(Response {
        tx_id: header.tx_id,
        unit_id: header.unit_id,
        function,
        payload,
    })
}

pub(crate) struct MbapDisplay<'a> {
    level: AduDecodeLevel,
    frame: &'a [u8],
}

impl<'a> MbapDisplay<'a> {
    pub(crate) fn new(level: AduDecodeLevel, frame: &'a [u8]) -> Self {
        MbapDisplay { level, frame }
    }
}

impl std::fmt::Display for MbapDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match MbapHeader::parse(&mut ReadCursor::new(self.frame)) {
            Ok(header) => write!(
                f,
                "tx_id: {} unit: {} len: {}",
                header.tx_id,
                header.unit_id,
                header.pdu_length()
            )?,
            Err(err) => write!(f, "bad header: {err}")?,
        }
        if self.level.payload_enabled() {
            if let Some(pdu) = self.frame.get(constants::HEADER_LENGTH..) {
                format_bytes(f, pdu)?;
            }
        }
        Ok(())
    }
}

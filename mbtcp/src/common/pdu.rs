use crate::common::bits::num_bytes_for_bits;
use crate::common::cursor::{ReadCursor, WriteCursor};
use crate::common::frame::TxId;
use crate::common::function::FunctionCode;
use crate::decode::PduDecodeLevel;
use crate::error::{FrameParseError, InternalError, InvalidArgument, ProtocolError, RequestError};
use crate::exception::ExceptionCode;
use crate::types::{coil_to_u16, AddressRange, Indexed, UnitId};

/// Function specific part of a request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestPdu {
    /// Read a block of coils (0x01)
    ReadCoils(AddressRange),
    /// Read a block of discrete inputs (0x02)
    ReadDiscreteInputs(AddressRange),
    /// Read a block of holding registers (0x03)
    ReadHoldingRegisters(AddressRange),
    /// Read a block of input registers (0x04)
    ReadInputRegisters(AddressRange),
    /// Write one coil (0x05)
    WriteSingleCoil(Indexed<bool>),
    /// Write one holding register (0x06)
    WriteSingleRegister(Indexed<u16>),
}

/// A complete request as it goes on the wire
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request {
    /// transaction id used to correlate the response
    pub tx_id: TxId,
    /// addressed unit
    pub unit_id: UnitId,
    /// function code and payload
    pub pdu: RequestPdu,
}

/// Function specific part of a response
#[derive(Clone, Debug, PartialEq)]
pub enum ResponsePayload {
    /// Bit-packed block, LSB of the first byte is the first address
    Bits(Vec<u8>),
    /// Register block, already converted from big-endian
    Registers(Vec<u16>),
    /// Address and raw value echoed by a single write
    WriteSingle(Indexed<u16>),
    /// Exception code returned in place of a normal response
    Exception(ExceptionCode),
}

/// A complete decoded response
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    /// transaction id copied from the request by the server
    pub tx_id: TxId,
    /// unit that answered
    pub unit_id: UnitId,
    /// function code, with the exception bit removed
    pub function: FunctionCode,
    /// function specific payload
    pub payload: ResponsePayload,
}

impl RequestPdu {
    /// Build a read request for one of the four read function codes
    pub fn read(function: FunctionCode, start: u16, count: u16) -> Result<Self, RequestError> {
        let range = AddressRange::try_from(start, count)?;
        let pdu = match function {
            FunctionCode::ReadCoils => RequestPdu::ReadCoils(range),
            FunctionCode::ReadDiscreteInputs => RequestPdu::ReadDiscreteInputs(range),
            FunctionCode::ReadHoldingRegisters => RequestPdu::ReadHoldingRegisters(range),
            FunctionCode::ReadInputRegisters => RequestPdu::ReadInputRegisters(range),
            FunctionCode::WriteSingleCoil | FunctionCode::WriteSingleRegister => {
                return Err(InvalidArgument::UnsupportedFunction(function.get_value()).into())
            }
        };
        pdu.validate()?;
        Ok(pdu)
    }

    /// Function code of the request
    pub fn function(&self) -> FunctionCode {
        match self {
            RequestPdu::ReadCoils(_) => FunctionCode::ReadCoils,
            RequestPdu::ReadDiscreteInputs(_) => FunctionCode::ReadDiscreteInputs,
            RequestPdu::ReadHoldingRegisters(_) => FunctionCode::ReadHoldingRegisters,
            RequestPdu::ReadInputRegisters(_) => FunctionCode::ReadInputRegisters,
            RequestPdu::WriteSingleCoil(_) => FunctionCode::WriteSingleCoil,
            RequestPdu::WriteSingleRegister(_) => FunctionCode::WriteSingleRegister,
        }
    }

    /// Check the address range against the 16-bit address space and the per-function limits
    pub fn validate(&self) -> Result<(), RequestError> {
        match self {
            RequestPdu::ReadCoils(range) | RequestPdu::ReadDiscreteInputs(range) => {
                AddressRange::try_from(range.start, range.count)?.of_read_bits()?;
            }
            RequestPdu::ReadHoldingRegisters(range) | RequestPdu::ReadInputRegisters(range) => {
                AddressRange::try_from(range.start, range.count)?.of_read_registers()?;
            }
            RequestPdu::WriteSingleCoil(_) | RequestPdu::WriteSingleRegister(_) => {}
        }
        Ok(())
    }

    /// Number of data bytes a normal response must carry, for the read functions
    pub(crate) fn expected_byte_count(&self) -> Option<usize> {
        match self {
            RequestPdu::ReadCoils(range) | RequestPdu::ReadDiscreteInputs(range) => {
                Some(num_bytes_for_bits(usize::from(range.count)))
            }
            RequestPdu::ReadHoldingRegisters(range) | RequestPdu::ReadInputRegisters(range) => {
                Some(2 * usize::from(range.count))
            }
            RequestPdu::WriteSingleCoil(_) | RequestPdu::WriteSingleRegister(_) => None,
        }
    }

    pub(crate) fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        self.validate()?;
        cursor.write_u8(self.function().get_value())?;
        match self {
            RequestPdu::ReadCoils(range)
            | RequestPdu::ReadDiscreteInputs(range)
            | RequestPdu::ReadHoldingRegisters(range)
            | RequestPdu::ReadInputRegisters(range) => {
                cursor.write_u16_be(range.start)?;
                cursor.write_u16_be(range.count)?;
            }
            RequestPdu::WriteSingleCoil(value) => {
                cursor.write_u16_be(value.index)?;
                cursor.write_u16_be(coil_to_u16(value.value))?;
            }
            RequestPdu::WriteSingleRegister(value) => {
                cursor.write_u16_be(value.index)?;
                cursor.write_u16_be(value.value)?;
            }
        }
        Ok(())
    }
}

impl ResponsePayload {
    pub(crate) fn parse(
        function: FunctionCode,
        cursor: &mut ReadCursor,
    ) -> Result<Self, RequestError> {
        let payload = match function {
            FunctionCode::ReadCoils | FunctionCode::ReadDiscreteInputs => {
                ResponsePayload::Bits(Self::parse_block(cursor)?.to_vec())
            }
            FunctionCode::ReadHoldingRegisters | FunctionCode::ReadInputRegisters => {
                let block = Self::parse_block(cursor)?;
                if block.len() % 2 != 0 {
                    return Err(FrameParseError::OddRegisterByteCount(block.len()).into());
                }
                ResponsePayload::Registers(
                    block
                        .chunks_exact(2)
                        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                        .collect(),
                )
            }
            FunctionCode::WriteSingleCoil | FunctionCode::WriteSingleRegister => {
                let index = cursor.read_u16_be()?;
                let value = cursor.read_u16_be()?;
                ResponsePayload::WriteSingle(Indexed::new(index, value))
            }
        };
        cursor.expect_empty()?;
        Ok(payload)
    }

    fn parse_block<'a>(cursor: &mut ReadCursor<'a>) -> Result<&'a [u8], FrameParseError> {
        let byte_count = usize::from(cursor.read_u8()?);
        if byte_count != cursor.remaining() {
            return Err(FrameParseError::ByteCountMismatch(
                byte_count,
                cursor.remaining(),
            ));
        }
        cursor.read_bytes(byte_count)
    }

    pub(crate) fn serialize(
        &self,
        function: FunctionCode,
        cursor: &mut WriteCursor,
    ) -> Result<(), RequestError> {
        match self {
            ResponsePayload::Exception(ex) => {
                cursor.write_u8(function.as_error())?;
                cursor.write_u8(u8::from(*ex))?;
                return Ok(());
            }
            ResponsePayload::Bits(_) if !function.is_read_bits() => {
                return Err(InternalError::PayloadMismatch.into())
            }
            ResponsePayload::Registers(_) if !function.is_read_registers() => {
                return Err(InternalError::PayloadMismatch.into())
            }
            ResponsePayload::WriteSingle(_)
                if !matches!(
                    function,
                    FunctionCode::WriteSingleCoil | FunctionCode::WriteSingleRegister
                ) =>
            {
                return Err(InternalError::PayloadMismatch.into())
            }
            _ => {}
        }

        cursor.write_u8(function.get_value())?;
        match self {
            ResponsePayload::Bits(bytes) => {
                cursor.write_u8(byte_count(bytes.len())?)?;
                cursor.write_bytes(bytes)?;
            }
            ResponsePayload::Registers(values) => {
                cursor.write_u8(byte_count(2 * values.len())?)?;
                for value in values {
                    cursor.write_u16_be(*value)?;
                }
            }
            ResponsePayload::WriteSingle(echo) => {
                cursor.write_u16_be(echo.index)?;
                cursor.write_u16_be(echo.value)?;
            }
            ResponsePayload::Exception(_) => {}
        }
        Ok(())
    }
}

fn byte_count(len: usize) -> Result<u8, InternalError> {
    u8::try_from(len).map_err(|_| InternalError::BadByteCount(len))
}

impl Response {
    /// Check that the response answers `request`
    ///
    /// The exception case is checked last, so a response from the wrong transaction
    /// or unit is reported as such even if it carries an exception.
    pub(crate) fn check(&self, request: &Request) -> Result<(), RequestError> {
        if self.tx_id != request.tx_id {
            return Err(
                ProtocolError::TxIdMismatch(request.tx_id.to_u16(), self.tx_id.to_u16()).into(),
            );
        }

        if self.unit_id != request.unit_id {
            return Err(
                ProtocolError::UnitIdMismatch(request.unit_id.value, self.unit_id.value).into(),
            );
        }

        let expected = request.pdu.function();
        if self.function != expected {
            return Err(ProtocolError::UnexpectedFunction(
                expected.get_value(),
                self.function.get_value(),
            )
            .into());
        }

        let received = match &self.payload {
            ResponsePayload::Exception(ex) => return Err(RequestError::Exception(*ex)),
            ResponsePayload::Bits(bytes) => Some(bytes.len()),
            ResponsePayload::Registers(values) => Some(2 * values.len()),
            ResponsePayload::WriteSingle(_) => None,
        };

        if let (Some(expected), Some(received)) = (request.pdu.expected_byte_count(), received) {
            if expected != received {
                return Err(ProtocolError::ByteCountMismatch(expected, received).into());
            }
        }

        Ok(())
    }
}

pub(crate) struct RequestDisplay<'a> {
    level: PduDecodeLevel,
    pdu: &'a RequestPdu,
}

impl<'a> RequestDisplay<'a> {
    pub(crate) fn new(level: PduDecodeLevel, pdu: &'a RequestPdu) -> Self {
        Self { level, pdu }
    }
}

impl std::fmt::Display for RequestDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.pdu.function())?;
        if self.level.data_headers() {
            match self.pdu {
                RequestPdu::ReadCoils(range)
                | RequestPdu::ReadDiscreteInputs(range)
                | RequestPdu::ReadHoldingRegisters(range)
                | RequestPdu::ReadInputRegisters(range) => write!(f, " {range}")?,
                RequestPdu::WriteSingleCoil(value) => write!(f, " {value}")?,
                RequestPdu::WriteSingleRegister(value) => write!(f, " {value}")?,
            }
        }
        Ok(())
    }
}

pub(crate) struct ResponseDisplay<'a> {
    level: PduDecodeLevel,
    response: &'a Response,
}

impl<'a> ResponseDisplay<'a> {
    pub(crate) fn new(level: PduDecodeLevel, response: &'a Response) -> Self {
        Self { level, response }
    }
}

impl std::fmt::Display for ResponseDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.response.function)?;
        if !self.level.data_headers() {
            return Ok(());
        }
        match &self.response.payload {
            ResponsePayload::Exception(ex) => write!(f, " exception: {ex}")?,
            ResponsePayload::Bits(bytes) => {
                write!(f, " byte count: {}", bytes.len())?;
                if self.level.data_values() {
                    for (i, byte) in bytes.iter().enumerate() {
                        write!(f, "\nbyte: {i} value: {byte:#010b}")?;
                    }
                }
            }
            ResponsePayload::Registers(values) => {
                write!(f, " qty: {}", values.len())?;
                if self.level.data_values() {
                    for (i, value) in values.iter().enumerate() {
                        write!(f, "\nidx: {i} value: {value:#06X}")?;
                    }
                }
            }
            ResponsePayload::WriteSingle(echo) => write!(f, " {echo}")?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvalidRequest;

    fn request(pdu: RequestPdu) -> Request {
        Request {
            tx_id: TxId::new(7),
            unit_id: UnitId::new(1),
            pdu,
        }
    }

    fn response(function: FunctionCode, payload: ResponsePayload) -> Response {
        Response {
            tx_id: TxId::new(7),
            unit_id: UnitId::new(1),
            function,
            payload,
        }
    }

    #[test]
    fn read_rejects_write_functions() {
        assert_eq!(
            RequestPdu::read(FunctionCode::WriteSingleCoil, 0, 1),
            Err(RequestError::InvalidArgument(
                InvalidArgument::UnsupportedFunction(0x05)
            ))
        );
    }

    #[test]
    fn read_applies_limits() {
        assert_eq!(
            RequestPdu::read(FunctionCode::ReadInputRegisters, 0, 126),
            Err(RequestError::Encoding(InvalidRequest::CountTooLargeForType(
                126, 125
            )))
        );
        assert_eq!(
            RequestPdu::read(FunctionCode::ReadCoils, 0xFFFF, 2),
            Err(RequestError::Encoding(InvalidRequest::AddressOverflow(
                0xFFFF, 2
            )))
        );
        assert!(RequestPdu::read(FunctionCode::ReadDiscreteInputs, 0, 2000).is_ok());
    }

    #[test]
    fn serializes_write_single_coil() {
        let mut buffer = [0u8; 5];
        let mut cursor = WriteCursor::new(&mut buffer);
        RequestPdu::WriteSingleCoil(Indexed::new(200, true))
            .serialize(&mut cursor)
            .unwrap();
        assert_eq!(buffer, [0x05, 0x00, 0xC8, 0xFF, 0x00]);
    }

    #[test]
    fn rejects_block_with_wrong_byte_count() {
        let mut cursor = ReadCursor::new(&[0x04, 0x00, 0x01]);
        assert_eq!(
            ResponsePayload::parse(FunctionCode::ReadHoldingRegisters, &mut cursor),
            Err(RequestError::Framing(FrameParseError::ByteCountMismatch(4, 2)))
        );
    }

    #[test]
    fn rejects_odd_register_block() {
        let mut cursor = ReadCursor::new(&[0x03, 0x00, 0x01, 0x02]);
        assert_eq!(
            ResponsePayload::parse(FunctionCode::ReadInputRegisters, &mut cursor),
            Err(RequestError::Framing(FrameParseError::OddRegisterByteCount(3)))
        );
    }

    #[test]
    fn check_detects_tx_id_mismatch_before_exception() {
        let req = request(RequestPdu::ReadCoils(AddressRange::try_from(0, 8).unwrap()));
        let mut rsp = response(
            FunctionCode::ReadCoils,
            ResponsePayload::Exception(ExceptionCode::IllegalDataAddress),
        );
        rsp.tx_id = TxId::new(8);
        assert_eq!(
            rsp.check(&req),
            Err(RequestError::Protocol(ProtocolError::TxIdMismatch(7, 8)))
        );
        rsp.tx_id = TxId::new(7);
        assert_eq!(
            rsp.check(&req),
            Err(RequestError::Exception(ExceptionCode::IllegalDataAddress))
        );
    }

    #[test]
    fn check_detects_wrong_quantity() {
        let req = request(RequestPdu::ReadHoldingRegisters(
            AddressRange::try_from(0, 2).unwrap(),
        ));
        let rsp = response(
            FunctionCode::ReadHoldingRegisters,
            ResponsePayload::Registers(vec![1]),
        );
        assert_eq!(
            rsp.check(&req),
            Err(RequestError::Protocol(ProtocolError::ByteCountMismatch(4, 2)))
        );
    }

    #[test]
    fn check_detects_wrong_function_and_unit() {
        let req = request(RequestPdu::ReadCoils(AddressRange::try_from(0, 1).unwrap()));
        let rsp = response(
            FunctionCode::ReadDiscreteInputs,
            ResponsePayload::Bits(vec![0x01]),
        );
        assert_eq!(
            rsp.check(&req),
            Err(RequestError::Protocol(ProtocolError::UnexpectedFunction(
                0x01, 0x02
            )))
        );

        let mut rsp = response(FunctionCode::ReadCoils, ResponsePayload::Bits(vec![0x01]));
        rsp.unit_id = UnitId::new(9);
        assert_eq!(
            rsp.check(&req),
            Err(RequestError::Protocol(ProtocolError::UnitIdMismatch(1, 9)))
        );
    }

    #[test]
    fn serialize_rejects_payload_for_another_function() {
        let mut buffer = [0u8; 8];
        let mut cursor = WriteCursor::new(&mut buffer);
        assert_eq!(
            ResponsePayload::Registers(vec![1]).serialize(FunctionCode::ReadCoils, &mut cursor),
            Err(RequestError::Internal(InternalError::PayloadMismatch))
        );
    }

    #[test]
    fn displays_request_by_level() {
        let pdu = RequestPdu::ReadHoldingRegisters(AddressRange::try_from(3, 2).unwrap());
        assert_eq!(
            RequestDisplay::new(PduDecodeLevel::FunctionCode, &pdu).to_string(),
            "READ HOLDING REGISTERS (0x03)"
        );
        assert_eq!(
            RequestDisplay::new(PduDecodeLevel::DataHeaders, &pdu).to_string(),
            "READ HOLDING REGISTERS (0x03) start: 0x0003 qty: 2"
        );
    }
}

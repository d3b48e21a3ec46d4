use std::time::Duration;

use tracing::Instrument;

use crate::common::frame::TxId;
use crate::common::function::FunctionCode;
use crate::common::pdu::{Request, RequestDisplay, RequestPdu, ResponseDisplay, ResponsePayload};
use crate::config::ClientConfig;
use crate::constants::limits::{MAX_READ_COILS_COUNT, MAX_READ_REGISTERS_COUNT};
use crate::convert::{interpret, unpack_bits, Interpretation, RegisterValue};
use crate::error::{InternalError, InvalidArgument, ProtocolError, RequestError};
use crate::tcp::client::Transport;
use crate::tcp::frame::{decode_response, encode_request};
use crate::types::{coil_from_u16, Indexed, UnitId};

/// A connection to one device, used to make requests one at a time
///
/// The session owns its transaction id counter and its [`Transport`]. Each call completes on
/// a response, an error or the timeout; nothing is retried. When a call fails with an error
/// for which [`RequestError::is_fatal`] is true the connection is closed and later calls fail
/// with [`ConnectionError::NotConnected`](crate::ConnectionError::NotConnected).
#[derive(Debug)]
pub struct ClientSession {
    transport: Transport,
    unit_id: UnitId,
    timeout: Duration,
    tx_id: TxId,
}

impl ClientSession {
    /// Connect to the device described by `config`
    pub async fn connect(config: &ClientConfig) -> Result<Self, RequestError> {
        config.validate()?;
        let transport =
            Transport::connect(&config.host, config.port, config.timeout, config.decode).await?;
        Ok(Self::new(transport, config.unit_id, config.timeout))
    }

    /// Create a session over an already connected transport
    pub fn new(transport: Transport, unit_id: UnitId, timeout: Duration) -> Self {
        Self {
            transport,
            unit_id,
            timeout,
            tx_id: TxId::default(),
        }
    }

    /// True until the session is closed by a fatal error
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Perform one transaction and return the validated response payload
    ///
    /// The response must carry the request's transaction id, unit id and function code and,
    /// for reads, exactly the requested quantity. An exception response is returned as
    /// [`RequestError::Exception`].
    pub async fn call(&mut self, pdu: RequestPdu) -> Result<ResponsePayload, RequestError> {
        self.call_and_convert(pdu, Ok).await
    }

    /// Perform one transaction and convert its payload
    ///
    /// Errors from `convert` go through the same fatal error handling as errors from the
    /// exchange itself.
    async fn call_and_convert<T, F>(
        &mut self,
        pdu: RequestPdu,
        convert: F,
    ) -> Result<T, RequestError>
    where
        F: FnOnce(ResponsePayload) -> Result<T, RequestError>,
    {
        pdu.validate()?;

        let tx_id = self.tx_id.next();
        let result = self
            .execute(tx_id, pdu)
            .instrument(tracing::info_span!("Transaction", tx_id = %tx_id))
            .await
            .and_then(convert);

        if let Err(err) = &result {
            tracing::warn!("request error: {}", err);
            if err.is_fatal() {
                self.transport.abort();
            }
        }

        result
    }

    async fn execute(
        &mut self,
        tx_id: TxId,
        pdu: RequestPdu,
    ) -> Result<ResponsePayload, RequestError> {
        let request = Request {
            tx_id,
            unit_id: self.unit_id,
            pdu,
        };
        let bytes = encode_request(&request)?;

        let level = self.transport.decode_level().pdu;
        if level.enabled() {
            tracing::info!("PDU TX - {}", RequestDisplay::new(level, &pdu));
        }

        let frame = self.transport.send_and_receive(&bytes, self.timeout).await?;
        let response = decode_response(&frame)?;

        if level.enabled() {
            tracing::info!("PDU RX - {}", ResponseDisplay::new(level, &response));
        }

        response.check(&request)?;
        Ok(response.payload)
    }

    /// Read coils or discrete inputs
    ///
    /// `function` must be [`FunctionCode::ReadCoils`] or [`FunctionCode::ReadDiscreteInputs`]
    /// and `count` must be in `1..=2000`.
    pub async fn read_bits(
        &mut self,
        function: FunctionCode,
        address: u16,
        count: u16,
    ) -> Result<Vec<bool>, RequestError> {
        if !function.is_read_bits() {
            return Err(InvalidArgument::UnsupportedFunction(function.get_value()).into());
        }
        check_count(count, MAX_READ_COILS_COUNT)?;

        let pdu = RequestPdu::read(function, address, count)?;
        self.call_and_convert(pdu, |payload| match payload {
            ResponsePayload::Bits(bytes) => Ok(unpack_bits(&bytes, usize::from(count))?),
            _ => Err(InternalError::PayloadMismatch.into()),
        })
        .await
    }

    /// Read holding or input registers as [`RegisterValue::Unsigned`]
    pub async fn read_registers(
        &mut self,
        function: FunctionCode,
        address: u16,
        count: u16,
    ) -> Result<Vec<RegisterValue>, RequestError> {
        self.read_registers_as(function, address, count, Interpretation::Unsigned)
            .await
    }

    /// Read holding or input registers and apply an [`Interpretation`]
    ///
    /// `count` is the number of registers and must be in `1..=125`. A float interpretation
    /// needs an even count and yields one value per register pair.
    pub async fn read_registers_as(
        &mut self,
        function: FunctionCode,
        address: u16,
        count: u16,
        interpretation: Interpretation,
    ) -> Result<Vec<RegisterValue>, RequestError> {
        if let Interpretation::Float(_) = interpretation {
            if count % 2 != 0 {
                return Err(InvalidArgument::OddRegisterCount(usize::from(count)).into());
            }
        }
        let words = self.read_words(function, address, count).await?;
        Ok(interpret(&words, interpretation)?)
    }

    async fn read_words(
        &mut self,
        function: FunctionCode,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, RequestError> {
        if !function.is_read_registers() {
            return Err(InvalidArgument::UnsupportedFunction(function.get_value()).into());
        }
        check_count(count, MAX_READ_REGISTERS_COUNT)?;

        let pdu = RequestPdu::read(function, address, count)?;
        self.call_and_convert(pdu, |payload| match payload {
            ResponsePayload::Registers(words) => Ok(words),
            _ => Err(InternalError::PayloadMismatch.into()),
        })
        .await
    }

    /// Read coils (0x01)
    pub async fn read_coils(&mut self, address: u16, count: u16) -> Result<Vec<bool>, RequestError> {
        self.read_bits(FunctionCode::ReadCoils, address, count).await
    }

    /// Read discrete inputs (0x02)
    pub async fn read_discrete_inputs(
        &mut self,
        address: u16,
        count: u16,
    ) -> Result<Vec<bool>, RequestError> {
        self.read_bits(FunctionCode::ReadDiscreteInputs, address, count)
            .await
    }

    /// Read holding registers (0x03) as raw words
    pub async fn read_holding_registers(
        &mut self,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, RequestError> {
        self.read_words(FunctionCode::ReadHoldingRegisters, address, count)
            .await
    }

    /// Read input registers (0x04) as raw words
    pub async fn read_input_registers(
        &mut self,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, RequestError> {
        self.read_words(FunctionCode::ReadInputRegisters, address, count)
            .await
    }

    /// Write a single coil (0x05) and return the state echoed by the server
    ///
    /// An echoed value other than ON or OFF is a framing error and closes the session.
    pub async fn write_bit(&mut self, address: u16, value: bool) -> Result<bool, RequestError> {
        let pdu = RequestPdu::WriteSingleCoil(Indexed::new(address, value));
        self.write_single(pdu, address, |echo| Ok(coil_from_u16(echo)?))
            .await
    }

    /// Write a single holding register (0x06)
    ///
    /// Returns true when the server echoes the written value.
    pub async fn write_register(&mut self, address: u16, value: u16) -> Result<bool, RequestError> {
        let pdu = RequestPdu::WriteSingleRegister(Indexed::new(address, value));
        self.write_single(pdu, address, |echo| Ok(echo == value))
            .await
    }

    async fn write_single<T, F>(
        &mut self,
        pdu: RequestPdu,
        address: u16,
        convert: F,
    ) -> Result<T, RequestError>
    where
        F: FnOnce(u16) -> Result<T, RequestError>,
    {
        self.call_and_convert(pdu, |payload| match payload {
            ResponsePayload::WriteSingle(echo) if echo.index == address => convert(echo.value),
            ResponsePayload::WriteSingle(_) => Err(ProtocolError::ReplyEchoMismatch.into()),
            _ => Err(InternalError::PayloadMismatch.into()),
        })
        .await
    }

    /// Close the connection
    pub async fn close(self) {
        self.transport.close().await
    }
}

fn check_count(count: u16, max: u16) -> Result<(), InvalidArgument> {
    if count == 0 || count > max {
        return Err(InvalidArgument::CountOutOfRange(count, max));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;
    use crate::common::phys::PhysLayer;
    use crate::decode::{AduDecodeLevel, DecodeLevel, PduDecodeLevel, PhysDecodeLevel};
    use crate::error::{ConnectionError, FrameParseError};
    use crate::exception::ExceptionCode;

    fn session(io: &mut Builder) -> ClientSession {
        let decode = DecodeLevel::new(
            PduDecodeLevel::DataValues,
            AduDecodeLevel::Payload,
            PhysDecodeLevel::Data,
        );
        ClientSession::new(
            Transport::new(PhysLayer::new_mock(io.build()), decode),
            UnitId::new(1),
            Duration::from_secs(1),
        )
    }

    //                                       | tx id | proto |  len  |unit| fc | addr | count |
    const READ_HOLDING_3_2: &[u8] = &[0, 0, 0, 0, 0, 6, 1, 3, 0, 3, 0, 2];

    #[tokio::test]
    async fn reads_unsigned_registers() {
        let mut session = session(
            Builder::new()
                .write(READ_HOLDING_3_2)
                .read(&[0, 0, 0, 0, 0, 7, 1, 3, 4, 0x01, 0xF4, 0x00, 0x0A]),
        );

        let values = session
            .read_registers(FunctionCode::ReadHoldingRegisters, 3, 2)
            .await
            .unwrap();

        assert_eq!(
            values,
            vec![RegisterValue::Unsigned(500), RegisterValue::Unsigned(10)]
        );
    }

    #[tokio::test]
    async fn reads_float_from_register_pair() {
        let mut session = session(
            Builder::new()
                .write(READ_HOLDING_3_2)
                .read(&[0, 0, 0, 0, 0, 7, 1, 3, 4, 0x40, 0x49, 0x0F, 0xDB]),
        );

        let values = session
            .read_registers_as(
                FunctionCode::ReadHoldingRegisters,
                3,
                2,
                Interpretation::Float(crate::convert::WordOrder::HighFirst),
            )
            .await
            .unwrap();

        assert_eq!(values, vec![RegisterValue::Float(std::f32::consts::PI)]);
    }

    #[tokio::test]
    async fn odd_float_count_fails_before_sending() {
        let mut session = session(&mut Builder::new());

        assert_eq!(
            session
                .read_registers_as(
                    FunctionCode::ReadHoldingRegisters,
                    0,
                    3,
                    Interpretation::Float(Default::default()),
                )
                .await,
            Err(RequestError::InvalidArgument(
                InvalidArgument::OddRegisterCount(3)
            ))
        );
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn rejects_bad_counts_and_functions() {
        let mut session = session(&mut Builder::new());

        assert_eq!(
            session.read_coils(0, 0).await,
            Err(RequestError::InvalidArgument(
                InvalidArgument::CountOutOfRange(0, 2000)
            ))
        );
        assert_eq!(
            session.read_input_registers(0, 126).await,
            Err(RequestError::InvalidArgument(
                InvalidArgument::CountOutOfRange(126, 125)
            ))
        );
        assert_eq!(
            session
                .read_bits(FunctionCode::ReadHoldingRegisters, 0, 1)
                .await,
            Err(RequestError::InvalidArgument(
                InvalidArgument::UnsupportedFunction(0x03)
            ))
        );
    }

    #[tokio::test]
    async fn reads_coils() {
        let mut session = session(
            Builder::new()
                .write(&[0, 0, 0, 0, 0, 6, 1, 1, 0, 10, 0, 10])
                .read(&[0, 0, 0, 0, 0, 5, 1, 1, 2, 0x05, 0x02]),
        );

        assert_eq!(
            session.read_coils(10, 10).await.unwrap(),
            vec![true, false, true, false, false, false, false, false, false, true]
        );
    }

    #[tokio::test]
    async fn write_bit_returns_the_echoed_state() {
        let mut session = session(
            Builder::new()
                .write(&[0, 0, 0, 0, 0, 6, 1, 5, 0, 200, 0xFF, 0x00])
                .read(&[0, 0, 0, 0, 0, 6, 1, 5, 0, 200, 0xFF, 0x00]),
        );

        assert_eq!(session.write_bit(200, true).await, Ok(true));
    }

    #[tokio::test]
    async fn write_register_compares_the_echo() {
        let mut session = session(
            Builder::new()
                .write(&[0, 0, 0, 0, 0, 6, 1, 6, 0, 1, 0x12, 0x34])
                .read(&[0, 0, 0, 0, 0, 6, 1, 6, 0, 1, 0x12, 0x34])
                .write(&[0, 1, 0, 0, 0, 6, 1, 6, 0, 1, 0x12, 0x34])
                .read(&[0, 1, 0, 0, 0, 6, 1, 6, 0, 1, 0x00, 0x00])
                .write(&[0, 2, 0, 0, 0, 6, 1, 6, 0, 1, 0x12, 0x34])
                .read(&[0, 2, 0, 0, 0, 6, 1, 6, 0, 2, 0x12, 0x34]),
        );

        assert_eq!(session.write_register(1, 0x1234).await, Ok(true));
        assert_eq!(session.write_register(1, 0x1234).await, Ok(false));
        assert_eq!(
            session.write_register(1, 0x1234).await,
            Err(RequestError::Protocol(ProtocolError::ReplyEchoMismatch))
        );
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn exception_leaves_session_usable() {
        let mut session = session(
            Builder::new()
                .write(READ_HOLDING_3_2)
                .read(&[0, 0, 0, 0, 0, 3, 1, 0x83, 0x02])
                .write(&[0, 1, 0, 0, 0, 6, 1, 3, 0, 3, 0, 2])
                .read(&[0, 1, 0, 0, 0, 7, 1, 3, 4, 0x00, 0x01, 0x00, 0x02]),
        );

        assert_eq!(
            session.read_holding_registers(3, 2).await,
            Err(RequestError::Exception(ExceptionCode::IllegalDataAddress))
        );
        assert_eq!(session.read_holding_registers(3, 2).await, Ok(vec![1, 2]));
    }

    #[tokio::test]
    async fn tx_id_mismatch_does_not_affect_next_call() {
        let mut session = session(
            Builder::new()
                .write(READ_HOLDING_3_2)
                .read(&[0, 9, 0, 0, 0, 7, 1, 3, 4, 0x00, 0x01, 0x00, 0x02])
                .write(&[0, 1, 0, 0, 0, 6, 1, 3, 0, 3, 0, 2])
                .read(&[0, 1, 0, 0, 0, 7, 1, 3, 4, 0x00, 0x03, 0x00, 0x04]),
        );

        assert_eq!(
            session.read_holding_registers(3, 2).await,
            Err(RequestError::Protocol(ProtocolError::TxIdMismatch(0, 9)))
        );
        assert!(session.is_connected());
        assert_eq!(session.read_holding_registers(3, 2).await, Ok(vec![3, 4]));
    }

    #[tokio::test]
    async fn framing_error_closes_the_session() {
        let mut session = session(
            Builder::new()
                .write(READ_HOLDING_3_2)
                // byte count claims 4 but only 2 bytes follow
                .read(&[0, 0, 0, 0, 0, 5, 1, 3, 4, 0x00, 0x01]),
        );

        assert_eq!(
            session.read_holding_registers(3, 2).await,
            Err(RequestError::Framing(FrameParseError::ByteCountMismatch(4, 2)))
        );
        assert!(!session.is_connected());
        assert_eq!(
            session.read_holding_registers(3, 2).await,
            Err(RequestError::Connection(ConnectionError::NotConnected))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_closes_the_session() {
        let mut session = session(
            Builder::new()
                .write(READ_HOLDING_3_2)
                .wait(Duration::from_secs(30)),
        );

        assert_eq!(
            session.read_holding_registers(3, 2).await,
            Err(RequestError::ResponseTimeout)
        );
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn bad_coil_echo_closes_the_session() {
        let mut session = session(
            Builder::new()
                .write(&[0, 0, 0, 0, 0, 6, 1, 5, 0, 200, 0xFF, 0x00])
                .read(&[0, 0, 0, 0, 0, 6, 1, 5, 0, 200, 0x12, 0x34]),
        );

        let err = session.write_bit(200, true).await.unwrap_err();
        assert_eq!(
            err,
            RequestError::Framing(FrameParseError::UnknownCoilState(0x1234))
        );
        assert!(err.is_fatal());
        assert!(!session.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_a_pending_call_releases_the_socket() {
        let mut session = session(
            Builder::new()
                .write(READ_HOLDING_3_2)
                .wait(Duration::from_secs(30)),
        );

        let pending = tokio::time::timeout(
            Duration::from_millis(50),
            session.read_holding_registers(3, 2),
        )
        .await;

        assert!(pending.is_err());
        assert!(!session.is_connected());
        assert_eq!(
            session.read_holding_registers(3, 2).await,
            Err(RequestError::Connection(ConnectionError::NotConnected))
        );
    }
}

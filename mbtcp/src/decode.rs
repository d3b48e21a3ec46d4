/// What the client writes to the log at INFO level for each exchange
///
/// Each layer is configured on its own. Levels are ordered, so every level also logs
/// everything the levels below it log.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeLevel {
    /// request and response PDUs, logged as `PDU TX` / `PDU RX`
    pub pdu: PduDecodeLevel,
    /// MBAP frames, logged as `MBAP TX` / `MBAP RX`
    pub adu: AduDecodeLevel,
    /// raw socket reads and writes, logged as `PHYS TX` / `PHYS RX`
    pub physical: PhysDecodeLevel,
}

/// PDU logging
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum PduDecodeLevel {
    /// log nothing
    #[default]
    Nothing,
    /// function code only
    FunctionCode,
    /// function code plus address range or written index
    DataHeaders,
    /// everything above plus every value
    DataValues,
}

/// MBAP frame logging
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum AduDecodeLevel {
    /// log nothing
    #[default]
    Nothing,
    /// transaction id, unit id and PDU length
    Header,
    /// the header plus a hex dump of the PDU
    Payload,
}

/// Socket level logging
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum PhysDecodeLevel {
    /// log nothing
    #[default]
    Nothing,
    /// number of bytes per read or write
    Length,
    /// byte count plus a hex dump
    Data,
}

impl DecodeLevel {
    /// Log nothing at all
    pub fn nothing() -> Self {
        Self::default()
    }

    /// Set every layer at once
    pub fn new(pdu: PduDecodeLevel, adu: AduDecodeLevel, physical: PhysDecodeLevel) -> Self {
        Self { pdu, adu, physical }
    }

    /// Replace the PDU level
    pub fn application(self, pdu: PduDecodeLevel) -> Self {
        Self { pdu, ..self }
    }

    /// Replace the MBAP level
    pub fn frame(self, adu: AduDecodeLevel) -> Self {
        Self { adu, ..self }
    }

    /// Replace the socket level
    pub fn physical(self, physical: PhysDecodeLevel) -> Self {
        Self { physical, ..self }
    }
}

impl PduDecodeLevel {
    pub(crate) fn enabled(self) -> bool {
        self > Self::Nothing
    }

    pub(crate) fn data_headers(self) -> bool {
        self >= Self::DataHeaders
    }

    pub(crate) fn data_values(self) -> bool {
        self >= Self::DataValues
    }
}

impl AduDecodeLevel {
    pub(crate) fn enabled(self) -> bool {
        self > Self::Nothing
    }

    pub(crate) fn payload_enabled(self) -> bool {
        self >= Self::Payload
    }
}

impl PhysDecodeLevel {
    pub(crate) fn enabled(self) -> bool {
        self > Self::Nothing
    }

    pub(crate) fn data_enabled(self) -> bool {
        self >= Self::Data
    }
}

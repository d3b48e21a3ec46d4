use crate::constants::limits::{MAX_READ_COILS_COUNT, MAX_READ_REGISTERS_COUNT};
use crate::error::{FrameParseError, InvalidArgument, InvalidRequest};

/// Modbus unit identifier, a type-safe wrapper around `u8`
///
/// Sessions only address units in `1..=255`. The zero broadcast address has no meaning
/// on Modbus TCP and is rejected by [`UnitId::validate`].
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct UnitId {
    /// underlying raw value
    pub value: u8,
}

/// Start and count tuple used when making read requests
///
/// Cannot be constructed with a zero count or a range that leaves the 16-bit address space
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressRange {
    /// Starting address of the range
    pub start: u16,
    /// Count of elements in the range
    pub count: u16,
}

/// Value and its address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Indexed<T> {
    /// Address of the value
    pub index: u16,
    /// Associated value
    pub value: T,
}

impl UnitId {
    /// Create a new UnitId
    pub fn new(value: u8) -> Self {
        Self { value }
    }

    /// Check that the id can address a unit over a TCP session
    pub fn validate(self) -> Result<Self, InvalidArgument> {
        if self.value == 0 {
            return Err(InvalidArgument::InvalidUnitId(self.value));
        }
        Ok(self)
    }
}

/// Create the default UnitId of `1`
impl Default for UnitId {
    fn default() -> Self {
        Self { value: 1 }
    }
}

impl From<u8> for UnitId {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#04X}", self.value)
    }
}

impl AddressRange {
    /// Create a new address range
    pub fn try_from(start: u16, count: u16) -> Result<Self, InvalidRequest> {
        if count == 0 {
            return Err(InvalidRequest::CountOfZero);
        }

        let max_start = u16::MAX - (count - 1);

        if start > max_start {
            return Err(InvalidRequest::AddressOverflow(start, count));
        }

        Ok(Self { start, count })
    }

    pub(crate) fn of_read_bits(self) -> Result<Self, InvalidRequest> {
        self.limited_count(MAX_READ_COILS_COUNT)
    }

    pub(crate) fn of_read_registers(self) -> Result<Self, InvalidRequest> {
        self.limited_count(MAX_READ_REGISTERS_COUNT)
    }

    fn limited_count(self, limit: u16) -> Result<Self, InvalidRequest> {
        if self.count > limit {
            return Err(InvalidRequest::CountTooLargeForType(self.count, limit));
        }
        Ok(self)
    }
}

impl std::fmt::Display for AddressRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "start: {:#06X} qty: {}", self.start, self.count)
    }
}

impl<T> Indexed<T> {
    /// Create a new indexed value
    pub fn new(index: u16, value: T) -> Self {
        Indexed { index, value }
    }
}


impl std::fmt::Display for Indexed<bool> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "idx: {:#06X} value: {}", self.index, u8::from(self.value))
    }
}

impl std::fmt::Display for Indexed<u16> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "idx: {:#06X} value: {:#06X}", self.index, self.value)
    }
}

pub(crate) fn coil_from_u16(value: u16) -> Result<bool, FrameParseError> {
    match value {
        crate::constants::coil::ON => Ok(true),
        crate::constants::coil::OFF => Ok(false),
        _ => Err(FrameParseError::UnknownCoilState(value)),
    }
}

pub(crate) fn coil_to_u16(value: bool) -> u16 {
    if value {
        crate::constants::coil::ON
    } else {
        crate::constants::coil::OFF
    }
}

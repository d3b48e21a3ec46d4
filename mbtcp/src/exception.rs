use crate::constants::exceptions;

/// Exception codes a server may return in place of a normal response
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Ord, Eq)]
pub enum ExceptionCode {
    /// The function code received in the query is not an allowable action for the server
    IllegalFunction,
    /// The data address received in the query is not an allowable address for the server
    IllegalDataAddress,
    /// A value contained in the request is not an allowable value for server
    IllegalDataValue,
    /// An unrecoverable error occurred while the server was attempting to perform the requested
    /// action
    ServerDeviceFailure,
    /// The server has accepted a long-running request and is processing it
    Acknowledge,
    /// The server is engaged in processing a long-duration command, try again later
    ServerDeviceBusy,
    /// The server detected a parity error in the memory while reading a record file
    MemoryParityError,
    /// The gateway was unable to allocate an internal communication path
    GatewayPathUnavailable,
    /// The gateway received no response from the target device
    GatewayTargetDeviceFailedToRespond,
    /// The exception code received is not defined in the standard
    Unknown(u8),
}

impl From<u8> for ExceptionCode {
    fn from(value: u8) -> Self {
        match value {
            exceptions::ILLEGAL_FUNCTION => ExceptionCode::IllegalFunction,
            exceptions::ILLEGAL_DATA_ADDRESS => ExceptionCode::IllegalDataAddress,
            exceptions::ILLEGAL_DATA_VALUE => ExceptionCode::IllegalDataValue,
            exceptions::SERVER_DEVICE_FAILURE => ExceptionCode::ServerDeviceFailure,
            exceptions::ACKNOWLEDGE => ExceptionCode::Acknowledge,
            exceptions::SERVER_DEVICE_BUSY => ExceptionCode::ServerDeviceBusy,
            exceptions::MEMORY_PARITY_ERROR => ExceptionCode::MemoryParityError,
            exceptions::GATEWAY_PATH_UNAVAILABLE => ExceptionCode::GatewayPathUnavailable,
            exceptions::GATEWAY_TARGET_DEVICE_FAILED_TO_RESPOND => {
                ExceptionCode::GatewayTargetDeviceFailedToRespond
            }
            _ => ExceptionCode::Unknown(value),
        }
    }
}

impl From<ExceptionCode> for u8 {
    fn from(ex: ExceptionCode) -> Self {
        match ex {
            ExceptionCode::IllegalFunction => exceptions::ILLEGAL_FUNCTION,
            ExceptionCode::IllegalDataAddress => exceptions::ILLEGAL_DATA_ADDRESS,
            ExceptionCode::IllegalDataValue => exceptions::ILLEGAL_DATA_VALUE,
            ExceptionCode::ServerDeviceFailure => exceptions::SERVER_DEVICE_FAILURE,
            ExceptionCode::Acknowledge => exceptions::ACKNOWLEDGE,
            ExceptionCode::ServerDeviceBusy => exceptions::SERVER_DEVICE_BUSY,
            ExceptionCode::MemoryParityError => exceptions::MEMORY_PARITY_ERROR,
            ExceptionCode::GatewayPathUnavailable => exceptions::GATEWAY_PATH_UNAVAILABLE,
            ExceptionCode::GatewayTargetDeviceFailedToRespond => {
                exceptions::GATEWAY_TARGET_DEVICE_FAILED_TO_RESPOND
            }
            ExceptionCode::Unknown(value) => value,
        }
    }
}

impl std::error::Error for ExceptionCode {}

impl std::fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let code = u8::from(*self);
        match self {
            ExceptionCode::IllegalFunction => write!(f, "illegal function ({code:#04X})"),
            ExceptionCode::IllegalDataAddress => write!(f, "illegal data address ({code:#04X})"),
            ExceptionCode::IllegalDataValue => write!(f, "illegal data value ({code:#04X})"),
            ExceptionCode::ServerDeviceFailure => {
                write!(f, "slave device failure ({code:#04X})")
            }
            ExceptionCode::Acknowledge => write!(f, "acknowledge ({code:#04X})"),
            ExceptionCode::ServerDeviceBusy => write!(f, "slave device busy ({code:#04X})"),
            ExceptionCode::MemoryParityError => write!(f, "memory parity error ({code:#04X})"),
            ExceptionCode::GatewayPathUnavailable => {
                write!(f, "gateway path unavailable ({code:#04X})")
            }
            ExceptionCode::GatewayTargetDeviceFailedToRespond => {
                write!(f, "gateway target device failed to respond ({code:#04X})")
            }
            ExceptionCode::Unknown(_) => write!(f, "unknown exception code ({code:#04X})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_raw_code_round_trips() {
        for raw in 0..=u8::MAX {
            assert_eq!(u8::from(ExceptionCode::from(raw)), raw);
        }
    }

    #[test]
    fn maps_standard_codes_to_named_variants() {
        assert_eq!(ExceptionCode::from(0x02), ExceptionCode::IllegalDataAddress);
        assert_eq!(
            ExceptionCode::from(0x0B),
            ExceptionCode::GatewayTargetDeviceFailedToRespond
        );
        assert_eq!(ExceptionCode::from(0x07), ExceptionCode::Unknown(0x07));
    }

    #[test]
    fn display_includes_the_raw_code() {
        assert_eq!(
            ExceptionCode::IllegalDataValue.to_string(),
            "illegal data value (0x03)"
        );
    }
}

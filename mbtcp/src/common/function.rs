use std::fmt::{Display, Formatter};

mod constants {
    pub(crate) const READ_COILS: u8 = 1;
    pub(crate) const READ_DISCRETE_INPUTS: u8 = 2;
    pub(crate) const READ_HOLDING_REGISTERS: u8 = 3;
    pub(crate) const READ_INPUT_REGISTERS: u8 = 4;
    pub(crate) const WRITE_SINGLE_COIL: u8 = 5;
    pub(crate) const WRITE_SINGLE_REGISTER: u8 = 6;
}

/// Function codes supported by the client
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FunctionCode {
    /// Read Coils (0x01)
    ReadCoils = constants::READ_COILS,
    /// Read Discrete Inputs (0x02)
    ReadDiscreteInputs = constants::READ_DISCRETE_INPUTS,
    /// Read Holding Registers (0x03)
    ReadHoldingRegisters = constants::READ_HOLDING_REGISTERS,
    /// Read Input Registers (0x04)
    ReadInputRegisters = constants::READ_INPUT_REGISTERS,
    /// Write Single Coil (0x05)
    WriteSingleCoil = constants::WRITE_SINGLE_COIL,
    /// Write Single Register (0x06)
    WriteSingleRegister = constants::WRITE_SINGLE_REGISTER,
}

impl Display for FunctionCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            FunctionCode::ReadCoils => write!(f, "READ COILS ({:#04X})", self.get_value()),
            FunctionCode::ReadDiscreteInputs => {
                write!(f, "READ DISCRETE INPUTS ({:#04X})", self.get_value())
            }
            FunctionCode::ReadHoldingRegisters => {
                write!(f, "READ HOLDING REGISTERS ({:#04X})", self.get_value())
            }
            FunctionCode::ReadInputRegisters => {
                write!(f, "READ INPUT REGISTERS ({:#04X})", self.get_value())
            }
            FunctionCode::WriteSingleCoil => {
                write!(f, "WRITE SINGLE COIL ({:#04X})", self.get_value())
            }
            FunctionCode::WriteSingleRegister => {
                write!(f, "WRITE SINGLE REGISTER ({:#04X})", self.get_value())
            }
        }
    }
}

impl FunctionCode {
    /// Raw value of the function code
    pub const fn get_value(self) -> u8 {
        self as u8
    }

    /// Value of the function code in an exception response (high bit set)
    pub const fn as_error(self) -> u8 {
        self.get_value() | 0x80
    }

    /// Map a raw value to a supported function code
    pub fn get(value: u8) -> Option<Self> {
        match value {
            constants::READ_COILS => Some(FunctionCode::ReadCoils),
            constants::READ_DISCRETE_INPUTS => Some(FunctionCode::ReadDiscreteInputs),
            constants::READ_HOLDING_REGISTERS => Some(FunctionCode::ReadHoldingRegisters),
            constants::READ_INPUT_REGISTERS => Some(FunctionCode::ReadInputRegisters),
            constants::WRITE_SINGLE_COIL => Some(FunctionCode::WriteSingleCoil),
            constants::WRITE_SINGLE_REGISTER => Some(FunctionCode::WriteSingleRegister),
            _ => None,
        }
    }

    pub(crate) fn is_read_bits(self) -> bool {
        matches!(
            self,
            FunctionCode::ReadCoils | FunctionCode::ReadDiscreteInputs
        )
    }

    pub(crate) fn is_read_registers(self) -> bool {
        matches!(
            self,
            FunctionCode::ReadHoldingRegisters | FunctionCode::ReadInputRegisters
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_supported_value() {
        for value in 1..=6u8 {
            let function = FunctionCode::get(value).unwrap();
            assert_eq!(function.get_value(), value);
            assert_eq!(function.as_error(), value | 0x80);
        }
        assert_eq!(FunctionCode::get(0), None);
        assert_eq!(FunctionCode::get(15), None);
        assert_eq!(FunctionCode::get(0x83), None);
    }

    #[test]
    fn formats_name_and_value() {
        assert_eq!(
            FunctionCode::ReadHoldingRegisters.to_string(),
            "READ HOLDING REGISTERS (0x03)"
        );
    }
}

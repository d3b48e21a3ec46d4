//! Everything in this module is pure: no I/O and no state.
//!
//! Registers are 16-bit words already converted from their big-endian wire form. A float
//! occupies two consecutive registers, and [`WordOrder`] says which of the two carries the
//! high half of the IEEE-754 bit pattern.

use crate::common::bits::num_bytes_for_bits;
use crate::error::InvalidArgument;

/// Which register of a pair holds the high 16 bits of a 32-bit value
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WordOrder {
    /// first register is the high word (big-endian word order)
    #[default]
    HighFirst,
    /// first register is the low word ("word swapped")
    LowFirst,
}

/// A register value after interpretation
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RegisterValue {
    /// raw unsigned word
    Unsigned(u16),
    /// word read as a two's complement integer
    Signed(i16),
    /// two words read as an IEEE-754 single precision float
    Float(f32),
    /// raw word intended for hexadecimal display
    Hex(u16),
}

/// How a block of registers should be interpreted
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Interpretation {
    /// one [`RegisterValue::Unsigned`] per register
    #[default]
    Unsigned,
    /// one [`RegisterValue::Signed`] per register
    Signed,
    /// one [`RegisterValue::Float`] per register pair
    Float(WordOrder),
    /// one [`RegisterValue::Hex`] per register
    Hex,
}

impl std::fmt::Display for RegisterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegisterValue::Unsigned(x) => write!(f, "{x}"),
            RegisterValue::Signed(x) => write!(f, "{x}"),
            RegisterValue::Float(x) => write!(f, "{x:.6}"),
            RegisterValue::Hex(x) => write!(f, "{x:04X}"),
        }
    }
}

/// Read a word as a two's complement integer
///
/// Words of `0x8000` and above map to `word - 65536`.
pub fn to_signed(word: u16) -> i16 {
    i16::from_be_bytes(word.to_be_bytes())
}

/// Inverse of [`to_signed`]
pub fn to_unsigned(value: i16) -> u16 {
    u16::from_be_bytes(value.to_be_bytes())
}

/// Assemble a float from two registers in the given word order
pub fn registers_to_f32(first: u16, second: u16, order: WordOrder) -> f32 {
    let (high, low) = match order {
        WordOrder::HighFirst => (first, second),
        WordOrder::LowFirst => (second, first),
    };
    f32::from_bits((u32::from(high) << 16) | u32::from(low))
}

/// Split a float into two registers in the given word order
pub fn f32_to_registers(value: f32, order: WordOrder) -> [u16; 2] {
    let [b0, b1, b2, b3] = value.to_bits().to_be_bytes();
    let high = u16::from_be_bytes([b0, b1]);
    let low = u16::from_be_bytes([b2, b3]);
    match order {
        WordOrder::HighFirst => [high, low],
        WordOrder::LowFirst => [low, high],
    }
}

/// Convert consecutive register pairs to floats
pub fn registers_to_floats(words: &[u16], order: WordOrder) -> Result<Vec<f32>, InvalidArgument> {
    if words.len() % 2 != 0 {
        return Err(InvalidArgument::OddRegisterCount(words.len()));
    }
    Ok(words
        .chunks_exact(2)
        .map(|pair| registers_to_f32(pair[0], pair[1], order))
        .collect())
}

/// Convert a big-endian register block to words
pub fn bytes_to_registers(bytes: &[u8]) -> Result<Vec<u16>, InvalidArgument> {
    if bytes.len() % 2 != 0 {
        return Err(InvalidArgument::OddByteCount(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}

/// Convert a big-endian register block directly to floats
pub fn bytes_to_floats(bytes: &[u8], order: WordOrder) -> Result<Vec<f32>, InvalidArgument> {
    if bytes.len() % 4 != 0 {
        return Err(InvalidArgument::BadByteCountForFloat(bytes.len()));
    }
    registers_to_floats(&bytes_to_registers(bytes)?, order)
}

/// Unpack the first `count` bits of a bit-packed block
///
/// The least significant bit of the first byte is the first value.
pub fn unpack_bits(bytes: &[u8], count: usize) -> Result<Vec<bool>, InvalidArgument> {
    let needed = num_bytes_for_bits(count);
    if bytes.len() < needed {
        return Err(InvalidArgument::InsufficientBits(needed, bytes.len()));
    }
    Ok((0..count)
        .map(|i| bytes[i / 8] & (1 << (i % 8)) != 0)
        .collect())
}

/// Pack bits LSB first, padding the last byte with zeros
pub fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; num_bytes_for_bits(bits.len())];
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            bytes[i / 8] |= 1 << (i % 8);
        }
    }
    bytes
}

/// Format bytes as space separated upper case hex pairs, e.g. `"01 02 0A"`
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Apply an [`Interpretation`] to a block of registers
pub fn interpret(
    words: &[u16],
    interpretation: Interpretation,
) -> Result<Vec<RegisterValue>, InvalidArgument> {
    let values = match interpretation {
        Interpretation::Unsigned => words.iter().map(|x| RegisterValue::Unsigned(*x)).collect(),
        Interpretation::Signed => words
            .iter()
            .map(|x| RegisterValue::Signed(to_signed(*x)))
            .collect(),
        Interpretation::Hex => words.iter().map(|x| RegisterValue::Hex(*x)).collect(),
        Interpretation::Float(order) => registers_to_floats(words, order)?
            .into_iter()
            .map(RegisterValue::Float)
            .collect(),
    };
    Ok(values)
}

use mbtcp::RegisterValue;

/// Listing with one value per line, e.g. `"  1 (ad 00003):   500"`
///
/// Floats take two registers each, so their addresses advance by 2.
pub(crate) fn listing(address: u16, values: &[RegisterValue]) -> String {
    let mut out = String::from("Values:");
    let mut current = u32::from(address);
    for (i, value) in values.iter().enumerate() {
        let text = match value {
            RegisterValue::Unsigned(x) => format!("{x:5}"),
            RegisterValue::Signed(x) => format!("{x:5}"),
            RegisterValue::Hex(x) => format!("{x:04X}"),
            RegisterValue::Float(x) => format!("{x:.6}"),
        };
        out.push_str(&format!("\n{:3} (ad {current:05}): {text}", i + 1));
        current += match value {
            RegisterValue::Float(_) => 2,
            _ => 1,
        };
    }
    out
}

/// Raw values for scripts, e.g. `"00012;00034;"`
pub(crate) fn script(words: &[u16]) -> String {
    words.iter().map(|x| format!("{x:05};")).collect()
}

/// Bits shown the same way as registers
pub(crate) fn bits_as_values(bits: &[bool], hex: bool) -> Vec<RegisterValue> {
    bits.iter()
        .map(|b| {
            let x = u16::from(*b);
            if hex {
                RegisterValue::Hex(x)
            } else {
                RegisterValue::Unsigned(x)
            }
        })
        .collect()
}

pub(crate) fn bits_as_words(bits: &[bool]) -> Vec<u16> {
    bits.iter().map(|b| u16::from(*b)).collect()
}

pub(crate) fn write_result(kind: &str, ok: bool) -> String {
    if ok {
        format!("{kind} write ok")
    } else {
        format!("{kind} write failed")
    }
}

use std::net::Ipv4Addr;
use std::time::Duration;

/// Parse a number written in decimal or as `0x` prefixed hex
///
/// `max_digits` bounds the decimal form and `max_hex_digits` the hex form.
fn parse_number(s: &str, max_digits: usize, max_hex_digits: usize) -> Result<u32, String> {
    let (digits, radix, limit) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16, max_hex_digits),
        None => (s, 10, max_digits),
    };
    if digits.is_empty() || digits.len() > limit || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(format!("invalid number: {s}"));
    }
    u32::from_str_radix(digits, radix).map_err(|e| format!("invalid number {s}: {e}"))
}

fn in_range(value: u32, min: u32, max: u32, what: &str) -> Result<u32, String> {
    if value < min || value > max {
        return Err(format!("{what} must be in {min}..={max}, got {value}"));
    }
    Ok(value)
}

fn narrow<T: TryFrom<u32>>(value: u32) -> Result<T, String> {
    T::try_from(value).map_err(|_| format!("value {value} out of range"))
}

/// Unit identifier in `1..=255`
pub(crate) fn parse_unit_id(s: &str) -> Result<u8, String> {
    narrow(in_range(parse_number(s, 3, 2)?, 1, 255, "unit id")?)
}

/// TCP port in `1..=65535`
pub(crate) fn parse_port(s: &str) -> Result<u16, String> {
    narrow(in_range(parse_number(s, 5, 4)?, 1, 65535, "port")?)
}

/// Register or coil address in `0..=65535`
pub(crate) fn parse_address(s: &str) -> Result<u16, String> {
    narrow(in_range(parse_number(s, 5, 4)?, 0, 65535, "address")?)
}

/// Number of values to read, `1..=125`
pub(crate) fn parse_count(s: &str) -> Result<u16, String> {
    narrow(in_range(parse_number(s, 3, 2)?, 1, 125, "number of values")?)
}

/// Timeout in whole seconds, `1..=119`, decimal only
pub(crate) fn parse_timeout(s: &str) -> Result<Duration, String> {
    let secs = in_range(parse_number(s, 3, 0)?, 1, 119, "timeout")?;
    Ok(Duration::from_secs(u64::from(secs)))
}

/// Coil value, `0` or `1`
pub(crate) fn parse_bit(s: &str) -> Result<bool, String> {
    match s {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(format!("bit value must be 0 or 1, got {s}")),
    }
}

/// Register value in `0..=65535`
pub(crate) fn parse_word(s: &str) -> Result<u16, String> {
    narrow(in_range(parse_number(s, 5, 4)?, 0, 65535, "word value")?)
}

/// IPv4 address or a host name made of lowercase labels
pub(crate) fn parse_host(s: &str) -> Result<String, String> {
    if s.parse::<Ipv4Addr>().is_ok() || is_hostname(s) {
        Ok(s.to_string())
    } else {
        Err(format!("invalid host: {s}"))
    }
}

fn is_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }
    s.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_values() {
        assert_eq!(parse_bit("0"), Ok(false));
        assert_eq!(parse_bit("1"), Ok(true));
        assert!(parse_bit("2").is_err());
        assert!(parse_bit("on").is_err());
    }

    #[test]
    fn word_values() {
        assert_eq!(parse_word("0"), Ok(0));
        assert_eq!(parse_word("65535"), Ok(65535));
        assert_eq!(parse_word("0x100"), Ok(256));
        assert_eq!(parse_word("0xFFFF"), Ok(65535));
        assert!(parse_word("65536").is_err());
        assert!(parse_word("0x10000").is_err());
        assert!(parse_word("abc").is_err());
        assert!(parse_word("").is_err());
        assert!(parse_word("0x").is_err());
    }

    #[test]
    fn unit_ids() {
        assert_eq!(parse_unit_id("1"), Ok(1));
        assert_eq!(parse_unit_id("255"), Ok(255));
        assert_eq!(parse_unit_id("0xFF"), Ok(255));
        assert!(parse_unit_id("0").is_err());
        assert!(parse_unit_id("256").is_err());
        assert!(parse_unit_id("0x100").is_err());
    }

    #[test]
    fn ports_and_addresses() {
        assert_eq!(parse_port("502"), Ok(502));
        assert!(parse_port("0").is_err());
        assert!(parse_port("65536").is_err());
        assert_eq!(parse_address("0"), Ok(0));
        assert_eq!(parse_address("0x00FF"), Ok(255));
        assert!(parse_address("-1").is_err());
    }

    #[test]
    fn counts() {
        assert_eq!(parse_count("1"), Ok(1));
        assert_eq!(parse_count("125"), Ok(125));
        assert!(parse_count("0").is_err());
        assert!(parse_count("126").is_err());
    }

    #[test]
    fn timeouts_are_decimal_seconds() {
        assert_eq!(parse_timeout("5"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_timeout("119"), Ok(Duration::from_secs(119)));
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("120").is_err());
        assert!(parse_timeout("0x05").is_err());
    }

    #[test]
    fn hosts() {
        assert_eq!(parse_host("localhost"), Ok("localhost".to_string()));
        assert_eq!(parse_host("192.168.0.10"), Ok("192.168.0.10".to_string()));
        assert_eq!(parse_host("plc-1.site.local"), Ok("plc-1.site.local".to_string()));
        assert!(parse_host("Bad_Host").is_err());
        assert!(parse_host("-plc").is_err());
        assert!(parse_host("plc..local").is_err());
    }
}

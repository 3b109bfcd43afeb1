use super::{bars_from_wide_narrow, QUIET_ZONE};
use crate::checksum::{mod16, NW7_CHARSET};
use crate::config::EncodingConfiguration;
use crate::error::{invalid, Result};
use crate::symbol::{normalize, Bar, LinearSymbol};

/// Seven element wide/narrow patterns in `NW7_CHARSET` order, 1 = wide.
#[rustfmt::skip]
const PATTERNS: [u32; 20] = [
    0x03, 0x06, 0x09, 0x60, 0x12, 0x42, 0x21, 0x24, 0x30, 0x48, // 0-9
    0x0C, 0x18, 0x45, 0x51, 0x54, 0x15,                         // - $ : / . +
    0x1A, 0x29, 0x0B, 0x0E,                                     // A B C D
];

const WIDE: u32 = 3;

fn is_start_stop(c: u8) -> bool {
    matches!(c, b'A'..=b'D')
}

/// Adds the default `A` start/stop pair when the payload carries none.
fn with_start_stop(payload: &str) -> Result<String> {
    let upper = payload.trim().to_ascii_uppercase();
    let bytes = upper.as_bytes();
    match (bytes.first(), bytes.last()) {
        (None, _) | (_, None) => invalid("NW7 payload is empty"),
        (Some(&first), Some(&last)) if is_start_stop(first) && is_start_stop(last) && bytes.len() >= 3 => Ok(upper),
        (Some(&first), Some(&last)) if !is_start_stop(first) && !is_start_stop(last) => Ok(format!("A{}A", upper)),
        _ => invalid(format!("NW7 needs both a start and a stop character: {:?}", payload)),
    }
}

pub fn encode(payload: &str, config: &EncodingConfiguration) -> Result<LinearSymbol> {
    let mut full = with_start_stop(payload)?;
    let body = &full[1..full.len() - 1];
    if body.bytes().any(|c| is_start_stop(c) || !NW7_CHARSET.contains(&c)) {
        return invalid(format!("{:?} contains characters NW7 cannot encode", body));
    }
    if config.check_digit {
        let check = mod16(&full)?;
        full.insert(full.len() - 1, check);
    }

    let mut bars: Vec<Bar> = Vec::new();
    for (i, c) in full.bytes().enumerate() {
        if i > 0 {
            bars.push(Bar::new(1, false));
        }
        let value = NW7_CHARSET.iter().position(|&x| x == c).unwrap_or(0);
        bars.extend(bars_from_wide_narrow(PATTERNS[value], 7, WIDE));
    }

    let caption = if config.show_start_stop { full.clone() } else { full[1..full.len() - 1].to_string() };
    Ok(LinearSymbol::single_row(normalize(bars), QUIET_ZONE).with_caption(caption))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_start_stop() {
        assert_eq!(with_start_stop("123").unwrap(), "A123A");
        assert_eq!(with_start_stop("b45c").unwrap(), "B45C");
        assert!(with_start_stop("A123").is_err());
        assert!(with_start_stop("").is_err());
    }

    #[test]
    fn test_width() {
        let symbol = encode("A123A", &EncodingConfiguration::default()).unwrap();
        // A-D: 3 wide of 7, digits: 2 wide of 7, narrow gaps between characters
        assert_eq!(symbol.symbol_width(), 2 * 13 + 3 * 11 + 4);
    }

    #[test]
    fn test_check_digit_and_caption() {
        let config = EncodingConfiguration { check_digit: true, show_start_stop: false, ..Default::default() };
        let symbol = encode("A123A", &config).unwrap();
        // 16 + 1 + 2 + 3 + 16 = 38, 16 - 38 % 16 = 10 -> '-'
        assert_eq!(symbol.text[0].text, "123-");
        assert!(encode("A12*3A", &EncodingConfiguration::default()).is_err());
        assert!(encode("A1B2A", &EncodingConfiguration::default()).is_err());
    }
}

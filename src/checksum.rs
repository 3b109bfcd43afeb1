/// Check digit and check character algorithms used by the linear, DataBar
/// and postal encoders. All functions are pure.
use crate::error::{invalid, Result};

/// Character set of Code39 in mod-43 value order.
pub const CODE39_CHARSET: &[u8; 43] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-. $/+%";

/// Character set of NW7 in mod-16 value order (start/stop characters last).
pub const NW7_CHARSET: &[u8; 20] = b"0123456789-$:/.+ABCD";

fn digits_of(input: &str) -> Result<Vec<u32>> {
    input
        .chars()
        .map(|c| c.to_digit(10).ok_or(()))
        .collect::<std::result::Result<Vec<u32>, ()>>()
        .or_else(|_| invalid(format!("expected digits only, got {:?}", input)))
}

/// Mod-10 with weights 3 and 1 alternating from the rightmost data digit, as used by
/// JAN/EAN, UPC, ITF-14 and the GS1 family.
pub fn mod10(input: &str) -> Result<u8> {
    let digits = digits_of(input)?;
    if digits.is_empty() {
        return invalid("no digits to compute a check digit for");
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| if i % 2 == 0 { d * 3 } else { d })
        .sum();
    Ok(((10 - sum % 10) % 10) as u8)
}

/// GS1 check digit over a GTIN body. Accepts an optional `(01)` or `01` prefix
/// only when the remaining body has 13 digits.
pub fn gs1_check_digit(input: &str) -> Result<u8> {
    mod10(strip_ai_01(input))
}

pub(crate) fn strip_ai_01(input: &str) -> &str {
    let trimmed = input.trim();
    if let Some(rest) = trimmed.strip_prefix("(01)") {
        rest
    } else if trimmed.len() > 14 && trimmed.starts_with("01") {
        &trimmed[2..]
    } else {
        trimmed
    }
}

/// Code39 mod-43 check character.
pub fn mod43(input: &str) -> Result<char> {
    let mut sum = 0usize;
    for b in input.bytes() {
        match CODE39_CHARSET.iter().position(|&c| c == b) {
            Some(v) => sum += v,
            None => return invalid(format!("{:?} is not a Code39 character", b as char)),
        }
    }
    Ok(CODE39_CHARSET[sum % 43] as char)
}

/// NW7 (Codabar) mod-16 check character. The input includes the start and stop
/// characters, which contribute to the sum.
pub fn mod16(input: &str) -> Result<char> {
    let mut sum = 0usize;
    for b in input.bytes() {
        match NW7_CHARSET.iter().position(|&c| c == b.to_ascii_uppercase()) {
            Some(v) => sum += v,
            None => return invalid(format!("{:?} is not a NW7 character", b as char)),
        }
    }
    Ok(NW7_CHARSET[(16 - sum % 16) % 16] as char)
}

/// Code93 check value over symbol values: weights cycle from 1 to `max_weight`
/// starting at the rightmost value.
pub fn mod47(values: &[u8], max_weight: u32) -> u8 {
    let sum: u32 = values
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &v)| (i as u32 % max_weight + 1) * v as u32)
        .sum();
    (sum % 47) as u8
}

/// Code128 check symbol: start value plus position weighted symbol values.
pub fn mod103(start: u8, values: &[u8]) -> u8 {
    let sum = values
        .iter()
        .enumerate()
        .fold(start as u32, |acc, (i, &v)| acc + (i as u32 + 1) * v as u32);
    (sum % 103) as u8
}

/// Yubin customer barcode check value over character values 0..=18.
pub fn mod19(values: &[u8]) -> u8 {
    let sum: u32 = values.iter().map(|&v| v as u32).sum();
    ((19 - sum % 19) % 19) as u8
}

/// Verifies or appends the mod-10 check digit for a fixed-length numeric code.
/// `body_len` digits get the check appended, `body_len + 1` digits are verified.
pub fn complete_mod10(input: &str, body_len: usize) -> Result<String> {
    let input = input.trim();
    digits_of(input)?;
    if input.len() == body_len {
        Ok(format!("{}{}", input, mod10(input)?))
    } else if input.len() == body_len + 1 {
        let expected = mod10(&input[..body_len])?;
        if input[body_len..] == expected.to_string() {
            Ok(input.to_string())
        } else {
            invalid(format!("check digit of {} should be {}", input, expected))
        }
    } else {
        invalid(format!("expected {} or {} digits, got {}", body_len, body_len + 1, input.len()))
    }
}

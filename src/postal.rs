//! Japan Post customer barcode (Yubin): a 7 digit postal code and the address
//! display number, padded to 20 characters, a mod 19 check character and
//! start/stop, 67 four-state bars in total.
use log::debug;

use crate::checksum::mod19;
use crate::config::EncodingConfiguration;
use crate::error::{invalid, Result};
use crate::symbol::{AbstractSymbol, Encoder, PostalBar, PostalSymbol};

/// Characters encoded between start and check character.
const DATA_CHARS: usize = 20;

const HYPHEN: u8 = 10;
/// Control codes CC1..CC8 follow the hyphen.
const CC1: u8 = 11;
const CC4: u8 = 14;

/// Bars of each character value (digits, hyphen, CC1..CC8): 1 long,
/// 2 ascender, 3 descender, 4 timing.
const BARS: [&[u8; 3]; 19] = [
    b"144", b"114", b"132", b"312", b"123", b"141", b"321", b"213", b"231", b"411", b"414", b"324", b"342",
    b"234", b"432", b"243", b"423", b"441", b"111",
];
const START: &[u8; 2] = b"13";
const STOP: &[u8; 2] = b"31";

fn bar(code: u8) -> PostalBar {
    match code {
        b'1' => PostalBar::Long,
        b'2' => PostalBar::Ascender,
        b'3' => PostalBar::Descender,
        _ => PostalBar::Timing,
    }
}

/// Splits the payload into the 7 postal code digits and the address part. A
/// hyphen after the third digit ("100-0001") is accepted.
fn split_postal_code(payload: &str) -> Result<(Vec<u8>, &str)> {
    let payload = payload.trim();
    let bytes = payload.as_bytes();
    let (code, rest) = if bytes.len() >= 8 && bytes[3] == b'-' {
        ([&bytes[..3], &bytes[4..8]].concat(), 8)
    } else {
        (bytes.iter().take(7).copied().collect::<Vec<u8>>(), 7)
    };
    if code.len() != 7 || !code.iter().all(u8::is_ascii_digit) {
        return invalid(format!("postal code needs 7 digits, got {:?}", payload));
    }
    let rest = &payload[rest..];
    Ok((code.iter().map(|d| d - b'0').collect(), rest))
}

/// Character values of the 20 data characters: letters become a control code
/// followed by a digit, the tail is padded with CC4.
pub fn data_values(payload: &str) -> Result<Vec<u8>> {
    let (mut values, address) = split_postal_code(payload)?;
    for c in address.chars() {
        if values.len() >= DATA_CHARS {
            break;
        }
        let c = c.to_ascii_uppercase();
        let (control, digit) = match c {
            '0'..='9' => {
                values.push(c as u8 - b'0');
                continue;
            }
            '-' => {
                values.push(HYPHEN);
                continue;
            }
            'A'..='J' => (CC1, c as u8 - b'A'),
            'K'..='T' => (CC1 + 1, c as u8 - b'K'),
            'U'..='Z' => (CC1 + 2, c as u8 - b'U'),
            _ => return invalid(format!("{:?} cannot be encoded in a customer barcode", c)),
        };
        values.push(control);
        // a control code in the last position loses its digit
        if values.len() < DATA_CHARS {
            values.push(digit);
        }
    }
    values.resize(DATA_CHARS, CC4);
    Ok(values)
}

pub fn encode_postal(payload: &str) -> Result<PostalSymbol> {
    let mut values = data_values(payload)?;
    let check = mod19(&values);
    debug!("customer barcode check character {}", check);
    values.push(check);

    let mut bars = Vec::with_capacity(67);
    bars.extend(START.iter().map(|&c| bar(c)));
    for &v in &values {
        bars.extend(BARS[v as usize].iter().map(|&c| bar(c)));
    }
    bars.extend(STOP.iter().map(|&c| bar(c)));
    Ok(PostalSymbol { bars })
}

pub struct PostalEncoder;

impl Encoder for PostalEncoder {
    fn encode(&self, payload: &str, _config: &EncodingConfiguration) -> Result<AbstractSymbol> {
        encode_postal(payload).map(AbstractSymbol::Postal)
    }
}

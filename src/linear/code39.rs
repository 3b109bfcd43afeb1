use log::debug;

use super::{bars_from_wide_narrow, QUIET_ZONE};
use crate::checksum::{mod43, CODE39_CHARSET};
use crate::config::EncodingConfiguration;
use crate::error::{invalid, Result};
use crate::symbol::{normalize, Bar, LinearSymbol};

/// Wide/narrow patterns of the 43 data characters in `CODE39_CHARSET` order,
/// nine elements each, 1 = wide.
#[rustfmt::skip]
const PATTERNS: [u32; 43] = [
    0x034, 0x121, 0x061, 0x160, 0x031, 0x130, 0x070, 0x025, 0x124, 0x064, // 0-9
    0x109, 0x049, 0x148, 0x019, 0x118, 0x058, 0x00D, 0x10C, 0x04C, 0x01C, // A-J
    0x103, 0x043, 0x142, 0x013, 0x112, 0x052, 0x007, 0x106, 0x046, 0x016, // K-T
    0x181, 0x0C1, 0x1C0, 0x091, 0x190, 0x0D0,                             // U-Z
    0x085, 0x184, 0x0C4, 0x0A8, 0x0A2, 0x08A, 0x02A,                      // - . space $ / + %
];

/// The `*` start/stop character.
const START_STOP: u32 = 0x094;

const WIDE: u32 = 3;

fn character_bars(pattern: u32) -> Vec<Bar> {
    bars_from_wide_narrow(pattern, 9, WIDE)
}

pub fn encode(payload: &str, config: &EncodingConfiguration) -> Result<LinearSymbol> {
    if payload.is_empty() {
        return invalid("Code39 payload is empty");
    }
    let mut data = payload.to_string();
    if config.check_digit {
        data.push(mod43(payload)?);
    }

    let mut bars = character_bars(START_STOP);
    for c in data.bytes() {
        let value = match CODE39_CHARSET.iter().position(|&x| x == c) {
            Some(v) => v,
            None => return invalid(format!("{:?} is not a Code39 character", c as char)),
        };
        // narrow inter-character gap
        bars.push(Bar::new(1, false));
        bars.extend(character_bars(PATTERNS[value]));
    }
    bars.push(Bar::new(1, false));
    bars.extend(character_bars(START_STOP));
    debug!("Code39 {:?} with {} characters", data, data.len() + 2);

    let caption = if config.show_start_stop { format!("*{}*", data) } else { data };
    Ok(LinearSymbol::single_row(normalize(bars), QUIET_ZONE).with_caption(caption))
}

use log::debug;

use super::{group_of, gtin_body, gtin_caption, interleave, rss_widths, widths_to_bars, CharGroup};
use crate::config::EncodingConfiguration;
use crate::error::{invalid, Result};
use crate::symbol::{BarRow, LinearSymbol};

/// Character groups (26 modules, seven elements per side): value = odd * t + even.
const GROUPS: [CharGroup; 7] = [
    CharGroup::new(0, 28, (17, 6), (9, 3)),
    CharGroup::new(183_064, 728, (13, 5), (13, 4)),
    CharGroup::new(820_064, 6454, (9, 3), (17, 6)),
    CharGroup::new(1_000_776, 203, (15, 5), (11, 4)),
    CharGroup::new(1_491_021, 2408, (11, 4), (15, 5)),
    CharGroup::new(1_979_845, 1, (19, 8), (7, 1)),
    CharGroup::new(1_996_939, 16632, (7, 1), (19, 8)),
];

const SPLIT: u64 = 2_013_571;

/// The check character patterns by checksum, 18 modules each. Bars and spaces
/// both span nine modules and the pattern ends in a narrow space and bar.
const CHECK_TABLE: [[u32; 14]; 89] = [
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 3, 3, 1, 1], [1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 3, 2, 1, 1],
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 3, 3, 1, 1, 1], [1, 1, 1, 1, 1, 1, 1, 2, 1, 1, 3, 2, 1, 1],
    [1, 1, 1, 1, 1, 1, 1, 2, 1, 2, 3, 1, 1, 1], [1, 1, 1, 1, 1, 1, 1, 3, 1, 1, 3, 1, 1, 1],
    [1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 3, 2, 1, 1], [1, 1, 1, 1, 1, 2, 1, 1, 1, 2, 3, 1, 1, 1],
    [1, 1, 1, 1, 1, 2, 1, 2, 1, 1, 3, 1, 1, 1], [1, 1, 1, 1, 1, 3, 1, 1, 1, 1, 3, 1, 1, 1],
    [1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 3, 2, 1, 1], [1, 1, 1, 2, 1, 1, 1, 1, 1, 2, 3, 1, 1, 1],
    [1, 1, 1, 2, 1, 1, 1, 2, 1, 1, 3, 1, 1, 1], [1, 1, 1, 2, 1, 2, 1, 1, 1, 1, 3, 1, 1, 1],
    [1, 1, 1, 3, 1, 1, 1, 1, 1, 1, 3, 1, 1, 1], [1, 2, 1, 1, 1, 1, 1, 1, 1, 1, 3, 2, 1, 1],
    [1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 3, 1, 1, 1], [1, 2, 1, 1, 1, 1, 1, 2, 1, 1, 3, 1, 1, 1],
    [1, 2, 1, 1, 1, 2, 1, 1, 1, 1, 3, 1, 1, 1], [1, 2, 1, 2, 1, 1, 1, 1, 1, 1, 3, 1, 1, 1],
    [1, 3, 1, 1, 1, 1, 1, 1, 1, 1, 3, 1, 1, 1], [1, 1, 1, 1, 1, 1, 1, 1, 2, 1, 2, 3, 1, 1],
    [1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 1, 1], [1, 1, 1, 1, 1, 1, 1, 1, 2, 3, 2, 1, 1, 1],
    [1, 1, 1, 1, 1, 1, 1, 2, 2, 1, 2, 2, 1, 1], [1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 1, 1, 1],
    [1, 1, 1, 1, 1, 1, 1, 3, 2, 1, 2, 1, 1, 1], [1, 1, 1, 1, 1, 2, 1, 1, 2, 1, 2, 2, 1, 1],
    [1, 1, 1, 1, 1, 2, 1, 1, 2, 2, 2, 1, 1, 1], [1, 1, 1, 1, 1, 2, 1, 2, 2, 1, 2, 1, 1, 1],
    [1, 1, 1, 1, 1, 3, 1, 1, 2, 1, 2, 1, 1, 1], [1, 1, 1, 2, 1, 1, 1, 1, 2, 1, 2, 2, 1, 1],
    [1, 1, 1, 2, 1, 1, 1, 1, 2, 2, 2, 1, 1, 1], [1, 1, 1, 2, 1, 1, 1, 2, 2, 1, 2, 1, 1, 1],
    [1, 1, 1, 2, 1, 2, 1, 1, 2, 1, 2, 1, 1, 1], [1, 1, 1, 3, 1, 1, 1, 1, 2, 1, 2, 1, 1, 1],
    [1, 2, 1, 1, 1, 1, 1, 1, 2, 1, 2, 2, 1, 1], [1, 2, 1, 1, 1, 1, 1, 1, 2, 2, 2, 1, 1, 1],
    [1, 2, 1, 1, 1, 1, 1, 2, 2, 1, 2, 1, 1, 1], [1, 2, 1, 1, 1, 2, 1, 1, 2, 1, 2, 1, 1, 1],
    [1, 2, 1, 2, 1, 1, 1, 1, 2, 1, 2, 1, 1, 1], [1, 3, 1, 1, 1, 1, 1, 1, 2, 1, 2, 1, 1, 1],
    [1, 1, 1, 1, 1, 1, 1, 1, 3, 1, 1, 3, 1, 1], [1, 1, 1, 1, 1, 1, 1, 1, 3, 2, 1, 2, 1, 1],
    [1, 1, 1, 1, 1, 1, 1, 1, 3, 3, 1, 1, 1, 1], [1, 1, 1, 1, 1, 1, 1, 2, 3, 1, 1, 2, 1, 1],
    [1, 1, 1, 1, 1, 1, 1, 2, 3, 2, 1, 1, 1, 1], [1, 1, 1, 1, 1, 1, 1, 3, 3, 1, 1, 1, 1, 1],
    [1, 1, 1, 1, 1, 2, 1, 1, 3, 1, 1, 2, 1, 1], [1, 1, 1, 1, 1, 2, 1, 1, 3, 2, 1, 1, 1, 1],
    [1, 1, 1, 1, 1, 2, 1, 2, 3, 1, 1, 1, 1, 1], [1, 1, 1, 1, 1, 3, 1, 1, 3, 1, 1, 1, 1, 1],
    [1, 1, 1, 2, 1, 1, 1, 1, 3, 1, 1, 2, 1, 1], [1, 1, 1, 2, 1, 1, 1, 1, 3, 2, 1, 1, 1, 1],
    [1, 1, 1, 2, 1, 1, 1, 2, 3, 1, 1, 1, 1, 1], [1, 1, 1, 2, 1, 2, 1, 1, 3, 1, 1, 1, 1, 1],
    [1, 1, 1, 3, 1, 1, 1, 1, 3, 1, 1, 1, 1, 1], [1, 2, 1, 1, 1, 1, 1, 1, 3, 1, 1, 2, 1, 1],
    [1, 2, 1, 1, 1, 1, 1, 1, 3, 2, 1, 1, 1, 1], [1, 2, 1, 1, 1, 1, 1, 2, 3, 1, 1, 1, 1, 1],
    [1, 2, 1, 1, 1, 2, 1, 1, 3, 1, 1, 1, 1, 1], [1, 2, 1, 2, 1, 1, 1, 1, 3, 1, 1, 1, 1, 1],
    [1, 3, 1, 1, 1, 1, 1, 1, 3, 1, 1, 1, 1, 1], [1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 2, 3, 1, 1],
    [1, 1, 1, 1, 1, 1, 2, 1, 1, 2, 2, 2, 1, 1], [1, 1, 1, 1, 1, 1, 2, 1, 1, 3, 2, 1, 1, 1],
    [1, 1, 1, 1, 1, 1, 2, 2, 1, 1, 2, 2, 1, 1], [1, 1, 1, 1, 1, 1, 2, 2, 1, 2, 2, 1, 1, 1],
    [1, 1, 1, 1, 1, 1, 2, 3, 1, 1, 2, 1, 1, 1], [1, 1, 1, 1, 1, 2, 2, 1, 1, 1, 2, 2, 1, 1],
    [1, 1, 1, 1, 1, 2, 2, 1, 1, 2, 2, 1, 1, 1], [1, 1, 1, 1, 1, 2, 2, 2, 1, 1, 2, 1, 1, 1],
    [1, 1, 1, 1, 1, 3, 2, 1, 1, 1, 2, 1, 1, 1], [1, 1, 1, 2, 1, 1, 2, 1, 1, 1, 2, 2, 1, 1],
    [1, 1, 1, 2, 1, 1, 2, 1, 1, 2, 2, 1, 1, 1], [1, 1, 1, 2, 1, 1, 2, 2, 1, 1, 2, 1, 1, 1],
    [1, 1, 1, 2, 1, 2, 2, 1, 1, 1, 2, 1, 1, 1], [1, 1, 1, 3, 1, 1, 2, 1, 1, 1, 2, 1, 1, 1],
    [1, 2, 1, 1, 1, 1, 2, 1, 1, 1, 2, 2, 1, 1], [1, 2, 1, 1, 1, 1, 2, 1, 1, 2, 2, 1, 1, 1],
    [1, 2, 1, 1, 1, 1, 2, 2, 1, 1, 2, 1, 1, 1], [1, 2, 1, 1, 1, 2, 2, 1, 1, 1, 2, 1, 1, 1],
    [1, 2, 1, 2, 1, 1, 2, 1, 1, 1, 2, 1, 1, 1], [1, 3, 1, 1, 1, 1, 2, 1, 1, 1, 2, 1, 1, 1],
    [1, 1, 1, 1, 1, 1, 2, 1, 2, 1, 1, 3, 1, 1], [1, 1, 1, 1, 1, 1, 2, 1, 2, 2, 1, 2, 1, 1],
    [1, 1, 1, 1, 1, 1, 2, 1, 2, 3, 1, 1, 1, 1], [1, 1, 1, 1, 1, 1, 2, 2, 2, 1, 1, 2, 1, 1],
    [1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 1, 1, 1, 1],
];

fn character(value: u32) -> Vec<u32> {
    let g = group_of(&GROUPS, value);
    let v = value - g.sum;
    let odd = rss_widths((v / g.t) as i64, g.odd_modules, 7, g.odd_widest, true);
    let even = rss_widths((v % g.t) as i64, g.even_modules, 7, g.even_widest, false);
    interleave(&odd, &even)
}

/// The 46 element widths of the symbol, starting with a space.
pub(crate) fn element_widths(body: &str) -> Result<Vec<u32>> {
    let value: u64 = match body.parse() {
        Ok(v) => v,
        Err(_) => return invalid(format!("GTIN must be numeric, got {:?}", body)),
    };
    if value >= 2 * 1_000_000_000_000 {
        return invalid(format!("DataBar Limited GTINs start with 0 or 1, got {}", body));
    }
    let left = character((value / SPLIT) as u32);
    let right = character((value % SPLIT) as u32);

    // weights 3^k mod 89 over the left then the right character
    let mut checksum = 0u32;
    let mut weight = 1u32;
    for &element in left.iter().chain(right.iter()) {
        checksum += weight * element;
        weight = weight * 3 % 89;
    }
    let checksum = (checksum % 89) as usize;
    debug!("DataBar Limited checksum {}", checksum);

    let mut total = Vec::with_capacity(46);
    total.extend_from_slice(&[1, 1]);
    total.extend(left);
    total.extend(CHECK_TABLE[checksum].iter());
    total.extend(right);
    total.extend_from_slice(&[1, 1]);
    Ok(total)
}

pub fn encode(payload: &str, _config: &EncodingConfiguration) -> Result<LinearSymbol> {
    let body = gtin_body(payload)?;
    let widths = element_widths(&body)?;
    let symbol = LinearSymbol {
        rows: vec![BarRow { bars: widths_to_bars(&widths, false), height: 10 }],
        quiet_left: 0,
        quiet_right: 0,
        text: Vec::new(),
    };
    Ok(symbol.with_caption(gtin_caption(&body)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_check_table() {
        assert_eq!(CHECK_TABLE[0], [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 3, 3, 1, 1]);
        assert_eq!(CHECK_TABLE[1], [1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 3, 2, 1, 1]);
        assert_eq!(CHECK_TABLE[88], [1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 1, 1, 1, 1]);
        for pattern in CHECK_TABLE.iter() {
            let spaces: u32 = pattern.iter().step_by(2).sum();
            let bars: u32 = pattern.iter().skip(1).step_by(2).sum();
            assert_eq!((spaces, bars), (9, 9));
            assert_eq!(&pattern[12..], &[1, 1]);
        }
        assert!(CHECK_TABLE.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn test_element_widths() {
        let widths = element_widths("1501234567890").unwrap();
        assert_eq!(
            widths,
            vec![
                1, 1, 3, 2, 2, 2, 3, 2, 1, 2, 1, 1, 1, 1, 2, 3, 1, 1, 1, 2, 1, 1, 2, 1, 1, 2, 2, 1, 1, 1, 2, 1, 2, 1, 1,
                2, 3, 2, 1, 3, 2, 2, 2, 2, 1, 1
            ]
        );
    }

    #[test]
    fn test_encode() {
        let symbol = encode("(01)15012345678907", &EncodingConfiguration::default()).unwrap();
        assert_eq!(symbol.symbol_width(), 74);
        assert_eq!(symbol.rows[0].height, 10);
        assert!(encode("2501234567890", &EncodingConfiguration::default()).is_err());
    }
}

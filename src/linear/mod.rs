//! One-dimensional symbologies. Every encoder returns a single row `LinearSymbol`
//! with its quiet zones and human readable text segments.

use crate::config::EncodingConfiguration;
use crate::error::Result;
use crate::symbol::{AbstractSymbol, Bar, Encoder};

pub mod code128;
pub mod code39;
pub mod code93;
pub mod jan_upc;
pub mod nw7;
pub mod two_of_five;

/// Default quiet zone of the plain linear codes, in modules.
pub const QUIET_ZONE: u32 = 10;

/// Bars of a module bit pattern, most significant bit first. Set bits are dark.
pub fn bars_from_bits(bits: u32, len: u32) -> Vec<Bar> {
    let mut bars: Vec<Bar> = Vec::new();
    for i in (0..len).rev() {
        let dark = (bits >> i) & 1 == 1;
        match bars.last_mut() {
            Some(last) if last.dark == dark => last.modules += 1,
            _ => bars.push(Bar::new(1, dark)),
        }
    }
    bars
}

/// Bars of a wide/narrow pattern given as bits (1 = wide), most significant bit
/// first, starting with a bar.
pub fn bars_from_wide_narrow(pattern: u32, elements: u32, wide: u32) -> Vec<Bar> {
    (0..elements)
        .map(|i| {
            let is_wide = (pattern >> (elements - 1 - i)) & 1 == 1;
            Bar::new(if is_wide { wide } else { 1 }, i % 2 == 0)
        })
        .collect()
}

macro_rules! linear_encoder {
    ($name:ident, $func:path) => {
        pub struct $name;

        impl Encoder for $name {
            fn encode(&self, payload: &str, config: &EncodingConfiguration) -> Result<AbstractSymbol> {
                $func(payload, config).map(AbstractSymbol::Linear)
            }
        }
    };
}

linear_encoder!(Code39Encoder, code39::encode);
linear_encoder!(Code93Encoder, code93::encode);
linear_encoder!(Code128Encoder, code128::encode);
linear_encoder!(Gs1_128Encoder, code128::encode_gs1);
linear_encoder!(Nw7Encoder, nw7::encode);
linear_encoder!(Matrix2of5Encoder, two_of_five::encode_matrix);
linear_encoder!(Nec2of5Encoder, two_of_five::encode_nec);
linear_encoder!(ItfEncoder, two_of_five::encode_itf);
linear_encoder!(Jan8Encoder, jan_upc::encode_jan8);
linear_encoder!(Jan13Encoder, jan_upc::encode_jan13);
linear_encoder!(UpcAEncoder, jan_upc::encode_upca);
linear_encoder!(UpcEEncoder, jan_upc::encode_upce);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bars_from_bits() {
        assert_eq!(
            bars_from_bits(0b11010010000, 11),
            vec![
                Bar::new(2, true),
                Bar::new(1, false),
                Bar::new(1, true),
                Bar::new(2, false),
                Bar::new(1, true),
                Bar::new(4, false)
            ]
        );
    }

    #[test]
    fn test_wide_narrow() {
        // 0b01010: narrow bar, wide space, narrow bar, wide space, narrow bar
        let bars = bars_from_wide_narrow(0b01010, 5, 3);
        let widths: Vec<u32> = bars.iter().map(|b| b.modules).collect();
        assert_eq!(widths, vec![1, 3, 1, 3, 1]);
        assert!(bars[0].dark && !bars[1].dark);
    }
}

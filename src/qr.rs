/// QR Code model 2 encoder: picks the mode and version, builds the bit stream,
/// protects it and serializes the symbol onto the marker canvas.
use log::debug;

use crate::bitcoding::{self, kanji_value, map_alphanumeric, BitRecorder};
use crate::config::{ECCLevel, Encoding, EncodingConfiguration, StringEncoding, Version};
use crate::error::{invalid, too_large, Result};
use crate::rscoding::qr_interleave;
use crate::serialization::{self, masking};
use crate::symbol::{AbstractSymbol, Encoder, MatrixSymbol};
use crate::tables::lookup_capacity;

/// ECI assignment number of UTF-8.
const ECI_UTF8: u32 = 26;

/// One data segment, ready for the bit stream.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Segment {
    bytes: Vec<u8>,
    mode: Encoding,
    eci: Option<u32>,
}

impl Segment {
    fn num_bits(&self, version: Version) -> usize {
        let eci_bits = match self.eci {
            Some(n) if n < 128 => 12,
            Some(n) if n < 16384 => 20,
            Some(_) => 28,
            None => 0,
        };
        let chars = bitcoding::char_count(&self.bytes, self.mode);
        eci_bits + 4 + self.mode.num_char_count_bits(version) + self.mode.num_encoded_bits(chars)
    }

    fn fits(&self, version: Version, ecl: ECCLevel) -> bool {
        let chars = bitcoding::char_count(&self.bytes, self.mode);
        chars < 1 << self.mode.num_char_count_bits(version)
            && self.num_bits(version) <= lookup_capacity(version, ecl).data_bits as usize
    }
}

fn is_kanji_sequence(bytes: &[u8]) -> bool {
    bytes.len() % 2 == 0 && bytes.chunks(2).all(|pair| kanji_value(pair[0], pair[1]).is_some())
}

/// Narrowest mode that covers every character of the payload.
fn detect_mode(bytes: &[u8], shift_jis: bool) -> Encoding {
    if bytes.iter().all(u8::is_ascii_digit) {
        Encoding::Numeric
    } else if bytes.iter().all(|&b| map_alphanumeric(b).is_some()) {
        Encoding::Alphanumeric
    } else if shift_jis && is_kanji_sequence(bytes) {
        Encoding::Kanji
    } else {
        Encoding::Bytes
    }
}

fn build_segment(payload: &str, config: &EncodingConfiguration) -> Result<Segment> {
    if payload.is_empty() {
        return invalid("QR payload is empty");
    }
    // kanji mode always works on Shift JIS bytes
    let string_encoding = match config.encode_mode {
        Some(Encoding::Kanji) => StringEncoding::ShiftJis,
        _ => config.string_encoding,
    };
    let bytes = string_encoding.encode(payload)?;
    let mode = match config.encode_mode {
        Some(mode) => mode,
        None => detect_mode(&bytes, string_encoding == StringEncoding::ShiftJis),
    };
    let eci = if mode == Encoding::Bytes && string_encoding == StringEncoding::Utf8 && !payload.is_ascii() {
        Some(ECI_UTF8)
    } else {
        None
    };
    Ok(Segment { bytes, mode, eci })
}

fn choose_version(segment: &Segment, config: &EncodingConfiguration) -> Result<Version> {
    let ecl = config.error_correction_level;
    match config.version {
        Some(version) if segment.fits(version, ecl) => Ok(version),
        Some(version) => too_large(format!(
            "{} bytes do not fit QR {}-{:?}",
            segment.bytes.len(),
            version.number(),
            ecl
        )),
        None => match Version::all().find(|&v| segment.fits(v, ecl)) {
            Some(version) => Ok(version),
            None => too_large(format!(
                "{} bytes exceed the largest QR symbol at level {:?}",
                segment.bytes.len(),
                ecl
            )),
        },
    }
}

/// Encode a payload into a finished QR module grid.
pub fn encode_qr(payload: &str, config: &EncodingConfiguration) -> Result<MatrixSymbol> {
    let segment = build_segment(payload, config)?;
    let version = choose_version(&segment, config)?;
    let ecl = config.error_correction_level;
    let capacity = lookup_capacity(version, ecl);

    let mut stream = BitRecorder::new();
    if let Some(assignment) = segment.eci {
        bitcoding::write_eci_header(&mut stream, assignment)?;
    }
    bitcoding::encode_data_segment(&mut stream, &segment.bytes, segment.mode, version)?;
    let data = bitcoding::finalize_bitstream(stream, capacity.data_codewords as usize)?;
    let codewords = qr_interleave(&data, &capacity);

    let mut symbol = serialization::create_qr_canvas(version);
    serialization::insert_data_payload(&mut symbol, version, &codewords)?;
    let (mask, mut symbol) = masking::apply_best_mask(&symbol, version, ecl);
    serialization::insert_version_info(&mut symbol, version);

    debug!(
        "QR version {} level {:?} mode {:?} eci {:?} mask {}",
        version.number(),
        ecl,
        segment.mode,
        segment.eci,
        mask
    );

    Ok(MatrixSymbol {
        grid: serialization::canvas_to_grid(&symbol, version),
        quiet: version.quiet_region_size(),
        row_height: 1,
    })
}

pub struct QrEncoder;

impl Encoder for QrEncoder {
    fn encode(&self, payload: &str, config: &EncodingConfiguration) -> Result<AbstractSymbol> {
        encode_qr(payload, config).map(AbstractSymbol::Matrix)
    }
}

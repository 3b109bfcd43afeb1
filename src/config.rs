/// Contains enums and structs that will also be exported as the public
/// API of this crate: the symbology list, the option enums and the
/// per-instance configuration value object.
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use std::cmp::{Ordering, PartialOrd};
use std::str::FromStr;

use crate::error::{BarcodeError, Result};

//-------------------------------------------------------------------------------------------------

/// The nineteen supported symbologies. The discriminants are the stable integer ids
/// used by `Barcode::create`.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum Symbology {
    Code39 = 0,
    Code93 = 1,
    Code128 = 2,
    Gs1_128 = 3,
    Nw7 = 4,
    Matrix2of5 = 5,
    Nec2of5 = 6,
    Jan8 = 7,
    Jan13 = 8,
    UpcA = 9,
    UpcE = 10,
    Itf = 11,
    DataBar14 = 12,
    DataBarLimited = 13,
    DataBarExpanded = 14,
    YubinCustomer = 15,
    Qr = 16,
    DataMatrix = 17,
    Pdf417 = 18,
}

/// Rendering family of a symbology, decides which draw calls and options apply.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub enum Family {
    Linear,
    DataBar,
    Matrix,
    Postal,
}

impl Symbology {
    pub const ALL: [Symbology; 19] = [
        Symbology::Code39,
        Symbology::Code93,
        Symbology::Code128,
        Symbology::Gs1_128,
        Symbology::Nw7,
        Symbology::Matrix2of5,
        Symbology::Nec2of5,
        Symbology::Jan8,
        Symbology::Jan13,
        Symbology::UpcA,
        Symbology::UpcE,
        Symbology::Itf,
        Symbology::DataBar14,
        Symbology::DataBarLimited,
        Symbology::DataBarExpanded,
        Symbology::YubinCustomer,
        Symbology::Qr,
        Symbology::DataMatrix,
        Symbology::Pdf417,
    ];

    pub fn from_id(id: i32) -> Result<Symbology> {
        if id < 0 {
            return Err(BarcodeError::UnsupportedSymbology(id));
        }
        Symbology::ALL
            .get(id as usize)
            .copied()
            .ok_or(BarcodeError::UnsupportedSymbology(id))
    }

    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn family(self) -> Family {
        match self {
            Symbology::DataBar14 | Symbology::DataBarLimited | Symbology::DataBarExpanded => {
                Family::DataBar
            }
            Symbology::YubinCustomer => Family::Postal,
            Symbology::Qr | Symbology::DataMatrix | Symbology::Pdf417 => Family::Matrix,
            _ => Family::Linear,
        }
    }

    /// Whether a configuration field has any meaning for this symbology.
    pub fn accepts(self, field: Field) -> bool {
        use Symbology::*;
        let family = self.family();
        match field {
            Field::OutputFormat | Field::Colors => true,
            Field::PixelAdjust => family != Family::Matrix,
            Field::FitWidth => family != Family::Postal,
            Field::Text => matches!(family, Family::Linear | Family::DataBar),
            Field::ShowStartStop => matches!(self, Code39 | Nw7),
            Field::CodeMode => self == Code128,
            Field::ExtendedGuard => matches!(self, Jan8 | Jan13 | UpcA | UpcE),
            Field::CheckDigit => matches!(self, Code39 | Nw7 | Itf | Matrix2of5 | Nec2of5),
            Field::StringEncoding => family == Family::Matrix,
            Field::Qr => self == Qr,
            Field::DataMatrix => self == DataMatrix,
            Field::Pdf417 => self == Pdf417,
            Field::DataBar14 => self == DataBar14,
            Field::DataBarExpanded => self == DataBarExpanded,
        }
    }
}

/// Groups of configuration fields sharing the same applicability rule.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub enum Field {
    OutputFormat,
    Colors,
    PixelAdjust,
    FitWidth,
    Text,
    ShowStartStop,
    CodeMode,
    ExtendedGuard,
    CheckDigit,
    StringEncoding,
    Qr,
    DataMatrix,
    Pdf417,
    DataBar14,
    DataBarExpanded,
}

//-------------------------------------------------------------------------------------------------

/// QR data encoding modes.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum Encoding {
    Numeric,      // only digits allowed [0-9]
    Alphanumeric, // digits, capital letters and nine other chars [0-9A-Z$%*+-./: ]
    Bytes,        // ISO8859-1, UTF-8 or Shift JIS bytes
    Kanji,        // Shift JIS double byte characters
}

impl Encoding {
    /// Return the number of bits used in the given symbol version to encode the number of
    /// characters for the following encoded content.
    pub fn num_char_count_bits(self, version: Version) -> usize {
        match version.number() {
            1..=9 => match self {
                Encoding::Numeric => 10,
                Encoding::Alphanumeric => 9,
                Encoding::Bytes | Encoding::Kanji => 8,
            },
            10..=26 => match self {
                Encoding::Numeric => 12,
                Encoding::Alphanumeric => 11,
                Encoding::Bytes => 16,
                Encoding::Kanji => 10,
            },
            _ => match self {
                Encoding::Numeric => 14,
                Encoding::Alphanumeric => 13,
                Encoding::Bytes => 16,
                Encoding::Kanji => 12,
            },
        }
    }

    /// Compute the number of bits needed to encode a sequence with the given length
    /// of characters. In Kanji mode a character is two bytes.
    pub fn num_encoded_bits(self, num_chars: usize) -> usize {
        match self {
            Encoding::Numeric => (10 * num_chars + 2) / 3,
            Encoding::Alphanumeric => (11 * num_chars + 1) / 2,
            Encoding::Bytes => num_chars * 8,
            Encoding::Kanji => num_chars * 13,
        }
    }

    /// Compute the lowest common encoding of two encodings in the sense of the partial
    /// ordering defined below.
    pub fn upper_bound(self, other: Self) -> Self {
        match self.partial_cmp(&other) {
            Some(Ordering::Less) | Some(Ordering::Equal) => other,
            Some(Ordering::Greater) => self,
            None => Encoding::Bytes, // bytes is an upper bound for every encoding
        }
    }
}

impl PartialOrd for Encoding {
    /// `a <= b` if `b` supports a superset of the characters supported by `a`.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (*self, *other) {
            (Encoding::Numeric, Encoding::Alphanumeric)
            | (Encoding::Numeric, Encoding::Bytes)
            | (Encoding::Alphanumeric, Encoding::Bytes)
            | (Encoding::Kanji, Encoding::Bytes) => Some(Ordering::Less),
            (Encoding::Alphanumeric, Encoding::Numeric)
            | (Encoding::Bytes, Encoding::Numeric)
            | (Encoding::Bytes, Encoding::Alphanumeric)
            | (Encoding::Bytes, Encoding::Kanji) => Some(Ordering::Greater),
            (a, b) if a == b => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl FromStr for Encoding {
    type Err = ();

    fn from_str(desc: &str) -> std::result::Result<Self, ()> {
        match desc.trim().to_ascii_uppercase().as_str() {
            "NUMERIC" => Ok(Encoding::Numeric),
            "ALPHANUMERIC" | "ALPHA" => Ok(Encoding::Alphanumeric),
            "BYTE" | "BYTES" | "BINARY" => Ok(Encoding::Bytes),
            "KANJI" => Ok(Encoding::Kanji),
            _ => Err(()),
        }
    }
}

//-------------------------------------------------------------------------------------------------

/// QR symbol version, 1 through 40.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Debug, Serialize, Deserialize)]
pub struct Version(u8);

impl Version {
    pub const MIN: Version = Version(1);
    pub const MAX: Version = Version(40);

    pub fn new(number: u8) -> Option<Version> {
        if (1..=40).contains(&number) {
            Some(Version(number))
        } else {
            None
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Return quiet region size (counted only once)
    pub fn quiet_region_size(self) -> u32 {
        4
    }

    /// Return the width & height of the given symbol, not counting the quiet region
    pub fn dimensions(self) -> u32 {
        (self.0 as u32) * 4 + 17
    }

    pub fn all() -> impl Iterator<Item = Version> {
        (1..=40).map(Version)
    }
}

impl FromStr for Version {
    type Err = ();

    fn from_str(decl: &str) -> std::result::Result<Self, ()> {
        decl.trim().parse::<u8>().ok().and_then(Version::new).ok_or(())
    }
}

//-------------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum ECCLevel {
    L, // allows recovery of  7% of the data
    M, // allows recovery of 15% of the data
    Q, // allows recovery of 25% of the data
    H, // allows recovery of 30% of the data
}

impl ECCLevel {
    /// Row index into the ISO 18004 block tables.
    pub fn ordinal(self) -> usize {
        match self {
            ECCLevel::L => 0,
            ECCLevel::M => 1,
            ECCLevel::Q => 2,
            ECCLevel::H => 3,
        }
    }
}

impl FromStr for ECCLevel {
    type Err = ();

    fn from_str(desc: &str) -> std::result::Result<Self, ()> {
        match desc.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(ECCLevel::L),
            "M" => Ok(ECCLevel::M),
            "Q" => Ok(ECCLevel::Q),
            "H" => Ok(ECCLevel::H),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub struct SymbolConfig(pub Version, pub ECCLevel);

impl SymbolConfig {
    pub const fn new(v: Version, e: ECCLevel) -> SymbolConfig {
        SymbolConfig(v, e)
    }
}

impl FromStr for SymbolConfig {
    type Err = ();

    /// Parses the form commonly used in the standard, such as 1-H, 6-M, 40-L.
    fn from_str(decl: &str) -> std::result::Result<Self, ()> {
        let (v, e) = decl.split('-').next_tuple().ok_or(())?;
        Ok(SymbolConfig::new(v.parse()?, e.parse()?))
    }
}

//-------------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Svg,
}

impl FromStr for OutputFormat {
    type Err = ();

    fn from_str(desc: &str) -> std::result::Result<Self, ()> {
        match desc.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "svg" => Ok(OutputFormat::Svg),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const BLACK: Rgba = Rgba([0, 0, 0, 255]);
    pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);

    /// Accepts components in 0..=255 only.
    pub fn from_components(r: i32, g: i32, b: i32, a: i32) -> Option<Rgba> {
        let mut out = [0u8; 4];
        for (slot, &c) in out.iter_mut().zip([r, g, b, a].iter()) {
            if !(0..=255).contains(&c) {
                return None;
            }
            *slot = c as u8;
        }
        Some(Rgba(out))
    }
}

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum Code128Mode {
    Auto,
    A,
    B,
    C,
}

impl FromStr for Code128Mode {
    type Err = ();

    fn from_str(desc: &str) -> std::result::Result<Self, ()> {
        match desc.trim().to_ascii_uppercase().as_str() {
            "AUTO" => Ok(Code128Mode::Auto),
            "A" => Ok(Code128Mode::A),
            "B" => Ok(Code128Mode::B),
            "C" => Ok(Code128Mode::C),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum StringEncoding {
    Utf8,
    ShiftJis,
}

impl StringEncoding {
    /// Converts a payload into the byte form fed to the 2D encoders.
    pub fn encode(self, payload: &str) -> Result<Vec<u8>> {
        match self {
            StringEncoding::Utf8 => Ok(payload.as_bytes().to_vec()),
            StringEncoding::ShiftJis => {
                let (bytes, _, had_errors) = encoding_rs::SHIFT_JIS.encode(payload);
                if had_errors {
                    return Err(BarcodeError::InvalidPayload(format!(
                        "{:?} cannot be represented in Shift_JIS",
                        payload
                    )));
                }
                Ok(bytes.into_owned())
            }
        }
    }
}

impl FromStr for StringEncoding {
    type Err = ();

    fn from_str(desc: &str) -> std::result::Result<Self, ()> {
        match desc.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(StringEncoding::Utf8),
            "shift-jis" | "shiftjis" | "sjis" => Ok(StringEncoding::ShiftJis),
            _ => Err(()),
        }
    }
}

/// DataMatrix symbol size, rows by columns.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum DataMatrixSize {
    Auto,
    Fixed { rows: u32, cols: u32 },
}

impl FromStr for DataMatrixSize {
    type Err = ();

    fn from_str(desc: &str) -> std::result::Result<Self, ()> {
        let desc = desc.trim().to_ascii_lowercase();
        if desc == "auto" {
            return Ok(DataMatrixSize::Auto);
        }
        let (rows, cols) = desc.split('x').next_tuple().ok_or(())?;
        let rows = rows.trim().parse::<u32>().map_err(|_| ())?;
        let cols = cols.trim().parse::<u32>().map_err(|_| ())?;
        if crate::datamatrix::SymbolSize::lookup(rows, cols).is_none() {
            return Err(());
        }
        Ok(DataMatrixSize::Fixed { rows, cols })
    }
}

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum DataMatrixScheme {
    Auto,
    Ascii,
    C40,
    Text,
    X12,
    Edifact,
    Base256,
}

impl FromStr for DataMatrixScheme {
    type Err = ();

    fn from_str(desc: &str) -> std::result::Result<Self, ()> {
        match desc.trim().to_ascii_uppercase().as_str() {
            "AUTO" => Ok(DataMatrixScheme::Auto),
            "ASCII" => Ok(DataMatrixScheme::Ascii),
            "C40" => Ok(DataMatrixScheme::C40),
            "TEXT" => Ok(DataMatrixScheme::Text),
            "X12" => Ok(DataMatrixScheme::X12),
            "EDIFACT" => Ok(DataMatrixScheme::Edifact),
            "BASE256" => Ok(DataMatrixScheme::Base256),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum DataBar14Type {
    Omnidirectional,
    Stacked,
    StackedOmnidirectional,
}

impl DataBar14Type {
    pub fn as_str(self) -> &'static str {
        match self {
            DataBar14Type::Omnidirectional => "OMNIDIRECTIONAL",
            DataBar14Type::Stacked => "STACKED",
            DataBar14Type::StackedOmnidirectional => "STACKED_OMNIDIRECTIONAL",
        }
    }
}

impl FromStr for DataBar14Type {
    type Err = ();

    fn from_str(desc: &str) -> std::result::Result<Self, ()> {
        match desc.trim().to_ascii_uppercase().as_str() {
            "OMNIDIRECTIONAL" => Ok(DataBar14Type::Omnidirectional),
            "STACKED" => Ok(DataBar14Type::Stacked),
            "STACKED_OMNIDIRECTIONAL" => Ok(DataBar14Type::StackedOmnidirectional),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum DataBarExpandedType {
    Unstacked,
    Stacked,
}

impl FromStr for DataBarExpandedType {
    type Err = ();

    fn from_str(desc: &str) -> std::result::Result<Self, ()> {
        match desc.trim().to_ascii_uppercase().as_str() {
            "UNSTACKED" => Ok(DataBarExpandedType::Unstacked),
            "STACKED" => Ok(DataBarExpandedType::Stacked),
            _ => Err(()),
        }
    }
}

//-------------------------------------------------------------------------------------------------

/// All options of one barcode instance. Every field always holds a valid value;
/// the facade setters drop anything that does not parse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfiguration {
    pub output_format: OutputFormat,
    pub foreground: Rgba,
    pub background: Rgba,
    pub px_adjust_black: i32,
    pub px_adjust_white: i32,
    pub fit_width: bool,

    pub show_text: bool,
    pub text_font_scale: f64,
    pub text_gap: f64,
    pub text_even_spacing: bool,
    pub show_start_stop: bool,
    pub code_mode: Code128Mode,
    pub extended_guard: bool,
    pub check_digit: bool,

    pub string_encoding: StringEncoding,

    pub error_correction_level: ECCLevel,
    /// `None` selects the smallest version that fits.
    pub version: Option<Version>,
    /// `None` selects the narrowest mode that covers the payload.
    pub encode_mode: Option<Encoding>,

    pub code_size: DataMatrixSize,
    pub encode_scheme: DataMatrixScheme,

    /// `None` derives the level from the number of data codewords.
    pub error_level: Option<u8>,
    /// 0 means automatic.
    pub columns: u32,
    /// 0 means automatic.
    pub rows: u32,
    pub aspect_ratio: f64,
    pub y_height: u32,

    pub symbol_type_14: DataBar14Type,
    pub symbol_type_exp: DataBarExpandedType,
    /// Segment pairs per row of a stacked DataBar Expanded symbol.
    pub no_of_columns: u32,
}

impl Default for EncodingConfiguration {
    fn default() -> Self {
        EncodingConfiguration {
            output_format: OutputFormat::Png,
            foreground: Rgba::BLACK,
            background: Rgba::WHITE,
            px_adjust_black: 0,
            px_adjust_white: 0,
            fit_width: false,
            show_text: true,
            text_font_scale: 1.0,
            text_gap: 1.0,
            text_even_spacing: false,
            show_start_stop: true,
            code_mode: Code128Mode::Auto,
            extended_guard: true,
            check_digit: false,
            string_encoding: StringEncoding::Utf8,
            error_correction_level: ECCLevel::M,
            version: None,
            encode_mode: None,
            code_size: DataMatrixSize::Auto,
            encode_scheme: DataMatrixScheme::Auto,
            error_level: None,
            columns: 0,
            rows: 0,
            aspect_ratio: 0.5,
            y_height: 3,
            symbol_type_14: DataBar14Type::Omnidirectional,
            symbol_type_exp: DataBarExpandedType::Unstacked,
            no_of_columns: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_symbol_code_parsing() {
        let v = |n| Version::new(n).unwrap();
        assert_eq!("2-L".parse(), Ok(SymbolConfig::new(v(2), ECCLevel::L)));
        assert_eq!("20-Q".parse(), Ok(SymbolConfig::new(v(20), ECCLevel::Q)));
        assert_eq!("38-m".parse(), Ok(SymbolConfig::new(v(38), ECCLevel::M)));
        assert_eq!("41-H".parse::<SymbolConfig>(), Err(()));
        assert_eq!("M3-H".parse::<SymbolConfig>(), Err(()));
    }

    #[test]
    fn test_symbology_ids() {
        for (i, s) in Symbology::ALL.iter().enumerate() {
            assert_eq!(s.id(), i as i32);
            assert_eq!(Symbology::from_id(i as i32), Ok(*s));
        }
        assert_eq!(Symbology::from_id(19), Err(BarcodeError::UnsupportedSymbology(19)));
        assert_eq!(Symbology::from_id(-1), Err(BarcodeError::UnsupportedSymbology(-1)));
    }

    #[test]
    fn test_option_parsing() {
        assert_eq!("JPG".parse(), Ok(OutputFormat::Jpeg));
        assert_eq!("Svg".parse(), Ok(OutputFormat::Svg));
        assert_eq!("gif".parse::<OutputFormat>(), Err(()));
        assert_eq!("Shift_JIS".parse(), Ok(StringEncoding::ShiftJis));
        assert_eq!("16x48".parse(), Ok(DataMatrixSize::Fixed { rows: 16, cols: 48 }));
        assert_eq!("11x11".parse::<DataMatrixSize>(), Err(()));
        assert_eq!("stacked_omnidirectional".parse(), Ok(DataBar14Type::StackedOmnidirectional));
        assert_eq!(Rgba::from_components(1, 2, 3, 256), None);
    }

    #[test]
    fn test_string_encoding() {
        assert_eq!(StringEncoding::Utf8.encode("\u{00e9}").unwrap(), vec![0xC3, 0xA9]);
        assert_eq!(StringEncoding::ShiftJis.encode("\u{6f22}\u{5b57}").unwrap(), vec![0x8A, 0xBF, 0x8E, 0x9A]);
        assert!(StringEncoding::ShiftJis.encode("\u{1F600}").is_err());
    }

    #[test]
    fn test_applicability() {
        assert!(Symbology::Qr.accepts(Field::Qr));
        assert!(!Symbology::Code128.accepts(Field::Qr));
        assert!(Symbology::Nw7.accepts(Field::ShowStartStop));
        assert!(!Symbology::Code93.accepts(Field::ShowStartStop));
        assert!(!Symbology::YubinCustomer.accepts(Field::Text));
        assert!(Symbology::DataBarLimited.accepts(Field::Text));
    }

    #[test]
    fn test_encoding_order() {
        assert_eq!(Encoding::Numeric.upper_bound(Encoding::Alphanumeric), Encoding::Alphanumeric);
        assert_eq!(Encoding::Kanji.upper_bound(Encoding::Alphanumeric), Encoding::Bytes);
        assert_eq!(Encoding::Numeric.num_encoded_bits(8), 27);
    }
}

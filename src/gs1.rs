//! GS1 element strings: `(AI)data` parsing, validation against the application
//! identifier table, check digit completion and FNC1 placement.

use crate::checksum::{complete_mod10, mod10};
use crate::error::{invalid, Result};

/// Field separator between a variable length element and the next AI. Encoders
/// translate it into their FNC1 representation.
pub const FNC1: char = '\u{1D}';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Charset {
    Numeric,
    /// GS1 AI encodable character set 82.
    Alphanumeric,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct AiSpec {
    min: usize,
    max: usize,
    charset: Charset,
    /// The last digit is a mod-10 check digit over the preceding ones.
    check_digit: bool,
}

const fn fixed(len: usize, check_digit: bool) -> AiSpec {
    AiSpec { min: len, max: len, charset: Charset::Numeric, check_digit }
}

const fn numeric(min: usize, max: usize) -> AiSpec {
    AiSpec { min, max, charset: Charset::Numeric, check_digit: false }
}

const fn text(min: usize, max: usize) -> AiSpec {
    AiSpec { min, max, charset: Charset::Alphanumeric, check_digit: false }
}

/// Data rules of an application identifier, `None` for unknown AIs.
fn lookup_ai(ai: &str) -> Option<AiSpec> {
    let spec = match ai {
        "00" => fixed(18, true),
        "01" | "02" => fixed(14, true),
        "10" | "21" | "22" => text(1, 20),
        "11" | "12" | "13" | "15" | "16" | "17" => fixed(6, false),
        "20" => fixed(2, false),
        "240" | "241" | "250" | "251" | "400" | "401" | "403" => text(1, 30),
        "242" => numeric(1, 6),
        "253" => text(13, 30),
        "254" | "420" => text(1, 20),
        "30" | "37" => numeric(1, 8),
        "402" => fixed(17, true),
        "410" | "411" | "412" | "413" | "414" | "415" | "416" | "417" => fixed(13, true),
        "421" => text(4, 12),
        "422" | "424" | "426" => fixed(3, false),
        "423" | "425" => numeric(3, 15),
        "7001" => fixed(13, false),
        "7003" => fixed(10, false),
        "8001" => fixed(14, false),
        "8002" => text(1, 20),
        "8003" => text(14, 30),
        "8004" => text(1, 30),
        "8005" => fixed(6, false),
        "8006" => fixed(18, false),
        "8007" => text(1, 34),
        "8008" => numeric(8, 12),
        "8018" => fixed(18, true),
        "8020" => text(1, 25),
        "8200" => text(1, 70),
        "90" => text(1, 30),
        _ if ai.len() == 2 && ai.as_bytes()[0] == b'9' => text(1, 90),
        // measures: 31nn - 36nn, 6 digits
        _ if ai.len() == 4 && matches!(&ai[..2], "31" | "32" | "33" | "34" | "35" | "36") => fixed(6, false),
        _ if ai.len() == 4 && matches!(&ai[..3], "390" | "392") => numeric(1, 15),
        _ if ai.len() == 4 && matches!(&ai[..3], "391" | "393") => numeric(4, 18),
        _ => return None,
    };
    Some(spec)
}

/// Two digit AI prefixes whose element strings have a predefined length and
/// therefore never need a field separator.
fn has_predefined_length(ai: &str) -> bool {
    matches!(
        &ai[..2],
        "00" | "01" | "02" | "03" | "04" | "11" | "12" | "13" | "14" | "15" | "16" | "17" | "18" | "19" | "20"
            | "31" | "32" | "33" | "34" | "35" | "36" | "41"
    )
}

fn in_charset_82(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '"' | '%' | '&' | '\'' | '(' | ')' | '*' | '+' | ',' | '-' | '.' | '/' | ':' | ';' | '<' | '='
                | '>' | '?' | '_'
        )
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AiElement {
    pub ai: String,
    pub data: String,
}

impl AiElement {
    pub fn predefined_length(&self) -> bool {
        has_predefined_length(&self.ai)
    }
}

fn validate(ai: &str, data: &str) -> Result<String> {
    let spec = match lookup_ai(ai) {
        Some(spec) => spec,
        None => return invalid(format!("unknown application identifier ({})", ai)),
    };
    let data = if spec.check_digit {
        // the check digit may be left out and is appended then
        complete_mod10(data, spec.min - 1)?
    } else {
        data.to_string()
    };
    let len = data.chars().count();
    if len < spec.min || len > spec.max {
        return invalid(format!("({}) takes {} to {} characters, got {}", ai, spec.min, spec.max, len));
    }
    let valid = match spec.charset {
        Charset::Numeric => data.chars().all(|c| c.is_ascii_digit()),
        Charset::Alphanumeric => data.chars().all(in_charset_82),
    };
    if !valid {
        return invalid(format!("({}) contains characters outside its character set: {:?}", ai, data));
    }
    Ok(data)
}

/// Parses `(01)04912345123459(10)ABC123` into validated elements.
pub fn parse_bracketed(input: &str) -> Result<Vec<AiElement>> {
    let input = input.trim();
    if !input.starts_with('(') {
        return invalid("GS1 data must start with a bracketed application identifier");
    }
    let mut elements = Vec::new();
    for group in input[1..].split('(') {
        let (ai, data) = match group.find(')') {
            Some(pos) => (&group[..pos], &group[pos + 1..]),
            None => return invalid(format!("unterminated application identifier in {:?}", input)),
        };
        if !(2..=4).contains(&ai.len()) || !ai.bytes().all(|b| b.is_ascii_digit()) {
            return invalid(format!("malformed application identifier ({})", ai));
        }
        if data.contains(')') {
            return invalid(format!("stray ')' in {:?}", group));
        }
        let data = validate(ai, data)?;
        elements.push(AiElement { ai: ai.to_string(), data });
    }
    Ok(elements)
}

/// Concatenated element string with FNC1 separators after variable length elements
/// that are followed by another element. The leading FNC1 is not included.
pub fn element_string(elements: &[AiElement]) -> String {
    let mut out = String::new();
    for (i, e) in elements.iter().enumerate() {
        out.push_str(&e.ai);
        out.push_str(&e.data);
        if i + 1 < elements.len() && !e.predefined_length() {
            out.push(FNC1);
        }
    }
    out
}

/// Human readable interpretation, `(01)04912345123459(10)ABC`.
pub fn human_readable(elements: &[AiElement]) -> String {
    elements.iter().map(|e| format!("({}){}", e.ai, e.data)).collect()
}

/// Normalises a GTIN-13 body with optional `(01)` prefix and optional 14th check
/// digit into the 13 digit body.
pub fn gtin13_body(input: &str) -> Result<String> {
    let body = crate::checksum::strip_ai_01(input);
    if !body.bytes().all(|b| b.is_ascii_digit()) {
        return invalid(format!("GTIN must be numeric, got {:?}", input));
    }
    match body.len() {
        13 => Ok(body.to_string()),
        14 => {
            let check = mod10(&body[..13])?;
            if body.as_bytes()[13] - b'0' == check {
                Ok(body[..13].to_string())
            } else {
                invalid(format!("check digit of {} should be {}", body, check))
            }
        }
        n => invalid(format!("GTIN needs 13 or 14 digits, got {}", n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BarcodeError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse() {
        let elements = parse_bracketed("(01)0491234512345(10)ABC123").unwrap();
        assert_eq!(
            elements,
            vec![
                AiElement { ai: "01".into(), data: "04912345123459".into() },
                AiElement { ai: "10".into(), data: "ABC123".into() },
            ]
        );
        assert_eq!(human_readable(&elements), "(01)04912345123459(10)ABC123");
    }

    #[test]
    fn test_fnc1_placement() {
        let elements = parse_bracketed("(10)LOT7(17)250101(01)04912345123459").unwrap();
        assert_eq!(element_string(&elements), "10LOT7\u{1D}172501010104912345123459");
    }

    #[test]
    fn test_validation() {
        assert!(matches!(parse_bracketed("(01)04912345123450"), Err(BarcodeError::InvalidPayload(_))));
        assert!(parse_bracketed("(01)0491234512345").is_ok());
        assert!(parse_bracketed("(01)123").is_err());
        assert!(parse_bracketed("(17)25010A").is_err());
        assert!(parse_bracketed("(10)lot 7").is_err());
        assert!(parse_bracketed("(999)1").is_err());
        assert!(parse_bracketed("0104912345123459").is_err());
        assert!(parse_bracketed("(3103)000525").is_ok());
        assert!(parse_bracketed("(21)12345678901234567890").is_ok());
        assert!(parse_bracketed("(21)123456789012345678901").is_err());
    }

    #[test]
    fn test_gtin13_body() {
        assert_eq!(gtin13_body("(01)0491234512345").unwrap(), "0491234512345");
        assert_eq!(gtin13_body("04912345123459").unwrap(), "0491234512345");
        assert!(gtin13_body("04912345123450").is_err());
        assert!(gtin13_body("123").is_err());
    }
}

//! Six-dot braille numeral decoding for key and time signatures.
//!
//! The full braille surface grammar belongs to the parser front-end; the
//! only cells the engine reads itself are the numerals and accidental marks
//! of key and time signatures.  Input is Unicode braille (U+2800..U+28FF);
//! dot n of a cell is bit n-1 of its mask.

use crate::signature::{KeySignature, SignatureError, TimeSignature};

/// The numeric indicator, dots 3456.
pub const NUMBER_SIGN: u8 = 0b11_1100;
/// Sharp sign, dots 146.
pub const SHARP: u8 = 0b10_1001;
/// Flat sign, dots 126.
pub const FLAT: u8 = 0b10_0011;
/// Natural sign, dots 16.
pub const NATURAL: u8 = 0b10_0001;

/// Dot mask of a Unicode braille cell.
pub fn dots(ch: char) -> Result<u8, SignatureError> {
    let code = ch as u32;
    if (0x2800..=0x28FF).contains(&code) {
        Ok((code - 0x2800) as u8)
    } else {
        Err(SignatureError::NotBraille(ch))
    }
}

/// Upper-cell digits 1..9, 0 (the letters a..j).
const UPPER_DIGITS: [u8; 10] = [
    0b01_1010, // 0  (j, dots 245)
    0b00_0001, // 1  (a, dot 1)
    0b00_0011, // 2  (b, dots 12)
    0b00_1001, // 3  (c, dots 14)
    0b01_1001, // 4  (d, dots 145)
    0b01_0001, // 5  (e, dots 15)
    0b00_1011, // 6  (f, dots 124)
    0b01_1011, // 7  (g, dots 1245)
    0b01_0011, // 8  (h, dots 125)
    0b00_1010, // 9  (i, dots 24)
];

/// Lower-cell digits: the upper digits shifted down one row.
const LOWER_DIGITS: [u8; 10] = [
    0b11_0100, // 0  (dots 356)
    0b00_0010, // 1  (dot 2)
    0b00_0110, // 2  (dots 23)
    0b01_0010, // 3  (dots 25)
    0b11_0010, // 4  (dots 256)
    0b10_0010, // 5  (dots 26)
    0b01_0110, // 6  (dots 235)
    0b11_0110, // 7  (dots 2356)
    0b10_0110, // 8  (dots 236)
    0b01_0100, // 9  (dots 35)
];

fn upper_digit(mask: u8) -> Option<i64> {
    UPPER_DIGITS.iter().position(|&d| d == mask).map(|p| p as i64)
}

fn lower_digit(mask: u8) -> Option<i64> {
    LOWER_DIGITS.iter().position(|&d| d == mask).map(|p| p as i64)
}

fn to_masks(input: &str) -> Result<Vec<u8>, SignatureError> {
    input.chars().map(dots).collect()
}

/// Read a run of digits from `cells`, returning the value and the rest.
fn number(cells: &[u8], digit: fn(u8) -> Option<i64>) -> Result<(i64, &[u8]), SignatureError> {
    let mut value = 0i64;
    let mut consumed = 0;
    while let Some(d) = cells.get(consumed).copied().and_then(digit) {
        value = value * 10 + d;
        consumed += 1;
    }
    if consumed == 0 {
        return Err(SignatureError::MissingDigit);
    }
    Ok((value, &cells[consumed..]))
}

/// Decode a braille time signature: number sign, upper-cell numerator,
/// lower-cell denominator.
pub fn parse_time_signature(input: &str) -> Result<TimeSignature, SignatureError> {
    let cells = to_masks(input)?;
    let rest = match cells.split_first() {
        Some((&NUMBER_SIGN, rest)) => rest,
        _ => return Err(SignatureError::MissingNumberSign),
    };
    let (numerator, rest) = number(rest, upper_digit)?;
    let (denominator, rest) = number(rest, lower_digit)?;
    if !rest.is_empty() {
        return Err(SignatureError::TrailingInput);
    }
    Ok(TimeSignature::new(numerator, denominator))
}

/// Decode a braille key signature.
///
/// Three forms: empty (no accidentals), up to three literal sharp or flat
/// signs, or a number sign with a count followed by one sharp or flat.
pub fn parse_key_signature(input: &str) -> Result<KeySignature, SignatureError> {
    let cells = to_masks(input)?;
    if cells.is_empty() {
        return Ok(KeySignature::default());
    }

    if cells[0] == NUMBER_SIGN {
        let (count, rest) = number(&cells[1..], upper_digit)?;
        return match rest {
            [SHARP] => Ok(KeySignature::new(count as i32)),
            [FLAT] => Ok(KeySignature::new(-(count as i32))),
            [] => Err(SignatureError::MissingAccidental),
            _ => Err(SignatureError::TrailingInput),
        };
    }

    let sign = cells[0];
    if sign != SHARP && sign != FLAT {
        return Err(SignatureError::MissingAccidental);
    }
    if cells.len() > 3 || cells.iter().any(|&c| c != sign) {
        return Err(SignatureError::TrailingInput);
    }
    let count = cells.len() as i32;
    Ok(KeySignature::new(if sign == SHARP { count } else { -count }))
}

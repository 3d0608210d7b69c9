use std::error::Error;
use std::fmt;

use crate::processor::Source;

/// Longest literal the pending buffer will accept (an 8-bit binary string).
pub const PENDING_MAX: usize = 8;

/// Numeric base of a literal being entered.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Base {
    Decimal,
    Binary,
    Hex,
}

impl Base {
    fn radix(self) -> u32 {
        match self {
            Self::Decimal => 10,
            Self::Binary => 2,
            Self::Hex => 16,
        }
    }

    /// Whether a character may be appended to the pending buffer in this
    /// base. Deliberately looser than the base itself for decimal/binary, so
    /// a bad digit is reported at commit time rather than swallowed.
    pub fn accepts(self, ch: char) -> bool {
        match self {
            Self::Decimal | Self::Binary => ch.is_ascii_digit(),
            Self::Hex => ch.is_ascii_hexdigit(),
        }
    }

    /// Operand source tag for a literal entered in this base.
    pub fn source(self) -> Source {
        match self {
            Self::Decimal => Source::Decimal,
            Self::Binary => Source::Binary,
            Self::Hex => Source::Hex,
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decimal => write!(f, "decimal"),
            Self::Binary => write!(f, "binary"),
            Self::Hex => write!(f, "hex"),
        }
    }
}

/// The single user-facing error kind: an invalid numeric literal.
#[derive(Debug, PartialEq, Eq)]
pub enum LiteralError {
    /// Length constraint violated; checked before any parse attempt.
    WrongLength { base: Base },
    /// Characters do not form a number in the selected base.
    Malformed { base: Base },
    /// Parsed fine but does not fit in a byte.
    OutOfRange,
}

impl Error for LiteralError {}

impl fmt::Display for LiteralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongLength { base: Base::Binary } => {
                write!(f, "BINARY LITERAL MUST BE EXACTLY 8 DIGITS")
            }
            Self::WrongLength { base: Base::Decimal } => {
                write!(f, "DECIMAL LITERAL MUST BE AT MOST 8 DIGITS")
            }
            Self::WrongLength { base: Base::Hex } => {
                write!(f, "HEX LITERAL MUST BE AT MOST 2 DIGITS")
            }
            Self::Malformed { base } => {
                write!(f, "NOT A VALID {} NUMBER", base.to_string().to_uppercase())
            }
            Self::OutOfRange => write!(f, "VALUE MUST BE BELOW 256"),
        }
    }
}

/// Validate and parse a committed literal buffer into a byte.
///
/// Length rules are enforced before the parse attempt:
///  - decimal: at most 8 characters, value below 256;
///  - binary: exactly 8 characters (which also bounds the value);
///  - hex: at most 2 characters, case-insensitive.
///
/// The caller treats an empty buffer as "no input" and never passes it here.
pub fn parse(base: Base, text: &str) -> Result<u8, LiteralError> {
    debug_assert!(!text.is_empty(), "empty buffer is ignored at commit");

    match base {
        Base::Decimal if text.len() > 8 => return Err(LiteralError::WrongLength { base }),
        Base::Binary if text.len() != 8 => return Err(LiteralError::WrongLength { base }),
        Base::Hex if text.len() > 2 => return Err(LiteralError::WrongLength { base }),
        _ => {}
    }

    let value =
        u32::from_str_radix(text, base.radix()).map_err(|_| LiteralError::Malformed { base })?;
    if value > u8::MAX as u32 {
        return Err(LiteralError::OutOfRange);
    }
    Ok(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expect(base: Base, input: &str, expected: Result<u8, LiteralError>) {
        println!("{input:?}");
        assert_eq!(parse(base, input), expected);
    }

    #[test]
    fn decimal() {
        expect(Base::Decimal, "0", Ok(0));
        expect(Base::Decimal, "5", Ok(5));
        expect(Base::Decimal, "255", Ok(255));
        expect(Base::Decimal, "00000255", Ok(255));
        expect(Base::Decimal, "256", Err(LiteralError::OutOfRange));
        expect(Base::Decimal, "99999999", Err(LiteralError::OutOfRange));
        expect(
            Base::Decimal,
            "000000255",
            Err(LiteralError::WrongLength { base: Base::Decimal }),
        );
    }

    #[test]
    fn binary_length_is_checked_before_parse() {
        expect(
            Base::Binary,
            "1010",
            Err(LiteralError::WrongLength { base: Base::Binary }),
        );
        expect(
            Base::Binary,
            "101010101",
            Err(LiteralError::WrongLength { base: Base::Binary }),
        );
        expect(Base::Binary, "10101010", Ok(0b1010_1010));
        expect(Base::Binary, "00000000", Ok(0));
        expect(Base::Binary, "11111111", Ok(255));
        // Wrong digits are only caught once the length is right.
        expect(
            Base::Binary,
            "10101019",
            Err(LiteralError::Malformed { base: Base::Binary }),
        );
    }

    #[test]
    fn hex() {
        expect(Base::Hex, "0", Ok(0));
        expect(Base::Hex, "ff", Ok(255));
        expect(Base::Hex, "FF", Ok(255));
        expect(Base::Hex, "fF", Ok(255));
        expect(Base::Hex, "2a", Ok(42));
        expect(Base::Hex, "100", Err(LiteralError::WrongLength { base: Base::Hex }));
    }
}

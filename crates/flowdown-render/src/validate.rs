//! Optional input validation for callers that want to reject binary data
//! before rendering. The parser itself never fails on content.

use flowdown_types::ValidateError;

const MIN_BINARY_SAMPLE: usize = 64;
const MAX_CONTROL_PCT: usize = 2;

/// Rejects input that is not valid UTF-8 or looks binary.
///
/// Binary means a NUL byte anywhere, or at least 2 % control bytes over a
/// sample of 64 bytes or more.
pub fn validate_input(src: &[u8]) -> Result<(), ValidateError> {
    if std::str::from_utf8(src).is_err() {
        return Err(ValidateError::InvalidUtf8);
    }
    let mut control = 0;
    for &b in src {
        if b == 0x00 {
            return Err(ValidateError::BinaryInput);
        }
        if is_control_byte(b) {
            control += 1;
        }
    }
    if src.len() >= MIN_BINARY_SAMPLE && control * 100 >= src.len() * MAX_CONTROL_PCT {
        return Err(ValidateError::BinaryInput);
    }
    Ok(())
}

fn is_control_byte(b: u8) -> bool {
    b < 0x09 || (b > 0x0d && b < 0x20) || b == 0x7f
}

/// True for control runes the pipeline drops. `\n`, `\r`, and `\t` pass.
pub(crate) fn is_control_rune(r: char) -> bool {
    if r == '\n' || r == '\r' || r == '\t' {
        return false;
    }
    r < '\u{20}' || r == '\u{7f}'
}

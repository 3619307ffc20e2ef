//! Byte arrays embedded in C/C++ source.
//!
//! Scores are commonly distributed as a declaration like
//!
//! ```c
//! const byte score[] PROGMEM = {
//!     0x90, 83, 0, 75, 0x80, 0xF0 // comment
//! };
//! ```

use crate::FormatError;

/// Extract the values of the first brace-delimited array in `source`.
///
/// Accepts hex (`0x1F`) and decimal literals; comments are ignored.
pub fn parse_c_array(source: &str) -> Result<Vec<u8>, FormatError> {
    let code = strip_comments(source);
    let open = code.find('{').ok_or(FormatError::NoArray)?;
    let close = code[open..].find('}').ok_or(FormatError::NoArray)? + open;

    code[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(parse_byte)
        .collect()
}

fn parse_byte(token: &str) -> Result<u8, FormatError> {
    let parsed = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => token.parse::<u8>(),
    };
    parsed.map_err(|_| FormatError::InvalidByte(token.to_string()))
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    loop {
        let line = rest.find("//");
        let block = rest.find("/*");
        match (line, block) {
            (Some(l), Some(b)) if b < l => {
                out.push_str(&rest[..b]);
                out.push(' ');
                rest = rest[b + 2..].find("*/").map_or("", move |end| &rest[b + 2 + end + 2..]);
            }
            (None, Some(b)) => {
                out.push_str(&rest[..b]);
                out.push(' ');
                rest = rest[b + 2..].find("*/").map_or("", move |end| &rest[b + 2 + end + 2..]);
            }
            (Some(l), _) => {
                out.push_str(&rest[..l]);
                rest = rest[l..].find('\n').map_or("", move |nl| &rest[l + nl..]);
            }
            (None, None) => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

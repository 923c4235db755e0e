//! Rendering of binary blobs as compilable C string literals, and back.
//!
//! A blob named `prc_pubkey` with index 3 comes out as
//!
//! ```text
//! static const char * const prc_pubkey3_data =
//!   "-----BEGIN PUBLIC KEY-----\n"
//!   "MIGdMA0GCSqGSIb3DQEBAQUAA4GLADCBhwKBgQC...\n"
//!   "-----END PUBLIC KEY-----\n";
//! static const unsigned int prc_pubkey3_length = 272;
//! ```
//!
//! The literal breaks after every newline byte. The output is a pure
//! function of the input bytes.

use std::fmt::Write;

/// Append the `_data` and `_length` declarations for `bytes` to `out`.
pub fn encode_c_string(out: &mut String, name: &str, index: u32, bytes: &[u8]) {
    let _ = write!(out, "static const char * const {}{}_data =\n  \"", name, index);
    escape_into(out, bytes);
    let _ = write!(
        out,
        "\";\nstatic const unsigned int {}{}_length = {};\n",
        name,
        index,
        bytes.len()
    );
}

/// The escaped body of a literal, without the surrounding declaration.
pub fn escape_into(out: &mut String, bytes: &[u8]) {
    let mut last_nl = false;
    let mut after_hex = false;

    for &b in bytes {
        if b == b'\n' {
            out.push_str("\\n");
            last_nl = true;
            after_hex = false;
            continue;
        }

        if last_nl {
            out.push_str("\"\n  \"");
            last_nl = false;
        } else if after_hex && b.is_ascii_hexdigit() {
            // A C hex escape swallows every following hex digit.
            out.push_str("\" \"");
        }
        after_hex = false;

        match b {
            b'\t' => out.push_str("\\t"),
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            // Keeps "??=" and friends from being read as trigraphs.
            b'?' => out.push_str("\\?"),
            0x20..=0x7e => out.push(b as char),
            _ => {
                let _ = write!(out, "\\x{:02x}", b);
                after_hex = true;
            }
        }
    }
}

/// Decode a run of adjacent string literals at the start of `text`.
///
/// Leading whitespace and whitespace between literals is skipped. Returns
/// the concatenated bytes and the number of bytes of `text` consumed.
pub fn decode_c_literals(text: &[u8]) -> Result<(Vec<u8>, usize), String> {
    let mut data = Vec::new();
    let mut pos = 0;
    let mut seen_literal = false;

    loop {
        while pos < text.len() && text[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= text.len() || text[pos] != b'"' {
            break;
        }
        pos += 1;
        seen_literal = true;

        loop {
            let b = *text.get(pos).ok_or("unterminated string literal")?;
            pos += 1;
            match b {
                b'"' => break,
                b'\n' => return Err("newline inside string literal".into()),
                b'\\' => {
                    let e = *text.get(pos).ok_or("unterminated escape")?;
                    pos += 1;
                    match e {
                        b'n' => data.push(b'\n'),
                        b't' => data.push(b'\t'),
                        b'r' => data.push(b'\r'),
                        b'0' => data.push(0),
                        b'"' | b'\\' | b'\'' | b'?' => data.push(e),
                        b'x' => {
                            let start = pos;
                            let mut value: u32 = 0;
                            while pos < text.len() && text[pos].is_ascii_hexdigit() {
                                value = value * 16 + (text[pos] as char).to_digit(16).unwrap_or(0);
                                if value > 0xff {
                                    return Err("hex escape out of range".into());
                                }
                                pos += 1;
                            }
                            if pos == start {
                                return Err("empty hex escape".into());
                            }
                            data.push(value as u8);
                        }
                        other => {
                            return Err(format!("unknown escape '\\{}'", other as char));
                        }
                    }
                }
                _ => data.push(b),
            }
        }
    }

    if !seen_literal {
        return Err("expected a string literal".into());
    }
    Ok((data, pos))
}

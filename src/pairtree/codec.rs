//! Identifier cleaning per the Pairtree specification.
//!
//! A raw identifier is "cleaned" into a form that is safe to use as a
//! sequence of file names: problem bytes are hex-escaped, then three
//! single-character substitutions are applied for readability. Cleaning is
//! total for any UTF-8 input; uncleaning is partial and rejects malformed
//! escape sequences.

use crate::error::{Error, Result};

/// Prefix character for a two-digit hex escape in a cleaned id.
pub const HEX_INDICATOR: char = '^';

/// Bytes inside the printable range that must nevertheless be escaped.
fn must_escape(b: u8) -> bool {
    matches!(
        b,
        b'"' | b'*' | b'+' | b',' | b'<' | b'=' | b'>' | b'?' | b'\\' | b'^' | b'|'
    )
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

fn hex_digit(v: u8) -> char {
    HEX_DIGITS[(v & 0x0f) as usize] as char
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|v| v as u8)
}

/// Converts a raw identifier into its cleaned, path-safe form.
///
/// Every byte of the UTF-8 encoding outside `0x21..=0x7e`, plus the fixed
/// must-escape set, becomes `^` followed by two lowercase hex digits. The
/// convenience substitutions `/` -> `=`, `:` -> `+` and `.` -> `,` are
/// applied after escaping, so they never collide with escaped bytes.
pub fn clean_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for &b in id.as_bytes() {
        if !(0x21..=0x7e).contains(&b) || must_escape(b) {
            out.push(HEX_INDICATOR);
            out.push(hex_digit(b >> 4));
            out.push(hex_digit(b & 0x0f));
        } else {
            out.push(match b {
                b'/' => '=',
                b':' => '+',
                b'.' => ',',
                other => other as char,
            });
        }
    }
    out
}

/// Recovers the raw identifier from a cleaned id.
///
/// Inverse of [`clean_id`]. Fails with [`Error::MalformedEscape`] if a `^`
/// is not followed by exactly two hex digits (including truncation at the
/// end of the string) or if the unescaped bytes are not valid UTF-8.
pub fn unclean_id(clean: &str) -> Result<String> {
    let bytes = clean.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'^' => {
                if i + 2 >= bytes.len() {
                    return Err(malformed(clean, i));
                }
                let hi = hex_value(bytes[i + 1]).ok_or_else(|| malformed(clean, i))?;
                let lo = hex_value(bytes[i + 2]).ok_or_else(|| malformed(clean, i))?;
                out.push((hi << 4) | lo);
                i += 3;
            }
            b'=' => {
                out.push(b'/');
                i += 1;
            }
            b'+' => {
                out.push(b':');
                i += 1;
            }
            b',' => {
                out.push(b'.');
                i += 1;
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|e| malformed(clean, e.utf8_error().valid_up_to()))
}

fn malformed(input: &str, position: usize) -> Error {
    Error::MalformedEscape {
        input: input.to_string(),
        position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_representative_ids() {
        assert_eq!(clean_id("ark:/13030/xt12t3"), "ark+=13030=xt12t3");
        assert_eq!(
            clean_id("http://n2t.info/urn:nbn:se:kb:repos-1"),
            "http+==n2t,info=urn+nbn+se+kb+repos-1"
        );
        assert_eq!(clean_id("what-the-*@?#!^!?"), "what-the-^2a@^3f#!^5e!^3f");
    }

    #[test]
    fn uncleans_representative_ids() {
        assert_eq!(unclean_id("ark+=13030=xt12t3").unwrap(), "ark:/13030/xt12t3");
        assert_eq!(
            unclean_id("http+==n2t,info=urn+nbn+se+kb+repos-1").unwrap(),
            "http://n2t.info/urn:nbn:se:kb:repos-1"
        );
        assert_eq!(
            unclean_id("what-the-^2a@^3f#!^5e!^3f").unwrap(),
            "what-the-*@?#!^!?"
        );
    }

    #[test]
    fn escapes_whitespace_and_control_bytes() {
        assert_eq!(clean_id("a b"), "a^20b");
        assert_eq!(clean_id("a\tb"), "a^09b");
        assert_eq!(unclean_id("a^20b").unwrap(), "a b");
    }

    #[test]
    fn escapes_multibyte_utf8_per_byte() {
        // U+00E9 is 0xc3 0xa9 in UTF-8
        assert_eq!(clean_id("caf\u{e9}"), "caf^c3^a9");
        assert_eq!(unclean_id("caf^c3^a9").unwrap(), "caf\u{e9}");
    }

    #[test]
    fn round_trips() {
        let ids = [
            "ark:/13030/xt12t3",
            "http://n2t.info/urn:nbn:se:kb:repos-1",
            "what-the-*@?#!^!?",
            "hvd.ah3d1a",
            "uc1.$b281602",
            "abc 123\tdef",
            "na\u{ef}ve/\u{2603}:id",
        ];
        for id in ids {
            assert_eq!(unclean_id(&clean_id(id)).unwrap(), id, "id: {id}");
        }
    }

    #[test]
    fn rejects_truncated_escape() {
        assert!(matches!(
            unclean_id("ab^"),
            Err(Error::MalformedEscape { position: 2, .. })
        ));
        assert!(matches!(
            unclean_id("ab^4"),
            Err(Error::MalformedEscape { position: 2, .. })
        ));
    }

    #[test]
    fn rejects_non_hex_escape() {
        assert!(matches!(
            unclean_id("^zz"),
            Err(Error::MalformedEscape { position: 0, .. })
        ));
    }

    #[test]
    fn rejects_escapes_decoding_to_invalid_utf8() {
        assert!(matches!(
            unclean_id("^ff^fe"),
            Err(Error::MalformedEscape { .. })
        ));
    }

    #[test]
    fn accepts_uppercase_hex_digits() {
        assert_eq!(unclean_id("a^2Ab").unwrap(), "a*b");
    }
}

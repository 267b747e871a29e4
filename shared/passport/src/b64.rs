//! Unpadded base64url, as JWTs use it.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum B64Error {
    #[error("base64url input has an impossible length")]
    Length,
    #[error("malformed base64url input")]
    Malformed,
}

/// Encodes with the URL-safe alphabet and no trailing padding.
#[must_use]
pub fn encode(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decodes a segment whose padding was stripped, synthesizing the missing
/// `=` characters first. A length of 1 mod 4 cannot come from any input.
pub fn decode(segment: &str) -> Result<Vec<u8>, B64Error> {
    let mut padded = String::with_capacity(segment.len() + 2);
    padded.push_str(segment);
    match segment.len() % 4 {
        0 => {}
        2 => padded.push_str("=="),
        3 => padded.push('='),
        _ => return Err(B64Error::Length),
    }
    URL_SAFE.decode(padded).map_err(|_| B64Error::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_strips_padding() {
        assert_eq!(encode(b"f"), "Zg");
        assert_eq!(encode(b"fo"), "Zm8");
        assert_eq!(encode(b"foo"), "Zm9v");
    }

    #[test]
    fn decode_synthesizes_padding() {
        assert_eq!(decode("Zg").unwrap(), b"f");
        assert_eq!(decode("Zm8").unwrap(), b"fo");
        assert_eq!(decode("Zm9v").unwrap(), b"foo");
        assert_eq!(decode("").unwrap(), b"");
    }

    #[test]
    fn decode_uses_url_safe_alphabet() {
        // 0xfb 0xff encodes to "-_8" in the URL-safe alphabet.
        assert_eq!(encode([0xfb, 0xff]), "-_8");
        assert_eq!(decode("-_8").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode("+/8"), Err(B64Error::Malformed));
    }

    #[test]
    fn decode_rejects_impossible_length() {
        assert_eq!(decode("Zm9vx"), Err(B64Error::Length));
    }

    #[test]
    fn decode_rejects_invalid_characters() {
        assert_eq!(decode("not!b64!"), Err(B64Error::Malformed));
    }

    #[test]
    fn round_trip() {
        let data: Vec<u8> = (0u8..=255).collect();
        assert_eq!(decode(&encode(&data)).unwrap(), data);
    }
}

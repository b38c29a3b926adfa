//! Plain text

use crate::error::Result;
use std::borrow::Cow;

/// Decode UTF-8 text verbatim.
///
/// Invalid sequences fail with a decode error unless `lenient` is set, in
/// which case they are replaced with U+FFFD.
pub fn extract(bytes: &[u8], lenient: bool) -> Result<String> {
    if lenient {
        return Ok(match String::from_utf8_lossy(bytes) {
            Cow::Borrowed(text) => text.to_string(),
            Cow::Owned(text) => {
                tracing::warn!("Replaced invalid UTF-8 sequences in plain text");
                text
            }
        });
    }
    Ok(std::str::from_utf8(bytes)?.to_string())
}

/// UTF-8 encoding of the text
pub fn reconstruct(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;

    #[test]
    fn test_strict_decoding() {
        assert_eq!(extract("Zoë\r\n".as_bytes(), false).unwrap(), "Zoë\r\n");

        let err = extract(&[0x66, 0xff, 0x6f], false).unwrap_err();
        assert!(matches!(err, ExtractError::Decode(_)));
    }

    #[test]
    fn test_lenient_decoding() {
        assert_eq!(extract(&[0x66, 0xff, 0x6f], true).unwrap(), "f\u{fffd}o");
    }

    #[test]
    fn test_reconstruct_is_utf8() {
        assert_eq!(reconstruct("<PERSON> ✓"), "<PERSON> ✓".as_bytes());
    }
}

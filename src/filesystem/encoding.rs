// file: src/filesystem/encoding.rs
// description: Text decoding with a Latin-1 fallback for non UTF-8 files

use crate::models::TextEncoding;

/// UTF-8 when the bytes are valid, otherwise Latin-1. Latin-1 maps every byte
/// to a code point, so decoding never fails.
pub fn decode_with_fallback(bytes: Vec<u8>) -> (String, TextEncoding) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, TextEncoding::Utf8),
        Err(err) => {
            let text = err.into_bytes().iter().map(|&b| b as char).collect();
            (text, TextEncoding::Latin1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode() {
        let (text, enc) = decode_with_fallback("ümlaut".as_bytes().to_vec());
        assert_eq!(text, "ümlaut");
        assert_eq!(enc, TextEncoding::Utf8);

        let (text, enc) = decode_with_fallback(vec![0xff, 0x41]);
        assert_eq!(text, "ÿA");
        assert_eq!(enc, TextEncoding::Latin1);
    }
}

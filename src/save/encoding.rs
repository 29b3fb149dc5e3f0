//! Transport encoding for file content.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Input chunk size. A multiple of 3 so chunk outputs concatenate without
/// padding in the middle.
pub const CHUNK_SIZE: usize = (32 * 1024 / 3) * 3;

/// Base64 of the UTF-8 bytes of `content`, encoded one chunk at a time.
pub fn encode_content(content: &str) -> String {
    let bytes = content.as_bytes();
    let mut encoded = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(CHUNK_SIZE) {
        STANDARD.encode_string(chunk, &mut encoded);
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_content() {
        assert_eq!(encode_content("hello"), "aGVsbG8=");
        assert_eq!(encode_content(""), "");
    }

    #[test]
    fn test_multibyte_content() {
        assert_eq!(encode_content("ü€"), STANDARD.encode("ü€".as_bytes()));
    }

    #[test]
    fn test_chunked_matches_whole_buffer() {
        let content: String = "Tiddly ✓ wiki\n".repeat(CHUNK_SIZE / 4);
        assert!(content.len() > 3 * CHUNK_SIZE);

        let encoded = encode_content(&content);
        assert_eq!(encoded, STANDARD.encode(content.as_bytes()));
        assert_eq!(STANDARD.decode(encoded).unwrap(), content.as_bytes());
    }
}

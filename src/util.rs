//! Small encoding utilities shared by the converters.
//!
//! The encoders back the deserializer's attribute rendering. The decoders
//! are not used on the conversion paths (attribute values are typed by
//! inference, never sniffed as hex or base64); they are exposed for
//! library callers that drive [`crate::BinaryXmlSerializer`] directly and
//! need to turn rendered text back into the byte payloads its
//! `attribute_bytes_hex`/`attribute_bytes_base64` writers take.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// XML entity encoder for safe XML output
pub fn encode_xml_entities(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Lowercase hex encoding of a byte slice
pub fn hex_encode(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decode a hex string into bytes, e.g. a rendered BYTES_HEX attribute
/// value back into the payload for
/// [`BinaryXmlSerializer::attribute_bytes_hex`](crate::BinaryXmlSerializer::attribute_bytes_hex).
pub fn hex_decode(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s)
}

/// Standard base64 encoding with `=` padding
pub fn base64_encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode a standard base64 string into bytes, e.g. a rendered
/// BYTES_BASE64 attribute value back into the payload for
/// [`BinaryXmlSerializer::attribute_bytes_base64`](crate::BinaryXmlSerializer::attribute_bytes_base64).
pub fn base64_decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_xml_entities() {
        assert_eq!(
            encode_xml_entities("5 < 6 & \"t\""),
            "5 &lt; 6 &amp; &quot;t&quot;"
        );
        assert_eq!(encode_xml_entities("it's"), "it&apos;s");
        assert_eq!(encode_xml_entities("plain"), "plain");
    }

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(hex_encode(&[0xDE, 0xAD, 0xBE, 0xEF]), "deadbeef");
        assert_eq!(hex_decode("deadbeef").unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_base64_round_trip() {
        assert_eq!(base64_encode(&[0xDE, 0xAD, 0xBE, 0xEF]), "3q2+7w==");
        assert_eq!(
            base64_decode("3q2+7w==").unwrap(),
            vec![0xDE, 0xAD, 0xBE, 0xEF]
        );
    }
}

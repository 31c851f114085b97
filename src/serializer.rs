use crate::io::{FastDataOutput, MAX_UNSIGNED_SHORT};
use crate::{ATTRIBUTE, CDSECT, COMMENT, DOCDECL, ENTITY_REF, IGNORABLE_WHITESPACE};
use crate::{AbxError, PROTOCOL_MAGIC_VERSION_0, Result};
use crate::{END_DOCUMENT, END_TAG, PROCESSING_INSTRUCTION, START_DOCUMENT, START_TAG, TEXT};
use crate::{TYPE_BOOLEAN_FALSE, TYPE_BOOLEAN_TRUE, TYPE_BYTES_BASE64, TYPE_BYTES_HEX};
use crate::{TYPE_DOUBLE, TYPE_FLOAT, TYPE_INT, TYPE_INT_HEX, TYPE_LONG, TYPE_LONG_HEX};
use crate::{TYPE_NULL, TYPE_STRING, TYPE_STRING_INTERNED};
use std::io::Write;

/// Binary XML serializer that accepts XML events and writes ABX records.
///
/// The magic header is written by the constructor, so a serializer that is
/// dropped before any event still leaves an identifiable prefix. Payload
/// strings are written as-is; the serializer never escapes or validates
/// text content.
pub struct BinaryXmlSerializer<W: Write> {
    output: FastDataOutput<W>,
    tag_names: Vec<String>,
}

impl<W: Write> BinaryXmlSerializer<W> {
    pub fn new(writer: W) -> Result<Self> {
        let mut output = FastDataOutput::new(writer);
        output.write_bytes(&PROTOCOL_MAGIC_VERSION_0)?;
        Ok(Self {
            output,
            tag_names: Vec::new(),
        })
    }

    /// Current element nesting depth
    pub fn depth(&self) -> usize {
        self.tag_names.len()
    }

    fn write_token(&mut self, command: u8, text: Option<&str>) -> Result<()> {
        if let Some(text) = text {
            self.output.write_byte(command | TYPE_STRING)?;
            self.output.write_utf(text)?;
        } else {
            self.output.write_byte(command | TYPE_NULL)?;
        }
        Ok(())
    }

    pub fn start_document(&mut self) -> Result<()> {
        self.output.write_byte(START_DOCUMENT | TYPE_NULL)
    }

    /// Write END_DOCUMENT and flush the underlying sink.
    ///
    /// Fails with `UnbalancedEnd` while elements are still open.
    pub fn end_document(&mut self) -> Result<()> {
        if !self.tag_names.is_empty() {
            return Err(AbxError::UnbalancedEnd);
        }
        self.output.write_byte(END_DOCUMENT | TYPE_NULL)?;
        self.output.flush()
    }

    pub fn start_tag(&mut self, name: &str) -> Result<()> {
        self.tag_names.push(name.to_string());
        self.output.write_byte(START_TAG | TYPE_STRING_INTERNED)?;
        self.output.write_interned_utf(name)
    }

    /// Close the innermost element; `name` must match the pending start tag.
    pub fn end_tag(&mut self, name: &str) -> Result<()> {
        match self.tag_names.pop() {
            None => return Err(AbxError::UnbalancedEnd),
            Some(top) if top != name => {
                return Err(AbxError::TagMismatch {
                    expected: top,
                    found: name.to_string(),
                });
            }
            Some(_) => {}
        }
        self.output.write_byte(END_TAG | TYPE_STRING_INTERNED)?;
        self.output.write_interned_utf(name)
    }

    pub fn attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.output.write_byte(ATTRIBUTE | TYPE_STRING)?;
        self.output.write_interned_utf(name)?;
        self.output.write_utf(value)
    }

    pub fn attribute_interned(&mut self, name: &str, value: &str) -> Result<()> {
        self.output.write_byte(ATTRIBUTE | TYPE_STRING_INTERNED)?;
        self.output.write_interned_utf(name)?;
        self.output.write_interned_utf(value)
    }

    pub fn attribute_bytes_hex(&mut self, name: &str, value: &[u8]) -> Result<()> {
        if value.len() > MAX_UNSIGNED_SHORT {
            return Err(AbxError::StringTooLong(value.len()));
        }
        self.output.write_byte(ATTRIBUTE | TYPE_BYTES_HEX)?;
        self.output.write_interned_utf(name)?;
        self.output.write_short(value.len() as u16)?;
        self.output.write_bytes(value)
    }

    pub fn attribute_bytes_base64(&mut self, name: &str, value: &[u8]) -> Result<()> {
        if value.len() > MAX_UNSIGNED_SHORT {
            return Err(AbxError::StringTooLong(value.len()));
        }
        self.output.write_byte(ATTRIBUTE | TYPE_BYTES_BASE64)?;
        self.output.write_interned_utf(name)?;
        self.output.write_short(value.len() as u16)?;
        self.output.write_bytes(value)
    }

    pub fn attribute_int(&mut self, name: &str, value: i32) -> Result<()> {
        self.output.write_byte(ATTRIBUTE | TYPE_INT)?;
        self.output.write_interned_utf(name)?;
        self.output.write_int(value)
    }

    pub fn attribute_int_hex(&mut self, name: &str, value: i32) -> Result<()> {
        self.output.write_byte(ATTRIBUTE | TYPE_INT_HEX)?;
        self.output.write_interned_utf(name)?;
        self.output.write_int(value)
    }

    pub fn attribute_long(&mut self, name: &str, value: i64) -> Result<()> {
        self.output.write_byte(ATTRIBUTE | TYPE_LONG)?;
        self.output.write_interned_utf(name)?;
        self.output.write_long(value)
    }

    pub fn attribute_long_hex(&mut self, name: &str, value: i64) -> Result<()> {
        self.output.write_byte(ATTRIBUTE | TYPE_LONG_HEX)?;
        self.output.write_interned_utf(name)?;
        self.output.write_long(value)
    }

    pub fn attribute_float(&mut self, name: &str, value: f32) -> Result<()> {
        self.output.write_byte(ATTRIBUTE | TYPE_FLOAT)?;
        self.output.write_interned_utf(name)?;
        self.output.write_float(value)
    }

    pub fn attribute_double(&mut self, name: &str, value: f64) -> Result<()> {
        self.output.write_byte(ATTRIBUTE | TYPE_DOUBLE)?;
        self.output.write_interned_utf(name)?;
        self.output.write_double(value)
    }

    pub fn attribute_boolean(&mut self, name: &str, value: bool) -> Result<()> {
        let token = if value {
            ATTRIBUTE | TYPE_BOOLEAN_TRUE
        } else {
            ATTRIBUTE | TYPE_BOOLEAN_FALSE
        };
        self.output.write_byte(token)?;
        self.output.write_interned_utf(name)
    }

    pub fn text(&mut self, text: &str) -> Result<()> {
        self.write_token(TEXT, Some(text))
    }

    pub fn cdsect(&mut self, text: &str) -> Result<()> {
        self.write_token(CDSECT, Some(text))
    }

    pub fn comment(&mut self, text: &str) -> Result<()> {
        self.write_token(COMMENT, Some(text))
    }

    /// A processing instruction serializes as `target` alone or
    /// `target data` joined by a single space.
    pub fn processing_instruction(&mut self, target: &str, data: Option<&str>) -> Result<()> {
        let payload = match data {
            Some(data) if !data.is_empty() => format!("{} {}", target, data),
            _ => target.to_string(),
        };
        self.write_token(PROCESSING_INSTRUCTION, Some(&payload))
    }

    pub fn docdecl(&mut self, text: &str) -> Result<()> {
        self.write_token(DOCDECL, Some(text))
    }

    pub fn ignorable_whitespace(&mut self, text: &str) -> Result<()> {
        self.write_token(IGNORABLE_WHITESPACE, Some(text))
    }

    /// Entity name without the surrounding `&` and `;`.
    pub fn entity_ref(&mut self, name: &str) -> Result<()> {
        self.write_token(ENTITY_REF, Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serialize(build: impl FnOnce(&mut BinaryXmlSerializer<&mut Vec<u8>>)) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut serializer = BinaryXmlSerializer::new(&mut buf).unwrap();
        build(&mut serializer);
        buf
    }

    #[test]
    fn test_magic_written_first() {
        let buf = serialize(|_| {});
        assert_eq!(buf, PROTOCOL_MAGIC_VERSION_0);
    }

    #[test]
    fn test_minimal_document_bytes() {
        let buf = serialize(|s| {
            s.start_document().unwrap();
            s.start_tag("r").unwrap();
            s.end_tag("r").unwrap();
            s.end_document().unwrap();
        });
        assert_eq!(
            buf,
            [
                0x41, 0x42, 0x58, 0x00, // magic
                0x10, // START_DOCUMENT | TYPE_NULL
                0x32, 0xFF, 0xFF, 0x00, 0x01, b'r', // START_TAG, new interned "r"
                0x33, 0x00, 0x00, // END_TAG, pool index 0
                0x11, // END_DOCUMENT | TYPE_NULL
            ]
        );
    }

    #[test]
    fn test_tag_mismatch() {
        let mut buf = Vec::new();
        let mut serializer = BinaryXmlSerializer::new(&mut buf).unwrap();
        serializer.start_document().unwrap();
        serializer.start_tag("a").unwrap();
        assert!(matches!(
            serializer.end_tag("b"),
            Err(AbxError::TagMismatch { .. })
        ));
    }

    #[test]
    fn test_unbalanced_end_tag() {
        let mut buf = Vec::new();
        let mut serializer = BinaryXmlSerializer::new(&mut buf).unwrap();
        serializer.start_document().unwrap();
        assert!(matches!(
            serializer.end_tag("a"),
            Err(AbxError::UnbalancedEnd)
        ));
    }

    #[test]
    fn test_end_document_with_open_tag() {
        let mut buf = Vec::new();
        let mut serializer = BinaryXmlSerializer::new(&mut buf).unwrap();
        serializer.start_document().unwrap();
        serializer.start_tag("a").unwrap();
        assert!(matches!(
            serializer.end_document(),
            Err(AbxError::UnbalancedEnd)
        ));
    }

    #[test]
    fn test_interning_reuse_across_tags() {
        // <a x="1"><a x="2"/></a>: "a" interned once at index 0, "x" at 1
        let buf = serialize(|s| {
            s.start_document().unwrap();
            s.start_tag("a").unwrap();
            s.attribute_int("x", 1).unwrap();
            s.start_tag("a").unwrap();
            s.attribute_int("x", 2).unwrap();
            s.end_tag("a").unwrap();
            s.end_tag("a").unwrap();
            s.end_document().unwrap();
        });
        assert_eq!(
            buf,
            [
                0x41, 0x42, 0x58, 0x00,
                0x10,
                0x32, 0xFF, 0xFF, 0x00, 0x01, b'a', // new "a" -> 0
                0x6F, 0xFF, 0xFF, 0x00, 0x01, b'x', 0x00, 0x00, 0x00, 0x01, // new "x" -> 1
                0x32, 0x00, 0x00, // inner <a> by index
                0x6F, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, // x=2 by index
                0x33, 0x00, 0x00,
                0x33, 0x00, 0x00,
                0x11,
            ]
        );
    }

    #[test]
    fn test_bytes_attribute_length_cap() {
        let mut buf = Vec::new();
        let mut serializer = BinaryXmlSerializer::new(&mut buf).unwrap();
        let too_long = vec![0u8; MAX_UNSIGNED_SHORT + 1];
        assert!(matches!(
            serializer.attribute_bytes_hex("data", &too_long),
            Err(AbxError::StringTooLong(65536))
        ));
    }

    #[test]
    fn test_processing_instruction_payload() {
        let buf = serialize(|s| {
            s.processing_instruction("target", Some("data here")).unwrap();
        });
        // command byte, then length-prefixed "target data here"
        let mut expected = vec![0x41, 0x42, 0x58, 0x00, 0x28, 0x00, 0x10];
        expected.extend_from_slice(b"target data here");
        assert_eq!(buf, expected);

        let buf = serialize(|s| {
            s.processing_instruction("lone", None).unwrap();
        });
        let mut expected = vec![0x41, 0x42, 0x58, 0x00, 0x28, 0x00, 0x04];
        expected.extend_from_slice(b"lone");
        assert_eq!(buf, expected);
    }
}

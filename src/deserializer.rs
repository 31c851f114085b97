use crate::io::FastDataInput;
use crate::util::{base64_encode, encode_xml_entities, hex_encode};
use crate::{ATTRIBUTE, CDSECT, COMMENT, DOCDECL, ENTITY_REF, IGNORABLE_WHITESPACE};
use crate::{AbxError, PROTOCOL_MAGIC_VERSION_0, Result};
use crate::{ConvertOptions, WarningCategory, Warnings};
use crate::{END_DOCUMENT, END_TAG, PROCESSING_INSTRUCTION, START_DOCUMENT, START_TAG, TEXT};
use crate::{TYPE_BOOLEAN_FALSE, TYPE_BOOLEAN_TRUE, TYPE_BYTES_BASE64, TYPE_BYTES_HEX};
use crate::{TYPE_DOUBLE, TYPE_FLOAT, TYPE_INT, TYPE_INT_HEX, TYPE_LONG, TYPE_LONG_HEX};
use crate::{TYPE_NULL, TYPE_STRING, TYPE_STRING_INTERNED};
use std::io::{Read, Write};

/// Binary XML deserializer that converts ABX format to XML
pub struct BinaryXmlDeserializer<R: Read, W: Write> {
    input: FastDataInput<R>,
    output: W,
    warnings: Warnings,
    open_tags: Vec<String>,
}

impl<R: Read, W: Write> BinaryXmlDeserializer<R, W> {
    /// Create a new deserializer with the given reader and writer
    pub fn new(reader: R, output: W) -> Result<Self> {
        Self::with_options(reader, output, ConvertOptions::default())
    }

    pub fn with_options(reader: R, output: W, options: ConvertOptions) -> Result<Self> {
        let mut input = FastDataInput::new(reader);

        let mut magic = [0u8; 4];
        for byte in magic.iter_mut() {
            *byte = match input.read_byte() {
                Ok(b) => b,
                Err(AbxError::UnexpectedEof(_)) => {
                    return Err(AbxError::UnexpectedEof("magic header"));
                }
                Err(e) => return Err(e),
            };
        }
        if magic != PROTOCOL_MAGIC_VERSION_0 {
            return Err(AbxError::BadMagic {
                expected: PROTOCOL_MAGIC_VERSION_0,
                actual: magic,
            });
        }

        Ok(Self {
            input,
            output,
            warnings: Warnings::new(options.warning_callback),
            open_tags: Vec::new(),
        })
    }

    /// Deserialize the binary XML to text XML.
    ///
    /// Runs the token loop until END_DOCUMENT; trailing bytes after it are
    /// ignored. End of input anywhere earlier is an error.
    pub fn deserialize(&mut self) -> Result<()> {
        write!(self.output, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;

        loop {
            let token = self.input.read_byte()?;
            if !self.process_token(token)? {
                break;
            }
        }

        if !self.open_tags.is_empty() {
            return Err(AbxError::UnbalancedEnd);
        }
        Ok(())
    }

    /// Process a single token; returns false on END_DOCUMENT.
    fn process_token(&mut self, token: u8) -> Result<bool> {
        let command = token & 0x0F;
        let type_info = token & 0xF0;

        match command {
            START_DOCUMENT => Ok(true),

            END_DOCUMENT => Ok(false),

            START_TAG => {
                let tag_name = self.input.read_interned_utf()?;
                self.open_tags.push(tag_name.clone());
                write!(self.output, "<{}", tag_name)?;

                // Attributes only appear immediately after a start tag
                while let Some(next_token) = self.input.peek_byte()? {
                    if (next_token & 0x0F) != ATTRIBUTE {
                        break;
                    }
                    self.input.read_byte()?;
                    self.process_attribute(next_token)?;
                }

                write!(self.output, ">")?;
                Ok(true)
            }

            END_TAG => {
                let tag_name = self.input.read_interned_utf()?;
                match self.open_tags.pop() {
                    None => return Err(AbxError::UnbalancedEnd),
                    Some(top) if top != tag_name => {
                        return Err(AbxError::TagMismatch {
                            expected: top,
                            found: tag_name,
                        });
                    }
                    Some(_) => {}
                }
                write!(self.output, "</{}>", tag_name)?;
                Ok(true)
            }

            TEXT => {
                if type_info == TYPE_STRING {
                    let text = self.input.read_utf()?;
                    if !text.is_empty() {
                        write!(self.output, "{}", encode_xml_entities(&text))?;
                    }
                }
                Ok(true)
            }

            CDSECT => {
                if type_info == TYPE_STRING {
                    let text = self.input.read_utf()?;
                    write!(self.output, "<![CDATA[{}]]>", text)?;
                }
                Ok(true)
            }

            COMMENT => {
                if type_info == TYPE_STRING {
                    let text = self.input.read_utf()?;
                    write!(self.output, "<!--{}-->", text)?;
                }
                Ok(true)
            }

            PROCESSING_INSTRUCTION => {
                if type_info == TYPE_STRING {
                    let text = self.input.read_utf()?;
                    write!(self.output, "<?{}?>", text)?;
                }
                Ok(true)
            }

            DOCDECL => {
                if type_info == TYPE_STRING {
                    let text = self.input.read_utf()?;
                    write!(self.output, "<!DOCTYPE {}>", text)?;
                }
                Ok(true)
            }

            ENTITY_REF => {
                if type_info == TYPE_STRING {
                    let text = self.input.read_utf()?;
                    write!(self.output, "&{};", text)?;
                }
                Ok(true)
            }

            IGNORABLE_WHITESPACE => {
                if type_info == TYPE_STRING {
                    let text = self.input.read_utf()?;
                    write!(self.output, "{}", text)?;
                }
                Ok(true)
            }

            _ => {
                self.warnings.report(
                    WarningCategory::UnknownCommand,
                    &format!("Skipping unknown token command: {:#04x}", command),
                );
                Ok(true)
            }
        }
    }

    /// Process an attribute token
    fn process_attribute(&mut self, token: u8) -> Result<()> {
        let type_info = token & 0xF0;
        let name = self.input.read_interned_utf()?;
        write!(self.output, " {}=\"", name)?;

        match type_info {
            TYPE_NULL => {
                // decode-only; never produced by the serializer
                write!(self.output, "null")?;
            }
            TYPE_STRING => {
                let value = self.input.read_utf()?;
                write!(self.output, "{}", encode_xml_entities(&value))?;
            }
            TYPE_STRING_INTERNED => {
                let value = self.input.read_interned_utf()?;
                write!(self.output, "{}", encode_xml_entities(&value))?;
            }
            TYPE_INT => {
                let value = self.input.read_int()?;
                write!(self.output, "{}", value)?;
            }
            TYPE_INT_HEX => {
                let value = self.input.read_int()?;
                write!(self.output, "{}", render_int_hex(value))?;
            }
            TYPE_LONG => {
                let value = self.input.read_long()?;
                write!(self.output, "{}", value)?;
            }
            TYPE_LONG_HEX => {
                let value = self.input.read_long()?;
                write!(self.output, "{}", render_long_hex(value))?;
            }
            TYPE_FLOAT => {
                let value = self.input.read_float()?;
                write!(self.output, "{}", render_float(value))?;
            }
            TYPE_DOUBLE => {
                let value = self.input.read_double()?;
                write!(self.output, "{}", render_double(value))?;
            }
            TYPE_BOOLEAN_TRUE => {
                write!(self.output, "true")?;
            }
            TYPE_BOOLEAN_FALSE => {
                write!(self.output, "false")?;
            }
            TYPE_BYTES_HEX => {
                let length = self.input.read_short()?;
                let bytes = self.input.read_bytes(length)?;
                write!(self.output, "{}", hex_encode(&bytes))?;
            }
            TYPE_BYTES_BASE64 => {
                let length = self.input.read_short()?;
                let bytes = self.input.read_bytes(length)?;
                write!(self.output, "{}", base64_encode(&bytes))?;
            }
            _ => {
                return Err(AbxError::UnknownAttributeType(type_info));
            }
        }

        write!(self.output, "\"")?;
        Ok(())
    }
}

/// `-1` keeps its decimal spelling; everything else renders as the
/// lowercase hex of the unsigned bit pattern, without a `0x` prefix.
fn render_int_hex(value: i32) -> String {
    if value == -1 {
        "-1".to_string()
    } else {
        format!("{:x}", value as u32)
    }
}

fn render_long_hex(value: i64) -> String {
    if value == -1 {
        "-1".to_string()
    } else {
        format!("{:x}", value as u64)
    }
}

/// Integral finite values keep a trailing `.0`; everything else uses the
/// shortest representation that round-trips the IEEE value.
fn render_float(value: f32) -> String {
    if value.is_finite() && value == value.trunc() {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

fn render_double(value: f64) -> String {
    if value.is_finite() && value == value.trunc() {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

//! XML event driver: walks the parsed XML stream in document order and
//! issues the matching serializer calls.

use crate::inference::{InferredValue, infer_attribute, is_whitespace_only};
use crate::serializer::BinaryXmlSerializer;
use crate::{ConvertOptions, Result, WarningCategory, Warnings};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::{BufRead, Write};

/// Convert the XML event stream to ABX records.
///
/// Namespace prefixes are preserved verbatim; `xmlns` declarations and
/// colon-prefixed names only produce a warning. Self-closing elements are
/// normalized to explicit start/end pairs.
pub(crate) fn drive<R: BufRead, W: Write>(
    mut reader: Reader<R>,
    writer: W,
    options: ConvertOptions,
) -> Result<()> {
    let collapse_whitespace = options.collapse_whitespace;
    let mut warnings = Warnings::new(options.warning_callback);
    let mut serializer = BinaryXmlSerializer::new(writer)?;
    let mut buf = Vec::new();

    serializer.start_document()?;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                start_tag(&mut serializer, &mut warnings, &e)?;
            }
            Event::End(e) => {
                let name = std::str::from_utf8(e.name().as_ref())?.to_string();
                serializer.end_tag(&name)?;
            }
            Event::Empty(e) => {
                let name = start_tag(&mut serializer, &mut warnings, &e)?;
                serializer.end_tag(&name)?;
            }
            Event::Text(e) => {
                let text = std::str::from_utf8(&e)?;
                if is_whitespace_only(text) {
                    if !collapse_whitespace {
                        serializer.ignorable_whitespace(text)?;
                    }
                } else {
                    serializer.text(text)?;
                }
            }
            Event::CData(e) => {
                serializer.cdsect(std::str::from_utf8(&e)?)?;
            }
            Event::Comment(e) => {
                serializer.comment(std::str::from_utf8(&e)?)?;
            }
            Event::PI(e) => {
                let target = std::str::from_utf8(e.target())?;
                let content = e.content();
                let data = if content.is_empty() {
                    None
                } else {
                    Some(std::str::from_utf8(content)?)
                };
                serializer.processing_instruction(target, data)?;
            }
            Event::Decl(decl) => {
                // the declaration is implied by START_DOCUMENT; only check
                // that the encoding is one we can honor
                if let Some(encoding) = decl.encoding() {
                    let encoding = encoding?;
                    let encoding = std::str::from_utf8(encoding.as_ref())?;
                    if !encoding.eq_ignore_ascii_case("utf-8") {
                        warnings.report(
                            WarningCategory::Encoding,
                            &format!("Encoding {} is not supported, treating as UTF-8", encoding),
                        );
                    }
                }
            }
            Event::DocType(e) => {
                serializer.docdecl(std::str::from_utf8(&e)?)?;
            }
            Event::GeneralRef(e) => {
                serializer.entity_ref(std::str::from_utf8(&e)?)?;
            }
            Event::Eof => break,
        }
        buf.clear();
    }

    serializer.end_document()?;
    Ok(())
}

/// Emit a start tag plus its attributes in textual order; returns the tag
/// name for the `Empty` caller to close.
fn start_tag<W: Write>(
    serializer: &mut BinaryXmlSerializer<W>,
    warnings: &mut Warnings,
    element: &BytesStart<'_>,
) -> Result<String> {
    let name = std::str::from_utf8(element.name().as_ref())?.to_string();
    if name.contains(':') {
        warnings.report(
            WarningCategory::Namespaces,
            &format!(
                "Namespaces are preserved verbatim, not expanded (element: {})",
                name
            ),
        );
    }

    serializer.start_tag(&name)?;

    for attr in element.attributes() {
        let attr = attr?;
        let attr_name = std::str::from_utf8(attr.key.as_ref())?;
        if attr_name.starts_with("xmlns") || attr_name.contains(':') {
            warnings.report(
                WarningCategory::Namespaces,
                &format!(
                    "Namespaces are preserved verbatim, not expanded (attribute: {})",
                    attr_name
                ),
            );
        }
        let value = attr.unescape_value()?;
        write_attribute(serializer, attr_name, &value)?;
    }

    Ok(name)
}

fn write_attribute<W: Write>(
    serializer: &mut BinaryXmlSerializer<W>,
    name: &str,
    value: &str,
) -> Result<()> {
    match infer_attribute(value) {
        InferredValue::Boolean(v) => serializer.attribute_boolean(name, v),
        InferredValue::IntHex(v) => serializer.attribute_int_hex(name, v),
        InferredValue::LongHex(v) => serializer.attribute_long_hex(name, v),
        InferredValue::Int(v) => serializer.attribute_int(name, v),
        InferredValue::Long(v) => serializer.attribute_long(name, v),
        InferredValue::Float(v) => serializer.attribute_float(name, v),
        InferredValue::InternedString => serializer.attribute_interned(name, value),
        InferredValue::String => serializer.attribute(name, value),
    }
}

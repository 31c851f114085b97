//! Pretty-printer for decoded XML, backing the `-p` flag.

use crate::Result;
use crate::inference::is_whitespace_only;
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

/// Reformat an XML string with 4-space indentation.
///
/// Whitespace-only text nodes are dropped so the indentation is the only
/// formatting left; everything else passes through untouched.
pub fn reformat(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Text(e) => {
                if !is_whitespace_only(std::str::from_utf8(&e)?) {
                    writer.write_event(Event::Text(e))?;
                }
            }
            event => writer.write_event(event)?,
        }
    }

    String::from_utf8(writer.into_inner()).map_err(|e| crate::AbxError::Utf8(e.utf8_error()))
}

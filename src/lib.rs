//! A library for converting between Android Binary XML (ABX) and human-readable XML.
//!
//! ABX is the length-prefixed, big-endian, token-tagged binary encoding used by
//! Android system services for configuration and state files. This crate parses
//! ABX streams into textual XML compatible with Android's reader, and encodes
//! textual XML back into ABX with automatic per-attribute type inference.
//!
//! # Examples
//!
//! ```no_run
//! use gingerbread::{AbxToXmlConverter, XmlToAbxConverter};
//! use std::fs::File;
//!
//! // ABX -> XML
//! AbxToXmlConverter::convert_file("input.abx", "output.xml").unwrap();
//!
//! // XML -> ABX
//! let output = File::create("output.abx").unwrap();
//! XmlToAbxConverter::convert_from_file("input.xml", output).unwrap();
//! ```

use std::collections::HashSet;
use thiserror::Error;

pub mod cli;
mod converter;
mod deserializer;
mod driver;
mod inference;
mod io;
mod pretty;
mod serializer;
pub mod util;

pub use converter::{AbxToXmlConverter, XmlToAbxConverter};
pub use deserializer::BinaryXmlDeserializer;
pub use inference::{InferredValue, infer_attribute};
pub use io::{FastDataInput, FastDataOutput};
pub use pretty::reformat;
pub use serializer::BinaryXmlSerializer;
pub use util::encode_xml_entities;

/// Error types for ABX parsing and conversion
#[derive(Error, Debug)]
pub enum AbxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(
        "Invalid ABX file format - magic header mismatch. Expected: {expected:02X?}, got: {actual:02X?}"
    )]
    BadMagic { expected: [u8; 4], actual: [u8; 4] },
    #[error("Unexpected end of stream while reading {0}")]
    UnexpectedEof(&'static str),
    #[error("Invalid interned string index: {0}")]
    BadInternIndex(u16),
    #[error("Unknown token command: {0:#04x}")]
    UnknownCommand(u8),
    #[error("Unknown attribute type: {0:#04x}")]
    UnknownAttributeType(u8),
    #[error("String too long: {0} bytes (max: 65535)")]
    StringTooLong(usize),
    #[error("Interned string pool is full (65535 entries)")]
    PoolOverflow,
    #[error("End tag </{found}> does not match open tag <{expected}>")]
    TagMismatch { expected: String, found: String },
    #[error("Unbalanced document: end tag or end of document without matching start tag")]
    UnbalancedEnd,
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),
    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("{0}")]
    Usage(String),
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, AbxError>;

// Protocol constants - exposed for advanced users
pub const PROTOCOL_MAGIC_VERSION_0: [u8; 4] = [0x41, 0x42, 0x58, 0x00];

// Command tokens (low nibble)
pub const START_DOCUMENT: u8 = 0;
pub const END_DOCUMENT: u8 = 1;
pub const START_TAG: u8 = 2;
pub const END_TAG: u8 = 3;
pub const TEXT: u8 = 4;
pub const CDSECT: u8 = 5;
pub const ENTITY_REF: u8 = 6;
pub const IGNORABLE_WHITESPACE: u8 = 7;
pub const PROCESSING_INSTRUCTION: u8 = 8;
pub const COMMENT: u8 = 9;
pub const DOCDECL: u8 = 10;
pub const ATTRIBUTE: u8 = 15;

// Type tokens (high nibble)
pub const TYPE_NULL: u8 = 1 << 4;
pub const TYPE_STRING: u8 = 2 << 4;
pub const TYPE_STRING_INTERNED: u8 = 3 << 4;
pub const TYPE_BYTES_HEX: u8 = 4 << 4;
pub const TYPE_BYTES_BASE64: u8 = 5 << 4;
pub const TYPE_INT: u8 = 6 << 4;
pub const TYPE_INT_HEX: u8 = 7 << 4;
pub const TYPE_LONG: u8 = 8 << 4;
pub const TYPE_LONG_HEX: u8 = 9 << 4;
pub const TYPE_FLOAT: u8 = 10 << 4;
pub const TYPE_DOUBLE: u8 = 11 << 4;
pub const TYPE_BOOLEAN_TRUE: u8 = 12 << 4;
pub const TYPE_BOOLEAN_FALSE: u8 = 13 << 4;

/// Category of a conversion warning, used to de-duplicate reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCategory {
    /// `xmlns` declarations or colon-prefixed names were observed.
    Namespaces,
    /// The XML declaration names an encoding other than UTF-8.
    Encoding,
    /// An unrecognized token command was skipped while decoding.
    UnknownCommand,
}

/// Callback invoked for non-fatal conversion warnings.
pub type WarningCallback = Box<dyn FnMut(WarningCategory, &str)>;

/// Options accepted by the converters.
#[derive(Default)]
pub struct ConvertOptions {
    /// Drop whitespace-only text nodes instead of carrying them as
    /// IGNORABLE_WHITESPACE records.
    pub collapse_whitespace: bool,
    /// Receiver for non-fatal warnings. When unset, warnings go to the
    /// `log` facade instead.
    pub warning_callback: Option<WarningCallback>,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collapse_whitespace(mut self, collapse: bool) -> Self {
        self.collapse_whitespace = collapse;
        self
    }

    pub fn warning_callback(
        mut self,
        callback: impl FnMut(WarningCategory, &str) + 'static,
    ) -> Self {
        self.warning_callback = Some(Box::new(callback));
        self
    }
}

/// Warning sink shared by the converters. Each category is reported at most
/// once per run.
pub(crate) struct Warnings {
    callback: Option<WarningCallback>,
    emitted: HashSet<WarningCategory>,
}

impl Warnings {
    pub(crate) fn new(callback: Option<WarningCallback>) -> Self {
        Self {
            callback,
            emitted: HashSet::new(),
        }
    }

    pub(crate) fn report(&mut self, category: WarningCategory, message: &str) {
        if !self.emitted.insert(category) {
            return;
        }
        match self.callback.as_mut() {
            Some(callback) => callback(category, message),
            None => log::warn!("{message}"),
        }
    }
}

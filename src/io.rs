use crate::{AbxError, Result};
use byteorder::{BigEndian, WriteBytesExt};
use std::collections::HashMap;
use std::io::{ErrorKind, Read, Write};

/// Largest value representable in a length-prefix short.
pub const MAX_UNSIGNED_SHORT: usize = 65535;

/// Sentinel interned-string reference that introduces a new raw string.
pub(crate) const INTERN_NEW: u16 = 0xFFFF;

/// Fast data input reader for binary ABX format.
///
/// All multi-byte primitives are big-endian. A one-byte lookahead buffer
/// supports the attribute peek without requiring `Seek` on the source, so
/// streaming inputs like stdin work directly.
pub struct FastDataInput<R: Read> {
    reader: R,
    lookahead: Option<u8>,
    interned_strings: Vec<String>,
}

impl<R: Read> FastDataInput<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            lookahead: None,
            interned_strings: Vec::new(),
        }
    }

    /// Fill `buf` completely, consuming the lookahead byte first if present.
    fn fill(&mut self, buf: &mut [u8], what: &'static str) -> Result<()> {
        let mut start = 0;
        if !buf.is_empty() {
            if let Some(byte) = self.lookahead.take() {
                buf[0] = byte;
                start = 1;
            }
        }
        self.reader.read_exact(&mut buf[start..]).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                AbxError::UnexpectedEof(what)
            } else {
                AbxError::Io(e)
            }
        })
    }

    /// Return the next byte without consuming it, or `None` at end of input.
    pub fn peek_byte(&mut self) -> Result<Option<u8>> {
        if self.lookahead.is_none() {
            let mut buf = [0u8; 1];
            loop {
                match self.reader.read(&mut buf) {
                    Ok(0) => return Ok(None),
                    Ok(_) => {
                        self.lookahead = Some(buf[0]);
                        break;
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(AbxError::Io(e)),
                }
            }
        }
        Ok(self.lookahead)
    }

    /// Read a single byte
    pub fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf, "byte")?;
        Ok(buf[0])
    }

    /// Read a 16-bit unsigned integer (big-endian)
    pub fn read_short(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.fill(&mut buf, "short")?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Read a 32-bit signed integer (big-endian)
    pub fn read_int(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf, "int")?;
        Ok(i32::from_be_bytes(buf))
    }

    /// Read a 64-bit signed integer (big-endian)
    pub fn read_long(&mut self) -> Result<i64> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf, "long")?;
        Ok(i64::from_be_bytes(buf))
    }

    /// Read a 32-bit float from its raw big-endian bits
    pub fn read_float(&mut self) -> Result<f32> {
        let bits = self.read_int()? as u32;
        Ok(f32::from_bits(bits))
    }

    /// Read a 64-bit double from its raw big-endian bits
    pub fn read_double(&mut self) -> Result<f64> {
        let bits = self.read_long()? as u64;
        Ok(f64::from_bits(bits))
    }

    /// Read a length-prefixed UTF-8 string
    pub fn read_utf(&mut self) -> Result<String> {
        let length = self.read_short()?;
        let mut buffer = vec![0u8; length as usize];
        self.fill(&mut buffer, "UTF string")?;
        String::from_utf8(buffer).map_err(|e| AbxError::Utf8(e.utf8_error()))
    }

    /// Read an interned string reference, resolving it against the pool.
    ///
    /// The sentinel `0xFFFF` introduces a new raw string, which is appended
    /// to the pool; any other value indexes an existing entry.
    pub fn read_interned_utf(&mut self) -> Result<String> {
        let index = self.read_short()?;
        if index == INTERN_NEW {
            let string = self.read_utf()?;
            self.interned_strings.push(string.clone());
            Ok(string)
        } else {
            self.interned_strings
                .get(index as usize)
                .cloned()
                .ok_or(AbxError::BadInternIndex(index))
        }
    }

    /// Read a byte array of the specified length
    pub fn read_bytes(&mut self, length: u16) -> Result<Vec<u8>> {
        let mut data = vec![0u8; length as usize];
        self.fill(&mut data, "bytes")?;
        Ok(data)
    }

    /// Get the interned strings table (for debugging)
    pub fn interned_strings(&self) -> &[String] {
        &self.interned_strings
    }
}

/// Fast data output writer for binary ABX format.
///
/// Holds the string interning pool: a lookup map plus the insertion-order
/// list the reader reconstructs on decode.
pub struct FastDataOutput<W: Write> {
    writer: W,
    string_pool: HashMap<String, u16>,
    interned_strings: Vec<String>,
}

impl<W: Write> FastDataOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            string_pool: HashMap::new(),
            interned_strings: Vec::new(),
        }
    }

    pub fn write_byte(&mut self, value: u8) -> Result<()> {
        self.writer.write_u8(value)?;
        Ok(())
    }

    pub fn write_short(&mut self, value: u16) -> Result<()> {
        self.writer.write_u16::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_int(&mut self, value: i32) -> Result<()> {
        self.writer.write_i32::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_long(&mut self, value: i64) -> Result<()> {
        self.writer.write_i64::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_float(&mut self, value: f32) -> Result<()> {
        self.writer.write_f32::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_double(&mut self, value: f64) -> Result<()> {
        self.writer.write_f64::<BigEndian>(value)?;
        Ok(())
    }

    /// Write a length-prefixed UTF-8 string; at most 65535 bytes.
    pub fn write_utf(&mut self, s: &str) -> Result<()> {
        let bytes = s.as_bytes();
        if bytes.len() > MAX_UNSIGNED_SHORT {
            return Err(AbxError::StringTooLong(bytes.len()));
        }
        self.write_short(bytes.len() as u16)?;
        self.writer.write_all(bytes)?;
        Ok(())
    }

    /// Write an interned string reference.
    ///
    /// The first occurrence writes the `0xFFFF` sentinel followed by the raw
    /// string and appends it to the pool; later occurrences write the pool
    /// index. The pool holds at most 65535 distinct entries.
    pub fn write_interned_utf(&mut self, s: &str) -> Result<()> {
        if let Some(&index) = self.string_pool.get(s) {
            self.write_short(index)?;
        } else {
            if self.interned_strings.len() >= INTERN_NEW as usize {
                return Err(AbxError::PoolOverflow);
            }
            self.write_short(INTERN_NEW)?;
            self.write_utf(s)?;
            let index = self.interned_strings.len() as u16;
            self.string_pool.insert(s.to_string(), index);
            self.interned_strings.push(s.to_string());
        }
        Ok(())
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Get the interned strings table in insertion order (for debugging)
    pub fn interned_strings(&self) -> &[String] {
        &self.interned_strings
    }
}

use crate::driver;
use crate::{BinaryXmlDeserializer, ConvertOptions, Result};
use quick_xml::Reader;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};

/// High-level converter for ABX to XML conversion
pub struct AbxToXmlConverter;

impl AbxToXmlConverter {
    /// Convert ABX from a reader to a writer
    ///
    /// This is the most flexible method, allowing conversion between any
    /// types that implement Read and Write respectively. Streaming sources
    /// like stdin work directly; no seeking is required.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gingerbread::AbxToXmlConverter;
    /// use std::fs::File;
    ///
    /// let input = File::open("input.abx").unwrap();
    /// let output = File::create("output.xml").unwrap();
    /// AbxToXmlConverter::convert(input, output).unwrap();
    /// ```
    pub fn convert<R: Read, W: Write>(reader: R, writer: W) -> Result<()> {
        Self::convert_with_options(reader, writer, ConvertOptions::default())
    }

    pub fn convert_with_options<R: Read, W: Write>(
        reader: R,
        writer: W,
        options: ConvertOptions,
    ) -> Result<()> {
        let mut deserializer = BinaryXmlDeserializer::with_options(reader, writer, options)?;
        deserializer.deserialize()
    }

    /// Convert ABX file to XML file
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gingerbread::AbxToXmlConverter;
    ///
    /// AbxToXmlConverter::convert_file("input.abx", "output.xml").unwrap();
    /// ```
    pub fn convert_file(input_path: &str, output_path: &str) -> Result<()> {
        if input_path == output_path {
            return Self::convert_file_in_place(input_path);
        }

        let input_file = File::open(input_path)?;
        let reader = BufReader::new(input_file);

        let output_file = File::create(output_path)?;
        let mut writer = BufWriter::new(output_file);

        Self::convert(reader, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Convert ABX from stdin to stdout
    pub fn convert_stdin_stdout() -> Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut writer = BufWriter::new(stdout.lock());
        Self::convert(stdin.lock(), &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Convert ABX from stdin to file
    pub fn convert_stdin_to_file(output_path: &str) -> Result<()> {
        let stdin = io::stdin();
        let output_file = File::create(output_path)?;
        let mut writer = BufWriter::new(output_file);
        Self::convert(stdin.lock(), &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Convert ABX file to stdout
    pub fn convert_file_to_stdout(input_path: &str) -> Result<()> {
        let input_file = File::open(input_path)?;
        let reader = BufReader::new(input_file);
        let stdout = io::stdout();
        let mut writer = BufWriter::new(stdout.lock());
        Self::convert(reader, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Convert ABX file in place (overwrites the original file)
    ///
    /// The whole file is converted in memory first; the original is only
    /// replaced after a successful conversion.
    fn convert_file_in_place(file_path: &str) -> Result<()> {
        let file_data = std::fs::read(file_path)?;

        let mut output_data = Vec::new();
        Self::convert(file_data.as_slice(), &mut output_data)?;

        std::fs::write(file_path, output_data)?;
        Ok(())
    }

    /// Convert ABX data from a byte slice to a String
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gingerbread::AbxToXmlConverter;
    ///
    /// let abx_data = std::fs::read("input.abx").unwrap();
    /// let xml_string = AbxToXmlConverter::convert_bytes(&abx_data).unwrap();
    /// println!("{}", xml_string);
    /// ```
    pub fn convert_bytes(abx_data: &[u8]) -> Result<String> {
        let mut output_data = Vec::new();
        Self::convert(abx_data, &mut output_data)?;
        String::from_utf8(output_data).map_err(|e| crate::AbxError::Utf8(e.utf8_error()))
    }
}

/// High-level converter for XML to ABX conversion
pub struct XmlToAbxConverter;

impl XmlToAbxConverter {
    /// Convert an XML string to ABX
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gingerbread::XmlToAbxConverter;
    ///
    /// let mut output = Vec::new();
    /// XmlToAbxConverter::convert_from_string("<r a=\"1\"/>", &mut output).unwrap();
    /// ```
    pub fn convert_from_string<W: Write>(xml: &str, writer: W) -> Result<()> {
        Self::convert_from_string_with_options(xml, writer, ConvertOptions::default())
    }

    pub fn convert_from_string_with_options<W: Write>(
        xml: &str,
        writer: W,
        options: ConvertOptions,
    ) -> Result<()> {
        driver::drive(Reader::from_str(xml), writer, options)
    }

    /// Convert XML from any buffered reader to ABX
    pub fn convert_from_reader<R: BufRead, W: Write>(input: R, writer: W) -> Result<()> {
        Self::convert_from_reader_with_options(input, writer, ConvertOptions::default())
    }

    pub fn convert_from_reader_with_options<R: BufRead, W: Write>(
        input: R,
        writer: W,
        options: ConvertOptions,
    ) -> Result<()> {
        driver::drive(Reader::from_reader(input), writer, options)
    }

    /// Convert an XML file to ABX
    pub fn convert_from_file<W: Write>(input_path: &str, writer: W) -> Result<()> {
        Self::convert_from_file_with_options(input_path, writer, ConvertOptions::default())
    }

    pub fn convert_from_file_with_options<W: Write>(
        input_path: &str,
        writer: W,
        options: ConvertOptions,
    ) -> Result<()> {
        driver::drive(Reader::from_file(input_path)?, writer, options)
    }

    /// Convert an XML file to ABX in place (overwrites the original file)
    pub fn convert_file_in_place(file_path: &str, options: ConvertOptions) -> Result<()> {
        let xml = std::fs::read_to_string(file_path)?;

        let mut output_data = Vec::new();
        Self::convert_from_string_with_options(&xml, &mut output_data, options)?;

        std::fs::write(file_path, output_data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PROTOCOL_MAGIC_VERSION_0, WarningCategory};

    const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

    fn round_trip(xml: &str) -> String {
        let mut abx = Vec::new();
        XmlToAbxConverter::convert_from_string(xml, &mut abx).unwrap();
        AbxToXmlConverter::convert_bytes(&abx).unwrap()
    }

    fn round_trip_collapsed(xml: &str) -> String {
        let mut abx = Vec::new();
        XmlToAbxConverter::convert_from_string_with_options(
            xml,
            &mut abx,
            ConvertOptions::new().collapse_whitespace(true),
        )
        .unwrap();
        AbxToXmlConverter::convert_bytes(&abx).unwrap()
    }

    #[test]
    fn test_encoded_stream_starts_with_magic() {
        let mut abx = Vec::new();
        XmlToAbxConverter::convert_from_string("<r/>", &mut abx).unwrap();
        assert_eq!(&abx[..4], &PROTOCOL_MAGIC_VERSION_0);
    }

    #[test]
    fn test_self_closing_normalized() {
        assert_eq!(round_trip("<r/>"), format!("{}<r></r>", XML_DECL));
    }

    #[test]
    fn test_attribute_typing_round_trip() {
        assert_eq!(
            round_trip("<r a=\"true\" b=\"42\" c=\"3.14\" d=\"0xff\"/>"),
            format!(
                "{}<r a=\"true\" b=\"42\" c=\"3.14\" d=\"ff\"></r>",
                XML_DECL
            )
        );
    }

    #[test]
    fn test_plain_string_attributes_round_trip_exactly() {
        let xml = "<r name=\"hello world\" id=\"abc\"><child note=\"x y z\">body</child></r>";
        assert_eq!(
            round_trip(xml),
            format!(
                "{}<r name=\"hello world\" id=\"abc\"><child note=\"x y z\">body</child></r>",
                XML_DECL
            )
        );
    }

    #[test]
    fn test_nested_interning_reuse() {
        let mut abx = Vec::new();
        XmlToAbxConverter::convert_from_string("<a x=\"p q\"><a x=\"r s\"/></a>", &mut abx)
            .unwrap();
        // "a" introduced once via the 0xFFFF sentinel, then referenced
        let sentinel_a = [0xFF, 0xFF, 0x00, 0x01, b'a'];
        let count = abx
            .windows(sentinel_a.len())
            .filter(|w| *w == sentinel_a)
            .count();
        assert_eq!(count, 1);
        assert_eq!(
            AbxToXmlConverter::convert_bytes(&abx).unwrap(),
            format!(
                "{}<a x=\"p q\"><a x=\"r s\"></a></a>",
                XML_DECL
            )
        );
    }

    #[test]
    fn test_whitespace_preserved_by_default() {
        assert_eq!(
            round_trip("<r>\n  <a></a>\n</r>"),
            format!("{}<r>\n  <a></a>\n</r>", XML_DECL)
        );
    }

    #[test]
    fn test_whitespace_collapsed_on_request() {
        assert_eq!(
            round_trip_collapsed("<r>\n  <a></a>\n</r>"),
            format!("{}<r><a></a></r>", XML_DECL)
        );
    }

    #[test]
    fn test_text_entities_round_trip() {
        assert_eq!(
            round_trip("<r>5 &lt; 6 &amp; more</r>"),
            format!("{}<r>5 &lt; 6 &amp; more</r>", XML_DECL)
        );
    }

    #[test]
    fn test_escaped_attribute_value_round_trip() {
        assert_eq!(
            round_trip("<r a=\"x &amp; y\"/>"),
            format!("{}<r a=\"x &amp; y\"></r>", XML_DECL)
        );
    }

    #[test]
    fn test_cdata_and_comment_round_trip() {
        assert_eq!(
            round_trip("<r><![CDATA[1 < 2]]><!-- note --></r>"),
            format!("{}<r><![CDATA[1 < 2]]><!-- note --></r>", XML_DECL)
        );
    }

    #[test]
    fn test_namespace_warning_emitted_once() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let options = ConvertOptions::new()
            .warning_callback(move |category, _| sink.borrow_mut().push(category));

        let mut abx = Vec::new();
        XmlToAbxConverter::convert_from_string_with_options(
            "<ns:r xmlns:ns=\"urn:x\" ns:a=\"1\"><ns:c/></ns:r>",
            &mut abx,
            options,
        )
        .unwrap();
        assert_eq!(*seen.borrow(), vec![WarningCategory::Namespaces]);
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let mut abx = Vec::new();
        assert!(XmlToAbxConverter::convert_from_string("<r><unclosed>", &mut abx).is_err());
    }
}

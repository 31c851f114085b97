use crate::{AbxError, AbxToXmlConverter, ConvertOptions, Result, XmlToAbxConverter, reformat};
use clap::{Arg, Command};
use std::io::{self, Read, Write};

pub struct Cli;

impl Cli {
    pub fn abx2xml_command() -> Command {
        Command::new("abx2xml")
            .about("Converts Android Binary XML (ABX) to human-readable XML")
            .long_about("Converts Android Binary XML (ABX) to human-readable XML.\n\nWhen invoked with the '-i' argument, the output of a successful conversion will overwrite the original input file. Input can be '-' to use stdin, and output can be '-' to use stdout.")
            .arg(
                Arg::new("in-place")
                    .short('i')
                    .long("in-place")
                    .help("Overwrite input file with converted output")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("pretty")
                    .short('p')
                    .long("pretty")
                    .help("Pretty-print the emitted XML")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("input")
                    .help("Input file path (use '-' for stdin)")
                    .required(true)
                    .index(1),
            )
            .arg(
                Arg::new("output")
                    .help("Output file path (use '-' for stdout)")
                    .index(2),
            )
    }

    pub fn xml2abx_command() -> Command {
        Command::new("xml2abx")
            .about("Converts human-readable XML to Android Binary XML (ABX)")
            .long_about("Converts human-readable XML to Android Binary XML (ABX).\n\nWhen invoked with the '-i' argument, the output of a successful conversion will overwrite the original input file. Input can be '-' to use stdin, and output can be '-' to use stdout.")
            .arg(
                Arg::new("in-place")
                    .short('i')
                    .long("in-place")
                    .help("Overwrite input file with converted output")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("collapse-whitespace")
                    .long("collapse-whitespace")
                    .help("Drop whitespace-only text instead of preserving it")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("input")
                    .help("Input file path (use '-' for stdin)")
                    .required(true)
                    .index(1),
            )
            .arg(
                Arg::new("output")
                    .help("Output file path (use '-' for stdout)")
                    .index(2),
            )
    }

    pub fn run_abx2xml() -> Result<()> {
        let matches = Self::abx2xml_command().get_matches();
        Self::run_abx2xml_with_matches(matches)
    }

    pub fn run_abx2xml_with_matches(matches: clap::ArgMatches) -> Result<()> {
        let input_path = matches.get_one::<String>("input").unwrap();
        let pretty = matches.get_flag("pretty");
        let output_path = Self::resolve_output(&matches, input_path)?;

        if pretty {
            return Self::run_abx2xml_pretty(input_path, &output_path);
        }

        match (input_path.as_str(), output_path.as_str()) {
            ("-", "-") => AbxToXmlConverter::convert_stdin_stdout(),
            ("-", output) => AbxToXmlConverter::convert_stdin_to_file(output),
            (input, "-") => AbxToXmlConverter::convert_file_to_stdout(input),
            (input, output) => AbxToXmlConverter::convert_file(input, output),
        }
    }

    fn run_abx2xml_pretty(input_path: &str, output_path: &str) -> Result<()> {
        let abx_data = Self::read_input(input_path)?;
        let xml = AbxToXmlConverter::convert_bytes(&abx_data)?;
        let pretty = reformat(&xml)?;
        Self::write_output(output_path, pretty.as_bytes())
    }

    pub fn run_xml2abx() -> Result<()> {
        let matches = Self::xml2abx_command().get_matches();
        Self::run_xml2abx_with_matches(matches)
    }

    pub fn run_xml2abx_with_matches(matches: clap::ArgMatches) -> Result<()> {
        let input_path = matches.get_one::<String>("input").unwrap();
        let output_path = Self::resolve_output(&matches, input_path)?;
        let options =
            ConvertOptions::new().collapse_whitespace(matches.get_flag("collapse-whitespace"));

        match (input_path.as_str(), output_path.as_str()) {
            ("-", "-") => {
                let stdin = io::stdin();
                let stdout = io::stdout();
                XmlToAbxConverter::convert_from_reader_with_options(
                    stdin.lock(),
                    stdout.lock(),
                    options,
                )
            }
            ("-", output) => {
                let stdin = io::stdin();
                let output_file = std::fs::File::create(output)?;
                XmlToAbxConverter::convert_from_reader_with_options(
                    stdin.lock(),
                    output_file,
                    options,
                )
            }
            (input, "-") => {
                let stdout = io::stdout();
                XmlToAbxConverter::convert_from_file_with_options(input, stdout.lock(), options)
            }
            (input, output) if input == output => {
                XmlToAbxConverter::convert_file_in_place(input, options)
            }
            (input, output) => {
                let output_file = std::fs::File::create(output)?;
                XmlToAbxConverter::convert_from_file_with_options(input, output_file, options)
            }
        }
    }

    /// Resolve the output path; `-i` routes the output back to the input.
    fn resolve_output(matches: &clap::ArgMatches, input_path: &str) -> Result<String> {
        let in_place = matches.get_flag("in-place");
        if in_place && input_path == "-" {
            return Err(AbxError::Usage(
                "Cannot use -i option with stdin input".to_string(),
            ));
        }

        Ok(match matches.get_one::<String>("output") {
            Some(path) => path.clone(),
            None => {
                if in_place {
                    input_path.to_string()
                } else {
                    "-".to_string()
                }
            }
        })
    }

    fn read_input(input_path: &str) -> Result<Vec<u8>> {
        if input_path == "-" {
            let mut data = Vec::new();
            io::stdin().lock().read_to_end(&mut data)?;
            Ok(data)
        } else {
            Ok(std::fs::read(input_path)?)
        }
    }

    fn write_output(output_path: &str, data: &[u8]) -> Result<()> {
        if output_path == "-" {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(data)?;
            handle.flush()?;
        } else {
            std::fs::write(output_path, data)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_commands() {
        assert_eq!(Cli::abx2xml_command().get_name(), "abx2xml");
        assert_eq!(Cli::xml2abx_command().get_name(), "xml2abx");
    }

    #[test]
    fn test_in_place_with_stdin_error() {
        let matches = Cli::abx2xml_command()
            .try_get_matches_from(vec!["abx2xml", "-i", "-"])
            .unwrap();

        let result = Cli::run_abx2xml_with_matches(matches);
        assert!(result.is_err());

        if let Err(AbxError::Usage(msg)) = result {
            assert!(msg.contains("Cannot use -i option with stdin input"));
        } else {
            panic!("Expected Usage error");
        }
    }

    #[test]
    fn test_in_place_defaults_output_to_input() {
        let matches = Cli::xml2abx_command()
            .try_get_matches_from(vec!["xml2abx", "-i", "in.xml"])
            .unwrap();
        let input = matches.get_one::<String>("input").unwrap();
        assert_eq!(Cli::resolve_output(&matches, input).unwrap(), "in.xml");
    }

    #[test]
    fn test_output_defaults_to_stdout() {
        let matches = Cli::abx2xml_command()
            .try_get_matches_from(vec!["abx2xml", "in.abx"])
            .unwrap();
        let input = matches.get_one::<String>("input").unwrap();
        assert_eq!(Cli::resolve_output(&matches, input).unwrap(), "-");
    }
}

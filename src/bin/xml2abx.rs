use gingerbread::cli::Cli;

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    if let Err(err) = Cli::run_xml2abx() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

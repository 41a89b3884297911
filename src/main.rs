use clap::Parser as ClapParser;

use cli::command::Cli;

mod cli;

fn main() {
    let cli = Cli::parse();

    let level = if cli.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp_secs()
        .init();

    if let Err(err) = cli::run(&cli) {
        eprintln!("ERROR: {err:#}");
        std::process::exit(1);
    }
}

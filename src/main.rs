use clap::error::ErrorKind;
use clap::Parser;
use copier::config::{usage, Cli};
use copier::{commands, Config, CopierError};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            ErrorKind::MissingRequiredArgument => {
                println!("{}", usage());
                return ExitCode::FAILURE;
            }
            kind => {
                println!("{}", usage());
                println!("Exiting!");
                eprintln!("error: {}", kind.as_str().unwrap_or("invalid arguments"));
                return ExitCode::FAILURE;
            }
        },
    };

    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            match err.downcast_ref::<CopierError>() {
                Some(copier_err) => {
                    if copier_err.is_usage_error() {
                        println!("{}", usage());
                    }
                    if let Some(hint) = commands::hint(copier_err) {
                        println!("{}", hint);
                    }
                    ExitCode::from(copier_err.exit_code() as u8)
                }
                None => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    // Convert CLI args to Config - this validates immediately
    let config = Config::try_from(cli)?;
    tracing::info!("copier v{}", copier::VERSION);

    commands::run(&config, cli.mode)?;
    Ok(())
}

fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

use std::process::ExitCode;

use anyhow::{Context, Result};
use console::style;

use dl::cli::{self, Command};
use dl::{app, logging, Error};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report(&err);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        report(&Error::InvalidArgCount.into());
        println!("{}", cli::HELP);
        return ExitCode::from(Error::InvalidArgCount.exit_code());
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            let code = err.downcast_ref::<Error>().map_or(1, Error::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn run(args: Vec<String>) -> Result<()> {
    let command = cli::parse(args)?;
    let target = match &command {
        Command::Fetch(request) => Some(request.target.clone()),
        _ => None,
    };

    match app::run(command).await {
        Err(err @ Error::Network(_)) => {
            let target = target.unwrap_or_default();
            Err(err).with_context(|| format!("could not fetch {target}"))
        }
        other => Ok(other?),
    }
}

fn report(err: &anyhow::Error) {
    eprintln!("{}{:#}", style("error: ").red().for_stderr(), err);
}

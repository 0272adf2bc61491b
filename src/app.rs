use reqwest::Client;

use crate::cli::{self, Command, FetchRequest};
use crate::error::Result;
use crate::output::Destination;
use crate::resolve;
use crate::transfer::{self, TransferReport};

pub async fn run(command: Command) -> Result<()> {
    match command {
        Command::Help => println!("{}", cli::HELP),
        Command::Version => println!("{}", cli::version()),
        Command::Fetch(request) => {
            fetch(&request).await?;
        }
    }
    Ok(())
}

/// Open the destination, then resolve and stream `request.target` into it.
///
/// Nothing goes over the network unless the destination could be opened.
pub async fn fetch(request: &FetchRequest) -> Result<TransferReport> {
    let client = Client::builder()
        .user_agent(concat!("dl/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let mut destination = Destination::open(request).await?;

    let outcome = async {
        let resolved = resolve::resolve(&client, &request.target).await?;
        tracing::debug!(input = %request.target, url = %resolved.url, "fetching");
        transfer::transfer(resolved.value, destination.writer()).await
    }
    .await;

    match outcome {
        Ok(report) => {
            destination.commit().await?;
            Ok(report)
        }
        Err(err) => {
            destination.rollback().await;
            Err(err)
        }
    }
}

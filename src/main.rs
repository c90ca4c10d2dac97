use std::{process::ExitCode, sync::Arc};

use anyhow::Result;
use clap::Parser as _;
use tracing::warn;

use args::{Args, Command};
use dispatch::{Dispatcher, SearchOutcome};
use navigation::Navigator;
use provider::Gateway;
use render::Output;
use resolve::{DetailUnavailable, DetailView, Resolver};
use status::Status;

mod args;
mod dispatch;
mod explore;
mod model;
mod navigation;
mod normalize;
mod provider;
mod render;
mod resolve;
mod slot;
mod status;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    args.init_tracing_subscriber()?;
    let gateway = args.gateway()?;
    run(args.command, gateway, Output::new(args.format)).await
}

/// Run one subcommand. Provider failures have already been reported as a status
/// line when this returns [`ExitCode::FAILURE`].
async fn run(command: Command, gateway: Arc<Gateway>, output: Output) -> Result<ExitCode> {
    match command {
        Command::Search { query, scope } => {
            output.print_status(Status::Searching)?;
            let outcome = Dispatcher::new(gateway).search(&query, scope).await;
            if let Some(status) = Status::of_search(&outcome) {
                output.print_status(status)?;
            }
            match outcome {
                Ok(SearchOutcome::Found(result)) => output.print_results(&result)?,
                Ok(SearchOutcome::NoResults) => {}
                Err(_) => return Ok(ExitCode::FAILURE),
            }
        }
        Command::Charts => {
            output.print_status(Status::LoadingCharts)?;
            match Dispatcher::new(gateway).charts().await {
                Ok(charts) => output.print_charts(&charts)?,
                Err(e) => {
                    warn!(%e, "Top charts unavailable");
                    output.print_status(Status::ChartsFailed)?;
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Artist { name } => {
            output.print_status(Status::Loading(DetailView::Artist))?;
            let mut navigator = Navigator::new();
            let shown = navigator.on_open_artist(&Resolver::new(gateway), &name).await;
            return show(output, &navigator, shown.map(|_| ()));
        }
        Command::Track { artist, title } => {
            output.print_status(Status::Loading(DetailView::Track))?;
            let mut navigator = Navigator::new();
            let shown = navigator
                .on_open_track(&Resolver::new(gateway), &artist, &title)
                .await;
            return show(output, &navigator, shown.map(|_| ()));
        }
        Command::Album { artist, title } => {
            output.print_status(Status::Loading(DetailView::Album))?;
            let mut navigator = Navigator::new();
            let shown = navigator
                .on_open_album(&Resolver::new(gateway), &artist, &title)
                .await;
            return show(output, &navigator, shown.map(|_| ()));
        }
        Command::TopTracks { artist } => {
            output.print_status(Status::Loading(DetailView::TopTracks))?;
            let mut navigator = Navigator::new();
            let shown = navigator
                .on_open_artist_top(&Resolver::new(gateway), &artist)
                .await;
            return show(output, &navigator, shown.map(|_| ()));
        }
        Command::Explore { query, scope } => explore::explore(gateway, output, query, scope).await?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Print the navigator's open document, or the status for a failed resolution.
fn show(output: Output, navigator: &Navigator, shown: Result<(), DetailUnavailable>) -> Result<ExitCode> {
    if let Err(e) = shown {
        warn!(%e, "Detail view unavailable");
        output.print_status(Status::from(&e))?;
        return Ok(ExitCode::FAILURE);
    }
    if let Some(document) = navigator.document() {
        output.print_document(document)?;
    }
    Ok(ExitCode::SUCCESS)
}

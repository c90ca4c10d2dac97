//! Interactive browsing: one result listing plus the detail view on top of it.

use std::{
    io::{self, Write},
    str::FromStr,
    sync::Arc,
};

use anyhow::Result;
use clap::ValueEnum as _;
use futures::{
    future::{BoxFuture, FutureExt as _},
    stream::{FuturesUnordered, StreamExt as _},
};
use thiserror::Error;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt as _, BufReader},
    select,
};
use tracing::{debug, info, warn};

use crate::{
    dispatch::{Dispatcher, SearchError, SearchOutcome},
    model::{AggregateResult, Charts, DetailDocument, EntityReference, SearchScope},
    navigation::{Navigator, ViewState},
    provider::Gateway,
    render::Output,
    resolve::{DetailUnavailable, DetailView, Resolver},
    slot::{Slot, Ticket},
    status::Status,
};

const HELP: &str = "\
Commands:
  search <query>   search every category in the current scope
  scope <name>     all, artist, track, album or genre
  charts           show the global top charts
  open <n>         open entry n of the detail view, or of the listing when no view is open
  top <artist|n>   show an artist's top tracks, by name or by listing entry
  close            close the detail view
  help             show this message
  quit             leave
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Search(String),
    Scope(SearchScope),
    Charts,
    Open(usize),
    Top(String),
    Close,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error("expected an entry number, got '{0}'")]
    NotANumber(String),
    #[error("unknown scope '{0}'")]
    Scope(String),
}

impl FromStr for Input {
    type Err = InputError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(c, r)| (c, r.trim()));
        let required = |name| {
            if rest.is_empty() {
                Err(InputError::MissingArgument(name))
            } else {
                Ok(rest)
            }
        };
        match command.to_ascii_lowercase().as_str() {
            // A blank query is reported by the search itself.
            "search" | "s" => Ok(Self::Search(rest.to_owned())),
            "scope" => {
                let name = required("scope")?;
                SearchScope::from_str(name, true)
                    .map(Self::Scope)
                    .map_err(|_| InputError::Scope(name.to_owned()))
            }
            "charts" => Ok(Self::Charts),
            "open" | "o" => {
                let n = required("open")?;
                n.parse()
                    .map(Self::Open)
                    .map_err(|_| InputError::NotANumber(n.to_owned()))
            }
            "top" => Ok(Self::Top(required("top")?.to_owned())),
            "close" | "back" => Ok(Self::Close),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(InputError::Unknown(other.to_owned())),
        }
    }
}

/// A provider-backed command that finished, with the ticket it was started under.
enum Completion {
    Search(Ticket, Result<SearchOutcome, SearchError>),
    Charts(Ticket, Result<Charts, SearchError>),
    Detail(Ticket, Result<DetailDocument, DetailUnavailable>),
}

type Job = BoxFuture<'static, Completion>;

/// What starting a command left to do.
enum Step {
    Done,
    Wait(Job),
    Quit,
}

/// What the numbered entries of the listing currently refer to.
#[derive(Debug)]
enum Listing {
    Results(AggregateResult),
    Charts(Charts),
}

impl Listing {
    fn reference(&self, index: usize) -> Option<&EntityReference> {
        match self {
            Self::Results(result) => result.references().nth(index),
            Self::Charts(charts) => charts
                .artists
                .records
                .iter()
                .chain(&charts.tracks.records)
                .map(|r| &r.reference)
                .nth(index),
        }
    }
}

pub struct Session<W, E> {
    dispatcher: Arc<Dispatcher>,
    resolver: Arc<Resolver>,
    navigator: Navigator,
    listing: Slot<Listing>,
    scope: SearchScope,
    output: Output,
    out: W,
    err: E,
}

impl<W: Write, E: Write> Session<W, E> {
    pub fn new(gateway: Arc<Gateway>, output: Output, scope: SearchScope, out: W, err: E) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(Arc::clone(&gateway))),
            resolver: Arc::new(Resolver::new(gateway)),
            navigator: Navigator::new(),
            listing: Slot::new(),
            scope,
            output,
            out,
            err,
        }
    }

    /// Read commands from `input` while earlier lookups are still in flight.
    /// Stops at `quit`, or once `input` ends and every pending lookup has settled.
    ///
    /// # Errors
    ///
    /// Only when reading `input` or writing to the terminal fails; provider
    /// failures become status lines.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, first: Option<Input>, input: R) -> io::Result<()> {
        let mut pending = FuturesUnordered::new();
        if let Some(first) = first {
            match self.start(first)? {
                Step::Done => {}
                Step::Wait(job) => pending.push(job),
                Step::Quit => return Ok(()),
            }
        }

        let mut lines = input.lines();
        let mut reading = true;
        self.prompt()?;
        loop {
            select! {
                line = lines.next_line(), if reading => {
                    if let Some(line) = line? {
                        match self.start_line(&line)? {
                            Step::Done => {}
                            Step::Wait(job) => pending.push(job),
                            Step::Quit => break,
                        }
                        self.prompt()?;
                    } else {
                        reading = false;
                    }
                }
                Some(completion) = pending.next(), if !pending.is_empty() => {
                    self.complete(completion)?;
                }
                else => break,
            }
        }
        Ok(())
    }

    fn start_line(&mut self, line: &str) -> io::Result<Step> {
        if line.trim().is_empty() {
            return Ok(Step::Done);
        }
        match line.parse::<Input>() {
            Ok(input) => self.start(input),
            Err(e) => {
                self.note(&format!("{e}. Type 'help' for commands."))?;
                Ok(Step::Done)
            }
        }
    }

    fn start(&mut self, input: Input) -> io::Result<Step> {
        match input {
            Input::Search(query) => self.start_search(query),
            Input::Scope(scope) => {
                info!(?scope, "Search scope changed");
                self.scope = scope;
                Ok(Step::Done)
            }
            Input::Charts => self.start_charts(),
            Input::Open(n) => self.start_open(n),
            Input::Top(target) => self.start_top(&target),
            Input::Close => {
                self.navigator.close();
                self.show_listing()?;
                Ok(Step::Done)
            }
            Input::Help => {
                self.err.write_all(HELP.as_bytes())?;
                Ok(Step::Done)
            }
            Input::Quit => Ok(Step::Quit),
        }
    }

    fn status(&mut self, status: Status) -> io::Result<()> {
        writeln!(self.err, "{status}")
    }

    fn note(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.err, "{message}")
    }

    fn prompt(&mut self) -> io::Result<()> {
        self.err.write_all(b"> ")?;
        self.err.flush()
    }

    fn show_listing(&mut self) -> io::Result<()> {
        match self.listing.get() {
            Some(Listing::Results(result)) => self.output.format_results(result, &mut self.out),
            Some(Listing::Charts(charts)) => self.output.format_charts(charts, &mut self.out),
            None => Ok(()),
        }
    }

    fn show_document(&mut self) -> io::Result<()> {
        match self.navigator.document() {
            Some(document) => self.output.format_document(document, &mut self.out),
            None => Ok(()),
        }
    }

    fn start_search(&mut self, query: String) -> io::Result<Step> {
        if query.trim().is_empty() {
            self.status(Status::EmptyQuery)?;
            return Ok(Step::Done);
        }
        self.status(Status::Searching)?;
        // Entry numbers are about to refer to the new listing.
        self.navigator.close();
        let ticket = self.listing.begin();
        let dispatcher = Arc::clone(&self.dispatcher);
        let scope = self.scope;
        Ok(Step::Wait(
            async move {
                let outcome = dispatcher.search(&query, scope).await;
                Completion::Search(ticket, outcome)
            }
            .boxed(),
        ))
    }

    fn start_charts(&mut self) -> io::Result<Step> {
        self.status(Status::LoadingCharts)?;
        self.navigator.close();
        let ticket = self.listing.begin();
        let dispatcher = Arc::clone(&self.dispatcher);
        Ok(Step::Wait(
            async move { Completion::Charts(ticket, dispatcher.charts().await) }.boxed(),
        ))
    }

    fn start_open(&mut self, n: usize) -> io::Result<Step> {
        let Some(index) = n.checked_sub(1) else {
            self.note("Entries are numbered from 1.")?;
            return Ok(Step::Done);
        };

        let reference = if matches!(self.navigator.state(), ViewState::Open(_)) {
            let Some(handle) = self.navigator.handle(index) else {
                self.note(&format!("No entry {n} in this view."))?;
                return Ok(Step::Done);
            };
            match self.navigator.trigger(handle) {
                Ok(reference) => reference,
                Err(e) => {
                    self.note(&format!("Cannot open entry {n}: {e}."))?;
                    return Ok(Step::Done);
                }
            }
        } else {
            let Some(reference) = self.listing.get().and_then(|l| l.reference(index)).cloned() else {
                self.note(&format!("No entry {n} in the listing."))?;
                return Ok(Step::Done);
            };
            reference
        };

        self.status(Status::Loading(reference.kind().into()))?;
        let ticket = self.navigator.begin();
        let resolver = Arc::clone(&self.resolver);
        Ok(Step::Wait(
            async move {
                let document = resolver.resolve(&reference).await;
                Completion::Detail(ticket, document)
            }
            .boxed(),
        ))
    }

    /// `top 3` takes the artist at entry 3 of the listing; anything that is not
    /// an entry number is an artist name.
    fn start_top(&mut self, target: &str) -> io::Result<Step> {
        let entry = target.parse::<usize>().ok().and_then(|n| {
            let reference = self.listing.get()?.reference(n.checked_sub(1)?)?;
            Some(match reference {
                EntityReference::Artist { name } => Ok(name.clone()),
                EntityReference::Track { .. } | EntityReference::Album { .. } => Err(n),
            })
        });
        let artist = match entry {
            Some(Ok(name)) => name,
            Some(Err(n)) => {
                self.note(&format!("Entry {n} is not an artist."))?;
                return Ok(Step::Done);
            }
            None => target.to_owned(),
        };

        self.status(Status::Loading(DetailView::TopTracks))?;
        let ticket = self.navigator.begin();
        let resolver = Arc::clone(&self.resolver);
        Ok(Step::Wait(
            async move {
                let document = resolver.resolve_top_tracks(&artist).await;
                Completion::Detail(ticket, document)
            }
            .boxed(),
        ))
    }

    /// Apply a finished command, unless something newer has been started since.
    fn complete(&mut self, completion: Completion) -> io::Result<()> {
        match completion {
            Completion::Search(ticket, outcome) => {
                if !self.listing.is_current(&ticket) {
                    debug!("Search superseded, results dropped");
                    return Ok(());
                }
                if let Some(status) = Status::of_search(&outcome) {
                    self.status(status)?;
                }
                if let Ok(SearchOutcome::Found(result)) = outcome {
                    self.listing.publish(ticket, Listing::Results(result));
                    self.show_listing()?;
                } else {
                    self.listing.clear();
                }
            }
            Completion::Charts(ticket, charts) => {
                if !self.listing.is_current(&ticket) {
                    debug!("Chart load superseded, charts dropped");
                    return Ok(());
                }
                match charts {
                    Ok(charts) => {
                        self.listing.publish(ticket, Listing::Charts(charts));
                        self.show_listing()?;
                    }
                    Err(e) => {
                        warn!(%e, "Top charts unavailable");
                        self.status(Status::ChartsFailed)?;
                    }
                }
            }
            Completion::Detail(ticket, document) => match document {
                Ok(document) => {
                    if self.navigator.finish(ticket, document).is_some() {
                        self.show_document()?;
                    }
                }
                Err(e) => {
                    if self.navigator.abandon(ticket) {
                        self.status(Status::from(&e))?;
                    }
                }
            },
        }
        Ok(())
    }
}

/// Run the interactive session on stdin until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if reading stdin or writing to the terminal fails.
pub async fn explore(
    gateway: Arc<Gateway>,
    output: Output,
    query: Option<String>,
    scope: SearchScope,
) -> Result<()> {
    let mut session = Session::new(gateway, output, scope, io::stdout(), io::stderr());
    let first = query.map_or(Input::Charts, Input::Search);
    session
        .run(Some(first), BufReader::new(tokio::io::stdin()))
        .await?;
    info!("Leaving explore session");
    Ok(())
}

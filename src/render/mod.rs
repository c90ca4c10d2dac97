//! Presentation adapters for search results and detail views.

pub mod html;
pub mod text;

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

use crate::{
    model::{AggregateResult, Charts, DetailDocument},
    status::Status,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Numbered plain text for the terminal
    #[default]
    Text,
    /// Escaped HTML fragments with `data-action` attributes
    Html,
    /// The view models themselves
    Json,
}

/// Writes view models to stdout and status lines to stderr.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    format: Format,
}

impl Output {
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Format an aggregate result and write it to the given writer.
    ///
    /// # Errors
    ///
    /// This function will return an error if writing to the given writer fails.
    pub fn format_results<T: Write>(&self, result: &AggregateResult, f: &mut T) -> io::Result<()> {
        match self.format {
            Format::Text => f.write_all(text::results(result).as_bytes()),
            Format::Html => f.write_all(html::results(result).as_bytes()),
            Format::Json => json(result, f),
        }
    }

    /// Format a detail document and write it to the given writer.
    ///
    /// # Errors
    ///
    /// This function will return an error if writing to the given writer fails.
    pub fn format_document<T: Write>(&self, document: &DetailDocument, f: &mut T) -> io::Result<()> {
        match self.format {
            Format::Text => f.write_all(text::document(document).as_bytes()),
            Format::Html => f.write_all(html::document(document).as_bytes()),
            Format::Json => json(document, f),
        }
    }

    /// Format top charts and write them to the given writer.
    ///
    /// # Errors
    ///
    /// This function will return an error if writing to the given writer fails.
    pub fn format_charts<T: Write>(&self, charts: &Charts, f: &mut T) -> io::Result<()> {
        match self.format {
            Format::Text => f.write_all(text::charts(charts).as_bytes()),
            Format::Html => f.write_all(html::charts(charts).as_bytes()),
            Format::Json => json(charts, f),
        }
    }

    pub fn print_results(&self, result: &AggregateResult) -> io::Result<()> {
        self.format_results(result, &mut io::stdout().lock())
    }

    pub fn print_document(&self, document: &DetailDocument) -> io::Result<()> {
        self.format_document(document, &mut io::stdout().lock())
    }

    pub fn print_charts(&self, charts: &Charts) -> io::Result<()> {
        self.format_charts(charts, &mut io::stdout().lock())
    }

    /// Status lines go to stderr so stdout stays machine readable.
    pub fn print_status(&self, status: Status) -> io::Result<()> {
        writeln!(io::stderr().lock(), "{status}")
    }
}

fn json<S: Serialize, T: Write>(value: &S, mut f: &mut T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut f, value)?;
    f.write_all(b"\n")
}

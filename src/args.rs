use std::{fs::File, io, sync::Arc, sync::Mutex, time::Duration};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::{
    model::SearchScope,
    provider::{Gateway, HttpTransport, ProviderConfig, DEFAULT_BASE_URL},
    render::Format,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// API key for the metadata provider
    #[clap(long, env = "LASTFM_API_KEY", hide_env_values = true)]
    api_key: String,
    /// Base URL of the provider's REST endpoint
    #[clap(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Give up on a provider request after X seconds
    #[clap(long, short, default_value_t = 15.0)]
    timeout: f64,
    /// Output format for results and detail views
    #[clap(long, short, value_enum, default_value_t = Format::Text)]
    pub format: Format,
    /// File to write the log to. If not specified, logs will be written to stderr.
    #[clap(long, short)]
    log_file: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search artists, tracks, albums and genres at once
    Search {
        query: String,
        /// Restrict the search to one category
        #[clap(long, short, value_enum, default_value_t = SearchScope::All)]
        scope: SearchScope,
    },
    /// Show artist details
    Artist { name: String },
    /// Show track details
    Track { artist: String, title: String },
    /// Show album details
    Album { artist: String, title: String },
    /// Show an artist's most popular tracks
    TopTracks { artist: String },
    /// Show the global top charts
    Charts,
    /// Browse interactively, starting from the top charts or an initial search
    Explore {
        query: Option<String>,
        #[clap(long, short, value_enum, default_value_t = SearchScope::All)]
        scope: SearchScope,
    },
}

impl Args {
    /// Build the tracing subscriber using parameters from the command line arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be created.
    pub fn init_tracing_subscriber(&self) -> io::Result<()> {
        let builder = tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(EnvFilter::from_default_env());

        match self.log_file.as_ref() {
            None => builder.with_writer(io::stderr).init(),
            Some(f) => builder.with_writer(Mutex::new(File::create(f)?)).init(),
        }
        Ok(())
    }

    /// Provider gateway over HTTP, configured from the command line.
    pub fn gateway(&self) -> Result<Arc<Gateway>> {
        let timeout = Duration::try_from_secs_f64(self.timeout)
            .with_context(|| format!("Invalid timeout {}", self.timeout))?;
        let transport = HttpTransport::new(timeout).context("Failed to build HTTP client")?;
        let config = ProviderConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
        };
        Ok(Arc::new(Gateway::new(config, Arc::new(transport))))
    }
}

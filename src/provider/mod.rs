pub mod api;
#[cfg(test)]
pub mod mock;
pub mod types;

use std::{collections::BTreeMap, fmt};

// Re-export main functionality
pub use api::{Gateway, GatewayError, HttpTransport};

/// Decoded provider response. Its internal shape is only interpreted by the normalizer.
pub type RawPayload = serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://ws.audioscrobbler.com/2.0/";

/// Connection settings for the metadata provider
#[derive(Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Provider operations this crate knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    ArtistSearch,
    TrackSearch,
    AlbumSearch,
    ArtistInfo,
    TrackInfo,
    AlbumInfo,
    ArtistTopTracks,
    ArtistTopAlbums,
    ArtistSimilar,
    TagTopTracks,
    TagTopArtists,
    ChartTopArtists,
    ChartTopTracks,
}

impl Method {
    /// Wire name of the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ArtistSearch => "artist.search",
            Self::TrackSearch => "track.search",
            Self::AlbumSearch => "album.search",
            Self::ArtistInfo => "artist.getinfo",
            Self::TrackInfo => "track.getInfo",
            Self::AlbumInfo => "album.getInfo",
            Self::ArtistTopTracks => "artist.getTopTracks",
            Self::ArtistTopAlbums => "artist.getTopAlbums",
            Self::ArtistSimilar => "artist.getSimilar",
            Self::TagTopTracks => "tag.gettoptracks",
            Self::TagTopArtists => "tag.gettopartists",
            Self::ChartTopArtists => "chart.gettopartists",
            Self::ChartTopTracks => "chart.gettoptracks",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound request descriptor: one operation plus its plain-string parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub params: BTreeMap<&'static str, String>,
}

impl Request {
    pub const fn new(method: Method) -> Self {
        Self {
            method,
            params: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.params.insert(key, value.into());
        self
    }

    /// Ask the provider to tolerate near-miss spellings.
    #[must_use]
    pub fn autocorrect(self) -> Self {
        self.param("autocorrect", "1")
    }

    #[must_use]
    pub fn limit(self, limit: usize) -> Self {
        self.param("limit", limit.to_string())
    }

    /// Full query string, always carrying the credential and the JSON format selector.
    pub fn query_pairs<'a>(&'a self, api_key: &'a str) -> Vec<(&'a str, &'a str)> {
        let mut pairs = Vec::with_capacity(self.params.len() + 3);
        pairs.push(("method", self.method.as_str()));
        pairs.extend(self.params.iter().map(|(k, v)| (*k, v.as_str())));
        pairs.push(("api_key", api_key));
        pairs.push(("format", "json"));
        pairs
    }

    /// URL suitable for logs: the credential is masked.
    pub fn display_url(&self, base_url: &str) -> String {
        let query = self
            .query_pairs("***")
            .into_iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{base_url}?{query}")
    }
}

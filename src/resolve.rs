//! Detail resolution for a single entity.

use std::{fmt, sync::Arc};

use futures::join;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    model::{DetailDocument, EntityKind, EntityReference, Section, SectionKind},
    normalize,
    provider::{Gateway, GatewayError, Method, RawPayload, Request},
};

const TOP_TRACKS_LIMIT: usize = 10;
const TOP_ALBUMS_LIMIT: usize = 8;
const SIMILAR_LIMIT: usize = 8;
/// Entries in the stand-alone top tracks view.
const TOP_TRACKS_VIEW_LIMIT: usize = 20;

/// The kinds of detail view a resolution can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailView {
    Artist,
    Track,
    Album,
    TopTracks,
}

impl From<EntityKind> for DetailView {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Artist => Self::Artist,
            EntityKind::Track => Self::Track,
            EntityKind::Album => Self::Album,
        }
    }
}

impl fmt::Display for DetailView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Artist => "artist details",
            Self::Track => "track details",
            Self::Album => "album details",
            Self::TopTracks => "top tracks",
        })
    }
}

/// The mandatory lookup for a detail view failed or found nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{view} unavailable for {reference}")]
pub struct DetailUnavailable {
    pub view: DetailView,
    pub reference: EntityReference,
}

pub struct Resolver {
    gateway: Arc<Gateway>,
}

impl Resolver {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Build the detail document for `reference`.
    ///
    /// # Errors
    ///
    /// [`DetailUnavailable`] when the primary lookup fails or returns no entity.
    pub async fn resolve(&self, reference: &EntityReference) -> Result<DetailDocument, DetailUnavailable> {
        info!(%reference, "Resolving details");
        let document = match reference {
            EntityReference::Artist { name } => self.resolve_artist(name).await,
            EntityReference::Track { artist, title } => self.resolve_track(artist, title).await,
            EntityReference::Album { artist, title } => self.resolve_album(artist, title).await,
        };
        document.ok_or_else(|| DetailUnavailable {
            view: reference.kind().into(),
            reference: reference.clone(),
        })
    }

    /// The longer top tracks listing for `artist`.
    ///
    /// # Errors
    ///
    /// [`DetailUnavailable`] when the lookup fails or the listing is empty.
    pub async fn resolve_top_tracks(&self, artist: &str) -> Result<DetailDocument, DetailUnavailable> {
        info!(artist, "Resolving top tracks");
        let request = Request::new(Method::ArtistTopTracks)
            .param("artist", artist)
            .limit(TOP_TRACKS_VIEW_LIMIT)
            .autocorrect();
        primary(self.gateway.send(&request).await)
            .and_then(|p| normalize::top_tracks_document(&p, artist, TOP_TRACKS_VIEW_LIMIT))
            .ok_or_else(|| DetailUnavailable {
                view: DetailView::TopTracks,
                reference: EntityReference::artist(artist),
            })
    }

    async fn resolve_artist(&self, name: &str) -> Option<DetailDocument> {
        let info = Request::new(Method::ArtistInfo)
            .param("artist", name)
            .autocorrect();
        let top_tracks = Request::new(Method::ArtistTopTracks)
            .param("artist", name)
            .limit(TOP_TRACKS_LIMIT)
            .autocorrect();
        let top_albums = Request::new(Method::ArtistTopAlbums)
            .param("artist", name)
            .limit(TOP_ALBUMS_LIMIT)
            .autocorrect();
        let similar = Request::new(Method::ArtistSimilar)
            .param("artist", name)
            .limit(SIMILAR_LIMIT)
            .autocorrect();

        let (info, top_tracks, top_albums, similar) = join!(
            self.gateway.send(&info),
            self.gateway.send(&top_tracks),
            self.gateway.send(&top_albums),
            self.gateway.send(&similar)
        );

        let mut document = normalize::artist_overview(&primary(info)?)?;
        // Sections link to the corrected name when the provider fixed the spelling.
        let artist = match &document.subject {
            EntityReference::Artist { name } => name.clone(),
            _ => name.to_owned(),
        };

        let supplementary = [
            supplement(SectionKind::TopTracks, top_tracks, |p| {
                normalize::top_tracks_section(p, &artist, TOP_TRACKS_LIMIT)
            }),
            supplement(SectionKind::TopAlbums, top_albums, |p| {
                normalize::top_albums_section(p, &artist, TOP_ALBUMS_LIMIT)
            }),
            supplement(SectionKind::SimilarArtists, similar, |p| {
                normalize::similar_artists_section(p, SIMILAR_LIMIT)
            }),
        ];
        document.sections.extend(supplementary.into_iter().flatten());
        Some(document)
    }

    async fn resolve_track(&self, artist: &str, title: &str) -> Option<DetailDocument> {
        let request = Request::new(Method::TrackInfo)
            .param("artist", artist)
            .param("track", title)
            .autocorrect();
        normalize::track_detail(&primary(self.gateway.send(&request).await)?, artist)
    }

    async fn resolve_album(&self, artist: &str, title: &str) -> Option<DetailDocument> {
        let request = Request::new(Method::AlbumInfo)
            .param("artist", artist)
            .param("album", title)
            .autocorrect();
        normalize::album_detail(&primary(self.gateway.send(&request).await)?, artist)
    }
}

fn primary(result: Result<RawPayload, GatewayError>) -> Option<RawPayload> {
    result
        .inspect_err(|e| warn!("Primary detail lookup failed: {e}"))
        .ok()
}

/// A failed supplementary lookup only drops its own section.
fn supplement(
    kind: SectionKind,
    result: Result<RawPayload, GatewayError>,
    build: impl FnOnce(&RawPayload) -> Option<Section>,
) -> Option<Section> {
    match result {
        Ok(payload) => {
            let section = build(&payload);
            if section.is_none() {
                debug!(?kind, "Supplementary section is empty");
            }
            section
        }
        Err(e) => {
            warn!(?kind, "Supplementary lookup failed, section omitted: {e}");
            None
        }
    }
}

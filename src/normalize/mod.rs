//! Mapping from provider payloads to display records and detail documents.
//!
//! Every fallback for a missing field lives in this module:
//!
//! | field                          | fallback            |
//! |--------------------------------|---------------------|
//! | name / title                   | `"Unknown"`         |
//! | numeric stat, duration         | `"—"`               |
//! | artist of a track or album     | enclosing artist, else `"Unknown"` |
//! | album of a track               | `"—"`               |
//! | image                          | none                |
//! | summary / biography            | section omitted     |


use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    model::{
        DetailDocument, DisplayRecord, EntityReference, Fact, Link, PrimarySection, Section,
        SectionBody, SectionKind,
    },
    provider::{
        types::{
            AlbumEntry, AlbumInfoPayload, ArtistEntry, ArtistInfoPayload, ArtistsPayload, Image,
            SearchPayload, SimilarArtistsPayload, TagEntry, TopAlbumsPayload, TopArtistsPayload,
            TopTracksPayload, TrackEntry, TrackInfoPayload, TracksPayload,
        },
        RawPayload,
    },
};

pub const UNKNOWN: &str = "Unknown";
pub const NO_VALUE: &str = "—";

/// Tags shown in the artist and album header.
const HEADER_TAG_CAP: usize = 6;

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"));

/// Interpret a payload as `T`; a payload of the wrong overall shape reads as empty.
fn shape<T: DeserializeOwned + Default>(payload: &RawPayload) -> T {
    T::deserialize(payload).unwrap_or_else(|e| {
        debug!("Payload does not match {}: {e}", std::any::type_name::<T>());
        T::default()
    })
}

fn or_unknown(value: Option<&String>) -> String {
    value.cloned().unwrap_or_else(|| UNKNOWN.to_owned())
}

fn or_no_value(value: Option<&String>) -> String {
    value.cloned().unwrap_or_else(|| NO_VALUE.to_owned())
}

/// The provider orders image variants by size, so the last one is the largest.
#[must_use]
pub fn select_image(images: &[Image]) -> Option<String> {
    images.last().and_then(|i| i.url.clone())
}

/// Remove markup and decode entities. The result is plain text and still needs
/// escaping before it is embedded in HTML.
#[must_use]
pub fn strip_html(text: &str) -> String {
    let without_tags = MARKUP.replace_all(text, "");
    html_escape::decode_html_entities(&without_tags).trim().to_owned()
}

/// `m:ss` for a positive millisecond count, `—` for anything else.
#[must_use]
pub fn format_duration(millis: Option<&str>) -> String {
    let millis = millis.map(str::trim).and_then(|s| {
        s.parse::<i64>()
            .ok()
            .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
    });
    match millis {
        Some(ms) if ms > 0 => {
            let total = ms / 1000;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => NO_VALUE.to_owned(),
    }
}

fn artist_record(entry: &ArtistEntry) -> DisplayRecord {
    let name = or_unknown(entry.name.as_ref());
    DisplayRecord {
        secondary_label: or_no_value(entry.listeners.as_ref()),
        image_url: select_image(&entry.image),
        reference: EntityReference::artist(name.clone()),
        name,
    }
}

fn track_record(entry: &TrackEntry) -> DisplayRecord {
    let name = or_unknown(entry.name.as_ref());
    let artist = or_unknown(entry.artist.as_ref());
    DisplayRecord {
        image_url: select_image(&entry.image),
        reference: EntityReference::track(artist.clone(), name.clone()),
        secondary_label: artist,
        name,
    }
}

fn album_record(entry: &AlbumEntry) -> DisplayRecord {
    let name = or_unknown(entry.name.as_ref());
    let artist = or_unknown(entry.artist.as_ref());
    DisplayRecord {
        image_url: select_image(&entry.image),
        reference: EntityReference::album(artist.clone(), name.clone()),
        secondary_label: artist,
        name,
    }
}

// Records are produced lazily, so only the first `cap` entries are normalized.

/// `artist.search`
pub fn artist_matches(payload: &RawPayload, cap: usize) -> Vec<DisplayRecord> {
    let payload: SearchPayload = shape(payload);
    payload
        .results
        .artistmatches
        .artist
        .iter()
        .map(artist_record)
        .take(cap)
        .collect()
}

/// `track.search`
pub fn track_matches(payload: &RawPayload, cap: usize) -> Vec<DisplayRecord> {
    let payload: SearchPayload = shape(payload);
    payload
        .results
        .trackmatches
        .track
        .iter()
        .map(track_record)
        .take(cap)
        .collect()
}

/// `album.search`
pub fn album_matches(payload: &RawPayload, cap: usize) -> Vec<DisplayRecord> {
    let payload: SearchPayload = shape(payload);
    payload
        .results
        .albummatches
        .album
        .iter()
        .map(album_record)
        .take(cap)
        .collect()
}

/// `tag.gettopartists`
pub fn tag_top_artists(payload: &RawPayload, cap: usize) -> Vec<DisplayRecord> {
    let payload: TopArtistsPayload = shape(payload);
    payload
        .topartists
        .artist
        .iter()
        .map(artist_record)
        .take(cap)
        .collect()
}

/// `tag.gettoptracks` and `chart.gettoptracks`
pub fn top_chart_tracks(payload: &RawPayload, cap: usize) -> Vec<DisplayRecord> {
    let payload: TracksPayload = shape(payload);
    payload
        .tracks
        .track
        .iter()
        .map(track_record)
        .take(cap)
        .collect()
}

/// `chart.gettopartists`
pub fn top_chart_artists(payload: &RawPayload, cap: usize) -> Vec<DisplayRecord> {
    let payload: ArtistsPayload = shape(payload);
    payload
        .artists
        .artist
        .iter()
        .map(artist_record)
        .take(cap)
        .collect()
}

fn tag_names(tags: &[TagEntry], cap: usize) -> Vec<String> {
    tags.iter()
        .filter_map(|t| t.name.clone())
        .take(cap)
        .collect()
}

fn text_section(kind: SectionKind, summary: Option<&String>) -> Option<Section> {
    let text = strip_html(summary?);
    (!text.is_empty()).then_some(Section {
        kind,
        body: SectionBody::Text(text),
    })
}

fn links_section(kind: SectionKind, links: Vec<Link>) -> Option<Section> {
    (!links.is_empty()).then_some(Section {
        kind,
        body: SectionBody::Links(links),
    })
}

/// Track links attributed to `artist` unless an entry names its own artist.
fn track_links<'a>(
    tracks: impl Iterator<Item = &'a TrackEntry>,
    artist: &str,
    cap: usize,
) -> Vec<Link> {
    tracks
        .map(|t| {
            let title = or_unknown(t.name.as_ref());
            let artist = t.artist.clone().unwrap_or_else(|| artist.to_owned());
            Link {
                reference: EntityReference::track(artist, title.clone()),
                label: title,
            }
        })
        .take(cap)
        .collect()
}

/// Header and biography of `artist.getinfo`, or `None` when the payload holds no artist.
pub fn artist_overview(payload: &RawPayload) -> Option<DetailDocument> {
    let payload: ArtistInfoPayload = shape(payload);
    let artist = payload.artist?;
    let name = or_unknown(artist.name.as_ref());

    Some(DetailDocument {
        subject: EntityReference::artist(name.clone()),
        primary: PrimarySection {
            title: name,
            image_url: select_image(&artist.image),
            facts: vec![vec![
                Fact::new("Listeners", or_no_value(artist.stats.listeners.as_ref())),
                Fact::new("Playcount", or_no_value(artist.stats.playcount.as_ref())),
            ]],
            tags: tag_names(&artist.tags.tag, HEADER_TAG_CAP),
        },
        sections: text_section(SectionKind::Biography, artist.bio.summary.as_ref())
            .into_iter()
            .collect(),
    })
}

/// `artist.getTopTracks` as a link section.
pub fn top_tracks_section(payload: &RawPayload, artist: &str, cap: usize) -> Option<Section> {
    let payload: TopTracksPayload = shape(payload);
    links_section(
        SectionKind::TopTracks,
        track_links(payload.toptracks.track.iter(), artist, cap),
    )
}

/// `artist.getTopAlbums` as a link section.
pub fn top_albums_section(payload: &RawPayload, artist: &str, cap: usize) -> Option<Section> {
    let payload: TopAlbumsPayload = shape(payload);
    let links = payload
        .topalbums
        .album
        .iter()
        .map(|a| {
            let title = or_unknown(a.name.as_ref());
            let artist = a.artist.clone().unwrap_or_else(|| artist.to_owned());
            Link {
                reference: EntityReference::album(artist, title.clone()),
                label: title,
            }
        })
        .take(cap)
        .collect();
    links_section(SectionKind::TopAlbums, links)
}

/// `artist.getSimilar` as a link section.
pub fn similar_artists_section(payload: &RawPayload, cap: usize) -> Option<Section> {
    let payload: SimilarArtistsPayload = shape(payload);
    let links = payload
        .similarartists
        .artist
        .iter()
        .map(|a| {
            let name = or_unknown(a.name.as_ref());
            Link {
                reference: EntityReference::artist(name.clone()),
                label: name,
            }
        })
        .take(cap)
        .collect();
    links_section(SectionKind::SimilarArtists, links)
}

/// `track.getInfo`, or `None` when the payload holds no track. `artist` is the
/// name the lookup was made with.
pub fn track_detail(payload: &RawPayload, artist: &str) -> Option<DetailDocument> {
    let payload: TrackInfoPayload = shape(payload);
    let track = payload.track?;
    let title = or_unknown(track.name.as_ref());
    let artist = track.artist.clone().unwrap_or_else(|| artist.to_owned());

    Some(DetailDocument {
        subject: EntityReference::track(artist.clone(), title.clone()),
        primary: PrimarySection {
            title,
            image_url: select_image(&track.album.image),
            facts: vec![
                vec![
                    Fact::new("Artist", artist),
                    Fact::new("Album", or_no_value(track.album.title.as_ref())),
                ],
                vec![
                    Fact::new("Duration", format_duration(track.duration.as_deref())),
                    Fact::new("Listeners", or_no_value(track.listeners.as_ref())),
                    Fact::new("Playcount", or_no_value(track.playcount.as_ref())),
                ],
            ],
            tags: tag_names(&track.toptags.tag, usize::MAX),
        },
        sections: text_section(SectionKind::Notes, track.wiki.summary.as_ref())
            .into_iter()
            .collect(),
    })
}

/// `album.getInfo`, track listing included, or `None` when the payload holds no album.
pub fn album_detail(payload: &RawPayload, artist: &str) -> Option<DetailDocument> {
    let payload: AlbumInfoPayload = shape(payload);
    let album = payload.album?;
    let title = or_unknown(album.name.as_ref());
    let artist = album.artist.clone().unwrap_or_else(|| artist.to_owned());

    let sections = [
        links_section(
            SectionKind::TrackList,
            track_links(album.tracks.track.iter(), &artist, usize::MAX),
        ),
        text_section(SectionKind::Notes, album.wiki.summary.as_ref()),
    ]
    .into_iter()
    .flatten()
    .collect();

    Some(DetailDocument {
        subject: EntityReference::album(artist.clone(), title.clone()),
        primary: PrimarySection {
            title,
            image_url: select_image(&album.image),
            facts: vec![
                vec![Fact::new("Artist", artist)],
                vec![
                    Fact::new("Listeners", or_no_value(album.listeners.as_ref())),
                    Fact::new("Playcount", or_no_value(album.playcount.as_ref())),
                ],
            ],
            tags: tag_names(&album.tags.tag, HEADER_TAG_CAP),
        },
        sections,
    })
}

/// Stand-alone top tracks listing for `artist`, or `None` when the list is empty.
pub fn top_tracks_document(payload: &RawPayload, artist: &str, cap: usize) -> Option<DetailDocument> {
    let section = top_tracks_section(payload, artist, cap)?;
    Some(DetailDocument {
        subject: EntityReference::artist(artist),
        primary: PrimarySection {
            title: format!("{artist} — Top tracks"),
            image_url: None,
            facts: Vec::new(),
            tags: Vec::new(),
        },
        sections: vec![section],
    })
}

//! Payload shapes returned by the provider.
//!
//! The provider is loose with its JSON: lists of one element arrive as a bare
//! object, numbers arrive as strings, `artist` is sometimes a name and sometimes
//! an object, and empty sub-documents arrive as `""`. Every field here is
//! therefore optional and deserialized through one of the forgiving helpers
//! below, so a malformed sub-field only ever blanks that field.

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

/// Accept an array, a single element, or anything else as empty. Elements that
/// don't fit `T` are dropped.
fn one_or_many<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect(),
        v @ Value::Object(_) => serde_json::from_value(v).ok().into_iter().collect(),
        _ => Vec::new(),
    })
}

/// Strings and numbers as text. Blank strings count as absent.
fn loose_text<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// A bare name, or an object carrying `name` (or `#text`).
fn name_or_object<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("#text"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(ToOwned::to_owned),
        _ => None,
    })
}

/// Nested documents: anything that doesn't fit becomes the default.
fn lenient<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(serde_json::from_value(Value::deserialize(d)?).unwrap_or_default())
}

/// Error document the provider sends with failing (and occasionally successful) answers.
#[derive(Debug, Default, Deserialize)]
pub struct ProviderFault {
    #[serde(default)]
    pub error: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Image {
    #[serde(rename = "#text", default, deserialize_with = "loose_text")]
    pub url: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ArtistEntry {
    #[serde(default, deserialize_with = "loose_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub listeners: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub image: Vec<Image>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct TrackEntry {
    #[serde(default, deserialize_with = "loose_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "name_or_object")]
    pub artist: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub image: Vec<Image>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct AlbumEntry {
    #[serde(default, deserialize_with = "loose_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "name_or_object")]
    pub artist: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub image: Vec<Image>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct TagEntry {
    #[serde(default, deserialize_with = "loose_text")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArtistList {
    #[serde(default, deserialize_with = "one_or_many")]
    pub artist: Vec<ArtistEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrackList {
    #[serde(default, deserialize_with = "one_or_many")]
    pub track: Vec<TrackEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlbumList {
    #[serde(default, deserialize_with = "one_or_many")]
    pub album: Vec<AlbumEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TagList {
    #[serde(default, deserialize_with = "one_or_many")]
    pub tag: Vec<TagEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Stats {
    #[serde(default, deserialize_with = "loose_text")]
    pub listeners: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub playcount: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Wiki {
    #[serde(default, deserialize_with = "loose_text")]
    pub summary: Option<String>,
}

/// `artist.search`, `track.search` and `album.search`
#[derive(Debug, Default, Deserialize)]
pub struct SearchPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub results: SearchResults,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default, deserialize_with = "lenient")]
    pub artistmatches: ArtistList,
    #[serde(default, deserialize_with = "lenient")]
    pub trackmatches: TrackList,
    #[serde(default, deserialize_with = "lenient")]
    pub albummatches: AlbumList,
}

/// `tag.gettoptracks` and `chart.gettoptracks`
#[derive(Debug, Default, Deserialize)]
pub struct TracksPayload {
    #[serde(default, alias = "toptracks", deserialize_with = "lenient")]
    pub tracks: TrackList,
}

/// `chart.gettopartists`
#[derive(Debug, Default, Deserialize)]
pub struct ArtistsPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub artists: ArtistList,
}

/// `tag.gettopartists`
#[derive(Debug, Default, Deserialize)]
pub struct TopArtistsPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub topartists: ArtistList,
}

/// `artist.getTopTracks`
#[derive(Debug, Default, Deserialize)]
pub struct TopTracksPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub toptracks: TrackList,
}

/// `artist.getTopAlbums`
#[derive(Debug, Default, Deserialize)]
pub struct TopAlbumsPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub topalbums: AlbumList,
}

/// `artist.getSimilar`
#[derive(Debug, Default, Deserialize)]
pub struct SimilarArtistsPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub similarartists: ArtistList,
}

/// `artist.getinfo`
#[derive(Debug, Default, Deserialize)]
pub struct ArtistInfoPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub artist: Option<ArtistInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArtistInfo {
    #[serde(default, deserialize_with = "loose_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub image: Vec<Image>,
    #[serde(default, deserialize_with = "lenient")]
    pub stats: Stats,
    #[serde(default, deserialize_with = "lenient")]
    pub tags: TagList,
    #[serde(default, deserialize_with = "lenient")]
    pub bio: Wiki,
}

/// `track.getInfo`
#[derive(Debug, Default, Deserialize)]
pub struct TrackInfoPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub track: Option<TrackInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrackInfo {
    #[serde(default, deserialize_with = "loose_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "name_or_object")]
    pub artist: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub album: TrackAlbum,
    /// Milliseconds.
    #[serde(default, deserialize_with = "loose_text")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub listeners: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub playcount: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub toptags: TagList,
    #[serde(default, deserialize_with = "lenient")]
    pub wiki: Wiki,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrackAlbum {
    #[serde(default, deserialize_with = "loose_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub image: Vec<Image>,
}

/// `album.getInfo`
#[derive(Debug, Default, Deserialize)]
pub struct AlbumInfoPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub album: Option<AlbumInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlbumInfo {
    #[serde(default, deserialize_with = "loose_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "name_or_object")]
    pub artist: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub image: Vec<Image>,
    #[serde(default, deserialize_with = "loose_text")]
    pub listeners: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub playcount: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub tracks: TrackList,
    #[serde(default, deserialize_with = "lenient")]
    pub tags: TagList,
    #[serde(default, deserialize_with = "lenient")]
    pub wiki: Wiki,
}

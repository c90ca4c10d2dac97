//! View models shared by the dispatcher, the resolver and the presentation layer.

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

/// Something the user can drill into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityReference {
    Artist { name: String },
    Track { artist: String, title: String },
    Album { artist: String, title: String },
}

impl EntityReference {
    pub fn artist(name: impl Into<String>) -> Self {
        Self::Artist { name: name.into() }
    }

    pub fn track(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self::Track {
            artist: artist.into(),
            title: title.into(),
        }
    }

    pub fn album(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self::Album {
            artist: artist.into(),
            title: title.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Artist { .. } => EntityKind::Artist,
            Self::Track { .. } => EntityKind::Track,
            Self::Album { .. } => EntityKind::Album,
        }
    }
}

impl fmt::Display for EntityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Artist { name } => write!(f, "artist '{name}'"),
            Self::Track { artist, title } => write!(f, "track '{title}' by '{artist}'"),
            Self::Album { artist, title } => write!(f, "album '{title}' by '{artist}'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Artist,
    Track,
    Album,
}

/// Which categories a search activates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SearchScope {
    #[default]
    All,
    Artist,
    Track,
    Album,
    Genre,
}

impl SearchScope {
    #[must_use]
    pub const fn includes(self, category: Category) -> bool {
        match (self, category) {
            (Self::All, _)
            | (Self::Artist, Category::Artist)
            | (Self::Track, Category::Track)
            | (Self::Album, Category::Album)
            | (Self::Genre, Category::GenreArtist | Category::GenreTrack) => true,
            _ => false,
        }
    }
}

/// Result groupings, declared in aggregate display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Artist,
    Track,
    Album,
    GenreArtist,
    GenreTrack,
}

impl Category {
    /// Maximum number of records shown for this category.
    #[must_use]
    pub const fn display_cap(self) -> usize {
        match self {
            Self::GenreArtist => 6,
            Self::Artist | Self::Track | Self::Album | Self::GenreTrack => 8,
        }
    }

    /// Label placed in front of [`DisplayRecord::secondary_label`].
    #[must_use]
    pub const fn secondary_caption(self) -> &'static str {
        match self {
            Self::Artist | Self::GenreArtist => "Listeners",
            Self::Track | Self::Album | Self::GenreTrack => "Artist",
        }
    }

    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::Artist => "Artists",
            Self::Track => "Tracks",
            Self::Album => "Albums",
            Self::GenreArtist => "Genre artists",
            Self::GenreTrack => "Genre tracks",
        }
    }
}

/// Uniform display shape for one search/chart hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRecord {
    pub name: String,
    pub secondary_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub reference: EntityReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryResult {
    pub category: Category,
    pub records: Vec<DisplayRecord>,
    /// Set when the lookup behind this category failed and `records` is empty because of it.
    pub failed: bool,
}

impl CategoryResult {
    #[must_use]
    pub const fn new(category: Category, records: Vec<DisplayRecord>) -> Self {
        Self {
            category,
            records,
            failed: false,
        }
    }

    #[must_use]
    pub const fn failed(category: Category) -> Self {
        Self {
            category,
            records: Vec::new(),
            failed: true,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// All category results of one search, in fixed category order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub query: String,
    pub categories: Vec<CategoryResult>,
}

impl AggregateResult {
    #[cfg(test)]
    pub fn get(&self, category: Category) -> Option<&CategoryResult> {
        self.categories.iter().find(|c| c.category == category)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(CategoryResult::is_empty)
    }

    /// Every drill-down reference in display order.
    pub fn references(&self) -> impl Iterator<Item = &EntityReference> {
        self.categories
            .iter()
            .flat_map(|c| c.records.iter().map(|r| &r.reference))
    }
}

/// Top chart listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Charts {
    pub artists: CategoryResult,
    pub tracks: CategoryResult,
}

/// Composed view of a single entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailDocument {
    pub subject: EntityReference,
    pub primary: PrimarySection,
    pub sections: Vec<Section>,
}

impl DetailDocument {
    #[cfg(test)]
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Embedded references in document order. Indices into this list identify
    /// the actions bound for the document.
    #[must_use]
    pub fn references(&self) -> Vec<&EntityReference> {
        self.sections
            .iter()
            .filter_map(|s| match &s.body {
                SectionBody::Links(links) => Some(links.iter().map(|l| &l.reference)),
                SectionBody::Text(_) => None,
            })
            .flatten()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimarySection {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Lines of `label: value` facts, each rendered on its own row.
    pub facts: Vec<Vec<Fact>>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fact {
    pub label: &'static str,
    pub value: String,
}

impl Fact {
    pub fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Biography,
    TopTracks,
    TopAlbums,
    SimilarArtists,
    TrackList,
    Notes,
}

impl SectionKind {
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::Biography => "Biography",
            Self::TopTracks => "Top tracks",
            Self::TopAlbums => "Top albums",
            Self::SimilarArtists => "Similar artists",
            Self::TrackList => "Tracks",
            Self::Notes => "Notes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub body: SectionBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionBody {
    Links(Vec<Link>),
    Text(String),
}

/// An actionable entry inside a detail section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub label: String,
    pub reference: EntityReference,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_selects_categories() {
        assert!(SearchScope::All.includes(Category::GenreTrack));
        assert!(SearchScope::Genre.includes(Category::GenreArtist));
        assert!(SearchScope::Genre.includes(Category::GenreTrack));
        assert!(!SearchScope::Genre.includes(Category::Artist));
        assert!(SearchScope::Album.includes(Category::Album));
        assert!(!SearchScope::Album.includes(Category::Track));
    }

    #[test]
    fn category_order_is_display_order() {
        let mut categories = vec![
            Category::GenreTrack,
            Category::Album,
            Category::Artist,
            Category::GenreArtist,
            Category::Track,
        ];
        categories.sort();
        assert_eq!(
            categories,
            [
                Category::Artist,
                Category::Track,
                Category::Album,
                Category::GenreArtist,
                Category::GenreTrack
            ]
        );
    }

    #[test]
    fn document_references_skip_text_sections() {
        let doc = DetailDocument {
            subject: EntityReference::artist("Low"),
            primary: PrimarySection {
                title: "Low".to_owned(),
                image_url: None,
                facts: Vec::new(),
                tags: Vec::new(),
            },
            sections: vec![
                Section {
                    kind: SectionKind::Biography,
                    body: SectionBody::Text("Duluth trio".to_owned()),
                },
                Section {
                    kind: SectionKind::TopTracks,
                    body: SectionBody::Links(vec![Link {
                        label: "Words".to_owned(),
                        reference: EntityReference::track("Low", "Words"),
                    }]),
                },
                Section {
                    kind: SectionKind::SimilarArtists,
                    body: SectionBody::Links(vec![Link {
                        label: "Codeine".to_owned(),
                        reference: EntityReference::artist("Codeine"),
                    }]),
                },
            ],
        };
        assert_eq!(
            doc.references(),
            [
                &EntityReference::track("Low", "Words"),
                &EntityReference::artist("Codeine")
            ]
        );
    }
}

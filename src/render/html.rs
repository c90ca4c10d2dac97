//! HTML fragments for embedding in a page. Provider text is escaped here and
//! nowhere else; drill-down buttons carry `data-action` attributes naming the
//! entity they open.

use std::borrow::Cow;

use html_escape::{encode_double_quoted_attribute, encode_safe};

use crate::model::{
    AggregateResult, Category, CategoryResult, Charts, DetailDocument, DisplayRecord,
    EntityReference, SectionBody, SectionKind,
};

fn attr(s: &str) -> Cow<'_, str> {
    encode_double_quoted_attribute(s)
}

/// `data-*` attributes identifying the entity a button opens.
fn action_attrs(reference: &EntityReference) -> String {
    match reference {
        EntityReference::Artist { name } => {
            format!(r#"data-action="open-artist" data-artist="{}""#, attr(name))
        }
        EntityReference::Track { artist, title } => format!(
            r#"data-action="open-track" data-artist="{}" data-track="{}""#,
            attr(artist),
            attr(title)
        ),
        EntityReference::Album { artist, title } => format!(
            r#"data-action="open-album" data-artist="{}" data-album="{}""#,
            attr(artist),
            attr(title)
        ),
    }
}

fn thumb(image_url: Option<&str>, alt: &str) -> String {
    image_url.map_or_else(
        || r#"<div class="thumb" aria-hidden="true"></div>"#.to_owned(),
        |url| format!(r#"<img class="thumb" src="{}" alt="{}">"#, attr(url), attr(alt)),
    )
}

fn card(category: Category, record: &DisplayRecord) -> String {
    let mut actions = format!(
        r#"<button class="btn-ghost" {}>Details</button>"#,
        action_attrs(&record.reference)
    );
    if let EntityReference::Artist { name } = &record.reference {
        actions.push_str(&format!(
            r#"<button class="btn-ghost" data-action="open-artist-top" data-artist="{}">Top tracks</button>"#,
            attr(name)
        ));
    }
    format!(
        "<article class=\"result-card\">{}<h3>{}</h3><p>{}: {}</p><div class=\"action-row\">{actions}</div></article>\n",
        thumb(record.image_url.as_deref(), &record.name),
        encode_safe(&record.name),
        category.secondary_caption(),
        encode_safe(&record.secondary_label),
    )
}

fn failed_notice(category: Category) -> String {
    format!(
        "<p class=\"error\" data-category=\"{}\">Could not load {}.</p>\n",
        category_id(category),
        category.heading().to_lowercase()
    )
}

const fn category_id(category: Category) -> &'static str {
    match category {
        Category::Artist => "artist",
        Category::Track => "track",
        Category::Album => "album",
        Category::GenreArtist => "genre-artist",
        Category::GenreTrack => "genre-track",
    }
}

fn genre_artists(category: &CategoryResult) -> String {
    let buttons = category
        .records
        .iter()
        .map(|r| {
            format!(
                r#"<button class="btn-ghost" {}>{}</button>"#,
                action_attrs(&r.reference),
                encode_safe(&r.name)
            )
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!(r#"<div class="section"><h4>Artists</h4><div class="tag-list">{buttons}</div></div>"#)
}

fn genre_tracks(category: &CategoryResult) -> String {
    let rows: String = category
        .records
        .iter()
        .map(|r| {
            format!(
                r#"<div><button class="btn-ghost" {}>{}</button> — {}</div>"#,
                action_attrs(&r.reference),
                encode_safe(&r.name),
                encode_safe(&r.secondary_label)
            )
        })
        .collect();
    format!(r#"<div class="section"><h4>Tracks</h4>{rows}</div>"#)
}

pub fn results(result: &AggregateResult) -> String {
    let mut out = String::new();
    let mut genre = String::new();
    for category in &result.categories {
        if category.failed {
            out.push_str(&failed_notice(category.category));
            continue;
        }
        if category.is_empty() {
            continue;
        }
        match category.category {
            Category::GenreArtist => genre.push_str(&genre_artists(category)),
            Category::GenreTrack => genre.push_str(&genre_tracks(category)),
            c @ (Category::Artist | Category::Track | Category::Album) => {
                for record in &category.records {
                    out.push_str(&card(c, record));
                }
            }
        }
    }
    if !genre.is_empty() {
        out.push_str(&format!(
            "<div class=\"card\"><h3>Genre results for \"{}\"</h3>{genre}</div>\n",
            encode_safe(&result.query)
        ));
    }
    out
}

fn chart_list(category: &CategoryResult) -> String {
    if category.failed {
        return failed_notice(category.category);
    }
    let items: String = category
        .records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let label = match category.category {
                Category::Track | Category::GenreTrack => format!(
                    "{} — {}",
                    encode_safe(&r.name),
                    encode_safe(&r.secondary_label)
                ),
                _ => encode_safe(&r.name).into_owned(),
            };
            format!(
                r#"<li><span>{}. {label}</span><button {}>Details</button></li>"#,
                i + 1,
                action_attrs(&r.reference)
            )
        })
        .collect();
    format!("<ol>{items}</ol>\n")
}

pub fn charts(charts: &Charts) -> String {
    format!(
        "<section id=\"topArtists\">{}</section>\n<section id=\"topTracks\">{}</section>\n",
        chart_list(&charts.artists).trim_end(),
        chart_list(&charts.tracks).trim_end()
    )
}

pub fn document(document: &DetailDocument) -> String {
    let primary = &document.primary;
    let facts: String = primary
        .facts
        .iter()
        .map(|row| {
            let line = row
                .iter()
                .map(|f| format!("{}: {}", f.label, encode_safe(&f.value)))
                .collect::<Vec<_>>()
                .join(" • ");
            format!(r#"<div class="details-meta">{line}</div>"#)
        })
        .collect();
    let tags: String = primary
        .tags
        .iter()
        .map(|t| format!(r#"<span class="tag">{}</span>"#, encode_safe(t)))
        .collect();
    let image = primary.image_url.as_deref().map_or_else(
        || r#"<div class="thumb" aria-hidden="true"></div>"#.to_owned(),
        |url| format!(r#"<img src="{}" alt="{}">"#, attr(url), attr(&primary.title)),
    );

    let mut out = format!(
        "<div class=\"details-hero\">{image}<div><h2 id=\"detailsTitle\">{}</h2>{facts}<div class=\"section tag-list\">{tags}</div></div></div>\n",
        encode_safe(&primary.title)
    );
    for section in &document.sections {
        let body = match &section.body {
            SectionBody::Text(text) => format!("<div>{}</div>", encode_safe(text)),
            SectionBody::Links(links) if matches!(section.kind, SectionKind::TopTracks | SectionKind::TrackList) => {
                let items: String = links
                    .iter()
                    .map(|l| {
                        format!(
                            r#"<li><button class="btn-ghost" {}>{}</button></li>"#,
                            action_attrs(&l.reference),
                            encode_safe(&l.label)
                        )
                    })
                    .collect();
                format!("<ol>{items}</ol>")
            }
            SectionBody::Links(links) => {
                let buttons: String = links
                    .iter()
                    .map(|l| {
                        format!(
                            r#"<button class="tag btn-ghost" {}>{}</button>"#,
                            action_attrs(&l.reference),
                            encode_safe(&l.label)
                        )
                    })
                    .collect();
                format!(r#"<div class="tag-list">{buttons}</div>"#)
            }
        };
        out.push_str(&format!(
            "<div class=\"section\"><h4>{}</h4>{body}</div>\n",
            section.kind.heading()
        ));
    }
    out
}

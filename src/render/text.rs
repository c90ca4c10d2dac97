//! Plain text rendering. Every drill-down entry is numbered in reference order
//! so `open N` can address it.

use std::fmt::{self, Display, Formatter};

use crate::model::{
    AggregateResult, CategoryResult, Charts, DetailDocument, DisplayRecord, SectionBody,
};

pub fn results(result: &AggregateResult) -> String {
    Results(result).to_string()
}

pub fn document(document: &DetailDocument) -> String {
    Document(document).to_string()
}

pub fn charts(charts: &Charts) -> String {
    ChartListing(charts).to_string()
}

struct Results<'a>(&'a AggregateResult);

impl Display for Results<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut n = 0;
        for category in &self.0.categories {
            write_category(f, category.category.heading(), category, &mut n)?;
        }
        Ok(())
    }
}

struct ChartListing<'a>(&'a Charts);

impl Display for ChartListing<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut n = 0;
        write_category(f, "Top artists", &self.0.artists, &mut n)?;
        write_category(f, "Top tracks", &self.0.tracks, &mut n)
    }
}

fn write_category(
    f: &mut Formatter<'_>,
    heading: &str,
    category: &CategoryResult,
    n: &mut usize,
) -> fmt::Result {
    if category.failed {
        return writeln!(f, "{heading}\n  (lookup failed)");
    }
    if category.is_empty() {
        return Ok(());
    }
    writeln!(f, "{heading}")?;
    for record in &category.records {
        *n += 1;
        write_record(f, *n, category.category.secondary_caption(), record)?;
    }
    Ok(())
}

fn write_record(
    f: &mut Formatter<'_>,
    n: usize,
    caption: &str,
    record: &DisplayRecord,
) -> fmt::Result {
    writeln!(
        f,
        "  [{n}] {} ({caption}: {})",
        record.name, record.secondary_label
    )
}

struct Document<'a>(&'a DetailDocument);

impl Display for Document<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let primary = &self.0.primary;
        writeln!(f, "{}", primary.title)?;
        for row in &primary.facts {
            let line = row
                .iter()
                .map(|fact| format!("{}: {}", fact.label, fact.value))
                .collect::<Vec<_>>()
                .join(" • ");
            writeln!(f, "  {line}")?;
        }
        if !primary.tags.is_empty() {
            writeln!(f, "  Tags: {}", primary.tags.join(", "))?;
        }
        if let Some(url) = &primary.image_url {
            writeln!(f, "  Image: {url}")?;
        }

        let mut n = 0;
        for section in &self.0.sections {
            writeln!(f, "\n{}", section.kind.heading())?;
            match &section.body {
                SectionBody::Text(text) => {
                    for line in text.lines() {
                        writeln!(f, "  {line}")?;
                    }
                }
                SectionBody::Links(links) => {
                    for link in links {
                        n += 1;
                        writeln!(f, "  [{n}] {}", link.label)?;
                    }
                }
            }
        }
        Ok(())
    }
}

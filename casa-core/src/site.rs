use std::path::{Component, Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::markdown::{ElementNode, parse_elements};
use crate::metadata::Metadata;

/// One discovered content document. Immutable once discovered.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Path relative to the content source root.
    pub path: PathBuf,
    pub metadata: Metadata,
    /// Markdown body with the front matter removed.
    pub body: String,
}

impl Document {
    pub fn route(&self) -> &str {
        &self.metadata.route
    }

    pub fn elements(&self) -> Vec<ElementNode> {
        parse_elements(&self.body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteIndexEntry {
    pub route: String,
    pub title: String,
    pub description: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub icon: Option<String>,
    pub link: Option<String>,
    pub is_archived: bool,
    pub source_path: PathBuf,
}

impl RouteIndexEntry {
    pub fn from_document(document: &Document) -> Self {
        let meta = &document.metadata;
        Self {
            route: meta.route.clone(),
            title: meta.title.clone(),
            description: meta.description.clone(),
            publish_date: meta.publish_date,
            icon: meta.icon.clone(),
            link: meta.link.clone(),
            is_archived: meta.archived,
            source_path: document.path.clone(),
        }
    }

    /// `YYYY / M / D`, no zero padding.
    pub fn date_label(&self) -> Option<String> {
        self.publish_date
            .map(|d| format!("{} / {} / {}", d.year(), d.month(), d.day()))
    }
}

/// Routes in discovery order. Never resorted after it is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteIndex {
    entries: Vec<RouteIndexEntry>,
}

impl RouteIndex {
    pub(crate) fn from_documents(documents: &[Document]) -> Self {
        Self {
            entries: documents.iter().map(RouteIndexEntry::from_document).collect(),
        }
    }

    pub fn entries(&self) -> &[RouteIndexEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RouteIndexEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, route: &str) -> Option<&RouteIndexEntry> {
        self.entries.iter().find(|e| e.route == route)
    }
}

impl<'a> IntoIterator for &'a RouteIndex {
    type Item = &'a RouteIndexEntry;
    type IntoIter = std::slice::Iter<'a, RouteIndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A fully rendered page, ready to be written below the output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub route: String,
    pub html: String,
}

impl Page {
    /// `/` renders to `index.html`, `/a/b` to `a/b/index.html`.
    ///
    /// `None` when a segment would not stay below the output directory.
    pub fn out_path(&self) -> Option<PathBuf> {
        let mut out = PathBuf::new();
        for segment in self.route.split('/').filter(|s| !s.is_empty()) {
            let segment = Path::new(segment);
            match segment.components().next() {
                Some(Component::Normal(_)) if segment.components().count() == 1 => {
                    out.push(segment)
                }
                _ => return None,
            }
        }

        Some(out.join("index.html"))
    }
}

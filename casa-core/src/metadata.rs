//! Document metadata extraction.
//!
//! Documents declare their metadata in a TOML block at the very top of the
//! file, fenced by `+++` lines:
//!
//! ```text
//! +++
//! title = "Kotlin Scope Functions"
//! publish_date = 2020-04-12
//! icon = "🔬"
//! +++
//!
//! # Body starts here
//! ```
//!
//! Only `title` is required. When no `route` is declared the route is
//! derived from the source path (see [`derive_route`]).

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const FENCE: &str = "+++";

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("{}: missing or empty title", path.display())]
    MissingTitle { path: PathBuf },
    #[error("{}: invalid publish date {value:?}", path.display())]
    InvalidDate { path: PathBuf, value: String },
    #[error("{}: malformed front matter: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{}: front matter is never closed", path.display())]
    UnterminatedFrontMatter { path: PathBuf },
    #[error("{}: route {route:?} must be a plain path without `.`, `..` or `:`", path.display())]
    InvalidRoute { path: PathBuf, route: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub title: String,
    pub publish_date: Option<NaiveDate>,
    pub icon: Option<String>,
    pub route: String,
    pub description: Option<String>,
    /// External address the listing points at instead of the route.
    pub link: Option<String>,
    pub archived: bool,
}

/// The front matter exactly as authored, before validation.
#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    title: Option<String>,
    #[serde(alias = "publishDate", alias = "date")]
    publish_date: Option<toml::Value>,
    icon: Option<String>,
    route: Option<String>,
    description: Option<String>,
    #[serde(alias = "url")]
    link: Option<String>,
    #[serde(alias = "isArchived", alias = "isDefunct", alias = "defunct")]
    archived: Option<bool>,
}

/// Split a document into its front matter block and body.
///
/// Returns `(None, text)` when the document has no front matter.
pub fn split_front_matter<'a>(
    text: &'a str,
    path: &Path,
) -> Result<(Option<&'a str>, &'a str), MetadataError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(rest) = strip_fence_line(text) else {
        return Ok((None, text));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let block = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((Some(block), body));
        }
        offset += line.len();
    }

    Err(MetadataError::UnterminatedFrontMatter {
        path: path.to_path_buf(),
    })
}

fn strip_fence_line(text: &str) -> Option<&str> {
    let (first, rest) = match text.find('\n') {
        Some(end) => (&text[..end], &text[end + 1..]),
        None => (text, ""),
    };
    (first.trim_end() == FENCE).then_some(rest)
}

/// Validate a front matter block and resolve the document's route.
///
/// `path` is the document's source path and `content_root` the prefix that
/// is stripped from it when deriving a route.
pub fn extract(
    block: Option<&str>,
    path: &Path,
    content_root: &Path,
) -> Result<Metadata, MetadataError> {
    let raw: RawMetadata = match block {
        Some(block) => toml::from_str(block).map_err(|source| MetadataError::Malformed {
            path: path.to_path_buf(),
            source,
        })?,
        None => RawMetadata::default(),
    };

    let title = raw
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| MetadataError::MissingTitle {
            path: path.to_path_buf(),
        })?;

    let publish_date = raw
        .publish_date
        .map(|value| parse_date(&value).ok_or_else(|| invalid_date(path, &value)))
        .transpose()?;

    let route = match raw.route {
        Some(route) => normalize_route(&route).ok_or_else(|| MetadataError::InvalidRoute {
            path: path.to_path_buf(),
            route,
        })?,
        None => derive_route(path, content_root),
    };

    Ok(Metadata {
        title,
        publish_date,
        icon: raw.icon.filter(|i| !i.trim().is_empty()),
        route,
        description: raw.description,
        link: raw.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
        archived: raw.archived.unwrap_or(false),
    })
}

fn invalid_date(path: &Path, value: &toml::Value) -> MetadataError {
    let value = match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    MetadataError::InvalidDate {
        path: path.to_path_buf(),
        value,
    }
}

fn parse_date(value: &toml::Value) -> Option<NaiveDate> {
    match value {
        toml::Value::Datetime(datetime) => {
            let date = datetime.date?;
            NaiveDate::from_ymd_opt(
                i32::from(date.year),
                u32::from(date.month),
                u32::from(date.day),
            )
        }
        toml::Value::String(s) => {
            let s = s.trim();
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        }
        _ => None,
    }
}

/// Derive a route from a source path.
///
/// The content root is stripped, the extension dropped and a trailing
/// `index` segment collapsed: `posts/2020/foo/index.md` under `posts`
/// becomes `/2020/foo`.
pub fn derive_route(path: &Path, content_root: &Path) -> String {
    let relative = path.strip_prefix(content_root).unwrap_or(path);
    let relative = relative.with_extension("");

    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if segments.last().is_some_and(|s| s == "index") {
        segments.pop();
    }

    format!("/{}", segments.join("/"))
}

/// `None` when the route could leave the site: a `.` or `..` segment, or a
/// scheme such as `https:`.
fn normalize_route(route: &str) -> Option<String> {
    if route.contains(':') || route.contains('\\') {
        return None;
    }

    let segments: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return None;
    }

    Some(format!("/{}", segments.join("/")))
}

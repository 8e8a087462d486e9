use serde::Serialize;
use tera::Context;

use crate::config::StyleConfig;
use crate::overrides::ElementOverrideRegistry;
use crate::site::{Document, Page, RouteIndex, RouteIndexEntry};
use crate::template::{Layout, TemplateError};

pub const INDEX_TEMPLATE: &str = "index.html";
pub const POST_TEMPLATE: &str = "post.html";

#[derive(Debug, Serialize)]
struct IndexItem<'a> {
    route: &'a str,
    href: String,
    title: &'a str,
    description: Option<&'a str>,
    icon: Option<&'a str>,
    icon_src: Option<&'a str>,
    date: Option<String>,
    archived: bool,
}

impl<'a> IndexItem<'a> {
    fn new(entry: &'a RouteIndexEntry) -> Self {
        let icon = entry.icon.as_deref();
        Self {
            route: &entry.route,
            href: html_escape::encode_double_quoted_attribute(
                entry.link.as_deref().unwrap_or(&entry.route),
            )
            .into_owned(),
            title: &entry.title,
            description: entry.description.as_deref(),
            icon,
            icon_src: icon.filter(|i| is_image_reference(i)),
            date: entry.date_label(),
            archived: entry.is_archived,
        }
    }
}

/// Icons are either a glyph (an emoji) or a path to an image.
fn is_image_reference(icon: &str) -> bool {
    icon.contains('/') || icon.contains('.')
}

#[derive(Debug, Serialize)]
struct PostView<'a> {
    route: &'a str,
    title: &'a str,
    date: Option<String>,
    datetime: Option<String>,
    archived: bool,
}

/// Composes the route index and the element overrides into pages.
pub struct RouteRenderer<'a> {
    layout: &'a Layout,
    style: &'a StyleConfig,
}

impl<'a> RouteRenderer<'a> {
    pub fn new(layout: &'a Layout, style: &'a StyleConfig) -> Self {
        Self { layout, style }
    }

    /// The listing page, entries in index order.
    pub fn render_index_page(&self, index: &RouteIndex) -> Result<Page, TemplateError> {
        let entries: Vec<IndexItem<'_>> = index.iter().map(IndexItem::new).collect();

        let mut context = Context::new();
        context.insert("entries", &entries);

        Ok(Page {
            route: "/".to_string(),
            html: self.layout.render(INDEX_TEMPLATE, &context)?,
        })
    }

    pub fn render_document(
        &self,
        document: &Document,
        registry: &ElementOverrideRegistry,
    ) -> Result<Page, TemplateError> {
        let content = registry.render_html(&document.elements(), self.style);
        let entry = RouteIndexEntry::from_document(document);
        let post = PostView {
            route: &entry.route,
            title: &entry.title,
            date: entry.date_label(),
            datetime: entry.publish_date.map(|d| d.to_string()),
            archived: entry.is_archived,
        };

        let mut context = Context::new();
        context.insert("page", &post);
        context.insert("page_content", &content);

        Ok(Page {
            route: document.route().to_string(),
            html: self.layout.render(POST_TEMPLATE, &context)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::scanner::{ContentIndexer, MemorySource};
    use crate::weather::TemperatureDisplay;

    fn layout(style: &StyleConfig) -> Layout {
        let mut layout = Layout::builtin().unwrap();
        layout.set_global("site", &SiteConfig::default());
        layout.set_global("style", style);
        layout.set_global("temperature", &TemperatureDisplay::Loading.to_string());
        layout
    }

    fn source() -> MemorySource {
        MemorySource::new()
            .add(
                "b-news.md",
                "+++\ntitle = \"South African News\"\ndescription = \"Ad-free news\"\n+++\n",
            )
            .add(
                "a-gate.md",
                "+++\ntitle = \"https-gate\"\narchived = true\npublish_date = 2020-04-02\n+++\n",
            )
    }

    #[test]
    fn index_page_keeps_index_order_and_strikes_archived() {
        let style = StyleConfig::default();
        let layout = layout(&style);
        let index = ContentIndexer::new(source()).build_index().unwrap();

        let page = RouteRenderer::new(&layout, &style).render_index_page(&index).unwrap();
        assert_eq!(page.route, "/");

        let gate = page.html.find("https-gate").unwrap();
        let news = page.html.find("South African News").unwrap();
        assert!(gate < news);

        assert_eq!(page.html.matches("line-through").count(), 1);
        assert!(page.html.contains("2020 / 4 / 2"));
        assert!(page.html.contains("Ad-free news"));
        assert!(page.html.contains("href=\"/a-gate\""));
    }

    #[test]
    fn index_entry_with_link_points_off_site() {
        let style = StyleConfig::default();
        let layout = layout(&style);
        let index = ContentIndexer::new(MemorySource::new().add(
            "news.md",
            "+++\ntitle = \"South African News\"\nlink = \"https://southafricanne.ws/?a=1&b=2\"\n+++\n",
        ))
        .build_index()
        .unwrap();

        let page = RouteRenderer::new(&layout, &style).render_index_page(&index).unwrap();
        assert!(page.html.contains("href=\"https://southafricanne.ws/?a=1&amp;b=2\""));
        assert!(!page.html.contains("href=\"/news\""));
    }

    #[test]
    fn document_page_wraps_rendered_body() {
        let style = StyleConfig::default();
        let layout = layout(&style);
        let documents = ContentIndexer::new(
            MemorySource::new().add("hello.md", "+++\ntitle = \"Hello\"\n+++\n## Section\n\nText.\n"),
        )
        .discover()
        .unwrap();
        let registry = ElementOverrideRegistry::site().unwrap();

        let page = RouteRenderer::new(&layout, &style)
            .render_document(&documents[0], &registry)
            .unwrap();

        assert_eq!(page.route, "/hello");
        assert!(page.html.contains("<title>Hello · Kieran Hunt</title>"));
        assert!(page.html.contains("<h2 id=\"section\" class=\"font-semibold text-2xl text-teal-400"));
        assert!(page.html.contains("<p class=\"mb-6\">Text.</p>"));
    }
}

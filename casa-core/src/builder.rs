use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, SiteConfig, StyleConfig};
use crate::overrides::{ElementOverrideRegistry, RegistryError};
use crate::renderer::RouteRenderer;
use crate::scanner::{ContentIndexer, FsSource, IndexError};
use crate::seasonal::{PictureView, Season};
use crate::site::{Document, Page, RouteIndex};
use crate::template::{Layout, TemplateError};
use crate::weather::TemperatureDisplay;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Source directory not specified")]
    MissingSourceDir,
    #[error("{} resolves to /, which is reserved for the index page", .0.display())]
    ReservedRoute(PathBuf),
    #[error("route {0} would be written outside the output directory")]
    UnsafeRoute(String),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct SiteBuilder {
    source_dir: Option<PathBuf>,
    output_dir: PathBuf,
    theme_dir: PathBuf,
    site: SiteConfig,
    style: StyleConfig,
    today: Option<NaiveDate>,
    parallel: bool,
}

impl Default for SiteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteBuilder {
    pub fn new() -> Self {
        Self {
            source_dir: None,
            output_dir: PathBuf::from("./out"),
            theme_dir: PathBuf::from("./theme"),
            site: SiteConfig::default(),
            style: StyleConfig::default(),
            today: None,
            parallel: false,
        }
    }

    // Required configuration
    pub fn source_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source_dir = Some(path.as_ref().to_path_buf());
        self
    }

    // Optional paths
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn theme_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.theme_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn site_config(mut self, config: SiteConfig) -> Self {
        self.site = config;
        self
    }

    pub fn style(mut self, style: StyleConfig) -> Self {
        self.style = style;
        self
    }

    /// The build date, used to pick the seasonal picture.
    pub fn today(mut self, date: NaiveDate) -> Self {
        self.today = Some(date);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Discover content and prepare everything needed to render it.
    pub fn build(self) -> Result<Site, BuildError> {
        let source_dir = self.source_dir.ok_or(BuildError::MissingSourceDir)?;
        self.style.validate()?;

        let documents = ContentIndexer::new(FsSource::new(&source_dir))
            .parallel(self.parallel)
            .discover()?;
        if let Some(document) = documents.iter().find(|d| d.route() == "/") {
            return Err(BuildError::ReservedRoute(document.path.clone()));
        }
        let index = RouteIndex::from_documents(&documents);

        let mut layout = Layout::new(&self.theme_dir)?;
        layout.set_global("site", &self.site);
        layout.set_global("style", &self.style);
        layout.set_global("temperature", &TemperatureDisplay::Loading.to_string());
        if let Some(pictures) = &self.site.pictures {
            let season = self.today.map(Season::for_date).unwrap_or(Season::Default);
            layout.set_global("picture", &PictureView::new(pictures, season));
        }

        Ok(Site {
            documents,
            index,
            registry: ElementOverrideRegistry::site()?,
            layout,
            style: self.style,
            output_dir: self.output_dir,
        })
    }
}

pub struct Site {
    documents: Vec<Document>,
    index: RouteIndex,
    registry: ElementOverrideRegistry,
    layout: Layout,
    style: StyleConfig,
    output_dir: PathBuf,
}

impl Site {
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn index(&self) -> &RouteIndex {
        &self.index
    }

    fn renderer(&self) -> RouteRenderer<'_> {
        RouteRenderer::new(&self.layout, &self.style)
    }

    /// Render every page without touching the filesystem.
    pub fn render_pages(&self) -> Result<Vec<Page>, TemplateError> {
        let renderer = self.renderer();
        let mut pages = vec![renderer.render_index_page(&self.index)?];

        // documents are independent of each other, so render them side by side
        let documents: Vec<Page> = self
            .documents
            .par_iter()
            .map(|document| renderer.render_document(document, &self.registry))
            .collect::<Result<_, _>>()?;
        pages.extend(documents);

        Ok(pages)
    }

    pub fn render_all(&self) -> Result<Vec<PathBuf>, BuildError> {
        std::fs::create_dir_all(&self.output_dir)?;

        let mut written = Vec::new();
        for page in self.render_pages()? {
            let relative = page
                .out_path()
                .ok_or_else(|| BuildError::UnsafeRoute(page.route.clone()))?;
            let output_path = self.output_dir.join(relative);
            if let Some(parent) = output_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&output_path, &page.html)?;
            debug!(route = %page.route, path = %output_path.display(), "Wrote page");
            written.push(output_path);
        }

        info!(pages = written.len(), out = %self.output_dir.display(), "Site rendered");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Metadata;

    fn document(route: &str) -> Document {
        Document {
            path: PathBuf::from("escape.md"),
            metadata: Metadata {
                title: "Escape".into(),
                publish_date: None,
                icon: None,
                route: route.into(),
                description: None,
                link: None,
                archived: false,
            },
            body: "Nothing to see.\n".into(),
        }
    }

    #[test]
    fn render_all_refuses_routes_outside_output_dir() {
        let root = tempfile::tempdir().unwrap();
        let output_dir = root.path().join("out");
        let documents = vec![document("/../../escaped")];
        let site = Site {
            index: RouteIndex::from_documents(&documents),
            documents,
            registry: ElementOverrideRegistry::site().unwrap(),
            layout: {
                let mut layout = Layout::builtin().unwrap();
                layout.set_global("site", &SiteConfig::default());
                layout.set_global("style", &StyleConfig::default());
                layout.set_global("temperature", &TemperatureDisplay::Loading.to_string());
                layout
            },
            style: StyleConfig::default(),
            output_dir,
        };

        let err = site.render_all().unwrap_err();
        assert!(matches!(err, BuildError::UnsafeRoute(route) if route == "/../../escaped"));
        assert!(!root.path().join("escaped").exists());
    }
}

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::metadata::{MetadataError, extract, split_front_matter};
use crate::site::{Document, RouteIndex};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("{}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("duplicate route {route}: {} and {}", first.display(), second.display())]
    DuplicateRoute {
        route: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// A raw document as handed over by a [`ContentSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Stable path, relative to the source root.
    pub path: PathBuf,
    pub text: String,
}

/// Anything that can enumerate content documents.
pub trait ContentSource {
    /// Prefix stripped from document paths when deriving routes.
    fn content_root(&self) -> &Path {
        Path::new("")
    }

    fn documents(&self) -> Result<Vec<SourceDocument>, IndexError>;
}

/// Markdown files below a directory.
pub struct FsSource {
    source_dir: PathBuf,
    extensions: Vec<String>,
}

impl FsSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            source_dir: path.as_ref().to_path_buf(),
            extensions: vec!["md".into(), "mdx".into()],
        }
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    fn is_content(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| self.extensions.iter().any(|e| ext == e.as_str()))
            .unwrap_or(false)
    }
}

impl ContentSource for FsSource {
    fn documents(&self) -> Result<Vec<SourceDocument>, IndexError> {
        info!("Scanning: {}", self.source_dir.display());

        let mut documents = Vec::new();
        for entry in WalkDir::new(&self.source_dir).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || !self.is_content(path) {
                continue;
            }

            let relative = path
                .strip_prefix(&self.source_dir)
                .unwrap_or(path)
                .to_path_buf();
            let text = std::fs::read_to_string(path).map_err(|source| IndexError::Read {
                path: relative.clone(),
                source,
            })?;
            documents.push(SourceDocument {
                path: relative,
                text,
            });
        }

        Ok(documents)
    }
}

/// Documents held in memory, keyed by their would-be paths.
#[derive(Debug, Default)]
pub struct MemorySource {
    root: PathBuf,
    documents: Vec<SourceDocument>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.root = root.as_ref().to_path_buf();
        self
    }

    pub fn add<P: AsRef<Path>, S: Into<String>>(mut self, path: P, text: S) -> Self {
        self.documents.push(SourceDocument {
            path: path.as_ref().to_path_buf(),
            text: text.into(),
        });
        self
    }
}

impl ContentSource for MemorySource {
    fn content_root(&self) -> &Path {
        &self.root
    }

    fn documents(&self) -> Result<Vec<SourceDocument>, IndexError> {
        Ok(self.documents.clone())
    }
}

/// Turns a content source into an ordered route index.
///
/// Every call recomputes everything from the source; nothing is carried
/// between builds.
pub struct ContentIndexer<S> {
    source: S,
    parallel: bool,
}

impl<S: ContentSource> ContentIndexer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            parallel: false,
        }
    }

    /// Extract metadata on the rayon pool. Output order and duplicate
    /// detection are unaffected.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// All documents in lexicographic path order, with unique routes.
    pub fn discover(&self) -> Result<Vec<Document>, IndexError> {
        let mut sources = self.source.documents()?;
        sources.sort_by(|a, b| a.path.cmp(&b.path));

        let root = self.source.content_root();
        let mut documents = if self.parallel {
            // report the first failure in path order, not the first to finish
            let loaded: Vec<Result<Document, MetadataError>> = sources
                .par_iter()
                .map(|s| load_document(s, root))
                .collect();
            loaded.into_iter().collect::<Result<Vec<_>, _>>()?
        } else {
            sources
                .iter()
                .map(|s| load_document(s, root))
                .collect::<Result<Vec<_>, _>>()?
        };
        // rayon keeps indexed order already; this pins the contract down
        documents.sort_by(|a, b| a.path.cmp(&b.path));

        check_unique_routes(&documents)?;
        info!(count = documents.len(), "Discovered documents");

        Ok(documents)
    }

    pub fn build_index(&self) -> Result<RouteIndex, IndexError> {
        let documents = self.discover()?;
        Ok(RouteIndex::from_documents(&documents))
    }
}

fn load_document(source: &SourceDocument, root: &Path) -> Result<Document, MetadataError> {
    let (block, body) = split_front_matter(&source.text, &source.path)?;
    let metadata = extract(block, &source.path, root)?;
    debug!(path = %source.path.display(), route = %metadata.route, "Extracted metadata");

    Ok(Document {
        path: source.path.clone(),
        metadata,
        body: body.to_string(),
    })
}

fn check_unique_routes(documents: &[Document]) -> Result<(), IndexError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(documents.len());
    for (i, document) in documents.iter().enumerate() {
        if !seen.insert(document.route()) {
            let first = documents[..i]
                .iter()
                .find(|d| d.route() == document.route())
                .map(|d| d.path.clone())
                .unwrap_or_default();
            return Err(IndexError::DuplicateRoute {
                route: document.route().to_string(),
                first,
                second: document.path.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &str) -> String {
        format!("+++\ntitle = \"{title}\"\n+++\nBody of {title}\n")
    }

    #[test]
    fn unreadable_file_is_named_in_the_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.md"), doc("Good")).unwrap();
        std::fs::write(dir.path().join("latin1.md"), b"+++\ntitle = \"caf\xe9\"\n+++\n").unwrap();

        let err = ContentIndexer::new(FsSource::new(dir.path()))
            .build_index()
            .unwrap_err();
        match &err {
            IndexError::Read { path, .. } => assert_eq!(path, Path::new("latin1.md")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("latin1.md: "));
    }

    #[test]
    fn hello_scenario() {
        let source = MemorySource::new()
            .with_root("posts")
            .add("posts/2020/hello/index.doc", doc("Hello"));
        let index = ContentIndexer::new(source).build_index().unwrap();

        assert_eq!(index.len(), 1);
        let entry = &index.entries()[0];
        assert_eq!(entry.route, "/2020/hello");
        assert_eq!(entry.title, "Hello");
    }

    #[test]
    fn duplicate_route_fails() {
        let source = MemorySource::new()
            .add("a.md", doc("First"))
            .add("a/index.md", doc("Second"));
        let err = ContentIndexer::new(source).build_index().unwrap_err();

        match err {
            IndexError::DuplicateRoute {
                route,
                first,
                second,
            } => {
                assert_eq!(route, "/a");
                // `a` sorts before `a.md`, component by component
                assert_eq!(first, PathBuf::from("a/index.md"));
                assert_eq!(second, PathBuf::from("a.md"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn explicit_route_can_collide_too() {
        let source = MemorySource::new()
            .add("one.md", doc("One"))
            .add("two.md", "+++\ntitle = \"Two\"\nroute = \"/one\"\n+++\n");
        let err = ContentIndexer::new(source).build_index().unwrap_err();
        assert!(matches!(err, IndexError::DuplicateRoute { ref route, .. } if route == "/one"));
    }

    #[test]
    fn order_is_lexicographic_by_path_not_insertion() {
        let source = MemorySource::new()
            .add("b.md", doc("B"))
            .add("a/z.md", doc("AZ"))
            .add("a.md", doc("A"));
        let index = ContentIndexer::new(source).build_index().unwrap();
        let routes: Vec<&str> = index.iter().map(|e| e.route.as_str()).collect();
        assert_eq!(routes, vec!["/a/z", "/a", "/b"]);
    }

    #[test]
    fn broken_document_aborts_the_build() {
        let source = MemorySource::new()
            .add("good.md", doc("Good"))
            .add("bad.md", "+++\nicon = \"x\"\n+++\n");
        let err = ContentIndexer::new(source).build_index().unwrap_err();
        assert!(matches!(
            err,
            IndexError::Metadata(MetadataError::MissingTitle { .. })
        ));
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut source = MemorySource::new();
        for i in (0..40).rev() {
            source = source.add(format!("post-{i:02}.md"), doc(&format!("Post {i}")));
        }
        let indexer = ContentIndexer::new(source);
        let sequential = indexer.build_index().unwrap();
        let parallel = ContentIndexer { parallel: true, ..indexer }.build_index().unwrap();

        assert_eq!(sequential, parallel);
        assert_eq!(sequential.len(), 40);
    }

    #[test]
    fn repeated_builds_are_identical() {
        let source = MemorySource::new()
            .add("x.md", doc("X"))
            .add("y/index.md", doc("Y"));
        let indexer = ContentIndexer::new(source);
        assert_eq!(indexer.build_index().unwrap(), indexer.build_index().unwrap());
    }
}

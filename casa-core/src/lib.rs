pub mod builder;
pub mod config;
pub mod highlight;
pub mod markdown;
pub mod metadata;
pub mod overrides;
pub mod renderer;
pub mod scanner;
pub mod seasonal;
pub mod site;
pub mod template;
pub mod weather;

// Re-export main types
pub use builder::{BuildError, Site, SiteBuilder};
pub use highlight::{HighlightResult, Highlighter, highlight};
pub use markdown::{ElementKind, ElementNode, parse_elements};
pub use metadata::Metadata;
pub use overrides::ElementOverrideRegistry;
pub use renderer::RouteRenderer;
pub use scanner::{ContentIndexer, ContentSource, FsSource, IndexError, MemorySource};
pub use site::{Document, Page, RouteIndex, RouteIndexEntry};
pub use template::{Layout, TemplateError};

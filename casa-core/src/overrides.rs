//! Per-element-kind rendering overrides.
//!
//! An [`ElementOverrideRegistry`] maps every [`ElementKind`] to a
//! [`Transform`]. Kinds without a registration render through
//! [`passthrough`], plain HTML with no styling, so an unstyled element can
//! never stop a document from rendering.

use std::collections::{HashMap, HashSet};
use std::fmt;

use thiserror::Error;

use crate::config::StyleConfig;
use crate::highlight::Highlighter;
use crate::markdown::{ElementKind, ElementNode, plain_text, slugify};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("more than one transform registered for {0:?}")]
    Collision(ElementKind),
}

/// Everything a transform may look at.
pub struct Element<'a> {
    pub node: &'a ElementNode,
    /// The node's children, already rendered in document order.
    pub inner: &'a str,
    pub style: &'a StyleConfig,
    pub highlighter: &'a Highlighter,
    /// Kinds of the enclosing nodes, outermost first.
    pub ancestors: &'a [ElementKind],
    /// Unique id for headings within the document.
    pub anchor: Option<&'a str>,
}

impl Element<'_> {
    pub fn parent(&self) -> Option<ElementKind> {
        self.ancestors.last().copied()
    }

    pub fn within(&self, kind: ElementKind) -> bool {
        self.ancestors.contains(&kind)
    }
}

/// A pure mapping from an element to its HTML.
pub type Transform = fn(&Element<'_>) -> String;

/// Rendered output of one top-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment(String);

impl Fragment {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    transforms: HashMap<ElementKind, Transform>,
}

impl RegistryBuilder {
    pub fn register(mut self, kind: ElementKind, transform: Transform) -> Result<Self, RegistryError> {
        if self.transforms.insert(kind, transform).is_some() {
            return Err(RegistryError::Collision(kind));
        }
        Ok(self)
    }

    pub fn register_all(self, kinds: &[ElementKind], transform: Transform) -> Result<Self, RegistryError> {
        kinds
            .iter()
            .try_fold(self, |builder, &kind| builder.register(kind, transform))
    }

    pub fn build(self) -> ElementOverrideRegistry {
        ElementOverrideRegistry {
            transforms: self.transforms,
        }
    }
}

/// Immutable once built; one registry can render any number of documents.
#[derive(Default)]
pub struct ElementOverrideRegistry {
    transforms: HashMap<ElementKind, Transform>,
}

impl ElementOverrideRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// A registry with no overrides; everything renders unstyled.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The site's own look: accent headings on a decreasing spacing scale,
    /// striped tables, highlighted code and dotted-underline links.
    pub fn site() -> Result<Self, RegistryError> {
        use ElementKind::*;

        Ok(Self::builder()
            .register_all(&[Heading1, Heading2, Heading3, Heading4, Heading5, Heading6], styled::heading)?
            .register(Paragraph, styled::paragraph)?
            .register(Table, styled::table)?
            .register(TableHead, styled::table_head)?
            .register(TableBody, styled::table_body)?
            .register(TableRow, styled::table_row)?
            .register(TableHeaderCell, styled::table_header_cell)?
            .register(TableDataCell, styled::table_data_cell)?
            .register_all(&[OrderedList, UnorderedList], styled::list)?
            .register(BlockQuote, styled::block_quote)?
            .register(InlineCode, styled::inline_code)?
            .register(CodeBlock, styled::code_block)?
            .register(Link, styled::link)?
            .register(Image, styled::image)?
            .build())
    }

    pub fn is_registered(&self, kind: ElementKind) -> bool {
        self.transforms.contains_key(&kind)
    }

    /// Total: unregistered kinds get [`passthrough`].
    pub fn transform_for(&self, kind: ElementKind) -> Transform {
        self.transforms.get(&kind).copied().unwrap_or(passthrough)
    }

    pub fn render(&self, nodes: &[ElementNode], style: &StyleConfig) -> Vec<Fragment> {
        let highlighter = Highlighter::new(&style.syntax_theme);
        let mut walk = Walk::default();
        nodes
            .iter()
            .map(|node| Fragment(self.render_node(node, style, &highlighter, &mut walk)))
            .collect()
    }

    pub fn render_html(&self, nodes: &[ElementNode], style: &StyleConfig) -> String {
        self.render(nodes, style)
            .into_iter()
            .map(Fragment::into_string)
            .collect()
    }

    fn render_node(
        &self,
        node: &ElementNode,
        style: &StyleConfig,
        highlighter: &Highlighter,
        walk: &mut Walk,
    ) -> String {
        let kind = node.kind();
        let anchor = match node {
            ElementNode::Heading { children, .. } => Some(walk.claim_anchor(&plain_text(children))),
            _ => None,
        };

        walk.ancestors.push(kind);
        let inner: String = node
            .children()
            .iter()
            .map(|child| self.render_node(child, style, highlighter, walk))
            .collect();
        walk.ancestors.pop();

        let element = Element {
            node,
            inner: &inner,
            style,
            highlighter,
            ancestors: walk.ancestors.as_slice(),
            anchor: anchor.as_deref(),
        };
        (self.transform_for(kind))(&element)
    }
}

/// Per-document state while rendering.
#[derive(Default)]
struct Walk {
    ancestors: Vec<ElementKind>,
    anchors: HashSet<String>,
}

impl Walk {
    /// Slug of a heading, suffixed `-1`, `-2`, ... when already taken.
    fn claim_anchor(&mut self, text: &str) -> String {
        let slug = slugify(text);
        let mut anchor = slug.clone();
        let mut n = 0;
        while !self.anchors.insert(anchor.clone()) {
            n += 1;
            anchor = format!("{slug}-{n}");
        }
        anchor
    }
}

/// Plain HTML for any element, without classes.
pub fn passthrough(el: &Element<'_>) -> String {
    let inner = el.inner;
    match el.node {
        ElementNode::Heading { level, .. } => {
            let id = el.anchor.unwrap_or_default();
            format!("<h{level} id=\"{id}\">{inner}</h{level}>\n")
        }
        ElementNode::Paragraph(_) => format!("<p>{inner}</p>\n"),
        ElementNode::Table(_) => format!("<table>\n{inner}</table>\n"),
        ElementNode::TableHead(_) => format!("<thead>\n{inner}</thead>\n"),
        ElementNode::TableBody(_) => format!("<tbody>\n{inner}</tbody>\n"),
        ElementNode::TableRow(_) => format!("<tr>\n{inner}</tr>\n"),
        ElementNode::TableHeaderCell(_) => format!("<th>{inner}</th>\n"),
        ElementNode::TableDataCell(_) => format!("<td>{inner}</td>\n"),
        ElementNode::List {
            ordered: true,
            start: Some(start),
            ..
        } if *start != 1 => format!("<ol start=\"{start}\">\n{inner}</ol>\n"),
        ElementNode::List { ordered: true, .. } => format!("<ol>\n{inner}</ol>\n"),
        ElementNode::List { .. } => format!("<ul>\n{inner}</ul>\n"),
        ElementNode::ListItem { checked, .. } => match checked {
            Some(true) => format!("<li><input type=\"checkbox\" checked disabled/> {inner}</li>\n"),
            Some(false) => format!("<li><input type=\"checkbox\" disabled/> {inner}</li>\n"),
            None => format!("<li>{inner}</li>\n"),
        },
        ElementNode::BlockQuote(_) => format!("<blockquote>\n{inner}</blockquote>\n"),
        ElementNode::InlineCode(code) => format!("<code>{}</code>", html_escape::encode_text(code)),
        ElementNode::CodeBlock { language, code } => {
            let class = language
                .as_deref()
                .map(|l| format!(" class=\"language-{}\"", html_escape::encode_double_quoted_attribute(l)))
                .unwrap_or_default();
            format!("<pre><code{class}>{}</code></pre>\n", html_escape::encode_text(code))
        }
        ElementNode::Link { href, title, .. } => format!(
            "<a href=\"{}\"{}>{inner}</a>",
            html_escape::encode_double_quoted_attribute(href),
            title_attr(title.as_deref())
        ),
        ElementNode::Image { src, alt, title } => format!(
            "<img src=\"{}\" alt=\"{}\"{} />",
            html_escape::encode_double_quoted_attribute(src),
            html_escape::encode_double_quoted_attribute(alt),
            title_attr(title.as_deref())
        ),
        ElementNode::Emphasis(_) => format!("<em>{inner}</em>"),
        ElementNode::Strong(_) => format!("<strong>{inner}</strong>"),
        ElementNode::Strikethrough(_) => format!("<del>{inner}</del>"),
        ElementNode::Rule => "<hr />\n".to_string(),
        ElementNode::Text(text) => html_escape::encode_text(text).into_owned(),
        ElementNode::SoftBreak => "\n".to_string(),
        ElementNode::HardBreak => "<br />\n".to_string(),
        ElementNode::Html(html) => html.clone(),
        ElementNode::FootnoteReference(label) => {
            let label = html_escape::encode_text(label);
            format!(
                "<sup class=\"footnote-reference\"><a href=\"#fn-{}\">{label}</a></sup>",
                slugify(&label)
            )
        }
        ElementNode::FootnoteDefinition { label, .. } => format!(
            "<div class=\"footnote-definition\" id=\"fn-{}\"><sup class=\"footnote-definition-label\">{}</sup>\n{inner}</div>\n",
            slugify(label),
            html_escape::encode_text(label)
        ),
    }
}

fn title_attr(title: Option<&str>) -> String {
    title
        .map(|t| format!(" title=\"{}\"", html_escape::encode_double_quoted_attribute(t)))
        .unwrap_or_default()
}

fn spacer(height: u8) -> String {
    if height == 0 {
        return String::new();
    }
    format!("<div class=\"h-{height}\"></div>")
}

mod styled {
    use super::{Element, passthrough, spacer, title_attr};
    use crate::markdown::{ElementKind, ElementNode};

    pub(super) fn heading(el: &Element<'_>) -> String {
        let ElementNode::Heading { level, .. } = el.node else {
            return passthrough(el);
        };
        let accent = &el.style.accent;
        let size = match level {
            1 => "font-bold text-4xl",
            2 => "font-semibold text-2xl",
            3 => "font-semibold text-xl",
            4 => "font-semibold",
            5 => "font",
            _ => "font text-sm",
        };
        let space = el.style.heading_space(*level);
        let id = el.anchor.unwrap_or_default();

        format!(
            "{}<h{level} id=\"{id}\" class=\"{size} text-{accent} tracking-wide\">{}</h{level}>{}\n",
            spacer(space),
            el.inner,
            spacer(space / 2)
        )
    }

    pub(super) fn paragraph(el: &Element<'_>) -> String {
        // tight spacing inside list items
        if el.within(ElementKind::ListItem) {
            return format!("<p>{}</p>\n", el.inner);
        }
        format!("<p class=\"mb-6\">{}</p>\n", el.inner)
    }

    pub(super) fn table(el: &Element<'_>) -> String {
        format!(
            "<div class=\"shadow rounded overflow-hidden border-b border-gray-200\">\n\
             <table class=\"min-w-full bg-white\">\n{}</table>\n</div>{}\n",
            el.inner,
            spacer(el.style.block_spacing)
        )
    }

    pub(super) fn table_head(el: &Element<'_>) -> String {
        format!(
            "<thead class=\"subpixel-antialiased bg-{} text-white py-3 px-4\">\n{}</thead>\n",
            el.style.table_header_background, el.inner
        )
    }

    pub(super) fn table_body(el: &Element<'_>) -> String {
        format!("<tbody class=\"text-gray-700\">\n{}</tbody>\n", el.inner)
    }

    pub(super) fn table_row(el: &Element<'_>) -> String {
        // header rows sit on the dark head background, no zebra striping
        if el.parent() == Some(ElementKind::TableHead) {
            return format!("<tr>\n{}</tr>\n", el.inner);
        }
        format!("<tr class=\"even:bg-gray-100\">\n{}</tr>\n", el.inner)
    }

    pub(super) fn table_header_cell(el: &Element<'_>) -> String {
        format!(
            "<th class=\"text-left py-3 px-4 uppercase font-semibold text-sm\">{}</th>\n",
            el.inner
        )
    }

    pub(super) fn table_data_cell(el: &Element<'_>) -> String {
        format!("<td class=\"py-3 px-4\">{}</td>\n", el.inner)
    }

    pub(super) fn list(el: &Element<'_>) -> String {
        let ElementNode::List { ordered, start, .. } = el.node else {
            return passthrough(el);
        };
        let indent = &el.style.list_indent;
        if *ordered {
            let start = start
                .filter(|s| *s != 1)
                .map(|s| format!(" start=\"{s}\""))
                .unwrap_or_default();
            format!("<ol class=\"list-decimal {indent}\"{start}>\n{}</ol>\n", el.inner)
        } else {
            format!("<ul class=\"list-disc {indent}\">\n{}</ul>\n", el.inner)
        }
    }

    pub(super) fn block_quote(el: &Element<'_>) -> String {
        format!(
            "<div class=\"border-l-8 border-{} pl-4 italic\">\n<blockquote class=\"text-gray-800\">\n{}</blockquote>\n</div>\n",
            el.style.accent, el.inner
        )
    }

    pub(super) fn inline_code(el: &Element<'_>) -> String {
        let ElementNode::InlineCode(code) = el.node else {
            return passthrough(el);
        };
        format!(
            "<code class=\"bg-{} px-1 py-1 rounded font-mono text-{}\">{}</code>",
            el.style.code_background,
            el.style.code_text,
            html_escape::encode_text(code)
        )
    }

    pub(super) fn code_block(el: &Element<'_>) -> String {
        let ElementNode::CodeBlock { language, code } = el.node else {
            return passthrough(el);
        };
        let language = language.as_deref();
        let highlighted = el.highlighter.highlight(code, language);
        let space = spacer(el.style.block_spacing);

        format!("{space}{}{space}\n", highlighted.to_html(language))
    }

    pub(super) fn link(el: &Element<'_>) -> String {
        let ElementNode::Link { href, title, .. } = el.node else {
            return passthrough(el);
        };
        let accent = &el.style.accent;
        format!(
            "<a href=\"{}\"{} class=\"inline-block border-b border-dotted border-{accent} hover:text-{accent}\">{}</a>",
            html_escape::encode_double_quoted_attribute(href),
            title_attr(title.as_deref()),
            el.inner
        )
    }

    pub(super) fn image(el: &Element<'_>) -> String {
        let ElementNode::Image { src, alt, title } = el.node else {
            return passthrough(el);
        };
        let space = spacer(el.style.block_spacing);
        format!(
            "{space}<img src=\"{}\" alt=\"{}\"{} class=\"shadow rounded min-w-full\" />{space}",
            html_escape::encode_double_quoted_attribute(src),
            html_escape::encode_double_quoted_attribute(alt),
            title_attr(title.as_deref())
        )
    }
}

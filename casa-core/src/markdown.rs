use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

/// A node of a parsed document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementNode {
    Heading { level: u8, children: Vec<ElementNode> },
    Paragraph(Vec<ElementNode>),
    /// Children are a [`ElementNode::TableHead`] and, when the table has
    /// rows, a [`ElementNode::TableBody`].
    Table(Vec<ElementNode>),
    TableHead(Vec<ElementNode>),
    TableBody(Vec<ElementNode>),
    TableRow(Vec<ElementNode>),
    TableHeaderCell(Vec<ElementNode>),
    TableDataCell(Vec<ElementNode>),
    List { start: Option<u64>, ordered: bool, items: Vec<ElementNode> },
    ListItem { checked: Option<bool>, children: Vec<ElementNode> },
    BlockQuote(Vec<ElementNode>),
    InlineCode(String),
    CodeBlock { language: Option<String>, code: String },
    Link { href: String, title: Option<String>, children: Vec<ElementNode> },
    Image { src: String, alt: String, title: Option<String> },
    Emphasis(Vec<ElementNode>),
    Strong(Vec<ElementNode>),
    Strikethrough(Vec<ElementNode>),
    Rule,
    Text(String),
    SoftBreak,
    HardBreak,
    Html(String),
    /// A `[^label]` marker in running text.
    FootnoteReference(String),
    FootnoteDefinition { label: String, children: Vec<ElementNode> },
}

/// The structural category of an [`ElementNode`], used to key overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Paragraph,
    Table,
    TableHead,
    TableBody,
    TableRow,
    TableHeaderCell,
    TableDataCell,
    OrderedList,
    UnorderedList,
    ListItem,
    BlockQuote,
    InlineCode,
    CodeBlock,
    Link,
    Image,
    Emphasis,
    Strong,
    Strikethrough,
    Rule,
    Text,
    SoftBreak,
    HardBreak,
    Html,
    FootnoteReference,
    FootnoteDefinition,
}

impl ElementKind {
    pub const ALL: [ElementKind; 31] = [
        ElementKind::Heading1,
        ElementKind::Heading2,
        ElementKind::Heading3,
        ElementKind::Heading4,
        ElementKind::Heading5,
        ElementKind::Heading6,
        ElementKind::Paragraph,
        ElementKind::Table,
        ElementKind::TableHead,
        ElementKind::TableBody,
        ElementKind::TableRow,
        ElementKind::TableHeaderCell,
        ElementKind::TableDataCell,
        ElementKind::OrderedList,
        ElementKind::UnorderedList,
        ElementKind::ListItem,
        ElementKind::BlockQuote,
        ElementKind::InlineCode,
        ElementKind::CodeBlock,
        ElementKind::Link,
        ElementKind::Image,
        ElementKind::Emphasis,
        ElementKind::Strong,
        ElementKind::Strikethrough,
        ElementKind::Rule,
        ElementKind::Text,
        ElementKind::SoftBreak,
        ElementKind::HardBreak,
        ElementKind::Html,
        ElementKind::FootnoteReference,
        ElementKind::FootnoteDefinition,
    ];

    pub fn heading(level: u8) -> Self {
        match level {
            0 | 1 => ElementKind::Heading1,
            2 => ElementKind::Heading2,
            3 => ElementKind::Heading3,
            4 => ElementKind::Heading4,
            5 => ElementKind::Heading5,
            _ => ElementKind::Heading6,
        }
    }
}

impl ElementNode {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementNode::Heading { level, .. } => ElementKind::heading(*level),
            ElementNode::Paragraph(_) => ElementKind::Paragraph,
            ElementNode::Table(_) => ElementKind::Table,
            ElementNode::TableHead(_) => ElementKind::TableHead,
            ElementNode::TableBody(_) => ElementKind::TableBody,
            ElementNode::TableRow(_) => ElementKind::TableRow,
            ElementNode::TableHeaderCell(_) => ElementKind::TableHeaderCell,
            ElementNode::TableDataCell(_) => ElementKind::TableDataCell,
            ElementNode::List { ordered: true, .. } => ElementKind::OrderedList,
            ElementNode::List { ordered: false, .. } => ElementKind::UnorderedList,
            ElementNode::ListItem { .. } => ElementKind::ListItem,
            ElementNode::BlockQuote(_) => ElementKind::BlockQuote,
            ElementNode::InlineCode(_) => ElementKind::InlineCode,
            ElementNode::CodeBlock { .. } => ElementKind::CodeBlock,
            ElementNode::Link { .. } => ElementKind::Link,
            ElementNode::Image { .. } => ElementKind::Image,
            ElementNode::Emphasis(_) => ElementKind::Emphasis,
            ElementNode::Strong(_) => ElementKind::Strong,
            ElementNode::Strikethrough(_) => ElementKind::Strikethrough,
            ElementNode::Rule => ElementKind::Rule,
            ElementNode::Text(_) => ElementKind::Text,
            ElementNode::SoftBreak => ElementKind::SoftBreak,
            ElementNode::HardBreak => ElementKind::HardBreak,
            ElementNode::Html(_) => ElementKind::Html,
            ElementNode::FootnoteReference(_) => ElementKind::FootnoteReference,
            ElementNode::FootnoteDefinition { .. } => ElementKind::FootnoteDefinition,
        }
    }

    pub fn children(&self) -> &[ElementNode] {
        match self {
            ElementNode::Heading { children, .. }
            | ElementNode::ListItem { children, .. }
            | ElementNode::FootnoteDefinition { children, .. }
            | ElementNode::Link { children, .. } => children,
            ElementNode::List { items, .. } => items,
            ElementNode::Paragraph(c)
            | ElementNode::Table(c)
            | ElementNode::TableHead(c)
            | ElementNode::TableBody(c)
            | ElementNode::TableRow(c)
            | ElementNode::TableHeaderCell(c)
            | ElementNode::TableDataCell(c)
            | ElementNode::BlockQuote(c)
            | ElementNode::Emphasis(c)
            | ElementNode::Strong(c)
            | ElementNode::Strikethrough(c) => c,
            _ => &[],
        }
    }

    /// Text content with all markup dropped.
    pub fn plain_text(&self) -> String {
        match self {
            ElementNode::Text(s) | ElementNode::InlineCode(s) => s.clone(),
            ElementNode::CodeBlock { code, .. } => code.clone(),
            ElementNode::Image { alt, .. } => alt.clone(),
            ElementNode::SoftBreak | ElementNode::HardBreak => " ".to_string(),
            ElementNode::FootnoteReference(_) => String::new(),
            other => plain_text(other.children()),
        }
    }
}

pub fn plain_text(nodes: &[ElementNode]) -> String {
    nodes.iter().map(ElementNode::plain_text).collect()
}

pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Open container while walking the event stream.
enum Frame {
    Heading(u8),
    Paragraph,
    Table,
    TableHead,
    TableRow,
    TableCell,
    List(Option<u64>),
    Item,
    BlockQuote,
    CodeBlock(Option<String>),
    Emphasis,
    Strong,
    Strikethrough,
    Link { href: String, title: Option<String> },
    Image { src: String, title: Option<String> },
    Footnote(String),
    /// Containers the tree does not model; their children are spliced into
    /// the parent.
    Transparent,
}

struct Open {
    frame: Frame,
    children: Vec<ElementNode>,
    text: String,
    checked: Option<bool>,
}

impl Open {
    fn new(frame: Frame) -> Self {
        Self {
            frame,
            children: Vec::new(),
            text: String::new(),
            checked: None,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn frame_for(tag: Tag<'_>) -> Frame {
    match tag {
        Tag::Heading { level, .. } => Frame::Heading(level as u8),
        Tag::Paragraph => Frame::Paragraph,
        Tag::Table(_) => Frame::Table,
        Tag::TableHead => Frame::TableHead,
        Tag::TableRow => Frame::TableRow,
        Tag::TableCell => Frame::TableCell,
        Tag::List(start) => Frame::List(start),
        Tag::Item => Frame::Item,
        Tag::BlockQuote(_) => Frame::BlockQuote,
        Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
            let language = info.split_whitespace().next().and_then(non_empty);
            Frame::CodeBlock(language)
        }
        Tag::CodeBlock(CodeBlockKind::Indented) => Frame::CodeBlock(None),
        Tag::Emphasis => Frame::Emphasis,
        Tag::Strong => Frame::Strong,
        Tag::Strikethrough => Frame::Strikethrough,
        Tag::Link {
            dest_url, title, ..
        } => Frame::Link {
            href: dest_url.to_string(),
            title: non_empty(&*title),
        },
        Tag::Image {
            dest_url, title, ..
        } => Frame::Image {
            src: dest_url.to_string(),
            title: non_empty(&*title),
        },
        Tag::FootnoteDefinition(label) => Frame::Footnote(label.to_string()),
        _ => Frame::Transparent,
    }
}

/// Parse a markdown body into element nodes.
pub fn parse_elements(source: &str) -> Vec<ElementNode> {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES;
    let parser = Parser::new_ext(source, options);

    let mut root: Vec<ElementNode> = Vec::new();
    let mut stack: Vec<Open> = Vec::new();

    for event in parser {
        match event {
            Event::Start(tag) => stack.push(Open::new(frame_for(tag))),
            Event::End(_) => {
                let Some(open) = stack.pop() else { continue };
                let in_head = matches!(stack.last(), Some(Open { frame: Frame::TableHead, .. }));
                close(open, in_head, stack.last_mut().map(|o| &mut o.children).unwrap_or(&mut root));
            }
            Event::Text(text) => match stack.last_mut() {
                Some(open) if matches!(open.frame, Frame::CodeBlock(_)) => open.text.push_str(&text),
                Some(open) => push_text(&mut open.children, &text),
                None => push_text(&mut root, &text),
            },
            Event::Code(code) => push(&mut stack, &mut root, ElementNode::InlineCode(code.to_string())),
            Event::Html(html) | Event::InlineHtml(html) => {
                push(&mut stack, &mut root, ElementNode::Html(html.to_string()))
            }
            Event::SoftBreak => push(&mut stack, &mut root, ElementNode::SoftBreak),
            Event::HardBreak => push(&mut stack, &mut root, ElementNode::HardBreak),
            Event::Rule => push(&mut stack, &mut root, ElementNode::Rule),
            Event::FootnoteReference(label) => push(
                &mut stack,
                &mut root,
                ElementNode::FootnoteReference(label.to_string()),
            ),
            Event::TaskListMarker(checked) => {
                if let Some(open) = stack.iter_mut().rev().find(|o| matches!(o.frame, Frame::Item)) {
                    open.checked = Some(checked);
                }
            }
            _ => {}
        }
    }

    root
}

fn push(stack: &mut [Open], root: &mut Vec<ElementNode>, node: ElementNode) {
    match stack.last_mut() {
        Some(open) => open.children.push(node),
        None => root.push(node),
    }
}

/// Adjacent text events are merged into a single node.
fn push_text(children: &mut Vec<ElementNode>, text: &str) {
    if let Some(ElementNode::Text(last)) = children.last_mut() {
        last.push_str(text);
    } else {
        children.push(ElementNode::Text(text.to_string()));
    }
}

fn close(open: Open, in_table_head: bool, parent: &mut Vec<ElementNode>) {
    let children = open.children;
    let node = match open.frame {
        Frame::Heading(level) => ElementNode::Heading { level, children },
        Frame::Paragraph => ElementNode::Paragraph(children),
        Frame::Table => {
            let (head, rows): (Vec<_>, Vec<_>) = children
                .into_iter()
                .partition(|c| matches!(c, ElementNode::TableHead(_)));
            let mut parts = head;
            if !rows.is_empty() {
                parts.push(ElementNode::TableBody(rows));
            }
            ElementNode::Table(parts)
        }
        // header cells arrive directly under the head, without a row
        Frame::TableHead => ElementNode::TableHead(vec![ElementNode::TableRow(children)]),
        Frame::TableRow => ElementNode::TableRow(children),
        Frame::TableCell if in_table_head => ElementNode::TableHeaderCell(children),
        Frame::TableCell => ElementNode::TableDataCell(children),
        Frame::List(start) => ElementNode::List {
            start,
            ordered: start.is_some(),
            items: children,
        },
        Frame::Item => ElementNode::ListItem {
            checked: open.checked,
            children,
        },
        Frame::BlockQuote => ElementNode::BlockQuote(children),
        Frame::CodeBlock(language) => ElementNode::CodeBlock {
            language,
            code: open.text,
        },
        Frame::Emphasis => ElementNode::Emphasis(children),
        Frame::Strong => ElementNode::Strong(children),
        Frame::Strikethrough => ElementNode::Strikethrough(children),
        Frame::Link { href, title } => ElementNode::Link {
            href,
            title,
            children,
        },
        Frame::Image { src, title } => ElementNode::Image {
            alt: plain_text(&children),
            src,
            title,
        },
        Frame::Footnote(label) => ElementNode::FootnoteDefinition { label, children },
        Frame::Transparent => {
            parent.extend(children);
            return;
        }
    };
    parent.push(node);
}

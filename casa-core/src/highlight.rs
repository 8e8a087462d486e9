//! Syntax highlighting for fenced code blocks.
//!
//! Grammars and themes are syntect's bundled defaults, loaded once per
//! process. A language the grammar set does not know is not an error: the
//! code comes back untouched as [`HighlightResult::Fallback`].

use std::sync::LazyLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, FontStyle, Style, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::{debug, warn};

pub const DEFAULT_THEME: &str = "base16-ocean.dark";

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

pub fn theme_exists(name: &str) -> bool {
    THEME_SET.themes.contains_key(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStyle {
    /// `#rrggbb`
    pub color: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl TokenStyle {
    fn from_syntect(style: Style) -> Self {
        Self {
            color: hex(style.foreground),
            bold: style.font_style.contains(FontStyle::BOLD),
            italic: style.font_style.contains(FontStyle::ITALIC),
            underline: style.font_style.contains(FontStyle::UNDERLINE),
        }
    }

    fn css(&self) -> String {
        let mut css = format!("color:{}", self.color);
        if self.bold {
            css.push_str(";font-weight:bold");
        }
        if self.italic {
            css.push_str(";font-style:italic");
        }
        if self.underline {
            css.push_str(";text-decoration:underline");
        }
        css
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub style: TokenStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightResult {
    Highlighted {
        tokens: Vec<Token>,
        background: Option<String>,
    },
    Fallback {
        text: String,
    },
}

impl HighlightResult {
    pub fn is_fallback(&self) -> bool {
        matches!(self, HighlightResult::Fallback { .. })
    }

    /// The source text, reassembled from tokens when highlighted.
    pub fn text(&self) -> String {
        match self {
            HighlightResult::Highlighted { tokens, .. } => {
                tokens.iter().map(|t| t.text.as_str()).collect()
            }
            HighlightResult::Fallback { text } => text.clone(),
        }
    }

    pub fn to_html(&self, language: Option<&str>) -> String {
        let class = language
            .map(|l| format!(" class=\"language-{}\"", html_escape::encode_double_quoted_attribute(l)))
            .unwrap_or_default();

        match self {
            HighlightResult::Fallback { text } => {
                format!("<pre><code{class}>{}</code></pre>\n", html_escape::encode_text(text))
            }
            HighlightResult::Highlighted { tokens, background } => {
                let mut html = match background {
                    Some(bg) => format!("<pre class=\"highlight\" style=\"background-color:{bg};\">"),
                    None => "<pre class=\"highlight\">".to_string(),
                };
                html.push_str(&format!("<code{class}>"));
                for token in tokens {
                    html.push_str(&format!(
                        "<span style=\"{}\">{}</span>",
                        token.style.css(),
                        html_escape::encode_text(&token.text)
                    ));
                }
                html.push_str("</code></pre>\n");
                html
            }
        }
    }
}

/// Highlights code against one fixed theme.
#[derive(Clone, Copy)]
pub struct Highlighter {
    theme: &'static Theme,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(DEFAULT_THEME)
    }
}

impl Highlighter {
    pub fn new(theme_name: &str) -> Self {
        let theme = match THEME_SET.themes.get(theme_name) {
            Some(theme) => theme,
            None => {
                warn!(theme = theme_name, "Unknown syntax theme, using {DEFAULT_THEME}");
                &THEME_SET.themes[DEFAULT_THEME]
            }
        };
        Self { theme }
    }

    pub fn highlight(&self, code: &str, language: Option<&str>) -> HighlightResult {
        let Some(syntax) = language.and_then(find_syntax) else {
            debug!(language = ?language, "No grammar, rendering plain code");
            return fallback(code);
        };

        let mut lines = HighlightLines::new(syntax, self.theme);
        let mut tokens = Vec::new();
        for line in LinesWithEndings::from(code) {
            match lines.highlight_line(line, &SYNTAX_SET) {
                Ok(ranges) => tokens.extend(ranges.into_iter().map(|(style, text)| Token {
                    text: text.to_string(),
                    style: TokenStyle::from_syntect(style),
                })),
                Err(e) => {
                    debug!(error = %e, "Highlighting failed, rendering plain code");
                    return fallback(code);
                }
            }
        }

        HighlightResult::Highlighted {
            tokens,
            background: self.theme.settings.background.map(hex),
        }
    }
}

/// Highlight with the default theme.
pub fn highlight(code: &str, language: Option<&str>) -> HighlightResult {
    Highlighter::default().highlight(code, language)
}

fn fallback(code: &str) -> HighlightResult {
    HighlightResult::Fallback {
        text: code.to_string(),
    }
}

fn find_syntax(language: &str) -> Option<&'static SyntaxReference> {
    let language = language.trim();
    if language.is_empty() {
        return None;
    }

    SYNTAX_SET.find_syntax_by_token(language).or_else(|| {
        // Close enough for grammars syntect does not bundle
        match language.to_ascii_lowercase().as_str() {
            "nix" | "jsx" | "tsx" | "mdx" | "typescript" | "ts" => {
                SYNTAX_SET.find_syntax_by_name("JavaScript")
            }
            "toml" => SYNTAX_SET.find_syntax_by_name("YAML"),
            _ => None,
        }
    })
}

fn hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back_unchanged() {
        let result = highlight("print(1)", Some("unknownlang"));
        assert_eq!(
            result,
            HighlightResult::Fallback {
                text: "print(1)".into()
            }
        );
        assert!(result.is_fallback());
    }

    #[test]
    fn missing_or_blank_language_falls_back() {
        assert!(highlight("x", None).is_fallback());
        assert!(highlight("x", Some("  ")).is_fallback());
    }

    #[test]
    fn known_language_produces_tokens_that_reassemble() {
        let code = "fn main() {\n    println!(\"hi\");\n}\n";
        let result = highlight(code, Some("rust"));
        assert!(!result.is_fallback());
        assert_eq!(result.text(), code);

        let HighlightResult::Highlighted { tokens, background } = result else {
            unreachable!()
        };
        assert!(tokens.len() > 1);
        assert!(tokens.iter().all(|t| t.style.color.starts_with('#')));
        assert!(background.is_some());
    }

    #[test]
    fn aliases_resolve() {
        assert!(!highlight("a = 1\n", Some("toml")).is_fallback());
        assert!(!highlight("{ pkgs }: pkgs\n", Some("nix")).is_fallback());
    }

    #[test]
    fn fallback_html_is_escaped() {
        let html = highlight("<b>&</b>", None).to_html(None);
        assert_eq!(html, "<pre><code>&lt;b&gt;&amp;&lt;/b&gt;</code></pre>\n");
    }

    #[test]
    fn highlighted_html_escapes_every_token() {
        let html = highlight("let s = \"<b>\";\n", Some("rust")).to_html(Some("rust"));
        assert!(html.starts_with("<pre class=\"highlight\" style=\"background-color:#"));
        assert!(html.contains("<code class=\"language-rust\"><span style=\"color:#"));
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>"));
        assert!(html.ends_with("</code></pre>\n"));
    }

    #[test]
    fn unknown_theme_uses_default() {
        let custom = Highlighter::new("not-a-theme").highlight("let x = 1;", Some("rust"));
        let default = highlight("let x = 1;", Some("rust"));
        assert_eq!(custom, default);
    }
}

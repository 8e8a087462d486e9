use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::highlight::theme_exists;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parsing(#[from] toml::de::Error),
    #[error("heading spacing must strictly decrease and stay above zero through h4, got {0:?}")]
    HeadingSpacing([u8; 6]),
    #[error("unknown syntax theme: {0}")]
    UnknownSyntaxTheme(String),
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub style: StyleConfig,
}

impl Config {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&data)?;
        config.style.validate()?;

        Ok(config)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub tagline: Option<String>,
    pub location: Option<String>,
    pub pictures: Option<PictureConfig>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Kieran Hunt".into(),
            tagline: Some("Tinkerer of things".to_string()),
            location: None,
            pictures: None,
        }
    }
}

/// Profile pictures keyed by season. Only `default` is required; missing
/// seasonal variants fall back to it.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct PictureConfig {
    pub default: String,
    pub halloween: Option<String>,
    pub christmas: Option<String>,
}

/// Palette and spacing scale shared by the element overrides and the
/// highlighter. Values are utility class fragments, e.g. `teal-400`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StyleConfig {
    pub accent: String,
    pub muted: String,
    pub code_background: String,
    pub code_text: String,
    pub table_header_background: String,
    /// Spacer height per heading level, h1 first.
    pub heading_spacing: [u8; 6],
    /// Spacer height around block-level media (tables, images, code).
    pub block_spacing: u8,
    /// Container indentation shared by ordered and unordered lists.
    pub list_indent: String,
    pub syntax_theme: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            accent: "teal-400".into(),
            muted: "gray-600".into(),
            code_background: "gray-200".into(),
            code_text: "gray-800".into(),
            table_header_background: "gray-800".into(),
            heading_spacing: [6, 4, 3, 2, 1, 0],
            block_spacing: 4,
            list_indent: "pl-6".into(),
            syntax_theme: crate::highlight::DEFAULT_THEME.into(),
        }
    }
}

impl StyleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let spacing = self.heading_spacing;
        let decreasing = spacing.windows(2).all(|pair| pair[0] > pair[1]);
        let visible = spacing[..4].iter().all(|&h| h > 0);
        if !decreasing || !visible {
            return Err(ConfigError::HeadingSpacing(spacing));
        }

        if !theme_exists(&self.syntax_theme) {
            return Err(ConfigError::UnknownSyntaxTheme(self.syntax_theme.clone()));
        }

        Ok(())
    }

    /// Spacer height for a heading level in `1..=6`.
    pub fn heading_space(&self, level: u8) -> u8 {
        let index = usize::from(level.clamp(1, 6)) - 1;
        self.heading_spacing[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_style_is_valid() {
        StyleConfig::default().validate().unwrap();
    }

    #[test]
    fn heading_spacing_strictly_decreases_through_h4() {
        let style = StyleConfig::default();
        assert!(style.heading_space(1) > style.heading_space(2));
        assert!(style.heading_space(2) > style.heading_space(3));
        assert!(style.heading_space(3) > style.heading_space(4));
        assert!(style.heading_space(4) > 0);
    }

    #[test]
    fn flat_heading_spacing_is_rejected() {
        let style = StyleConfig {
            heading_spacing: [4, 4, 3, 2, 1, 0],
            ..StyleConfig::default()
        };
        assert!(matches!(style.validate(), Err(ConfigError::HeadingSpacing(_))));
    }

    #[test]
    fn zero_spacing_above_h5_is_rejected() {
        let style = StyleConfig {
            heading_spacing: [5, 4, 3, 0, 0, 0],
            ..StyleConfig::default()
        };
        assert!(style.validate().is_err());
    }

    #[test]
    fn unknown_theme_is_rejected() {
        let style = StyleConfig {
            syntax_theme: "no-such-theme".into(),
            ..StyleConfig::default()
        };
        assert!(matches!(style.validate(), Err(ConfigError::UnknownSyntaxTheme(_))));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [site]
            title = "Somebody"

            [style]
            accent = "indigo-500"
            "#,
        )
        .unwrap();

        assert_eq!(config.site.title, "Somebody");
        assert_eq!(config.style.accent, "indigo-500");
        assert_eq!(config.style.heading_spacing, [6, 4, 3, 2, 1, 0]);
    }
}

use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;
use tracing::debug;

const LAYOUT: &str = include_str!("../templates/layout.html");
const INDEX: &str = include_str!("../templates/index.html");
const POST: &str = include_str!("../templates/post.html");

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template error: {0}")]
    Tera(#[from] tera::Error),
}

/// The page shell every rendered page is wrapped in.
///
/// Ships with built-in `layout.html`, `index.html` and `post.html`
/// templates; a theme directory can replace any of them.
pub struct Layout {
    tera: Tera,
    global: Context,
}

impl Layout {
    pub fn builtin() -> Result<Self, TemplateError> {
        Ok(Self {
            tera: builtin_templates()?,
            global: Context::new(),
        })
    }

    /// Templates from `theme_dir`, falling back to the built-in ones for
    /// anything the theme does not define.
    pub fn new<P: AsRef<Path>>(theme_dir: P) -> Result<Self, TemplateError> {
        let theme_dir = theme_dir.as_ref();
        if !theme_dir.is_dir() {
            debug!(theme = %theme_dir.display(), "No theme directory, using built-in templates");
            return Self::builtin();
        }

        let glob = format!("{}/**/*.html", theme_dir.display());
        let mut tera = Tera::new(&glob)?;
        tera.extend(&builtin_templates()?)?;

        Ok(Self {
            tera,
            global: Context::new(),
        })
    }

    /// Values every page can see, e.g. `site` and `style`.
    pub fn set_global<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        self.global.insert(key, value);
    }

    pub fn render(&self, template: &str, context: &Context) -> Result<String, TemplateError> {
        let mut merged = self.global.clone();
        merged.extend(context.clone());
        Ok(self.tera.render(template, &merged)?)
    }
}

fn builtin_templates() -> Result<Tera, TemplateError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("layout.html", LAYOUT),
        ("index.html", INDEX),
        ("post.html", POST),
    ])?;
    Ok(tera)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_templates_parse() {
        let layout = Layout::builtin().unwrap();
        let names: Vec<&str> = layout.tera.get_template_names().collect();
        assert!(names.contains(&"index.html"));
        assert!(names.contains(&"post.html"));
    }

    #[test]
    fn theme_overrides_single_template() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("post.html"), "custom {{ page_content | safe }}").unwrap();

        let layout = Layout::new(dir.path()).unwrap();
        let mut context = Context::new();
        context.insert("page_content", "<p>x</p>");
        assert_eq!(layout.render("post.html", &context).unwrap(), "custom <p>x</p>");

        // index still comes from the built-ins
        assert!(layout.tera.get_template_names().any(|n| n == "index.html"));
    }

    #[test]
    fn missing_theme_dir_uses_builtins() {
        let layout = Layout::new("/definitely/not/here").unwrap();
        assert!(layout.tera.get_template_names().any(|n| n == "layout.html"));
    }

    #[test]
    fn globals_are_merged_into_every_render() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.html"), "{{ greeting }}, {{ name }}").unwrap();

        let mut layout = Layout::new(dir.path()).unwrap();
        layout.set_global("greeting", "Howzit");
        let mut context = Context::new();
        context.insert("name", "Kieran");
        assert_eq!(layout.render("hello.html", &context).unwrap(), "Howzit, Kieran");
    }
}

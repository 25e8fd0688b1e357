//! Theme engine
//!
//! This module provides template rendering using Tera.
//! Features:
//! - Default templates embedded in the binary
//! - Per-theme overrides loaded from `{theme.path}/{theme.active}`
//! - Fallback to a plain HTML error page when rendering fails

use rust_embed::RustEmbed;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context as TeraContext, Tera};

use crate::config::ThemeConfig;

mod error;


pub use error::ThemeError;

/// Templates shipped with the binary
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct DefaultTemplates;

/// Theme engine for rendering templates
pub struct ThemeEngine {
    /// Tera template engine instance
    tera: Tera,
    /// Active theme name
    active_theme: String,
    /// Directory the active theme was loaded from, if it exists
    theme_dir: Option<PathBuf>,
}

impl ThemeEngine {
    /// Create a theme engine for the configured theme.
    ///
    /// Embedded templates are always loaded. Any `.html` file under the active
    /// theme directory replaces the embedded template with the same relative
    /// name, or adds a new one. A missing theme directory is not an error.
    pub fn new(config: &ThemeConfig) -> Result<Self, ThemeError> {
        let theme_dir = config.path.join(&config.active);
        let mut templates = embedded_templates()?;

        let theme_dir = if theme_dir.is_dir() {
            let mut overrides = Vec::new();
            collect_templates_from_dir(&theme_dir, &theme_dir, &mut overrides)?;
            tracing::info!(
                "Theme '{}' overrides {} template(s) from {:?}",
                config.active,
                overrides.len(),
                theme_dir
            );
            templates.extend(overrides);
            Some(theme_dir)
        } else {
            if config.active != "default" {
                tracing::warn!(
                    "Theme directory {:?} not found, using embedded templates",
                    theme_dir
                );
            }
            None
        };

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .map_err(|e| ThemeError::TemplateError(describe(&e)))?;

        Ok(Self {
            tera,
            active_theme: config.active.clone(),
            theme_dir,
        })
    }

    /// Create a theme engine with only the embedded templates
    pub fn embedded() -> Result<Self, ThemeError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(embedded_templates()?)
            .map_err(|e| ThemeError::TemplateError(describe(&e)))?;

        Ok(Self {
            tera,
            active_theme: "default".to_string(),
            theme_dir: None,
        })
    }

    /// Render a template
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String, ThemeError> {
        self.tera.render(template, context).map_err(|e| {
            ThemeError::TemplateError(format!("Failed to render '{}': {}", template, describe(&e)))
        })
    }

    /// Render a template, or a plain error page if that fails
    pub fn render_with_fallback(&self, template: &str, context: &TeraContext) -> String {
        match self.render(template, context) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("Failed to render template '{}': {}", template, e);
                Self::simple_error_page("Template Error", &e.to_string())
            }
        }
    }

    /// Minimal standalone HTML error page.
    ///
    /// Does not go through Tera, so it works when templates are broken.
    pub fn simple_error_page(title: &str, detail: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="bn">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{ font-family: sans-serif; max-width: 600px; margin: 50px auto; padding: 20px; }}
        .error-box {{ border-left: 4px solid #c0392b; padding: 12px 20px; background: #fdf2f2; }}
        h1 {{ color: #c0392b; margin-top: 0; }}
    </style>
</head>
<body>
    <div class="error-box">
        <h1>{title}</h1>
        <p>{detail}</p>
    </div>
</body>
</html>"#,
            title = escape_html(title),
            detail = escape_html(detail),
        )
    }

    /// Name of the active theme
    pub fn active_theme(&self) -> &str {
        &self.active_theme
    }

    /// Directory overrides were loaded from, if any
    pub fn theme_dir(&self) -> Option<&Path> {
        self.theme_dir.as_deref()
    }

    /// Whether a template with this name is loaded
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|t| t == name)
    }
}

/// Embedded templates keyed by name
fn embedded_templates() -> Result<BTreeMap<String, String>, ThemeError> {
    let mut templates = BTreeMap::new();
    for name in DefaultTemplates::iter() {
        let Some(file) = DefaultTemplates::get(&name) else {
            continue;
        };
        let content = String::from_utf8(file.data.into_owned())
            .map_err(|_| ThemeError::InvalidEncoding(name.to_string()))?;
        templates.insert(name.to_string(), content);
    }
    Ok(templates)
}

/// Collect `.html` files below `current_path`, named relative to `base_path`
fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut Vec<(String, String)>,
) -> Result<(), ThemeError> {
    for entry in fs::read_dir(current_path)? {
        let path = entry?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().is_some_and(|ext| ext == "html") {
            let relative = path
                .strip_prefix(base_path)
                .map_err(|_| ThemeError::TemplateError(format!("Bad template path {:?}", path)))?;
            let name = relative.to_string_lossy().replace('\\', "/");

            let bytes = fs::read(&path)?;
            let content = String::from_utf8(bytes).map_err(|_| ThemeError::InvalidEncoding(name.clone()))?;
            templates.push((name, content));
        }
    }

    Ok(())
}

/// Tera error with its whole source chain
fn describe(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

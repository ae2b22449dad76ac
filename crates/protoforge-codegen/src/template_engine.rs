//! Template engine for code generation using Handlebars.
//!
//! Templates are addressed by role name (`model`, `request`, `result`,
//! `data`, `service`, `controller`, `enum`). A set is either the built-in
//! one for a generation mode or loaded from disk:
//!
//! - a directory of `<name>.hbs` / `<name>.tmpl` files, or
//! - a single bundle file split by `{{!-- define: <name> --}}` lines.
//!
//! Output is never HTML-escaped; helpers `snake_case`, `camel_case`,
//! `pascal_case`, `plural`, `upper`, `first`, `join` and `quote` are always
//! available.
//!
//! # Examples
//!
//! ```
//! use protoforge_codegen::template_engine::TemplateEngine;
//! use serde_json::json;
//!
//! let mut engine = TemplateEngine::empty();
//! engine
//!     .register_template_string("model", "type {{pascal_case name}} struct{}")
//!     .unwrap();
//! let out = engine.render("model", &json!({"name": "user_profile"})).unwrap();
//! assert_eq!(out, "type UserProfile struct{}");
//! ```

use handlebars::Handlebars;
use protoforge_core::cli::GenerationMode;
use protoforge_core::{Error, Result};
use serde::Serialize;
use std::path::Path;

/// Role names every complete template set defines.
pub const TEMPLATE_NAMES: [&str; 7] = [
    "model",
    "request",
    "result",
    "data",
    "service",
    "controller",
    "enum",
];

const GO_TEMPLATES: [(&str, &str); 7] = [
    ("model", include_str!("../templates/go/model.hbs")),
    ("request", include_str!("../templates/go/request.hbs")),
    ("result", include_str!("../templates/go/result.hbs")),
    ("data", include_str!("../templates/go/data.hbs")),
    ("service", include_str!("../templates/go/service.hbs")),
    ("controller", include_str!("../templates/go/controller.hbs")),
    ("enum", include_str!("../templates/go/enum.hbs")),
];

const TS_TEMPLATES: [(&str, &str); 6] = [
    ("model", include_str!("../templates/ts/model.hbs")),
    ("request", include_str!("../templates/ts/message.hbs")),
    ("result", include_str!("../templates/ts/message.hbs")),
    ("data", include_str!("../templates/ts/message.hbs")),
    ("controller", include_str!("../templates/ts/controller.hbs")),
    ("enum", include_str!("../templates/ts/enum.hbs")),
];

const BUNDLE_MARKER: &str = "define:";

/// Template engine for code generation.
///
/// Wraps Handlebars in strict mode, so a template referencing a key the
/// context does not carry fails instead of rendering an empty string.
#[derive(Debug)]
pub struct TemplateEngine<'a> {
    handlebars: Handlebars<'a>,
}

impl TemplateEngine<'_> {
    /// Creates an engine with helpers but no templates.
    #[must_use]
    pub fn empty() -> Self {
        let mut handlebars = Handlebars::new();

        // Strict mode: fail on missing variables
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        helpers::register(&mut handlebars);

        Self { handlebars }
    }

    /// Creates an engine holding the built-in template set for `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if a built-in template fails to compile.
    ///
    /// # Examples
    ///
    /// ```
    /// use protoforge_codegen::template_engine::TemplateEngine;
    /// use protoforge_core::cli::GenerationMode;
    ///
    /// let engine = TemplateEngine::builtin(GenerationMode::Host).unwrap();
    /// assert!(engine.has_template("controller"));
    /// ```
    pub fn builtin(mode: GenerationMode) -> Result<Self> {
        let mut engine = Self::empty();
        let templates: &[(&str, &str)] = match mode {
            GenerationMode::Host => &GO_TEMPLATES,
            GenerationMode::Sdk => &TS_TEMPLATES,
        };
        for (name, source) in templates {
            engine.register_template_string(name, source)?;
        }
        Ok(engine)
    }

    /// Loads a template set from a directory or a bundle file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the path cannot be read and
    /// [`Error::Template`] if a template fails to compile. A bundle without
    /// any `define` marker is rejected with [`Error::Template`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut engine = Self::empty();
        if path.is_dir() {
            engine.load_dir(path)?;
        } else {
            let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
            let sections = split_bundle(&text);
            if sections.is_empty() {
                return Err(Error::Template {
                    name: path.display().to_string(),
                    message: "bundle defines no templates".to_string(),
                });
            }
            for (name, source) in sections {
                engine.register_template_string(&name, &source)?;
            }
        }
        tracing::debug!(
            "Loaded {} templates from {}",
            engine.handlebars.get_templates().len(),
            path.display()
        );
        Ok(engine)
    }

    fn load_dir(&mut self, dir: &Path) -> Result<()> {
        let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Error::io(dir, e))?.path();
            let is_template = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "hbs" || e == "tmpl");
            if is_template && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        for path in files {
            let Some(name) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.split('.').next())
            else {
                continue;
            };
            let source = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            self.register_template_string(name, &source)?;
        }
        Ok(())
    }

    /// Registers a custom template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if the template string is invalid.
    pub fn register_template_string(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| Error::Template {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    /// Renders a template with the given context.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateNotFound`] if `template_name` is not
    /// registered, and [`Error::Template`] if rendering fails (including a
    /// missing context key).
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        if !self.has_template(template_name) {
            return Err(Error::TemplateNotFound {
                name: template_name.to_string(),
            });
        }
        self.handlebars
            .render(template_name, context)
            .map_err(|e| Error::Template {
                name: template_name.to_string(),
                message: e.to_string(),
            })
    }
}

/// Splits a bundle into `(name, source)` sections.
///
/// Text before the first marker is ignored.
fn split_bundle(text: &str) -> Vec<(String, String)> {
    let mut sections: Vec<(String, String)> = Vec::new();
    for line in text.lines() {
        let marker = line
            .trim()
            .strip_prefix("{{!--")
            .and_then(|rest| rest.strip_suffix("--}}"))
            .map(str::trim)
            .and_then(|inner| inner.strip_prefix(BUNDLE_MARKER))
            .map(str::trim)
            .filter(|name| !name.is_empty());
        if let Some(name) = marker {
            sections.push((name.to_string(), String::new()));
        } else if let Some((_, source)) = sections.last_mut() {
            source.push_str(line);
            source.push('\n');
        }
    }
    sections
}

mod helpers {
    #![allow(missing_docs)]

    use crate::naming;
    use handlebars::{Handlebars, handlebars_helper};
    use serde_json::Value;

    handlebars_helper!(snake_case: |s: str| naming::to_snake_case(s));
    handlebars_helper!(camel_case: |s: str| naming::to_camel_case(s));
    handlebars_helper!(pascal_case: |s: str| naming::to_pascal_case(s));
    handlebars_helper!(plural: |s: str| naming::pluralize(s));
    handlebars_helper!(upper: |s: str| s.to_uppercase());
    handlebars_helper!(first: |list: array| list.first().cloned().unwrap_or(Value::Null));
    handlebars_helper!(join: |list: array, sep: str| {
        list.iter()
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .collect::<Vec<_>>()
            .join(sep)
    });
    handlebars_helper!(quote: |s: str| Value::String(s.to_string()).to_string());

    pub(super) fn register(handlebars: &mut Handlebars<'_>) {
        handlebars.register_helper("snake_case", Box::new(snake_case));
        handlebars.register_helper("camel_case", Box::new(camel_case));
        handlebars.register_helper("pascal_case", Box::new(pascal_case));
        handlebars.register_helper("plural", Box::new(plural));
        handlebars.register_helper("upper", Box::new(upper));
        handlebars.register_helper("first", Box::new(first));
        handlebars.register_helper("join", Box::new(join));
        handlebars.register_helper("quote", Box::new(quote));
    }
}

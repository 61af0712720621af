//! Destination-path templates.
//!
//! A template is parsed once and then resolved against each (descriptor, url)
//! pair. Recognized fields: `.OS.Name`, `.OS.Release`, `.OS.Architecture`,
//! `.Base` (last URL segment) and `.Extension` (suffix of `.Base` from the
//! last dot). `{{ if .Field }}...{{ end }}` renders its body only when the
//! field is non-empty.

mod parse;
mod url_parts;

pub use url_parts::{base_extension, url_base};

use std::path::{Component, Path, PathBuf};

use crate::descriptor::OsDescriptor;
use parse::Node;

/// Built-in layout: `<name>/[<release>/]<architecture>/<basename>`.
pub const DEFAULT_DESTINATION_TEMPLATE: &str =
    "{{ .OS.Name }}/{{if .OS.Release }}{{ .OS.Release }}/{{end}}{{ .OS.Architecture }}/{{ .Base }}";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("template syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("template references unknown field .{0}")]
    UnknownField(String),

    #[error("url {0:?} has no file name after the last '/'")]
    NoFileName(String),

    #[error("template rendered an empty path")]
    EmptyPath,

    #[error("rendered path {0:?} is absolute or escapes the output directory")]
    UnsafePath(String),
}

/// Compiled destination-path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    source: String,
    nodes: Vec<Node>,
}

/// Values a template can reference for one URL.
struct Fields<'a, D: OsDescriptor + ?Sized> {
    os: &'a D,
    url: &'a str,
}

impl<D: OsDescriptor + ?Sized> Fields<'_, D> {
    fn lookup(&self, name: &str) -> Result<&str, TemplateError> {
        match name {
            "OS.Name" => Ok(self.os.name()),
            "OS.Release" => Ok(self.os.release().unwrap_or("")),
            "OS.Architecture" => Ok(self.os.architecture()),
            "Base" => match url_base(self.url) {
                "" => Err(TemplateError::NoFileName(self.url.to_string())),
                base => Ok(base),
            },
            "Extension" => Ok(base_extension(url_base(self.url))),
            other => Err(TemplateError::UnknownField(other.to_string())),
        }
    }

    fn render(&self, nodes: &[Node], out: &mut String) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Field(name) => out.push_str(self.lookup(name)?),
                Node::If { field, body } => {
                    if !self.lookup(field)?.is_empty() {
                        self.render(body, out)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl PathTemplate {
    /// Parse a template. Only syntax is checked; field names are resolved per URL.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            source: source.to_string(),
            nodes: parse::parse(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the template for one URL of `os` into a relative path string.
    pub fn render<D: OsDescriptor + ?Sized>(&self, os: &D, url: &str) -> Result<String, TemplateError> {
        let mut out = String::new();
        Fields { os, url }.render(&self.nodes, &mut out)?;
        Ok(out)
    }

    /// Resolve the destination path for one URL of `os`, relative to the output directory.
    pub fn resolve<D: OsDescriptor + ?Sized>(&self, os: &D, url: &str) -> Result<PathBuf, TemplateError> {
        let rendered = self.render(os, url)?;
        if rendered.is_empty() {
            return Err(TemplateError::EmptyPath);
        }
        let path = PathBuf::from(&rendered);
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(TemplateError::UnsafePath(rendered));
        }
        if path.file_name().is_none() || rendered.ends_with('/') {
            return Err(TemplateError::EmptyPath);
        }
        Ok(path)
    }
}

impl Default for PathTemplate {
    fn default() -> Self {
        Self {
            source: DEFAULT_DESTINATION_TEMPLATE.to_string(),
            nodes: parse::parse(DEFAULT_DESTINATION_TEMPLATE).unwrap_or_default(),
        }
    }
}

/// Resolve `template` for (`os`, `url`) and join it onto `output_dir`.
pub fn resolve_destination<D: OsDescriptor + ?Sized>(
    template: &PathTemplate,
    os: &D,
    url: &str,
    output_dir: &Path,
) -> Result<PathBuf, TemplateError> {
    Ok(output_dir.join(template.resolve(os, url)?))
}

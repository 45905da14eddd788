//! File-based operations behind the CLI: merge, resolve, template.
//!
//! Handlers stay as names throughout (`DynamicMedia<String, String>`), so a
//! framework config can be merged and printed without any real handler code.
//! The framework's own upload callbacks are carried as raw `toml::Value`s; the
//! plugin's names join them as strings.

use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use toml::Value;

use crate::builder::DynamicMedia;
use crate::error::DynamicMediaError;
use crate::framework::FrameworkConfig;
use crate::settings;
use crate::types::{MediaAction, OutputFormat};

/// A fully specified request: which settings to load and what to do.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Plugin settings files, lowest priority first.
    pub plugin_files: Vec<PathBuf>,
    pub strict: bool,
    pub action: MediaAction,
}

/// Result of an operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaResult {
    /// A generated settings template.
    Template(String),
    /// The framework config after the plugin was applied.
    Merged { collections: usize, rendered: String },
    /// What the plugin resolves for one collection.
    Resolved { slug: String, rendered: String },
}

impl fmt::Display for MediaResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaResult::Template(t) => write!(f, "{t}"),
            MediaResult::Merged { rendered, .. } => write!(f, "{}", rendered.trim_end()),
            MediaResult::Resolved { rendered, .. } => write!(f, "{}", rendered.trim_end()),
        }
    }
}

/// Run an invocation.
pub fn handle(invocation: &Invocation) -> Result<MediaResult, DynamicMediaError> {
    match &invocation.action {
        MediaAction::Template => Ok(MediaResult::Template(settings::template())),
        MediaAction::Merge { config, format } => {
            let plugin = DynamicMedia::load(&invocation.plugin_files, invocation.strict)?;
            let framework = read_framework_config(config)?;
            merge(&plugin, &framework, *format)
        }
        MediaAction::Resolve { slug, format } => {
            let plugin = DynamicMedia::load(&invocation.plugin_files, invocation.strict)?;
            resolve(&plugin, slug, *format)
        }
    }
}

/// Apply `plugin` to `framework` and render the result.
pub fn merge(
    plugin: &DynamicMedia<String, String>,
    framework: &FrameworkConfig<Value>,
    format: OutputFormat,
) -> Result<MediaResult, DynamicMediaError> {
    let options = plugin
        .options()
        .clone()
        .try_map(&Ok::<_, Infallible>, &|name: String| Ok(Value::String(name)));
    let Ok(options) = options;
    let merged = DynamicMedia::new(options).apply(framework);
    Ok(MediaResult::Merged {
        collections: merged.collections.len(),
        rendered: render(&merged, format)?,
    })
}

/// Render what `plugin` resolves for `slug`.
pub fn resolve(
    plugin: &DynamicMedia<String, String>,
    slug: &str,
    format: OutputFormat,
) -> Result<MediaResult, DynamicMediaError> {
    Ok(MediaResult::Resolved {
        slug: slug.to_string(),
        rendered: render(&plugin.resolve(slug), format)?,
    })
}

/// Parse a framework config. Upload callbacks are kept as whatever TOML value
/// they are.
pub fn parse_framework_config(
    content: &str,
    path: &Path,
) -> Result<FrameworkConfig<Value>, DynamicMediaError> {
    toml::from_str(content).map_err(|e| DynamicMediaError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_framework_config(path: &Path) -> Result<FrameworkConfig<Value>, DynamicMediaError> {
    let content = std::fs::read_to_string(path).map_err(|e| DynamicMediaError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_framework_config(&content, path)
}

fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String, DynamicMediaError> {
    match format {
        OutputFormat::Toml => {
            toml::to_string(value).map_err(|e| DynamicMediaError::Render(e.to_string()))
        }
        OutputFormat::Json => {
            let value =
                Value::try_from(value).map_err(|e| DynamicMediaError::Render(e.to_string()))?;
            serde_json::to_string_pretty(&to_json(value))
                .map_err(|e| DynamicMediaError::Render(e.to_string()))
        }
    }
}

/// Convert through `toml::Value` so datetimes come out as plain strings.
fn to_json(value: Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s),
        Value::Integer(i) => serde_json::Value::from(i),
        Value::Float(f) => serde_json::Value::from(f),
        Value::Boolean(b) => serde_json::Value::Bool(b),
        Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        Value::Array(items) => items.into_iter().map(to_json).collect(),
        Value::Table(table) => table
            .into_iter()
            .map(|(key, value)| (key, to_json(value)))
            .collect::<serde_json::Map<_, _>>()
            .into(),
    }
}

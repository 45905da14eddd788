//! Declarative plugin settings.
//!
//! Settings files name handlers instead of holding them. Loading is a pure
//! pipeline over pre-read file contents (`SettingsInput`), so it is testable
//! without touching disk:
//!
//! 1. Validate each file against [`PluginSettings`] (if strict)
//! 2. Parse each file to a `toml::Table`
//! 3. Deep-merge files (later overrides earlier)
//! 4. Deserialize the merged table into `PluginSettings::Layer`
//! 5. Let confique check required fields

use std::path::PathBuf;

use confique::Config;
use toml::{Table, Value};
use tracing::debug;

use crate::error::DynamicMediaError;
use crate::merge::deep_merge;
use crate::types::{CollectionOptions, CollectionSelector, HandlerChain, PluginOptions};
use crate::validate;

/// Dynamic media plugin settings.
#[derive(Config, Debug)]
pub struct PluginSettings {
    /// Collections the plugin names. Either a list of slugs, which use the
    /// plugin defaults below, or a table keyed by slug whose entries override
    /// `read_file`, `upload_file` and `handlers` for that collection.
    pub collections: CollectionSelector<String, String>,

    /// Default read (`GET`) handler name, or a list of names. The last one is
    /// called first.
    pub read_file: Option<HandlerChain<String>>,

    /// Default upload (`POST`/`PATCH`/`PUT`) handler name, or a list of names.
    /// The last one is called first.
    pub upload_file: Option<HandlerChain<String>>,

    /// Upload-handler callback names appended after each collection's own.
    /// A value that is not a list means no handlers.
    #[config(layer_attr(serde(default, deserialize_with = "crate::types::lenient_list")))]
    pub handlers: Option<Vec<String>>,
}

impl PluginSettings {
    pub fn into_options(self) -> PluginOptions<String, String> {
        PluginOptions {
            collections: self.collections,
            defaults: CollectionOptions {
                read_file: self.read_file,
                upload_file: self.upload_file,
                handlers: self.handlers,
            },
        }
    }
}

/// All pre-loaded data needed to resolve plugin settings. No I/O happens here.
pub struct SettingsInput {
    /// File contents in precedence order: first = lowest priority, last = highest.
    pub files: Vec<(PathBuf, String)>,
    /// Whether to reject unknown keys.
    pub strict: bool,
}

impl SettingsInput {
    /// Read `paths` from disk, in order. A missing file is an error: settings
    /// files are named explicitly, never discovered.
    pub fn read(paths: &[PathBuf], strict: bool) -> Result<Self, DynamicMediaError> {
        let files = paths
            .iter()
            .map(|path| {
                std::fs::read_to_string(path)
                    .map(|content| (path.clone(), content))
                    .map_err(|e| DynamicMediaError::IoError {
                        path: path.clone(),
                        source: e,
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { files, strict })
    }
}

/// Resolve plugin settings from pre-loaded files.
pub fn resolve(input: SettingsInput) -> Result<PluginSettings, DynamicMediaError> {
    let mut merged = Table::new();
    for (path, content) in &input.files {
        if input.strict {
            validate::validate_unknown_keys(content, path)?;
        }
        let table: Table = toml::from_str(content).map_err(|e| DynamicMediaError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        debug!(path = %path.display(), keys = table.len(), "merging plugin settings file");
        merged = deep_merge(merged, table);
    }

    let layer: <PluginSettings as Config>::Layer =
        Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| DynamicMediaError::InvalidValue {
                key: "<merged>".into(),
                reason: e.to_string(),
            })?;

    PluginSettings::builder()
        .preloaded(layer)
        .load()
        .map_err(DynamicMediaError::from)
}

/// Generate a commented TOML template from the settings' doc comments.
pub fn template() -> String {
    confique::toml::template::<PluginSettings>(confique::toml::FormatOptions::default())
}

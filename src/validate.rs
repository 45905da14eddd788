//! Strict-mode validation: detect unknown keys in plugin settings files.
//!
//! Deserializes into the all-optional `PluginSettings::Layer` through
//! `serde_ignored`, collecting every key the layer does not consume. The
//! untagged selector buffers `collections`, so each `[collections.<slug>]`
//! table gets its own pass as `CollectionOptions` and its unknown keys are
//! reported as `collections.<slug>.<key>`.

use std::path::Path;

use confique::Config;
use toml::{Table, Value};

use crate::error::DynamicMediaError;
use crate::settings::PluginSettings;
use crate::types::CollectionOptions;

/// Reject keys in `content` that [`PluginSettings`] does not know.
pub fn validate_unknown_keys(content: &str, path: &Path) -> Result<(), DynamicMediaError> {
    let mut unknown: Vec<String> = Vec::new();

    let parse_error = |e| DynamicMediaError::ParseError {
        path: path.to_path_buf(),
        source: e,
    };

    let deserializer = toml::Deserializer::new(content);
    let _layer: <PluginSettings as Config>::Layer =
        serde_ignored::deserialize(deserializer, |ignored| unknown.push(ignored.to_string()))
            .map_err(parse_error)?;

    let table: Table = toml::from_str(content).map_err(parse_error)?;
    if let Some(Value::Table(collections)) = table.get("collections") {
        for (slug, options) in collections {
            let _options: CollectionOptions<String, String> =
                serde_ignored::deserialize(options.clone(), |ignored| {
                    unknown.push(format!("collections.{slug}.{ignored}"))
                })
                .map_err(parse_error)?;
        }
    }

    if unknown.is_empty() {
        return Ok(());
    }

    Err(DynamicMediaError::UnknownKeys(
        unknown
            .into_iter()
            .map(|key| DynamicMediaError::UnknownKey {
                line: key_line(content, &key),
                key,
                path: path.to_path_buf(),
            })
            .collect(),
    ))
}

/// 1-indexed line of a dotted key, or 0 if it cannot be found.
///
/// Tracks `[section]` headers so `a.b` only matches `b = ...` under `[a]`.
/// Quoted keys and inline tables are not handled.
fn key_line(content: &str, dotted_key: &str) -> usize {
    let (section, leaf) = match dotted_key.rsplit_once('.') {
        Some((section, leaf)) => (section.split('.').collect::<Vec<_>>(), leaf),
        None => (Vec::new(), dotted_key),
    };

    let mut current: Vec<String> = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if let Some(header) = trimmed.strip_prefix('[')
            && !header.starts_with('[')
        {
            current = header
                .trim_end_matches(']')
                .split('.')
                .map(|s| s.trim().to_string())
                .collect();
            continue;
        }
        if current != section {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix(leaf)
            && rest.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}

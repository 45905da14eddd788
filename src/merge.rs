//! Layer resolution.
//!
//! Two kinds of merging live here:
//!
//! - [`deep_merge`] layers plugin settings *files* on top of each other before
//!   they are typed.
//! - [`resolve_options`], [`merge_upload`] and [`merge_collection`] are the
//!   per-collection merge the plugin applies to a framework config. These are
//!   shallow and field-by-field: an override replaces a default field outright,
//!   and upload callbacks are concatenated, existing first.

use toml::Table;

use crate::framework::{CollectionConfig, Upload, UploadOptions};
use crate::types::CollectionOptions;

/// Deep-merge `overlay` on top of `base`.
/// If both sides have a Table for the same key, recurse.
/// Otherwise, `overlay`'s value wins.
pub fn deep_merge(mut base: Table, overlay: Table) -> Table {
    for (key, overlay_val) in overlay {
        match (base.remove(&key), overlay_val) {
            (Some(toml::Value::Table(base_tbl)), toml::Value::Table(overlay_tbl)) => {
                base.insert(key, toml::Value::Table(deep_merge(base_tbl, overlay_tbl)));
            }
            (_, overlay_val) => {
                base.insert(key, overlay_val);
            }
        }
    }
    base
}

/// Effective options for one collection: each field of `overrides` that is
/// present replaces the matching default, absent fields keep the default.
pub fn resolve_options<F: Clone, H: Clone>(
    defaults: &CollectionOptions<F, H>,
    overrides: Option<&CollectionOptions<F, H>>,
) -> CollectionOptions<F, H> {
    let Some(overrides) = overrides else {
        return defaults.clone();
    };
    CollectionOptions {
        read_file: overrides
            .read_file
            .clone()
            .or_else(|| defaults.read_file.clone()),
        upload_file: overrides
            .upload_file
            .clone()
            .or_else(|| defaults.upload_file.clone()),
        handlers: overrides
            .handlers
            .clone()
            .or_else(|| defaults.handlers.clone()),
    }
}

/// Build the new upload record.
///
/// Every field of a structured `existing` record survives except `handlers`,
/// which becomes the existing callbacks followed by `appended`. A non-record
/// `existing` value contributes nothing.
pub fn merge_upload<H: Clone>(existing: Option<&Upload<H>>, appended: &[H]) -> UploadOptions<H> {
    let (extra, mut handlers) = match existing.and_then(Upload::options) {
        Some(opts) => (opts.extra.clone(), opts.handlers.clone().unwrap_or_default()),
        None => (Table::new(), Vec::new()),
    };
    handlers.extend_from_slice(appended);
    UploadOptions {
        handlers: Some(handlers),
        extra,
    }
}

/// Derive the output collection from an existing one and its effective options.
///
/// Only `upload` changes. `read_file` and `upload_file` are not attached to the
/// record; see [`DynamicMedia::resolve`](crate::DynamicMedia::resolve).
pub fn merge_collection<F, H: Clone>(
    collection: &CollectionConfig<H>,
    effective: &CollectionOptions<F, H>,
) -> CollectionConfig<H> {
    let appended = effective.handlers.as_deref().unwrap_or(&[]);
    CollectionConfig {
        slug: collection.slug.clone(),
        upload: Some(Upload::Options(merge_upload(
            collection.upload.as_ref(),
            appended,
        ))),
        extra: collection.extra.clone(),
    }
}

//! The host framework's configuration, as far as the plugin sees it.
//!
//! Only three things are typed: the ordered collection list, each collection's
//! `slug`, and its `upload` value. Every other field, at every level, lands in
//! an `extra` table and is written back out untouched.
//!
//! `H` is the framework's upload-handler callback type. With `H = String` the
//! whole shape round-trips through TOML, which is what the CLI works with.

use serde::{Deserialize, Serialize};
use toml::{Table, Value};

use crate::types::lenient_list;

/// Full framework configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "H: Serialize", deserialize = "H: Deserialize<'de>"))]
pub struct FrameworkConfig<H> {
    #[serde(default)]
    pub collections: Vec<CollectionConfig<H>>,

    #[serde(flatten)]
    pub extra: Table,
}

impl<H> Default for FrameworkConfig<H> {
    fn default() -> Self {
        Self {
            collections: Vec::new(),
            extra: Table::new(),
        }
    }
}

impl<H> FrameworkConfig<H> {
    pub fn new(collections: Vec<CollectionConfig<H>>) -> Self {
        Self {
            collections,
            extra: Table::new(),
        }
    }

    pub fn collection(&self, slug: &str) -> Option<&CollectionConfig<H>> {
        self.collections.iter().find(|c| c.slug == slug)
    }
}

/// One framework collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "H: Serialize", deserialize = "H: Deserialize<'de>"))]
pub struct CollectionConfig<H> {
    pub slug: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<Upload<H>>,

    #[serde(flatten)]
    pub extra: Table,
}

impl<H> CollectionConfig<H> {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            upload: None,
            extra: Table::new(),
        }
    }

    pub fn with_upload(mut self, upload: Upload<H>) -> Self {
        self.upload = Some(upload);
        self
    }

    /// Existing upload callbacks, empty when there is no structured upload
    /// record or it carries no list.
    pub fn upload_handlers(&self) -> &[H] {
        self.upload
            .as_ref()
            .and_then(Upload::options)
            .and_then(|opts| opts.handlers.as_deref())
            .unwrap_or(&[])
    }
}

/// A collection's `upload` value: a structured record, or anything else the
/// framework accepts there (typically `true`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    untagged,
    bound(serialize = "H: Serialize", deserialize = "H: Deserialize<'de>")
)]
pub enum Upload<H> {
    Options(UploadOptions<H>),
    Other(Value),
}

impl<H> Upload<H> {
    /// `upload = true`.
    pub fn enabled() -> Self {
        Upload::Other(Value::Boolean(true))
    }

    pub fn options(&self) -> Option<&UploadOptions<H>> {
        match self {
            Upload::Options(opts) => Some(opts),
            Upload::Other(_) => None,
        }
    }
}

/// A structured upload record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "H: Serialize", deserialize = "H: Deserialize<'de>"))]
pub struct UploadOptions<H> {
    /// Low-level upload-handler callbacks. A non-list value reads as `None`.
    #[serde(
        default,
        deserialize_with = "lenient_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub handlers: Option<Vec<H>>,

    #[serde(flatten)]
    pub extra: Table,
}

impl<H> Default for UploadOptions<H> {
    fn default() -> Self {
        Self {
            handlers: None,
            extra: Table::new(),
        }
    }
}

impl<H> UploadOptions<H> {
    pub fn with_handlers(handlers: Vec<H>) -> Self {
        Self {
            handlers: Some(handlers),
            extra: Table::new(),
        }
    }
}

//! Media read/upload pipelines for content-framework collections.
//!
//! Dynamic media is a configuration plugin. You give it plugin-wide handler
//! defaults and, optionally, per-collection overrides; it rewrites the
//! framework's collection list so every collection's upload record carries the
//! resolved upload-handler callbacks.
//!
//! ```ignore
//! let plugin = DynamicMedia::builder()
//!     .slugs(["media"])
//!     .handlers(vec![watermark])
//!     .build();
//! let config = plugin.apply(&framework_config);
//! ```
//!
//! The plugin is a pure transformation. It never calls a handler, never adds
//! or removes a collection, and never mutates the config it is given.
//!
//! # Layer precedence
//!
//! Each collection is resolved on its own, field by field:
//!
//! ```text
//! Plugin defaults        .read_file() .upload_file() .handlers()
//!        ↑ replaced by
//! Collection overrides   .collection(slug, CollectionOptions)
//! ```
//!
//! An override **replaces** the default for the fields it sets; it does not
//! concatenate with it. Fields it leaves unset keep the default. Collections
//! without an override entry, including every collection when the plugin was
//! given plain slugs, get the defaults unchanged. The selector names
//! collections; it does not filter them.
//!
//! # Upload-handler callbacks
//!
//! The resolved `handlers` are appended to whatever the collection's upload
//! record already had. Existing callbacks always come first:
//!
//! ```text
//! input   { slug = "media", upload = { handlers = [hA] } }
//! plugin  { collections = ["media"], handlers = [hB] }
//! output  { slug = "media", upload = { handlers = [hA, hB] } }
//! ```
//!
//! Other upload fields are kept. A collection with no upload record, or a
//! non-record value such as `upload = true`, gets a record holding only the
//! callbacks. Applying the plugin twice appends the callbacks twice.
//!
//! # Read and upload chains
//!
//! `read_file` (`GET`) and `upload_file` (`POST`/`PATCH`/`PUT`) are resolved
//! the same way but are **not** attached to the emitted collection; the
//! framework has no single hook for them. Integrations fetch them with
//! [`DynamicMedia::resolve`] and run them through
//! [`FileChain::dispatch`](chain::FileChain::dispatch), which calls the last
//! handler first and lets each one fall back to its predecessor. See the
//! [`chain`] module.
//!
//! # Settings files
//!
//! Handlers can also be declared by name in TOML and bound later through a
//! [`HandlerRegistry`]:
//!
//! ```toml
//! read_file = "local-disk"
//! handlers = ["watermark"]
//!
//! [collections.media]
//! read_file = ["s3", "cdn-cache"]
//! handlers = ["resize"]
//! ```
//!
//! Several files may be layered (later files win, tables merge key by key).
//! Strict mode, on by default, rejects unknown keys with file path and line.
//! [`DynamicMedia::load`] reads and resolves them;
//! [`DynamicMedia::bind`] swaps names for real handlers.
//!
//! # Error handling
//!
//! Merging cannot fail. Loading settings, binding names, and the CLI
//! operations return [`DynamicMediaError`].

pub mod chain;
pub mod error;
pub mod framework;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
mod cli;
pub(crate) mod merge;
mod ops;
mod registry;
mod settings;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::{DynamicMedia, DynamicMediaBuilder, ResolvedCollection};
pub use chain::{FileChain, Handler, Previous};
#[cfg(feature = "clap")]
pub use cli::{Cli, Command};
pub use error::DynamicMediaError;
pub use framework::{CollectionConfig, FrameworkConfig, Upload, UploadOptions};
pub use ops::{Invocation, MediaResult, handle};
pub use registry::HandlerRegistry;
pub use settings::{PluginSettings, SettingsInput};
pub use types::{
    CollectionOptions, CollectionSelector, HandlerChain, MediaAction, OutputFormat, PluginOptions,
};

//! Named handlers for declarative settings.
//!
//! Settings files can only name handlers. A [`HandlerRegistry`] holds the real
//! values behind those names and [`bind`](HandlerRegistry::bind) swaps them in.

use std::collections::BTreeMap;

use crate::error::DynamicMediaError;
use crate::types::PluginOptions;

pub struct HandlerRegistry<F, H> {
    file_handlers: BTreeMap<String, F>,
    upload_handlers: BTreeMap<String, H>,
}

impl<F, H> Default for HandlerRegistry<F, H> {
    fn default() -> Self {
        Self {
            file_handlers: BTreeMap::new(),
            upload_handlers: BTreeMap::new(),
        }
    }
}

impl<F: Clone, H: Clone> HandlerRegistry<F, H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a read/upload file handler. A repeated name replaces the earlier one.
    pub fn file_handler(mut self, name: &str, handler: F) -> Self {
        self.file_handlers.insert(name.to_string(), handler);
        self
    }

    /// Register a framework upload-handler callback.
    pub fn upload_handler(mut self, name: &str, handler: H) -> Self {
        self.upload_handlers.insert(name.to_string(), handler);
        self
    }

    /// Replace every handler name in `options` with its registered value.
    pub fn bind(
        &self,
        options: PluginOptions<String, String>,
    ) -> Result<PluginOptions<F, H>, DynamicMediaError> {
        options.try_map(
            &|name: String| {
                self.file_handlers
                    .get(&name)
                    .cloned()
                    .ok_or(DynamicMediaError::UnknownHandler { name, kind: "file" })
            },
            &|name: String| {
                self.upload_handlers
                    .get(&name)
                    .cloned()
                    .ok_or(DynamicMediaError::UnknownHandler {
                        name,
                        kind: "upload",
                    })
            },
        )
    }
}

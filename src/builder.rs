use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, trace};

use crate::chain::FileChain;
use crate::error::DynamicMediaError;
use crate::framework::FrameworkConfig;
use crate::merge;
use crate::registry::HandlerRegistry;
use crate::settings::{self, SettingsInput};
use crate::types::{CollectionOptions, CollectionSelector, HandlerChain, PluginOptions};

/// The dynamic media plugin: options captured once, applied to framework
/// configs.
#[derive(Debug, Clone)]
pub struct DynamicMedia<F, H> {
    options: PluginOptions<F, H>,
}

/// Everything the plugin resolves for one collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = "F: Serialize, H: Serialize"))]
pub struct ResolvedCollection<F, H> {
    pub slug: String,
    pub read_file: FileChain<F>,
    pub upload_file: FileChain<F>,
    /// Callbacks appended after the collection's existing ones.
    pub handlers: Vec<H>,
}

impl<F, H> DynamicMedia<F, H> {
    pub fn builder() -> DynamicMediaBuilder<F, H> {
        DynamicMediaBuilder::new()
    }

    pub fn new(options: PluginOptions<F, H>) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PluginOptions<F, H> {
        &self.options
    }
}

impl DynamicMedia<String, String> {
    /// Build a plugin from settings files, keeping handler names as-is.
    pub fn from_settings(input: SettingsInput) -> Result<Self, DynamicMediaError> {
        Ok(Self::new(settings::resolve(input)?.into_options()))
    }

    /// Read settings files from disk (lowest priority first) and build a plugin.
    pub fn load(paths: &[PathBuf], strict: bool) -> Result<Self, DynamicMediaError> {
        Self::from_settings(SettingsInput::read(paths, strict)?)
    }

    /// Swap every handler name for the value registered under it.
    pub fn bind<F: Clone, H: Clone>(
        self,
        registry: &HandlerRegistry<F, H>,
    ) -> Result<DynamicMedia<F, H>, DynamicMediaError> {
        Ok(DynamicMedia::new(registry.bind(self.options)?))
    }
}

impl<F: Clone, H: Clone> DynamicMedia<F, H> {
    /// Effective options for `slug`: plugin defaults, with any field the
    /// per-collection entry sets replacing the default.
    ///
    /// This is what [`apply`](Self::apply) appends. For `read_file` and
    /// `upload_file` it differs from [`resolve`](Self::resolve): here an
    /// override replaces the default chain, while `resolve` returns the
    /// default stacked under the override, which is the chain to dispatch.
    pub fn effective_options(&self, slug: &str) -> CollectionOptions<F, H> {
        merge::resolve_options(
            &self.options.defaults,
            self.options.collections.overrides_for(slug),
        )
    }

    /// The read and upload chains and the appended callbacks for `slug`.
    ///
    /// [`apply`](Self::apply) does not attach read or upload chains to the
    /// collections it emits. This is where an integration picks them up to
    /// wire into the framework's request handling.
    pub fn resolve(&self, slug: &str) -> ResolvedCollection<F, H> {
        let defaults = &self.options.defaults;
        let overrides = self.options.collections.overrides_for(slug);
        ResolvedCollection {
            slug: slug.to_string(),
            read_file: FileChain::resolve(
                defaults.read_file.as_ref(),
                overrides.and_then(|o| o.read_file.as_ref()),
            ),
            upload_file: FileChain::resolve(
                defaults.upload_file.as_ref(),
                overrides.and_then(|o| o.upload_file.as_ref()),
            ),
            handlers: self
                .effective_options(slug)
                .handlers
                .unwrap_or_default(),
        }
    }

    /// Produce a new framework config with every collection's upload record
    /// merged. `config` itself is left untouched.
    ///
    /// Applying twice appends the plugin callbacks twice.
    pub fn apply(&self, config: &FrameworkConfig<H>) -> FrameworkConfig<H> {
        debug!(
            collections = config.collections.len(),
            "applying dynamic media plugin"
        );
        let collections = config
            .collections
            .iter()
            .map(|collection| {
                let effective = self.effective_options(&collection.slug);
                let merged = merge::merge_collection(collection, &effective);
                trace!(
                    slug = %collection.slug,
                    named = self.options.collections.contains(&collection.slug),
                    existing = collection.upload_handlers().len(),
                    appended = effective.handlers.as_ref().map_or(0, Vec::len),
                    read_file = effective.read_file.as_ref().map_or(0, HandlerChain::len),
                    upload_file = effective.upload_file.as_ref().map_or(0, HandlerChain::len),
                    "merged collection upload config"
                );
                merged
            })
            .collect();
        FrameworkConfig {
            collections,
            extra: config.extra.clone(),
        }
    }

    /// Consume the plugin into the framework-facing transformer.
    pub fn into_transformer(self) -> impl Fn(&FrameworkConfig<H>) -> FrameworkConfig<H> {
        move |config: &FrameworkConfig<H>| self.apply(config)
    }
}

/// Builder for plugin options.
///
/// ```ignore
/// let plugin = DynamicMedia::builder()
///     .read_file(HandlerChain::single(disk))
///     .handlers(vec![watermark])
///     .collection("media", CollectionOptions::new().read_file(vec![s3, cache]))
///     .build();
/// let config = plugin.apply(&config);
/// ```
pub struct DynamicMediaBuilder<F, H> {
    collections: CollectionSelector<F, H>,
    defaults: CollectionOptions<F, H>,
}

impl<F, H> DynamicMediaBuilder<F, H> {
    fn new() -> Self {
        Self {
            collections: CollectionSelector::default(),
            defaults: CollectionOptions::default(),
        }
    }

    /// Replace the selector entirely.
    pub fn collections(mut self, selector: CollectionSelector<F, H>) -> Self {
        self.collections = selector;
        self
    }

    /// Name collections that use the plugin defaults.
    ///
    /// Once any per-collection override exists, named slugs are kept as
    /// empty overrides, which resolve to the defaults.
    pub fn slugs<I, S>(mut self, slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match &mut self.collections {
            CollectionSelector::Slugs(set) => set.extend(slugs.into_iter().map(Into::into)),
            CollectionSelector::Overrides(map) => {
                for slug in slugs {
                    map.entry(slug.into()).or_default();
                }
            }
        }
        self
    }

    /// Set per-collection overrides for `slug`, switching the selector to the
    /// override form. A repeated slug replaces the earlier entry.
    pub fn collection(mut self, slug: &str, options: CollectionOptions<F, H>) -> Self {
        let mut map = match std::mem::take(&mut self.collections) {
            CollectionSelector::Overrides(map) => map,
            CollectionSelector::Slugs(set) => set
                .into_iter()
                .map(|s| (s, CollectionOptions::default()))
                .collect::<BTreeMap<_, _>>(),
        };
        map.insert(slug.to_string(), options);
        self.collections = CollectionSelector::Overrides(map);
        self
    }

    /// Plugin-wide read handler chain.
    pub fn read_file(mut self, chain: impl Into<HandlerChain<F>>) -> Self {
        self.defaults.read_file = Some(chain.into());
        self
    }

    /// Plugin-wide upload handler chain.
    pub fn upload_file(mut self, chain: impl Into<HandlerChain<F>>) -> Self {
        self.defaults.upload_file = Some(chain.into());
        self
    }

    /// Plugin-wide upload-handler callbacks.
    pub fn handlers(mut self, handlers: Vec<H>) -> Self {
        self.defaults.handlers = Some(handlers);
        self
    }

    pub fn build(self) -> DynamicMedia<F, H> {
        DynamicMedia::new(PluginOptions {
            collections: self.collections,
            defaults: self.defaults,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Handler;
    use crate::fixtures::test::{collection, framework, FRAMEWORK_TOML, OVERRIDES_TOML};
    use crate::framework::{Upload, UploadOptions};

    type Plugin = DynamicMedia<&'static str, &'static str>;

    fn appended(
        output: &FrameworkConfig<&'static str>,
        input: &FrameworkConfig<&'static str>,
        i: usize,
    ) -> Vec<&'static str> {
        let skip = input.collections[i].upload_handlers().len();
        output.collections[i].upload_handlers()[skip..].to_vec()
    }

    #[test]
    fn collection_count_is_preserved() {
        let plugin: Plugin = DynamicMedia::builder().slugs(["media"]).handlers(vec!["h"]).build();
        for n in [0, 1, 4] {
            let input = framework((0..n).map(|i| collection(&format!("c{i}"), None)).collect());
            assert_eq!(plugin.apply(&input).collections.len(), n);
        }
    }

    #[test]
    fn existing_handlers_are_prepended() {
        let plugin: Plugin = DynamicMedia::builder().slugs(["media"]).handlers(vec!["hB"]).build();
        let input = framework(vec![
            collection("media", Some(vec!["hA1", "hA2"])),
            collection("docs", Some(vec![])),
            collection("posts", None),
        ]);
        let output = plugin.apply(&input);
        for (i, c) in input.collections.iter().enumerate() {
            let existing = c.upload_handlers();
            assert_eq!(&output.collections[i].upload_handlers()[..existing.len()], existing);
        }
    }

    #[test]
    fn slug_set_scenario() {
        let plugin: Plugin = DynamicMedia::builder().slugs(["media"]).handlers(vec!["hB"]).build();
        let input = framework(vec![collection("media", Some(vec!["hA"]))]);
        let output = plugin.apply(&input);
        assert_eq!(output, framework(vec![collection("media", Some(vec!["hA", "hB"]))]));
    }

    #[test]
    fn slug_set_ignores_per_collection_content() {
        let plugin: Plugin = DynamicMedia::builder()
            .slugs(["media", "avatars"])
            .handlers(vec!["h0"])
            .build();
        let input = framework(vec![
            collection("media", Some(vec!["x"])),
            collection("avatars", None),
        ]);
        let output = plugin.apply(&input);
        assert_eq!(appended(&output, &input, 0), ["h0"]);
        assert_eq!(appended(&output, &input, 1), ["h0"]);
    }

    #[test]
    fn override_replaces_and_unlisted_falls_back() {
        let plugin: Plugin = DynamicMedia::builder()
            .handlers(vec!["h0"])
            .collection("media", CollectionOptions::new().handlers(vec!["h1"]))
            .build();
        let input = framework(vec![collection("media", None), collection("posts", None)]);
        let output = plugin.apply(&input);
        assert_eq!(appended(&output, &input, 0), ["h1"]);
        assert_eq!(appended(&output, &input, 1), ["h0"]);
    }

    #[test]
    fn override_without_upload_scenario() {
        let plugin: Plugin = DynamicMedia::builder()
            .collection("media", CollectionOptions::new().handlers(vec!["hC"]))
            .build();
        let input = framework(vec![collection("media", None)]);
        let output = plugin.apply(&input);
        assert_eq!(output, framework(vec![collection("media", Some(vec!["hC"]))]));
    }

    #[test]
    fn override_without_handlers_keeps_default() {
        let plugin: Plugin = DynamicMedia::builder()
            .handlers(vec!["h0"])
            .collection("media", CollectionOptions::new().read_file(vec!["s3"]))
            .build();
        let input = framework(vec![collection("media", None)]);
        assert_eq!(appended(&plugin.apply(&input), &input, 0), ["h0"]);
    }

    #[test]
    fn reapplying_duplicates_plugin_handlers() {
        let plugin: Plugin = DynamicMedia::builder().slugs(["media"]).handlers(vec!["hB"]).build();
        let input = framework(vec![collection("media", Some(vec!["hA"]))]);
        let twice = plugin.apply(&plugin.apply(&input));
        assert_eq!(twice.collections[0].upload_handlers(), ["hA", "hB", "hB"]);
    }

    #[test]
    fn input_is_not_mutated() {
        let plugin: Plugin = DynamicMedia::builder().handlers(vec!["hB"]).build();
        let input = framework(vec![collection("media", Some(vec!["hA"])), collection("posts", None)]);
        let before = input.clone();
        let _ = plugin.apply(&input);
        assert_eq!(input, before);
    }

    #[test]
    fn non_collection_fields_pass_through() {
        let plugin: DynamicMedia<String, String> = DynamicMedia::builder()
            .handlers(vec!["watermark".to_string()])
            .build();
        let input: FrameworkConfig<String> = toml::from_str(FRAMEWORK_TOML).unwrap();
        let output = plugin.apply(&input);
        assert_eq!(output.extra, input.extra);
        let media = output.collection("media").unwrap();
        assert_eq!(media.extra["admin_group"].as_str(), Some("Assets"));
        assert_eq!(
            media.upload_handlers(),
            ["strip-exif", "virus-scan", "watermark"]
        );
        let upload = media.upload.as_ref().and_then(Upload::options).unwrap();
        assert_eq!(upload.extra["static_dir"].as_str(), Some("media"));
    }

    #[test]
    fn upload_true_becomes_record() {
        let plugin: Plugin = DynamicMedia::builder().handlers(vec!["h0"]).build();
        let input = framework(vec![collection("avatars", None).with_upload(Upload::enabled())]);
        let output = plugin.apply(&input);
        assert_eq!(
            output.collections[0].upload,
            Some(Upload::Options(UploadOptions::with_handlers(vec!["h0"])))
        );
    }

    #[test]
    fn no_plugin_handlers_still_emits_record() {
        let plugin: Plugin = DynamicMedia::builder().build();
        let input = framework(vec![collection("posts", None)]);
        let output = plugin.apply(&input);
        assert_eq!(output, framework(vec![collection("posts", Some(vec![]))]));
    }

    #[test]
    fn transformer_matches_apply() {
        let plugin: Plugin = DynamicMedia::builder().handlers(vec!["h0"]).build();
        let input = framework(vec![collection("media", Some(vec!["hA"]))]);
        let expected = plugin.apply(&input);
        let transform = plugin.into_transformer();
        assert_eq!(transform(&input), expected);
    }

    #[test]
    fn slugs_after_collection_become_empty_overrides() {
        let plugin: Plugin = DynamicMedia::builder()
            .collection("media", CollectionOptions::new().handlers(vec!["h1"]))
            .slugs(["avatars"])
            .build();
        let selector = &plugin.options().collections;
        assert_eq!(selector.overrides_for("avatars"), Some(&CollectionOptions::default()));
        assert!(selector.overrides_for("media").is_some());
    }

    #[test]
    fn collection_after_slugs_keeps_slugs() {
        let plugin: Plugin = DynamicMedia::builder()
            .slugs(["avatars"])
            .collection("media", CollectionOptions::new())
            .build();
        assert!(plugin.options().collections.contains("avatars"));
        assert!(plugin.options().collections.contains("media"));
    }

    #[test]
    fn resolve_stacks_override_on_default() {
        let plugin: Plugin = DynamicMedia::builder()
            .read_file(vec!["disk"])
            .upload_file(vec!["disk"])
            .handlers(vec!["h0"])
            .collection(
                "media",
                CollectionOptions::new().read_file(vec!["s3", "cache"]),
            )
            .build();

        let media = plugin.resolve("media");
        assert_eq!(media.read_file.handlers(), ["disk", "s3", "cache"]);
        assert_eq!(media.upload_file.handlers(), ["disk"]);
        assert_eq!(media.handlers, ["h0"]);

        let posts = plugin.resolve("posts");
        assert_eq!(posts.read_file.handlers(), ["disk"]);
    }

    #[test]
    fn resolved_handlers_run_newest_first() {
        type Fetch = Handler<String, Vec<&'static str>, String>;
        let named = |name: &'static str| -> Fetch {
            Handler::new(move |req: &String, log: &mut Vec<&'static str>, previous| {
                log.push(name);
                previous.map_or_else(|| format!("{name}:{req}"), |p| p.call(req, log))
            })
        };
        let plugin: DynamicMedia<Fetch, ()> = DynamicMedia::builder()
            .read_file(HandlerChain::single(named("disk")))
            .collection(
                "media",
                CollectionOptions::new().read_file(vec![named("s3"), named("cache")]),
            )
            .build();

        let mut log = Vec::new();
        let out = plugin
            .resolve("media")
            .read_file
            .dispatch(&"logo.png".to_string(), &mut log);
        assert_eq!(out.as_deref(), Some("disk:logo.png"));
        assert_eq!(log, ["cache", "s3", "disk"]);
    }

    #[test]
    fn effective_options_replace_while_resolve_stacks() {
        let plugin: DynamicMedia<&str, &str> = DynamicMedia::builder()
            .read_file(HandlerChain::single("disk"))
            .collection("media", CollectionOptions::new().read_file(vec!["s3"]))
            .build();

        let effective = plugin.effective_options("media").read_file.unwrap();
        assert_eq!(effective.as_slice(), ["s3"]);
        assert_eq!(plugin.resolve("media").read_file.handlers(), ["disk", "s3"]);
    }

    #[test]
    fn settings_bind_through_registry() {
        let plugin = DynamicMedia::from_settings(SettingsInput {
            files: vec![("plugin.toml".into(), OVERRIDES_TOML.to_string())],
            strict: true,
        })
        .unwrap();
        let registry = HandlerRegistry::new()
            .file_handler("local-disk", 'd')
            .file_handler("s3", 's')
            .file_handler("cdn-cache", 'c')
            .upload_handler("watermark", 1u8)
            .upload_handler("resize", 2u8);
        let bound = plugin.bind(&registry).unwrap();

        let media = bound.resolve("media");
        assert_eq!(media.read_file.handlers(), ['d', 's', 'c']);
        assert_eq!(media.handlers, [2u8]);
        assert_eq!(bound.resolve("posts").handlers, [1u8]);
    }

    #[test]
    fn bind_reports_missing_name() {
        let plugin = DynamicMedia::from_settings(SettingsInput {
            files: vec![("plugin.toml".into(), OVERRIDES_TOML.to_string())],
            strict: true,
        })
        .unwrap();
        let registry: HandlerRegistry<char, u8> = HandlerRegistry::new().file_handler("s3", 's');
        assert!(matches!(
            plugin.bind(&registry),
            Err(DynamicMediaError::UnknownHandler { .. })
        ));
    }
}

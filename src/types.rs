//! Plugin option types.
//!
//! Options come in three layers, resolved per collection by
//! [`merge`](crate::merge):
//!
//! ```text
//! Plugin defaults       PluginOptions { read_file, upload_file, handlers }
//!        ↑ replaced field-by-field by
//! Collection overrides  CollectionSelector::Overrides[slug]
//!        ↑ appended after
//! Framework handlers    collection.upload.handlers (always first)
//! ```
//!
//! Two type parameters run through every option type:
//!
//! - `F` is the read/upload file handler. At runtime this is usually a
//!   [`Handler`](crate::chain::Handler); in declarative settings it is a
//!   `String` naming a handler in a [`HandlerRegistry`](crate::HandlerRegistry).
//! - `H` is the host framework's low-level upload-handler callback. The plugin
//!   never inspects it, only clones and concatenates.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One handler or an ordered list of handlers, always stored as a list.
///
/// The last entry is the one invoked first; each entry sees the one before it
/// as its "previous" handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerChain<F>(Vec<F>);

impl<F> HandlerChain<F> {
    pub fn new(handlers: Vec<F>) -> Self {
        Self(handlers)
    }

    pub fn single(handler: F) -> Self {
        Self(vec![handler])
    }

    pub fn as_slice(&self) -> &[F] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<F> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn try_map<G, E>(self, f: impl Fn(F) -> Result<G, E>) -> Result<HandlerChain<G>, E> {
        self.0
            .into_iter()
            .map(f)
            .collect::<Result<Vec<G>, E>>()
            .map(HandlerChain)
    }
}

impl<F> From<Vec<F>> for HandlerChain<F> {
    fn from(handlers: Vec<F>) -> Self {
        Self(handlers)
    }
}

impl<'de, F: Deserialize<'de>> Deserialize<'de> for HandlerChain<F> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany<T> {
            Many(Vec<T>),
            One(T),
        }

        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::Many(handlers) => Self(handlers),
            OneOrMany::One(handler) => Self(vec![handler]),
        })
    }
}

impl<F: Serialize> Serialize for HandlerChain<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Deserialize an optional callback list, treating a value that is not a list
/// as "no handlers" instead of failing.
///
/// A list is always read as a list: an element that is not an `H` is an
/// error, never a reason to drop the callbacks around it.
pub(crate) fn lenient_list<'de, D, H>(deserializer: D) -> Result<Option<Vec<H>>, D::Error>
where
    D: Deserializer<'de>,
    H: Deserialize<'de>,
{
    struct ListOrNothing<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for ListOrNothing<T> {
        type Value = Option<Vec<T>>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a list of handlers")
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut handlers = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(handler) = seq.next_element()? {
                handlers.push(handler);
            }
            Ok(Some(handlers))
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            d.deserialize_any(self)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_str<E: de::Error>(self, _: &str) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_bytes<E: de::Error>(self, _: &[u8]) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(ListOrNothing(PhantomData))
}

/// Options scoped to one collection.
///
/// Every field is optional. A present field fully replaces the plugin-wide
/// default for that field; it is never concatenated with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    bound(
        serialize = "F: Serialize, H: Serialize",
        deserialize = "F: Deserialize<'de>, H: Deserialize<'de>"
    )
)]
pub struct CollectionOptions<F, H> {
    /// `GET` handler chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_file: Option<HandlerChain<F>>,

    /// `POST`/`PATCH`/`PUT` handler chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_file: Option<HandlerChain<F>>,

    /// Upload-handler callbacks appended after the collection's own.
    #[serde(
        deserialize_with = "lenient_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub handlers: Option<Vec<H>>,
}

impl<F, H> Default for CollectionOptions<F, H> {
    fn default() -> Self {
        Self {
            read_file: None,
            upload_file: None,
            handlers: None,
        }
    }
}

impl<F, H> CollectionOptions<F, H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_file(mut self, chain: impl Into<HandlerChain<F>>) -> Self {
        self.read_file = Some(chain.into());
        self
    }

    pub fn upload_file(mut self, chain: impl Into<HandlerChain<F>>) -> Self {
        self.upload_file = Some(chain.into());
        self
    }

    pub fn handlers(mut self, handlers: Vec<H>) -> Self {
        self.handlers = Some(handlers);
        self
    }

    /// Map every handler reference, failing on the first error.
    pub fn try_map<G, I, E>(
        self,
        file: &impl Fn(F) -> Result<G, E>,
        upload: &impl Fn(H) -> Result<I, E>,
    ) -> Result<CollectionOptions<G, I>, E> {
        Ok(CollectionOptions {
            read_file: self.read_file.map(|c| c.try_map(file)).transpose()?,
            upload_file: self.upload_file.map(|c| c.try_map(file)).transpose()?,
            handlers: self
                .handlers
                .map(|hs| hs.into_iter().map(upload).collect::<Result<Vec<_>, E>>())
                .transpose()?,
        })
    }
}

/// Which collections the plugin names, and how.
///
/// The shape is fixed at construction: a TOML array becomes [`Slugs`], a TOML
/// table becomes [`Overrides`].
///
/// [`Slugs`]: CollectionSelector::Slugs
/// [`Overrides`]: CollectionSelector::Overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    untagged,
    bound(
        serialize = "F: Serialize, H: Serialize",
        deserialize = "F: Deserialize<'de>, H: Deserialize<'de>"
    )
)]
pub enum CollectionSelector<F, H> {
    /// Plain slugs: plugin defaults apply, no per-collection lookup.
    Slugs(BTreeSet<String>),
    /// Slug to per-collection overrides.
    Overrides(BTreeMap<String, CollectionOptions<F, H>>),
}

impl<F, H> Default for CollectionSelector<F, H> {
    fn default() -> Self {
        CollectionSelector::Slugs(BTreeSet::new())
    }
}

impl<F, H> CollectionSelector<F, H> {
    pub fn slugs<I, S>(slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CollectionSelector::Slugs(slugs.into_iter().map(Into::into).collect())
    }

    /// Per-collection overrides for `slug`. Always `None` for [`Slugs`](Self::Slugs).
    pub fn overrides_for(&self, slug: &str) -> Option<&CollectionOptions<F, H>> {
        match self {
            CollectionSelector::Slugs(_) => None,
            CollectionSelector::Overrides(map) => map.get(slug),
        }
    }

    pub fn contains(&self, slug: &str) -> bool {
        match self {
            CollectionSelector::Slugs(set) => set.contains(slug),
            CollectionSelector::Overrides(map) => map.contains_key(slug),
        }
    }

    pub fn try_map<G, I, E>(
        self,
        file: &impl Fn(F) -> Result<G, E>,
        upload: &impl Fn(H) -> Result<I, E>,
    ) -> Result<CollectionSelector<G, I>, E> {
        Ok(match self {
            CollectionSelector::Slugs(set) => CollectionSelector::Slugs(set),
            CollectionSelector::Overrides(map) => CollectionSelector::Overrides(
                map.into_iter()
                    .map(|(slug, opts)| opts.try_map(file, upload).map(|opts| (slug, opts)))
                    .collect::<Result<_, E>>()?,
            ),
        })
    }
}

/// Plugin-wide options: the selector plus the default for every field.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginOptions<F, H> {
    pub collections: CollectionSelector<F, H>,
    pub defaults: CollectionOptions<F, H>,
}

impl<F, H> Default for PluginOptions<F, H> {
    fn default() -> Self {
        Self {
            collections: CollectionSelector::default(),
            defaults: CollectionOptions::default(),
        }
    }
}

impl<F, H> PluginOptions<F, H> {
    pub fn try_map<G, I, E>(
        self,
        file: &impl Fn(F) -> Result<G, E>,
        upload: &impl Fn(H) -> Result<I, E>,
    ) -> Result<PluginOptions<G, I>, E> {
        Ok(PluginOptions {
            collections: self.collections.try_map(file, upload)?,
            defaults: self.defaults.try_map(file, upload)?,
        })
    }
}

/// Output encoding for CLI results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Toml,
    Json,
}

/// An operation on file-based configuration, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaAction {
    /// Apply the plugin to a framework config file.
    Merge { config: PathBuf, format: OutputFormat },
    /// Show the resolved chains and handlers for one collection.
    Resolve { slug: String, format: OutputFormat },
    /// Print a commented plugin settings template.
    Template,
}

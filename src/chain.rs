//! Read/upload handler chains.
//!
//! The merge only arranges handler references. This module is for the
//! integration that wires a resolved chain into the framework's request
//! handling: it runs the chain in the documented order.
//!
//! For a chain `[A, B, C]` configured on a collection whose plugin default is
//! `[D]`, dispatch calls `C` first:
//!
//! ```text
//! C ──(previous?)─→ B ──(previous?)─→ A ──(previous?)─→ D
//! ```
//!
//! Each handler decides whether to call its `previous`. `D`, the oldest entry,
//! receives `None`.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::types::HandlerChain;

type HandlerFn<Req, Res, Out> =
    dyn Fn(&Req, &mut Res, Option<Previous<'_, Req, Res, Out>>) -> Out + Send + Sync;

/// A read or upload handler.
///
/// `Req` and `Res` are the host framework's request and response types; the
/// plugin never looks inside them.
pub struct Handler<Req, Res, Out> {
    inner: Arc<HandlerFn<Req, Res, Out>>,
}

impl<Req, Res, Out> Handler<Req, Res, Out> {
    pub fn new<Fun>(f: Fun) -> Self
    where
        Fun: Fn(&Req, &mut Res, Option<Previous<'_, Req, Res, Out>>) -> Out
            + Send
            + Sync
            + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    pub fn call(
        &self,
        req: &Req,
        res: &mut Res,
        previous: Option<Previous<'_, Req, Res, Out>>,
    ) -> Out {
        (self.inner)(req, res, previous)
    }
}

impl<Req, Res, Out> Clone for Handler<Req, Res, Out> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<Req, Res, Out> fmt::Debug for Handler<Req, Res, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// The handler a running handler may fall back to.
pub struct Previous<'a, Req, Res, Out> {
    head: &'a Handler<Req, Res, Out>,
    rest: &'a [Handler<Req, Res, Out>],
}

impl<'a, Req, Res, Out> Previous<'a, Req, Res, Out> {
    /// Cursor at the newest entry of `stack`, `None` when it is empty.
    fn top(stack: &'a [Handler<Req, Res, Out>]) -> Option<Self> {
        stack
            .split_last()
            .map(|(head, rest)| Previous { head, rest })
    }

    /// Invoke the previous handler, handing it its own predecessor.
    pub fn call(self, req: &Req, res: &mut Res) -> Out {
        self.head.call(req, res, Previous::top(self.rest))
    }
}

impl<Req, Res, Out> Clone for Previous<'_, Req, Res, Out> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Req, Res, Out> Copy for Previous<'_, Req, Res, Out> {}

/// A collection's resolved read or upload chain, oldest entry first.
///
/// Without a per-collection value this is just the plugin default. With one,
/// it is the plugin default followed by the collection's entries, so the
/// collection's first entry sees the default as `previous`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FileChain<F> {
    stack: Vec<F>,
}

impl<F> Default for FileChain<F> {
    fn default() -> Self {
        Self { stack: Vec::new() }
    }
}

impl<F: Clone> FileChain<F> {
    pub fn resolve(
        default: Option<&HandlerChain<F>>,
        collection: Option<&HandlerChain<F>>,
    ) -> Self {
        let mut stack: Vec<F> = default.map(|c| c.as_slice().to_vec()).unwrap_or_default();
        if let Some(chain) = collection {
            stack.extend_from_slice(chain.as_slice());
        }
        Self { stack }
    }
}

impl<F> FileChain<F> {
    /// Handlers, oldest first. The last one is invoked first.
    pub fn handlers(&self) -> &[F] {
        &self.stack
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

impl<Req, Res, Out> FileChain<Handler<Req, Res, Out>> {
    /// Run the chain from its newest entry. `None` when nothing is configured.
    pub fn dispatch(&self, req: &Req, res: &mut Res) -> Option<Out> {
        Previous::top(&self.stack).map(|top| top.call(req, res))
    }
}

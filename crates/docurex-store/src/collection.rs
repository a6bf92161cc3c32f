// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed view over one JSON-array key.

use docurex_core::error::{DocurexError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{instrument, warn};

use crate::kv::KvBackend;

/// A record collection stored as a single JSON array.
///
/// Every write rewrites the whole array.  A value that fails to parse is
/// discarded and replaced with the collection's seed data.
pub struct Collection<'a, T> {
    backend: &'a dyn KvBackend,
    key: &'static str,
    seed: fn() -> Vec<T>,
}

impl<'a, T> Collection<'a, T>
where
    T: Serialize + DeserializeOwned,
{
    pub(crate) fn new(backend: &'a dyn KvBackend, key: &'static str, seed: fn() -> Vec<T>) -> Self {
        Self { backend, key, seed }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Decode a stored value.  The flag is true when the stored value was
    /// missing or corrupt and the seed was substituted.
    fn decode(&self, raw: Option<String>) -> (Vec<T>, bool) {
        match raw {
            None => ((self.seed)(), true),
            Some(json) => match serde_json::from_str(&json) {
                Ok(items) => (items, false),
                Err(e) => {
                    warn!(key = self.key, error = %e, "discarding unparseable collection");
                    ((self.seed)(), true)
                }
            },
        }
    }

    /// Write the seed if the key is absent or corrupt.  Existing data is
    /// left alone.
    #[instrument(skip(self), fields(key = self.key))]
    pub fn initialize(&self) -> Result<()> {
        let (items, reseed) = self.decode(self.backend.get(self.key)?);
        if reseed {
            self.backend.set(self.key, &serde_json::to_string(&items)?)?;
        }
        Ok(())
    }

    /// All records in stored order.
    pub fn list(&self) -> Result<Vec<T>> {
        let (items, reseed) = self.decode(self.backend.get(self.key)?);
        if reseed {
            self.backend.set(self.key, &serde_json::to_string(&items)?)?;
        }
        Ok(items)
    }

    /// First record matching `pred`.
    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Result<Option<T>> {
        Ok(self.list()?.into_iter().find(|item| pred(item)))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Read-modify-write the whole array.  `f`'s return value is passed
    /// back to the caller once the new array is stored.
    pub fn update<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> Result<R> {
        let mut f = Some(f);
        let mut out = None;

        self.backend.modify(self.key, &mut |raw| {
            let (mut items, _) = self.decode(raw);
            let apply = f
                .take()
                .ok_or_else(|| DocurexError::Database(format!("{}: update retried", self.key)))?;
            out = Some(apply(&mut items));
            Ok(serde_json::to_string(&items)?)
        })?;

        out.ok_or_else(|| DocurexError::Database(format!("{}: update not applied", self.key)))
    }

    /// Add a record at the end.
    pub fn append(&self, item: T) -> Result<()> {
        self.update(|items| items.push(item))
    }

    /// Add a record at the front.
    pub fn prepend(&self, item: T) -> Result<()> {
        self.update(|items| items.insert(0, item))
    }
}

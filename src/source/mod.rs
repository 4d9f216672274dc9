// Copyright 2018-2024 the Deno authors. MIT license.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use deno_error::JsErrorBox;
use deno_error::JsErrorClass;
use futures::future;
use futures::future::LocalBoxFuture;
use serde::Deserialize;
use serde::Serialize;

use crate::definition::Definition;

/// Identity of a fetchable resource, derived from a module name and the
/// configured base location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ResourceKey(String);

impl ResourceKey {
  pub fn new(key: impl Into<String>) -> Self {
    Self(key.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn into_string(self) -> String {
    self.0
  }
}

impl fmt::Display for ResourceKey {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// The definitions a fetched resource declares.
pub type FetchResult<T> = Result<Vec<Definition<T>>, Arc<dyn JsErrorClass>>;
pub type FetchFuture<T> = LocalBoxFuture<'static, FetchResult<T>>;

/// A trait which allows module definitions that are not yet registered to be
/// loaded from somewhere else.
///
/// The loader guarantees `fetch` is never called for a key that already has
/// a fetch in flight, so implementations do not need to coalesce requests
/// themselves. Each returned future must settle exactly once.
pub trait Fetcher<T> {
  /// Asynchronously loads the resource and returns the definitions it
  /// declares. The loader registers them before any waiter is resumed.
  fn fetch(&self, key: &ResourceKey) -> FetchFuture<T>;
}

/// A fetcher that never finds anything. Useful when every definition is
/// registered up front.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFetcher;

impl<T: 'static> Fetcher<T> for NullFetcher {
  fn fetch(&self, key: &ResourceKey) -> FetchFuture<T> {
    Box::pin(future::ready(Err(not_found(key))))
  }
}

fn not_found(key: &ResourceKey) -> Arc<dyn JsErrorClass> {
  Arc::new(JsErrorBox::new(
    "NotFound",
    format!("Resource \"{}\" was not found.", key),
  ))
}

/// An implementation of the fetcher where the resources are provided
/// ahead of time. This is useful for testing or embedding.
pub struct MemoryFetcher<T> {
  sources: HashMap<ResourceKey, FetchResult<T>>,
  fetch_counts: RefCell<HashMap<ResourceKey, usize>>,
}

impl<T> Default for MemoryFetcher<T> {
  fn default() -> Self {
    Self {
      sources: HashMap::new(),
      fetch_counts: RefCell::new(HashMap::new()),
    }
  }
}

impl<T> MemoryFetcher<T> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a resource that declares the provided definitions.
  pub fn add_source(
    &mut self,
    key: impl Into<String>,
    definitions: Vec<Definition<T>>,
  ) -> &mut Self {
    self
      .sources
      .insert(ResourceKey::new(key), Ok(definitions));
    self
  }

  /// Adds a resource whose fetch fails with the provided error.
  pub fn add_error(
    &mut self,
    key: impl Into<String>,
    error: Arc<dyn JsErrorClass>,
  ) -> &mut Self {
    self.sources.insert(ResourceKey::new(key), Err(error));
    self
  }

  /// Number of times `key` was fetched.
  pub fn fetch_count(&self, key: &str) -> usize {
    self
      .fetch_counts
      .borrow()
      .get(&ResourceKey::new(key))
      .copied()
      .unwrap_or(0)
  }

  pub fn total_fetches(&self) -> usize {
    self.fetch_counts.borrow().values().sum()
  }
}

impl<T: 'static> Fetcher<T> for MemoryFetcher<T> {
  fn fetch(&self, key: &ResourceKey) -> FetchFuture<T> {
    *self
      .fetch_counts
      .borrow_mut()
      .entry(key.clone())
      .or_default() += 1;
    let result = match self.sources.get(key) {
      Some(Ok(definitions)) => Ok(definitions.clone()),
      Some(Err(err)) => Err(err.clone()),
      None => Err(not_found(key)),
    };
    Box::pin(future::ready(result))
  }
}

impl<T, F: Fetcher<T> + ?Sized> Fetcher<T> for Rc<F> {
  fn fetch(&self, key: &ResourceKey) -> FetchFuture<T> {
    (**self).fetch(key)
  }
}

// Copyright 2018-2024 the Deno authors. MIT license.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use deno_error::JsErrorBox;
use futures::FutureExt;
use futures::StreamExt;

use crate::cache::ModuleCache;
use crate::config::ErrorSink;
use crate::config::LoaderConfig;
use crate::config::LoaderOptions;
use crate::definition::is_valid_module_name;
use crate::definition::Definition;
use crate::definition::DefinitionRegistry;
use crate::error::ArgumentError;
use crate::error::DefinitionError;
use crate::error::FetchError;
use crate::error::RequireError;
use crate::error::ResolveError;
use crate::fetch::FetchCoalescer;
use crate::fetch::PendingFetch;
use crate::source::Fetcher;
use crate::source::NullFetcher;
use crate::source::ResourceKey;
use crate::BoxedFuture;
use crate::Executor;

/// Owns the definitions, instantiated modules and in-flight fetches of one
/// loader. Cloning shares the same instance; construct a new loader to start
/// from a clean state.
pub struct ModuleLoader<T> {
  pub(crate) inner: Rc<LoaderInner<T>>,
}

pub(crate) struct LoaderInner<T> {
  pub(crate) config: LoaderConfig,
  pub(crate) registry: Rc<RefCell<DefinitionRegistry<T>>>,
  pub(crate) cache: RefCell<ModuleCache<T>>,
  pub(crate) fetches: FetchCoalescer<ResourceKey, Result<(), FetchError>>,
  pub(crate) fetcher: Rc<dyn Fetcher<T>>,
  pub(crate) executor: Rc<dyn Executor>,
  pub(crate) error_sink: Rc<dyn ErrorSink>,
  /// Handles of `require` resolutions still running on the executor.
  pub(crate) detached: RefCell<Vec<BoxedFuture>>,
}

impl<T> Clone for ModuleLoader<T> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
    }
  }
}

impl<T> fmt::Debug for ModuleLoader<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ModuleLoader")
      .field("config", &self.inner.config)
      .field("definitions", &self.inner.registry.borrow().len())
      .field("modules", &self.inner.cache.borrow().len())
      .field("pending_fetches", &self.inner.fetches.len())
      .field("detached", &self.inner.detached.borrow().len())
      .finish()
  }
}

impl<T: Clone + 'static> Default for ModuleLoader<T> {
  fn default() -> Self {
    Self::new(NullFetcher, LoaderOptions::default())
  }
}

impl<T: Clone + 'static> ModuleLoader<T> {
  pub fn new(
    fetcher: impl Fetcher<T> + 'static,
    options: LoaderOptions,
  ) -> Self {
    Self {
      inner: Rc::new(LoaderInner {
        config: options.config,
        registry: Default::default(),
        cache: Default::default(),
        fetches: Default::default(),
        fetcher: Rc::new(fetcher),
        executor: options.executor,
        error_sink: options.error_sink,
        detached: Default::default(),
      }),
    }
  }

  pub fn config(&self) -> &LoaderConfig {
    &self.inner.config
  }

  /// Defines a module. Each name can only be defined once.
  pub fn define<S: Into<String>>(
    &self,
    name: impl Into<String>,
    dependencies: impl IntoIterator<Item = S>,
    factory: impl Fn(&[T]) -> Result<T, JsErrorBox> + 'static,
  ) -> Result<(), DefinitionError> {
    self.register(Definition::new(name, dependencies, factory))
  }

  pub fn register(
    &self,
    definition: Definition<T>,
  ) -> Result<(), DefinitionError> {
    self.inner.registry.borrow_mut().register(definition)
  }

  pub fn definition(&self, name: &str) -> Option<Rc<Definition<T>>> {
    self.inner.registry.borrow().get(name)
  }

  /// The instantiated module, if it was already resolved.
  pub fn module(&self, name: &str) -> Option<T> {
    self.inner.cache.borrow().get(name)
  }

  pub fn resource_key(&self, name: &str) -> ResourceKey {
    self.inner.config.resource_key(name)
  }

  pub fn is_fetching(&self, name: &str) -> bool {
    self.inner.fetches.is_pending(&self.resource_key(name))
  }

  /// Gets the definition of `name`, fetching its resource when it is not
  /// defined yet.
  pub async fn load_definition(
    &self,
    name: &str,
  ) -> Result<Rc<Definition<T>>, ResolveError> {
    if let Some(definition) = self.definition(name) {
      return Ok(definition);
    }

    let key = self.resource_key(name);
    self.fetch(&key).await?;
    self
      .definition(name)
      .ok_or_else(|| ResolveError::NotFoundAfterFetch {
        name: name.to_string(),
        key,
      })
  }

  fn fetch(&self, key: &ResourceKey) -> PendingFetch<Result<(), FetchError>> {
    let inner = &self.inner;
    inner.fetches.fetch(key, &*inner.executor, || {
      log::debug!("Fetching {}", key);
      let fut = inner.fetcher.fetch(key);
      let registry = inner.registry.clone();
      let key = key.clone();
      async move {
        let definitions = match fut.await {
          Ok(definitions) => definitions,
          Err(error) => return Err(FetchError { key, error }),
        };
        log::debug!("Fetched {} ({} definitions)", key, definitions.len());
        let mut registry = registry.borrow_mut();
        for definition in definitions {
          if let Err(err) = registry.register(definition) {
            log::warn!("Skipping definition from {}: {}", key, err);
          }
        }
        Ok(())
      }
      .boxed_local()
    })
  }

  /// Resolves `names` and passes the modules to `callback` in the same
  /// order.
  ///
  /// Resolution runs synchronously until it has to wait for a fetch. The
  /// first error found by then is returned as the `Err`, and any further
  /// error goes to the configured error sink. If work remains it runs on the
  /// executor: `callback` is invoked once everything resolves and every
  /// error is handed to the error sink.
  pub fn require<S: Into<String>>(
    &self,
    names: impl IntoIterator<Item = S>,
    callback: impl FnOnce(Vec<T>) + 'static,
  ) -> Result<(), RequireError> {
    let names = names.into_iter().map(Into::into).collect::<Vec<String>>();
    if let Some(name) = names.iter().find(|name| !is_valid_module_name(name)) {
      return Err(ArgumentError { name: name.clone() }.into());
    }

    let error_sink = self.inner.error_sink.clone();
    let mut outcomes = self.load_modules(names);
    let mut callback = Some(callback);
    let mut first_error = None;
    let finished = loop {
      match outcomes.next().now_or_never() {
        Some(Some(Ok(modules))) => {
          if let Some(callback) = callback.take() {
            callback(modules);
          }
        }
        Some(Some(Err(err))) => {
          if first_error.is_none() {
            first_error = Some(err);
          } else {
            error_sink.on_error(err);
          }
        }
        Some(None) => break true,
        None => break false,
      }
    };

    if !finished {
      let fut = async move {
        while let Some(outcome) = outcomes.next().await {
          match outcome {
            Ok(modules) => {
              if let Some(callback) = callback.take() {
                callback(modules);
              }
            }
            Err(err) => error_sink.on_error(err),
          }
        }
      };
      let handle = self.inner.executor.execute(fut.boxed_local());
      self.inner.detached.borrow_mut().push(handle);
    }
    match first_error {
      Some(err) => Err(err.into()),
      None => Ok(()),
    }
  }

  /// Waits for every resolution `require` left running. A failure inside
  /// one of them, such as a panicking error sink, is raised here.
  pub async fn settled(&self) {
    loop {
      let detached = std::mem::take(&mut *self.inner.detached.borrow_mut());
      if detached.is_empty() {
        return;
      }
      futures::future::join_all(detached).await;
    }
  }

  /// Drops handles of detached resolutions that already finished, raising
  /// any failure one of them ended with.
  pub(crate) fn reap_detached(&self) {
    let mut detached = std::mem::take(&mut *self.inner.detached.borrow_mut());
    detached.retain_mut(|handle| handle.as_mut().now_or_never().is_none());
    self.inner.detached.borrow_mut().extend(detached);
  }
}

// Copyright 2018-2024 the Deno authors. MIT license.

use std::rc::Rc;
use std::sync::Arc;

use futures::future;
use futures::stream;
use futures::stream::LocalBoxStream;
use futures::StreamExt;

use crate::definition::Definition;
use crate::error::CyclicDependencyError;
use crate::error::ResolveError;
use crate::join::join_all;
use crate::ModuleLoader;

/// Outcomes of resolving a single module: either one module value, or one
/// or more errors.
pub type ModuleOutcomes<T> = LocalBoxStream<'static, Result<T, ResolveError>>;

/// Outcomes of resolving a list of modules: one error per failing branch,
/// or the modules in request order once everything resolved.
pub type ModulesOutcomes<T> =
  LocalBoxStream<'static, Result<Vec<T>, ResolveError>>;

/// The chain of modules being resolved, from a root request down to the
/// current one.
///
/// Pushing returns a new path that shares its prefix with the receiver, so
/// sibling branches never observe each other's names.
#[derive(Debug, Clone, Default)]
pub struct LoadPath(Option<Rc<LoadPathNode>>);

#[derive(Debug)]
struct LoadPathNode {
  name: String,
  parent: LoadPath,
}

impl LoadPath {
  pub fn push(&self, name: &str) -> LoadPath {
    LoadPath(Some(Rc::new(LoadPathNode {
      name: name.to_string(),
      parent: self.clone(),
    })))
  }

  pub fn contains(&self, name: &str) -> bool {
    self.iter_rev().any(|entry| entry == name)
  }

  /// Names from the root down.
  pub fn names(&self) -> Vec<String> {
    let mut names = self.iter_rev().map(String::from).collect::<Vec<_>>();
    names.reverse();
    names
  }

  pub fn len(&self) -> usize {
    self.iter_rev().count()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_none()
  }

  fn iter_rev(&self) -> impl Iterator<Item = &str> {
    std::iter::successors(self.0.as_deref(), |node| node.parent.0.as_deref())
      .map(|node| node.name.as_str())
  }
}

impl<T: Clone + 'static> ModuleLoader<T> {
  /// Resolves every name concurrently, each as its own root.
  ///
  /// The stream yields an error for every failing branch as soon as it
  /// fails. When all names resolve it yields the modules once, positionally
  /// matching `names`.
  ///
  /// # Panics
  ///
  /// If a resolution left running by [`ModuleLoader::require`] ended in a
  /// panic, that panic is resumed here.
  pub fn load_modules<S: Into<String>>(
    &self,
    names: impl IntoIterator<Item = S>,
  ) -> ModulesOutcomes<T> {
    self.reap_detached();
    join_all(names.into_iter().map(Into::into), |name: String| {
      self.resolve_module(name, LoadPath::default())
    })
  }

  fn resolve_module(&self, name: String, load_path: LoadPath) -> ModuleOutcomes<T> {
    let loader = self.clone();
    stream::once(async move {
      if let Some(module) = loader.module(&name) {
        return single(Ok(module));
      }
      let definition = match loader.load_definition(&name).await {
        Ok(definition) => definition,
        Err(err) => return single(Err(err)),
      };
      if load_path.contains(&name) {
        let err = CyclicDependencyError::new(&load_path, &name);
        log::debug!("{}", err);
        return single(Err(err.into()));
      }

      let load_path = load_path.push(&name);
      let dependencies =
        join_all(definition.dependencies().to_vec(), |dependency| {
          loader.resolve_module(dependency, load_path.clone())
        });
      dependencies
        .map(move |result| match result {
          Ok(modules) => loader.instantiate(&definition, &modules),
          Err(err) => Err(err.required_by(definition.name())),
        })
        .boxed_local()
    })
    .flatten()
    .boxed_local()
  }

  fn instantiate(
    &self,
    definition: &Definition<T>,
    dependencies: &[T],
  ) -> Result<T, ResolveError> {
    let name = definition.name();
    // a concurrent branch may have finished this module first
    if let Some(module) = self.module(name) {
      return Ok(module);
    }
    let module = definition.instantiate(dependencies).map_err(|err| {
      ResolveError::Factory {
        name: name.to_string(),
        error: Arc::new(err),
      }
    })?;
    Ok(self.inner.cache.borrow_mut().insert(name, module))
  }
}

fn single<T: 'static>(outcome: Result<T, ResolveError>) -> ModuleOutcomes<T> {
  stream::once(future::ready(outcome)).boxed_local()
}

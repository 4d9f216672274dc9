// Copyright 2018-2024 the Deno authors. MIT license.

use std::sync::Arc;

use deno_error::JsErrorClass;
use thiserror::Error;

use crate::resolver::LoadPath;
use crate::source::ResourceKey;

/// A malformed call to `define`.
#[derive(Debug, Clone, Error, deno_error::JsError, PartialEq, Eq)]
pub enum DefinitionError {
  #[class(type)]
  #[error("Module name {0:?} is not a valid identifier.")]
  InvalidName(String),
  #[class(type)]
  #[error(
    "Dependency name {dependency:?} of module \"{name}\" is not a valid identifier."
  )]
  InvalidDependencyName { name: String, dependency: String },
  #[class(generic)]
  #[error("Module \"{0}\" is already defined.")]
  AlreadyDefined(String),
}

/// A malformed call to `require`.
#[derive(Debug, Clone, Error, deno_error::JsError, PartialEq, Eq)]
#[class(type)]
#[error("Required module name {name:?} is not a valid identifier.")]
pub struct ArgumentError {
  pub name: String,
}

/// A module was reached again while it was still being resolved by one of
/// its own ancestors.
#[derive(Debug, Clone, Error, deno_error::JsError, PartialEq, Eq)]
#[class(generic)]
#[error("Cyclic dependency detected: {}", self.render())]
pub struct CyclicDependencyError {
  /// Names from the root request down to and including the repeated name.
  pub path: Vec<String>,
  pub repeated: String,
}

impl CyclicDependencyError {
  pub(crate) fn new(load_path: &LoadPath, repeated: &str) -> Self {
    let mut path = load_path.names();
    path.push(repeated.to_string());
    Self {
      path,
      repeated: repeated.to_string(),
    }
  }

  /// Renders the path with both occurrences of the repeated name marked,
  /// for example `a->b!->c->d->e->b!`.
  pub fn render(&self) -> String {
    self
      .path
      .iter()
      .map(|name| {
        if *name == self.repeated {
          format!("{}!", name)
        } else {
          name.clone()
        }
      })
      .collect::<Vec<_>>()
      .join("->")
  }
}

/// The fetch collaborator failed for a resource.
#[derive(Debug, Clone, Error, deno_error::JsError)]
#[class(generic)]
#[error("Failed to fetch \"{key}\": {error}")]
pub struct FetchError {
  pub key: ResourceKey,
  pub error: Arc<dyn JsErrorClass>,
}

#[derive(Debug, Clone, Error, deno_error::JsError)]
pub enum ResolveError {
  #[class(inherit)]
  #[error(transparent)]
  CyclicDependency(#[from] CyclicDependencyError),
  #[class(inherit)]
  #[error(transparent)]
  Fetch(#[from] FetchError),
  #[class("NotFound")]
  #[error("Module \"{name}\" is not defined after fetching \"{key}\".")]
  NotFoundAfterFetch { name: String, key: ResourceKey },
  #[class(generic)]
  #[error("Factory of module \"{name}\" failed: {error}")]
  Factory {
    name: String,
    error: Arc<dyn JsErrorClass>,
  },
  /// A failure while resolving a transitive dependency. `referrers` holds
  /// the modules that were waiting on it, nearest first.
  #[class(generic)]
  #[error("{error}\n    required by {}", .referrers.join(" <- "))]
  Dependency {
    referrers: Vec<String>,
    error: Arc<ResolveError>,
  },
}

impl ResolveError {
  pub(crate) fn required_by(self, referrer: &str) -> Self {
    match self {
      Self::Dependency {
        mut referrers,
        error,
      } => {
        referrers.push(referrer.to_string());
        Self::Dependency { referrers, error }
      }
      err => Self::Dependency {
        referrers: vec![referrer.to_string()],
        error: Arc::new(err),
      },
    }
  }

  /// The failure that started the chain, with any dependency wrapping
  /// removed.
  pub fn root_cause(&self) -> &ResolveError {
    match self {
      Self::Dependency { error, .. } => error.root_cause(),
      err => err,
    }
  }

  pub fn as_cyclic(&self) -> Option<&CyclicDependencyError> {
    match self.root_cause() {
      Self::CyclicDependency(err) => Some(err),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Error, deno_error::JsError)]
pub enum RequireError {
  #[class(inherit)]
  #[error(transparent)]
  Argument(#[from] ArgumentError),
  #[class(inherit)]
  #[error(transparent)]
  Resolve(#[from] ResolveError),
}

// Copyright 2018-2024 the Deno authors. MIT license.

use std::fmt;
use std::rc::Rc;

use deno_error::JsErrorBox;
use indexmap::IndexMap;

use crate::error::DefinitionError;

/// Builds a module value from its resolved dependencies, which are passed in
/// declaration order.
pub type Factory<T> = Rc<dyn Fn(&[T]) -> Result<T, JsErrorBox>>;

/// A named declaration of a module's dependencies and the factory that
/// constructs it.
pub struct Definition<T> {
  name: String,
  dependencies: Vec<String>,
  factory: Factory<T>,
}

impl<T> Clone for Definition<T> {
  fn clone(&self) -> Self {
    Self {
      name: self.name.clone(),
      dependencies: self.dependencies.clone(),
      factory: self.factory.clone(),
    }
  }
}

impl<T> fmt::Debug for Definition<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Definition")
      .field("name", &self.name)
      .field("dependencies", &self.dependencies)
      .finish_non_exhaustive()
  }
}

impl<T> Definition<T> {
  pub fn new<S: Into<String>>(
    name: impl Into<String>,
    dependencies: impl IntoIterator<Item = S>,
    factory: impl Fn(&[T]) -> Result<T, JsErrorBox> + 'static,
  ) -> Self {
    Self::with_factory(name, dependencies, Rc::new(factory))
  }

  pub fn with_factory<S: Into<String>>(
    name: impl Into<String>,
    dependencies: impl IntoIterator<Item = S>,
    factory: Factory<T>,
  ) -> Self {
    Self {
      name: name.into(),
      dependencies: dependencies.into_iter().map(Into::into).collect(),
      factory,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn dependencies(&self) -> &[String] {
    &self.dependencies
  }

  pub fn factory(&self) -> &Factory<T> {
    &self.factory
  }

  /// Checks the name and every dependency name.
  pub fn validate(&self) -> Result<(), DefinitionError> {
    if !is_valid_module_name(&self.name) {
      return Err(DefinitionError::InvalidName(self.name.clone()));
    }
    if let Some(dependency) = self
      .dependencies
      .iter()
      .find(|dependency| !is_valid_module_name(dependency))
    {
      return Err(DefinitionError::InvalidDependencyName {
        name: self.name.clone(),
        dependency: dependency.clone(),
      });
    }
    Ok(())
  }

  pub(crate) fn instantiate(&self, dependencies: &[T]) -> Result<T, JsErrorBox> {
    (self.factory)(dependencies)
  }
}

/// A module name must be non-empty and free of whitespace and control
/// characters.
pub fn is_valid_module_name(name: &str) -> bool {
  !name.is_empty()
    && !name.chars().any(|c| c.is_whitespace() || c.is_control())
}

/// Definitions by name, in registration order. A name is defined at most
/// once and a definition is never replaced.
pub struct DefinitionRegistry<T> {
  definitions: IndexMap<String, Rc<Definition<T>>>,
}

impl<T> Default for DefinitionRegistry<T> {
  fn default() -> Self {
    Self {
      definitions: IndexMap::new(),
    }
  }
}

impl<T> DefinitionRegistry<T> {
  pub fn register(
    &mut self,
    definition: Definition<T>,
  ) -> Result<(), DefinitionError> {
    definition.validate()?;
    if self.definitions.contains_key(&definition.name) {
      return Err(DefinitionError::AlreadyDefined(definition.name));
    }
    self
      .definitions
      .insert(definition.name.clone(), Rc::new(definition));
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<Rc<Definition<T>>> {
    self.definitions.get(name).cloned()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.definitions.contains_key(name)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.definitions.keys().map(|name| name.as_str())
  }

  pub fn len(&self) -> usize {
    self.definitions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.definitions.is_empty()
  }
}

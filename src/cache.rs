// Copyright 2018-2024 the Deno authors. MIT license.

use std::collections::HashMap;

/// Instantiated modules by name. Entries are never replaced or removed.
pub struct ModuleCache<T> {
  modules: HashMap<String, T>,
}

impl<T> Default for ModuleCache<T> {
  fn default() -> Self {
    Self {
      modules: HashMap::new(),
    }
  }
}

impl<T: Clone> ModuleCache<T> {
  pub fn get(&self, name: &str) -> Option<T> {
    self.modules.get(name).cloned()
  }

  /// Stores `module` unless `name` is already cached. Returns the value that
  /// is cached afterwards.
  pub fn insert(&mut self, name: &str, module: T) -> T {
    self
      .modules
      .entry(name.to_string())
      .or_insert(module)
      .clone()
  }
}

impl<T> ModuleCache<T> {
  pub fn contains(&self, name: &str) -> bool {
    self.modules.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }
}

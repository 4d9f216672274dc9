// Copyright 2018-2024 the Deno authors. MIT license.

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ResolveError;
use crate::source::ResourceKey;
use crate::DefaultExecutor;
use crate::Executor;

/// Settings that decide where missing definitions are fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderConfig {
  /// Prefix of every resource key. Empty by default, which makes keys
  /// relative.
  pub base_location: String,
  /// Suffix of every resource key.
  pub resource_extension: String,
}

impl Default for LoaderConfig {
  fn default() -> Self {
    Self {
      base_location: String::new(),
      resource_extension: ".js".to_string(),
    }
  }
}

impl LoaderConfig {
  pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(text)
  }

  pub fn resource_key(&self, name: &str) -> ResourceKey {
    ResourceKey::new(format!(
      "{}{}{}",
      self.base_location, name, self.resource_extension
    ))
  }
}

/// Receives resolution errors that surface after `require` has already
/// returned and therefore cannot be handed back to its caller.
pub trait ErrorSink {
  fn on_error(&self, error: ResolveError);
}

impl<F: Fn(ResolveError)> ErrorSink for F {
  fn on_error(&self, error: ResolveError) {
    self(error)
  }
}

/// Treats every asynchronous resolution error as fatal.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicErrorSink;

impl ErrorSink for PanicErrorSink {
  /// # Panics
  ///
  /// Always, after logging the error.
  fn on_error(&self, error: ResolveError) {
    log::error!("Unhandled module resolution error: {}", error);
    panic!("{}", error);
  }
}

pub struct LoaderOptions {
  pub config: LoaderConfig,
  pub error_sink: Rc<dyn ErrorSink>,
  pub executor: Rc<dyn Executor>,
}

impl Default for LoaderOptions {
  fn default() -> Self {
    Self {
      config: LoaderConfig::default(),
      error_sink: Rc::new(PanicErrorSink),
      executor: Rc::new(DefaultExecutor),
    }
  }
}

impl fmt::Debug for LoaderOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LoaderOptions")
      .field("config", &self.config)
      .finish_non_exhaustive()
  }
}

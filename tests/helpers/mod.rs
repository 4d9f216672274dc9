// Copyright 2018-2024 the Deno authors. MIT license.

use std::cell::RefCell;
use std::rc::Rc;

use deno_error::JsErrorBox;
use deno_module_resolver::source::MemoryFetcher;
use deno_module_resolver::Definition;
use deno_module_resolver::ErrorSink;
use deno_module_resolver::LoaderConfig;
use deno_module_resolver::LoaderOptions;
use deno_module_resolver::ModuleLoader;
use deno_module_resolver::ResolveError;
use futures::channel::mpsc;

pub const FIXTURES_BASE: &str = "base/fixtures/";

/// Dependencies of every module in the layered fixture graph. The module
/// `levelNvalueV` evaluates to `V`, the sum of its dependencies' values, and
/// its factory rejects any other input.
const LEVELS: &[(&str, &[&str])] = &[
  (
    "level3value32",
    &["level2value9", "level0value1", "level1value2", "level2value20"],
  ),
  ("level2value9", &["level1value3", "level1value2", "level1value4"]),
  (
    "level2value20",
    &["level1value2", "level0value2", "level1value4", "level1value12"],
  ),
  ("level1value2", &["level0value2"]),
  ("level1value3", &["level0value1", "level0value2"]),
  ("level1value4", &["level0value1", "level0value3"]),
  ("level1value12", &["level0value3", "level0value4", "level0value5"]),
  ("level0value1", &[]),
  ("level0value2", &[]),
  ("level0value3", &[]),
  ("level0value4", &[]),
  ("level0value5", &[]),
];

pub fn level_names() -> impl Iterator<Item = &'static str> {
  LEVELS.iter().map(|(name, _)| *name)
}

fn level_value(name: &str) -> i64 {
  name
    .rsplit_once("value")
    .and_then(|(_, value)| value.parse().ok())
    .unwrap()
}

pub fn level_definition(name: &str) -> Definition<i64> {
  let (_, dependencies) = LEVELS
    .iter()
    .find(|(level, _)| *level == name)
    .unwrap_or_else(|| panic!("no fixture named {}", name));
  let value = level_value(name);
  let expected = dependencies
    .iter()
    .map(|dependency| level_value(dependency))
    .collect::<Vec<_>>();
  let module_name = name.to_string();
  Definition::new(name, dependencies.iter().copied(), move |deps: &[i64]| {
    if deps != expected.as_slice() {
      return Err(JsErrorBox::type_error(format!(
        "{} expected {:?}, got {:?}",
        module_name, expected, deps
      )));
    }
    Ok(value)
  })
}

/// A fetcher serving every level fixture from its own resource.
pub fn level_fetcher() -> MemoryFetcher<i64> {
  let mut fetcher = MemoryFetcher::new();
  for name in level_names() {
    fetcher.add_source(
      format!("{}{}.js", FIXTURES_BASE, name),
      vec![level_definition(name)],
    );
  }
  fetcher
}

pub struct TestLoader {
  pub loader: ModuleLoader<i64>,
  pub fetcher: Rc<MemoryFetcher<i64>>,
  pub errors: mpsc::UnboundedReceiver<ResolveError>,
}

pub struct TestLoaderBuilder {
  fetcher: MemoryFetcher<i64>,
  config: LoaderConfig,
}

impl TestLoaderBuilder {
  pub fn new() -> Self {
    init_logger();
    Self {
      fetcher: level_fetcher(),
      config: LoaderConfig {
        base_location: FIXTURES_BASE.to_string(),
        ..Default::default()
      },
    }
  }

  pub fn with_fetcher(
    &mut self,
    mut action: impl FnMut(&mut MemoryFetcher<i64>),
  ) -> &mut Self {
    action(&mut self.fetcher);
    self
  }

  pub fn build(&mut self) -> TestLoader {
    let fetcher = Rc::new(std::mem::take(&mut self.fetcher));
    let (tx, errors) = mpsc::unbounded();
    let error_sink: Rc<dyn ErrorSink> = Rc::new(move |err: ResolveError| {
      tx.unbounded_send(err).ok();
    });
    let loader = ModuleLoader::new(
      fetcher.clone(),
      LoaderOptions {
        config: self.config.clone(),
        error_sink,
        ..Default::default()
      },
    );
    TestLoader {
      loader,
      fetcher,
      errors,
    }
  }
}

/// Collects what `require` hands to its callback.
#[derive(Clone, Default)]
pub struct Received(Rc<RefCell<Vec<Vec<i64>>>>);

impl Received {
  pub fn callback(&self) -> impl FnOnce(Vec<i64>) + 'static {
    let received = self.0.clone();
    move |modules| received.borrow_mut().push(modules)
  }

  pub fn take(&self) -> Vec<Vec<i64>> {
    std::mem::take(&mut *self.0.borrow_mut())
  }
}

fn init_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}
